//! # CSV Export Renderer
//!
//! Spreadsheet export laid out as a grid: letterhead rows, the bill-to and
//! invoice-details block, the item table, then the totals in the last two
//! columns. Opens directly in a spreadsheet program.
//!
//! Fields are quoted per RFC 4180 when they contain a comma, quote or line
//! break. Lines end with CRLF.

use kirana_core::InvoiceDocument;

use super::{file_name, RenderError, RenderJob, RenderedDocument, Renderer};

const NAME: &str = "csv";

/// Spreadsheet export renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExportRenderer;

impl Renderer for CsvExportRenderer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn render(&self, document: &InvoiceDocument) -> RenderJob {
        let document = document.clone();
        RenderJob::spawn(NAME, move || lay_out(&document))
    }
}

/// Builds the CSV grid.
pub fn lay_out(document: &InvoiceDocument) -> Result<RenderedDocument, RenderError> {
    if document.rows.is_empty() {
        return Err(RenderError::layout(NAME, "document has no rows"));
    }

    let company = &document.company;
    let meta = &document.meta;
    let customer = &document.customer;
    let figures = &document.figures;
    let tax = &document.tax;

    let mut sheet = Sheet::default();

    sheet.row(&[&company.name.to_uppercase()]);
    sheet.row(&[&company.address]);
    sheet.row(&[&format!("Ph: {} | GST: {}", company.mobile, company.gstin)]);
    sheet.blank();

    sheet.row(&["INVOICE"]);
    sheet.blank();

    sheet.row(&["BILL TO", "", "INVOICE DETAILS"]);
    sheet.row(&[&customer.name, "", "Invoice No:", &meta.invoice_number]);
    sheet.row(&[&customer.address, "", "Date:", &meta.date]);
    sheet.row(&[&format!("Ph: {}", customer.phone), "", "Time:", &meta.time]);
    sheet.row(&[&format!("GSTIN: {}", customer.gstin), "", "Due Date:", &meta.due_date]);
    sheet.row(&["", "", "Pay Mode:", &meta.payment_mode]);
    sheet.blank();

    sheet.row(&["S.No", "Description", "Qty", "Price", "Dis %", "Amount"]);
    for row in &document.rows {
        sheet.row(&[
            &row.serial.to_string(),
            &row.description,
            &row.quantity.to_string(),
            &row.unit_price,
            &row.discount_percent,
            &row.amount,
        ]);
    }
    sheet.blank();

    let totals = [
        ("Subtotal".to_string(), &figures.subtotal),
        (format!("SGST ({}%)", tax.sgst_rate), &figures.sgst),
        (format!("CGST ({}%)", tax.cgst_rate), &figures.cgst),
        ("Round Off".to_string(), &figures.round_off),
        ("GRAND TOTAL".to_string(), &figures.grand_total),
        ("Paid Amount".to_string(), &figures.paid_amount),
        ("Balance".to_string(), &figures.balance),
    ];
    for (label, value) in &totals {
        sheet.row(&["", "", "", "", label.as_str(), value.as_str()]);
    }
    sheet.blank();

    sheet.row(&["Amount in Words:", &document.amount_in_words]);
    sheet.blank();

    sheet.row(&["Terms & Conditions:"]);
    for line in company.terms.lines().filter(|l| !l.trim().is_empty()) {
        sheet.row(&[line]);
    }
    sheet.blank();
    sheet.row(&["Thank you for your business!"]);

    Ok(RenderedDocument {
        renderer: NAME,
        invoice_number: meta.invoice_number.clone(),
        file_name: file_name(document, "csv"),
        media_type: "text/csv",
        body: sheet.into_body(),
    })
}

#[derive(Default)]
struct Sheet {
    body: String,
}

impl Sheet {
    fn row(&mut self, cells: &[&str]) {
        let line = cells
            .iter()
            .map(|cell| quote(cell))
            .collect::<Vec<_>>()
            .join(",");
        self.body.push_str(&line);
        self.body.push_str("\r\n");
    }

    fn blank(&mut self) {
        self.body.push_str("\r\n");
    }

    fn into_body(self) -> String {
        self.body
    }
}

fn quote(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
