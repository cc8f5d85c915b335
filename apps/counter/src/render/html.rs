//! # HTML Print Renderer
//!
//! A4 print layout, one `<section class="page">` per document page.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ COMPANY NAME                        INVOICE  │
//! │ tagline                                      │
//! ├──────────────┬───────────────┬───────────────┤
//! │ Bill From    │ Bill To       │ Invoice No    │
//! │              │               │ Date / Time   │
//! ├──────────────┴───────────────┴───────────────┤
//! │ S.No │ Description │ Qty │ Price │ Dis% │ Amt │
//! │  ... page rows ...                           │
//! ├──────────────────────────────────────────────┤
//! │ last page only: words, bank, totals, terms   │
//! │ other pages: "Continued on page N"           │
//! │                               Page x of y    │
//! └──────────────────────────────────────────────┘
//! ```

use std::fmt::Write;

use kirana_core::document::{DocumentPage, EMPTY_FIELD};
use kirana_core::InvoiceDocument;

use super::{file_name, RenderError, RenderJob, RenderedDocument, Renderer};

const NAME: &str = "html";

const STYLE: &str = r#"
@page { size: A4; margin: 0; }
body { margin: 0; font-family: Arial, sans-serif; font-size: 12px; color: #000; }
.page { width: 210mm; min-height: 297mm; padding: 8mm; box-sizing: border-box; page-break-after: always; }
.page:last-child { page-break-after: auto; }
header { display: flex; justify-content: space-between; border-bottom: 2px solid #16a34a; }
header h1 { margin: 0; color: #16a34a; text-transform: uppercase; }
table { width: 100%; border-collapse: collapse; }
.parties td { vertical-align: top; border: 1px solid #000; padding: 4px; width: 33%; }
.items th { background: #1e3a8a; color: #fff; border: 1px solid #fff; padding: 4px; }
.items td { border: 1px solid #000; padding: 4px; }
.num { text-align: right; }
.totals td { padding: 2px 4px; }
.grand { font-weight: bold; border-top: 1px solid #000; }
.provisional { color: #b91c1c; font-weight: bold; }
.footer { text-align: right; font-size: 10px; }
"#;

/// HTML renderer for the print path.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlPrintRenderer;

impl Renderer for HtmlPrintRenderer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn render(&self, document: &InvoiceDocument) -> RenderJob {
        let document = document.clone();
        RenderJob::spawn(NAME, move || lay_out(&document))
    }
}

/// Builds the full HTML page set.
pub fn lay_out(document: &InvoiceDocument) -> Result<RenderedDocument, RenderError> {
    if document.pages.is_empty() {
        return Err(RenderError::layout(NAME, "document has no pages"));
    }

    let mut out = String::with_capacity(8 * 1024);
    write_document(&mut out, document)
        .map_err(|_| RenderError::layout(NAME, "formatting failed"))?;

    Ok(RenderedDocument {
        renderer: NAME,
        invoice_number: document.meta.invoice_number.clone(),
        file_name: file_name(document, "html"),
        media_type: "text/html",
        body: out,
    })
}

fn write_document(out: &mut String, doc: &InvoiceDocument) -> std::fmt::Result {
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html>")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"utf-8\">")?;
    writeln!(out, "<title>Invoice - {}</title>", escape(&doc.meta.invoice_number))?;
    writeln!(out, "<style>{}</style>", STYLE)?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;

    for page in &doc.pages {
        write_page(out, doc, page)?;
    }

    writeln!(out, "</body>")?;
    writeln!(out, "</html>")
}

fn write_page(out: &mut String, doc: &InvoiceDocument, page: &DocumentPage) -> std::fmt::Result {
    let company = &doc.company;
    let meta = &doc.meta;
    let customer = &doc.customer;

    writeln!(out, "<section class=\"page\">")?;

    // Letterhead
    writeln!(out, "<header>")?;
    writeln!(
        out,
        "<div><h1>{}</h1><p>{}</p></div>",
        escape(&company.name),
        escape(&company.tagline)
    )?;
    writeln!(out, "<h2>INVOICE</h2>")?;
    writeln!(out, "</header>")?;

    if meta.is_provisional {
        writeln!(
            out,
            "<p class=\"provisional\">PROVISIONAL NUMBER - not from the daily sequence</p>"
        )?;
    }

    // Parties and invoice details
    writeln!(out, "<table class=\"parties\"><tr>")?;
    writeln!(
        out,
        "<td><strong>Bill From</strong><br>{}<br>{}<br>Phone: {}<br>GSTIN: {}</td>",
        escape(&company.name),
        escape_lines(&company.address),
        escape(&company.mobile),
        escape(or_dash(&company.gstin))
    )?;
    writeln!(
        out,
        "<td><strong>Bill To</strong><br>{}<br>{}<br>Phone: {}<br>GSTIN: {}</td>",
        escape(&customer.name.to_uppercase()),
        escape_lines(&customer.address),
        escape(&customer.phone),
        escape(&customer.gstin)
    )?;
    writeln!(
        out,
        "<td>INVOICE NO : {}<br>INVOICE DATE : {}<br>INVOICE TIME : {}<br>DUE DATE : {}<br>PAY MODE : {}</td>",
        escape(&meta.invoice_number),
        escape(&meta.date),
        escape(&meta.time),
        escape(&meta.due_date),
        escape(&meta.payment_mode)
    )?;
    writeln!(out, "</tr></table>")?;

    // Line items
    writeln!(out, "<table class=\"items\">")?;
    writeln!(
        out,
        "<tr><th>S.No.</th><th>Description</th><th>Qty</th><th>Price</th><th>Dis %</th><th>Amount</th></tr>"
    )?;
    for row in &page.rows {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"num\">{}</td><td>{}</td><td class=\"num\">{}</td></tr>",
            row.serial,
            escape(&row.description),
            row.quantity,
            row.unit_price,
            row.discount_percent,
            row.amount
        )?;
    }
    writeln!(out, "</table>")?;

    if page.is_last {
        write_summary(out, doc)?;
    } else {
        writeln!(out, "<p>Continued on page {}</p>", page.number + 1)?;
    }

    writeln!(
        out,
        "<p class=\"footer\">Page {} of {}</p>",
        page.number, page.total_pages
    )?;
    writeln!(out, "</section>")
}

fn write_summary(out: &mut String, doc: &InvoiceDocument) -> std::fmt::Result {
    let company = &doc.company;
    let figures = &doc.figures;
    let tax = &doc.tax;

    writeln!(
        out,
        "<p><strong>Total In Words:</strong> <em>{}</em></p>",
        escape(&doc.amount_in_words)
    )?;

    writeln!(out, "<table class=\"totals\">")?;
    let lines = [
        ("Subtotal".to_string(), &figures.subtotal),
        (format!("SGST ({}%)", tax.sgst_rate), &figures.sgst),
        (format!("CGST ({}%)", tax.cgst_rate), &figures.cgst),
        ("Round Off".to_string(), &figures.round_off),
    ];
    for (label, value) in lines {
        writeln!(
            out,
            "<tr><td>{}</td><td class=\"num\">{}</td></tr>",
            label, value
        )?;
    }
    writeln!(
        out,
        "<tr class=\"grand\"><td>GRAND TOTAL</td><td class=\"num\">{}</td></tr>",
        figures.grand_total
    )?;
    writeln!(
        out,
        "<tr><td>Paid Amount</td><td class=\"num\">{}</td></tr>",
        figures.paid_amount
    )?;
    writeln!(
        out,
        "<tr><td>Balance</td><td class=\"num\">{}</td></tr>",
        figures.balance
    )?;
    writeln!(out, "</table>")?;

    writeln!(out, "<h4>Bank Details</h4>")?;
    writeln!(
        out,
        "<p>Name : {}<br>Bank : {}<br>A/c No : {}<br>IFSC : {}<br>UPI ID : {}</p>",
        escape(or_dash(&company.bank_holder)),
        escape(or_dash(&company.bank_name)),
        escape(or_dash(&company.account_number)),
        escape(or_dash(&company.ifsc)),
        escape(or_dash(&company.upi_id))
    )?;

    writeln!(out, "<h4>Terms &amp; Conditions:</h4>")?;
    writeln!(out, "<p>{}</p>", escape_lines(&company.terms))?;
    writeln!(out, "<p class=\"num\">For {}</p>", escape(&company.name))
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        EMPTY_FIELD
    } else {
        value
    }
}

/// Escapes text for element content and attribute values.
pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn escape_lines(text: &str) -> String {
    text.lines().map(escape).collect::<Vec<_>>().join("<br>")
}
