//! # Text Receipt Renderer
//!
//! Fixed-width plain text for thermal receipt printers (32, 42 or 48
//! columns). Also what the command runner prints for a quick look at a bill.

use kirana_core::InvoiceDocument;

use super::{file_name, RenderError, RenderJob, RenderedDocument, Renderer};

const NAME: &str = "text";

/// Narrowest width the item table still fits in.
pub const MIN_RECEIPT_WIDTH: usize = 32;

/// Paper width used when none is configured.
pub const DEFAULT_RECEIPT_WIDTH: usize = 42;

/// Plain-text receipt renderer.
#[derive(Debug, Clone, Copy)]
pub struct TextReceiptRenderer {
    width: usize,
}

impl TextReceiptRenderer {
    /// Widths below [`MIN_RECEIPT_WIDTH`] are raised to it.
    pub fn new(width: usize) -> Self {
        TextReceiptRenderer {
            width: width.max(MIN_RECEIPT_WIDTH),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Builds the receipt text.
    pub fn lay_out(&self, document: &InvoiceDocument) -> Result<RenderedDocument, RenderError> {
        if document.rows.is_empty() {
            return Err(RenderError::layout(NAME, "document has no rows"));
        }

        let w = self.width;
        let company = &document.company;
        let meta = &document.meta;
        let customer = &document.customer;
        let figures = &document.figures;
        let tax = &document.tax;

        let mut lines: Vec<String> = Vec::new();
        let rule = "-".repeat(w);

        lines.push(center(&company.name.to_uppercase(), w));
        for line in company.address.lines() {
            lines.push(center(line.trim(), w));
        }
        lines.push(center(&format!("Ph: {}", company.mobile), w));
        if !company.gstin.trim().is_empty() {
            lines.push(center(&format!("GSTIN: {}", company.gstin), w));
        }
        lines.push(rule.clone());

        lines.push(spread("Invoice No", &meta.invoice_number, w));
        if meta.is_provisional {
            lines.push(center("** PROVISIONAL NUMBER **", w));
        }
        lines.push(spread("Date", &format!("{} {}", meta.date, meta.time), w));
        lines.push(spread("Pay Mode", &meta.payment_mode, w));
        lines.push(spread("Customer", &customer.name, w));
        lines.push(spread("Phone", &customer.phone, w));
        lines.push(rule.clone());

        // Description wraps onto its own line; the figures line below it
        // carries qty x price and amount.
        for row in &document.rows {
            lines.push(truncate(&format!("{}. {}", row.serial, row.description), w));
            let mut detail = format!("   {} x {}", row.quantity, row.unit_price);
            if row.discount_percent != "0" {
                detail.push_str(&format!(" -{}%", row.discount_percent));
            }
            lines.push(spread(&detail, &row.amount, w));
        }
        lines.push(rule.clone());

        lines.push(spread("Subtotal", &figures.subtotal, w));
        lines.push(spread(&format!("SGST {}%", tax.sgst_rate), &figures.sgst, w));
        lines.push(spread(&format!("CGST {}%", tax.cgst_rate), &figures.cgst, w));
        lines.push(spread("Round Off", &figures.round_off, w));
        lines.push(rule.clone());
        lines.push(spread("GRAND TOTAL", &figures.grand_total, w));
        lines.push(spread("Paid", &figures.paid_amount, w));
        lines.push(spread("Balance", &figures.balance, w));
        lines.push(rule);

        lines.extend(wrap(&document.amount_in_words, w));
        lines.push(String::new());
        lines.push(center("Thank you for your business!", w));

        let mut body = lines.join("\n");
        body.push('\n');

        Ok(RenderedDocument {
            renderer: NAME,
            invoice_number: meta.invoice_number.clone(),
            file_name: file_name(document, "txt"),
            media_type: "text/plain",
            body,
        })
    }
}

impl Default for TextReceiptRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_RECEIPT_WIDTH)
    }
}

impl Renderer for TextReceiptRenderer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn render(&self, document: &InvoiceDocument) -> RenderJob {
        let renderer = *self;
        let document = document.clone();
        RenderJob::spawn(NAME, move || renderer.lay_out(&document))
    }
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

fn center(text: &str, width: usize) -> String {
    let text = truncate(text, width);
    let pad = (width - text.chars().count()) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

/// Left label, right-aligned value, at least one space between.
fn spread(label: &str, value: &str, width: usize) -> String {
    let value_len = value.chars().count();
    let room = width.saturating_sub(value_len + 1);
    let label = truncate(label, room);
    let gap = width.saturating_sub(label.chars().count() + value_len).max(1);
    format!("{}{}{}", label, " ".repeat(gap), value)
}

/// Greedy word wrap.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::tv_document;

    #[test]
    fn test_every_line_fits_the_paper() {
        for width in [32, 42, 48] {
            let rendered = TextReceiptRenderer::new(width)
                .lay_out(&tv_document(10))
                .unwrap();
            for line in rendered.body.lines() {
                assert!(
                    line.chars().count() <= width,
                    "{} chars > {}: {:?}",
                    line.chars().count(),
                    width,
                    line
                );
            }
        }
    }

    #[test]
    fn test_tv_receipt_figures() {
        let rendered = TextReceiptRenderer::default().lay_out(&tv_document(10)).unwrap();
        let body = &rendered.body;

        assert_eq!(rendered.file_name, "Invoice_2401150004.txt");
        assert!(body.contains("   1 x 32000.00"));
        assert!(body.lines().any(|l| l.starts_with("GRAND TOTAL") && l.ends_with("37760.00")));
        assert!(body.lines().any(|l| l.starts_with("SGST 9%") && l.ends_with("2880.00")));
        assert!(body.contains("Thirty Seven Thousand"));
    }

    #[test]
    fn test_narrow_width_is_raised() {
        assert_eq!(TextReceiptRenderer::new(10).width(), MIN_RECEIPT_WIDTH);
    }

    #[test]
    fn test_spread_and_wrap() {
        assert_eq!(spread("Paid", "10.00", 12), "Paid   10.00");
        assert_eq!(spread("A very long label", "10.00", 12), "A very 10.00");
        assert_eq!(
            wrap("One Lakh Rupees Only", 9),
            vec!["One Lakh", "Rupees", "Only"]
        );
    }
}
