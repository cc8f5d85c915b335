//! # Draft Commands
//!
//! Editing the bill on screen. Every command returns the whole draft with
//! freshly computed totals, so the screen never does arithmetic.
//!
//! ## Entry Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Description  Brand  Qty  Price  Dis%   [Add]                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  invoke('add_line_item', { item: {...} })                              │
//! │       │                                                                 │
//! │       ├── qty outside 1..=9999? ──► VALIDATION_ERROR                   │
//! │       ├── 100 rows already?     ──► VALIDATION_ERROR                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  { draft: {...}, totals: { subtotal, sgst, cgst, grandTotal, ... } }   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use kirana_core::{CustomerSnapshot, InvoiceTotals, Money, PaymentMode, TaxRate};

use crate::error::ApiError;
use crate::state::{AppState, Draft, LineItemInput, LineItemUpdate};

/// Draft plus its totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub draft: Draft,
    pub totals: InvoiceTotals,
}

impl DraftView {
    fn of(draft: &Draft) -> Result<Self, ApiError> {
        Ok(DraftView {
            totals: draft.totals()?,
            draft: draft.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLineItemArgs {
    pub item: LineItemInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLineItemArgs {
    pub id: String,
    pub update: LineItemUpdate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLineItemArgs {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTaxRateArgs {
    pub tax_rate: TaxRate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPaidAmountArgs {
    pub paid_amount: Money,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCustomerArgs {
    pub customer: CustomerSnapshot,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPaymentModeArgs {
    /// Any casing of `UPI`, `CASH`, `CARD`, `NET BANKING`.
    pub payment_mode: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDueDateArgs {
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

pub fn get_draft(app: &AppState) -> Result<DraftView, ApiError> {
    app.draft.with_draft(DraftView::of)
}

pub fn add_line_item(app: &AppState, args: AddLineItemArgs) -> Result<DraftView, ApiError> {
    app.draft.with_draft_mut(|draft| {
        let item = draft.add_item(args.item)?;
        debug!(item_id = %item.id, description = %item.description, "Line item added");
        DraftView::of(draft)
    })
}

pub fn update_line_item(app: &AppState, args: UpdateLineItemArgs) -> Result<DraftView, ApiError> {
    app.draft.with_draft_mut(|draft| {
        draft.update_item(&args.id, args.update)?;
        debug!(item_id = %args.id, "Line item updated");
        DraftView::of(draft)
    })
}

pub fn remove_line_item(app: &AppState, args: RemoveLineItemArgs) -> Result<DraftView, ApiError> {
    app.draft.with_draft_mut(|draft| {
        draft.remove_item(&args.id)?;
        debug!(item_id = %args.id, "Line item removed");
        DraftView::of(draft)
    })
}

pub fn set_tax_rate(app: &AppState, args: SetTaxRateArgs) -> Result<DraftView, ApiError> {
    app.draft.with_draft_mut(|draft| {
        draft.set_tax_rate(args.tax_rate)?;
        DraftView::of(draft)
    })
}

pub fn set_paid_amount(app: &AppState, args: SetPaidAmountArgs) -> Result<DraftView, ApiError> {
    app.draft.with_draft_mut(|draft| {
        draft.set_paid_amount(args.paid_amount)?;
        DraftView::of(draft)
    })
}

pub fn set_customer(app: &AppState, args: SetCustomerArgs) -> Result<DraftView, ApiError> {
    app.draft.with_draft_mut(|draft| {
        draft.set_customer(args.customer);
        DraftView::of(draft)
    })
}

pub fn set_payment_mode(app: &AppState, args: SetPaymentModeArgs) -> Result<DraftView, ApiError> {
    let mode: PaymentMode = args.payment_mode.parse()?;
    app.draft.with_draft_mut(|draft| {
        draft.set_payment_mode(mode);
        DraftView::of(draft)
    })
}

pub fn set_due_date(app: &AppState, args: SetDueDateArgs) -> Result<DraftView, ApiError> {
    app.draft.with_draft_mut(|draft| {
        draft.set_due_date(args.due_date);
        DraftView::of(draft)
    })
}

pub fn clear_draft(app: &AppState) -> Result<DraftView, ApiError> {
    app.draft.with_draft_mut(|draft| {
        draft.clear();
        DraftView::of(draft)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::{ConfigState, DbState};
    use kirana_db::InMemoryStore;
    use rust_decimal::Decimal;

    fn app() -> AppState {
        AppState::new(ConfigState::default(), DbState::in_memory(InMemoryStore::new()))
    }

    fn tv() -> AddLineItemArgs {
        AddLineItemArgs {
            item: LineItemInput {
                description: "Samsung LED TV 43\"".to_string(),
                brand: Some("Samsung".to_string()),
                quantity: 1,
                unit_price: Money::from_rupees(32000),
                discount_percent: Decimal::ZERO,
            },
        }
    }

    #[test]
    fn test_new_draft_uses_configured_tax_rate() {
        let view = get_draft(&app()).unwrap();
        assert_eq!(view.draft.tax_rate, TaxRate::from_percent_u32(18));
        assert!(view.totals.grand_total.is_zero());
    }

    #[test]
    fn test_add_item_returns_totals() {
        let app = app();
        let view = add_line_item(&app, tv()).unwrap();

        assert_eq!(view.draft.items.len(), 1);
        assert_eq!(view.totals.subtotal, Money::from_rupees(32000));
        assert_eq!(view.totals.sgst, Money::from_rupees(2880));
        assert_eq!(view.totals.grand_total, Money::from_rupees(37760));
    }

    #[test]
    fn test_unknown_item_is_not_found() {
        let err = remove_line_item(
            &app(),
            RemoveLineItemArgs {
                id: "nope".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_payment_mode_parsing() {
        let app = app();
        let view = set_payment_mode(
            &app,
            SetPaymentModeArgs {
                payment_mode: "net banking".to_string(),
            },
        )
        .unwrap();
        assert_eq!(view.draft.payment_mode, PaymentMode::NetBanking);

        let err = set_payment_mode(
            &app,
            SetPaymentModeArgs {
                payment_mode: "cheque".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_clear_draft() {
        let app = app();
        add_line_item(&app, tv()).unwrap();
        set_paid_amount(
            &app,
            SetPaidAmountArgs {
                paid_amount: Money::from_rupees(100),
            },
        )
        .unwrap();

        let view = clear_draft(&app).unwrap();
        assert!(view.draft.items.is_empty());
        assert!(view.draft.paid_amount.is_zero());
    }
}
