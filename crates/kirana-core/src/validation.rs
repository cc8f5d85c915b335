//! # Validation Module
//!
//! Input validation utilities for Kirana Billing.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Draft editing (counter app)                                  │
//! │  ├── Entry checks (empty description, quantity ceiling)                │
//! │  └── Immediate feedback, nothing stored                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Calculator / document model                                  │
//! │  └── THIS MODULE: the same rules, re-checked on every computation      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE (invoice number, customer phone)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kirana_core::validation::{normalize_phone, validate_quantity};
//!
//! assert!(validate_quantity(5).is_ok());
//! assert_eq!(normalize_phone("+91 98765-43210").unwrap(), "9876543210");
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::{Money, TaxRate};
use crate::types::LineItem;
use crate::{MAX_ITEM_QUANTITY, MAX_LINE_ITEMS, MAX_UNIT_PRICE_RUPEES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Digits in an Indian mobile number.
pub const PHONE_DIGITS: usize = 10;

/// Characters in a GSTIN.
pub const GSTIN_LENGTH: usize = 15;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a line item description.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
pub fn validate_description(description: &str) -> ValidationResult<()> {
    let description = description.trim();

    if description.is_empty() {
        return Err(ValidationError::required("description"));
    }

    if description.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Example
/// ```rust
/// use kirana_core::validation::validate_product_name;
///
/// assert!(validate_product_name("HP Laptop i5").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a customer name.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("customer name"));
    }

    if name.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "customer name".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates a search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Normalizes a phone number to ten bare digits.
///
/// ## Rules
/// - Separators (spaces, dashes, brackets) are dropped
/// - A leading `91` country code on a 12 digit number is dropped
/// - Exactly ten digits must remain
///
/// ## Example
/// ```rust
/// use kirana_core::validation::normalize_phone;
///
/// assert_eq!(normalize_phone("98765 43210").unwrap(), "9876543210");
/// assert!(normalize_phone("12345").is_err());
/// assert!(normalize_phone("").is_err());
/// ```
pub fn normalize_phone(phone: &str) -> ValidationResult<String> {
    if phone.trim().is_empty() {
        return Err(ValidationError::required("phone"));
    }

    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    let digits = if digits.len() == PHONE_DIGITS + 2 && digits.starts_with("91") {
        digits[2..].to_string()
    } else {
        digits
    };

    if digits.len() != PHONE_DIGITS {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: format!("must contain {} digits", PHONE_DIGITS),
        });
    }

    Ok(digits)
}

/// Formats a phone number for print as `XXXXX XXXXX`.
///
/// Uses the first ten digits; shorter input is returned as its digits.
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone
        .chars()
        .filter(char::is_ascii_digit)
        .take(PHONE_DIGITS)
        .collect();

    if digits.len() < PHONE_DIGITS {
        return digits;
    }

    format!("{} {}", &digits[..5], &digits[5..])
}

/// Validates an optional GSTIN.
///
/// Blank input means "no GSTIN". Anything else is upper-cased and must be
/// fifteen letters or digits.
///
/// ## Example
/// ```rust
/// use kirana_core::validation::validate_gstin;
///
/// assert_eq!(validate_gstin("").unwrap(), None);
/// assert_eq!(
///     validate_gstin("29abcde1234f1z5").unwrap().as_deref(),
///     Some("29ABCDE1234F1Z5")
/// );
/// assert!(validate_gstin("29ABC").is_err());
/// ```
pub fn validate_gstin(gstin: &str) -> ValidationResult<Option<String>> {
    let gstin = gstin.trim();

    if gstin.is_empty() {
        return Ok(None);
    }

    if gstin.chars().count() != GSTIN_LENGTH || !gstin.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "gstin".to_string(),
            reason: format!("must be {} letters or digits", GSTIN_LENGTH),
        });
    }

    Ok(Some(gstin.to_ascii_uppercase()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a quantity typed at the counter.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Draft: Add Item                                                        │
/// │                                                                         │
/// │  User enters quantity: 5                                               │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_entry_quantity(5) ← THIS FUNCTION                            │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       ├── qty > 9999? → Error: "quantity must be between 1 and 9999"   │
/// │       │                                                                 │
/// │       └── OK → Row added to the draft                                  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_entry_quantity(qty: i64) -> ValidationResult<()> {
    validate_quantity(qty)?;

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: "1".to_string(),
            max: MAX_ITEM_QUANTITY.to_string(),
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed (free items), anything above
/// [`MAX_UNIT_PRICE_RUPEES`] is not.
///
/// ## Example
/// ```rust
/// use kirana_core::money::Money;
/// use kirana_core::validation::validate_unit_price;
///
/// assert!(validate_unit_price(Money::from_paise(1099)).is_ok());
/// assert!(validate_unit_price(Money::zero()).is_ok());
/// assert!(validate_unit_price(Money::from_paise(-100)).is_err());
/// assert!(validate_unit_price(Money::from_rupees(1_00_00_00_001)).is_err());
/// ```
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "unit price".to_string(),
        });
    }

    if price > Money::from_rupees(MAX_UNIT_PRICE_RUPEES) {
        return Err(ValidationError::OutOfRange {
            field: "unit price".to_string(),
            min: "0".to_string(),
            max: MAX_UNIT_PRICE_RUPEES.to_string(),
        });
    }

    Ok(())
}

/// Validates a percentage discount, inclusive `[0, 100]`.
pub fn validate_discount_percent(percent: Decimal) -> ValidationResult<()> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
        });
    }

    Ok(())
}

/// Validates a GST rate. Any non-negative percentage is accepted.
pub fn validate_tax_rate(rate: TaxRate) -> ValidationResult<()> {
    if rate.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "tax rate".to_string(),
        });
    }

    Ok(())
}

/// Validates the amount received against a bill.
///
/// Zero is allowed (credit sale); overpayment is allowed and shows as a
/// negative balance.
pub fn validate_paid_amount(paid: Money) -> ValidationResult<()> {
    if paid.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "paid amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates every field of a line item.
pub fn validate_line_item(item: &LineItem) -> ValidationResult<()> {
    validate_description(&item.description)?;
    validate_quantity(item.quantity)?;
    validate_unit_price(item.unit_price)?;
    validate_discount_percent(item.discount_percent)?;
    Ok(())
}

/// Validates that one more row fits on the bill.
pub fn validate_line_item_count(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_LINE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "line items".to_string(),
            min: "1".to_string(),
            max: MAX_LINE_ITEMS.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use kirana_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required("id"));
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
