//! # Validation Module
//!
//! Input validation for everything the cashier types or scans.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Cashier console / UI                                          │
//! │  └── Parsing (numbers, payment type tags)                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Scanner input, phone numbers, search queries                       │
//! │  └── Discounts and tendered amounts                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: REST backend                                                  │
//! │  └── Stock, pricing and tax are re-checked server side                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validators that accept free text return the normalized value, so callers
//! never send untrimmed input on.
//!
//! ## Usage
//! ```rust
//! use kasir_core::validation::{validate_barcode, validate_phone};
//!
//! assert_eq!(validate_barcode(" 089686010947 ").unwrap(), "089686010947");
//! assert_eq!(validate_phone("+62 812-3456-7890").unwrap(), "+6281234567890");
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Discount, Percentage};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a scanned or typed barcode.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 64 characters
/// - Letters, digits and hyphens only (EAN/UPC and generated codes)
///
/// ## Scan Workflow
/// ```text
/// Scanner emits "089686010947\n"
///      │
///      ▼
/// validate_barcode ← THIS FUNCTION
///      │
///      ├── blank?        → Error: "barcode is required"
///      ├── bad chars?    → Error: "barcode has invalid format"
///      │
///      └── OK → GET /stores/{store}/products/barcode/{code}
/// ```
pub fn validate_barcode(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if code.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: 64,
        });
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters, digits and hyphens".to_string(),
        });
    }

    Ok(code.to_string())
}

/// Validates a phone number for receipt delivery and returns it without
/// separators.
///
/// ## Rules
/// - Spaces, hyphens, dots and parentheses are stripped
/// - Optional leading `+`
/// - 8 to 15 digits
pub fn validate_phone(phone: &str) -> ValidationResult<String> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    let (plus, rest) = match phone.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", phone),
    };

    let digits: String = rest
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits and an optional leading +".to_string(),
        });
    }

    if !(8..=15).contains(&digits.len()) {
        return Err(ValidationError::OutOfRange {
            field: "phone digits".to_string(),
            min: 8,
            max: 15,
        });
    }

    Ok(format!("{}{}", plus, digits))
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns the first page)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a customer name for find-or-create.
pub fn validate_customer_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 100,
        });
    }

    Ok(name.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart-level discount.
///
/// ## Rules
/// - Fixed: amount >= 0 (may exceed the subtotal; settlement catches that)
/// - Percent: 0% to 100%
pub fn validate_discount(discount: &Discount) -> ValidationResult<()> {
    match discount {
        Discount::Fixed { amount } => Discount::fixed(*amount).map(|_| ()),
        Discount::Percent { rate } => Discount::percent(*rate).map(|_| ()),
    }
}

/// Validates a tendered amount.
///
/// ## Rules
/// - Must not be negative
/// - Zero is allowed (a fully discounted sale)
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

/// Parses a percent typed by the cashier ("10", "12.5", "8.25").
///
/// At most two decimals are accepted so the rate is exact in basis points.
///
/// ## Example
/// ```rust
/// use kasir_core::validation::parse_percentage;
///
/// assert_eq!(parse_percentage("12.5").unwrap().bps(), 1250);
/// assert!(parse_percentage("101").is_err());
/// assert!(parse_percentage("1.005").is_err());
/// ```
pub fn parse_percentage(input: &str) -> ValidationResult<Percentage> {
    let input = input.trim().trim_end_matches('%');
    let invalid = || ValidationError::InvalidFormat {
        field: "percent".to_string(),
        reason: "expected a number with at most two decimals".to_string(),
    };

    let (whole, frac) = match input.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (input, ""),
    };

    if whole.is_empty()
        || frac.len() > 2
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !frac.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole: u32 = whole.parse().map_err(|_| invalid())?;
    let frac: u32 = if frac.is_empty() {
        0
    } else {
        // "5" means 50 hundredths
        format!("{:0<2}", frac).parse().map_err(|_| invalid())?
    };

    let bps = whole
        .checked_mul(100)
        .and_then(|b| b.checked_add(frac))
        .ok_or_else(invalid)?;

    let rate = Percentage::from_bps(bps);
    if rate > Percentage::HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: "percent".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(rate)
}

// =============================================================================
// Unit Tests
// =============================================================================
