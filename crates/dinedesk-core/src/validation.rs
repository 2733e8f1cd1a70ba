//! # Validation Module
//!
//! Input validation for checkout and menu administration.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Frontend form (empty fields, immediate feedback)              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (business rules, run before any store write)      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Document store (no schema: whatever reaches it is kept)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use dinedesk_core::validation::{validate_group_name, validate_quantity};
//!
//! assert_eq!(validate_group_name("  午饭群  ").unwrap(), "午饭群");
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::MenuItem;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_GROUP_NAME_CHARS: usize = 50;
const MAX_NOTES_CHARS: usize = 500;
const MAX_NAME_CHARS: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates the customer's group nickname and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 50 characters
pub fn validate_group_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "groupName".to_string(),
        });
    }

    if name.chars().count() > MAX_GROUP_NAME_CHARS {
        return Err(ValidationError::TooLong {
            field: "groupName".to_string(),
            max: MAX_GROUP_NAME_CHARS,
        });
    }

    Ok(name.to_string())
}

/// Normalizes optional order notes: trimmed, empty becomes `None`.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if notes.chars().count() > MAX_NOTES_CHARS {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_CHARS,
        });
    }

    Ok(Some(notes.to_string()))
}

/// Validates a dish or category name.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_CHARS {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_CHARS,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed.
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates a menu item before it is written by staff.
///
/// Checks the name, the base price and every option price.
pub fn validate_menu_item(item: &MenuItem) -> ValidationResult<()> {
    validate_name("name", &item.name)?;
    validate_price_cents("price", item.price_cents)?;

    for group in &item.custom_options {
        validate_name("option group title", &group.title)?;
        for option in &group.options {
            validate_name("option name", &option.name)?;
            if let Some(cents) = option.price_cents {
                validate_price_cents("option price", cents)?;
            }
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MenuOption, OptionGroup};

    #[test]
    fn test_validate_group_name() {
        assert_eq!(validate_group_name(" 三楼 ").unwrap(), "三楼");
        assert!(validate_group_name("").is_err());
        assert!(validate_group_name("   ").is_err());
        assert!(validate_group_name(&"群".repeat(51)).is_err());
        assert!(validate_group_name(&"群".repeat(50)).is_ok());
    }

    #[test]
    fn test_validate_notes() {
        assert_eq!(validate_notes(None).unwrap(), None);
        assert_eq!(validate_notes(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_notes(Some(" 少辣 ")).unwrap(),
            Some("少辣".to_string())
        );
        assert!(validate_notes(Some(&"x".repeat(501))).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_menu_item() {
        let mut item = MenuItem {
            id: "1".to_string(),
            name: "煎饺".to_string(),
            description: String::new(),
            price_cents: 1500,
            image_url: String::new(),
            category: "3".to_string(),
            available: true,
            custom_options: vec![OptionGroup {
                kind: "size".to_string(),
                title: "份量".to_string(),
                required: true,
                options: vec![MenuOption {
                    id: "large".to_string(),
                    name: "大份(12个)".to_string(),
                    price_cents: Some(300),
                    is_default: false,
                }],
            }],
        };
        assert!(validate_menu_item(&item).is_ok());

        item.custom_options[0].options[0].price_cents = Some(-1);
        assert!(validate_menu_item(&item).is_err());

        item.custom_options.clear();
        item.name = " ".to_string();
        assert!(validate_menu_item(&item).is_err());
    }
}
