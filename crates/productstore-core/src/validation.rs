//! Field rules applied before any statement is issued.
//!
//! The schema repeats some of these as `CHECK` constraints. Checking here
//! first means a bad request fails as [`ValidationError`] naming the field,
//! instead of as a constraint violation from SQLite.
//!
//! ```rust
//! use productstore_core::validation::{validate_page_size, validate_product_name};
//!
//! assert!(validate_product_name("Widget").is_ok());
//! assert!(validate_page_size(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{NewProduct, Product};
use crate::MAX_PAGE_SIZE;

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest product name accepted, counted in characters.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;

fn must_be_positive(field: &str) -> ValidationError {
    ValidationError::MustBePositive {
        field: field.to_string(),
    }
}

/// A name is non-blank and at most [`MAX_PRODUCT_NAME_LEN`] characters.
/// Surrounding whitespace does not count toward either rule.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let trimmed = name.trim();
    match trimmed.chars().count() {
        0 => Err(ValidationError::Required {
            field: "name".to_string(),
        }),
        n if n > MAX_PRODUCT_NAME_LEN => Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        }),
        _ => Ok(()),
    }
}

/// Zero is a valid price. Negative prices are not.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents >= 0 {
        return Ok(());
    }
    Err(ValidationError::OutOfRange {
        field: "price".to_string(),
        min: 0,
        max: i64::MAX,
    })
}

/// Ids are assigned from 1 upward, so anything below 1 can't name a row.
pub fn validate_id(field: &str, raw: i64) -> ValidationResult<()> {
    if raw > 0 {
        Ok(())
    } else {
        Err(must_be_positive(field))
    }
}

/// Pages are numbered from 1.
pub fn validate_page_number(page_number: u32) -> ValidationResult<()> {
    if page_number == 0 {
        return Err(must_be_positive("page_number"));
    }
    Ok(())
}

/// `1..=MAX_PAGE_SIZE`.
pub fn validate_page_size(page_size: u32) -> ValidationResult<()> {
    if page_size == 0 {
        return Err(must_be_positive("page_size"));
    }
    if page_size > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "page_size".to_string(),
            min: 1,
            max: i64::from(MAX_PAGE_SIZE),
        });
    }
    Ok(())
}

pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    validate_price_cents(product.price_cents)
}

/// Same rules as [`validate_new_product`], plus the id of the row to update.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_id("product_id", product.id.get())?;
    validate_product_name(&product.name)?;
    validate_price_cents(product.price_cents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product(name: &str, price_cents: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price_cents,
        }
    }

    #[test]
    fn test_product_name_rules() {
        assert!(validate_product_name("Widget").is_ok());
        assert!(validate_product_name(&"A".repeat(MAX_PRODUCT_NAME_LEN)).is_ok());

        assert_eq!(
            validate_product_name("  \t "),
            Err(ValidationError::Required { field: "name".into() })
        );
        assert_eq!(
            validate_product_name(&"A".repeat(MAX_PRODUCT_NAME_LEN + 1)),
            Err(ValidationError::TooLong { field: "name".into(), max: MAX_PRODUCT_NAME_LEN })
        );
    }

    #[test]
    fn test_name_length_counts_characters() {
        let name = "é".repeat(MAX_PRODUCT_NAME_LEN);
        assert!(name.len() > MAX_PRODUCT_NAME_LEN);
        assert!(validate_product_name(&name).is_ok());
    }

    #[test]
    fn test_price_allows_zero_only_from_below() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(999).is_ok());
        assert!(matches!(
            validate_price_cents(-1),
            Err(ValidationError::OutOfRange { min: 0, .. })
        ));
    }

    #[test]
    fn test_ids_start_at_one() {
        assert!(validate_id("order_id", 1).is_ok());
        for raw in [0, -3] {
            assert_eq!(
                validate_id("order_id", raw),
                Err(ValidationError::MustBePositive { field: "order_id".into() })
            );
        }
    }

    #[test]
    fn test_page_bounds() {
        assert!(validate_page_number(1).is_ok());
        assert!(validate_page_number(0).is_err());

        assert!(validate_page_size(1).is_ok());
        assert!(validate_page_size(MAX_PAGE_SIZE).is_ok());
        assert!(validate_page_size(0).is_err());
        assert!(validate_page_size(MAX_PAGE_SIZE + 1).is_err());
    }

    #[test]
    fn test_new_product_checks_every_field() {
        assert!(validate_new_product(&new_product("Widget", 999)).is_ok());
        assert_eq!(validate_new_product(&new_product("", 999)).unwrap_err().field(), "name");
        assert_eq!(validate_new_product(&new_product("Widget", -1)).unwrap_err().field(), "price");
    }
}
