//! # Pagination
//!
//! Offset/limit arithmetic for page reads.
//!
//! ```text
//! page_size = 3
//!
//!   ids (identifier order):  1  2  3 │ 4  5  6 │ 7  8
//!                           ─────────┼─────────┼──────
//!   page_number:                1    │    2    │   3
//!   offset:                     0    │    3    │   6
//! ```
//!
//! Concatenating pages 1..n with the same size reproduces the first
//! `n * page_size` rows of the base ordering with no gaps or repeats,
//! provided nothing is written in between.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::{validate_page_number, validate_page_size, ValidationResult};

/// A validated page request (1-based page number).
///
/// Deserializing goes through [`PageRequest::new`], so a decoded request
/// obeys the same bounds as a constructed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPageRequest")]
pub struct PageRequest {
    page_number: u32,
    page_size: u32,
}

/// Wire shape of [`PageRequest`] before its bounds are checked.
#[derive(Deserialize)]
struct RawPageRequest {
    page_number: u32,
    page_size: u32,
}

impl TryFrom<RawPageRequest> for PageRequest {
    type Error = ValidationError;

    fn try_from(raw: RawPageRequest) -> Result<Self, Self::Error> {
        PageRequest::new(raw.page_number, raw.page_size)
    }
}

impl PageRequest {
    /// Creates a page request.
    ///
    /// ## Errors
    /// `ValidationError` when `page_number < 1`, `page_size < 1`
    /// or `page_size` exceeds [`MAX_PAGE_SIZE`](crate::MAX_PAGE_SIZE).
    ///
    /// ## Example
    /// ```rust
    /// use productstore_core::pagination::PageRequest;
    ///
    /// let page = PageRequest::new(3, 20).unwrap();
    /// assert_eq!(page.offset(), 40);
    /// assert_eq!(page.limit(), 20);
    ///
    /// assert!(PageRequest::new(0, 20).is_err());
    /// ```
    pub fn new(page_number: u32, page_size: u32) -> ValidationResult<Self> {
        validate_page_number(page_number)?;
        validate_page_size(page_size)?;

        Ok(PageRequest {
            page_number,
            page_size,
        })
    }

    /// First page with the given size.
    pub fn first(page_size: u32) -> ValidationResult<Self> {
        PageRequest::new(1, page_size)
    }

    /// The following page with the same size.
    pub fn next(&self) -> Self {
        PageRequest {
            page_number: self.page_number.saturating_add(1),
            page_size: self.page_size,
        }
    }

    #[inline]
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    #[inline]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Rows to skip: `(page_number - 1) * page_size`.
    ///
    /// Computed in `i64` so large page numbers cannot overflow.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page_number as i64 - 1) * self.page_size as i64
    }

    /// Maximum rows to return.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page_number: 1,
            page_size: crate::DEFAULT_PAGE_SIZE,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_and_limit() {
        let page = PageRequest::new(1, 10).unwrap();
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 10);

        let page = PageRequest::new(4, 25).unwrap();
        assert_eq!(page.offset(), 75);
    }

    #[test]
    fn test_rejects_zero_bounds() {
        assert!(matches!(
            PageRequest::new(0, 10),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            PageRequest::new(1, 0),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_next_keeps_size() {
        let page = PageRequest::first(5).unwrap().next();
        assert_eq!(page.page_number(), 2);
        assert_eq!(page.page_size(), 5);
        assert_eq!(page.offset(), 5);
    }

    #[test]
    fn test_large_page_number_does_not_overflow() {
        let page = PageRequest::new(u32::MAX, 100).unwrap();
        assert_eq!(page.offset(), (u32::MAX as i64 - 1) * 100);
    }

    #[test]
    fn test_decoding_checks_bounds() {
        let page: PageRequest =
            serde_json::from_str(r#"{"page_number":2,"page_size":50}"#).unwrap();
        assert_eq!(page, PageRequest::new(2, 50).unwrap());

        for json in [
            r#"{"page_number":0,"page_size":10}"#,
            r#"{"page_number":1,"page_size":0}"#,
            r#"{"page_number":1,"page_size":4000000000}"#,
        ] {
            let err = serde_json::from_str::<PageRequest>(json).unwrap_err();
            assert!(err.to_string().contains("page_"), "{json}: {err}");
        }
    }

    #[test]
    fn test_serialized_form_decodes_back() {
        let page = PageRequest::new(7, 25).unwrap();
        let json = serde_json::to_string(&page).unwrap();
        assert_eq!(serde_json::from_str::<PageRequest>(&json).unwrap(), page);
    }

    #[test]
    fn test_default_page() {
        let page = PageRequest::default();
        assert_eq!(page.page_number(), 1);
        assert_eq!(page.page_size(), crate::DEFAULT_PAGE_SIZE);
    }
}
