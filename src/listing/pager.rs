//! Page-window computation for the ticket listing.

use crate::error::{DeskError, Result};

/// Rows per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: i64 = 40;

/// A validated page window. Ordering is fixed by the store query
/// (`updated_at DESC`), the pager only decides the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page_size: i64,
    page_number: i64,
    offset: i64,
    all: bool,
}

impl Pager {
    /// Validate a 1-based page number given as text (default "1").
    pub fn new(page_size: i64, page_number: Option<&str>, all: bool) -> Result<Self> {
        if page_size <= 0 {
            return Err(DeskError::invalid(
                "page_size",
                format!("must be positive, got {}", page_size),
            ));
        }

        let raw = page_number.map(str::trim).unwrap_or("1");
        let page_number: i64 = raw
            .parse()
            .map_err(|_| DeskError::invalid("page_number", format!("'{}' is not a number", raw)))?;
        if page_number <= 0 {
            return Err(DeskError::invalid(
                "page_number",
                format!("must be >= 1, got {}", page_number),
            ));
        }

        let offset = (page_number - 1).checked_mul(page_size).ok_or_else(|| {
            DeskError::invalid(
                "page_number",
                format!("{} is past the last addressable page", page_number),
            )
        })?;

        Ok(Self {
            page_size,
            page_number,
            offset,
            all,
        })
    }

    pub fn page_number(&self) -> i64 {
        self.page_number
    }

    /// `None` when the full result was requested.
    pub fn limit(&self) -> Option<i64> {
        (!self.all).then_some(self.page_size)
    }

    pub fn offset(&self) -> Option<i64> {
        (!self.all).then_some(self.offset)
    }

    /// More rows exist past this window.
    pub fn has_more(&self, total: i64, returned: usize) -> bool {
        total > self.offset().unwrap_or(0).saturating_add(returned as i64)
    }
}
