//! Page requests and the paging envelope wrapped around listing results.

use serde::{Deserialize, Serialize};

/// Page used when the caller supplies a non-positive page.
pub const DEFAULT_PAGE: i64 = 1;

/// Rows per page used when the caller supplies a non-positive value.
pub const DEFAULT_ROWS_PER_PAGE: i64 = 10;

/// Caller-side page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pagination {
    /// One-based page number.
    pub page: i64,
    /// Maximum number of rows per page.
    pub rows_per_page: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_ROWS_PER_PAGE)
    }
}

impl Pagination {
    /// Creates a page request without normalising it.
    #[must_use]
    pub const fn new(page: i64, rows_per_page: i64) -> Self {
        Self {
            page,
            rows_per_page,
        }
    }

    /// Replaces non-positive values with the defaults.
    #[must_use]
    pub const fn normalize(self) -> Self {
        self.normalize_with(DEFAULT_ROWS_PER_PAGE)
    }

    /// Replaces non-positive values, using `default_rows_per_page` for the
    /// page size. A non-positive default falls back to
    /// [`DEFAULT_ROWS_PER_PAGE`].
    #[must_use]
    pub const fn normalize_with(self, default_rows_per_page: i64) -> Self {
        let fallback = if default_rows_per_page < 1 {
            DEFAULT_ROWS_PER_PAGE
        } else {
            default_rows_per_page
        };
        Self {
            page: if self.page < 1 { DEFAULT_PAGE } else { self.page },
            rows_per_page: if self.rows_per_page < 1 {
                fallback
            } else {
                self.rows_per_page
            },
        }
    }

    /// Returns the largest page whose offset fits in an `i64`.
    #[must_use]
    pub fn max_page(&self) -> i64 {
        i64::MAX
            .checked_div(self.rows_per_page.max(1))
            .map_or(DEFAULT_PAGE, |quotient| {
                quotient.saturating_sub(1).max(DEFAULT_PAGE)
            })
    }

    /// Returns the page clamped to [`Self::max_page`].
    #[must_use]
    pub fn clamped_page(&self) -> i64 {
        self.page.max(DEFAULT_PAGE).min(self.max_page())
    }

    /// Returns the number of rows to skip: `rows_per_page * (page - 1)`
    /// computed on the clamped page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.rows_per_page
            .max(1)
            .saturating_mul(self.clamped_page().saturating_sub(1))
    }

    /// Returns the page size as a row limit.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.rows_per_page.max(1)
    }
}

/// Listing result with paging metadata.
///
/// `retrieved` counts the returned rows, not the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Page number the payload belongs to.
    pub page: i64,
    /// Requested page size.
    pub rows_per_page: i64,
    /// Number of rows in `payload`.
    pub retrieved: usize,
    /// Returned rows.
    pub payload: Vec<T>,
}

impl<T> Page<T> {
    /// Wraps a payload with the metadata of the page request. The reported
    /// page is the clamped page the offset was computed from.
    #[must_use]
    pub fn wrap(pagination: Pagination, payload: Vec<T>) -> Self {
        Self {
            page: pagination.clamped_page(),
            rows_per_page: pagination.rows_per_page,
            retrieved: payload.len(),
            payload,
        }
    }

    /// Converts every payload item, keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        let payload: Vec<U> = self.payload.into_iter().map(f).collect();
        Page {
            page: self.page,
            rows_per_page: self.rows_per_page,
            retrieved: payload.len(),
            payload,
        }
    }
}
