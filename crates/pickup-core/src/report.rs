//! # Report Types
//!
//! The paginated point → reception → product report.
//!
//! ## Shape
//! ```text
//! Vec<PointReport>                 (point-first-seen order)
//!  └── PointReport { point, receptions }
//!       └── ReceptionReport { reception, products }
//!                            (receptions by start time, newest first)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::types::{Point, Product, Reception};
use crate::validation::{validate_page, validate_page_size, validate_time_range};
use crate::DEFAULT_PAGE_SIZE;

// =============================================================================
// Report Query
// =============================================================================

/// Time window and pagination for a report.
///
/// ## Example
/// ```rust
/// use chrono::{Duration, Utc};
/// use pickup_core::ReportQuery;
///
/// let end = Utc::now();
/// let query = ReportQuery::new(end - Duration::days(7), end)
///     .with_page(3)
///     .with_page_size(20);
///
/// assert!(query.validate().is_ok());
/// assert_eq!(query.offset(), 40);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportQuery {
    /// Inclusive lower bound on reception start time.
    pub start: DateTime<Utc>,
    /// Inclusive upper bound on reception start time.
    pub end: DateTime<Utc>,
    /// 1-based page number.
    pub page: u32,
    /// Receptions per page.
    pub page_size: u32,
}

impl ReportQuery {
    /// Creates a query for the first page with the default page size.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        ReportQuery {
            start,
            end,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Everything from the Unix epoch until now.
    pub fn until_now() -> Self {
        ReportQuery::new(DateTime::<Utc>::default(), Utc::now())
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Checks the window first, then pagination bounds.
    pub fn validate(&self) -> CoreResult<()> {
        validate_time_range(self.start, self.end)?;
        validate_page(self.page)?;
        validate_page_size(self.page_size)?;
        Ok(())
    }

    /// Rows to skip: `(page - 1) * page_size`.
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }

    /// Rows to fetch.
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

// =============================================================================
// Report Groupings
// =============================================================================

/// A reception together with all of its products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceptionReport {
    pub reception: Reception,
    pub products: Vec<Product>,
}

/// A point together with its receptions on the requested page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointReport {
    pub point: Point,
    pub receptions: Vec<ReceptionReport>,
}

/// Counts receptions across all groupings of a report page.
pub fn reception_count(report: &[PointReport]) -> usize {
    report.iter().map(|group| group.receptions.len()).sum()
}

// =============================================================================
// Unit Tests
// =============================================================================
