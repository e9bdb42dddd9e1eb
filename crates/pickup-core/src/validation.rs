//! # Validation Module
//!
//! Input checks applied before any transaction opens.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller-facing collaborator                                   │
//! │  ├── Parses ids, enums, dates, pagination                              │
//! │  └── Rejects malformed requests                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Orchestrator boundary                                        │
//! │  └── THIS MODULE: time window and pagination bounds                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (PostgreSQL)                                        │
//! │  ├── Enum types, NOT NULL, foreign keys                                │
//! │  └── Partial unique index: one in-progress reception per point         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::MAX_PAGE_SIZE;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a report window.
///
/// ## Rules
/// - `end` must not precede `start` (equal bounds are a valid instant window)
///
/// ## Example
/// ```rust
/// use chrono::{Duration, Utc};
/// use pickup_core::validation::validate_time_range;
///
/// let now = Utc::now();
/// assert!(validate_time_range(now, now + Duration::hours(1)).is_ok());
/// assert!(validate_time_range(now, now - Duration::hours(1)).is_err());
/// ```
pub fn validate_time_range(start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<()> {
    if end < start {
        return Err(CoreError::InvalidTimeRange);
    }
    Ok(())
}

/// Validates a 1-based page number.
///
/// Page 0 is rejected, never clamped to 1.
pub fn validate_page(page: u32) -> ValidationResult<()> {
    if page < 1 {
        return Err(ValidationError::MustBePositive {
            field: "page".to_string(),
        });
    }
    Ok(())
}

/// Validates a page size.
///
/// ## Rules
/// - Must be between 1 and [`MAX_PAGE_SIZE`] inclusive
pub fn validate_page_size(page_size: u32) -> ValidationResult<()> {
    if page_size < 1 || page_size > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "page_size".to_string(),
            min: 1,
            max: i64::from(MAX_PAGE_SIZE),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
