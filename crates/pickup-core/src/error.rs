//! # Error Types
//!
//! Domain-specific error types for pickup-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pickup-core errors (this file)                                        │
//! │  ├── CoreError        - Everything an orchestrator call can return     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  pickup-db errors (separate crate)                                     │
//! │  └── DbError          - Driver-level failures, never shown to callers  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ← (translated) DbError              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Categories
//! 1. **Validation** - rejected before any transaction opens, never retried
//! 2. **State conflict** - expected outcomes of business rules
//! 3. **Storage** - unexpected; the driver detail is logged, not returned

use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// Core Error
// =============================================================================

/// Errors returned by lifecycle operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// City name is not one of the supported cities.
    #[error("Invalid city: {0}")]
    InvalidCity(String),

    /// Product type name is not one of the supported types.
    #[error("Invalid product type: {0}")]
    InvalidProductType(String),

    /// Report window ends before it starts.
    #[error("Invalid time range: end precedes start")]
    InvalidTimeRange,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Point does not exist.
    #[error("Point not found: {0}")]
    PointNotFound(Uuid),

    /// Point already has a reception in progress.
    ///
    /// ## When This Occurs
    /// ```text
    /// StartReception(point)
    ///      │
    ///      ▼
    /// Active reception found? ── yes ──► ReceptionAlreadyActive
    ///      │ no
    ///      ▼
    /// Create reception (in_progress)
    /// ```
    #[error("Point {0} already has a reception in progress")]
    ReceptionAlreadyActive(Uuid),

    /// Point has no reception in progress.
    #[error("Point {0} has no reception in progress")]
    NoActiveReception(Uuid),

    /// Active reception holds no products.
    #[error("Reception {0} has no product to delete")]
    NoProductToDelete(Uuid),

    /// The store could not be reached (connection loss, pool exhausted).
    #[error("Storage unavailable")]
    StorageUnavailable,

    /// Any other storage failure. Deliberately carries no driver detail.
    #[error("Storage failure")]
    Storage,
}

impl CoreError {
    /// Returns true for input that was rejected before touching storage.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidCity(_)
                | CoreError::InvalidProductType(_)
                | CoreError::InvalidTimeRange
                | CoreError::Validation(_)
        )
    }

    /// Returns true for expected business-rule outcomes.
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            CoreError::PointNotFound(_)
                | CoreError::ReceptionAlreadyActive(_)
                | CoreError::NoActiveReception(_)
                | CoreError::NoProductToDelete(_)
        )
    }

    /// Returns true for storage failures.
    pub fn is_storage(&self) -> bool {
        matches!(self, CoreError::StorageUnavailable | CoreError::Storage)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
