//! # pickup-core: Pure Domain Logic for Pickup Points
//!
//! Types, error taxonomy and validation shared by the storage gateway and
//! the lifecycle orchestrator. Zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pickup Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Caller collaborators (transport, auth, encoding)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ validated ids and enums                │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              pickup-service (LifecycleOrchestrator)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pickup-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  report   │  │   error   │  │validation │  │   │
//! │  │   │   Point   │  │ReportQuery│  │ CoreError │  │  window   │  │   │
//! │  │   │ Reception │  │PointReport│  │           │  │   pages   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    pickup-db (Storage Gateway)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Point, Reception, Product and their enums
//! - [`report`] - Report query and groupings
//! - [`error`] - Domain error types
//! - [`validation`] - Window and pagination checks

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use report::{PointReport, ReceptionReport, ReportQuery};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Receptions per report page when the caller does not say.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest report page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 30;
