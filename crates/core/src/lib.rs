//! Annotation analytics reporting core.
//!
//! Pure computation over a [`records::Dataset`] snapshot: stage
//! classification, metric extraction, aggregation, period partitioning and
//! report composition. No database, no I/O, no clock.

pub mod aggregate;
pub mod capability;
pub mod compose;
pub mod error;
pub mod metrics;
pub mod period;
pub mod records;
pub mod reports;
pub mod stage;
pub mod types;

#[cfg(test)]
mod fixtures;

pub use compose::{ComposedReport, ReportRow};
pub use error::CoreError;
pub use reports::{compute_report, ReportRequest, ReportScope};
