//! Row structs for the analytics read model.
//!
//! Each submodule contains a `FromRow` + `Serialize` struct matching the
//! database row and its conversion into the matching `annostat_core` record.
//! Rows whose enum columns hold unknown values convert into
//! `sqlx::Error::Decode`.

pub mod annotation;
pub mod organization;
pub mod project;
pub mod task;
pub mod user;
pub mod workspace;

/// Wraps a core validation failure as a row decode error.
pub(crate) fn decode_error(err: annostat_core::CoreError) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}
