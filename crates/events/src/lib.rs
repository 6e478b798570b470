//! Report delivery.
//!
//! Heavy reports are computed off the request path and emailed:
//!
//! - [`ReportDispatcher`] / [`DispatchWorker`]: bounded job queue and the
//!   background loop that loads a snapshot, computes and delivers.
//! - [`render`]: HTML table rendering of a composed report.
//! - [`ReportSink`]: delivery seam with SMTP ([`SmtpSink`]) and logging
//!   ([`LogSink`]) implementations.

pub mod dispatcher;
pub mod email;
pub mod render;
pub mod sink;

pub use dispatcher::{DispatchError, DispatchWorker, ReportDispatcher, ReportJob};
pub use email::{EmailConfig, EmailError, SmtpSink};
pub use sink::{LogSink, ReportEmail, ReportSink};
