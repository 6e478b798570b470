//! Delivery seam for rendered reports.

use async_trait::async_trait;

use crate::email::EmailError;

/// A rendered report ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivers rendered reports somewhere outside the process.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn send(&self, email: &ReportEmail) -> Result<(), EmailError>;
}

/// Sink used when SMTP is not configured: logs and discards.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl ReportSink for LogSink {
    async fn send(&self, email: &ReportEmail) -> Result<(), EmailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            bytes = email.html.len(),
            "SMTP not configured, report email logged only",
        );
        Ok(())
    }
}
