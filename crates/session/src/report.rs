// Error reporting collaborator.
//
// Failures never propagate out of the session. They are turned into a
// `Report` and handed to whatever reporter the host installed.

use serde::Serialize;

/// One reported failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Human-facing summary, e.g. "Error saving note".
    pub message: String,
    /// Rendered error.
    pub error: String,
    /// Where it happened, e.g. `notes/documents/7 PUT`.
    pub context: String,
}

impl Report {
    pub fn new(
        message: impl Into<String>,
        error: &dyn std::error::Error,
        context: impl Into<String>,
    ) -> Self {
        Self { message: message.into(), error: error.to_string(), context: context.into() }
    }
}

/// Fire-and-forget sink for failures.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, report: &Report);
}

/// Default reporter: one `error!` event per report.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, report: &Report) {
        tracing::error!(
            error = %report.error,
            context = %report.context,
            "{}",
            report.message
        );
    }
}
