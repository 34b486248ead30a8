//! Warning sink
//!
//! Receives advisory messages produced during option resolution, such as
//! unrecognized option names. A sink failure is logged and never aborts the
//! resolution that produced the warning.

use anyhow::Result;

/// Destination for advisory warnings
pub trait WarningSink: Send + Sync {
    fn warn(&self, message: &str) -> Result<()>;
}

/// Sink that forwards warnings to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingWarningSink;

impl WarningSink for TracingWarningSink {
    fn warn(&self, message: &str) -> Result<()> {
        tracing::warn!("{}", message);
        Ok(())
    }
}

/// Deliver a warning, logging (not propagating) sink failures
pub(crate) fn deliver(sink: &dyn WarningSink, message: &str) {
    if let Err(e) = sink.warn(message) {
        tracing::error!("Warning sink failed: {:#}", e);
    }
}
