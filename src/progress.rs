use std::time::Duration;

use crate::domain::DataSourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub source: DataSourceId,
    pub level: ProgressLevel,
    pub message: String,
    pub elapsed: Option<Duration>,
}

/// Receiver for stage boundaries and failures.
///
/// Adapters hold an optional sink; without one they stay silent and only
/// return errors.
pub trait ProgressSink: Send + Sync {
    fn event(&self, event: ProgressEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn event(&self, event: ProgressEvent) {
        let source = event.source.to_string();
        let elapsed_ms = event.elapsed.map(|elapsed| elapsed.as_millis() as u64);
        match event.level {
            ProgressLevel::Info => {
                tracing::info!(source = %source, elapsed_ms = ?elapsed_ms, "{}", event.message)
            }
            ProgressLevel::Warn => {
                tracing::warn!(source = %source, "{}", event.message)
            }
            ProgressLevel::Error => {
                tracing::error!(source = %source, "{}", event.message)
            }
        }
    }
}
