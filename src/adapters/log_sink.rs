//! Log-based summary sink.
//!
//! Implements [`LocalSink`] by writing a human-readable report of every
//! channel to the logger each publish cycle, so a field technician tailing
//! the journal sees the same figures the dashboard gets.

use log::info;

use crate::app::ports::LocalSink;
use crate::error::SinkError;
use crate::snapshot::{Reading, Snapshot};

use super::csv_log::TIMESTAMP_FORMAT;

/// Adapter that logs every published [`Snapshot`].
pub struct LogSummarySink;

impl LogSummarySink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogSummarySink {
    fn default() -> Self {
        Self::new()
    }
}

/// One summary line per channel, e.g. `Soil Moisture: 17000 counts [Optimal]`.
pub fn summary_lines(snapshot: &Snapshot) -> Vec<String> {
    snapshot
        .iter()
        .map(|(channel, state)| {
            let value = match state.reading {
                Reading::Value(v) => {
                    format!("{:.*} {}", channel.precision(), v, channel.unit().symbol())
                }
                Reading::Unavailable => "N/A".to_string(),
            };
            match state.status {
                Some(s) => format!("{}: {} [{}]", channel.label(), value, s),
                None => format!("{}: {}", channel.label(), value),
            }
        })
        .collect()
}

impl LocalSink for LogSummarySink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn record(&mut self, snapshot: &Snapshot) -> Result<(), SinkError> {
        let when = snapshot
            .timestamp
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default();
        info!(
            "READINGS | {} | {}/{} channels available",
            when,
            snapshot.available_count(),
            crate::channel::Channel::COUNT
        );
        for line in summary_lines(snapshot) {
            info!("  {}", line);
        }
        Ok(())
    }
}
