//! Periodic publish cycle.
//!
//! ```text
//!   stamp time ─▶ snapshot() ─┬─▶ local sinks (always: console summary, CSV)
//!                             └─▶ build_payload ─▶ remote sinks (skipped if empty)
//! ```
//!
//! Sinks are independent: one failing never stops the others, and nothing
//! here retries. The next cycle simply publishes whatever is current then.

use core::time::Duration;

use chrono::NaiveDateTime;
use log::{debug, info, warn};

use crate::app::ports::{EntryId, LocalSink, Payload, RemoteSink};
use crate::config::FieldMapping;
use crate::error::SinkError;
use crate::snapshot::{Reading, Snapshot, SnapshotStore};
use crate::task::CancelToken;

/// Timestamp source; swapped out in tests.
pub type Clock = fn() -> NaiveDateTime;

pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Map available snapshot channels onto remote field names.
///
/// Unavailable channels and non-finite values are left out, so the payload
/// may have fewer fields than the mapping.
pub fn build_payload(snapshot: &Snapshot, mapping: &FieldMapping) -> Payload {
    let mut payload = Payload::new();
    for entry in mapping {
        match snapshot.reading(entry.channel) {
            Reading::Value(v) if v.is_finite() => payload.push(entry.field.as_str(), v),
            Reading::Value(v) => {
                warn!(
                    "Publisher: {} has non-numeric value {}, skipped",
                    entry.channel, v
                );
            }
            Reading::Unavailable => {
                debug!("Publisher: {} unavailable, {} omitted", entry.channel, entry.field);
            }
        }
    }
    payload
}

/// Per-sink results of one publish cycle.
#[derive(Debug, Default)]
pub struct PublishReport {
    pub fields: usize,
    pub remote: Vec<(&'static str, Result<EntryId, SinkError>)>,
    pub local: Vec<(&'static str, Result<(), SinkError>)>,
}

pub struct Publisher {
    mapping: FieldMapping,
    remote: Vec<Box<dyn RemoteSink + Send>>,
    local: Vec<Box<dyn LocalSink + Send>>,
    clock: Clock,
}

impl Publisher {
    pub fn new(mapping: FieldMapping) -> Self {
        Self {
            mapping,
            remote: Vec::new(),
            local: Vec::new(),
            clock: local_now,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn add_remote(&mut self, sink: Box<dyn RemoteSink + Send>) {
        info!("Publisher: remote sink '{}' registered", sink.name());
        self.remote.push(sink);
    }

    pub fn add_local(&mut self, sink: Box<dyn LocalSink + Send>) {
        info!("Publisher: local sink '{}' registered", sink.name());
        self.local.push(sink);
    }

    /// Stamp, copy and deliver the current snapshot to every sink.
    pub fn publish_cycle(&mut self, store: &SnapshotStore) -> PublishReport {
        store.stamp((self.clock)());
        let snapshot = store.snapshot();
        let payload = build_payload(&snapshot, &self.mapping);
        let mut report = PublishReport {
            fields: payload.len(),
            ..PublishReport::default()
        };

        for sink in &mut self.local {
            let result = sink.record(&snapshot);
            if let Err(e) = &result {
                warn!("Publisher: {} failed: {}", sink.name(), e);
            }
            report.local.push((sink.name(), result));
        }

        if payload.is_empty() {
            warn!("Publisher: no valid numeric fields, remote publish skipped");
        } else {
            for sink in &mut self.remote {
                let result = sink.publish(&payload);
                match &result {
                    Ok(EntryId(id)) => {
                        info!(
                            "Publisher: {} accepted entry {} ({} fields)",
                            sink.name(),
                            id,
                            payload.len()
                        );
                    }
                    Err(e) => warn!("Publisher: {} failed: {}", sink.name(), e),
                }
                report.remote.push((sink.name(), result));
            }
        }
        report
    }
}

/// Publish every `interval` after an initial `warmup`, until cancelled.
pub async fn run_publisher(
    mut publisher: Publisher,
    store: &SnapshotStore,
    warmup: Duration,
    interval: Duration,
    cancel: &CancelToken,
) {
    info!(
        "Publisher: first cycle in {:?}, then every {:?}",
        warmup, interval
    );
    if cancel.sleep(warmup).await {
        return;
    }
    loop {
        publisher.publish_cycle(store);
        if cancel.sleep(interval).await {
            break;
        }
    }
    info!("Publisher: stopped");
}
