//! Append-only CSV log of every published snapshot.
//!
//! Column order is fixed so the file stays loadable by the spreadsheets
//! that already consume it. Missing values are written as `N/A`. The
//! header goes in only when the file is new or empty.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app::ports::LocalSink;
use crate::channel::Channel;
use crate::error::SinkError;
use crate::snapshot::{Reading, Snapshot};

pub const NOT_AVAILABLE: &str = "N/A";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const CSV_COLUMNS: [&str; 24] = [
    "timestamp",
    "air_temp_c",
    "humidity_percent",
    "water_soil_temp_c",
    "air_pressure_hpa",
    "air_pressure_status",
    "soil_moisture_raw",
    "soil_moisture_status",
    "light_level_raw",
    "light_level_status",
    "rain_level_raw",
    "rain_level_status",
    "co2_ppm",
    "nh3_ppm",
    "voc_ppm",
    "nitrogen_mg_kg",
    "nitrogen_status",
    "phosphorus_mg_kg",
    "phosphorus_status",
    "potassium_mg_kg",
    "potassium_status",
    "altitude_m",
    "water_soil_temp_status",
    "air_quality_status",
];

/// One CSV row as ordered column → cell pairs.
pub type Record = Vec<(&'static str, String)>;

/// Text for a channel value, or `N/A`.
pub fn format_reading(channel: Channel, reading: Reading) -> String {
    match reading {
        Reading::Value(v) => format!("{:.*}", channel.precision(), v),
        Reading::Unavailable => NOT_AVAILABLE.to_string(),
    }
}

/// Render every channel and status label of a snapshot.
pub fn snapshot_record(snapshot: &Snapshot) -> Record {
    let mut record = Vec::with_capacity(CSV_COLUMNS.len());
    record.push((
        "timestamp",
        snapshot.timestamp.map_or_else(
            || NOT_AVAILABLE.to_string(),
            |t| t.format(TIMESTAMP_FORMAT).to_string(),
        ),
    ));
    for (channel, state) in snapshot.iter() {
        record.push((channel.key(), format_reading(channel, state.reading)));
        if let Some(key) = channel.status_key() {
            let label = state
                .status
                .map_or(NOT_AVAILABLE, |s| s.as_str())
                .to_string();
            record.push((key, label));
        }
    }
    record
}

fn quote(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

pub struct CsvLogSink {
    path: PathBuf,
}

impl CsvLogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row in [`CSV_COLUMNS`] order. Unknown columns are ignored.
    pub fn append(&mut self, record: &[(&str, String)]) -> Result<(), SinkError> {
        let needs_header = fs::metadata(&self.path).map_or(true, |m| m.len() == 0);

        let mut out = String::new();
        if needs_header {
            out.push_str(&CSV_COLUMNS.join(","));
            out.push('\n');
        }
        let row: Vec<String> = CSV_COLUMNS
            .iter()
            .map(|col| {
                record
                    .iter()
                    .find(|(k, _)| k == col)
                    .map_or_else(|| NOT_AVAILABLE.to_string(), |(_, v)| quote(v))
            })
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|_| SinkError::Io)?;
        file.write_all(out.as_bytes()).map_err(|_| SinkError::Io)
    }
}

impl LocalSink for CsvLogSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn record(&mut self, snapshot: &Snapshot) -> Result<(), SinkError> {
        self.append(&snapshot_record(snapshot))
    }
}
