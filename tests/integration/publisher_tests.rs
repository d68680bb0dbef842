//! Publish cycle against real sinks: CSV file on disk and ThingSpeak over
//! a loopback HTTP server.

use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use chrono::NaiveDateTime;

use agrimon::adapters::csv_log::{CSV_COLUMNS, CsvLogSink};
use agrimon::adapters::http::UreqClient;
use agrimon::adapters::thingspeak::ThingSpeakSink;
use agrimon::app::ports::EntryId;
use agrimon::channel::{Channel, Status};
use agrimon::config::default_field_mapping;
use agrimon::error::SinkError;
use agrimon::publisher::Publisher;
use agrimon::snapshot::{Reading, SnapshotStore};

use crate::mock_hw::RecordingRemote;

fn dawn() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2024-05-01 06:30:00", "%Y-%m-%d %H:%M:%S").unwrap()
}

fn scratch_csv(tag: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!("agrimon-it-{tag}-{}.csv", std::process::id()));
    let _ = fs::remove_file(&p);
    p
}

fn field_store() -> SnapshotStore {
    let store = SnapshotStore::new();
    store.write_field(Channel::AirTemperature, Reading::Value(21.456));
    store.write_field(Channel::Humidity, Reading::Value(63.0));
    store.write(Channel::SoilMoisture, Reading::Value(24_000.0), Some(Status::Dry));
    store.write(Channel::AirPressure, Reading::Value(1009.5), Some(Status::Normal));
    store
}

/// Answer one request with `body`, handing back the request line.
fn one_shot_server(body: &'static str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://127.0.0.1:{}/update", listener.local_addr().unwrap().port());
    let handle = thread::spawn(move || {
        let (mut conn, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 512];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = conn.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let reply = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        conn.write_all(reply.as_bytes()).unwrap();
        String::from_utf8_lossy(&request)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string()
    });
    (url, handle)
}

#[test]
fn csv_row_matches_snapshot() {
    let path = scratch_csv("row");
    let mut publisher = Publisher::new(default_field_mapping()).with_clock(dawn);
    publisher.add_local(Box::new(CsvLogSink::new(&path)));

    let report = publisher.publish_cycle(&field_store());
    assert_eq!(report.local, vec![("csv", Ok(()))]);

    let text = fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next().unwrap(), CSV_COLUMNS.join(","));
    let row: Vec<&str> = lines.next().unwrap().split(',').collect();
    let cell = |name: &str| row[CSV_COLUMNS.iter().position(|c| *c == name).unwrap()];
    assert_eq!(cell("timestamp"), "2024-05-01 06:30:00");
    assert_eq!(cell("air_temp_c"), "21.46");
    assert_eq!(cell("soil_moisture_raw"), "24000");
    assert_eq!(cell("soil_moisture_status"), "Dry");
    assert_eq!(cell("air_pressure_status"), "Normal");
    assert_eq!(cell("nitrogen_mg_kg"), "N/A");
    assert_eq!(cell("nitrogen_status"), "N/A");
    let _ = fs::remove_file(&path);
}

#[test]
fn remote_failure_does_not_lose_local_record() {
    let path = scratch_csv("remote-fail");
    let remote = RecordingRemote::failing(SinkError::Network);
    let mut publisher = Publisher::new(default_field_mapping()).with_clock(dawn);
    publisher.add_local(Box::new(CsvLogSink::new(&path)));
    publisher.add_remote(Box::new(remote.clone()));

    let report = publisher.publish_cycle(&field_store());
    assert_eq!(report.remote, vec![("recording-remote", Err(SinkError::Network))]);
    assert_eq!(report.local, vec![("csv", Ok(()))]);
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);

    let sent = remote.seen.lock().unwrap();
    assert_eq!(sent[0].len(), 3);
    assert_eq!(sent[0].get("field1"), Some(21.456));
    assert_eq!(sent[0].get("field2"), Some(63.0));
    assert_eq!(sent[0].get("field4"), Some(24_000.0));
    let _ = fs::remove_file(&path);
}

#[test]
fn thingspeak_update_over_loopback() {
    let (url, server) = one_shot_server("4711");
    let client = UreqClient::new(Duration::from_secs(5));
    let mut publisher = Publisher::new(default_field_mapping()).with_clock(dawn);
    publisher.add_remote(Box::new(ThingSpeakSink::new(client, url, "WRITEKEY")));

    let report = publisher.publish_cycle(&field_store());
    assert_eq!(report.remote, vec![("thingspeak", Ok(EntryId(4711)))]);

    let request_line = server.join().unwrap();
    assert!(
        request_line.starts_with("GET /update?api_key=WRITEKEY&field1=21.456&field2=63&field4=24000 "),
        "{request_line}"
    );
}

#[test]
fn thingspeak_zero_reply_is_rejection() {
    let (url, server) = one_shot_server("0");
    let client = UreqClient::new(Duration::from_secs(5));
    let mut publisher = Publisher::new(default_field_mapping()).with_clock(dawn);
    publisher.add_remote(Box::new(ThingSpeakSink::new(client, url, "WRITEKEY")));

    let report = publisher.publish_cycle(&field_store());
    assert_eq!(report.remote, vec![("thingspeak", Err(SinkError::Rejected))]);
    server.join().unwrap();
}

#[test]
fn unreachable_endpoint_is_network_error() {
    // Bind then drop to get a port nothing listens on.
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let client = UreqClient::new(Duration::from_millis(500));
    let mut publisher = Publisher::new(default_field_mapping()).with_clock(dawn);
    publisher.add_remote(Box::new(ThingSpeakSink::new(
        client,
        format!("http://127.0.0.1:{port}/update"),
        "K",
    )));

    let report = publisher.publish_cycle(&field_store());
    assert_eq!(report.remote, vec![("thingspeak", Err(SinkError::Network))]);
}

#[test]
fn thingspeak_over_https_reaches_the_transport() {
    // Nothing listens on the port, so the failure must come from the
    // connection attempt, not from the scheme being refused.
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let client = UreqClient::new(Duration::from_millis(500));
    let mut publisher = Publisher::new(default_field_mapping()).with_clock(dawn);
    publisher.add_remote(Box::new(ThingSpeakSink::new(
        client,
        format!("https://127.0.0.1:{port}/update"),
        "KEY",
    )));

    let report = publisher.publish_cycle(&field_store());
    assert_eq!(report.remote, vec![("thingspeak", Err(SinkError::Network))]);
}
