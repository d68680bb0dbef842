//! Agrimon: field-station telemetry agent.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  HalI2c(I2cdev)        SerialLine       IioDht · W1Sysfs     │
//! │  SimI2cBus             SimNpkProbe      SimDht22 · SimOneWire│
//! │  (BMP180 + ADS1115)    (Modbus RTU)                          │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  Agent: readers ──▶ SnapshotStore ──▶ Publisher        │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  LogSummarySink · CsvLogSink · ThingSpeakSink(UreqClient)    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```bash
//! agrimon -c /etc/agrimon.json           # real station, run until killed
//! agrimon --simulate                     # simulated station
//! agrimon --simulate --once -c site.json # one publish cycle, then exit
//! agrimon --simulate --duration 600 -v   # ten minutes with debug logging
//! ```

#![deny(unused_must_use)]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::info;

use agrimon::adapters::sim;
use agrimon::app::service::{Agent, Hardware, build_publisher};
use agrimon::config::AgentConfig;

#[derive(Parser)]
#[command(
    name = "agrimon",
    about = "Multi-sensor agricultural telemetry agent",
    version
)]
struct Cli {
    /// JSON configuration file. Missing keys take their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Drive the agent from the simulated field station.
    #[arg(long)]
    simulate: bool,

    /// Run a single publish cycle after the warm-up, then exit.
    #[arg(long)]
    once: bool,

    /// Stop after this many seconds instead of running forever.
    #[arg(long, value_name = "SECS")]
    duration: Option<u64>,

    /// Verbose logging (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[cfg(target_os = "linux")]
#[allow(clippy::unnecessary_wraps)]
fn field_station(config: &AgentConfig) -> Result<Hardware> {
    Ok(agrimon::adapters::linux::station(config))
}

#[cfg(not(target_os = "linux"))]
fn field_station(_: &AgentConfig) -> Result<Hardware> {
    anyhow::bail!("real sensor buses need Linux; run with --simulate")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    info!("╔══════════════════════════════════════╗");
    info!("║  Agrimon v{:<27}║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 1. Configuration ──────────────────────────────────────
    let config = AgentConfig::load(cli.config.as_deref())?;
    info!(
        "Config: publish every {} s, readers {:?}",
        config.timing.publish_interval_secs, config.timing.readers
    );

    // ── 2. Hardware ───────────────────────────────────────────
    let hw = if cli.simulate {
        info!("Hardware: simulated field station");
        sim::station(&config)
    } else {
        field_station(&config)?
    };

    // ── 3. Readers ────────────────────────────────────────────
    let mut agent = Agent::new();
    agent.start_readers(&config, hw)?;

    // ── 4. Publisher ──────────────────────────────────────────
    let mut publisher = build_publisher(&config);
    let warmup = Duration::from_millis(config.timing.publish_warmup_ms);

    if cli.once {
        std::thread::sleep(warmup);
        let report = publisher.publish_cycle(agent.store());
        info!(
            "Single cycle: {} fields, {} remote, {} local sinks",
            report.fields,
            report.remote.len(),
            report.local.len()
        );
        agent.shutdown();
        return Ok(());
    }

    agent.spawn_publisher(
        publisher,
        warmup,
        Duration::from_secs(config.timing.publish_interval_secs),
    )?;
    info!("System ready.");

    match cli.duration {
        Some(secs) => {
            std::thread::sleep(Duration::from_secs(secs));
            agent.shutdown();
        }
        None => agent.wait(),
    }
    Ok(())
}
