//! Agrimon field-station telemetry agent.
//!
//! Independent sensor readers write into a shared snapshot; a publisher
//! periodically copies it out to the console, a CSV log and ThingSpeak.
//! Every device sits behind a trait in [`app::ports`], so the same agent
//! runs against the Linux field station, the simulated station in
//! [`adapters::sim`], or test mocks.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod bus;
pub mod channel;
pub mod codec;
pub mod config;
pub mod error;
pub mod publisher;
pub mod sensors;
pub mod snapshot;
pub mod task;
