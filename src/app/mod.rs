//! Application layer.
//!
//! [`ports`] defines the traits every device and destination is reached
//! through; [`service`] wires readers, buses and the publisher into a
//! running [`Agent`](service::Agent).

pub mod ports;
pub mod service;
