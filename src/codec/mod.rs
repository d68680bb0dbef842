//! Pure decoding and classification routines.
//!
//! Nothing in here touches a bus or a clock, which keeps every routine
//! testable with literal byte vectors and fuzzable in isolation.

pub mod bmp180;
pub mod classify;
pub mod gas;
pub mod modbus;
pub mod onewire;

pub use bmp180::{Calibration, calculate_altitude, decode_bmp180};
pub use classify::{Breakpoint, BreakpointTable, Direction, classify};
pub use gas::{GasCurve, gas_concentration_ppm, sensor_resistance};
pub use modbus::{build_read_query, crc16_modbus, parse_read_response};
pub use onewire::parse_one_wire_text;
