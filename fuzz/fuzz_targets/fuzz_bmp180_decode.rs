//! Fuzz target: BMP180 calibration and compensation
//!
//! 22 calibration bytes followed by the raw temperature and pressure
//! result registers, exactly as read off the bus.
//!
//! cargo fuzz run fuzz_bmp180_decode

#![no_main]

use agrimon::codec::bmp180::{CALIBRATION_LEN, raw_pressure_from_bytes};
use agrimon::codec::{Calibration, decode_bmp180};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((cal, rest)) = data.split_first_chunk::<CALIBRATION_LEN>() else {
        return;
    };
    let Some((t, rest)) = rest.split_first_chunk::<2>() else {
        return;
    };
    let Some((p, _)) = rest.split_first_chunk::<3>() else {
        return;
    };
    let Ok(cal) = Calibration::from_bytes(cal) else {
        return;
    };
    let _ = decode_bmp180(&cal, u16::from_be_bytes(*t), raw_pressure_from_bytes(*p));
});
