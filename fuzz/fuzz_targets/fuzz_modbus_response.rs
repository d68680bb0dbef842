//! Fuzz target: `parse_read_response`
//!
//! Feeds arbitrary serial-line bytes to the NPK response parser. It must
//! never panic, and anything it accepts with CRC checking on must be a
//! frame whose CRC really matches.
//!
//! cargo fuzz run fuzz_modbus_response

#![no_main]

use agrimon::codec::modbus::{RESPONSE_LEN, crc_matches};
use agrimon::codec::parse_read_response;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if parse_read_response(data, true).is_ok() {
        assert!(crc_matches(&data[..RESPONSE_LEN]));
    }
    let lenient = parse_read_response(data, false);
    assert_eq!(lenient.is_ok(), data.len() >= RESPONSE_LEN);
});
