//! Fuzz target: `parse_one_wire_text`
//!
//! Arbitrary sysfs contents, including invalid UTF-8 passed through
//! lossily the way the adapter reads them.
//!
//! cargo fuzz run fuzz_onewire_text

#![no_main]

use agrimon::codec::parse_one_wire_text;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    if let Ok(c) = parse_one_wire_text(&text) {
        assert!((-55.0..=125.0).contains(&c), "accepted {c}");
    }
});
