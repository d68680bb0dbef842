//! Modbus-RTU framing for single-register holding reads.
//!
//! Query (8 bytes):
//! ```text
//! ┌──────┬──────┬──────────────┬──────────────┬──────────────┐
//! │ addr │ 0x03 │ register (BE)│ count=1 (BE) │ CRC-16 (LE)  │
//! └──────┴──────┴──────────────┴──────────────┴──────────────┘
//! ```
//! Response (7 bytes):
//! ```text
//! ┌──────┬──────┬──────────┬──────────────┬──────────────┐
//! │ addr │ 0x03 │ bytes=2  │ value (BE)   │ CRC-16 (LE)  │
//! └──────┴──────┴──────────┴──────────────┴──────────────┘
//! ```
//!
//! The NPK probe answers one register per query. Only the value bytes at
//! offsets 3..5 are interpreted; the byte-count field is not checked.

use crate::error::DecodeError;

/// Function code: read holding registers.
pub const FN_READ_HOLDING: u8 = 0x03;

pub const QUERY_LEN: usize = 8;
pub const RESPONSE_LEN: usize = 7;

/// CRC-16/Modbus: init 0xFFFF, reflected poly 0xA001, no final xor.
pub fn crc16_modbus(bytes: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &b in bytes {
        crc ^= u16::from(b);
        for _ in 0..8 {
            if crc & 1 == 0 {
                crc >>= 1;
            } else {
                crc = (crc >> 1) ^ 0xA001;
            }
        }
    }
    crc
}

/// Build a read-holding-registers query for a single register.
pub fn build_read_query(address: u8, register: u16) -> [u8; QUERY_LEN] {
    let [reg_hi, reg_lo] = register.to_be_bytes();
    let mut frame = [address, FN_READ_HOLDING, reg_hi, reg_lo, 0x00, 0x01, 0, 0];
    let crc = crc16_modbus(&frame[..6]).to_le_bytes();
    frame[6..].copy_from_slice(&crc);
    frame
}

/// True when the trailing two bytes hold the CRC of everything before them.
pub fn crc_matches(frame: &[u8]) -> bool {
    let Some(split) = frame.len().checked_sub(2) else {
        return false;
    };
    let (body, tail) = frame.split_at(split);
    crc16_modbus(body).to_le_bytes() == tail
}

/// Extract the register value from a read response.
///
/// `verify_crc` checks the CRC over the first seven bytes; some probes
/// ship with broken CRC generation, so it can be turned off.
pub fn parse_read_response(response: &[u8], verify_crc: bool) -> Result<u16, DecodeError> {
    if response.len() < RESPONSE_LEN {
        return Err(DecodeError::MalformedPayload);
    }
    if verify_crc && !crc_matches(&response[..RESPONSE_LEN]) {
        return Err(DecodeError::CrcInvalid);
    }
    Ok(u16::from_be_bytes([response[3], response[4]]))
}

/// Build a well-formed single-register response. Used by simulated probes.
pub fn build_read_response(address: u8, value: u16) -> [u8; RESPONSE_LEN] {
    let [hi, lo] = value.to_be_bytes();
    let mut frame = [address, FN_READ_HOLDING, 0x02, hi, lo, 0, 0];
    let crc = crc16_modbus(&frame[..5]).to_le_bytes();
    frame[5..].copy_from_slice(&crc);
    frame
}
