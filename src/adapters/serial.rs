//! RS-485 line to the NPK probe via the `serialport` crate.
//!
//! The port is opened 8N1 at the configured baud rate. A read keeps
//! collecting bytes until the buffer is full or the caller's timeout
//! expires, since a USB-RS485 adapter often delivers a frame in pieces.

use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use log::debug;
use serialport::{ClearBuffer, DataBits, Parity, SerialPort as _, StopBits};

use crate::app::ports::SerialPort;
use crate::error::TransportError;

/// Granularity of the underlying blocking read.
const POLL_SLICE: Duration = Duration::from_millis(50);

pub struct SerialLine {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialLine {
    pub fn open(device: &Path, baud: u32) -> Result<Self, TransportError> {
        let port = serialport::new(device.to_string_lossy(), baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(POLL_SLICE)
            .open()
            .map_err(|e| {
                debug!("Serial: open {} failed: {}", device.display(), e);
                match e.kind() {
                    serialport::ErrorKind::NoDevice => TransportError::NotPresent,
                    _ => TransportError::Io,
                }
            })?;
        Ok(Self { port })
    }
}

/// Read into `buf` until it is full, the stream ends, or `deadline` passes.
pub fn fill_until<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    deadline: Instant,
) -> Result<usize, TransportError> {
    let mut got = 0;
    while got < buf.len() {
        match reader.read(&mut buf[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                if Instant::now() >= deadline {
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(got)
}

impl SerialPort for SerialLine {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, TransportError> {
        fill_until(&mut self.port, buf, Instant::now() + timeout)
    }

    fn discard_input(&mut self) -> Result<(), TransportError> {
        self.port
            .clear(ClearBuffer::Input)
            .map_err(|_| TransportError::Io)
    }
}
