//! Bridges any `embedded-hal` I2C controller to the [`I2cBus`] port.
//!
//! Lets a platform HAL (linux-embedded-hal, rppal, a bit-banged bus) drive
//! the BMP180 and ADS1115 without either reader knowing which one it is.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource};

use crate::app::ports::I2cBus;
use crate::error::TransportError;

/// Largest register write we issue (ADS1115 config is 2 bytes).
const MAX_WRITE: usize = 8;

pub struct HalI2c<T> {
    inner: T,
}

impl<T: I2c> HalI2c<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

fn map_kind(kind: ErrorKind) -> TransportError {
    match kind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address | NoAcknowledgeSource::Unknown) => {
            TransportError::Nack
        }
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
        | ErrorKind::Bus
        | ErrorKind::ArbitrationLoss
        | ErrorKind::Overrun => TransportError::Bus,
        _ => TransportError::Io,
    }
}

impl<T: I2c> I2cBus for HalI2c<T> {
    fn read_block(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), TransportError> {
        self.inner
            .write_read(address, &[register], buf)
            .map_err(|e| map_kind(e.kind()))
    }

    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), TransportError> {
        self.inner
            .write(address, &[register, value])
            .map_err(|e| map_kind(e.kind()))
    }

    fn write_block(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), TransportError> {
        let mut frame: heapless::Vec<u8, MAX_WRITE> = heapless::Vec::new();
        frame.push(register).map_err(|_| TransportError::Io)?;
        frame
            .extend_from_slice(data)
            .map_err(|()| TransportError::Io)?;
        self.inner
            .write(address, &frame)
            .map_err(|e| map_kind(e.kind()))
    }
}
