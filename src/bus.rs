//! Byte-level I²C adapter.
//!
//! Small firmwares often drive I²C through a handful of primitives (START,
//! STOP, write one byte and sample the ACK) rather than a full
//! `embedded_hal` implementation. [`ByteBus`] turns such a primitive set into
//! the blocking `Write`/`WriteRead` traits the driver is built on.

use crate::hal::blocking::i2c::{Write, WriteRead};
use thiserror::Error;

/// Bus primitives, one bit-level transaction step each.
pub trait ByteLevelI2c {
    type Error;

    /// START condition. Precondition: SCL and SDA high.
    fn start(&mut self) -> Result<(), Self::Error>;
    /// Repeated START, issued while the bus is held.
    fn restart(&mut self) -> Result<(), Self::Error>;
    /// STOP condition, releases the bus.
    fn stop(&mut self) -> Result<(), Self::Error>;
    /// Shifts out `data` MSB first and returns whether the slave acked it.
    fn write(&mut self, data: u8) -> Result<bool, Self::Error>;
    /// Shifts in one byte, answering with ACK when `ack` is set.
    fn read(&mut self, ack: bool) -> Result<u8, Self::Error>;
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum BusError<E> {
    #[error("I2C bus fault")]
    Bus(E),
    #[error("I2C slave did not acknowledge")]
    Nack,
}

/// `embedded_hal` blocking I²C on top of [`ByteLevelI2c`] primitives.
pub struct ByteBus<B> {
    bus: B,
}

impl<B: ByteLevelI2c> ByteBus<B> {
    pub fn new(bus: B) -> Self {
        ByteBus { bus }
    }

    pub fn release(self) -> B {
        self.bus
    }

    fn send(&mut self, byte: u8) -> Result<(), BusError<B::Error>> {
        if self.bus.write(byte).map_err(BusError::Bus)? {
            Ok(())
        } else {
            Err(BusError::Nack)
        }
    }

    fn send_all(&mut self, address: u8, bytes: &[u8]) -> Result<(), BusError<B::Error>> {
        self.send(address << 1)?;
        for &byte in bytes {
            self.send(byte)?;
        }
        Ok(())
    }

    fn receive(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), BusError<B::Error>> {
        self.send(address << 1 | 1)?;
        let last = buffer.len().saturating_sub(1);
        for (i, byte) in buffer.iter_mut().enumerate() {
            // NACK the final byte so the slave lets go of SDA
            *byte = self.bus.read(i != last).map_err(BusError::Bus)?;
        }
        Ok(())
    }

    /// Runs `body` between START and STOP; STOP is sent even if `body` fails.
    fn transaction<F>(&mut self, body: F) -> Result<(), BusError<B::Error>>
    where
        F: FnOnce(&mut Self) -> Result<(), BusError<B::Error>>,
    {
        self.bus.start().map_err(BusError::Bus)?;
        let result = body(self);
        let stopped = self.bus.stop().map_err(BusError::Bus);
        result.and(stopped)
    }
}

impl<B: ByteLevelI2c> Write for ByteBus<B> {
    type Error = BusError<B::Error>;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.transaction(|bus| bus.send_all(address, bytes))
    }
}

impl<B: ByteLevelI2c> WriteRead for ByteBus<B> {
    type Error = BusError<B::Error>;

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.transaction(|bus| {
            bus.send_all(address, bytes)?;
            if buffer.is_empty() {
                return Ok(());
            }
            bus.bus.restart().map_err(BusError::Bus)?;
            bus.receive(address, buffer)
        })
    }
}
