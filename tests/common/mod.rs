#![allow(dead_code)]

use embedded_hal::blocking::i2c::{Write, WriteRead};
use tracing_subscriber::EnvFilter;

pub const DEVICE_ADDRESS: u8 = 0x60;

/// In-memory Si5351 register file with auto-incrementing writes.
pub struct RegisterFile {
    pub regs: [u8; 256],
    /// Every register write, in bus order.
    pub writes: Vec<(u8, u8)>,
    /// Number of transactions to accept before failing all further ones.
    pub fail_after: Option<usize>,
    transactions: usize,
}

impl RegisterFile {
    pub fn new() -> Self {
        RegisterFile {
            regs: [0; 256],
            writes: Vec::new(),
            fail_after: None,
            transactions: 0,
        }
    }

    pub fn frame(&self, base: u8) -> [u8; 8] {
        let mut frame = [0u8; 8];
        frame.copy_from_slice(&self.regs[base as usize..base as usize + 8]);
        frame
    }

    pub fn written_addresses(&self) -> Vec<u8> {
        self.writes.iter().map(|&(reg, _)| reg).collect()
    }

    fn transaction(&mut self, address: u8) -> Result<(), ()> {
        assert_eq!(address, DEVICE_ADDRESS);
        if let Some(limit) = self.fail_after {
            if self.transactions >= limit {
                return Err(());
            }
        }
        self.transactions += 1;
        Ok(())
    }
}

impl Write for RegisterFile {
    type Error = ();

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), ()> {
        self.transaction(address)?;
        let base = bytes[0];
        for (i, &byte) in bytes[1..].iter().enumerate() {
            let reg = base.wrapping_add(i as u8);
            self.regs[reg as usize] = byte;
            self.writes.push((reg, byte));
        }
        Ok(())
    }
}

impl WriteRead for RegisterFile {
    type Error = ();

    fn write_read(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), ()> {
        self.transaction(address)?;
        let base = bytes[0];
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = self.regs[base.wrapping_add(i as u8) as usize];
        }
        Ok(())
    }
}

/// Decodes P1 of an integer Multisynth frame back into its divider.
pub fn multisynth_divider(frame: [u8; 8]) -> u32 {
    let p1 = (((frame[2] & 0b11) as u32) << 16) | ((frame[3] as u32) << 8) | frame[4] as u32;
    (p1 + 512) / 128
}

pub fn init_logging() {
    let log_level =
        EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("error,si5351_iq=trace"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .without_time()
        .with_test_writer()
        .try_init();
}
