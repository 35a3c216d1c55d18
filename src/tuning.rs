//! Tuning requests handed over by the front panel.
//!
//! The encoder, buttons and display live outside this crate. They talk to the
//! driver through a [`TuningRequest`], a plain value holding the frequency,
//! the tuning step and the selected sideband.

use crate::{FREQ_MAX, FREQ_MIN};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Sideband {
    Usb,
    Lsb,
    Am,
}

impl Sideband {
    /// Mode button order: USB, LSB, AM, back to USB.
    pub fn next(self) -> Sideband {
        match self {
            Sideband::Usb => Sideband::Lsb,
            Sideband::Lsb => Sideband::Am,
            Sideband::Am => Sideband::Usb,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TuningStep {
    Hz1,
    Hz10,
    Hz100,
    KHz1,
    KHz5,
    KHz100,
}

impl TuningStep {
    pub fn hz(self) -> u32 {
        match self {
            TuningStep::Hz1 => 1,
            TuningStep::Hz10 => 10,
            TuningStep::Hz100 => 100,
            TuningStep::KHz1 => 1_000,
            TuningStep::KHz5 => 5_000,
            TuningStep::KHz100 => 100_000,
        }
    }

    /// Step button order, wrapping from 100 kHz back to 1 Hz.
    pub fn next(self) -> TuningStep {
        match self {
            TuningStep::Hz1 => TuningStep::Hz10,
            TuningStep::Hz10 => TuningStep::Hz100,
            TuningStep::Hz100 => TuningStep::KHz1,
            TuningStep::KHz1 => TuningStep::KHz5,
            TuningStep::KHz5 => TuningStep::KHz100,
            TuningStep::KHz100 => TuningStep::Hz1,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TuningRequest {
    pub frequency: u32,
    pub step: TuningStep,
    pub sideband: Sideband,
}

impl TuningRequest {
    /// `frequency` is clamped into the tunable range.
    pub fn new(frequency: u32, step: TuningStep, sideband: Sideband) -> Self {
        TuningRequest {
            frequency: frequency.max(FREQ_MIN).min(FREQ_MAX),
            step,
            sideband,
        }
    }

    /// One encoder detent clockwise.
    pub fn tune_up(&mut self) {
        self.frequency = self.frequency.saturating_add(self.step.hz()).min(FREQ_MAX);
    }

    /// One encoder detent counter-clockwise.
    pub fn tune_down(&mut self) {
        self.frequency = self.frequency.saturating_sub(self.step.hz()).max(FREQ_MIN);
    }
}

impl Default for TuningRequest {
    fn default() -> Self {
        TuningRequest::new(7_100_000, TuningStep::KHz1, Sideband::Lsb)
    }
}
