/*
   Copyright 2018 Ilya Epifanov

   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
/*!
A platform agnostic Rust driver for the [Si5351A] used as a quadrature (I/Q)
local oscillator, based on the [`embedded-hal`] traits.

## The Device

The Silicon Labs [Si5351A] is a three-output CMOS clock generator with an I²C
interface. This driver runs CLK0 and CLK1 from PLL A through identical integer
Multisynth dividers and uses the per-output phase offset registers to put them
90° apart, which is what a direct-conversion (Tayloe) mixer needs.

Tuning is done entirely on the PLL side: the Multisynth divider is fixed to one
of two bands (124 up to 9.05 MHz, 44 above) and the PLL multiplier is
fractional with a 20-bit denominator.

## Usage

Instantiate the device on top of any blocking `embedded_hal` I²C bus:

```no_run
# use si5351_iq::{Si5351, Si5351Device, CrystalLoad};
# fn run<I2C, E>(i2c: I2C) -> Result<(), si5351_iq::Error>
# where I2C: embedded_hal::blocking::i2c::Write<Error = E>
#     + embedded_hal::blocking::i2c::WriteRead<Error = E> {
let mut clock = Si5351Device::new(i2c, false, 24_999_117);
clock.init(CrystalLoad::_10)?;
clock.set_frequency(7_100_000)?;
# Ok(())
# }
```

Bit-banged buses that only offer START/STOP/byte primitives can be wrapped in
[`bus::ByteBus`] first.

[Si5351A]: https://www.silabs.com/documents/public/data-sheets/Si5351-B.pdf
[`embedded-hal`]: https://github.com/japaric/embedded-hal
*/
//#![deny(missing_docs)]
#![deny(warnings)]
#![no_std]

#[macro_use]
extern crate bitflags;
use embedded_hal as hal;

use crate::hal::blocking::i2c::{Write, WriteRead};
use log::{debug, info, trace, warn};
use thiserror::Error;

pub mod bus;
pub mod tuning;

pub use crate::tuning::{Sideband, TuningRequest, TuningStep};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("I2C communication error")]
    CommunicationError,
    #[error("invalid parameter")]
    InvalidParameter,
    #[error("frequency {0} Hz is outside the tuning range")]
    FrequencyOutOfRange(u32),
}

#[derive(Debug, Copy, Clone)]
pub enum CrystalLoad {
    _6,
    _8,
    _10,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Multisynth {
    MS0,
    MS1,
    MS2,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClockOutput {
    Clk0 = 0,
    Clk1,
    Clk2,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OutputDivider {
    Div1 = 0,
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
    Div64,
    Div128,
}

/// Divider band selected by the planner.
///
/// Both bands keep the PLL multiplier inside 15..=90 across 3.5 to 30 MHz.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Band {
    /// Up to and including 9.05 MHz, Multisynth divider 124.
    Low,
    /// Above 9.05 MHz, Multisynth divider 44.
    High,
}

/// When the planner issues a PLL reset.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResetPolicy {
    /// Reset on the first tune and whenever the band (output divider) changes.
    OnBandChange,
    /// Never reset from the planner; the caller takes care of it.
    Never,
}

const ADDRESS: u8 = 0b0110_0000;

/// Calibrated reference: a 25 MHz crystal minus its measured offset.
pub const XTAL_FREQ: u32 = 24_999_117;

/// Lowest tunable frequency, in Hz.
pub const FREQ_MIN: u32 = 3_500_000;

/// Highest tunable frequency, in Hz.
pub const FREQ_MAX: u32 = 30_000_000;

/// Highest frequency still served by [`Band::Low`].
pub const BAND_EDGE: u32 = 9_050_000;

/// Fixed PLL denominator, the largest 20-bit value.
pub const PLL_DENOM: u32 = 0xfffff;

const PLL_MULT_MIN: u8 = 15;
const PLL_MULT_MAX: u8 = 90;
const PHASE_MAX: u8 = 0b0111_1111;
const SYNTH_PARAM_MAX: u32 = 0xfffff;
const MS_DIV_MIN: u16 = 6;
const MS_DIV_MAX: u16 = 1800;
const SYS_INIT_POLLS: u32 = 1000;

impl Band {
    pub fn for_frequency(freq: u32) -> Band {
        if freq <= BAND_EDGE {
            Band::Low
        } else {
            Band::High
        }
    }

    /// Integer Multisynth divider for this band.
    pub fn divider(&self) -> u8 {
        match *self {
            Band::Low => 124,
            Band::High => 44,
        }
    }
}

impl Multisynth {
    fn base_addr(&self) -> u8 {
        match *self {
            Multisynth::MS0 => 42,
            Multisynth::MS1 => 50,
            Multisynth::MS2 => 58,
        }
    }

    fn ix(&self) -> u8 {
        match *self {
            Multisynth::MS0 => 0,
            Multisynth::MS1 => 1,
            Multisynth::MS2 => 2,
        }
    }
}

#[derive(Debug, Copy, Clone)]
enum Register {
    DeviceStatus = 0,
    OutputEnable = 3,
    PLLSource = 15,
    Clk0 = 16,
    Clk1 = 17,
    Clk2 = 18,
    PLLA = 26,
    Clk0PhaseOffset = 165,
    Clk1PhaseOffset = 166,
    PLLReset = 177,
    CrystalLoad = 183,
}

impl Register {
    pub fn addr(&self) -> u8 {
        *self as u8
    }
}

bitflags! {
    pub struct DeviceStatusBits: u8 {
        const SYS_INIT = 0b1000_0000;
        const LOL_B = 0b0100_0000;
        const LOL_A = 0b0010_0000;
        const LOS = 0b0001_0000;
    }
}

bitflags! {
    struct CrystalLoadBits: u8 {
        const RESERVED = 0b00_010010;
        const CL_MASK = 0b11_000000;
        const CL_6 = 0b01_000000;
        const CL_8 = 0b10_000000;
        const CL_10 = 0b11_000000;
    }
}

bitflags! {
    struct ClockControlBits: u8 {
        const CLK_PDN = 0b1000_0000;
        const MS_INT = 0b0100_0000;
        const MS_SRC = 0b0010_0000;
        const CLK_INV = 0b0001_0000;
        const CLK_SRC_MASK = 0b0000_1100;
        const CLK_SRC_XTAL = 0b0000_0000;
        const CLK_SRC_MS = 0b0000_1100;
        const CLK_DRV_MASK = 0b0000_0011;
        const CLK_DRV_2 = 0b0000_0000;
        const CLK_DRV_8 = 0b0000_0011;
    }
}

bitflags! {
    struct PLLResetBits: u8 {
        const PLLB_RST = 0b1000_0000;
        const PLLA_RST = 0b0010_0000;
    }
}

impl ClockOutput {
    fn register(self) -> Register {
        match self {
            ClockOutput::Clk0 => Register::Clk0,
            ClockOutput::Clk1 => Register::Clk1,
            ClockOutput::Clk2 => Register::Clk2,
        }
    }

    fn ix(&self) -> u8 {
        *self as u8
    }

    fn multisynth(&self) -> Multisynth {
        match *self {
            ClockOutput::Clk0 => Multisynth::MS0,
            ClockOutput::Clk1 => Multisynth::MS1,
            ClockOutput::Clk2 => Multisynth::MS2,
        }
    }

    // CLK2 carries no phase offset in this setup.
    fn phase_register(&self) -> Result<Register, Error> {
        match self {
            ClockOutput::Clk0 => Ok(Register::Clk0PhaseOffset),
            ClockOutput::Clk1 => Ok(Register::Clk1PhaseOffset),
            ClockOutput::Clk2 => Err(Error::InvalidParameter),
        }
    }
}

impl OutputDivider {
    /// R divider code, already shifted into bits 6:4.
    fn bits(&self) -> u8 {
        (*self as u8) << 4
    }

    pub fn denominator(&self) -> u8 {
        match *self {
            OutputDivider::Div1 => 1,
            OutputDivider::Div2 => 2,
            OutputDivider::Div4 => 4,
            OutputDivider::Div8 => 8,
            OutputDivider::Div16 => 16,
            OutputDivider::Div32 => 32,
            OutputDivider::Div64 => 64,
            OutputDivider::Div128 => 128,
        }
    }
}

fn i2c_error<E>(_: E) -> Error {
    Error::CommunicationError
}

/// Phase offset count that puts an output 90° ahead of a zero-offset output.
///
/// The offset unit is a quarter of the VCO period and one output period is
/// `4 * divider` of those, so a count equal to the integer output divider is
/// exactly a quarter of the output period. Bit 7 of the phase register is
/// reserved, so dividers above 127 cannot be expressed.
pub fn phase_count_for_quadrature(divider: u8) -> Result<u8, Error> {
    if divider > PHASE_MAX {
        return Err(Error::InvalidParameter);
    }
    Ok(divider)
}

/// Lays P1, P2 and P3 out over the eight parameter registers of a synth.
fn pack_synth_registers(p1: u32, p2: u32, p3: u32, r_div: u8) -> [u8; 8] {
    [
        ((p3 & 0x0000FF00) >> 8) as u8,
        p3 as u8,
        ((p1 & 0x00030000) >> 16) as u8 | r_div,
        ((p1 & 0x0000FF00) >> 8) as u8,
        p1 as u8,
        (((p3 & 0x000F0000) >> 12) | ((p2 & 0x000F0000) >> 16)) as u8,
        ((p2 & 0x0000FF00) >> 8) as u8,
        p2 as u8,
    ]
}

/// Encodes a fractional PLL multiplier `mult + num / denom`.
///
/// `mult` must be within 15..=90, `denom` within 1..=0xfffff and `num` at
/// most 0xfffff.
pub fn pll_registers(mult: u8, num: u32, denom: u32) -> Result<[u8; 8], Error> {
    if mult < PLL_MULT_MIN || mult > PLL_MULT_MAX {
        return Err(Error::InvalidParameter);
    }
    if denom == 0 || denom > SYNTH_PARAM_MAX || num > SYNTH_PARAM_MAX {
        return Err(Error::InvalidParameter);
    }

    let ratio = (128u64 * num as u64 / denom as u64) as u32;

    let p1 = 128 * mult as u32 + ratio - 512;
    let p2 = (128u64 * num as u64 - denom as u64 * ratio as u64) as u32;
    let p3 = denom;

    Ok(pack_synth_registers(p1, p2, p3, 0))
}

/// Encodes an integer Multisynth divider with its R divider.
///
/// Integer mode takes even dividers only, 6..=1800.
pub fn multisynth_int_registers(divider: u16, r_div: OutputDivider) -> Result<[u8; 8], Error> {
    if divider < MS_DIV_MIN || divider > MS_DIV_MAX || divider % 2 != 0 {
        return Err(Error::InvalidParameter);
    }

    let p1 = 128 * divider as u32 - 512;
    Ok(pack_synth_registers(p1, 0, 1, r_div.bits()))
}

/// PLL and output divider settings for one tuning frequency.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrequencyPlan {
    pub band: Band,
    pub mult: u8,
    pub num: u32,
    pub denom: u32,
    xtal_freq: u32,
}

impl FrequencyPlan {
    /// Plans `freq` against a reference of `xtal_freq` Hz.
    pub fn new(xtal_freq: u32, freq: u32) -> Result<Self, Error> {
        if freq < FREQ_MIN || freq > FREQ_MAX {
            return Err(Error::FrequencyOutOfRange(freq));
        }
        if xtal_freq == 0 {
            return Err(Error::InvalidParameter);
        }

        let band = Band::for_frequency(freq);
        let xtal = xtal_freq as u64;
        let pll_freq = band.divider() as u64 * freq as u64;

        let mult = pll_freq / xtal;
        let remainder = pll_freq % xtal;
        let num = remainder * PLL_DENOM as u64 / xtal;

        if mult < PLL_MULT_MIN as u64 || mult > PLL_MULT_MAX as u64 {
            return Err(Error::InvalidParameter);
        }

        Ok(FrequencyPlan {
            band,
            mult: mult as u8,
            num: num as u32,
            denom: PLL_DENOM,
            xtal_freq,
        })
    }

    /// VCO frequency in Hz, truncated.
    pub fn vco_frequency(&self) -> u64 {
        let xtal = self.xtal_freq as u64;
        xtal * self.mult as u64 + xtal * self.num as u64 / self.denom as u64
    }

    /// Output frequency on CLK0/CLK1 in Hz, truncated.
    pub fn output_frequency(&self) -> u64 {
        self.vco_frequency() / self.band.divider() as u64
    }
}

/// Driver configuration
#[derive(Debug, Copy, Clone)]
pub struct Config {
    /// Reference crystal frequency in Hz; the field calibration knob.
    pub xtal_freq: u32,
    /// State of the A0 address pin.
    pub address_bit: bool,
    /// When tuning issues a PLL reset.
    pub reset_policy: ResetPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            xtal_freq: XTAL_FREQ,
            address_bit: false,
            reset_policy: ResetPolicy::OnBandChange,
        }
    }
}

/// Si5351 driver
pub struct Si5351Device<I2C> {
    i2c: I2C,
    address: u8,
    config: Config,
    plan: Option<FrequencyPlan>,
    clk_enabled_mask: u8,
    ms_int_mode_mask: u8,
}

pub trait Si5351 {
    fn init(&mut self, xtal_load: CrystalLoad) -> Result<(), Error>;
    fn read_device_status(&mut self) -> Result<DeviceStatusBits, Error>;

    fn set_frequency(&mut self, freq: u32) -> Result<(), Error>;
    fn apply(&mut self, request: &TuningRequest) -> Result<(), Error>;

    fn set_clock_enabled(&mut self, clk: ClockOutput, enabled: bool);
    fn flush_output_enabled(&mut self) -> Result<(), Error>;
    fn flush_clock_control(&mut self, clk: ClockOutput) -> Result<(), Error>;
    fn output_off(&mut self, clk: ClockOutput) -> Result<(), Error>;

    fn setup_pll(&mut self, mult: u8, num: u32, denom: u32) -> Result<(), Error>;
    fn setup_multisynth_int(
        &mut self,
        ms: Multisynth,
        divider: u16,
        r_div: OutputDivider,
    ) -> Result<(), Error>;
    fn reset_pll(&mut self) -> Result<(), Error>;

    fn set_phase(&mut self, clock: ClockOutput, phase: u8) -> Result<(), Error>;
}

impl<I2C, E> Si5351Device<I2C>
where
    I2C: WriteRead<Error = E> + Write<Error = E>,
{
    /// Creates a new driver from a I2C peripheral
    pub fn new(i2c: I2C, address_bit: bool, xtal_freq: u32) -> Self {
        Si5351Device::with_config(
            i2c,
            Config {
                xtal_freq,
                address_bit,
                ..Config::default()
            },
        )
    }

    pub fn with_config(i2c: I2C, config: Config) -> Self {
        Si5351Device {
            i2c,
            address: ADDRESS | if config.address_bit { 1 } else { 0 },
            config,
            plan: None,
            clk_enabled_mask: 0,
            ms_int_mode_mask: 0,
        }
    }

    /// Gives the I2C peripheral back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Plan of the last completed tune.
    pub fn frequency_plan(&self) -> Option<&FrequencyPlan> {
        self.plan.as_ref()
    }

    /// Band of the last completed tune.
    pub fn band(&self) -> Option<Band> {
        self.plan.map(|plan| plan.band)
    }

    /// Writes a single register: START, address, `reg`, `value`, STOP.
    pub fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Error> {
        trace!("si5351 reg {} <- {:#04x}", reg, value);
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(i2c_error)
    }

    fn write(&mut self, reg: Register, byte: u8) -> Result<(), Error> {
        self.write_register(reg.addr(), byte)
    }

    fn read_register(&mut self, reg: Register) -> Result<u8, Error> {
        let mut buffer = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg.addr()], &mut buffer)
            .map_err(i2c_error)?;
        Ok(buffer[0])
    }

    fn write_synth_registers(&mut self, base: u8, params: [u8; 8]) -> Result<(), Error> {
        for (offset, &byte) in params.iter().enumerate() {
            self.write_register(base + offset as u8, byte)?;
        }
        Ok(())
    }

    fn reset_due(&self, band: Band) -> bool {
        match self.config.reset_policy {
            ResetPolicy::Never => false,
            ResetPolicy::OnBandChange => self.band() != Some(band),
        }
    }
}

impl<I2C, E> Si5351 for Si5351Device<I2C>
where
    I2C: WriteRead<Error = E> + Write<Error = E>,
{
    fn init(&mut self, xtal_load: CrystalLoad) -> Result<(), Error> {
        let mut polls = 0;
        while self
            .read_device_status()?
            .contains(DeviceStatusBits::SYS_INIT)
        {
            polls += 1;
            if polls >= SYS_INIT_POLLS {
                warn!("si5351 still in SYS_INIT after {} polls", polls);
                return Err(Error::CommunicationError);
            }
        }

        self.clk_enabled_mask = 0;
        self.flush_output_enabled()?;
        for &clk in [ClockOutput::Clk0, ClockOutput::Clk1, ClockOutput::Clk2].iter() {
            self.write(clk.register(), ClockControlBits::CLK_PDN.bits())?;
        }

        self.write(
            Register::CrystalLoad,
            (CrystalLoadBits::RESERVED
                | match xtal_load {
                    CrystalLoad::_6 => CrystalLoadBits::CL_6,
                    CrystalLoad::_8 => CrystalLoadBits::CL_8,
                    CrystalLoad::_10 => CrystalLoadBits::CL_10,
                })
            .bits(),
        )?;

        // Both PLLs from the crystal, no CLKIN divider.
        self.write(Register::PLLSource, 0)?;

        // I and Q always run integer Multisynths off PLL A.
        self.ms_int_mode_mask |= 1 << Multisynth::MS0.ix() | 1 << Multisynth::MS1.ix();
        for &clk in [ClockOutput::Clk0, ClockOutput::Clk1].iter() {
            self.set_clock_enabled(clk, true);
            self.flush_clock_control(clk)?;
        }
        self.flush_output_enabled()?;

        // The next tune has to reset the PLL to line the outputs up.
        self.plan = None;
        info!("si5351 initialized, xtal {} Hz", self.config.xtal_freq);

        Ok(())
    }

    fn read_device_status(&mut self) -> Result<DeviceStatusBits, Error> {
        Ok(DeviceStatusBits::from_bits_truncate(
            self.read_register(Register::DeviceStatus)?,
        ))
    }

    fn set_frequency(&mut self, freq: u32) -> Result<(), Error> {
        let plan = FrequencyPlan::new(self.config.xtal_freq, freq).map_err(|e| {
            warn!("si5351 rejected {} Hz: {}", freq, e);
            e
        })?;
        let divider = plan.band.divider();
        let phase = phase_count_for_quadrature(divider)?;

        debug!(
            "si5351 {} Hz: {:?} divider {}, mult {} + {}/{}",
            freq, plan.band, divider, plan.mult, plan.num, plan.denom
        );

        self.setup_pll(plan.mult, plan.num, plan.denom)?;
        self.setup_multisynth_int(Multisynth::MS0, divider.into(), OutputDivider::Div1)?;
        self.setup_multisynth_int(Multisynth::MS1, divider.into(), OutputDivider::Div1)?;
        self.set_phase(ClockOutput::Clk0, phase)?;
        self.set_phase(ClockOutput::Clk1, 0)?;

        if self.reset_due(plan.band) {
            info!("si5351 band {:?} -> {:?}, resetting PLL", self.band(), plan.band);
            self.reset_pll()?;
        }

        self.plan = Some(plan);
        Ok(())
    }

    fn apply(&mut self, request: &TuningRequest) -> Result<(), Error> {
        self.set_frequency(request.frequency)
    }

    fn set_clock_enabled(&mut self, clk: ClockOutput, enabled: bool) {
        let bit = 1u8 << clk.ix();
        if enabled {
            self.clk_enabled_mask |= bit;
        } else {
            self.clk_enabled_mask &= !bit;
        }
    }

    fn flush_output_enabled(&mut self) -> Result<(), Error> {
        let mask = self.clk_enabled_mask;
        self.write(Register::OutputEnable, !mask)
    }

    fn flush_clock_control(&mut self, clk: ClockOutput) -> Result<(), Error> {
        let bit = 1u8 << clk.ix();
        let clk_control_pdn = if self.clk_enabled_mask & bit != 0 {
            ClockControlBits::empty()
        } else {
            ClockControlBits::CLK_PDN
        };

        let ms_int_mode = if self.ms_int_mode_mask & (1 << clk.multisynth().ix()) == 0 {
            ClockControlBits::empty()
        } else {
            ClockControlBits::MS_INT
        };

        // MS_SRC stays clear: every output runs off PLL A.
        let base = ClockControlBits::CLK_SRC_MS | ClockControlBits::CLK_DRV_8;

        self.write(clk.register(), (clk_control_pdn | ms_int_mode | base).bits())
    }

    fn output_off(&mut self, clk: ClockOutput) -> Result<(), Error> {
        self.set_clock_enabled(clk, false);
        self.flush_clock_control(clk)?;
        self.flush_output_enabled()
    }

    fn setup_pll(&mut self, mult: u8, num: u32, denom: u32) -> Result<(), Error> {
        let params = pll_registers(mult, num, denom)?;
        self.write_synth_registers(Register::PLLA.addr(), params)
    }

    fn setup_multisynth_int(
        &mut self,
        ms: Multisynth,
        divider: u16,
        r_div: OutputDivider,
    ) -> Result<(), Error> {
        let params = multisynth_int_registers(divider, r_div)?;
        self.write_synth_registers(ms.base_addr(), params)?;
        self.ms_int_mode_mask |= 1 << ms.ix();

        Ok(())
    }

    fn reset_pll(&mut self) -> Result<(), Error> {
        self.write(
            Register::PLLReset,
            (PLLResetBits::PLLA_RST | PLLResetBits::PLLB_RST).bits(),
        )
    }

    /// Write the 7bit phase register.  The phase is in units of
    /// VCO/4 period.
    fn set_phase(&mut self, clock: ClockOutput, phase: u8) -> Result<(), Error> {
        let phase = phase & PHASE_MAX; // upper bit is reserved
        self.write(clock.phase_register()?, phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unpack(regs: [u8; 8]) -> (u32, u32, u32) {
        let p3 = (((regs[5] >> 4) as u32) << 16) | ((regs[0] as u32) << 8) | regs[1] as u32;
        let p1 = (((regs[2] & 0b11) as u32) << 16) | ((regs[3] as u32) << 8) | regs[4] as u32;
        let p2 = (((regs[5] & 0x0f) as u32) << 16) | ((regs[6] as u32) << 8) | regs[7] as u32;
        (p1, p2, p3)
    }

    #[test]
    fn band_edge_is_inclusive_below() {
        assert_eq!(Band::for_frequency(BAND_EDGE), Band::Low);
        assert_eq!(Band::for_frequency(BAND_EDGE + 1), Band::High);
        assert_eq!(Band::Low.divider(), 124);
        assert_eq!(Band::High.divider(), 44);
    }

    #[test]
    fn plan_40m() {
        let plan = FrequencyPlan::new(XTAL_FREQ, 7_100_000).unwrap();
        assert_eq!(plan.band, Band::Low);
        assert_eq!(plan.mult, 35);
        assert_eq!(plan.num, 227_796);
        assert_eq!(plan.denom, 1_048_575);
        assert_eq!(plan.vco_frequency(), 880_399_988);
    }

    #[test]
    fn plan_20m() {
        let plan = FrequencyPlan::new(XTAL_FREQ, 14_200_000).unwrap();
        assert_eq!(plan.band, Band::High);
        assert_eq!(plan.mult, 24);
        assert_eq!(plan.num, 1_041_112);
    }

    #[test]
    fn plan_band_edges() {
        let plan = FrequencyPlan::new(XTAL_FREQ, 9_050_000).unwrap();
        assert_eq!(plan.band, Band::Low);
        assert_eq!(plan.mult, 44);
        assert_eq!(plan.num, 932_797);

        let plan = FrequencyPlan::new(XTAL_FREQ, 9_050_001).unwrap();
        assert_eq!(plan.band, Band::High);
        assert_eq!(plan.mult, 15);
    }

    #[test]
    fn plan_rejects_out_of_range() {
        assert_eq!(
            FrequencyPlan::new(XTAL_FREQ, FREQ_MIN - 1),
            Err(Error::FrequencyOutOfRange(FREQ_MIN - 1))
        );
        assert_eq!(
            FrequencyPlan::new(XTAL_FREQ, FREQ_MAX + 1),
            Err(Error::FrequencyOutOfRange(FREQ_MAX + 1))
        );
        assert!(FrequencyPlan::new(XTAL_FREQ, FREQ_MIN).is_ok());
        assert!(FrequencyPlan::new(XTAL_FREQ, FREQ_MAX).is_ok());
        assert_eq!(
            FrequencyPlan::new(0, 7_000_000),
            Err(Error::InvalidParameter)
        );
    }

    #[test]
    fn plan_output_tracks_request() {
        for &freq in [3_500_000u32, 7_074_000, 9_050_000, 10_136_000, 21_074_000, 30_000_000].iter() {
            let plan = FrequencyPlan::new(XTAL_FREQ, freq).unwrap();
            let out = plan.output_frequency();
            assert!(out <= freq as u64 && freq as u64 - out <= 1, "{} -> {}", freq, out);
        }
    }

    #[test]
    fn pll_output_is_monotonic_within_band() {
        let mut last = 0;
        for freq in (7_000_000u32..7_000_200).step_by(7) {
            let vco = FrequencyPlan::new(XTAL_FREQ, freq).unwrap().vco_frequency();
            assert!(vco >= last);
            last = vco;
        }
    }

    #[test]
    fn pll_registers_40m() {
        assert_eq!(
            pll_registers(35, 227_796, PLL_DENOM),
            Ok([0xff, 0xff, 0x00, 0x0f, 0x9b, 0xfc, 0xea, 0x1b])
        );
    }

    #[test]
    fn pll_registers_unpack_to_parameters() {
        for &(mult, num) in [(15u8, 0u32), (35, 227_796), (44, 932_797), (90, 1_048_574)].iter() {
            let (p1, p2, p3) = unpack(pll_registers(mult, num, PLL_DENOM).unwrap());
            let q = 128 * num as u64 / PLL_DENOM as u64;
            assert_eq!(p1 as u64, 128 * mult as u64 + q - 512);
            assert_eq!(p2 as u64, 128 * num as u64 - PLL_DENOM as u64 * q);
            assert_eq!(p3, PLL_DENOM);
        }
    }

    #[test]
    fn multisynth_registers_for_bands() {
        assert_eq!(
            multisynth_int_registers(124, OutputDivider::Div1),
            Ok([0x00, 0x01, 0x00, 0x3c, 0x00, 0x00, 0x00, 0x00])
        );
        assert_eq!(
            multisynth_int_registers(44, OutputDivider::Div1),
            Ok([0x00, 0x01, 0x00, 0x14, 0x00, 0x00, 0x00, 0x00])
        );
    }

    #[test]
    fn r_divider_lands_in_upper_bits() {
        let regs = multisynth_int_registers(900, OutputDivider::Div128).unwrap();
        assert_eq!(regs[2] & 0b0111_0000, 0b0111_0000);
        let (p1, _, _) = unpack(regs);
        assert_eq!(p1, 128 * 900 - 512);
        assert_eq!(OutputDivider::Div128.denominator(), 128);
    }

    #[test]
    fn packers_reject_out_of_range_parameters() {
        assert_eq!(pll_registers(3, 0, PLL_DENOM), Err(Error::InvalidParameter));
        assert_eq!(pll_registers(14, 0, PLL_DENOM), Err(Error::InvalidParameter));
        assert_eq!(pll_registers(91, 0, PLL_DENOM), Err(Error::InvalidParameter));
        assert_eq!(pll_registers(35, 0, 0), Err(Error::InvalidParameter));
        assert_eq!(pll_registers(35, 0, 0x10_0000), Err(Error::InvalidParameter));
        assert_eq!(pll_registers(35, 0x10_0000, PLL_DENOM), Err(Error::InvalidParameter));
        assert!(pll_registers(15, 0, 1).is_ok());
        assert!(pll_registers(90, 0xfffff, PLL_DENOM).is_ok());

        assert_eq!(
            multisynth_int_registers(2, OutputDivider::Div1),
            Err(Error::InvalidParameter)
        );
        assert_eq!(
            multisynth_int_registers(4, OutputDivider::Div1),
            Err(Error::InvalidParameter)
        );
        assert_eq!(
            multisynth_int_registers(7, OutputDivider::Div1),
            Err(Error::InvalidParameter)
        );
        assert_eq!(
            multisynth_int_registers(1802, OutputDivider::Div1),
            Err(Error::InvalidParameter)
        );
        assert!(multisynth_int_registers(6, OutputDivider::Div1).is_ok());
        assert!(multisynth_int_registers(1800, OutputDivider::Div1).is_ok());
    }

    #[test]
    fn quadrature_phase_count() {
        assert_eq!(phase_count_for_quadrature(124), Ok(124));
        assert_eq!(phase_count_for_quadrature(44), Ok(44));
        assert_eq!(phase_count_for_quadrature(127), Ok(127));
        assert_eq!(phase_count_for_quadrature(128), Err(Error::InvalidParameter));
    }
}
