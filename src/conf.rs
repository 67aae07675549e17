//! Configuration for RM3100.
//!
//! [`Rm3100Config`] is the in-memory model of the register values the driver
//! writes to the device. Every setter validates its input first and leaves
//! the configuration untouched when it rejects it.

use core::convert::TryFrom;
use core::default::Default;
use core::fmt;

use crate::codec;
use crate::registers::{Bist, Cmm, Hshake, Poll};
use crate::vec3::{Axis, Vec3};

/// Default cycle count: 75 LSB/µT, ~440 Hz single axis maximum rate.
pub const CCR_DEFAULT: u16 = 0x00c8;

/// Configuration validation errors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Not one of the four RM3100 I2C addresses
    InvalidAddress(u8),
    /// Cycle count is zero or does not fit in 16 bits
    InvalidCycleCount(u32),
    /// Not one of the 14 TMRC codes
    InvalidSampleRateCode(u8),
    /// Not a valid BIST timeout or LR period code
    InvalidBistSubfield(u8),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidAddress(a) => {
                write!(f, "invalid device address {:#04x}", a)
            }
            ConfigError::InvalidCycleCount(c) => {
                write!(f, "invalid cycle count {:#x}", c)
            }
            ConfigError::InvalidSampleRateCode(c) => {
                write!(f, "invalid TMRC code {:#04x}", c)
            }
            ConfigError::InvalidBistSubfield(c) => {
                write!(f, "invalid BIST sub-field {:#04x}", c)
            }
        }
    }
}

/// I2C address, selected by the SA0 (MISO) and SA1 (SSN) pins.
/// Variant names give the pin levels in SA0, SA1 order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceAddress {
    /// SA0 low, SA1 low; default
    LL = 0x20,
    /// SA0 high, SA1 low
    HL = 0x21,
    /// SA0 low, SA1 high
    LH = 0x22,
    /// SA0 high, SA1 high
    HH = 0x23,
}
impl Default for DeviceAddress {
    fn default() -> Self {
        DeviceAddress::LL
    }
}
impl DeviceAddress {
    /// 7 bit bus address
    pub fn addr(&self) -> u8 {
        *self as u8
    }
}
impl TryFrom<u8> for DeviceAddress {
    type Error = ConfigError;

    fn try_from(addr: u8) -> Result<Self, ConfigError> {
        match addr {
            0x20 => Ok(DeviceAddress::LL),
            0x21 => Ok(DeviceAddress::HL),
            0x22 => Ok(DeviceAddress::LH),
            0x23 => Ok(DeviceAddress::HH),
            _ => Err(ConfigError::InvalidAddress(addr)),
        }
    }
}

/// Continuous measurement mode rate (TMRC register); default: ~37 Hz.
///
/// The cycle counts bound the achievable rate: if the selected rate is
/// faster than the cycle counts allow, the device samples as fast as the
/// cycle counts permit instead.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleRate {
    /// ~600 Hz
    _600HZ = 0x92,
    /// ~300 Hz
    _300HZ = 0x93,
    /// ~150 Hz
    _150HZ = 0x94,
    /// ~75 Hz
    _75HZ = 0x95,
    /// ~37 Hz
    _37HZ = 0x96,
    /// ~18 Hz
    _18HZ = 0x97,
    /// ~9 Hz
    _9HZ = 0x98,
    /// ~4.5 Hz
    _4_5HZ = 0x99,
    /// ~2.3 Hz
    _2_3HZ = 0x9a,
    /// ~1.2 Hz
    _1_2HZ = 0x9b,
    /// ~0.6 Hz
    _0_6HZ = 0x9c,
    /// ~0.3 Hz
    _0_3HZ = 0x9d,
    /// ~0.015 Hz
    _0_015HZ = 0x9e,
    /// ~0.0075 Hz
    _0_0075HZ = 0x9f,
}
impl Default for SampleRate {
    fn default() -> Self {
        SampleRate::_37HZ
    }
}
impl SampleRate {
    /// TMRC register value
    pub fn bits(&self) -> u8 {
        *self as u8
    }

    /// Nominal sampling frequency in Hz
    pub fn frequency_hz(&self) -> f32 {
        match self {
            SampleRate::_600HZ => 600.0,
            SampleRate::_300HZ => 300.0,
            SampleRate::_150HZ => 150.0,
            SampleRate::_75HZ => 75.0,
            SampleRate::_37HZ => 37.0,
            SampleRate::_18HZ => 18.0,
            SampleRate::_9HZ => 9.0,
            SampleRate::_4_5HZ => 4.5,
            SampleRate::_2_3HZ => 2.3,
            SampleRate::_1_2HZ => 1.2,
            SampleRate::_0_6HZ => 0.6,
            SampleRate::_0_3HZ => 0.3,
            SampleRate::_0_015HZ => 0.015,
            SampleRate::_0_0075HZ => 0.0075,
        }
    }
}
impl TryFrom<u8> for SampleRate {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, ConfigError> {
        let rate = match code {
            0x92 => SampleRate::_600HZ,
            0x93 => SampleRate::_300HZ,
            0x94 => SampleRate::_150HZ,
            0x95 => SampleRate::_75HZ,
            0x96 => SampleRate::_37HZ,
            0x97 => SampleRate::_18HZ,
            0x98 => SampleRate::_9HZ,
            0x99 => SampleRate::_4_5HZ,
            0x9a => SampleRate::_2_3HZ,
            0x9b => SampleRate::_1_2HZ,
            0x9c => SampleRate::_0_6HZ,
            0x9d => SampleRate::_0_3HZ,
            0x9e => SampleRate::_0_015HZ,
            0x9f => SampleRate::_0_0075HZ,
            _ => return Err(ConfigError::InvalidSampleRateCode(code)),
        };
        Ok(rate)
    }
}

/// LR oscillator timeout during self test (BW bits of BIST); default: 120 µs.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BistTimeout {
    /// 30 µs, one sleep oscillation cycle
    _30US = 0x04,
    /// 60 µs, two sleep oscillation cycles
    _60US = 0x08,
    /// 120 µs, four sleep oscillation cycles
    _120US = 0x0c,
}
impl Default for BistTimeout {
    fn default() -> Self {
        BistTimeout::_120US
    }
}
impl TryFrom<u8> for BistTimeout {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, ConfigError> {
        match code {
            0x04 => Ok(BistTimeout::_30US),
            0x08 => Ok(BistTimeout::_60US),
            0x0c => Ok(BistTimeout::_120US),
            _ => Err(ConfigError::InvalidBistSubfield(code)),
        }
    }
}

/// Number of LR periods measured during self test (BP bits of BIST);
/// default: 4.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BistLrPeriod {
    /// 1 LR period
    _1 = 0x01,
    /// 2 LR periods
    _2 = 0x02,
    /// 4 LR periods
    _4 = 0x03,
}
impl Default for BistLrPeriod {
    fn default() -> Self {
        BistLrPeriod::_4
    }
}
impl TryFrom<u8> for BistLrPeriod {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, ConfigError> {
        match code {
            0x01 => Ok(BistLrPeriod::_1),
            0x02 => Ok(BistLrPeriod::_2),
            0x03 => Ok(BistLrPeriod::_4),
            _ => Err(ConfigError::InvalidBistSubfield(code)),
        }
    }
}

/// Continuous measurement mode settings (CMM register).
/// Default: all axes, DRDY after any axis, started.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ContinuousMode {
    /// Axes measured in continuous mode
    pub axes: Vec3<bool>,
    /// DRDY after a measurement on any axis instead of after all enabled axes
    pub drdm: bool,
    /// Start continuous measurement
    pub start: bool,
}
impl Default for ContinuousMode {
    fn default() -> Self {
        ContinuousMode { axes: Vec3::splat(true),
                         drdm: true,
                         start: true, }
    }
}
impl ContinuousMode {
    /// Continuous mode with every bit cleared
    pub const DISABLED: ContinuousMode =
        ContinuousMode { axes: Vec3::splat(false),
                         drdm: false,
                         start: false, };

    /// CMM register value
    pub fn to_byte(&self) -> u8 {
        let mut cmm = Cmm::empty();
        for axis in Axis::ALL {
            cmm.set(Cmm::axis(axis), self.axes[axis]);
        }
        cmm.set(Cmm::DRDM, self.drdm);
        cmm.set(Cmm::START, self.start);
        cmm.bits()
    }

    /// Decodes a CMM register value; undefined bits are ignored
    pub fn from_byte(byte: u8) -> Self {
        let cmm = Cmm::from_bits_truncate(byte);
        ContinuousMode { axes: Vec3::new(cmm.contains(Cmm::CMX),
                                         cmm.contains(Cmm::CMY),
                                         cmm.contains(Cmm::CMZ)),
                         drdm: cmm.contains(Cmm::DRDM),
                         start: cmm.contains(Cmm::START), }
    }
}

/// When the device clears DRDY (HSHAKE register). Default: both.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Handshake {
    /// Clear DRDY when a measurement result is read
    pub drc1: bool,
    /// Clear DRDY when any register is written
    pub drc0: bool,
}
impl Default for Handshake {
    fn default() -> Self {
        Handshake { drc1: true,
                    drc0: true, }
    }
}
impl Handshake {
    /// HSHAKE register value
    pub fn to_byte(&self) -> u8 {
        let mut hshake = Hshake::empty();
        hshake.set(Hshake::DRC1, self.drc1);
        hshake.set(Hshake::DRC0, self.drc0);
        hshake.bits()
    }

    /// Decodes the writable bits of a HSHAKE register value
    pub fn from_byte(byte: u8) -> Self {
        let hshake = Hshake::from_bits_truncate(byte);
        Handshake { drc1: hshake.contains(Hshake::DRC1),
                    drc0: hshake.contains(Hshake::DRC0), }
    }
}

/// Self test settings (BIST register).
/// Default: 120 µs timeout, 4 LR periods, self test disabled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BistConfig {
    bits: Bist,
}
impl Default for BistConfig {
    fn default() -> Self {
        BistConfig::from_byte(BistTimeout::default() as u8
                              | BistLrPeriod::default() as u8)
    }
}
impl BistConfig {
    /// BIST register value
    pub fn to_byte(&self) -> u8 {
        self.bits.bits()
    }

    /// Wraps a BIST register value
    pub fn from_byte(byte: u8) -> Self {
        BistConfig { bits: Bist::from_bits_truncate(byte) }
    }

    /// Timeout setting, `None` if both timeout bits are clear
    pub fn timeout(&self) -> Option<BistTimeout> {
        BistTimeout::try_from((self.bits & Bist::BW).bits()).ok()
    }

    /// LR period setting, `None` if both LR period bits are clear
    pub fn lr_period(&self) -> Option<BistLrPeriod> {
        BistLrPeriod::try_from((self.bits & Bist::BP).bits()).ok()
    }

    /// Whether the self test runs on the next POLL write
    pub fn self_test_enabled(&self) -> bool {
        self.bits.contains(Bist::STE)
    }

    fn set_timeout(&mut self, timeout: BistTimeout) {
        self.bits.remove(Bist::BW);
        self.bits.insert(Bist::from_bits_truncate(timeout as u8));
    }

    fn set_lr_period(&mut self, lr_period: BistLrPeriod) {
        self.bits.remove(Bist::BP);
        self.bits.insert(Bist::from_bits_truncate(lr_period as u8));
    }
}

/// RM3100 configuration
#[derive(Copy, Clone, Debug)]
pub struct Rm3100Config {
    address: DeviceAddress,
    cycle_counts: Vec3<u16>,
    scales: Vec3<f64>,
    continuous_mode: ContinuousMode,
    single_shot: Poll,
    bist: BistConfig,
    handshake: Handshake,
    sample_rate: SampleRate,
}

impl Default for Rm3100Config {
    fn default() -> Self {
        let scale = 1.0 / 75.0;
        Rm3100Config { address: DeviceAddress::default(),
                       cycle_counts: Vec3::splat(CCR_DEFAULT),
                       scales: Vec3::splat(scale),
                       continuous_mode: ContinuousMode::default(),
                       single_shot: Poll::empty(),
                       bist: BistConfig::default(),
                       handshake: Handshake::default(),
                       sample_rate: SampleRate::default(), }
    }
}

impl Rm3100Config {
    /// Device address
    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    /// Per-axis cycle counts
    pub fn cycle_counts(&self) -> Vec3<u16> {
        self.cycle_counts
    }

    /// Per-axis scale factors in µT per LSB, derived from the cycle counts
    pub fn scales(&self) -> Vec3<f64> {
        self.scales
    }

    /// Continuous measurement mode settings
    pub fn continuous_mode(&self) -> ContinuousMode {
        self.continuous_mode
    }

    /// Pending single measurement requests
    pub fn single_shot(&self) -> Poll {
        self.single_shot
    }

    /// Self test settings
    pub fn bist(&self) -> BistConfig {
        self.bist
    }

    /// DRDY handshake settings
    pub fn handshake(&self) -> Handshake {
        self.handshake
    }

    /// Continuous mode sample rate
    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// Whether `axis` has to be read: it is measured continuously or a
    /// single measurement is pending.
    pub fn axis_active(&self, axis: Axis) -> bool {
        self.continuous_mode.axes[axis]
        || self.single_shot.contains(Poll::axis(axis))
    }

    /// Sets the device address; `addr` must be one of 0x20..=0x23.
    pub fn set_device_address(&mut self,
                              addr: u8)
                              -> Result<&mut Self, ConfigError> {
        self.address = DeviceAddress::try_from(addr)?;
        Ok(self)
    }

    /// Sets the cycle counts of the given axes, `None` leaves an axis
    /// unchanged. Each cycle count must be within `1..=0xffff`; if any is
    /// not, no axis is changed. The scale factor of every changed axis is
    /// updated with it.
    pub fn set_axis_cycle_counts(&mut self,
                                 x: Option<u32>,
                                 y: Option<u32>,
                                 z: Option<u32>)
                                 -> Result<&mut Self, ConfigError> {
        let requested = Vec3::new(x, y, z);
        let mut updates: Vec3<Option<(u16, f64)>> = Vec3::default();
        for axis in Axis::ALL {
            if let Some(ccr) = requested[axis] {
                updates[axis] = Some(Self::validate_cycle_count(ccr)?);
            }
        }

        for axis in Axis::ALL {
            if let Some((ccr, scale)) = updates[axis] {
                self.cycle_counts[axis] = ccr;
                self.scales[axis] = scale;
            }
        }
        Ok(self)
    }

    fn validate_cycle_count(ccr: u32) -> Result<(u16, f64), ConfigError> {
        let invalid = ConfigError::InvalidCycleCount(ccr);
        let ccr = u16::try_from(ccr).map_err(|_| invalid)?;
        let scale = codec::cycle_count_to_scale(ccr).ok_or(invalid)?;
        Ok((ccr, scale))
    }

    /// Sets the continuous mode sample rate from a TMRC code
    /// (`0x92..=0x9f`, see [`SampleRate`]).
    pub fn set_sample_rate(&mut self,
                           code: u8)
                           -> Result<&mut Self, ConfigError> {
        self.sample_rate = SampleRate::try_from(code)?;
        Ok(self)
    }

    /// Replaces the continuous measurement mode settings.
    pub fn set_continuous_mode(&mut self,
                               cmx: bool,
                               cmy: bool,
                               cmz: bool,
                               drdm: bool,
                               start: bool)
                               -> &mut Self {
        self.continuous_mode = ContinuousMode { axes: Vec3::new(cmx, cmy, cmz),
                                                drdm,
                                                start, };
        self
    }

    /// Replaces the DRDY handshake settings.
    pub fn set_handshake(&mut self, drc1: bool, drc0: bool) -> &mut Self {
        self.handshake = Handshake { drc1, drc0 };
        self
    }

    /// Sets the self test timeout from its BW bit pattern (see
    /// [`BistTimeout`]). Other BIST bits are kept.
    pub fn set_bist_timeout(&mut self,
                            code: u8)
                            -> Result<&mut Self, ConfigError> {
        let timeout = BistTimeout::try_from(code)?;
        self.bist.set_timeout(timeout);
        Ok(self)
    }

    /// Sets the self test LR periods from their BP bit pattern (see
    /// [`BistLrPeriod`]). Other BIST bits are kept.
    pub fn set_bist_lr_period(&mut self,
                              code: u8)
                              -> Result<&mut Self, ConfigError> {
        let lr_period = BistLrPeriod::try_from(code)?;
        self.bist.set_lr_period(lr_period);
        Ok(self)
    }

    /// Enables or disables the self test. Other BIST bits are kept.
    pub fn set_bist_self_test_enable(&mut self, enable: bool) -> &mut Self {
        self.bist.bits.set(Bist::STE, enable);
        self
    }

    /// Replaces the pending single measurement requests.
    pub fn set_single_shot_request(&mut self,
                                   x: bool,
                                   y: bool,
                                   z: bool)
                                   -> &mut Self {
        let mut poll = Poll::empty();
        poll.set(Poll::PMX, x);
        poll.set(Poll::PMY, y);
        poll.set(Poll::PMZ, z);
        self.single_shot = poll;
        self
    }

    /// Marks the single measurement of `axis` as consumed.
    pub(crate) fn consume_single_shot(&mut self, axis: Axis) {
        self.single_shot.remove(Poll::axis(axis));
    }

    pub(crate) fn disable_continuous_mode(&mut self) {
        self.continuous_mode = ContinuousMode::DISABLED;
    }
}
