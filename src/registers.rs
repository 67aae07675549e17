//! RM3100 register map
//!
//! Register addresses live in [`Register`]; the bits inside each flag
//! register are separate `bitflags` types so an address can never be mistaken
//! for a mask.

use crate::vec3::Axis;

/// Register addresses.
///
/// Multi-byte registers are listed once per axis at the address of their
/// most significant byte.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Single measurement request
    POLL = 0x00,
    /// Continuous measurement mode
    CMM = 0x01,
    /// X axis cycle count, 16 bit big endian
    CCR_X = 0x04,
    /// Y axis cycle count, 16 bit big endian
    CCR_Y = 0x06,
    /// Z axis cycle count, 16 bit big endian
    CCR_Z = 0x08,
    /// Timer for continuous measurement mode
    TMRC = 0x0b,
    /// X axis measurement result, 24 bit two's complement
    MEAS_X = 0x24,
    /// Y axis measurement result, 24 bit two's complement
    MEAS_Y = 0x27,
    /// Z axis measurement result, 24 bit two's complement
    MEAS_Z = 0x2a,
    /// Built-in self test
    BIST = 0x33,
    /// Status (data ready)
    STATUS = 0x34,
    /// Handshake
    HSHAKE = 0x35,
    /// Revision identification (read only)
    REVID = 0x36,
}

impl Register {
    /// Register address on the bus
    pub fn addr(&self) -> u8 {
        *self as u8
    }

    /// Cycle count register of `axis`
    pub fn ccr(axis: Axis) -> Self {
        match axis {
            Axis::X => Register::CCR_X,
            Axis::Y => Register::CCR_Y,
            Axis::Z => Register::CCR_Z,
        }
    }

    /// Measurement result register of `axis`
    pub fn meas(axis: Axis) -> Self {
        match axis {
            Axis::X => Register::MEAS_X,
            Axis::Y => Register::MEAS_Y,
            Axis::Z => Register::MEAS_Z,
        }
    }
}

/// Number of bytes in one axis measurement result
pub const MEAS_LEN: usize = 3;

bitflags! {
    /// POLL register: single measurement request per axis.
    /// Ignored by the device while continuous measurement mode is active.
    pub struct Poll: u8 {
        /// Request a single measurement from the Z axis
        const PMZ = 0x40;
        /// Request a single measurement from the Y axis
        const PMY = 0x20;
        /// Request a single measurement from the X axis
        const PMX = 0x10;
    }
}

impl Poll {
    /// Request bit of `axis`
    pub fn axis(axis: Axis) -> Self {
        match axis {
            Axis::X => Poll::PMX,
            Axis::Y => Poll::PMY,
            Axis::Z => Poll::PMZ,
        }
    }
}

bitflags! {
    /// CMM register: continuous measurement mode control.
    pub struct Cmm: u8 {
        /// Include the Z axis in continuous measurements
        const CMZ = 0x40;
        /// Include the Y axis in continuous measurements
        const CMY = 0x20;
        /// Include the X axis in continuous measurements
        const CMX = 0x10;
        /// DRDY is set after a measurement on any axis (after a full
        /// measurement of all enabled axes if not set)
        const DRDM = 0x04;
        /// Start continuous measurement mode
        const START = 0x01;
    }
}

impl Cmm {
    /// Enable bit of `axis`
    pub fn axis(axis: Axis) -> Self {
        match axis {
            Axis::X => Cmm::CMX,
            Axis::Y => Cmm::CMY,
            Axis::Z => Cmm::CMZ,
        }
    }
}

bitflags! {
    /// BIST register: built-in self test.
    pub struct Bist: u8 {
        /// Self test enable; the test runs on the next POLL write
        const STE = 0x80;
        /// Z axis LR oscillator passed the last self test (read only)
        const ZOK = 0x40;
        /// Y axis LR oscillator passed the last self test (read only)
        const YOK = 0x20;
        /// X axis LR oscillator passed the last self test (read only)
        const XOK = 0x10;
        /// Timeout bit 1
        const BW1 = 0x08;
        /// Timeout bit 0
        const BW0 = 0x04;
        /// LR period bit 1
        const BP1 = 0x02;
        /// LR period bit 0
        const BP0 = 0x01;
        /// Both timeout bits
        const BW = 0x0c;
        /// Both LR period bits
        const BP = 0x03;
    }
}

impl Bist {
    /// Whether the oscillator of `axis` passed the last self test.
    ///
    /// Only meaningful on a value read back after a completed self test.
    pub fn axis_ok(self, axis: Axis) -> bool {
        let ok = match axis {
            Axis::X => Bist::XOK,
            Axis::Y => Bist::YOK,
            Axis::Z => Bist::ZOK,
        };
        self.contains(ok)
    }
}

bitflags! {
    /// STATUS register.
    pub struct Status: u8 {
        /// A measurement (or self test result) is ready
        const DRDY = 0x80;
    }
}

bitflags! {
    /// HSHAKE register: data ready clearing behaviour and error reporting.
    pub struct Hshake: u8 {
        /// A measurement result was read while DRDY was low (read only)
        const NACK2 = 0x40;
        /// POLL was written during CMM, or CMM during POLL (read only)
        const NACK1 = 0x20;
        /// An undefined register was written (read only)
        const NACK0 = 0x10;
        /// Clear DRDY when any measurement result register is read
        const DRC1 = 0x02;
        /// Clear DRDY when any register is written
        const DRC0 = 0x01;
    }
}
