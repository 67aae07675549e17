//! Measurement and self test result types

use crate::registers::Bist;
use crate::vec3::Vec3;

/// Magnetic field in µT per axis; `None` for axes that were not read
pub type Measurement = Vec3<Option<f64>>;

/// Undecoded signed measurement counts per axis
pub type RawMeasurement = Vec3<Option<i32>>;

/// Progress of a built-in self test
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelfTestState {
    /// CMM, BIST and POLL written; STATUS not polled yet
    ConfigWritten,
    /// STATUS polled at least once without DRDY
    Polling,
    /// DRDY was seen; carries the BIST register read afterwards
    Ready(Bist),
    /// The attempt budget ran out before DRDY was seen
    TimedOut,
}

/// A self test in progress, see [`Rm3100::start_self_test`].
///
/// [`Rm3100::start_self_test`]: ../struct.Rm3100.html#method.start_self_test
#[derive(Clone, Copy, Debug)]
pub struct SelfTest {
    pub(crate) state: SelfTestState,
    pub(crate) attempts: u16,
    pub(crate) max_attempts: u16,
}

impl SelfTest {
    pub(crate) fn new(max_attempts: u16) -> Self {
        SelfTest { state: SelfTestState::ConfigWritten,
                   attempts: 0,
                   max_attempts }
    }

    /// Current state
    pub fn state(&self) -> SelfTestState {
        self.state
    }

    /// Number of STATUS polls issued so far
    pub fn attempts(&self) -> u16 {
        self.attempts
    }

    /// Whether the test reached `Ready` or `TimedOut`
    pub fn is_finished(&self) -> bool {
        matches!(self.state, SelfTestState::Ready(_) | SelfTestState::TimedOut)
    }
}
