//! A no_std, generic driver for the PNI RM3100 (three-axis magnetometer)
//!
//! The driver keeps the desired register values in an [`Rm3100Config`],
//! writes them to the device with [`Rm3100::apply_configuration`] and turns
//! measurement registers into µT with [`Rm3100::read_measurement`]. The
//! built-in self test is run with [`Rm3100::self_test`], or step by step with
//! [`Rm3100::start_self_test`] and [`Rm3100::poll_self_test`].
//!
//! ```ignore
//! let dev = I2cDevice::new(i2c);
//! let mut config = Rm3100Config::default();
//! config.set_device_address(0x23)?
//!       .set_axis_cycle_counts(Some(400), Some(400), Some(400))?;
//!
//! let mut rm3100 = Rm3100::new(dev, config);
//! rm3100.apply_configuration()?;
//! let field = rm3100.read_measurement()?;
//! ```
//!
//! Every operation is a sequence of separate bus transactions. The driver
//! does no locking of its own; when the bus is shared, hold a lock around each
//! whole operation.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

#[macro_use]
extern crate bitflags;
extern crate embedded_hal as hal;

#[macro_use]
mod fmt;

pub mod codec;
pub mod conf;
pub mod device;
pub mod registers;
pub mod types;
pub mod vec3;

use core::fmt as core_fmt;

use hal::blocking::delay::DelayMs;

pub use conf::{BistConfig, BistLrPeriod, BistTimeout, ConfigError,
               ContinuousMode, DeviceAddress, Handshake, Rm3100Config,
               SampleRate};
pub use device::{Device, I2cDevice, I2cError, Releasable};
pub use registers::{Bist, Cmm, Hshake, Poll, Register, Status};
pub use types::{Measurement, RawMeasurement, SelfTest, SelfTestState};
pub use vec3::{Axis, Vec3};

/// Attempts [`Rm3100::self_test`] callers typically allow
pub const SELF_TEST_ATTEMPTS: u16 = 10;

/// Wait between two STATUS polls of the self test
pub const SELF_TEST_POLL_INTERVAL_MS: u16 = 1000;

/// Driver errors
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Rejected configuration value
    Config(ConfigError),
    /// Bus error, as reported by the [`Device`]
    Bus(E),
    /// DRDY did not come up within the attempt budget of the self test
    SelfTestTimeout {
        /// STATUS polls issued
        attempts: u16,
    },
}

impl<E> From<ConfigError> for Error<E> {
    fn from(error: ConfigError) -> Self {
        Error::Config(error)
    }
}

impl<E: core_fmt::Debug> core_fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core_fmt::Formatter<'_>) -> core_fmt::Result {
        match self {
            Error::Config(e) => write!(f, "configuration error: {}", e),
            Error::Bus(e) => write!(f, "bus error: {:?}", e),
            Error::SelfTestTimeout { attempts } => {
                write!(f, "self test not ready after {} polls", attempts)
            }
        }
    }
}

/// RM3100 driver
pub struct Rm3100<DEV> {
    // communication device
    dev: DEV,
    config: Rm3100Config,
}

impl<E, DEV> Rm3100<DEV> where DEV: Device<Error = E>
{
    /// Creates a driver; nothing is written to the device until
    /// [`apply_configuration`](#method.apply_configuration) is called.
    pub fn new(dev: DEV, config: Rm3100Config) -> Self {
        Rm3100 { dev, config }
    }

    /// Creates a driver with the default configuration and writes it to the
    /// device.
    pub fn with_default_config(dev: DEV) -> Result<Self, Error<E>> {
        let mut rm3100 = Rm3100::new(dev, Rm3100Config::default());
        rm3100.apply_configuration()?;
        Ok(rm3100)
    }

    /// Current configuration
    pub fn config(&self) -> &Rm3100Config {
        &self.config
    }

    /// Mutable configuration. Changes take effect on the device with the
    /// next [`apply_configuration`](#method.apply_configuration).
    pub fn config_mut(&mut self) -> &mut Rm3100Config {
        &mut self.config
    }

    /// Writes the configuration to the device.
    ///
    /// Registers are written in the order BIST, POLL, CCR X/Y/Z, TMRC,
    /// HSHAKE, CMM. CMM goes last because setting its START bit begins
    /// sampling with whatever the other registers hold at that moment.
    ///
    /// The sequence stops at the first bus error. Registers written before
    /// the failure keep their new values; nothing is rolled back, so the
    /// device may be left half configured.
    pub fn apply_configuration(&mut self) -> Result<(), Error<E>> {
        debug!("rm3100: writing configuration to {}",
               self.config.address().addr());

        let bist = self.config.bist().to_byte();
        self.write(Register::BIST, bist)?;

        let poll = self.config.single_shot().bits();
        self.write(Register::POLL, poll)?;

        let cycle_counts = self.config.cycle_counts();
        for axis in Axis::ALL {
            self.write_word(Register::ccr(axis),
                            codec::swap16(cycle_counts[axis]))?;
        }

        let tmrc = self.config.sample_rate().bits();
        self.write(Register::TMRC, tmrc)?;

        let hshake = self.config.handshake().to_byte();
        self.write(Register::HSHAKE, hshake)?;

        let cmm = self.config.continuous_mode().to_byte();
        self.write(Register::CMM, cmm)?;

        Ok(())
    }

    /// Reads the signed measurement counts of `axis`.
    ///
    /// Returns `None` without touching the bus unless the axis is enabled in
    /// continuous mode or has a single measurement pending. A pending single
    /// measurement is consumed by a successful read.
    pub fn read_axis_raw(&mut self,
                         axis: Axis)
                         -> Result<Option<i32>, Error<E>> {
        if !self.config.axis_active(axis) {
            return Ok(None);
        }
        let single_shot = self.config.single_shot().contains(Poll::axis(axis));

        let buffer = &mut [0; registers::MEAS_LEN];
        self.read_block(Register::meas(axis), buffer)?;
        let counts = codec::decode_signed24(*buffer);
        trace!("rm3100: {:?} counts {}", axis, counts);

        if single_shot {
            self.config.consume_single_shot(axis);
        }
        Ok(Some(counts))
    }

    /// Reads the magnetic field along `axis` in µT, see
    /// [`read_axis_raw`](#method.read_axis_raw).
    pub fn read_axis(&mut self, axis: Axis) -> Result<Option<f64>, Error<E>> {
        let scale = self.config.scales()[axis];
        let counts = self.read_axis_raw(axis)?;
        Ok(counts.map(|c| f64::from(c) * scale))
    }

    /// Reads the magnetic field in µT, X then Y then Z.
    pub fn read_measurement(&mut self) -> Result<Measurement, Error<E>> {
        let x = self.read_axis(Axis::X)?;
        let y = self.read_axis(Axis::Y)?;
        let z = self.read_axis(Axis::Z)?;
        Ok(Vec3::new(x, y, z))
    }

    /// Reads the signed measurement counts, X then Y then Z.
    pub fn read_measurement_raw(&mut self)
                                -> Result<RawMeasurement, Error<E>> {
        let x = self.read_axis_raw(Axis::X)?;
        let y = self.read_axis_raw(Axis::Y)?;
        let z = self.read_axis_raw(Axis::Z)?;
        Ok(Vec3::new(x, y, z))
    }

    /// Runs the built-in self test.
    ///
    /// Polls STATUS up to `max_attempts` times, waiting
    /// [`SELF_TEST_POLL_INTERVAL_MS`] between polls, and returns the BIST
    /// register once DRDY is set. Use [`Bist::axis_ok`] to check each axis.
    ///
    /// The self test settings (BIST) and axes to test (POLL) come from the
    /// configuration. Continuous mode is disabled in the configuration and on
    /// the device first.
    pub fn self_test<D>(&mut self,
                        delay: &mut D,
                        max_attempts: u16)
                        -> Result<Bist, Error<E>>
        where D: DelayMs<u16>
    {
        let mut test = self.start_self_test(max_attempts)?;
        loop {
            if let Some(result) = self.poll_self_test(&mut test)? {
                return Ok(result);
            }
            delay.delay_ms(SELF_TEST_POLL_INTERVAL_MS);
        }
    }

    /// Starts the built-in self test without waiting for it.
    ///
    /// Writes a cleared CMM, then BIST, then POLL, which triggers the test.
    /// Drive the returned [`SelfTest`] with
    /// [`poll_self_test`](#method.poll_self_test).
    pub fn start_self_test(&mut self,
                           max_attempts: u16)
                           -> Result<SelfTest, Error<E>> {
        self.config.disable_continuous_mode();
        let cmm = self.config.continuous_mode().to_byte();
        self.write(Register::CMM, cmm)?;

        let bist = self.config.bist().to_byte();
        self.write(Register::BIST, bist)?;

        let poll = self.config.single_shot().bits();
        self.write(Register::POLL, poll)?;

        Ok(SelfTest::new(max_attempts))
    }

    /// Polls STATUS once for a self test started with
    /// [`start_self_test`](#method.start_self_test).
    ///
    /// Returns `Ok(None)` while the test is still running, and the BIST
    /// register once DRDY is set. Fails with [`Error::SelfTestTimeout`] when
    /// the poll that used up the attempt budget did not see DRDY. Calling it
    /// again on a finished test repeats the outcome without bus traffic.
    ///
    /// An attempt is counted only when its bus reads succeed; after a bus
    /// error the same attempt can be retried with another call.
    pub fn poll_self_test(&mut self,
                          test: &mut SelfTest)
                          -> Result<Option<Bist>, Error<E>> {
        match test.state {
            SelfTestState::Ready(result) => return Ok(Some(result)),
            SelfTestState::TimedOut => {
                return Err(Error::SelfTestTimeout { attempts: test.attempts })
            }
            SelfTestState::ConfigWritten | SelfTestState::Polling => {}
        }

        if test.attempts < test.max_attempts {
            debug!("rm3100: self test poll {}/{}",
                   test.attempts + 1,
                   test.max_attempts);

            // a poll failing on the bus does not use up an attempt
            if self.data_ready()? {
                let result = self.read_bist()?;
                test.attempts += 1;
                test.state = SelfTestState::Ready(result);
                return Ok(Some(result));
            }
            test.attempts += 1;
            test.state = SelfTestState::Polling;
            if test.attempts < test.max_attempts {
                return Ok(None);
            }
        }

        warn!("rm3100: self test timed out after {} polls", test.attempts);
        test.state = SelfTestState::TimedOut;
        Err(Error::SelfTestTimeout { attempts: test.attempts })
    }

    /// Reads the STATUS register
    pub fn read_status(&mut self) -> Result<Status, Error<E>> {
        let status = self.read(Register::STATUS)?;
        Ok(Status::from_bits_truncate(status))
    }

    /// Whether a measurement or self test result is ready (STATUS.DRDY)
    pub fn data_ready(&mut self) -> Result<bool, Error<E>> {
        Ok(self.read_status()?.contains(Status::DRDY))
    }

    /// Reads the revision identification
    pub fn read_revid(&mut self) -> Result<u8, Error<E>> {
        self.read(Register::REVID)
    }

    /// Reads the cycle count registers back from the device
    pub fn read_cycle_counts(&mut self) -> Result<Vec3<u16>, Error<E>> {
        let mut cycle_counts: Vec3<u16> = Vec3::default();
        for axis in Axis::ALL {
            let word = self.read_word(Register::ccr(axis))?;
            cycle_counts[axis] = codec::swap16(word);
        }
        Ok(cycle_counts)
    }

    /// Reads the TMRC register. Returns the raw byte, which may not be one of
    /// the [`SampleRate`] codes.
    pub fn read_sample_rate(&mut self) -> Result<u8, Error<E>> {
        self.read(Register::TMRC)
    }

    /// Reads the CMM register.
    ///
    /// Note that reading CMM ends continuous measurement mode on the device.
    pub fn read_continuous_mode(&mut self)
                                -> Result<ContinuousMode, Error<E>> {
        let cmm = self.read(Register::CMM)?;
        Ok(ContinuousMode::from_byte(cmm))
    }

    /// Reads the HSHAKE register, including the read-only NACK bits
    pub fn read_handshake(&mut self) -> Result<Hshake, Error<E>> {
        let hshake = self.read(Register::HSHAKE)?;
        Ok(Hshake::from_bits_truncate(hshake))
    }

    /// Reads the POLL register
    pub fn read_single_shot(&mut self) -> Result<Poll, Error<E>> {
        let poll = self.read(Register::POLL)?;
        Ok(Poll::from_bits_truncate(poll))
    }

    /// Reads the BIST register
    pub fn read_bist(&mut self) -> Result<Bist, Error<E>> {
        let bist = self.read(Register::BIST)?;
        Ok(Bist::from_bits_truncate(bist))
    }

    /// Destroys the driver, returning the communication device
    pub fn release(self) -> DEV::Released {
        self.dev.release()
    }

    fn address(&self) -> u8 {
        self.config.address().addr()
    }

    fn read(&mut self, reg: Register) -> Result<u8, Error<E>> {
        let address = self.address();
        self.dev.read_byte(address, reg).map_err(Error::Bus)
    }

    fn read_word(&mut self, reg: Register) -> Result<u16, Error<E>> {
        let address = self.address();
        self.dev.read_word(address, reg).map_err(Error::Bus)
    }

    fn read_block(&mut self,
                  reg: Register,
                  buffer: &mut [u8])
                  -> Result<(), Error<E>> {
        let address = self.address();
        self.dev.read_block(address, reg, buffer).map_err(Error::Bus)
    }

    fn write(&mut self, reg: Register, val: u8) -> Result<(), Error<E>> {
        trace!("rm3100: write {:?} <- {}", reg, val);
        let address = self.address();
        self.dev.write_byte(address, reg, val).map_err(Error::Bus)
    }

    fn write_word(&mut self, reg: Register, val: u16) -> Result<(), Error<E>> {
        trace!("rm3100: write {:?} <- {}", reg, val);
        let address = self.address();
        self.dev.write_word(address, reg, val).map_err(Error::Bus)
    }
}
