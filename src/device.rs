//! Register bus abstraction and I2C implementation

use hal::blocking::i2c;

use crate::registers::Register;

/// Releasable describes a type that can be destroyed
/// with a released asset.
pub trait Releasable {
    /// The type to be released
    type Released;

    /// Release the underlying asset
    fn release(self) -> Self::Released;
}

/// A register bus the RM3100 is reached through
///
/// Every access names the 7 bit device address, so one bus may serve several
/// devices. The driver does not serialize accesses: callers sharing a bus
/// between threads must hold a lock around each driver operation.
///
/// Word accesses follow SMBus conventions and transfer the low byte first.
/// The RM3100 itself is big endian, so the driver byte-swaps 16 bit register
/// values on its side.
pub trait Device: Releasable {
    /// The type of error for all results
    type Error;

    /// Write one byte to register
    fn write_byte(&mut self,
                  address: u8,
                  reg: Register,
                  value: u8)
                  -> Result<(), Self::Error>;

    /// Write a 16 bit word to register, low byte first
    fn write_word(&mut self,
                  address: u8,
                  reg: Register,
                  value: u16)
                  -> Result<(), Self::Error>;

    /// Read `buffer.len()` consecutive bytes starting at register
    fn read_block(&mut self,
                  address: u8,
                  reg: Register,
                  buffer: &mut [u8])
                  -> Result<(), Self::Error>;

    /// Read one byte from register
    fn read_byte(&mut self,
                 address: u8,
                 reg: Register)
                 -> Result<u8, Self::Error> {
        let buffer = &mut [0; 1];
        self.read_block(address, reg, buffer)?;
        Ok(buffer[0])
    }

    /// Read a 16 bit word from register, low byte first
    fn read_word(&mut self,
                 address: u8,
                 reg: Register)
                 -> Result<u16, Self::Error> {
        let buffer = &mut [0; 2];
        self.read_block(address, reg, buffer)?;
        Ok(u16::from_le_bytes(*buffer))
    }
}

/// I2C Error
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cError<E> {
    /// Bus io error
    BusError(E),
}

impl<E> core::convert::From<E> for I2cError<E> {
    fn from(error: E) -> Self {
        I2cError::BusError(error)
    }
}

/// An I2C bus the RM3100 is connected to
pub struct I2cDevice<I2C> {
    i2c: I2C,
}

impl<E, I2C> I2cDevice<I2C>
    where I2C: i2c::Write<Error = E> + i2c::WriteRead<Error = E>
{
    /// Create a new I2C device
    pub fn new(i2c: I2C) -> Self {
        I2cDevice { i2c }
    }
}

impl<E, I2C> Releasable for I2cDevice<I2C>
    where I2C: i2c::Write<Error = E> + i2c::WriteRead<Error = E>
{
    type Released = I2C;

    fn release(self) -> I2C {
        self.i2c
    }
}

impl<E, I2C> Device for I2cDevice<I2C>
    where I2C: i2c::Write<Error = E> + i2c::WriteRead<Error = E>
{
    type Error = I2cError<E>;

    fn write_byte(&mut self,
                  address: u8,
                  reg: Register,
                  value: u8)
                  -> Result<(), Self::Error> {
        self.i2c.write(address, &[reg.addr(), value])?;
        Ok(())
    }

    fn write_word(&mut self,
                  address: u8,
                  reg: Register,
                  value: u16)
                  -> Result<(), Self::Error> {
        let [lo, hi] = value.to_le_bytes();
        self.i2c.write(address, &[reg.addr(), lo, hi])?;
        Ok(())
    }

    fn read_block(&mut self,
                  address: u8,
                  reg: Register,
                  buffer: &mut [u8])
                  -> Result<(), Self::Error> {
        self.i2c.write_read(address, &[reg.addr()], buffer)?;
        Ok(())
    }
}
