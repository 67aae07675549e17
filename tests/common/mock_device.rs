//! Mock bus implementation for testing the RM3100 driver

use rm3100::{Device, Register, Releasable};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Records operations performed on the mock bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Single byte register write
    WriteByte {
        /// Device address
        address: u8,
        /// Register address
        reg: u8,
        /// Value that was written
        value: u8,
    },
    /// 16 bit register write (low byte first on the wire)
    WriteWord {
        /// Device address
        address: u8,
        /// Register address
        reg: u8,
        /// Value that was written
        value: u16,
    },
    /// Single byte register read
    ReadByte {
        /// Device address
        address: u8,
        /// Register address
        reg: u8,
    },
    /// 16 bit register read
    ReadWord {
        /// Device address
        address: u8,
        /// Register address
        reg: u8,
    },
    /// Multi byte read
    ReadBlock {
        /// Device address
        address: u8,
        /// First register address
        reg: u8,
        /// Number of bytes read
        len: usize,
    },
}

impl Operation {
    /// Register the operation targets
    pub fn reg(&self) -> u8 {
        match *self {
            Operation::WriteByte { reg, .. }
            | Operation::WriteWord { reg, .. }
            | Operation::ReadByte { reg, .. }
            | Operation::ReadWord { reg, .. }
            | Operation::ReadBlock { reg, .. } => reg,
        }
    }

    /// Whether the operation is a write
    pub fn is_write(&self) -> bool {
        matches!(self,
                 Operation::WriteByte { .. } | Operation::WriteWord { .. })
    }
}

/// Error returned by the mock bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    /// Injected failure
    Nack,
}

/// Shared state for mock bus (uses interior mutability)
#[derive(Debug, Default)]
struct MockState {
    /// Simulated register file
    registers: HashMap<u8, u8>,

    /// Values returned by upcoming reads of a register, before falling back
    /// to the register file
    queued_reads: HashMap<u8, VecDeque<u8>>,

    /// Operations log for verification
    operations: Vec<Operation>,

    /// Number of operations to let through before failing
    fail_after: Option<usize>,
}

impl MockState {
    fn begin(&mut self, op: Operation) -> Result<(), MockError> {
        if let Some(remaining) = self.fail_after.as_mut() {
            if *remaining == 0 {
                self.fail_after = None;
                return Err(MockError::Nack);
            }
            *remaining -= 1;
        }
        self.operations.push(op);
        Ok(())
    }

    fn read_register(&mut self, reg: u8) -> u8 {
        if let Some(queue) = self.queued_reads.get_mut(&reg) {
            if let Some(value) = queue.pop_front() {
                return value;
            }
        }
        self.registers.get(&reg).copied().unwrap_or(0)
    }
}

/// Mock bus; clones share the same state so a test can keep a handle
/// after moving one into the driver.
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    state: Rc<RefCell<MockState>>,
}

impl MockDevice {
    /// Create a mock bus with an empty register file
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a register value
    pub fn set_register(&self, reg: u8, value: u8) {
        self.state.borrow_mut().registers.insert(reg, value);
    }

    /// Get a register value (0 if never written)
    pub fn register(&self, reg: u8) -> u8 {
        self.state.borrow().registers.get(&reg).copied().unwrap_or(0)
    }

    /// Store 24 bit two's complement counts in the measurement registers
    /// starting at `reg`
    pub fn set_measurement(&self, reg: Register, counts: i32) {
        let [_, b2, b1, b0] = counts.to_be_bytes();
        let base = reg.addr();
        self.set_register(base, b2);
        self.set_register(base + 1, b1);
        self.set_register(base + 2, b0);
    }

    /// Queue values for the next reads of `reg`
    pub fn queue_reads(&self, reg: Register, values: &[u8]) {
        self.state
            .borrow_mut()
            .queued_reads
            .entry(reg.addr())
            .or_default()
            .extend(values.iter().copied());
    }

    /// Let `n` more operations succeed, then fail the next one
    pub fn fail_after(&self, n: usize) {
        self.state.borrow_mut().fail_after = Some(n);
    }

    /// Recorded operations
    pub fn operations(&self) -> Vec<Operation> {
        self.state.borrow().operations.clone()
    }

    /// Recorded write operations
    pub fn writes(&self) -> Vec<Operation> {
        self.operations().into_iter().filter(|op| op.is_write()).collect()
    }

    /// Forget recorded operations
    pub fn clear_operations(&self) {
        self.state.borrow_mut().operations.clear();
    }
}

impl Releasable for MockDevice {
    type Released = MockDevice;

    fn release(self) -> MockDevice {
        self
    }
}

impl Device for MockDevice {
    type Error = MockError;

    fn write_byte(&mut self,
                  address: u8,
                  reg: Register,
                  value: u8)
                  -> Result<(), MockError> {
        let mut state = self.state.borrow_mut();
        state.begin(Operation::WriteByte { address,
                                           reg: reg.addr(),
                                           value })?;
        state.registers.insert(reg.addr(), value);
        Ok(())
    }

    fn write_word(&mut self,
                  address: u8,
                  reg: Register,
                  value: u16)
                  -> Result<(), MockError> {
        let mut state = self.state.borrow_mut();
        state.begin(Operation::WriteWord { address,
                                           reg: reg.addr(),
                                           value })?;
        let [lo, hi] = value.to_le_bytes();
        state.registers.insert(reg.addr(), lo);
        state.registers.insert(reg.addr() + 1, hi);
        Ok(())
    }

    fn read_block(&mut self,
                  address: u8,
                  reg: Register,
                  buffer: &mut [u8])
                  -> Result<(), MockError> {
        let mut state = self.state.borrow_mut();
        state.begin(Operation::ReadBlock { address,
                                           reg: reg.addr(),
                                           len: buffer.len() })?;
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = state.read_register(reg.addr() + i as u8);
        }
        Ok(())
    }

    fn read_byte(&mut self,
                 address: u8,
                 reg: Register)
                 -> Result<u8, MockError> {
        let mut state = self.state.borrow_mut();
        state.begin(Operation::ReadByte { address,
                                          reg: reg.addr() })?;
        Ok(state.read_register(reg.addr()))
    }

    fn read_word(&mut self,
                 address: u8,
                 reg: Register)
                 -> Result<u16, MockError> {
        let mut state = self.state.borrow_mut();
        state.begin(Operation::ReadWord { address,
                                          reg: reg.addr() })?;
        let lo = state.read_register(reg.addr());
        let hi = state.read_register(reg.addr() + 1);
        Ok(u16::from_le_bytes([lo, hi]))
    }
}
