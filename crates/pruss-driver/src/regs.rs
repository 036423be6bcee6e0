//! Control-register access for a PRU core.
//!
//! Read/modify/write sequences are serialized by a dedicated fine-grained
//! lock, distinct from the ownership lock, because register access happens
//! from interrupt-context callbacks concurrently with slower configuration
//! paths. The two locks are never nested, in either order.

use crate::error::{PrussError, Result};
use crate::mmio::MmioRegion;
use pruss_chip::regs::{self, ctable};
use std::sync::{Arc, Mutex};

/// Control-block accessor for one PRU core.
#[derive(Debug)]
pub struct PruControl {
    window: Arc<dyn MmioRegion>,
    rmw_lock: Mutex<()>,
}

impl PruControl {
    /// Wrap a mapped control window.
    #[must_use]
    pub fn new(window: Arc<dyn MmioRegion>) -> Self {
        Self {
            window,
            rmw_lock: Mutex::new(()),
        }
    }

    /// Read a control register.
    ///
    /// # Errors
    ///
    /// Returns [`PrussError::Fatal`] if the bus is unreachable.
    pub fn read(&self, reg: usize) -> Result<u32> {
        self.window.read32(reg)
    }

    /// Write a control register.
    ///
    /// # Errors
    ///
    /// Returns [`PrussError::Fatal`] if the bus is unreachable.
    pub fn write(&self, reg: usize, value: u32) -> Result<()> {
        self.window.write32(reg, value)
    }

    /// Read/modify/write: replace the bits in `mask` with `set & mask`.
    ///
    /// # Errors
    ///
    /// Returns [`PrussError::Fatal`] if the bus is unreachable.
    pub fn set(&self, reg: usize, mask: u32, set: u32) -> Result<()> {
        let _guard = crate::core::lock(&self.rmw_lock);
        let mut val = self.window.read32(reg)?;
        val &= !mask;
        val |= set & mask;
        self.window.write32(reg, val)
    }

    /// Whether the core is currently executing.
    ///
    /// # Errors
    ///
    /// Returns [`PrussError::Fatal`] if the bus is unreachable.
    pub fn is_running(&self) -> Result<bool> {
        Ok(self.read(regs::CTRL)? & regs::ctrl::RUNSTATE != 0)
    }

    /// Program a constant-table slot to point at `addr`.
    ///
    /// Slots at or above the pointer boundary carry a full 16-bit page
    /// pointer; slots below it an 8-bit block index. Either way the low 8
    /// bits of `addr` are discarded — the table works at 256-byte
    /// granularity.
    ///
    /// # Errors
    ///
    /// Returns [`PrussError::InvalidFormat`] for a slot outside `0..32`,
    /// [`PrussError::Fatal`] if the bus is unreachable.
    pub fn set_ctable(&self, slot: u32, addr: u32) -> Result<()> {
        if slot >= ctable::SLOT_COUNT {
            return Err(PrussError::invalid_format(format!(
                "constant-table slot {slot} out of range"
            )));
        }

        let field_mask = ctable::field_mask(slot);
        let idx = (addr >> 8) & field_mask;

        let reg = ctable::register_for(slot);
        let shift = ctable::halfword_shift(slot);

        self.set(reg, field_mask << shift, idx << shift)
    }
}
