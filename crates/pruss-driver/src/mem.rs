//! Dual-space device-address translation.
//!
//! Firmware references memory through device addresses that are local to the
//! PRU core, not host addresses. Instruction and data space are translated
//! separately: each core has a private instruction RAM, while the data RAMs
//! are subsystem-wide with per-core primary/secondary views. Translation has
//! no bearing on the host CPU's virtual memory — it only decides which
//! physical region, and at which offset, a firmware address refers to.

use crate::error::{PrussError, Result};
use pruss_chip::mem::{MemRegion, PruId, IRAM_TOOLCHAIN_MASK};

/// Address space selector for translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    /// Instruction fetch space (executable segments).
    Instruction,
    /// Data space.
    Data,
}

/// Physical memory target a device address resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemTarget {
    /// The core's private instruction RAM.
    Iram,
    /// Data RAM0.
    Dram0,
    /// Data RAM1.
    Dram1,
    /// Shared data RAM.
    SharedDram,
}

/// A resolved device address: which region, and the offset within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    /// The physical region containing the range.
    pub target: MemTarget,
    /// Byte offset from the start of that region.
    pub offset: u32,
}

/// Fixed device addresses at which a core sees its memories.
#[derive(Debug, Clone, Copy)]
pub struct AddrMap {
    /// Instruction RAM device address.
    pub iram_da: u32,
    /// Primary data RAM device address.
    pub pdram_da: u32,
    /// Secondary data RAM device address.
    pub sdram_da: u32,
    /// Shared data RAM device address.
    pub shrdram_da: u32,
}

impl Default for AddrMap {
    fn default() -> Self {
        Self {
            iram_da: pruss_chip::mem::IRAM_DA,
            pdram_da: pruss_chip::mem::PDRAM_DA,
            sdram_da: pruss_chip::mem::SDRAM_DA,
            shrdram_da: pruss_chip::mem::SHRDRAM_DA,
        }
    }
}

/// Subsystem-wide data RAM descriptors.
#[derive(Debug, Clone, Copy)]
pub struct DataBanks {
    /// Data RAM0.
    pub dram0: MemRegion,
    /// Data RAM1.
    pub dram1: MemRegion,
    /// Shared data RAM.
    pub shared: MemRegion,
}

/// Per-core view of the segmented memory map.
#[derive(Debug, Clone, Copy)]
pub struct PruMemoryMap {
    /// Identity of the core this view belongs to.
    pub id: PruId,
    /// The core's private instruction RAM.
    pub iram: MemRegion,
    /// Subsystem data RAMs.
    pub banks: DataBanks,
    /// Fixed device addresses.
    pub da: AddrMap,
}

impl PruMemoryMap {
    /// Resolve `[da, da + len)` in the given address space.
    ///
    /// # Errors
    ///
    /// Returns [`PrussError::NotFound`] when `len` is zero or no region
    /// contains the full range.
    pub fn translate(&self, da: u32, len: u32, space: Space) -> Result<Resolved> {
        if len == 0 {
            return Err(PrussError::not_found("zero-length device address range"));
        }

        match space {
            Space::Instruction => self.translate_instr(da, len),
            Space::Data => self.translate_data(da, len),
        }
    }

    /// Instruction space: only the private IRAM can contain the range.
    fn translate_instr(&self, da: u32, len: u32) -> Result<Resolved> {
        // Strip the artificial linker offset that keeps IRAM and DRAM
        // addresses apart in toolchain output.
        let da = da & !IRAM_TOOLCHAIN_MASK;

        if self.iram.contains(self.da.iram_da, da, len) {
            return Ok(Resolved {
                target: MemTarget::Iram,
                offset: da - self.da.iram_da,
            });
        }

        Err(PrussError::not_found(format!(
            "instruction address {da:#x}+{len:#x} outside IRAM"
        )))
    }

    /// Data space: primary, secondary, then shared RAM; first hit wins.
    ///
    /// PRU1 has its local RAM addresses reversed: its primary bank is
    /// physically Data RAM1.
    fn translate_data(&self, da: u32, len: u32) -> Result<Resolved> {
        let (primary, secondary) = match self.id {
            PruId::Pru0 => (
                (self.banks.dram0, MemTarget::Dram0),
                (self.banks.dram1, MemTarget::Dram1),
            ),
            PruId::Pru1 => (
                (self.banks.dram1, MemTarget::Dram1),
                (self.banks.dram0, MemTarget::Dram0),
            ),
        };

        if primary.0.contains(self.da.pdram_da, da, len) {
            Ok(Resolved {
                target: primary.1,
                offset: da - self.da.pdram_da,
            })
        } else if secondary.0.contains(self.da.sdram_da, da, len) {
            Ok(Resolved {
                target: secondary.1,
                offset: da - self.da.sdram_da,
            })
        } else if self.banks.shared.contains(self.da.shrdram_da, da, len) {
            Ok(Resolved {
                target: MemTarget::SharedDram,
                offset: da - self.da.shrdram_da,
            })
        } else {
            Err(PrussError::not_found(format!(
                "data address {da:#x}+{len:#x} outside all data RAMs"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pruss_chip::mem::{DRAM0_SIZE, DRAM1_SIZE, IRAM_SIZE, SHRDRAM_SIZE};

    fn map(id: PruId) -> PruMemoryMap {
        PruMemoryMap {
            id,
            iram: MemRegion::new(0x4A33_4000, IRAM_SIZE),
            banks: DataBanks {
                dram0: MemRegion::new(0x4A30_0000, DRAM0_SIZE),
                dram1: MemRegion::new(0x4A30_2000, DRAM1_SIZE),
                shared: MemRegion::new(0x4A31_0000, SHRDRAM_SIZE),
            },
            da: AddrMap::default(),
        }
    }

    #[test]
    fn instr_bounds() {
        let m = map(PruId::Pru0);
        assert!(m.translate(0, 1, Space::Instruction).is_ok());
        assert!(m.translate(IRAM_SIZE - 1, 1, Space::Instruction).is_ok());
        assert!(m.translate(IRAM_SIZE, 1, Space::Instruction).is_err());
        assert!(m.translate(IRAM_SIZE - 1, 2, Space::Instruction).is_err());
    }

    #[test]
    fn instr_strips_linker_offset() {
        let m = map(PruId::Pru0);
        let r = m.translate(0x2000_0100, 4, Space::Instruction).unwrap();
        assert_eq!(r.target, MemTarget::Iram);
        assert_eq!(r.offset, 0x100);
    }

    #[test]
    fn zero_length_is_not_found() {
        let m = map(PruId::Pru0);
        assert!(m.translate(0, 0, Space::Instruction).is_err());
        assert!(m.translate(0, 0, Space::Data).is_err());
    }

    #[test]
    fn data_banks_direct_for_pru0() {
        let m = map(PruId::Pru0);
        let r = m.translate(0x0100, 4, Space::Data).unwrap();
        assert_eq!(r.target, MemTarget::Dram0);
        assert_eq!(r.offset, 0x100);

        let r = m.translate(0x2100, 4, Space::Data).unwrap();
        assert_eq!(r.target, MemTarget::Dram1);
        assert_eq!(r.offset, 0x100);
    }

    #[test]
    fn data_banks_reversed_for_pru1() {
        let m = map(PruId::Pru1);
        let r = m.translate(0x0100, 4, Space::Data).unwrap();
        assert_eq!(r.target, MemTarget::Dram1);
        assert_eq!(r.offset, 0x100);

        let r = m.translate(0x2100, 4, Space::Data).unwrap();
        assert_eq!(r.target, MemTarget::Dram0);
        assert_eq!(r.offset, 0x100);
    }

    #[test]
    fn shared_ram_resolves() {
        let m = map(PruId::Pru1);
        let r = m.translate(0x1_0010, 8, Space::Data).unwrap();
        assert_eq!(r.target, MemTarget::SharedDram);
        assert_eq!(r.offset, 0x10);
    }

    #[test]
    fn data_out_of_range_is_not_found() {
        let m = map(PruId::Pru0);
        assert!(m.translate(0x5000, 4, Space::Data).is_err());
        assert!(m.translate(0x1_0000 + SHRDRAM_SIZE - 2, 4, Space::Data).is_err());
    }
}
