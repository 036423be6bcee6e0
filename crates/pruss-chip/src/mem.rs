//! Segmented memory map of the PRU subsystem.
//!
//! A PRU core does not have a unified address space. Each core owns a
//! private instruction RAM, and the subsystem provides two data RAMs plus a
//! shared data RAM that both cores can reach at fixed device addresses.
//! "Primary" and "secondary" data RAM are a per-core view: Data RAM0 is the
//! primary bank for PRU0 while PRU1 sees the banks reversed — its primary
//! bank is physically Data RAM1.

/// A physically contiguous memory region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemRegion {
    /// Physical base address.
    pub pa: u64,
    /// Byte size.
    pub size: u32,
}

impl MemRegion {
    /// Create a region descriptor.
    #[must_use]
    pub const fn new(pa: u64, size: u32) -> Self {
        Self { pa, size }
    }

    /// Whether `[da, da + len)` lies entirely within `[base, base + size)`.
    #[must_use]
    pub const fn contains(&self, base: u32, da: u32, len: u32) -> bool {
        da >= base && da as u64 + len as u64 <= base as u64 + self.size as u64
    }
}

// ── Per-core device addresses ────────────────────────────────────────────────

/// Device address of a core's instruction RAM, as seen by that core.
pub const IRAM_DA: u32 = 0x0000;
/// Device address of a core's primary data RAM.
pub const PDRAM_DA: u32 = 0x0000;
/// Device address of a core's secondary data RAM.
pub const SDRAM_DA: u32 = 0x2000;
/// Device address of the shared data RAM.
pub const SHRDRAM_DA: u32 = 0x1_0000;

/// Artificial high-nibble offset placed on instruction addresses by the GNU
/// pru-ld default linker script to keep IRAM and DRAM apart. Not a real
/// hardware offset; must be stripped before containment checks.
pub const IRAM_TOOLCHAIN_MASK: u32 = 0xF000_0000;

// ── Physical sizes (AM335x generation) ───────────────────────────────────────

/// Instruction RAM size per core.
pub const IRAM_SIZE: u32 = 8 * 1024;
/// Data RAM0 size.
pub const DRAM0_SIZE: u32 = 8 * 1024;
/// Data RAM1 size.
pub const DRAM1_SIZE: u32 = 8 * 1024;
/// Shared data RAM size.
pub const SHRDRAM_SIZE: u32 = 12 * 1024;

// ── Core identity ────────────────────────────────────────────────────────────

/// Control-window physical-base mask identifying PRU0.
pub const PRU0_CTRL_MASK: u64 = 0x34000;
/// Control-window physical-base mask identifying PRU1.
pub const PRU1_CTRL_MASK: u64 = 0x38000;

/// Identity of a PRU core within the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PruId {
    /// First core of the pair.
    Pru0 = 0,
    /// Second core of the pair. Sees its local data-RAM banks reversed.
    Pru1 = 1,
}

impl PruId {
    /// Derive the core identity from the physical base of its control window.
    ///
    /// Exactly one of the two identity masks must match; any other alignment
    /// leaves the identity indeterminate and returns `None`.
    #[must_use]
    pub const fn from_ctrl_base(pa: u64) -> Option<Self> {
        if pa & PRU0_CTRL_MASK == PRU0_CTRL_MASK {
            Some(Self::Pru0)
        } else if pa & PRU1_CTRL_MASK == PRU1_CTRL_MASK {
            Some(Self::Pru1)
        } else {
            None
        }
    }

    /// Numeric index of this core.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for PruId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PRU{}", self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_from_ctrl_base() {
        assert_eq!(PruId::from_ctrl_base(0x4A33_4000), Some(PruId::Pru0));
        assert_eq!(PruId::from_ctrl_base(0x4A33_8000), Some(PruId::Pru1));
        assert_eq!(PruId::from_ctrl_base(0x4A33_0000), None);
    }

    #[test]
    fn device_addresses_disjoint() {
        // Secondary and shared DRAM windows must not overlap the primary one.
        assert!(SDRAM_DA >= PDRAM_DA + DRAM0_SIZE);
        assert!(SHRDRAM_DA >= SDRAM_DA + DRAM1_SIZE);
    }

    #[test]
    fn region_containment() {
        let r = MemRegion::new(0x4A30_0000, 0x2000);
        assert!(r.contains(0, 0, 0x2000));
        assert!(r.contains(0, 0x1FFF, 1));
        assert!(!r.contains(0, 0x2000, 1));
        assert!(!r.contains(0, 0x1FFF, 2));
    }
}
