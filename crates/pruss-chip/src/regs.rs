//! PRU control and debug register maps.
//!
//! Each PRU core exposes two small register windows: a control block
//! (run/halt, cycle counters, constant-table pointers) and a debug block
//! (general-purpose register file shadow). Offsets are identical for both
//! cores; only the window base addresses differ.

// ── Control block ────────────────────────────────────────────────────────────

/// Control register — run enable, reset, single-step, run state.
pub const CTRL: usize = 0x0000;
/// Status register — current program counter (in instruction words).
pub const STS: usize = 0x0004;
/// Wakeup-enable register.
pub const WAKEUP_EN: usize = 0x0008;
/// Cycle counter.
pub const CYCLE: usize = 0x000C;
/// Stall counter.
pub const STALL: usize = 0x0010;
/// Constant-table block-index register 0 (slots 24/25).
pub const CTBIR0: usize = 0x0020;
/// Constant-table block-index register 1 (slots 26/27).
pub const CTBIR1: usize = 0x0024;
/// Constant-table programmable-pointer register 0 (slots 28/29).
pub const CTPPR0: usize = 0x0028;
/// Constant-table programmable-pointer register 1 (slots 30/31).
pub const CTPPR1: usize = 0x002C;

/// Byte size of the control window mapped per core.
pub const CTRL_SIZE: u32 = 0x100;

/// CTRL register bit definitions.
pub mod ctrl {
    /// Soft reset (active low).
    pub const SOFT_RST_N: u32 = 1 << 0;
    /// Enable execution.
    pub const EN: u32 = 1 << 1;
    /// Core is sleeping.
    pub const SLEEPING: u32 = 1 << 2;
    /// Cycle counter enable.
    pub const CTR_EN: u32 = 1 << 3;
    /// Single-step execution mode.
    pub const SINGLE_STEP: u32 = 1 << 8;
    /// Core is currently executing (read-only).
    pub const RUNSTATE: u32 = 1 << 15;

    /// Bit position of the program-counter field programmed at start.
    pub const PC_SHIFT: u32 = 16;
}

// ── Debug block ──────────────────────────────────────────────────────────────

/// Offset of general-purpose register `x` in the debug block.
#[must_use]
pub const fn debug_gpreg(x: usize) -> usize {
    x * 4
}

/// Offset of constant-table shadow register `x` in the debug block.
#[must_use]
pub const fn debug_ct_reg(x: usize) -> usize {
    0x0080 + x * 4
}

/// Number of general-purpose registers visible through the debug block.
pub const DEBUG_GPREG_COUNT: usize = 32;

/// Byte size of the debug window mapped per core.
pub const DEBUG_SIZE: u32 = 0x100;

// ── Constant table ───────────────────────────────────────────────────────────

/// Programmable constant-table geometry.
///
/// The PRU constant table has 32 slots. The programmable ones live in the
/// CTBIR/CTPPR registers, two slots per 32-bit register, one per half-word.
/// Slots below [`POINTER_BOUNDARY`] hold an 8-bit block index; slots at or
/// above it hold a full 16-bit page pointer. Target addresses are quantized
/// to 256-byte granularity — the low 8 bits never reach the hardware.
pub mod ctable {
    /// Total number of constant-table slots.
    pub const SLOT_COUNT: u32 = 32;

    /// First slot carrying a full 16-bit pointer instead of an 8-bit index.
    pub const POINTER_BOUNDARY: u32 = 28;

    /// Register holding `slot`, relative to the control block base.
    #[must_use]
    pub const fn register_for(slot: u32) -> usize {
        super::CTBIR0 + 4 * (slot >> 1) as usize
    }

    /// Half-word shift for `slot` within its register (0 or 16).
    #[must_use]
    pub const fn halfword_shift(slot: u32) -> u32 {
        16 * (slot & 1)
    }

    /// Field mask for `slot` before shifting.
    #[must_use]
    pub const fn field_mask(slot: u32) -> u32 {
        if slot >= POINTER_BOUNDARY {
            0xFFFF
        } else {
            0xFF
        }
    }
}
