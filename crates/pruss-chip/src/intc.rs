//! Interrupt-controller cardinalities.
//!
//! The PRUSS INTC routes system events (hardware interrupt sources) through
//! intermediate channels onto host interrupt lines. The fan-in widths below
//! bound every value that may appear in a routing table; anything outside
//! them is rejected before a table is committed.

/// Number of system-event slots.
pub const MAX_SYS_EVENTS: usize = 64;
/// Number of intermediate channel slots.
pub const MAX_CHANNELS: usize = 10;
/// Number of host interrupt lines.
pub const MAX_HOST_INTERRUPTS: usize = 10;
