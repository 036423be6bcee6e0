//! Silicon model for the TI PRU-ICSS (Programmable Real-time Unit subsystem).
//!
//! This crate has **no dependencies** and **no hardware access** — it is a
//! pure model of the silicon: control/debug register maps, the segmented
//! memory layout seen by each PRU core, interrupt-controller cardinalities,
//! and the programmable constant-table geometry.
//!
//! Values match the AM335x-generation PRU-ICSS; other SoC generations share
//! the register layout and differ only in RAM sizes.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`regs`] | Control and debug register offsets, CTRL bit definitions |
//! | [`mem`] | Segmented memory map, per-core device addresses, identity masks |
//! | [`intc`] | Interrupt-controller cardinalities (events, channels, host lines) |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod intc;
pub mod mem;
pub mod regs;
