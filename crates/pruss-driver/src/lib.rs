//! Userspace remote-processor driver core for the TI PRU-ICSS.
//!
//! A PRU-ICSS instance carries a pair of small programmable real-time cores
//! that share a register-mapped control interface and several physically
//! segmented memory regions with the host CPU. This crate is the logical
//! core of the driver for that pair:
//!
//! * **Ownership** — exclusive acquisition of a core by one client
//!   subsystem at a time, with transactional save/restore of the shared
//!   signal-routing (mux) configuration ([`acquire`], [`PruHandle`]).
//! * **Interrupt routing** — building and validating the system-event →
//!   channel → host-interrupt table from either a client-supplied flat map
//!   or a firmware vendor resource, all-or-nothing ([`IntcConfig`]).
//! * **Address translation** — resolving firmware device addresses into
//!   physical-region offsets, instruction and data space separately, with
//!   the PRU1 data-bank reversal quirk ([`PruMemoryMap`]).
//! * **Lifecycle and kicks** — start/stop of a core and best-effort
//!   virtqueue kick dispatch over an interrupt line or a mailbox.
//!
//! Hardware access goes through the [`MmioRegion`] trait; the [`sim`]
//! module provides process-local collaborator doubles, so the whole core
//! runs without hardware.
//!
//! # Quick start
//!
//! ```
//! use pruss_driver::prelude::*;
//! use pruss_driver::sim::sim_pru;
//! use pruss_chip::mem::PruId;
//!
//! # fn main() -> pruss_driver::Result<()> {
//! let (pru, _harness) = sim_pru(PruId::Pru0);
//!
//! let client = ClientNode {
//!     name: ClientId("pru-adc".into()),
//!     deps: vec![CoreDependency::new(CoreLink::Ready(pru))],
//!     interrupt_map: None,
//! };
//!
//! let handle = pruss_driver::acquire(&client, 0)?;
//! handle.start(0x0)?;
//! handle.kick(0);
//! handle.stop()?;
//! handle.release();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

mod core;
mod error;
mod intc;
mod kick;
mod lifecycle;
mod mem;
pub mod mmio;
mod ownership;
mod regs;
pub mod sim;
mod transport;
mod vendor;

pub use crate::core::{ClientId, Pru, PruConfig};
pub use error::{PrussError, Result};
pub use intc::{IntcConfig, IntcController};
pub use mem::{AddrMap, DataBanks, MemTarget, PruMemoryMap, Resolved, Space};
pub use mmio::{FakeRegs, MappedRegion, MmioRegion};
pub use ownership::{acquire, CfgMux, ClientNode, CoreDependency, CoreLink, PruHandle};
pub use regs::PruControl;
pub use transport::{
    InterruptLine, KickPath, LineHandler, Mailbox, VirtqueueHandler, VqDispatch,
};
pub use vendor::{VendorIntrMap, VENDOR_RSC_VERSION};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        acquire, ClientId, ClientNode, CoreDependency, CoreLink, IntcConfig, KickPath,
        MemTarget, Pru, PruHandle, PrussError, Resolved, Result, Space,
    };
}
