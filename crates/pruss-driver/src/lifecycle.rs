//! Core start/stop lifecycle.
//!
//! `Stopped → Starting → Running → Stopping → Stopped`, with the
//! intermediate states atomic from the caller's point of view. Starting
//! programs the run-enable bit together with the entry point; stopping
//! clears run-enable, detaches the vring handler, and tears down a
//! firmware-built routing table.

use crate::core::{lock, Pru, TableState};
use crate::error::{PrussError, Result};
use crate::intc::IntcConfig;
use crate::vendor::VendorIntrMap;
use pruss_chip::regs::{self, ctrl};
use std::sync::atomic::Ordering;
use std::sync::Arc;

impl Pru {
    /// Start execution at `entry_point` (a byte address; the hardware takes
    /// it in instruction words).
    ///
    /// When virtqueue dependents are registered, a notification path must
    /// exist: either the mailbox, or both the vring and kick lines. Without
    /// the mailbox, the vring handler is attached before execution is
    /// enabled. A failure after routing-table side effects tears down a
    /// firmware-built table before returning.
    ///
    /// # Errors
    ///
    /// * [`PrussError::MisconfiguredTransport`] — dependents present but no
    ///   viable notification path.
    /// * [`PrussError::Fatal`] — register bus unreachable.
    pub fn start(self: &Arc<Self>, entry_point: u32) -> Result<()> {
        tracing::debug!(
            "starting {}: entry point {:#x}",
            self.id(),
            entry_point >> 2
        );

        if self.has_virtqueue_dependents() {
            if self.mailbox.is_none() && (self.vring.is_none() || self.kick_line.is_none()) {
                self.teardown_firmware_table();
                return Err(PrussError::MisconfiguredTransport);
            }

            if self.mailbox.is_none() {
                if let Some(vring) = &self.vring {
                    let weak = Arc::downgrade(self);
                    let attach = vring.attach(Arc::new(move || {
                        if let Some(pru) = weak.upgrade() {
                            pru.vring_interrupt();
                        }
                    }));
                    if let Err(e) = attach {
                        tracing::error!("{}: failed to enable vring interrupt: {e}", self.id());
                        self.teardown_firmware_table();
                        return Err(e);
                    }
                    self.vring_attached.store(true, Ordering::SeqCst);
                }
            }
        }

        let val = ctrl::EN | ((entry_point >> 2) << ctrl::PC_SHIFT);
        self.control().write(regs::CTRL, val)
    }

    /// Stop execution. Idempotent: clearing an already clear run-enable bit
    /// is harmless.
    ///
    /// # Errors
    ///
    /// Only [`PrussError::Fatal`] propagates; logical state never makes
    /// stop fail.
    pub fn stop(&self) -> Result<()> {
        tracing::debug!("stopping {}", self.id());

        self.control().set(regs::CTRL, ctrl::EN, 0)?;

        if self.vring_attached.swap(false, Ordering::SeqCst) {
            if let Some(vring) = &self.vring {
                vring.detach();
            }
        }

        self.teardown_firmware_table();

        Ok(())
    }

    /// Apply a firmware vendor interrupt-map resource (descriptor form of
    /// the routing table), typically during firmware boot.
    ///
    /// The first installed table wins: once a table from either source is
    /// present, further descriptors are rejected.
    ///
    /// # Errors
    ///
    /// * [`PrussError::AlreadyConfigured`] — a table is already installed.
    /// * [`PrussError::UnsupportedVersion`] — unknown descriptor version.
    /// * [`PrussError::InvalidFormat`] — malformed or out-of-bound data.
    /// * Any error from the controller commit.
    pub fn apply_vendor_intrmap(&self, payload: &[u8]) -> Result<()> {
        // Hold the table lock across parse + commit so the first-writer-wins
        // rule stays atomic.
        let mut table = lock(&self.table);
        if !matches!(*table, TableState::None) {
            return Err(PrussError::AlreadyConfigured);
        }

        let rsc = VendorIntrMap::parse(payload)?;
        tracing::debug!(
            "{}: vendor interrupt map, version {}, {} events",
            self.id(),
            rsc.version,
            rsc.event_channel.len()
        );

        let config = IntcConfig::from_vendor_resource(&rsc)?;
        self.intc.configure(&config)?;
        *table = TableState::Firmware(config);

        Ok(())
    }

    /// Tear down a firmware-built routing table, if one is installed.
    /// Client-built tables are only torn down on release.
    pub(crate) fn teardown_firmware_table(&self) {
        let mut table = lock(&self.table);
        if let TableState::Firmware(config) = &*table {
            if let Err(e) = self.intc.unconfigure(config) {
                tracing::warn!("{}: failed to unconfigure intc: {e}", self.id());
            }
            *table = TableState::None;
        }
    }
}
