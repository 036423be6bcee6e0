//! Exclusive core acquisition and release.
//!
//! A client subsystem declares the cores it depends on, looks one up by
//! index, and acquires it exclusively. Acquisition transactionally captures
//! the signal-routing (mux) value and applies the client's optional
//! overrides; release restores everything, so a released core is observably
//! identical to one that was never acquired. A failure anywhere after the
//! claim is recorded unwinds through a full release before surfacing.

use crate::core::{lock, Claim, ClientId, Pru, TableState};
use crate::error::{PrussError, Result};
use crate::intc::IntcConfig;
use crate::mem::{Resolved, Space};
use crate::transport::VirtqueueHandler;
use pruss_chip::mem::PruId;
use std::fmt::Debug;
use std::sync::Arc;

/// Signal-routing (gp-mux) get/set primitive, keyed by core identity.
///
/// Owned by the PRUSS parent driver; this core only saves, overrides, and
/// restores the value around ownership boundaries.
pub trait CfgMux: Debug + Send + Sync {
    /// Read the current mux selector for a core.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration space is unreachable.
    fn mux(&self, id: PruId) -> Result<u8>;

    /// Set the mux selector for a core.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration space is unreachable.
    fn set_mux(&self, id: PruId, value: u8) -> Result<()>;
}

/// State of one entry in a client's core dependency list.
#[derive(Debug, Clone)]
pub enum CoreLink {
    /// The dependency names no such core.
    Missing,
    /// The core exists but is administratively unavailable.
    Unavailable,
    /// The core exists but its owning subsystem has not finished
    /// initializing. Acquisition should be retried later.
    Pending,
    /// The core is ready for acquisition.
    Ready(Arc<Pru>),
}

/// One entry of a client's declared core dependencies.
#[derive(Debug, Clone)]
pub struct CoreDependency {
    /// The target core.
    pub core: CoreLink,
    /// Optional signal-routing override applied while owned.
    pub mux_sel: Option<u8>,
    /// Optional firmware-name override applied while owned.
    pub firmware: Option<String>,
}

impl CoreDependency {
    /// A plain dependency with no overrides.
    #[must_use]
    pub fn new(core: CoreLink) -> Self {
        Self {
            core,
            mux_sel: None,
            firmware: None,
        }
    }
}

/// A client subsystem's declared view of the cores it uses.
#[derive(Debug, Clone)]
pub struct ClientNode {
    /// Identity recorded as the owner on successful acquisition.
    pub name: ClientId,
    /// Core dependencies, looked up by index.
    pub deps: Vec<CoreDependency>,
    /// Optional flat interrupt map shared by all the client's cores:
    /// `(core-index, system-event, channel, host-interrupt)` quadruples.
    pub interrupt_map: Option<Vec<u32>>,
}

/// Handle to an exclusively owned core. Releases the core when dropped.
#[derive(Debug)]
pub struct PruHandle {
    pru: Arc<Pru>,
}

/// Acquire the core at `index` of the client's dependency list.
///
/// On success the client is recorded as owner, the current mux value is
/// captured for restoration, the optional mux and firmware overrides are
/// applied, and a routing table is built and committed when the client
/// supplies a flat interrupt map.
///
/// # Errors
///
/// * [`PrussError::NotFound`] — no dependency at `index`, or the target is
///   missing or unavailable.
/// * [`PrussError::Deferred`] — the target exists but is not initialized
///   yet; retry later.
/// * [`PrussError::Busy`] — the core already has an owner.
/// * Any error from the override or table-commit steps, after a complete
///   unwind.
pub fn acquire(client: &ClientNode, index: usize) -> Result<PruHandle> {
    let dep = client.deps.get(index).ok_or_else(|| {
        PrussError::not_found(format!("no core dependency at index {index}"))
    })?;

    let pru = match &dep.core {
        CoreLink::Missing | CoreLink::Unavailable => {
            return Err(PrussError::not_found(format!(
                "core dependency {index} is not actionable"
            )))
        }
        CoreLink::Pending => return Err(PrussError::Deferred),
        CoreLink::Ready(pru) => Arc::clone(pru),
    };

    {
        let mut owner = lock(&pru.owner);
        if owner.is_some() {
            return Err(PrussError::busy(pru.id().to_string()));
        }
        *owner = Some(Claim {
            client: client.name.clone(),
            index,
            mux_save: None,
        });
    }

    tracing::debug!("{} acquired by {}", pru.id(), client.name);

    if let Err(e) = configure_acquired(&pru, client, dep, index) {
        tracing::debug!("{} acquisition failed ({e}), unwinding", pru.id());
        release_core(&pru);
        return Err(e);
    }

    Ok(PruHandle { pru })
}

/// Side-effect configuration after the claim is recorded. Any error here
/// makes `acquire` unwind through a full release.
fn configure_acquired(
    pru: &Arc<Pru>,
    client: &ClientNode,
    dep: &CoreDependency,
    index: usize,
) -> Result<()> {
    let save = pru.mux.mux(pru.id())?;
    if let Some(claim) = lock(&pru.owner).as_mut() {
        claim.mux_save = Some(save);
    }

    if let Some(mux_sel) = dep.mux_sel {
        pru.mux.set_mux(pru.id(), mux_sel)?;
    }

    if let Some(firmware) = &dep.firmware {
        *lock(&pru.fw_override) = Some(firmware.clone());
    }

    if let Some(map) = &client.interrupt_map {
        let config = IntcConfig::from_interrupt_map(map, u32::try_from(index).unwrap_or(u32::MAX))?;
        pru.intc.configure(&config)?;
        *lock(&pru.table) = TableState::Client(config);
    }

    Ok(())
}

/// Release a core. No-op when unowned; safe after a partial acquisition.
///
/// Tears down a client-built routing table, resets the firmware override,
/// restores the saved mux value, then clears ownership.
pub(crate) fn release_core(pru: &Pru) {
    let mux_save = {
        let owner = lock(&pru.owner);
        match owner.as_ref() {
            None => return,
            Some(claim) => claim.mux_save,
        }
    };

    {
        let mut table = lock(&pru.table);
        if let TableState::Client(config) = &*table {
            if let Err(e) = pru.intc.unconfigure(config) {
                tracing::warn!("{}: failed to unconfigure intc: {e}", pru.id());
            }
            *table = TableState::None;
        }
    }

    *lock(&pru.fw_override) = None;

    if let Some(save) = mux_save {
        if let Err(e) = pru.mux.set_mux(pru.id(), save) {
            tracing::warn!("{}: failed to restore mux: {e}", pru.id());
        }
    }

    *lock(&pru.owner) = None;
    tracing::debug!("{} released", pru.id());
}

impl PruHandle {
    /// Identity of the owned core.
    #[must_use]
    pub fn id(&self) -> PruId {
        self.pru.id()
    }

    /// Start the core at `entry_point`. See [`Pru::start`].
    ///
    /// # Errors
    ///
    /// Propagates lifecycle errors (see [`Pru::start`]).
    pub fn start(&self, entry_point: u32) -> Result<()> {
        self.pru.start(entry_point)
    }

    /// Stop the core. See [`Pru::stop`].
    ///
    /// # Errors
    ///
    /// Only [`PrussError::Fatal`] propagates.
    pub fn stop(&self) -> Result<()> {
        self.pru.stop()
    }

    /// Kick virtqueue `vq`. Best-effort; never fails.
    pub fn kick(&self, vq: u32) {
        self.pru.kick(vq);
    }

    /// Resolve a firmware device address. See [`Pru::translate`].
    ///
    /// # Errors
    ///
    /// Returns [`PrussError::NotFound`] for unresolvable ranges.
    pub fn translate(&self, da: u32, len: u32, space: Space) -> Result<Resolved> {
        self.pru.translate(da, len, space)
    }

    /// Program a constant-table slot. See [`Pru::set_ctable`].
    ///
    /// # Errors
    ///
    /// Returns [`PrussError::InvalidFormat`] or [`PrussError::Fatal`].
    pub fn set_ctable(&self, slot: u32, addr: u32) -> Result<()> {
        self.pru.set_ctable(slot, addr)
    }

    /// Apply a firmware vendor interrupt-map resource. See
    /// [`Pru::apply_vendor_intrmap`].
    ///
    /// # Errors
    ///
    /// Propagates decoding, validation, and commit errors.
    pub fn apply_vendor_intrmap(&self, payload: &[u8]) -> Result<()> {
        self.pru.apply_vendor_intrmap(payload)
    }

    /// Register the virtqueue processing hook.
    pub fn set_virtqueue_handler(&self, handler: Option<Arc<dyn VirtqueueHandler>>) {
        self.pru.set_virtqueue_handler(handler);
    }

    /// Firmware image name currently in effect.
    #[must_use]
    pub fn firmware_name(&self) -> String {
        self.pru.firmware_name()
    }

    /// Release the core explicitly. Equivalent to dropping the handle.
    pub fn release(self) {
        // Drop performs the release.
    }
}

impl Drop for PruHandle {
    fn drop(&mut self) {
        release_core(&self.pru);
    }
}
