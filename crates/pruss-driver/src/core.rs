//! The per-core driver object.
//!
//! One [`Pru`] exists per physical coprocessor core. It bundles the core's
//! register windows, its view of the segmented memory map, the exclusive
//! ownership state, the interrupt-routing table, and the virtqueue
//! transports. Collaborators (mux configuration, INTC, interrupt lines,
//! mailbox) are reached through trait objects fixed at construction.

use crate::error::{PrussError, Result};
use crate::intc::{IntcConfig, IntcController};
use crate::mem::{AddrMap, DataBanks, PruMemoryMap, Resolved, Space};
use crate::mmio::MmioRegion;
use crate::ownership::CfgMux;
use crate::regs::PruControl;
use crate::transport::{InterruptLine, KickPath, Mailbox, VirtqueueHandler};
use pruss_chip::mem::{MemRegion, PruId};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data from a poisoned lock.
///
/// Critical sections in this crate are short and never leave shared state
/// half-updated, so continuing past a poisoned lock is sound.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Identity of an acquiring client subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(
    /// Stable client name, e.g. the client's device-tree node name.
    pub String,
);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ownership claim on a core.
#[derive(Debug, Clone)]
pub(crate) struct Claim {
    /// Who owns the core.
    pub client: ClientId,
    /// Which logical index of the client's dependency list this claim
    /// satisfies.
    pub index: usize,
    /// Signal-routing value captured at acquisition, restored on release.
    /// `None` until the capture step has run.
    pub mux_save: Option<u8>,
}

/// Source of the currently installed interrupt-routing table.
#[derive(Debug, Clone)]
pub(crate) enum TableState {
    /// No table installed.
    None,
    /// Built from the acquiring client's flat interrupt map. Torn down on
    /// release, never by the lifecycle paths.
    Client(IntcConfig),
    /// Built from a firmware vendor resource. Torn down on stop or on a
    /// failed start.
    Firmware(IntcConfig),
}

/// Everything needed to bring up one core's driver object.
pub struct PruConfig {
    /// Control register window descriptor. The core identity is derived
    /// from its physical base.
    pub ctrl_window: MemRegion,
    /// Debug register window descriptor.
    pub debug_window: MemRegion,
    /// Instruction RAM descriptor.
    pub iram_window: MemRegion,
    /// Subsystem data RAM descriptors.
    pub banks: DataBanks,
    /// Mapped control window.
    pub ctrl_regs: Arc<dyn MmioRegion>,
    /// Default firmware image name.
    pub firmware: String,
    /// Signal-routing configuration collaborator.
    pub mux: Arc<dyn CfgMux>,
    /// Interrupt controller collaborator.
    pub intc: Arc<dyn IntcController>,
    /// Inbound vring interrupt line, if routed.
    pub vring: Option<Arc<dyn InterruptLine>>,
    /// Outbound kick interrupt line, if routed.
    pub kick: Option<Arc<dyn InterruptLine>>,
    /// Mailbox channel, if available.
    pub mailbox: Option<Arc<dyn Mailbox>>,
}

/// Driver object for one PRU core.
#[derive(Debug)]
pub struct Pru {
    id: PruId,
    mem: PruMemoryMap,
    ctrl_window: MemRegion,
    debug_window: MemRegion,
    ctrl: PruControl,
    default_fw: String,
    kick_path: KickPath,

    pub(crate) mux: Arc<dyn CfgMux>,
    pub(crate) intc: Arc<dyn IntcController>,
    pub(crate) vring: Option<Arc<dyn InterruptLine>>,
    pub(crate) kick_line: Option<Arc<dyn InterruptLine>>,
    pub(crate) mailbox: Option<Arc<dyn Mailbox>>,

    /// Client usage lock. Held only for short ownership bookkeeping; never
    /// nested with the register rmw lock.
    pub(crate) owner: Mutex<Option<Claim>>,
    pub(crate) fw_override: Mutex<Option<String>>,
    pub(crate) table: Mutex<TableState>,
    pub(crate) vdev_handler: Mutex<Option<Arc<dyn VirtqueueHandler>>>,
    pub(crate) vring_attached: AtomicBool,
}

impl Pru {
    /// Build the driver object for one core.
    ///
    /// # Errors
    ///
    /// Returns [`PrussError::InvalidFormat`] when the control-window base
    /// matches neither core identity mask.
    pub fn new(config: PruConfig) -> Result<Arc<Self>> {
        let id = PruId::from_ctrl_base(config.ctrl_window.pa).ok_or_else(|| {
            PrussError::invalid_format(format!(
                "control window base {:#x} matches neither PRU identity mask",
                config.ctrl_window.pa
            ))
        })?;

        // Outbound path is decided once, by availability: a dedicated kick
        // line wins over the mailbox.
        let kick_path = if config.kick.is_some() {
            KickPath::TriggerLine
        } else if config.mailbox.is_some() {
            KickPath::MessageChannel
        } else {
            KickPath::None
        };

        tracing::info!("{id}: kick path {kick_path:?}, firmware \"{}\"", config.firmware);

        Ok(Arc::new(Self {
            id,
            mem: PruMemoryMap {
                id,
                iram: config.iram_window,
                banks: config.banks,
                da: AddrMap::default(),
            },
            ctrl_window: config.ctrl_window,
            debug_window: config.debug_window,
            ctrl: PruControl::new(config.ctrl_regs),
            default_fw: config.firmware,
            kick_path,
            mux: config.mux,
            intc: config.intc,
            vring: config.vring,
            kick_line: config.kick,
            mailbox: config.mailbox,
            owner: Mutex::new(None),
            fw_override: Mutex::new(None),
            table: Mutex::new(TableState::None),
            vdev_handler: Mutex::new(None),
            vring_attached: AtomicBool::new(false),
        }))
    }

    /// Identity of this core.
    #[must_use]
    pub fn id(&self) -> PruId {
        self.id
    }

    /// Control-block accessor.
    #[must_use]
    pub fn control(&self) -> &PruControl {
        &self.ctrl
    }

    /// The control register window descriptor.
    #[must_use]
    pub fn ctrl_window(&self) -> MemRegion {
        self.ctrl_window
    }

    /// The debug register window descriptor.
    #[must_use]
    pub fn debug_window(&self) -> MemRegion {
        self.debug_window
    }

    /// The instruction RAM descriptor.
    #[must_use]
    pub fn iram_window(&self) -> MemRegion {
        self.mem.iram
    }

    /// Firmware image name in effect: the per-acquisition override when one
    /// was supplied, the default otherwise.
    #[must_use]
    pub fn firmware_name(&self) -> String {
        lock(&self.fw_override)
            .clone()
            .unwrap_or_else(|| self.default_fw.clone())
    }

    /// Outbound kick path decided at setup.
    #[must_use]
    pub fn kick_path(&self) -> KickPath {
        self.kick_path
    }

    /// Resolve a firmware device address against this core's memory map.
    ///
    /// # Errors
    ///
    /// Returns [`PrussError::NotFound`] when the range is empty or no
    /// region contains it.
    pub fn translate(&self, da: u32, len: u32, space: Space) -> Result<Resolved> {
        self.mem.translate(da, len, space)
    }

    /// Program a constant-table slot. See [`PruControl::set_ctable`].
    ///
    /// # Errors
    ///
    /// Returns [`PrussError::InvalidFormat`] for a bad slot,
    /// [`PrussError::Fatal`] if the bus is unreachable.
    pub fn set_ctable(&self, slot: u32, addr: u32) -> Result<()> {
        self.ctrl.set_ctable(slot, addr)
    }

    /// Register (or clear) the virtqueue processing hook. A registered hook
    /// marks the core as having message-passing dependents, which `start`
    /// requires a notification path for.
    pub fn set_virtqueue_handler(&self, handler: Option<Arc<dyn VirtqueueHandler>>) {
        *lock(&self.vdev_handler) = handler;
    }

    /// Whether any virtqueue dependents are registered.
    #[must_use]
    pub fn has_virtqueue_dependents(&self) -> bool {
        lock(&self.vdev_handler).is_some()
    }

    /// Current owner, if any.
    #[must_use]
    pub fn owner(&self) -> Option<ClientId> {
        lock(&self.owner).as_ref().map(|c| c.client.clone())
    }
}
