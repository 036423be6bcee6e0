//! In-process simulation of the driver's collaborators.
//!
//! No hardware required: register blocks, mux configuration, the interrupt
//! controller, interrupt lines, and the mailbox all have process-local
//! stand-ins here. They back the test suites and make the driver core
//! runnable in CI, and each records enough of what happened to assert on.

use crate::core::{lock, Pru, PruConfig};
use crate::error::{PrussError, Result};
use crate::intc::{IntcConfig, IntcController};
use crate::mem::DataBanks;
use crate::mmio::FakeRegs;
use crate::ownership::CfgMux;
use crate::transport::{InterruptLine, LineHandler, Mailbox, VirtqueueHandler, VqDispatch};
use pruss_chip::mem::{
    MemRegion, PruId, DRAM0_SIZE, DRAM1_SIZE, IRAM_SIZE, SHRDRAM_SIZE,
};
use pruss_chip::regs::CTRL_SIZE;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Mux configuration ────────────────────────────────────────────────────────

/// Simulated gp-mux configuration space.
#[derive(Debug)]
pub struct SimMux {
    values: Mutex<[u8; 2]>,
    fail_set: AtomicBool,
}

impl SimMux {
    /// Create with both cores at mux value `initial`.
    #[must_use]
    pub fn new(initial: u8) -> Self {
        Self {
            values: Mutex::new([initial; 2]),
            fail_set: AtomicBool::new(false),
        }
    }

    /// Current value for a core.
    #[must_use]
    pub fn value(&self, id: PruId) -> u8 {
        lock(&self.values)[id.index() as usize]
    }

    /// Make subsequent `set_mux` calls fail.
    pub fn fail_set(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
    }
}

impl CfgMux for SimMux {
    fn mux(&self, id: PruId) -> Result<u8> {
        Ok(lock(&self.values)[id.index() as usize])
    }

    fn set_mux(&self, id: PruId, value: u8) -> Result<()> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(PrussError::fatal("simulated mux failure"));
        }
        lock(&self.values)[id.index() as usize] = value;
        Ok(())
    }
}

// ── Interrupt controller ─────────────────────────────────────────────────────

/// Interrupt controller double that records commits and reversals.
#[derive(Debug, Default)]
pub struct RecordingIntc {
    active: Mutex<Option<IntcConfig>>,
    configures: AtomicUsize,
    unconfigures: AtomicUsize,
    fail_configure: AtomicBool,
}

impl RecordingIntc {
    /// Create an idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently committed table, if any.
    #[must_use]
    pub fn active(&self) -> Option<IntcConfig> {
        lock(&self.active).clone()
    }

    /// Number of successful commits.
    #[must_use]
    pub fn configures(&self) -> usize {
        self.configures.load(Ordering::SeqCst)
    }

    /// Number of reversals.
    #[must_use]
    pub fn unconfigures(&self) -> usize {
        self.unconfigures.load(Ordering::SeqCst)
    }

    /// Make subsequent commits fail.
    pub fn fail_configure(&self, fail: bool) {
        self.fail_configure.store(fail, Ordering::SeqCst);
    }
}

impl IntcController for RecordingIntc {
    fn configure(&self, config: &IntcConfig) -> Result<()> {
        if self.fail_configure.load(Ordering::SeqCst) {
            return Err(PrussError::fatal("simulated intc failure"));
        }
        *lock(&self.active) = Some(config.clone());
        self.configures.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unconfigure(&self, _config: &IntcConfig) -> Result<()> {
        *lock(&self.active) = None;
        self.unconfigures.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Interrupt line ───────────────────────────────────────────────────────────

/// Simulated edge-triggered interrupt line.
pub struct SimLine {
    handler: Mutex<Option<LineHandler>>,
    raised: AtomicUsize,
    fail_attach: AtomicBool,
    fail_raise: AtomicBool,
}

impl std::fmt::Debug for SimLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimLine")
            .field("attached", &lock(&self.handler).is_some())
            .field("raised", &self.raised.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for SimLine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimLine {
    /// Create an unattached line.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handler: Mutex::new(None),
            raised: AtomicUsize::new(0),
            fail_attach: AtomicBool::new(false),
            fail_raise: AtomicBool::new(false),
        }
    }

    /// Fire the line from the remote side, invoking the attached handler.
    pub fn fire(&self) {
        let handler = lock(&self.handler).clone();
        if let Some(handler) = handler {
            handler();
        }
    }

    /// Whether a handler is currently attached.
    #[must_use]
    pub fn attached(&self) -> bool {
        lock(&self.handler).is_some()
    }

    /// Number of outbound raises observed.
    #[must_use]
    pub fn raised(&self) -> usize {
        self.raised.load(Ordering::SeqCst)
    }

    /// Make subsequent `attach` calls fail.
    pub fn fail_attach(&self, fail: bool) {
        self.fail_attach.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `raise` calls fail.
    pub fn fail_raise(&self, fail: bool) {
        self.fail_raise.store(fail, Ordering::SeqCst);
    }
}

impl InterruptLine for SimLine {
    fn attach(&self, handler: LineHandler) -> Result<()> {
        if self.fail_attach.load(Ordering::SeqCst) {
            return Err(PrussError::fatal("simulated attach failure"));
        }
        *lock(&self.handler) = Some(handler);
        Ok(())
    }

    fn detach(&self) {
        *lock(&self.handler) = None;
    }

    fn raise(&self) -> Result<()> {
        if self.fail_raise.load(Ordering::SeqCst) {
            return Err(PrussError::fatal("simulated raise failure"));
        }
        self.raised.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Mailbox ──────────────────────────────────────────────────────────────────

/// Simulated mailbox that records every sent payload.
#[derive(Debug, Default)]
pub struct SimMailbox {
    sent: Mutex<Vec<u32>>,
    fail_send: AtomicBool,
}

impl SimMailbox {
    /// Create an empty mailbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<u32> {
        lock(&self.sent).clone()
    }

    /// Make subsequent sends fail.
    pub fn fail_send(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }
}

impl Mailbox for SimMailbox {
    fn send(&self, msg: u32) -> Result<()> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(PrussError::fatal("simulated mailbox failure"));
        }
        lock(&self.sent).push(msg);
        Ok(())
    }
}

// ── Virtqueue handler ────────────────────────────────────────────────────────

/// Virtqueue hook that records which queues were dispatched.
#[derive(Debug, Default)]
pub struct CountingVqHandler {
    dispatched: Mutex<Vec<u32>>,
    has_work: AtomicBool,
}

impl CountingVqHandler {
    /// Create with `has_work` deciding the dispatch outcome.
    #[must_use]
    pub fn new(has_work: bool) -> Self {
        Self {
            dispatched: Mutex::new(Vec::new()),
            has_work: AtomicBool::new(has_work),
        }
    }

    /// Queue indices dispatched so far, in order.
    #[must_use]
    pub fn dispatched(&self) -> Vec<u32> {
        lock(&self.dispatched).clone()
    }
}

impl VirtqueueHandler for CountingVqHandler {
    fn vq_interrupt(&self, vq: u32) -> VqDispatch {
        lock(&self.dispatched).push(vq);
        if self.has_work.load(Ordering::SeqCst) {
            VqDispatch::Handled
        } else {
            VqDispatch::NoWork
        }
    }
}

// ── Assembled simulated core ─────────────────────────────────────────────────

/// The collaborator doubles backing one simulated core.
#[derive(Debug)]
pub struct SimHarness {
    /// The in-memory control register block.
    pub regs: Arc<FakeRegs>,
    /// The mux configuration double.
    pub mux: Arc<SimMux>,
    /// The interrupt controller double.
    pub intc: Arc<RecordingIntc>,
}

/// Builder for a simulated core with optional transports.
#[derive(Debug)]
pub struct SimPruBuilder {
    id: PruId,
    firmware: String,
    initial_mux: u8,
    vring: Option<Arc<SimLine>>,
    kick: Option<Arc<SimLine>>,
    mailbox: Option<Arc<SimMailbox>>,
}

impl SimPruBuilder {
    /// Start building a simulated core.
    #[must_use]
    pub fn new(id: PruId) -> Self {
        Self {
            id,
            firmware: format!("pru{}-fw", id.index()),
            initial_mux: 0,
            vring: None,
            kick: None,
            mailbox: None,
        }
    }

    /// Route an inbound vring line.
    #[must_use]
    pub fn with_vring(mut self, line: Arc<SimLine>) -> Self {
        self.vring = Some(line);
        self
    }

    /// Route an outbound kick line.
    #[must_use]
    pub fn with_kick(mut self, line: Arc<SimLine>) -> Self {
        self.kick = Some(line);
        self
    }

    /// Provide a mailbox channel.
    #[must_use]
    pub fn with_mailbox(mut self, mailbox: Arc<SimMailbox>) -> Self {
        self.mailbox = Some(mailbox);
        self
    }

    /// Initial mux value seen before any override.
    #[must_use]
    pub fn with_initial_mux(mut self, value: u8) -> Self {
        self.initial_mux = value;
        self
    }

    /// Assemble the core and its harness.
    ///
    /// # Panics
    ///
    /// Panics if construction fails; the builder always supplies a valid
    /// control-window base.
    #[must_use]
    pub fn build(self) -> (Arc<Pru>, SimHarness) {
        let regs = Arc::new(FakeRegs::new(CTRL_SIZE as usize));
        let mux = Arc::new(SimMux::new(self.initial_mux));
        let intc = Arc::new(RecordingIntc::new());

        let ctrl_base = match self.id {
            PruId::Pru0 => SIM_PRU0_CTRL,
            PruId::Pru1 => SIM_PRU1_CTRL,
        };
        let iram_base = match self.id {
            PruId::Pru0 => 0x4A33_4000,
            PruId::Pru1 => 0x4A33_8000,
        };

        let pru = Pru::new(PruConfig {
            ctrl_window: MemRegion::new(ctrl_base, CTRL_SIZE),
            debug_window: MemRegion::new(ctrl_base + 0x400, pruss_chip::regs::DEBUG_SIZE),
            iram_window: MemRegion::new(iram_base, IRAM_SIZE),
            banks: sim_banks(),
            ctrl_regs: Arc::clone(&regs) as Arc<dyn crate::mmio::MmioRegion>,
            firmware: self.firmware,
            mux: Arc::clone(&mux) as Arc<dyn CfgMux>,
            intc: Arc::clone(&intc) as Arc<dyn IntcController>,
            vring: self
                .vring
                .map(|l| l as Arc<dyn InterruptLine>),
            kick: self.kick.map(|l| l as Arc<dyn InterruptLine>),
            mailbox: self.mailbox.map(|m| m as Arc<dyn Mailbox>),
        })
        .expect("sim control base must resolve an identity");

        (pru, SimHarness { regs, mux, intc })
    }
}

/// Control-window base whose bits resolve to PRU0.
pub const SIM_PRU0_CTRL: u64 = 0x4A37_4000;
/// Control-window base whose bits resolve to PRU1.
pub const SIM_PRU1_CTRL: u64 = 0x4A37_8000;

fn sim_banks() -> DataBanks {
    DataBanks {
        dram0: MemRegion::new(0x4A30_0000, DRAM0_SIZE),
        dram1: MemRegion::new(0x4A30_2000, DRAM1_SIZE),
        shared: MemRegion::new(0x4A31_0000, SHRDRAM_SIZE),
    }
}

/// A simulated core with no transports.
#[must_use]
pub fn sim_pru(id: PruId) -> (Arc<Pru>, SimHarness) {
    SimPruBuilder::new(id).build()
}

/// Attempt to build a core at an arbitrary control-window base, for
/// exercising identity derivation.
///
/// # Errors
///
/// Propagates [`Pru::new`] failures.
pub fn sim_pru_at(ctrl_base: u64) -> Result<Arc<Pru>> {
    let regs = Arc::new(FakeRegs::new(CTRL_SIZE as usize));
    Pru::new(PruConfig {
        ctrl_window: MemRegion::new(ctrl_base, CTRL_SIZE),
        debug_window: MemRegion::new(ctrl_base + 0x400, pruss_chip::regs::DEBUG_SIZE),
        iram_window: MemRegion::new(0x4A33_4000, IRAM_SIZE),
        banks: sim_banks(),
        ctrl_regs: regs,
        firmware: "pru-fw".into(),
        mux: Arc::new(SimMux::new(0)),
        intc: Arc::new(RecordingIntc::new()),
        vring: None,
        kick: None,
        mailbox: None,
    })
}
