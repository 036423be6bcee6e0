//! Transport seams for virtqueue signalling.
//!
//! A core can notify the host (and be notified) either through dedicated
//! interrupt lines routed by the INTC, or through a mailbox channel. The
//! traits below are the boundary to those collaborators; the driver core
//! never implements the transports itself.

use crate::error::Result;
use std::fmt::Debug;
use std::sync::Arc;

/// Handler invoked when an interrupt line fires.
pub type LineHandler = Arc<dyn Fn() + Send + Sync>;

/// An edge-triggered interrupt line.
pub trait InterruptLine: Debug + Send + Sync {
    /// Attach a handler to the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be claimed.
    fn attach(&self, handler: LineHandler) -> Result<()>;

    /// Detach the currently attached handler, if any.
    fn detach(&self);

    /// Raise the line towards the remote side.
    ///
    /// # Errors
    ///
    /// Returns an error if the trigger could not be delivered.
    fn raise(&self) -> Result<()>;
}

/// A mailbox channel able to carry one `u32` payload per message.
pub trait Mailbox: Debug + Send + Sync {
    /// Send a message. The payload is the index of the kicked virtqueue.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be queued.
    fn send(&self, msg: u32) -> Result<()>;
}

/// Outcome of dispatching one virtqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VqDispatch {
    /// Work was found and processed.
    Handled,
    /// The queue had nothing pending. Not an error.
    NoWork,
}

/// Virtqueue processing hook, implemented by the message-transport layer
/// sitting on top of this driver.
pub trait VirtqueueHandler: Debug + Send + Sync {
    /// Process pending buffers on virtqueue `vq`.
    fn vq_interrupt(&self, vq: u32) -> VqDispatch;
}

/// Outbound notification path for a core, fixed at setup time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KickPath {
    /// Raise the dedicated kick interrupt line.
    TriggerLine,
    /// Send the virtqueue index through the mailbox.
    MessageChannel,
    /// No path configured; kicks are silent no-ops.
    None,
}
