//! Virtqueue kick dispatch and inbound notification handling.
//!
//! Kicks are best-effort notifications, not guaranteed delivery: failures
//! are logged and swallowed, and virtqueue correctness relies on the
//! receiver re-checking its queues, not on kick arrival.

use crate::core::{lock, Pru};
use crate::transport::{KickPath, VqDispatch};

impl Pru {
    /// Notify the core that virtqueue `vq` has new work.
    ///
    /// Uses the path fixed at setup: the dedicated kick line when routed,
    /// else the mailbox with `vq` as payload, else a silent no-op.
    pub fn kick(&self, vq: u32) {
        tracing::debug!("kicking vq {vq} on {}", self.id());

        match self.kick_path() {
            KickPath::TriggerLine => {
                if let Some(line) = &self.kick_line {
                    if let Err(e) = line.raise() {
                        tracing::error!("{}: kick trigger failed: {e}", self.id());
                    }
                }
            }
            KickPath::MessageChannel => {
                if let Some(mailbox) = &self.mailbox {
                    if let Err(e) = mailbox.send(vq) {
                        tracing::error!("{}: mailbox send failed: {e}", self.id());
                    }
                }
            }
            KickPath::None => {}
        }
    }

    /// Inbound vring-line interrupt.
    ///
    /// Interrupt lines carry no payload, so a single event covers both
    /// directions: the receive and transmit virtqueues (0 and 1) are
    /// processed unconditionally.
    pub fn vring_interrupt(&self) {
        tracing::debug!("got vring interrupt on {}", self.id());

        let Some(handler) = lock(&self.vdev_handler).clone() else {
            return;
        };

        for vq in [0, 1] {
            if handler.vq_interrupt(vq) == VqDispatch::NoWork {
                tracing::debug!("no message was found in vq {vq}");
            }
        }
    }

    /// Inbound mailbox message. The payload is the index of the virtqueue
    /// the remote side kicked; only that queue is processed.
    pub fn mailbox_callback(&self, msg: u32) {
        tracing::debug!("mailbox message {msg:#x} on {}", self.id());

        let Some(handler) = lock(&self.vdev_handler).clone() else {
            return;
        };

        if handler.vq_interrupt(msg) == VqDispatch::NoWork {
            tracing::debug!("no message was found in vq {msg}");
        }
    }
}
