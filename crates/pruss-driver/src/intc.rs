//! Interrupt-routing table construction and validation.
//!
//! The routing table maps system events onto intermediate channels and
//! channels onto host interrupt lines. It can be built from two mutually
//! exclusive sources: a flat quadruple list supplied by the acquiring client,
//! or a vendor resource descriptor found in firmware content. Both builders
//! are all-or-nothing — an invalid value anywhere voids the construction and
//! no partial table ever becomes observable.

use crate::error::{PrussError, Result};
use crate::vendor::VendorIntrMap;
use pruss_chip::intc::{MAX_CHANNELS, MAX_HOST_INTERRUPTS, MAX_SYS_EVENTS};
use std::fmt::Debug;

/// A validated interrupt-routing table.
///
/// Every slot defaults to unmapped; only explicitly routed events and
/// channels carry a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntcConfig {
    sysev_to_ch: [Option<u8>; MAX_SYS_EVENTS],
    ch_to_host: [Option<u8>; MAX_CHANNELS],
}

impl Default for IntcConfig {
    fn default() -> Self {
        Self {
            sysev_to_ch: [None; MAX_SYS_EVENTS],
            ch_to_host: [None; MAX_CHANNELS],
        }
    }
}

impl IntcConfig {
    /// Build from a flat quadruple list of
    /// `(core-index, system-event, channel, host-interrupt)` values.
    ///
    /// Only tuples whose core-index matches `index` are consumed; the rest
    /// belong to other cores named by the same client.
    ///
    /// # Errors
    ///
    /// Returns [`PrussError::InvalidFormat`] when the list length is not a
    /// positive multiple of 4 or any consumed value is out of bounds.
    pub fn from_interrupt_map(map: &[u32], index: u32) -> Result<Self> {
        if map.is_empty() || map.len() % 4 != 0 {
            return Err(PrussError::invalid_format(format!(
                "bad interrupt map length {}, expected positive multiple of 4",
                map.len()
            )));
        }

        let mut config = Self::default();

        for tuple in map.chunks_exact(4) {
            if tuple[0] != index {
                continue;
            }

            let (sysev, ch, host) = (tuple[1], tuple[2], tuple[3]);

            if sysev as usize >= MAX_SYS_EVENTS {
                return Err(PrussError::invalid_format(format!(
                    "bad system event {sysev}"
                )));
            }
            if ch as usize >= MAX_CHANNELS {
                return Err(PrussError::invalid_format(format!("bad channel {ch}")));
            }
            if host as usize >= MAX_HOST_INTERRUPTS {
                return Err(PrussError::invalid_format(format!(
                    "bad host interrupt {host}"
                )));
            }

            config.sysev_to_ch[sysev as usize] = Some(ch as u8);
            tracing::debug!("sysevt-to-ch[{sysev}] -> {ch}");

            config.ch_to_host[ch as usize] = Some(host as u8);
            tracing::debug!("chnl-to-host[{ch}] -> {host}");
        }

        Ok(config)
    }

    /// Build from a parsed vendor resource descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`PrussError::InvalidFormat`] when any event, channel, or
    /// host-interrupt value is out of bounds.
    pub fn from_vendor_resource(rsc: &VendorIntrMap) -> Result<Self> {
        let mut config = Self::default();

        for (i, &(sysev, ch)) in rsc.event_channel.iter().enumerate() {
            if sysev < 0 || sysev as usize >= MAX_SYS_EVENTS {
                return Err(PrussError::invalid_format(format!(
                    "[{i}] bad system event {sysev}"
                )));
            }
            if ch < 0 || ch as usize >= MAX_CHANNELS {
                return Err(PrussError::invalid_format(format!(
                    "[{i}] bad channel {ch}"
                )));
            }

            #[allow(clippy::cast_sign_loss)]
            {
                config.sysev_to_ch[sysev as usize] = Some(ch as u8);
            }
            tracing::debug!("sysevt-to-ch[{sysev}] -> {ch}");
        }

        for (ch, &host) in rsc.ch_to_host.iter().enumerate() {
            if host < 0 {
                tracing::debug!("skip host interrupt mapping for channel {ch}");
                continue;
            }
            if host as usize >= MAX_HOST_INTERRUPTS {
                return Err(PrussError::invalid_format(format!(
                    "bad host interrupt {host} for channel {ch}"
                )));
            }

            #[allow(clippy::cast_sign_loss)]
            {
                config.ch_to_host[ch] = Some(host as u8);
            }
            tracing::debug!("chnl-to-host[{ch}] -> {host}");
        }

        Ok(config)
    }

    /// Channel routed for a system event, if mapped.
    #[must_use]
    pub fn channel_for(&self, sysev: usize) -> Option<u8> {
        self.sysev_to_ch.get(sysev).copied().flatten()
    }

    /// Host interrupt routed for a channel, if mapped.
    #[must_use]
    pub fn host_for(&self, ch: usize) -> Option<u8> {
        self.ch_to_host.get(ch).copied().flatten()
    }

    /// Whether no slot is mapped at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sysev_to_ch.iter().all(Option::is_none)
            && self.ch_to_host.iter().all(Option::is_none)
    }
}

/// The subsystem interrupt controller, as seen by this driver.
///
/// Committing and reversing a routing table is done by the PRUSS parent
/// driver; this core only builds and validates tables.
pub trait IntcController: Debug + Send + Sync {
    /// Commit a validated routing table to the controller.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller rejects the table (for example a
    /// channel already routed by the other core).
    fn configure(&self, config: &IntcConfig) -> Result<()>;

    /// Reverse a previously committed routing table.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller cannot undo the mappings.
    fn unconfigure(&self, config: &IntcConfig) -> Result<()>;
}
