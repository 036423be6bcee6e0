//! Vendor resource descriptor decoding.
//!
//! Firmware images can carry a vendor-specific resource whose payload is the
//! descriptor form of the interrupt-routing table: a version tag, a list of
//! `(system event, channel)` pairs, and a parallel channel-to-host-interrupt
//! array. Only version 0 of the layout is understood.
//!
//! Wire layout (little endian):
//!
//! ```text
//! u32  version                 — must be 0
//! u32  count                   — number of (event, channel) pairs, < 64
//! i8   event, i8 channel       — repeated `count` times
//! i8   host_interrupt × 10     — per channel; negative = unmapped
//! ```

use crate::error::{PrussError, Result};
use bytes::Buf;
use pruss_chip::intc::{MAX_CHANNELS, MAX_SYS_EVENTS};

/// Accepted descriptor layout version.
pub const VENDOR_RSC_VERSION: u32 = 0;

/// A decoded interrupt-map vendor resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorIntrMap {
    /// Layout version tag.
    pub version: u32,
    /// `(system event, channel)` pairs. Values are validated when the
    /// routing table is built, not here.
    pub event_channel: Vec<(i8, i8)>,
    /// Host interrupt per channel; negative entries are unmapped.
    pub ch_to_host: [i8; MAX_CHANNELS],
}

impl VendorIntrMap {
    /// Decode a descriptor payload.
    ///
    /// # Errors
    ///
    /// Returns [`PrussError::UnsupportedVersion`] for any version other
    /// than 0 and [`PrussError::InvalidFormat`] for a truncated payload or
    /// an event count at or above the hardware limit.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut buf = payload;

        if buf.remaining() < 8 {
            return Err(PrussError::invalid_format(
                "vendor resource payload too short for header",
            ));
        }

        let version = buf.get_u32_le();
        if version != VENDOR_RSC_VERSION {
            return Err(PrussError::UnsupportedVersion { version });
        }

        let count = buf.get_u32_le() as usize;
        if count >= MAX_SYS_EVENTS {
            return Err(PrussError::invalid_format(
                "vendor resource has more events than present on hardware",
            ));
        }

        if buf.remaining() < count * 2 + MAX_CHANNELS {
            return Err(PrussError::invalid_format(
                "vendor resource payload truncated",
            ));
        }

        let mut event_channel = Vec::with_capacity(count);
        for _ in 0..count {
            let event = buf.get_i8();
            let channel = buf.get_i8();
            event_channel.push((event, channel));
        }

        let mut ch_to_host = [0i8; MAX_CHANNELS];
        for slot in &mut ch_to_host {
            *slot = buf.get_i8();
        }

        Ok(Self {
            version,
            event_channel,
            ch_to_host,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(version: u32, pairs: &[(i8, i8)], hosts: [i8; MAX_CHANNELS]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&version.to_le_bytes());
        out.extend_from_slice(&(u32::try_from(pairs.len()).unwrap()).to_le_bytes());
        for &(e, c) in pairs {
            out.push(e as u8);
            out.push(c as u8);
        }
        for h in hosts {
            out.push(h as u8);
        }
        out
    }

    #[test]
    fn parses_well_formed_payload() {
        let payload = encode(0, &[(19, 1), (31, 0)], [2, -1, -1, -1, -1, -1, -1, -1, -1, -1]);
        let rsc = VendorIntrMap::parse(&payload).unwrap();
        assert_eq!(rsc.event_channel, vec![(19, 1), (31, 0)]);
        assert_eq!(rsc.ch_to_host[0], 2);
        assert_eq!(rsc.ch_to_host[1], -1);
    }

    #[test]
    fn rejects_unknown_version() {
        let payload = encode(1, &[], [-1; MAX_CHANNELS]);
        assert!(matches!(
            VendorIntrMap::parse(&payload),
            Err(PrussError::UnsupportedVersion { version: 1 })
        ));
    }

    #[test]
    fn rejects_truncated_payload() {
        let payload = encode(0, &[(19, 1)], [-1; MAX_CHANNELS]);
        assert!(VendorIntrMap::parse(&payload[..6]).is_err());
        assert!(VendorIntrMap::parse(&payload[..payload.len() - 1]).is_err());
    }

    #[test]
    fn rejects_oversized_event_count() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&0u32.to_le_bytes());
        payload.extend_from_slice(&64u32.to_le_bytes());
        assert!(VendorIntrMap::parse(&payload).is_err());
    }
}
