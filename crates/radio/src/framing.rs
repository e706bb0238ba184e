//! Link-layer framing.
//!
//! Every application payload travels inside a link frame: a short
//! link header followed by the payload bytes. The collector must skip this
//! header before it can read the application's transaction header, so the
//! combined size of both is the minimum frame length that can still be
//! attributed to a device.

use bytes::{Buf, BufMut};

use loratx_core::TransactionHeader;

/// Link header preceding the application payload on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkHeader {
    /// Link-level device address; LoRaTx reuses the device id.
    pub dev_addr: u32,
    /// Link frame counter, maintained per device.
    pub fcnt: u16,
    /// Application port.
    pub port: u8,
}

/// Smallest frame that still carries the full header stack.
pub const MIN_ATTRIBUTABLE_LEN: usize = LinkHeader::LEN + TransactionHeader::LEN;

impl LinkHeader {
    pub const LEN: usize = 7;

    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.dev_addr);
        buf.put_u16(self.fcnt);
        buf.put_u8(self.port);
    }

    pub fn decode(buf: &mut impl Buf) -> Option<Self> {
        if buf.remaining() < Self::LEN {
            return None;
        }
        Some(LinkHeader {
            dev_addr: buf.get_u32(),
            fcnt: buf.get_u16(),
            port: buf.get_u8(),
        })
    }

    /// Build the on-air frame for `payload`.
    pub fn wrap(&self, payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(Self::LEN + payload.len());
        self.encode(&mut frame);
        frame.extend_from_slice(payload);
        frame
    }
}
