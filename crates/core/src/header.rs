//! On-wire application header carried by every transactional packet.

use bytes::{Buf, BufMut};

use crate::{DeviceId, PacketId, TransactionId};

/// Identifying metadata prepended to every packet of a transaction.
///
/// Fixed 8-byte layout, all fields big-endian: `device_id` (4), then
/// `transaction_id` (2), then `packet_id` (2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionHeader {
    pub device_id: DeviceId,
    pub transaction_id: TransactionId,
    pub packet_id: PacketId,
}

impl TransactionHeader {
    /// Serialized size in bytes.
    pub const LEN: usize = 8;

    pub fn new(device_id: DeviceId, transaction_id: TransactionId, packet_id: PacketId) -> Self {
        TransactionHeader {
            device_id,
            transaction_id,
            packet_id,
        }
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.device_id);
        buf.put_u16(self.transaction_id);
        buf.put_u16(self.packet_id);
    }

    /// Decode a header from the front of `buf`.
    ///
    /// Returns `None` if fewer than [`Self::LEN`] bytes remain: a frame
    /// truncated below the full header cannot be attributed to any
    /// transaction and is skipped by callers, never treated as an error.
    pub fn decode(buf: &mut impl Buf) -> Option<Self> {
        if buf.remaining() < Self::LEN {
            return None;
        }
        Some(TransactionHeader {
            device_id: buf.get_u32(),
            transaction_id: buf.get_u16(),
            packet_id: buf.get_u16(),
        })
    }
}
