//! Device-side transaction generator.
//!
//! Each device repeatedly emits one *transaction*: `packets_per_transaction`
//! numbered data packets followed by two signature parts, paced by the
//! configured intra- and inter-transaction delays. The generator owns all of
//! its mutable state and is driven from outside: every call to
//! [`TransactionGenerator::next_send`] builds exactly one frame and reports
//! when the next one is due, so a scheduler can re-queue it without any
//! shared state.

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::header::TransactionHeader;
use crate::{DeviceId, PacketId};

/// What a generator does with its pending send once a stop is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopPolicy {
    /// Drop the pending send immediately; a partial transaction is not
    /// flushed.
    Immediate,
    /// Finish the transaction currently in flight, but never start a new
    /// one.
    FinishTransaction,
}

/// Generator settings, fixed once the device starts sending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Total frame size of a regular data packet, header included.
    pub data_packet_size: u8,
    /// Total frame size of each of the two signature parts.
    pub sig_part_size: u8,
    /// Number of data packets per transaction, signature parts excluded.
    pub packets_per_transaction: u16,
    /// Gap between consecutive packets of the same transaction.
    pub intra_transaction_delay: Duration,
    /// Gap between the second signature part and the next transaction.
    pub inter_transaction_delay: Duration,
    /// One-time startup delay before the very first send.
    pub initial_delay: Duration,
    pub stop_policy: StopPolicy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            data_packet_size: 42,
            sig_part_size: 34,
            packets_per_transaction: 10,
            intra_transaction_delay: Duration::from_secs(10),
            inter_transaction_delay: Duration::from_secs(2 * 3600),
            initial_delay: Duration::from_secs(1),
            stop_policy: StopPolicy::FinishTransaction,
        }
    }
}

impl GeneratorConfig {
    // Setters treat the zero value as "keep default", so a caller can pass
    // through unset scenario parameters without special-casing them.

    pub fn set_data_packet_size(&mut self, size: u8) {
        if size != 0 {
            self.data_packet_size = size;
        }
    }

    pub fn set_sig_part_size(&mut self, size: u8) {
        if size != 0 {
            self.sig_part_size = size;
        }
    }

    pub fn set_packets_per_transaction(&mut self, packets: u16) {
        if packets != 0 {
            self.packets_per_transaction = packets;
        }
    }

    pub fn set_intra_transaction_delay(&mut self, delay: Duration) {
        if delay != Duration::ZERO {
            self.intra_transaction_delay = delay;
        }
    }

    pub fn set_inter_transaction_delay(&mut self, delay: Duration) {
        if delay != Duration::ZERO {
            self.inter_transaction_delay = delay;
        }
    }

    pub fn set_initial_delay(&mut self, delay: Duration) {
        if delay != Duration::ZERO {
            self.initial_delay = delay;
        }
    }
}

/// Position of a packet within its transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Data,
    /// `part` is 1 or 2.
    Signature { part: u8 },
}

/// One frame produced by the generator, plus the delay until the next one.
#[derive(Debug, Clone)]
pub struct SendStep {
    pub header: TransactionHeader,
    pub kind: PacketKind,
    pub frame: Vec<u8>,
    /// `None` when this was the generator's final send.
    pub next_in: Option<Duration>,
}

/// Per-device transaction source.
///
/// State is keyed by `packet_count` relative to `packets_per_transaction`:
/// counts below it are data packets, the next two slots are the signature
/// parts, after which the counter resets and `transaction_count` increments.
#[derive(Debug)]
pub struct TransactionGenerator {
    device_id: DeviceId,
    config: GeneratorConfig,
    packet_count: u16,
    transaction_count: u16,
    last_round: bool,
    stopped: bool,
}

impl TransactionGenerator {
    pub fn new(device_id: DeviceId, config: GeneratorConfig) -> Self {
        TransactionGenerator {
            device_id,
            config,
            packet_count: 0,
            transaction_count: 0,
            last_round: false,
            stopped: false,
        }
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Delay before the first send after activation.
    pub fn initial_delay(&self) -> Duration {
        self.config.initial_delay
    }

    /// Transactions fully emitted so far.
    pub fn transaction_count(&self) -> u16 {
        self.transaction_count
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Request a stop according to the configured [`StopPolicy`].
    ///
    /// With `Immediate` the pending send is refused on its next dispatch;
    /// with `FinishTransaction` the in-flight transaction still completes
    /// but no new one starts.
    pub fn request_stop(&mut self) {
        match self.config.stop_policy {
            StopPolicy::Immediate => self.stopped = true,
            StopPolicy::FinishTransaction => self.last_round = true,
        }
    }

    /// Build the next frame and advance the state machine.
    ///
    /// Returns `None` once the generator has stopped; no frame is emitted
    /// and nothing further is due.
    pub fn next_send(&mut self) -> Option<SendStep> {
        if self.stopped {
            return None;
        }
        // A stop request between transactions means no new one starts.
        if self.last_round && self.packet_count == 0 {
            self.stopped = true;
            return None;
        }

        let ppt = self.config.packets_per_transaction;
        let (kind, size) = if self.packet_count < ppt {
            (PacketKind::Data, self.config.data_packet_size)
        } else if self.packet_count == ppt {
            (PacketKind::Signature { part: 1 }, self.config.sig_part_size)
        } else {
            (PacketKind::Signature { part: 2 }, self.config.sig_part_size)
        };

        let header = TransactionHeader::new(self.device_id, self.transaction_count, self.packet_count);
        let frame = build_frame(&header, size);

        let next_in = if self.packet_count == ppt.saturating_add(1) {
            self.packet_count = 0;
            self.transaction_count = self.transaction_count.wrapping_add(1);
            if self.last_round {
                self.stopped = true;
                None
            } else {
                Some(self.config.inter_transaction_delay)
            }
        } else {
            self.packet_count += 1;
            Some(self.config.intra_transaction_delay)
        };

        match kind {
            PacketKind::Data => debug!(
                "device {} sent data packet {} of transaction {} ({} B)",
                self.device_id,
                header.packet_id,
                header.transaction_id,
                frame.len()
            ),
            PacketKind::Signature { part } => debug!(
                "device {} sent signature packet {}/2 of transaction {} ({} B)",
                self.device_id,
                part,
                header.transaction_id,
                frame.len()
            ),
        }

        Some(SendStep {
            header,
            kind,
            frame,
            next_in,
        })
    }
}

/// Frame layout: the 8-byte header followed by zero padding up to the
/// configured size class, with a floor at the header size. The padding
/// stands in for application data and the signature placeholder alike.
fn build_frame(header: &TransactionHeader, target_size: u8) -> Vec<u8> {
    let size = (target_size as usize).max(TransactionHeader::LEN);
    let mut frame = Vec::with_capacity(size);
    header.encode(&mut frame);
    frame.resize(size, 0);
    frame
}
