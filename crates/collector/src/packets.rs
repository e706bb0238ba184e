//! Accounting path for non-transactional, single-packet traffic.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use log::warn;
use serde::Serialize;

use loratx_core::{DeviceId, PacketId};
use loratx_radio::DeliveryOutcome;

use crate::tracker::ReceptionCounters;
use crate::{attribute_frame, CollectorError};

/// Aggregate over individual packets rather than transactions.
#[derive(Debug, Clone, Serialize)]
pub struct PacketReport {
    pub successful: u64,
    pub unsuccessful: u64,
    pub success_rate: f64,
    pub throughput_per_hour: f64,
}

/// Per-device success and loss sets over packet ids.
///
/// A packet counts as truly lost only when its id appears in the loss set
/// and not in the success set for that device, so independent receivers
/// reporting the same packet never double-count it.
#[derive(Debug, Default)]
pub struct PacketTracker {
    delivered: HashMap<DeviceId, HashSet<PacketId>>,
    lost: HashMap<DeviceId, HashSet<PacketId>>,
    counters: ReceptionCounters,
    finalized: bool,
}

impl PacketTracker {
    pub fn new() -> Self {
        PacketTracker::default()
    }

    pub fn counters(&self) -> &ReceptionCounters {
        &self.counters
    }

    pub fn observe(&mut self, outcome: &DeliveryOutcome) {
        if self.finalized {
            warn!("delivery outcome after finalization, ignoring");
            return;
        }

        match outcome {
            DeliveryOutcome::Success { frame, .. } => {
                self.counters.bump_received();
                if let Some(header) = attribute_frame(frame) {
                    self.delivered
                        .entry(header.device_id)
                        .or_default()
                        .insert(header.packet_id);
                }
            }
            DeliveryOutcome::Loss { cause, frame, .. } => {
                self.counters.bump_loss(*cause);
                if let Some(header) = attribute_frame(frame) {
                    self.lost
                        .entry(header.device_id)
                        .or_default()
                        .insert(header.packet_id);
                }
            }
        }
    }

    /// Compute the final per-packet statistics. One-shot, like
    /// [`TransactionTracker::finalize`](crate::TransactionTracker::finalize).
    pub fn finalize(
        &mut self,
        simulation_duration: Duration,
    ) -> Result<PacketReport, CollectorError> {
        if self.finalized {
            return Err(CollectorError::AlreadyFinalized);
        }
        if simulation_duration.is_zero() {
            return Err(CollectorError::ZeroDuration);
        }
        self.finalized = true;

        let successful: u64 = self.delivered.values().map(|ids| ids.len() as u64).sum();

        let empty = HashSet::new();
        let unsuccessful: u64 = self
            .lost
            .iter()
            .map(|(device, ids)| {
                let delivered = self.delivered.get(device).unwrap_or(&empty);
                ids.iter().filter(|id| !delivered.contains(id)).count() as u64
            })
            .sum();

        let total = successful + unsuccessful;
        if total == 0 {
            return Err(CollectorError::NoObservations);
        }

        Ok(PacketReport {
            successful,
            unsuccessful,
            success_rate: successful as f64 / total as f64,
            throughput_per_hour: successful as f64 * (3600.0 / simulation_duration.as_secs_f64()),
        })
    }
}
