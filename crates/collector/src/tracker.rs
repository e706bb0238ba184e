//! Transaction-level completion accounting.

use std::collections::HashSet;
use std::time::Duration;

use log::{debug, warn};
use serde::Serialize;

use loratx_core::{DeviceId, TransactionId};
use loratx_radio::{DeliveryOutcome, LossCause};

use crate::outcome_log::OutcomeLog;
use crate::{attribute_frame, CollectorError};

/// Scalar reception tallies, independent of transaction attribution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReceptionCounters {
    pub received: u64,
    pub lost_interference: u64,
    pub lost_under_sensitivity: u64,
    pub lost_no_more_receivers: u64,
    pub lost_receiver_busy: u64,
}

impl ReceptionCounters {
    pub(crate) fn bump_received(&mut self) {
        self.received += 1;
    }

    pub(crate) fn bump_loss(&mut self, cause: LossCause) {
        match cause {
            LossCause::Interference => self.lost_interference += 1,
            LossCause::UnderSensitivity => self.lost_under_sensitivity += 1,
            LossCause::NoMoreReceivers => self.lost_no_more_receivers += 1,
            LossCause::ReceiverBusy => self.lost_receiver_busy += 1,
        }
    }

    pub fn total_lost(&self) -> u64 {
        self.lost_interference
            + self.lost_under_sensitivity
            + self.lost_no_more_receivers
            + self.lost_receiver_busy
    }
}

/// Final aggregate over all devices and transactions.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionReport {
    pub successful: u64,
    pub incomplete: u64,
    pub success_rate: f64,
    pub throughput_per_hour: f64,
}

/// Reconstructs per-device transactions from individually reported delivery
/// outcomes and computes completion statistics once, at shutdown.
///
/// A transaction counts as successful only when all
/// `packets_per_transaction + 2` packet ids (data plus both signature parts)
/// were observed as delivered. The two outcome classes share one container
/// type; the loss cause is tallied as a plain counter and plays no role in
/// attribution.
#[derive(Debug)]
pub struct TransactionTracker {
    packets_per_transaction: u16,
    delivered: OutcomeLog,
    lost: OutcomeLog,
    counters: ReceptionCounters,
    finalized: bool,
}

impl TransactionTracker {
    pub fn new(packets_per_transaction: u16) -> Self {
        TransactionTracker {
            packets_per_transaction,
            delivered: OutcomeLog::new(),
            lost: OutcomeLog::new(),
            counters: ReceptionCounters::default(),
            finalized: false,
        }
    }

    pub fn counters(&self) -> &ReceptionCounters {
        &self.counters
    }

    /// Ingest one delivery outcome.
    ///
    /// Frames too short to carry the full header stack are counted in the
    /// scalar tallies but excluded from transaction attribution. Outcomes
    /// arriving after [`finalize`](Self::finalize) are ignored.
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
                        .record(header.device_id, header.transaction_id, header.packet_id);
                }
            }
            DeliveryOutcome::Loss { cause, frame, .. } => {
                self.counters.bump_loss(*cause);
                if let Some(header) = attribute_frame(frame) {
                    self.lost
                        .record(header.device_id, header.transaction_id, header.packet_id);
                }
            }
        }
    }

    /// Compute the final statistics. One-shot: a second call is an error,
    /// and later `observe` calls are ignored.
    pub fn finalize(
        &mut self,
        simulation_duration: Duration,
    ) -> Result<TransactionReport, CollectorError> {
        if self.finalized {
            return Err(CollectorError::AlreadyFinalized);
        }
        if self.packets_per_transaction == 0 {
            return Err(CollectorError::ZeroPacketsPerTransaction);
        }
        if simulation_duration.is_zero() {
            return Err(CollectorError::ZeroDuration);
        }
        self.finalized = true;

        let threshold = self.packets_per_transaction as usize + 2;
        let mut successful: u64 = 0;
        let mut incomplete: u64 = 0;

        let mut devices: HashSet<DeviceId> = self.delivered.devices().collect();
        devices.extend(self.lost.devices());

        for device in devices {
            let mut highest_successful: Option<TransactionId> = None;
            let mut candidates: HashSet<TransactionId> = HashSet::new();

            if let Some(txns) = self.delivered.device_transactions(device) {
                for (&txn, packets) in txns {
                    if packets.len() == threshold {
                        successful += 1;
                        highest_successful =
                            Some(highest_successful.map_or(txn, |best| best.max(txn)));
                    } else {
                        candidates.insert(txn);
                    }
                }
            }
            if let Some(txns) = self.lost.device_transactions(device) {
                for &txn in txns.keys() {
                    if self.delivered.packet_count(device, txn) < threshold {
                        candidates.insert(txn);
                    }
                }
            }

            // A device's highest unfinished transaction straddling the end
            // of the run is an observation-window artifact, not a delivery
            // failure: leave it out of the incomplete count.
            let tail = candidates.iter().copied().max();
            for &txn in &candidates {
                let in_flight = Some(txn) == tail
                    && highest_successful.map_or(true, |best| txn > best)
                    && self.delivered.packet_count(device, txn) < threshold;
                if in_flight {
                    debug!("device {device}: transaction {txn} still in flight at shutdown");
                    continue;
                }
                incomplete += 1;
            }
        }

        let total = successful + incomplete;
        if total == 0 {
            return Err(CollectorError::NoObservations);
        }

        Ok(TransactionReport {
            successful,
            incomplete,
            success_rate: successful as f64 / total as f64,
            throughput_per_hour: successful as f64 * (3600.0 / simulation_duration.as_secs_f64()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loratx_core::TransactionHeader;
    use loratx_radio::LinkHeader;

    const HOUR: Duration = Duration::from_secs(3600);

    fn frame(device: DeviceId, transaction: TransactionId, packet: u16) -> Vec<u8> {
        let link = LinkHeader {
            dev_addr: device,
            fcnt: 0,
            port: 1,
        };
        let mut payload = Vec::new();
        TransactionHeader::new(device, transaction, packet).encode(&mut payload);
        link.wrap(&payload)
    }

    fn success(device: DeviceId, transaction: TransactionId, packet: u16) -> DeliveryOutcome {
        DeliveryOutcome::Success {
            receiver: 0,
            frame: frame(device, transaction, packet),
        }
    }

    fn loss(device: DeviceId, transaction: TransactionId, packet: u16) -> DeliveryOutcome {
        DeliveryOutcome::Loss {
            cause: LossCause::Interference,
            receiver: 0,
            frame: frame(device, transaction, packet),
        }
    }

    fn deliver_full(tracker: &mut TransactionTracker, device: DeviceId, txn: TransactionId, ppt: u16) {
        for pkt in 0..ppt + 2 {
            tracker.observe(&success(device, txn, pkt));
        }
    }

    #[test]
    fn full_transaction_counts_as_successful() {
        let mut tracker = TransactionTracker::new(5);
        deliver_full(&mut tracker, 1, 0, 5);

        let report = tracker.finalize(HOUR).unwrap();
        assert_eq!(report.successful, 1);
        assert_eq!(report.incomplete, 0);
        assert_eq!(report.success_rate, 1.0);
    }

    #[test]
    fn one_missing_packet_is_not_successful() {
        let mut tracker = TransactionTracker::new(5);
        // Transaction 0 misses packet 3; transaction 1 completes, so txn 0
        // is below the device's highest successful id and counts as
        // incomplete.
        for pkt in [0u16, 1, 2, 4, 5, 6] {
            tracker.observe(&success(1, 0, pkt));
        }
        tracker.observe(&loss(1, 0, 3));
        deliver_full(&mut tracker, 1, 1, 5);

        let report = tracker.finalize(HOUR).unwrap();
        assert_eq!(report.successful, 1);
        assert_eq!(report.incomplete, 1);
        assert_eq!(report.success_rate, 0.5);
    }

    #[test]
    fn tail_transaction_is_excluded_from_incomplete() {
        let mut tracker = TransactionTracker::new(5);
        deliver_full(&mut tracker, 1, 0, 5);
        // Transaction 1 is the device's last and still partial.
        tracker.observe(&success(1, 1, 0));
        tracker.observe(&loss(1, 1, 1));

        let report = tracker.finalize(HOUR).unwrap();
        assert_eq!(report.successful, 1);
        assert_eq!(report.incomplete, 0);
    }

    #[test]
    fn interior_partial_transactions_still_count_as_incomplete() {
        let mut tracker = TransactionTracker::new(5);
        // Transaction 0 fails mid-run, 1 completes, 2 is the in-flight tail.
        tracker.observe(&success(1, 0, 0));
        tracker.observe(&loss(1, 0, 1));
        deliver_full(&mut tracker, 1, 1, 5);
        tracker.observe(&success(1, 2, 0));

        let report = tracker.finalize(HOUR).unwrap();
        assert_eq!(report.successful, 1);
        assert_eq!(report.incomplete, 1);
    }

    #[test]
    fn duplicate_success_observations_do_not_double_count() {
        let mut tracker = TransactionTracker::new(5);
        deliver_full(&mut tracker, 1, 0, 5);
        // A second gateway reports the same packets again.
        deliver_full(&mut tracker, 1, 0, 5);

        let report = tracker.finalize(HOUR).unwrap();
        assert_eq!(report.successful, 1);
        assert_eq!(tracker.counters().received, 14);
    }

    #[test]
    fn multi_transaction_run_statistics() {
        // packets_per_transaction = 5: transactions 0 and 1 fully delivered,
        // transaction 2 gets 3 of 7 packets before the run ends.
        let mut tracker = TransactionTracker::new(5);
        deliver_full(&mut tracker, 1, 0, 5);
        deliver_full(&mut tracker, 1, 1, 5);
        for pkt in 0..3 {
            tracker.observe(&success(1, 2, pkt));
        }
        for pkt in 3..7 {
            tracker.observe(&loss(1, 2, pkt));
        }

        let report = tracker.finalize(2 * HOUR).unwrap();
        assert_eq!(report.successful, 2);
        assert_eq!(report.incomplete, 0);
        assert_eq!(report.success_rate, 1.0);
        assert_eq!(report.throughput_per_hour, 1.0);
    }

    #[test]
    fn truncated_loss_frames_are_not_attributed() {
        let mut tracker = TransactionTracker::new(5);
        deliver_full(&mut tracker, 1, 0, 5);

        let full = frame(1, 1, 0);
        tracker.observe(&DeliveryOutcome::Loss {
            cause: LossCause::UnderSensitivity,
            receiver: 0,
            frame: full[..6].to_vec(),
        });

        let report = tracker.finalize(HOUR).unwrap();
        // The truncated frame tallies as a loss but names no transaction.
        assert_eq!(tracker.counters().lost_under_sensitivity, 1);
        assert_eq!(report.successful, 1);
        assert_eq!(report.incomplete, 0);
    }

    #[test]
    fn losses_tally_per_cause() {
        let mut tracker = TransactionTracker::new(5);
        deliver_full(&mut tracker, 1, 0, 5);
        tracker.observe(&DeliveryOutcome::Loss {
            cause: LossCause::ReceiverBusy,
            receiver: 0,
            frame: frame(1, 1, 0),
        });
        tracker.observe(&DeliveryOutcome::Loss {
            cause: LossCause::NoMoreReceivers,
            receiver: 1,
            frame: frame(1, 1, 1),
        });

        assert_eq!(tracker.counters().lost_receiver_busy, 1);
        assert_eq!(tracker.counters().lost_no_more_receivers, 1);
        assert_eq!(tracker.counters().total_lost(), 2);
    }

    #[test]
    fn zero_packets_per_transaction_fails_fast() {
        let mut tracker = TransactionTracker::new(0);
        tracker.observe(&success(1, 0, 0));
        assert!(matches!(
            tracker.finalize(HOUR),
            Err(CollectorError::ZeroPacketsPerTransaction)
        ));
    }

    #[test]
    fn empty_run_has_no_defined_success_rate() {
        let mut tracker = TransactionTracker::new(5);
        assert!(matches!(
            tracker.finalize(HOUR),
            Err(CollectorError::NoObservations)
        ));
    }

    #[test]
    fn finalize_is_one_shot_and_later_events_are_ignored() {
        let mut tracker = TransactionTracker::new(5);
        deliver_full(&mut tracker, 1, 0, 5);
        tracker.finalize(HOUR).unwrap();

        tracker.observe(&success(1, 1, 0));
        assert_eq!(tracker.counters().received, 7);
        assert!(matches!(
            tracker.finalize(HOUR),
            Err(CollectorError::AlreadyFinalized)
        ));
    }
}
