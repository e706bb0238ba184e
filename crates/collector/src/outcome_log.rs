//! Nested observation container shared by all outcome classes.

use std::collections::{HashMap, HashSet};

use loratx_core::{DeviceId, PacketId, TransactionId};

/// Per-device, per-transaction record of observed packet ids.
///
/// One instance exists per outcome class (delivered, lost), so the tracking
/// logic is written once. Insertion has set semantics: duplicate
/// observations of the same `(device, transaction, packet)` triple are
/// no-ops.
#[derive(Debug, Clone, Default)]
pub struct OutcomeLog {
    entries: HashMap<DeviceId, HashMap<TransactionId, HashSet<PacketId>>>,
}

impl OutcomeLog {
    pub fn new() -> Self {
        OutcomeLog::default()
    }

    /// Record one observation. Returns `false` if it was already present.
    pub fn record(
        &mut self,
        device: DeviceId,
        transaction: TransactionId,
        packet: PacketId,
    ) -> bool {
        self.entries
            .entry(device)
            .or_default()
            .entry(transaction)
            .or_default()
            .insert(packet)
    }

    pub fn devices(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.entries.keys().copied()
    }

    /// All transactions observed for `device`, with their packet-id sets.
    pub fn device_transactions(
        &self,
        device: DeviceId,
    ) -> Option<&HashMap<TransactionId, HashSet<PacketId>>> {
        self.entries.get(&device)
    }

    /// Number of distinct packet ids observed for one transaction.
    pub fn packet_count(&self, device: DeviceId, transaction: TransactionId) -> usize {
        self.entries
            .get(&device)
            .and_then(|txns| txns.get(&transaction))
            .map_or(0, HashSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_records_are_noops() {
        let mut log = OutcomeLog::new();
        assert!(log.record(1, 0, 5));
        assert!(!log.record(1, 0, 5));
        assert_eq!(log.packet_count(1, 0), 1);
    }

    #[test]
    fn devices_are_tracked_independently() {
        let mut log = OutcomeLog::new();
        log.record(1, 0, 0);
        log.record(2, 0, 0);
        log.record(2, 0, 1);
        assert_eq!(log.packet_count(1, 0), 1);
        assert_eq!(log.packet_count(2, 0), 2);
        assert_eq!(log.packet_count(3, 0), 0);
    }
}
