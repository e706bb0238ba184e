//! Collector side of LoRaTx: turns the stream of per-frame delivery
//! outcomes into transaction-level completion statistics and appends them to
//! a flat CSV file.

use thiserror::Error;

use loratx_core::TransactionHeader;
use loratx_radio::{LinkHeader, MIN_ATTRIBUTABLE_LEN};

pub mod outcome_log;
pub mod packets;
pub mod report;
pub mod tracker;

pub use outcome_log::OutcomeLog;
pub use packets::{PacketReport, PacketTracker};
pub use report::{CsvAppender, PACKET_COLUMNS, TRANSACTION_COLUMNS};
pub use tracker::{ReceptionCounters, TransactionReport, TransactionTracker};

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("packets per transaction must be nonzero")]
    ZeroPacketsPerTransaction,

    #[error("simulation duration must be positive")]
    ZeroDuration,

    #[error("no transactions observed, success rate is undefined")]
    NoObservations,

    #[error("statistics already finalized")]
    AlreadyFinalized,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Recover the application header from a reported frame.
///
/// Loss events may carry truncated frames; anything shorter than the full
/// link + application header stack cannot be attributed and yields `None`.
pub(crate) fn attribute_frame(frame: &[u8]) -> Option<TransactionHeader> {
    if frame.len() < MIN_ATTRIBUTABLE_LEN {
        return None;
    }
    let mut buf = frame;
    LinkHeader::decode(&mut buf)?;
    TransactionHeader::decode(&mut buf)
}
