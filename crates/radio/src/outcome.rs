//! Delivery outcome classification.
//!
//! The physical layer reports the fate of every transmitted frame as one
//! success event or one of four mutually exclusive loss causes. The causes
//! are carried as a typed sum rather than separate callback registrations,
//! so the collector ingests a single event stream.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a frame failed to be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LossCause {
    /// A colliding transmission corrupted the frame.
    Interference,
    /// The frame arrived below the receiver's sensitivity floor.
    UnderSensitivity,
    /// All reception paths were occupied.
    NoMoreReceivers,
    /// The receiver was transmitting when the frame arrived.
    ReceiverBusy,
}

impl LossCause {
    pub const ALL: [LossCause; 4] = [
        LossCause::Interference,
        LossCause::UnderSensitivity,
        LossCause::NoMoreReceivers,
        LossCause::ReceiverBusy,
    ];

    /// Stable position for per-cause counters.
    pub fn index(self) -> usize {
        match self {
            LossCause::Interference => 0,
            LossCause::UnderSensitivity => 1,
            LossCause::NoMoreReceivers => 2,
            LossCause::ReceiverBusy => 3,
        }
    }
}

impl fmt::Display for LossCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LossCause::Interference => "interference",
            LossCause::UnderSensitivity => "under sensitivity",
            LossCause::NoMoreReceivers => "no more receivers",
            LossCause::ReceiverBusy => "receiver busy",
        };
        f.write_str(name)
    }
}

/// The fate of one transmitted frame, as reported to the collector.
///
/// `frame` holds the raw bytes the reporting receiver saw; loss events may
/// carry only a truncated prefix.
#[derive(Debug, Clone)]
pub enum DeliveryOutcome {
    Success {
        /// Index of the receiver that picked the frame up.
        receiver: usize,
        frame: Vec<u8>,
    },
    Loss {
        cause: LossCause,
        /// Index of the receiver reporting the loss.
        receiver: usize,
        frame: Vec<u8>,
    },
}

impl DeliveryOutcome {
    pub fn frame(&self) -> &[u8] {
        match self {
            DeliveryOutcome::Success { frame, .. } => frame,
            DeliveryOutcome::Loss { frame, .. } => frame,
        }
    }

    pub fn receiver(&self) -> usize {
        match self {
            DeliveryOutcome::Success { receiver, .. } => *receiver,
            DeliveryOutcome::Loss { receiver, .. } => *receiver,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Success { .. })
    }
}
