//! Link layer for LoRaTx: link framing, delivery outcomes and a simulated
//! lossy channel.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod channel;
pub mod framing;
pub mod outcome;

pub use channel::SimulatedChannel;
pub use framing::{LinkHeader, MIN_ATTRIBUTABLE_LEN};
pub use outcome::{DeliveryOutcome, LossCause};

#[derive(Debug, Error)]
pub enum RadioError {
    #[error("frame of {0} bytes exceeds the radio MTU")]
    FrameTooLarge(usize),
}

/// Channel model parameters.
///
/// Each transmission is classified into exactly one outcome: delivered to
/// one of the `receivers`, or lost to one of the four causes, drawn with the
/// configured probabilities. The probabilities must sum to at most 1; the
/// remainder is the success probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioConfig {
    /// Largest frame the link accepts.
    pub mtu: usize,
    /// Number of receivers (gateways) in range of every device.
    pub receivers: usize,
    /// Probability of loss due to a colliding transmission.
    pub interference_loss: f64,
    /// Probability of loss due to reception under the sensitivity floor.
    pub sensitivity_loss: f64,
    /// Probability of loss because no reception path was free.
    pub no_receiver_loss: f64,
    /// Probability of loss because the receiver was itself transmitting.
    pub busy_loss: f64,
    /// Probability that a loss event reports only a truncated prefix of the
    /// frame bytes.
    pub lost_frame_truncation: f64,
}

impl Default for RadioConfig {
    fn default() -> Self {
        RadioConfig {
            mtu: 255,
            receivers: 1,
            interference_loss: 0.05,
            sensitivity_loss: 0.03,
            no_receiver_loss: 0.01,
            busy_loss: 0.01,
            lost_frame_truncation: 0.25,
        }
    }
}
