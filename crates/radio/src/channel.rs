//! Simulated lossy radio channel.

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::outcome::{DeliveryOutcome, LossCause};
use crate::{RadioConfig, RadioError};

/// Classifies every transmitted frame into a [`DeliveryOutcome`] by drawing
/// from the per-cause loss probabilities in [`RadioConfig`].
///
/// Seeded explicitly so simulation runs are reproducible.
pub struct SimulatedChannel {
    config: RadioConfig,
    rng: StdRng,
    stats: ChannelStats,
}

#[derive(Debug, Default)]
struct ChannelStats {
    frames_sent: u64,
    frames_delivered: u64,
    frames_lost: u64,
}

impl SimulatedChannel {
    pub fn new(config: RadioConfig, seed: u64) -> Self {
        SimulatedChannel {
            config,
            rng: StdRng::seed_from_u64(seed),
            stats: ChannelStats::default(),
        }
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// Transmit one frame and report its fate.
    pub fn transmit(&mut self, frame: &[u8]) -> Result<DeliveryOutcome, RadioError> {
        if frame.len() > self.config.mtu {
            return Err(RadioError::FrameTooLarge(frame.len()));
        }

        self.stats.frames_sent += 1;
        let receiver = if self.config.receivers > 1 {
            self.rng.random_range(0..self.config.receivers)
        } else {
            0
        };

        let roll: f64 = self.rng.random();
        if let Some(cause) = self.classify_loss(roll) {
            self.stats.frames_lost += 1;
            let reported = self.reported_loss_frame(frame);
            debug!(
                "frame of {} B lost ({}), receiver {} reported {} B",
                frame.len(),
                cause,
                receiver,
                reported.len()
            );
            return Ok(DeliveryOutcome::Loss {
                cause,
                receiver,
                frame: reported,
            });
        }

        self.stats.frames_delivered += 1;
        trace!("frame of {} B delivered to receiver {}", frame.len(), receiver);
        Ok(DeliveryOutcome::Success {
            receiver,
            frame: frame.to_vec(),
        })
    }

    /// `(sent, delivered, lost)` frame counts so far.
    pub fn stats(&self) -> (u64, u64, u64) {
        (
            self.stats.frames_sent,
            self.stats.frames_delivered,
            self.stats.frames_lost,
        )
    }

    fn classify_loss(&self, roll: f64) -> Option<LossCause> {
        let c = &self.config;
        let mut threshold = c.interference_loss;
        if roll < threshold {
            return Some(LossCause::Interference);
        }
        threshold += c.sensitivity_loss;
        if roll < threshold {
            return Some(LossCause::UnderSensitivity);
        }
        threshold += c.no_receiver_loss;
        if roll < threshold {
            return Some(LossCause::NoMoreReceivers);
        }
        threshold += c.busy_loss;
        if roll < threshold {
            return Some(LossCause::ReceiverBusy);
        }
        None
    }

    /// Loss events sometimes report only the bytes captured before the
    /// reception broke off.
    fn reported_loss_frame(&mut self, frame: &[u8]) -> Vec<u8> {
        if self.rng.random::<f64>() < self.config.lost_frame_truncation {
            let keep = self.rng.random_range(0..frame.len().max(1));
            frame[..keep].to_vec()
        } else {
            frame.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforces_the_mtu() {
        let config = RadioConfig {
            mtu: 100,
            ..RadioConfig::default()
        };
        let mut channel = SimulatedChannel::new(config, 1);

        let result = channel.transmit(&vec![0u8; 200]);
        assert!(matches!(result, Err(RadioError::FrameTooLarge(200))));

        let result = channel.transmit(&vec![0u8; 50]);
        assert!(result.is_ok());
    }

    #[test]
    fn lossless_config_delivers_everything() {
        let config = RadioConfig {
            interference_loss: 0.0,
            sensitivity_loss: 0.0,
            no_receiver_loss: 0.0,
            busy_loss: 0.0,
            ..RadioConfig::default()
        };
        let mut channel = SimulatedChannel::new(config, 7);

        for _ in 0..100 {
            let outcome = channel.transmit(&[0u8; 20]).unwrap();
            assert!(outcome.is_success());
        }
        assert_eq!(channel.stats(), (100, 100, 0));
    }

    #[test]
    fn certain_loss_never_delivers() {
        let config = RadioConfig {
            interference_loss: 1.0,
            sensitivity_loss: 0.0,
            no_receiver_loss: 0.0,
            busy_loss: 0.0,
            lost_frame_truncation: 0.0,
            ..RadioConfig::default()
        };
        let mut channel = SimulatedChannel::new(config, 7);

        for _ in 0..50 {
            let outcome = channel.transmit(&[0u8; 20]).unwrap();
            match outcome {
                DeliveryOutcome::Loss { cause, frame, .. } => {
                    assert_eq!(cause, LossCause::Interference);
                    assert_eq!(frame.len(), 20);
                }
                DeliveryOutcome::Success { .. } => panic!("delivered on a p=1 loss channel"),
            }
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let config = RadioConfig {
            interference_loss: 0.3,
            ..RadioConfig::default()
        };
        let mut a = SimulatedChannel::new(config.clone(), 42);
        let mut b = SimulatedChannel::new(config, 42);

        for _ in 0..200 {
            let oa = a.transmit(&[0u8; 30]).unwrap();
            let ob = b.transmit(&[0u8; 30]).unwrap();
            assert_eq!(oa.is_success(), ob.is_success());
        }
    }

    #[test]
    fn loss_rate_tracks_the_configured_probability() {
        let config = RadioConfig {
            interference_loss: 0.2,
            sensitivity_loss: 0.1,
            no_receiver_loss: 0.0,
            busy_loss: 0.0,
            ..RadioConfig::default()
        };
        let mut channel = SimulatedChannel::new(config, 99);

        for _ in 0..10_000 {
            channel.transmit(&[0u8; 20]).unwrap();
        }
        let (sent, _, lost) = channel.stats();
        let rate = lost as f64 / sent as f64;
        assert!((rate - 0.3).abs() < 0.03, "observed loss rate {rate}");
    }
}
