//! Simulation tools for LoRaTx.

pub mod scenarios;
pub mod scheduler;

use std::time::Duration;

use loratx_core::GeneratorConfig;
use loratx_radio::RadioConfig;

pub use scenarios::{run, ScenarioConfig, SimulationOutcome};

pub struct SimulationPresets;

impl SimulationPresets {
    fn base(radio: RadioConfig, seed: u64) -> ScenarioConfig {
        let mut generator = GeneratorConfig::default();
        // Denser cadence than the 2 h field default so a short run still
        // yields a useful number of transactions per device.
        generator.set_inter_transaction_delay(Duration::from_secs(30 * 60));
        generator.set_intra_transaction_delay(Duration::from_secs(10));

        ScenarioConfig {
            devices: 30,
            duration: Duration::from_secs(6 * 3600),
            seed,
            radio,
            generator,
            stop_devices_at: None,
        }
    }

    /// Few devices in range of the gateway, hardly any collisions.
    pub fn good_conditions() -> ScenarioConfig {
        Self::base(
            RadioConfig {
                interference_loss: 0.02,
                sensitivity_loss: 0.01,
                no_receiver_loss: 0.005,
                busy_loss: 0.005,
                ..RadioConfig::default()
            },
            1,
        )
    }

    /// The default channel model.
    pub fn average_conditions() -> ScenarioConfig {
        Self::base(RadioConfig::default(), 2)
    }

    /// Devices at the edge of the coverage area.
    pub fn poor_coverage() -> ScenarioConfig {
        Self::base(
            RadioConfig {
                interference_loss: 0.10,
                sensitivity_loss: 0.15,
                no_receiver_loss: 0.03,
                busy_loss: 0.02,
                ..RadioConfig::default()
            },
            3,
        )
    }

    /// A congested cell: collisions and busy receivers dominate.
    pub fn congested_cell() -> ScenarioConfig {
        Self::base(
            RadioConfig {
                interference_loss: 0.25,
                sensitivity_loss: 0.05,
                no_receiver_loss: 0.10,
                busy_loss: 0.10,
                ..RadioConfig::default()
            },
            4,
        )
    }
}
