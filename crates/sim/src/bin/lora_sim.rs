//! Transactional traffic simulation for LoRaTx.

use anyhow::Result;
use colored::Colorize;
use loratx_collector::CsvAppender;
use loratx_sim::{run, ScenarioConfig, SimulationPresets};

fn main() -> Result<()> {
    env_logger::init();

    println!("{}", "LoRaTx Transaction Simulation".bright_blue().bold());
    println!("{}", "=============================".bright_blue());

    let scenarios = vec![
        ("Good Conditions", SimulationPresets::good_conditions()),
        ("Average Conditions", SimulationPresets::average_conditions()),
        ("Poor Coverage", SimulationPresets::poor_coverage()),
        ("Congested Cell", SimulationPresets::congested_cell()),
    ];

    for (name, config) in scenarios {
        println!("{}", format!("\n>>> Scenario: {}", name).bright_green().bold());
        println!("Devices: {}", config.devices);
        println!("Duration: {:?}", config.duration);
        println!(
            "Loss model: interference {:.1}%, sensitivity {:.1}%, no-receiver {:.1}%, busy {:.1}%",
            config.radio.interference_loss * 100.0,
            config.radio.sensitivity_loss * 100.0,
            config.radio.no_receiver_loss * 100.0,
            config.radio.busy_loss * 100.0,
        );
        println!();

        let outcome = run(&config)?;

        let (sent, delivered, lost) = outcome.channel_frames;
        println!("Frames: {} sent, {} delivered, {} lost", sent, delivered, lost);
        println!(
            "Losses: {} interference | {} under sensitivity | {} no receivers | {} busy",
            outcome.counters.lost_interference,
            outcome.counters.lost_under_sensitivity,
            outcome.counters.lost_no_more_receivers,
            outcome.counters.lost_receiver_busy,
        );
        println!(
            "{}",
            format!(
                "Transactions: {} successful, {} incomplete ({:.1}% success, {:.2}/h)",
                outcome.report.successful,
                outcome.report.incomplete,
                outcome.report.success_rate * 100.0,
                outcome.report.throughput_per_hour,
            )
            .bright_yellow()
        );

        csv_appender(name, &config).append_transactions(&outcome.report)?;
        println!("{}", "-".repeat(50));
    }

    println!("\n{}", "All scenarios complete!".bright_green().bold());
    println!("Statistics appended to lora_sim.csv");

    Ok(())
}

fn csv_appender(name: &str, config: &ScenarioConfig) -> CsvAppender {
    let static_def = "Scenario,NEndDevices,SimulationTime,\
                      InterTransactionDelay,IntraTransactionDelay,PacketsPerTransaction,";
    let static_data = format!(
        "{},{},{},{},{},{},",
        name,
        config.devices,
        config.duration.as_secs(),
        config.generator.inter_transaction_delay.as_secs(),
        config.generator.intra_transaction_delay.as_secs(),
        config.generator.packets_per_transaction,
    );
    CsvAppender::new("lora_sim.csv", static_def, static_data)
}
