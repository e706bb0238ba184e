//! Flat-file CSV output for run statistics.
//!
//! Each simulation run appends exactly one data row; the header row is
//! written only when the target file is new or empty, so repeated runs
//! against the same path accumulate comparable rows under a single header.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use log::info;

use crate::packets::PacketReport;
use crate::tracker::TransactionReport;
use crate::CollectorError;

/// Fixed column suffix for transaction-mode rows.
pub const TRANSACTION_COLUMNS: &str =
    "SuccessfulTransactions,IncompleteTransactions,SuccessRate,Throughput";

/// Fixed column suffix for single-packet-mode rows.
pub const PACKET_COLUMNS: &str =
    "SuccessfulTransmissions,UnsuccessfulTransmissions,SuccessRate,Throughput";

/// Appends statistics rows to a CSV file.
///
/// `static_def` and `static_data` are caller-supplied prefixes (ending in a
/// comma when non-empty) describing the scenario parameters, prepended to
/// the header and data rows respectively.
#[derive(Debug, Clone)]
pub struct CsvAppender {
    path: PathBuf,
    static_def: String,
    static_data: String,
}

impl CsvAppender {
    pub fn new(
        path: impl Into<PathBuf>,
        static_def: impl Into<String>,
        static_data: impl Into<String>,
    ) -> Self {
        CsvAppender {
            path: path.into(),
            static_def: static_def.into(),
            static_data: static_data.into(),
        }
    }

    pub fn append_transactions(&self, report: &TransactionReport) -> Result<(), CollectorError> {
        self.append_row(
            TRANSACTION_COLUMNS,
            &format!(
                "{},{},{},{}",
                report.successful, report.incomplete, report.success_rate, report.throughput_per_hour
            ),
        )
    }

    pub fn append_packets(&self, report: &PacketReport) -> Result<(), CollectorError> {
        self.append_row(
            PACKET_COLUMNS,
            &format!(
                "{},{},{},{}",
                report.successful,
                report.unsuccessful,
                report.success_rate,
                report.throughput_per_hour
            ),
        )
    }

    fn append_row(&self, columns: &str, values: &str) -> Result<(), CollectorError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if file.metadata()?.len() == 0 {
            writeln!(file, "{}{}", self.static_def, columns)?;
        }
        writeln!(file, "{}{}", self.static_data, values)?;

        info!("appended statistics row to {}", self.path.display());
        Ok(())
    }
}
