//! Messages arriving on a printer's report topic.

use serde::{Deserialize, Serialize};

/// A parsed message from the report topic.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A well-formed report.
    Report(Report),
    /// Valid json we do not have a shape for.
    Json(serde_json::Value),
    /// Anything else, with the raw payload when it was utf-8.
    Unknown(Option<String>),
}

/// The reports a printer pushes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "report")]
pub enum Report {
    /// Periodic full-state push.
    Status(PushStatus),
}

/// Full state of the printer as of one push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushStatus {
    /// Coarse printer state.
    pub state: PrinterState,
    /// Fractional job progress, `0.0..=1.0`, when a job is loaded.
    #[serde(default)]
    pub progress: Option<f64>,
    /// Identifier of the running job, when one is running.
    #[serde(default)]
    pub job_id: Option<String>,
    /// Nozzle temperature, °C.
    #[serde(default)]
    pub nozzle_temp: Option<f64>,
    /// Bed temperature, °C.
    #[serde(default)]
    pub bed_temp: Option<f64>,
}

/// Coarse state reported by the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrinterState {
    /// Powered up, no job running.
    Idle,
    /// A job is running.
    Running,
    /// A job is paused.
    Paused,
    /// The last job failed; needs operator attention.
    Failed,
}
