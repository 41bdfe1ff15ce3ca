//! The error taxonomy crossing the orchestration boundary.
//!
//! Input errors are rejected immediately and never retried. Transport
//! errors degrade a device to offline inside the status cache and only
//! surface as [Error::DeviceUnreachable] from direct lifecycle commands.
//! Protocol errors are never downgraded: a partially transferred file
//! must not be reported as a started job.

use std::path::PathBuf;

use thiserror::Error as ThisError;

/// Any failure this crate reports upstream. No raw protocol stack traces
/// cross this boundary; every variant carries a human-readable message,
/// with a suggested remediation where one is knowable.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The model file does not exist.
    #[error("model file not found: {0}")]
    NotFound(PathBuf),

    /// The mesh could not be parsed, or has degenerate bounds.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The model does not fit any configured device.
    #[error(
        "model too large for all configured devices: max dimension is \
         {max_dimension:.1}mm, largest envelope is {largest_envelope:.0}mm; \
         scale the model down or split it"
    )]
    ModelTooLarge {
        /// Largest extent of the model, millimeters.
        max_dimension: f64,
        /// Largest envelope extent across the fleet, millimeters.
        largest_envelope: f64,
    },

    /// The device id is not configured.
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    /// The routed device already has an active job. There is no queue;
    /// wait for the job or cancel it first.
    #[error("device {device} is busy with another job; wait for it to finish or cancel it")]
    DeviceBusy {
        /// The busy device.
        device: String,
    },

    /// A transport-level failure while talking to a specific device.
    #[error(
        "device {device} unreachable during {op}: {source}; check that it is \
         powered on and reachable at its configured address"
    )]
    DeviceUnreachable {
        /// The device that failed to answer.
        device: String,
        /// The operation being attempted.
        op: &'static str,
        /// Underlying transport failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The device broke its wire protocol.
    #[error("protocol error from {device} during {op}: {reason}")]
    Protocol {
        /// The misbehaving device.
        device: String,
        /// The operation being attempted.
        op: &'static str,
        /// What went wrong on the wire.
        reason: String,
    },
}

impl Error {
    pub(crate) fn unreachable(
        device: &str,
        op: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::DeviceUnreachable {
            device: device.to_owned(),
            op,
            source: source.into(),
        }
    }

    pub(crate) fn protocol(device: &str, op: &'static str, reason: impl ToString) -> Self {
        Error::Protocol {
            device: device.to_owned(),
            op,
            reason: reason.to_string(),
        }
    }
}
