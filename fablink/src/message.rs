//! Control messages. Each is carried as the json payload of one frame.

use serde::{Deserialize, Serialize};

/// Wire token for additive jobs.
pub const MODE_ADDITIVE: &str = "additive";
/// Wire token for subtractive (mill) jobs.
pub const MODE_MILL: &str = "mill";
/// Wire token for laser-etch jobs.
pub const MODE_LASER: &str = "laser";

/// Messages sent from this client to the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ControlMessage {
    /// Authentication handshake. Must be the first message on a
    /// connection; nothing else is accepted before it succeeds.
    Auth {
        /// Shared device token.
        token: String,
    },
    /// Ask for a full status report.
    StatusQuery,
    /// Open a file transfer bracket. The next frames are raw chunk
    /// frames until `size` bytes have been delivered.
    TransferBegin {
        /// Name the device should store the file under.
        name: String,
        /// Total size in bytes.
        size: u64,
    },
    /// Start a job from a transferred file.
    Start {
        /// File name previously transferred.
        name: String,
        /// One of [MODE_ADDITIVE], [MODE_MILL], [MODE_LASER]. This is the
        /// only device class that runs more than one mode, so mode rides
        /// on the start message.
        mode: String,
        /// Optional nozzle/tool temperature override, °C.
        #[serde(skip_serializing_if = "Option::is_none")]
        nozzle_temp: Option<u32>,
        /// Optional bed temperature override, °C.
        #[serde(skip_serializing_if = "Option::is_none")]
        bed_temp: Option<u32>,
    },
    /// Pause the running job.
    Pause,
    /// Resume a paused job.
    Resume,
    /// Stop the running job.
    Stop,
    /// Orderly goodbye before closing the socket.
    Bye,
}

/// Messages sent from the device to this client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum DeviceMessage {
    /// Handshake accepted.
    AuthOk,
    /// Handshake refused.
    AuthRejected {
        /// Device-supplied reason.
        reason: String,
    },
    /// Answer to a status query.
    Status(StatusReport),
    /// Device is ready to receive chunk frames.
    TransferReady,
    /// Ack for one chunk frame, carrying the cumulative byte count the
    /// device has received so far.
    ChunkAck {
        /// Cumulative bytes received.
        received: u64,
    },
    /// Transfer bracket closed; `total` is the final byte count.
    TransferDone {
        /// Total bytes the device stored.
        total: u64,
    },
    /// Generic success reply to a lifecycle command.
    Ok,
    /// Generic failure reply.
    Error {
        /// Device-supplied message.
        message: String,
    },
}

/// Full status of the device as of one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// One of `idle`, `running`, `paused`.
    pub state: String,
    /// Name of the active job's file, when one is active.
    #[serde(default)]
    pub job: Option<String>,
    /// Fractional progress, `0.0..=1.0`.
    #[serde(default)]
    pub progress: Option<f64>,
    /// Tool temperature, °C. Only meaningful in additive mode.
    #[serde(default)]
    pub nozzle_temp: Option<f64>,
    /// Bed temperature, °C. Only meaningful in additive mode.
    #[serde(default)]
    pub bed_temp: Option<f64>,
}
