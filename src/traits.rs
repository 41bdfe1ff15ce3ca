//! Common traits and types used throughout this crate to drive physical
//! fabrication hardware.

use std::path::Path;

use chrono::{DateTime, Utc};
use parse_display::{Display, FromStr};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ModelDimensions, Volume};

/// The kind of fabrication a device performs for one job.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, FromStr)]
#[serde(rename_all = "kebab-case")]
#[display(style = "kebab-case")]
pub enum JobMode {
    /// Deposit material layer by layer.
    AdditivePrint,
    /// Cut material away with a rotating tool.
    SubtractiveMill,
    /// Engrave with a laser.
    LaserEtch,
}

/// The three physical device classes, one per wire protocol, plus a
/// no-op class for tests.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Display, FromStr)]
#[serde(rename_all = "snake_case")]
#[display(style = "snake_case")]
pub enum DeviceClass {
    /// Publish/subscribe printer behind a broker.
    Strata,
    /// Stateless http print host.
    PrintHost,
    /// Multi-mode fabricator on the binary tcp protocol.
    FabLink,
    /// Does nothing, successfully.
    Noop,
}

/// What a device can do. Loaded from configuration at startup, immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// Which device class this is.
    pub class: DeviceClass,

    /// Job modes the device supports.
    pub modes: Vec<JobMode>,

    /// Maximum build volume along each axis.
    pub envelope: Volume,

    /// Quality/speed tier; higher is finer. Used only for tie-breaking
    /// between devices that both fit a model.
    pub quality_tier: u8,
}

impl DeviceCapabilities {
    /// Whether this device runs jobs of the given mode.
    pub fn supports(&self, mode: JobMode) -> bool {
        self.modes.contains(&mode)
    }

    /// Whether a model fits inside this device's envelope, axis by axis.
    pub fn fits(&self, dims: &ModelDimensions) -> bool {
        dims.width <= self.envelope.width
            && dims.depth <= self.envelope.depth
            && dims.height <= self.envelope.height
    }
}

/// Coarse device state used for routing decisions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Display, FromStr)]
#[serde(rename_all = "snake_case")]
#[display(style = "snake_case")]
pub enum DeviceState {
    /// Online and ready for a job.
    Idle,
    /// Running a job.
    Printing,
    /// Job paused.
    Paused,
    /// Not reachable, or never heard from.
    Offline,
}

/// Temperature readings from a device, where the protocol reports them.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReadings {
    /// Nozzle or tool temperature, °C.
    pub nozzle: Option<f64>,
    /// Build plate temperature, °C.
    pub bed: Option<f64>,
}

/// Live status of a device as of `refreshed_at`.
///
/// A record older than the cache TTL is stale and must be re-fetched
/// before it backs a routing decision that touches physical hardware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Whether the device answered (or pushed) recently.
    pub online: bool,

    /// Whether the device has an active job.
    pub busy: bool,

    /// Coarse state.
    pub state: DeviceState,

    /// Identifier of the active job, when the protocol reports one.
    pub active_job: Option<String>,

    /// Fractional progress of the active job, `0.0..=1.0`.
    pub progress: Option<f64>,

    /// Temperature readings, when the protocol reports them.
    pub temperatures: Option<TemperatureReadings>,

    /// When this record was last successfully refreshed.
    pub refreshed_at: DateTime<Utc>,
}

impl DeviceStatus {
    /// A status for a device we could not reach, stamped now.
    pub fn offline() -> Self {
        Self {
            online: false,
            busy: false,
            state: DeviceState::Offline,
            active_job: None,
            progress: None,
            temperatures: None,
            refreshed_at: Utc::now(),
        }
    }

    /// A bare status in the given state, stamped now.
    pub fn with_state(state: DeviceState) -> Self {
        Self {
            online: state != DeviceState::Offline,
            busy: matches!(state, DeviceState::Printing | DeviceState::Paused),
            state,
            active_job: None,
            progress: None,
            temperatures: None,
            refreshed_at: Utc::now(),
        }
    }
}

/// Everything a driver needs to run one job. Built by the orchestrator
/// at dispatch time, handed to the chosen driver once, then discarded;
/// the device owns progress tracking from there.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    /// Caller-visible job identifier.
    pub job_id: Uuid,

    /// The local model file this job was built from.
    pub file: std::path::PathBuf,

    /// Name of the file as the device knows it after upload.
    pub remote_name: String,

    /// What kind of fabrication to run.
    pub mode: JobMode,

    /// Optional nozzle/tool temperature override, °C.
    pub nozzle_temp: Option<u32>,

    /// Optional bed temperature override, °C.
    pub bed_temp: Option<u32>,
}

/// A `Control` drives one physical fabrication device over its native
/// wire protocol.
///
/// Every protocol holds some stateful session (a subscription, an open
/// socket, an authenticated channel), so callers must pair [`connect`]
/// with a [`disconnect`] on every exit path, error paths included.
///
/// [`connect`]: Control::connect
/// [`disconnect`]: Control::disconnect
pub trait Control {
    /// Error type returned by this trait.
    type Error: std::error::Error;

    /// The device's immutable capabilities.
    fn capabilities(&self) -> &DeviceCapabilities;

    /// Open the protocol session.
    fn connect(&mut self) -> impl std::future::Future<Output = Result<(), Self::Error>>;

    /// Release the protocol session. Safe to call when not connected.
    fn disconnect(&mut self) -> impl std::future::Future<Output = Result<(), Self::Error>>;

    /// Current status of the device.
    fn status(&mut self) -> impl std::future::Future<Output = Result<DeviceStatus, Self::Error>>;

    /// Transfer a file to the device; returns the name the device stored
    /// it under.
    fn upload_file(
        &mut self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<String, Self::Error>>;

    /// Start a job from a previously uploaded file.
    fn start_job(
        &mut self,
        job: &JobSpec,
    ) -> impl std::future::Future<Output = Result<(), Self::Error>>;

    /// Pause the active job.
    fn pause(&mut self) -> impl std::future::Future<Output = Result<(), Self::Error>>;

    /// Resume a paused job.
    fn resume(&mut self) -> impl std::future::Future<Output = Result<(), Self::Error>>;

    /// Cancel the active job.
    fn cancel(&mut self) -> impl std::future::Future<Output = Result<(), Self::Error>>;
}
