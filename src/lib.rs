#![allow(refining_impl_trait)]
#![deny(missing_docs)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

//! This crate implements the device-orchestration core for a small
//! heterogeneous fabrication fleet: it analyzes raw mesh geometry,
//! selects a target device from live availability, transfers the model
//! over the device's native protocol, and drives the job lifecycle.
//!
//! Three device classes, three wire protocols, one [Control] surface:
//! Strata printers speak publish/subscribe through a broker, PrintHost
//! machines speak stateless json over http, and FabLink fabricators
//! speak a length-prefixed binary protocol over raw tcp.

mod any_machine;
mod config;
mod error;
pub mod fablink;
mod geometry;
pub mod noop;
mod orchestrator;
pub mod printhost;
mod registry;
mod selector;
mod status;
pub mod strata;
mod traits;

pub use any_machine::AnyDriver;
pub use config::{Config, DeviceConfig};
pub use error::Error;
pub use geometry::{analyze, scale, ModelDimensions};
pub use orchestrator::{JobRequest, Orchestrator, QueuedJob};
pub use registry::Registry;
pub use selector::{select_device, DeviceSnapshot, SelectionResult};
pub use status::{StatusCache, STATUS_TTL};
pub use traits::{
    Control, DeviceCapabilities, DeviceClass, DeviceState, DeviceStatus, JobMode, JobSpec,
    TemperatureReadings,
};

use serde::{Deserialize, Serialize};

/// Set of three values to represent the extent of a 3-D volume. This
/// contains the width, depth, and height values, generally used to
/// represent some maximum or minimum.
///
/// All measurements are in millimeters.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    /// Width of the volume ("left and right"), in millimeters.
    pub width: f64,

    /// Depth of the volume ("front to back"), in millimeters.
    pub depth: f64,

    /// Height of the volume ("up and down"), in millimeters.
    pub height: f64,
}

impl Volume {
    /// The largest single extent of this volume.
    pub fn max_extent(&self) -> f64 {
        self.width.max(self.depth).max(self.height)
    }
}
