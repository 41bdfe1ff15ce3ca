//! This module contains support for driving multi-mode fabricators over
//! the framed binary protocol.

mod control;

use serde::{Deserialize, Serialize};

use crate::{DeviceCapabilities, JobMode};

/// Configuration information for one fabricator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// IP address or hostname of the device.
    pub host: String,

    /// TCP port the device listens on.
    pub port: u16,

    /// Shared authentication token.
    pub token: String,

    /// Declared capabilities of this device.
    pub capabilities: DeviceCapabilities,
}

impl Config {
    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Driver for one fabricator.
pub struct Driver {
    config: Config,
    session: Option<::fablink::Client>,
}

impl Driver {
    /// A driver for the configured device. Does not connect.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session: None,
        }
    }
}

/// The protocol-level token for a job mode.
fn mode_token(mode: JobMode) -> &'static str {
    match mode {
        JobMode::AdditivePrint => ::fablink::message::MODE_ADDITIVE,
        JobMode::SubtractiveMill => ::fablink::message::MODE_MILL,
        JobMode::LaserEtch => ::fablink::message::MODE_LASER,
    }
}
