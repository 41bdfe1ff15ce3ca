//! This module contains support for driving Strata printers over their
//! broker protocol.

mod control;

use serde::{Deserialize, Serialize};

use crate::DeviceCapabilities;

/// Configuration information for one Strata printer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// IP address or hostname of the printer's broker.
    pub host: String,

    /// Shared access code printed on the device.
    pub access_code: String,

    /// The printer's serial number; names its broker topics.
    pub serial: String,

    /// Declared capabilities of this printer.
    pub capabilities: DeviceCapabilities,
}

/// A live broker session: the client plus the background task pumping
/// its report subscription.
struct Session {
    client: ::strata::client::Client,
    pump: tokio::task::JoinHandle<()>,
}

/// Driver for one Strata printer.
pub struct Driver {
    config: Config,
    session: Option<Session>,
}

impl Driver {
    /// A driver for the configured printer. Does not connect.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session: None,
        }
    }
}
