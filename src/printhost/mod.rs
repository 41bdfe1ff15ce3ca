//! This module contains support for driving print hosts over their
//! stateless http api.

mod control;

use serde::{Deserialize, Serialize};

use crate::DeviceCapabilities;

/// Configuration information for one print host.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// HTTP base URL of the host, e.g. `http://10.0.0.21:7125`.
    pub endpoint: String,

    /// Declared capabilities of this host.
    pub capabilities: DeviceCapabilities,
}

/// Driver for one print host. The protocol is stateless, so the driver
/// carries no session; every operation stands alone.
pub struct Driver {
    config: Config,
}

impl Driver {
    /// A driver for the configured host.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// A client for the configured endpoint.
    fn client(&self) -> Result<::printhost::Client, crate::Error> {
        ::printhost::Client::new(&self.config.endpoint)
            .map_err(|err| crate::Error::protocol(&self.config.endpoint, "client", err))
    }
}
