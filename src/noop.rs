//! `noop` implements a no-op device, one that will accept control
//! commands and do exactly nothing with them. Useful as a stand-in in
//! tests and when wiring up a fleet before the hardware arrives.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Control, DeviceCapabilities, DeviceState, DeviceStatus, Error, JobSpec};

/// The configuration for a no-op device.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Declared capabilities of the pretend hardware.
    pub capabilities: DeviceCapabilities,
}

/// Noop device will no-op, well, everything.
pub struct Noop {
    capabilities: DeviceCapabilities,
    state: DeviceState,

    /// Ordered names of the operations invoked on this device.
    pub history: Vec<&'static str>,

    /// When set, `upload_file` fails as unreachable. Lets tests drive
    /// the mid-job error paths.
    pub fail_upload: bool,
}

impl Noop {
    /// Return a new no-op device.
    pub fn new(config: Config) -> Self {
        Self {
            capabilities: config.capabilities,
            state: DeviceState::Idle,
            history: Vec::new(),
            fail_upload: false,
        }
    }

    /// Force the reported state.
    pub fn set_state(&mut self, state: DeviceState) {
        self.state = state;
    }
}

impl Control for Noop {
    type Error = Error;

    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    async fn connect(&mut self) -> Result<(), Error> {
        self.history.push("connect");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.history.push("disconnect");
        Ok(())
    }

    async fn status(&mut self) -> Result<DeviceStatus, Error> {
        self.history.push("status");
        Ok(DeviceStatus::with_state(self.state))
    }

    async fn upload_file(&mut self, path: &Path) -> Result<String, Error> {
        self.history.push("upload");
        if self.fail_upload {
            return Err(Error::unreachable(
                "noop",
                "upload",
                std::io::Error::new(std::io::ErrorKind::ConnectionReset, "upload refused"),
            ));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model.stl".to_owned());
        Ok(name)
    }

    async fn start_job(&mut self, _job: &JobSpec) -> Result<(), Error> {
        self.history.push("start");
        self.state = DeviceState::Printing;
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), Error> {
        self.history.push("pause");
        self.state = DeviceState::Paused;
        Ok(())
    }

    async fn resume(&mut self) -> Result<(), Error> {
        self.history.push("resume");
        self.state = DeviceState::Printing;
        Ok(())
    }

    async fn cancel(&mut self) -> Result<(), Error> {
        self.history.push("cancel");
        self.state = DeviceState::Idle;
        Ok(())
    }
}
