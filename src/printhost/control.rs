use std::path::Path;
use std::time::Duration;

use chrono::Utc;

use super::Driver;
use crate::{
    Control as ControlTrait, DeviceCapabilities, DeviceState, DeviceStatus, Error, JobSpec,
    TemperatureReadings,
};

/// How long a status query or a lifecycle command may take.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Base upload allowance; one more second is added per megabyte.
const UPLOAD_TIMEOUT_BASE: Duration = Duration::from_secs(30);

impl Driver {
    fn map_err(&self, op: &'static str, err: anyhow::Error) -> Error {
        if ::printhost::is_transport_error(&err) {
            Error::unreachable(&self.config.endpoint, op, err)
        } else {
            Error::protocol(&self.config.endpoint, op, err)
        }
    }

    fn timed_out(&self, op: &'static str) -> Error {
        Error::unreachable(
            &self.config.endpoint,
            op,
            std::io::Error::new(std::io::ErrorKind::TimedOut, "request timed out"),
        )
    }
}

impl ControlTrait for Driver {
    type Error = Error;

    fn capabilities(&self) -> &DeviceCapabilities {
        &self.config.capabilities
    }

    // Stateless http: there is nothing to open or release.
    async fn connect(&mut self) -> Result<(), Error> {
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        Ok(())
    }

    async fn status(&mut self) -> Result<DeviceStatus, Error> {
        let client = self.client()?;
        let report = tokio::time::timeout(COMMAND_TIMEOUT, client.status())
            .await
            .map_err(|_| self.timed_out("status"))?
            .map_err(|err| self.map_err("status", err))?;

        let state = match report.state.state.as_str() {
            "idle" => DeviceState::Idle,
            "printing" => DeviceState::Printing,
            "paused" => DeviceState::Paused,
            other => {
                tracing::warn!(
                    endpoint = self.config.endpoint,
                    state = other,
                    message = report.state.state_message,
                    "unexpected host state"
                );
                DeviceState::Idle
            }
        };

        let active = report.job.is_active && !report.job.filename.is_empty();
        Ok(DeviceStatus {
            online: true,
            busy: matches!(state, DeviceState::Printing | DeviceState::Paused),
            state,
            active_job: active.then(|| report.job.filename.clone()),
            progress: active.then_some(report.job.progress),
            temperatures: Some(TemperatureReadings {
                nozzle: Some(report.temperatures.extruder),
                bed: Some(report.temperatures.bed),
            }),
            refreshed_at: Utc::now(),
        })
    }

    async fn upload_file(&mut self, path: &Path) -> Result<String, Error> {
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    Error::NotFound(path.to_path_buf())
                } else {
                    Error::protocol(&self.config.endpoint, "upload", err)
                }
            })?
            .len();
        let deadline = UPLOAD_TIMEOUT_BASE + Duration::from_secs(size / (1024 * 1024));

        let client = self.client()?;
        let response = tokio::time::timeout(deadline, client.upload_file(path))
            .await
            .map_err(|_| self.timed_out("upload"))?
            .map_err(|err| self.map_err("upload", err))?;

        Ok(response.item.path)
    }

    // Temperature overrides are not part of this protocol; the host's
    // own job settings apply.
    async fn start_job(&mut self, job: &JobSpec) -> Result<(), Error> {
        let client = self.client()?;
        tokio::time::timeout(COMMAND_TIMEOUT, client.start(&job.remote_name))
            .await
            .map_err(|_| self.timed_out("start"))?
            .map_err(|err| self.map_err("start", err))
    }

    async fn pause(&mut self) -> Result<(), Error> {
        let client = self.client()?;
        tokio::time::timeout(COMMAND_TIMEOUT, client.pause())
            .await
            .map_err(|_| self.timed_out("pause"))?
            .map_err(|err| self.map_err("pause", err))
    }

    async fn resume(&mut self) -> Result<(), Error> {
        let client = self.client()?;
        tokio::time::timeout(COMMAND_TIMEOUT, client.resume())
            .await
            .map_err(|_| self.timed_out("resume"))?
            .map_err(|err| self.map_err("resume", err))
    }

    async fn cancel(&mut self) -> Result<(), Error> {
        let client = self.client()?;
        tokio::time::timeout(COMMAND_TIMEOUT, client.cancel())
            .await
            .map_err(|_| self.timed_out("cancel"))?
            .map_err(|err| self.map_err("cancel", err))
    }
}
