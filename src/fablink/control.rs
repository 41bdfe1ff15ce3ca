use std::path::Path;
use std::time::Duration;

use ::fablink::FabLinkError;
use chrono::Utc;

use super::{mode_token, Driver};
use crate::{
    Control as ControlTrait, DeviceCapabilities, DeviceState, DeviceStatus, Error, JobSpec,
    TemperatureReadings,
};

/// How long the connect handshake may take.
const CONNECT_DEADLINE: Duration = Duration::from_secs(5);

/// Base transfer allowance; one more second is added per megabyte.
const TRANSFER_DEADLINE_BASE: Duration = Duration::from_secs(30);

impl Driver {
    fn map_err(&mut self, op: &'static str, err: FabLinkError) -> Error {
        if err.is_transport() {
            // A dead socket poisons the whole session.
            self.session = None;
            Error::unreachable(&self.config.addr(), op, err)
        } else {
            Error::protocol(&self.config.addr(), op, err)
        }
    }

    async fn ensure_session(&mut self) -> Result<(), Error> {
        if self.session.is_some() {
            return Ok(());
        }
        let client =
            ::fablink::Client::connect(&self.config.addr(), &self.config.token, CONNECT_DEADLINE)
                .await
                .map_err(|err| {
                    if err.is_transport() {
                        Error::unreachable(&self.config.addr(), "connect", err)
                    } else {
                        Error::protocol(&self.config.addr(), "connect", err)
                    }
                })?;
        self.session = Some(client);
        Ok(())
    }

    fn session(&mut self) -> Result<&mut ::fablink::Client, Error> {
        self.session
            .as_mut()
            .ok_or_else(|| Error::protocol(&self.config.addr(), "session", "no live session"))
    }
}

impl ControlTrait for Driver {
    type Error = Error;

    fn capabilities(&self) -> &DeviceCapabilities {
        &self.config.capabilities
    }

    async fn connect(&mut self) -> Result<(), Error> {
        self.ensure_session().await
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        if let Some(client) = self.session.take() {
            client.close().await;
        }
        Ok(())
    }

    async fn status(&mut self) -> Result<DeviceStatus, Error> {
        self.ensure_session().await?;
        let queried = self.session()?.status().await;
        let report = match queried {
            Ok(report) => report,
            Err(err) => return Err(self.map_err("status", err)),
        };

        let state = match report.state.as_str() {
            "idle" => DeviceState::Idle,
            "running" => DeviceState::Printing,
            "paused" => DeviceState::Paused,
            other => {
                tracing::warn!(
                    addr = %self.config.addr(),
                    state = other,
                    "unexpected device state"
                );
                DeviceState::Idle
            }
        };

        let temperatures = (report.nozzle_temp.is_some() || report.bed_temp.is_some()).then_some(
            TemperatureReadings {
                nozzle: report.nozzle_temp,
                bed: report.bed_temp,
            },
        );

        Ok(DeviceStatus {
            online: true,
            busy: matches!(state, DeviceState::Printing | DeviceState::Paused),
            state,
            active_job: report.job,
            progress: report.progress,
            temperatures,
            refreshed_at: Utc::now(),
        })
    }

    async fn upload_file(&mut self, path: &Path) -> Result<String, Error> {
        let payload = tokio::fs::read(path).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(path.to_path_buf())
            } else {
                Error::protocol(&self.config.addr(), "upload", err)
            }
        })?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::protocol(&self.config.addr(), "upload", "bad file name"))?
            .to_owned();
        let deadline =
            TRANSFER_DEADLINE_BASE + Duration::from_secs(payload.len() as u64 / (1024 * 1024));

        self.ensure_session().await?;
        let transferred = self.session()?.upload(&name, &payload, deadline).await;
        if let Err(err) = transferred {
            return Err(self.map_err("upload", err));
        }
        Ok(name)
    }

    async fn start_job(&mut self, job: &JobSpec) -> Result<(), Error> {
        self.ensure_session().await?;
        let result = self
            .session()?
            .start(
                &job.remote_name,
                mode_token(job.mode),
                job.nozzle_temp,
                job.bed_temp,
            )
            .await;
        result.map_err(|err| self.map_err("start", err))
    }

    async fn pause(&mut self) -> Result<(), Error> {
        self.ensure_session().await?;
        let result = self.session()?.pause().await;
        result.map_err(|err| self.map_err("pause", err))
    }

    async fn resume(&mut self) -> Result<(), Error> {
        self.ensure_session().await?;
        let result = self.session()?.resume().await;
        result.map_err(|err| self.map_err("resume", err))
    }

    async fn cancel(&mut self) -> Result<(), Error> {
        self.ensure_session().await?;
        let result = self.session()?.stop().await;
        result.map_err(|err| self.map_err("cancel", err))
    }
}
