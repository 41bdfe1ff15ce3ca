use std::path::Path;

use ::strata::command::Command;
use ::strata::message::PrinterState;
use chrono::{DateTime, Utc};

use super::{Driver, Session};
use crate::{
    Control as ControlTrait, DeviceCapabilities, DeviceState, DeviceStatus, Error, JobSpec,
    TemperatureReadings,
};

impl Driver {
    /// Establish the broker session when none is live. The report pump
    /// runs until [disconnect] aborts it.
    ///
    /// [disconnect]: ControlTrait::disconnect
    async fn ensure_session(&mut self) -> Result<(), Error> {
        if self.session.is_some() {
            return Ok(());
        }

        let client = ::strata::client::Client::new(
            self.config.host.clone(),
            self.config.access_code.clone(),
            self.config.serial.clone(),
        )
        .map_err(|err| Error::unreachable(&self.config.serial, "connect", err))?;

        let mut pump_client = client.clone();
        let serial = self.config.serial.clone();
        let pump = tokio::spawn(async move {
            if let Err(err) = pump_client.run().await {
                tracing::warn!(serial, error = %err, "report pump stopped");
            }
        });

        self.session = Some(Session { client, pump });
        Ok(())
    }

    fn session(&self) -> Result<&Session, Error> {
        self.session
            .as_ref()
            .ok_or_else(|| Error::protocol(&self.config.serial, "session", "no live broker session"))
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
        if let Some(session) = self.session.take() {
            session.pump.abort();
        }
        Ok(())
    }

    async fn status(&mut self) -> Result<DeviceStatus, Error> {
        self.ensure_session().await?;
        let session = self.session()?;

        // Push-style protocol: report what the subscription has seen. A
        // session with no push yet is indistinguishable from a silent
        // printer, so it reads as offline until the first report lands.
        let Some((push, received_at)) = session.client.latest_status() else {
            return Ok(DeviceStatus::offline());
        };

        let state = match push.state {
            PrinterState::Idle => DeviceState::Idle,
            PrinterState::Running => DeviceState::Printing,
            PrinterState::Paused => DeviceState::Paused,
            // Needs operator attention, but it is reachable and not
            // running anything.
            PrinterState::Failed => DeviceState::Idle,
        };

        Ok(DeviceStatus {
            online: true,
            busy: matches!(state, DeviceState::Printing | DeviceState::Paused),
            state,
            active_job: push.job_id,
            progress: push.progress,
            temperatures: Some(TemperatureReadings {
                nozzle: push.nozzle_temp,
                bed: push.bed_temp,
            }),
            refreshed_at: DateTime::<Utc>::from(received_at),
        })
    }

    async fn upload_file(&mut self, path: &Path) -> Result<String, Error> {
        self.ensure_session().await?;
        let session = self.session()?;

        session
            .client
            .upload_file(path)
            .await
            .map_err(|err| Error::unreachable(&self.config.serial, "upload", err))
    }

    async fn start_job(&mut self, job: &JobSpec) -> Result<(), Error> {
        self.publish(
            Command::start(
                &job.remote_name,
                &job.job_id.to_string(),
                job.nozzle_temp,
                job.bed_temp,
            ),
            "start",
        )
        .await
    }

    async fn pause(&mut self) -> Result<(), Error> {
        self.publish(Command::pause(), "pause").await
    }

    async fn resume(&mut self) -> Result<(), Error> {
        self.publish(Command::resume(), "resume").await
    }

    async fn cancel(&mut self) -> Result<(), Error> {
        self.publish(Command::stop(), "cancel").await
    }
}

impl Driver {
    async fn publish(&mut self, command: Command, op: &'static str) -> Result<(), Error> {
        self.ensure_session().await?;
        let session = self.session()?;

        session
            .client
            .publish(command)
            .await
            .map_err(|err| Error::unreachable(&self.config.serial, op, err))
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.pump.abort();
        }
    }
}
