//! The Strata broker client.

use std::{
    sync::{Arc, RwLock},
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result};
use tokio::sync::Mutex;

use crate::{
    command::Command,
    message::{Message, PushStatus, Report},
    parser::parse_message,
};

const BROKER_PORT: u16 = 8883;
const BROKER_USER: &str = "strata";
const MAX_PACKET_SIZE: usize = 1024 * 1024;
const TRANSFER_TIMEOUT_BASE_SECS: u64 = 30;

/// The Strata broker client.
///
/// One client per physical printer. Subscribes to the printer's report
/// topic and keeps the most recent state push; publishes commands to the
/// printer's command topic.
#[derive(Clone)]
pub struct Client {
    /// The IP address or hostname of the broker.
    pub host: String,
    /// The shared access code.
    pub access_code: String,
    /// The printer's serial number.
    pub serial: String,

    topic_command: String,
    topic_report: String,

    client: Arc<rumqttc::AsyncClient>,
    event_loop: Arc<Mutex<rumqttc::EventLoop>>,

    latest: Arc<RwLock<Option<(PushStatus, SystemTime)>>>,
}

impl Client {
    /// Creates a new client for one printer.
    pub fn new<S: Into<String> + Clone>(host: S, access_code: S, serial: S) -> Result<Self> {
        let host = host.into();
        let access_code = access_code.into();
        let serial = serial.into();

        let opts = Self::get_config(&host, &access_code)?;
        let (client, event_loop) = rumqttc::AsyncClient::new(opts, 25);

        Ok(Self {
            host,
            access_code,
            topic_command: format!("device/{}/command", &serial),
            topic_report: format!("device/{}/report", &serial),
            serial,
            client: Arc::new(client),
            event_loop: Arc::new(Mutex::new(event_loop)),
            latest: Arc::new(RwLock::new(None)),
        })
    }

    fn get_config(host: &str, access_code: &str) -> Result<rumqttc::MqttOptions> {
        let client_id = format!("strata-api-{}", nanoid::nanoid!(8));

        let ssl_config = rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(crate::no_auth::AcceptAnyCert::new()))
            .with_no_client_auth();

        let mut opts = rumqttc::MqttOptions::new(client_id, host, BROKER_PORT);
        opts.set_max_packet_size(MAX_PACKET_SIZE, MAX_PACKET_SIZE);
        opts.set_keep_alive(Duration::from_secs(5));
        opts.set_credentials(BROKER_USER, access_code);
        opts.set_transport(rumqttc::Transport::Tls(rumqttc::TlsConfiguration::Rustls(Arc::new(
            ssl_config,
        ))));

        Ok(opts)
    }

    /// Polls for one message from the event loop, recording state pushes.
    /// This also handles reconnects.
    async fn poll(&mut self) -> Result<()> {
        let mut ep = self.event_loop.lock().await;
        let event = match ep.poll().await {
            Ok(event) => event,
            Err(err) => {
                tracing::error!(serial = self.serial, error = ?err, "error polling for message");
                tracing::warn!(serial = self.serial, "reconnecting");
                let opts = Self::get_config(&self.host, &self.access_code)?;
                let (client, event_loop) = rumqttc::AsyncClient::new(opts, 25);
                drop(ep);
                self.client = Arc::new(client);
                self.event_loop = Arc::new(Mutex::new(event_loop));
                self.subscribe_to_report().await?;
                return Ok(());
            }
        };

        match parse_message(&event) {
            Message::Report(Report::Status(status)) => {
                *self.latest.write().expect("status lock poisoned") = Some((status, SystemTime::now()));
            }
            Message::Json(value) => {
                tracing::debug!(serial = self.serial, "unrecognized report shape: {}", value);
            }
            Message::Unknown(_) => {}
        }

        Ok(())
    }

    /// The most recent state push and its arrival time, if any push has
    /// arrived on this subscription.
    pub fn latest_status(&self) -> Option<(PushStatus, SystemTime)> {
        self.latest.read().expect("status lock poisoned").clone()
    }

    async fn subscribe_to_report(&self) -> Result<()> {
        self.client
            .subscribe(&self.topic_report, rumqttc::mqttbytes::QoS::AtMostOnce)
            .await?;

        Ok(())
    }

    /// Runs the subscription pump. You should run this in a tokio task;
    /// it holds the long-lived report subscription for the lifetime of
    /// the connection.
    pub async fn run(&mut self) -> Result<()> {
        self.subscribe_to_report().await?;

        loop {
            Self::poll(self).await?;
        }
    }

    /// Publishes a command to the printer's command topic. Fire and
    /// forget: the broker accepting the publish is the only confirmation,
    /// state changes are observed on the report stream.
    pub async fn publish(&self, command: Command) -> Result<()> {
        let payload = serde_json::to_string(&command)?;
        tracing::debug!(
            serial = self.serial,
            sequence_id = %command.sequence_id(),
            "publishing command"
        );

        self.client
            .publish(
                &self.topic_command,
                rumqttc::mqttbytes::QoS::AtMostOnce,
                false,
                payload,
            )
            .await?;

        Ok(())
    }

    /// Move a file onto the printer over the bulk FTPS channel. Returns
    /// the name under which the printer stored it. The transfer carries a
    /// deadline scaled to the file size; a hung channel fails instead of
    /// stalling the caller.
    pub async fn upload_file(&self, path: &std::path::Path) -> Result<String> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("bad file name: {}", path.display()))?
            .to_owned();
        let size = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("cannot stat {}", path.display()))?
            .len();

        let local = path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("bad file path: {}", path.display()))?;
        let args = transfer_args(
            &self.host,
            &self.access_code,
            local,
            transfer_deadline_secs(size),
        );
        let output = tokio::process::Command::new("curl")
            .args(&args)
            .output()
            .await
            .context("failed to run bulk transfer")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("bulk transfer failed for {}: {}", path.display(), stderr.trim());
        }

        Ok(file_name)
    }
}

/// Bulk transfer allowance in seconds: a base plus one second per
/// megabyte of payload.
fn transfer_deadline_secs(size: u64) -> u64 {
    TRANSFER_TIMEOUT_BASE_SECS + size / (1024 * 1024)
}

fn transfer_args(host: &str, access_code: &str, local_path: &str, deadline_secs: u64) -> Vec<String> {
    vec![
        "--silent".to_string(),
        "--show-error".to_string(),
        "--max-time".to_string(),
        deadline_secs.to_string(),
        "--upload-file".to_string(),
        local_path.to_string(),
        "--ftp-pasv".to_string(),
        "--insecure".to_string(),
        format!("ftps://{}/", host),
        "--user".to_string(),
        format!("{}:{}", BROKER_USER, access_code),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_transfer_deadline_scales_with_size() {
        assert_eq!(transfer_deadline_secs(0), 30);
        assert_eq!(transfer_deadline_secs(60 * 1024 * 1024), 90);
    }

    #[test]
    fn test_transfer_args_carry_deadline() {
        let args = transfer_args("10.0.0.5", "code", "/tmp/bracket.stl", 90);
        let at = args.iter().position(|a| a == "--max-time").unwrap();
        assert_eq!(args[at + 1], "90");
        assert!(args.contains(&"ftps://10.0.0.5/".to_string()));
    }
}
