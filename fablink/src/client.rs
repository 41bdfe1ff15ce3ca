//! A FabLink session over one TCP connection.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::{
    error::FabLinkError,
    frame::{read_frame, write_frame},
    message::{ControlMessage, DeviceMessage, StatusReport},
    transfer::{Transfer, CHUNK_SIZE},
};

/// Deadline for single request/response exchanges.
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(5);

/// The handshake gets one retry before we give up. The protocol does not
/// define a retry budget, so this stays bounded rather than looping.
const HANDSHAKE_ATTEMPTS: u32 = 2;

/// An authenticated FabLink session.
///
/// `connect` performs the authentication handshake; everything else
/// assumes it completed. The session owns the socket and is not shareable;
/// one device, one session, one job.
#[derive(Debug)]
pub struct Client {
    stream: TcpStream,
    peer: String,
}

impl Client {
    /// Dial `addr`, then run the authentication handshake with the given
    /// shared token. `deadline` bounds the dial and each handshake
    /// exchange.
    pub async fn connect(addr: &str, token: &str, deadline: Duration) -> Result<Self, FabLinkError> {
        let stream = timeout(deadline, TcpStream::connect(addr))
            .await
            .map_err(|_| FabLinkError::Timeout("connect"))??;

        let mut client = Self {
            stream,
            peer: addr.to_owned(),
        };

        let mut last_reason = String::new();
        for attempt in 1..=HANDSHAKE_ATTEMPTS {
            client
                .send(&ControlMessage::Auth {
                    token: token.to_owned(),
                })
                .await?;

            match client.recv(deadline, "auth response").await? {
                DeviceMessage::AuthOk => {
                    tracing::debug!(peer = client.peer, attempt, "handshake complete");
                    return Ok(client);
                }
                DeviceMessage::AuthRejected { reason } => {
                    tracing::warn!(peer = client.peer, attempt, reason, "handshake rejected");
                    last_reason = reason;
                }
                other => {
                    tracing::warn!(peer = client.peer, attempt, response = ?other, "malformed handshake response");
                    last_reason = format!("unexpected handshake response: {:?}", other);
                }
            }
        }

        Err(FabLinkError::AuthRejected(last_reason))
    }

    async fn send(&mut self, msg: &ControlMessage) -> Result<(), FabLinkError> {
        let payload =
            serde_json::to_vec(msg).map_err(|err| FabLinkError::Protocol(err.to_string()))?;
        write_frame(&mut self.stream, &payload).await
    }

    async fn recv(&mut self, deadline: Duration, what: &'static str) -> Result<DeviceMessage, FabLinkError> {
        let payload = timeout(deadline, read_frame(&mut self.stream))
            .await
            .map_err(|_| FabLinkError::Timeout(what))??;
        serde_json::from_slice(&payload)
            .map_err(|err| FabLinkError::Protocol(format!("unparseable {}: {}", what, err)))
    }

    /// Ask the device for a full status report.
    pub async fn status(&mut self) -> Result<StatusReport, FabLinkError> {
        self.send(&ControlMessage::StatusQuery).await?;
        match self.recv(EXCHANGE_TIMEOUT, "status report").await? {
            DeviceMessage::Status(report) => Ok(report),
            other => Err(FabLinkError::Protocol(format!(
                "expected status report, got {:?}",
                other
            ))),
        }
    }

    /// Transfer a file to the device in chunk frames, validating the
    /// device's cumulative acks. Returns the total byte count the device
    /// confirmed.
    ///
    /// Any failure inside the transfer bracket, a dropped socket
    /// included, is a protocol error carrying the byte count reached: a
    /// partial transfer must never look like a slow success.
    pub async fn upload(
        &mut self,
        name: &str,
        payload: &[u8],
        deadline: Duration,
    ) -> Result<u64, FabLinkError> {
        let size = payload.len() as u64;
        let mut transfer = Transfer::new(size);

        self.send(&ControlMessage::TransferBegin {
            name: name.to_owned(),
            size,
        })
        .await?;
        match self.recv(EXCHANGE_TIMEOUT, "transfer ready").await? {
            DeviceMessage::TransferReady => {}
            other => {
                return Err(FabLinkError::Protocol(format!(
                    "expected transfer ready, got {:?}",
                    other
                )))
            }
        }

        tracing::debug!(peer = self.peer, name, size, "transfer bracket open");

        match timeout(deadline, self.send_chunks(payload, &mut transfer)).await {
            Ok(Ok(total)) => Ok(total),
            Ok(Err(err)) if err.is_transport() => {
                // The bracket was open; a dead socket here is a truncated
                // transfer, not a routing-level "device offline".
                Err(transfer.fail(format!("transfer interrupted: {}", err)))
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(transfer.fail("transfer deadline exceeded".to_owned())),
        }
    }

    async fn send_chunks(
        &mut self,
        payload: &[u8],
        transfer: &mut Transfer,
    ) -> Result<u64, FabLinkError> {
        for chunk in payload.chunks(CHUNK_SIZE) {
            write_frame(&mut self.stream, chunk).await?;
            let sent = transfer.record_chunk(chunk.len());

            match self.recv(EXCHANGE_TIMEOUT, "chunk ack").await? {
                DeviceMessage::ChunkAck { received } => transfer.check_ack(received)?,
                other => {
                    return Err(transfer.fail(format!(
                        "expected ack for {} bytes, got {:?}",
                        sent, other
                    )))
                }
            }
        }

        match self.recv(EXCHANGE_TIMEOUT, "transfer done").await? {
            DeviceMessage::TransferDone { total } => transfer.finish(total),
            other => Err(transfer.fail(format!("expected transfer done, got {:?}", other))),
        }
    }

    /// Start a job from a transferred file in the given mode.
    pub async fn start(
        &mut self,
        name: &str,
        mode: &str,
        nozzle_temp: Option<u32>,
        bed_temp: Option<u32>,
    ) -> Result<(), FabLinkError> {
        self.command(ControlMessage::Start {
            name: name.to_owned(),
            mode: mode.to_owned(),
            nozzle_temp,
            bed_temp,
        })
        .await
    }

    /// Pause the running job.
    pub async fn pause(&mut self) -> Result<(), FabLinkError> {
        self.command(ControlMessage::Pause).await
    }

    /// Resume a paused job.
    pub async fn resume(&mut self) -> Result<(), FabLinkError> {
        self.command(ControlMessage::Resume).await
    }

    /// Stop the running job.
    pub async fn stop(&mut self) -> Result<(), FabLinkError> {
        self.command(ControlMessage::Stop).await
    }

    async fn command(&mut self, msg: ControlMessage) -> Result<(), FabLinkError> {
        self.send(&msg).await?;
        match self.recv(EXCHANGE_TIMEOUT, "command reply").await? {
            DeviceMessage::Ok => Ok(()),
            DeviceMessage::Error { message } => Err(FabLinkError::Protocol(message)),
            other => Err(FabLinkError::Protocol(format!(
                "expected ok, got {:?}",
                other
            ))),
        }
    }

    /// Say goodbye and release the connection. Errors are ignored; the
    /// session is gone either way.
    pub async fn close(mut self) {
        let _ = self.send(&ControlMessage::Bye).await;
    }
}
