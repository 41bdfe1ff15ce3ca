//! Session tests against an in-process fake device.

use std::time::Duration;

use fablink::frame::{read_frame, write_frame};
use fablink::message::{ControlMessage, DeviceMessage, StatusReport, MODE_MILL};
use fablink::{Client, FabLinkError};
use tokio::net::{TcpListener, TcpStream};

const DEADLINE: Duration = Duration::from_secs(2);
const TOKEN: &str = "fab-token";

/// How the fake device should misbehave, if at all.
#[derive(Clone, Copy, PartialEq)]
enum Behavior {
    Normal,
    RejectAuth,
    /// Send a bogus cumulative count on the second chunk ack.
    MiscountAck,
    /// Drop the connection after the first chunk ack.
    HangUpMidTransfer,
}

/// What the fake device observed during the session.
#[derive(Debug, Default)]
struct DeviceLog {
    auth_attempts: u32,
    received_files: Vec<(String, u64)>,
    started: Vec<(String, String)>,
}

async fn spawn_device(behavior: Behavior) -> (String, tokio::task::JoinHandle<DeviceLog>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        serve(stream, behavior).await
    });

    (addr, handle)
}

async fn serve(mut stream: TcpStream, behavior: Behavior) -> DeviceLog {
    let mut log = DeviceLog::default();
    let mut authed = false;

    loop {
        let payload = match read_frame(&mut stream).await {
            Ok(payload) => payload,
            Err(_) => return log,
        };
        let msg: ControlMessage = match serde_json::from_slice(&payload) {
            Ok(msg) => msg,
            Err(_) => continue,
        };

        match msg {
            ControlMessage::Auth { token } => {
                log.auth_attempts += 1;
                let reply = if behavior == Behavior::RejectAuth || token != TOKEN {
                    DeviceMessage::AuthRejected {
                        reason: "bad token".into(),
                    }
                } else {
                    authed = true;
                    DeviceMessage::AuthOk
                };
                reply_to(&mut stream, &reply).await;
            }
            ControlMessage::StatusQuery => {
                assert!(authed);
                reply_to(
                    &mut stream,
                    &DeviceMessage::Status(StatusReport {
                        state: "idle".into(),
                        job: None,
                        progress: None,
                        nozzle_temp: Some(24.0),
                        bed_temp: Some(23.5),
                    }),
                )
                .await;
            }
            ControlMessage::TransferBegin { name, size } => {
                assert!(authed);
                reply_to(&mut stream, &DeviceMessage::TransferReady).await;

                let mut received = 0u64;
                let mut chunk_index = 0u32;
                while received < size {
                    let chunk = read_frame(&mut stream).await.unwrap();
                    received += chunk.len() as u64;
                    chunk_index += 1;

                    match behavior {
                        Behavior::MiscountAck if chunk_index == 2 => {
                            reply_to(
                                &mut stream,
                                &DeviceMessage::ChunkAck {
                                    received: received + 17,
                                },
                            )
                            .await;
                            return log;
                        }
                        Behavior::HangUpMidTransfer if chunk_index == 1 => {
                            reply_to(&mut stream, &DeviceMessage::ChunkAck { received }).await;
                            return log;
                        }
                        _ => reply_to(&mut stream, &DeviceMessage::ChunkAck { received }).await,
                    }
                }

                reply_to(&mut stream, &DeviceMessage::TransferDone { total: received }).await;
                log.received_files.push((name, received));
            }
            ControlMessage::Start { name, mode, .. } => {
                assert!(authed);
                log.started.push((name, mode));
                reply_to(&mut stream, &DeviceMessage::Ok).await;
            }
            ControlMessage::Pause | ControlMessage::Resume | ControlMessage::Stop => {
                assert!(authed);
                reply_to(&mut stream, &DeviceMessage::Ok).await;
            }
            ControlMessage::Bye => return log,
        }
    }
}

async fn reply_to(stream: &mut TcpStream, msg: &DeviceMessage) {
    let payload = serde_json::to_vec(msg).unwrap();
    write_frame(stream, &payload).await.unwrap();
}

#[tokio::test]
async fn test_handshake_and_status() {
    let (addr, device) = spawn_device(Behavior::Normal).await;

    let mut client = Client::connect(&addr, TOKEN, DEADLINE).await.unwrap();
    let status = client.status().await.unwrap();
    assert_eq!(status.state, "idle");
    client.close().await;

    let log = device.await.unwrap();
    assert_eq!(log.auth_attempts, 1);
}

#[tokio::test]
async fn test_rejected_handshake_retries_once_then_fails() {
    let (addr, device) = spawn_device(Behavior::RejectAuth).await;

    let err = Client::connect(&addr, TOKEN, DEADLINE).await.unwrap_err();
    assert!(matches!(err, FabLinkError::AuthRejected(_)));

    let log = device.await.unwrap();
    assert_eq!(log.auth_attempts, 2);
}

#[tokio::test]
async fn test_upload_round_trip() {
    let (addr, device) = spawn_device(Behavior::Normal).await;

    // Three chunks: two full, one partial.
    let payload = vec![0xA5u8; 150_000];
    let mut client = Client::connect(&addr, TOKEN, DEADLINE).await.unwrap();
    let total = client.upload("plate.stl", &payload, DEADLINE).await.unwrap();
    assert_eq!(total, 150_000);
    client.close().await;

    let log = device.await.unwrap();
    assert_eq!(log.received_files, vec![("plate.stl".to_string(), 150_000)]);
}

#[tokio::test]
async fn test_miscounted_ack_is_protocol_error() {
    let (addr, _device) = spawn_device(Behavior::MiscountAck).await;

    let payload = vec![0u8; 150_000];
    let mut client = Client::connect(&addr, TOKEN, DEADLINE).await.unwrap();
    let err = client.upload("plate.stl", &payload, DEADLINE).await.unwrap_err();
    assert!(matches!(err, FabLinkError::Protocol(_)));
}

#[tokio::test]
async fn test_hangup_mid_transfer_is_protocol_error_not_transport() {
    let (addr, device) = spawn_device(Behavior::HangUpMidTransfer).await;

    let payload = vec![0u8; 150_000];
    let mut client = Client::connect(&addr, TOKEN, DEADLINE).await.unwrap();
    let err = client.upload("plate.stl", &payload, DEADLINE).await.unwrap_err();

    // A truncated transfer surfaces as a protocol violation with the byte
    // count context, never as a transport blip.
    assert!(matches!(err, FabLinkError::Protocol(_)));
    assert!(err.to_string().contains("interrupted"));

    let log = device.await.unwrap();
    assert!(log.received_files.is_empty());
}

#[tokio::test]
async fn test_start_carries_mode_token() {
    let (addr, device) = spawn_device(Behavior::Normal).await;

    let mut client = Client::connect(&addr, TOKEN, DEADLINE).await.unwrap();
    client.start("plate.stl", MODE_MILL, None, None).await.unwrap();
    client.close().await;

    let log = device.await.unwrap();
    assert_eq!(log.started, vec![("plate.stl".to_string(), "mill".to_string())]);
}
