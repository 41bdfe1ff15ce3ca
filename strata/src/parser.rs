//! The report-topic message parser.

use crate::message::{Message, Report};

pub(crate) fn parse_message(event: &rumqttc::Event) -> Message {
    match event {
        rumqttc::Event::Incoming(rumqttc::Packet::Publish(publish)) => {
            let payload = publish.payload.clone();

            if let Ok(payload) = std::str::from_utf8(&payload) {
                match serde_json::from_str::<Report>(payload) {
                    Ok(report) => {
                        return Message::Report(report);
                    }
                    Err(err) => {
                        tracing::error!(error = ?err, "error parsing report");
                        if let Ok(value) = serde_json::from_str::<serde_json::Value>(payload) {
                            return Message::Json(value);
                        }
                    }
                }
                return Message::Unknown(Some(payload.to_string()));
            }

            Message::Unknown(None)
        }
        _ => Message::Unknown(None),
    }
}
