//! The commands that can be published to a printer's command topic.

use serde::{Deserialize, Serialize};

use crate::sequence_id::SequenceId;

/// The commands that can be published to a printer's command topic.
///
/// Each command carries a [SequenceId]; none of them is acknowledged
/// synchronously. The effect of a command is observed on the report
/// stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "command")]
pub enum Command {
    /// Start a job from a previously transferred file.
    Start(Start),
    /// Pause the current job.
    Pause(Pause),
    /// Resume a paused job.
    Resume(Resume),
    /// Stop the current job.
    Stop(Stop),
}

impl Command {
    /// Get the sequence id of this command.
    pub fn sequence_id(&self) -> &SequenceId {
        match self {
            Command::Start(Start { sequence_id, .. }) => sequence_id,
            Command::Pause(Pause { sequence_id }) => sequence_id,
            Command::Resume(Resume { sequence_id }) => sequence_id,
            Command::Stop(Stop { sequence_id }) => sequence_id,
        }
    }

    /// Return a command to start a job from a transferred file.
    pub fn start(file: &str, job_id: &str, nozzle_temp: Option<u32>, bed_temp: Option<u32>) -> Self {
        Command::Start(Start {
            sequence_id: SequenceId::new(),
            file: file.to_owned(),
            job_id: job_id.to_owned(),
            nozzle_temp,
            bed_temp,
        })
    }

    /// Return a command to pause the current job.
    pub fn pause() -> Self {
        Command::Pause(Pause {
            sequence_id: SequenceId::new(),
        })
    }

    /// Return a command to resume a paused job.
    pub fn resume() -> Self {
        Command::Resume(Resume {
            sequence_id: SequenceId::new(),
        })
    }

    /// Return a command to stop the current job.
    pub fn stop() -> Self {
        Command::Stop(Stop {
            sequence_id: SequenceId::new(),
        })
    }
}

/// Start a job from a file previously moved over the bulk channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Start {
    /// The sequence id.
    pub sequence_id: SequenceId,
    /// Name of the file on the printer.
    pub file: String,
    /// Caller-assigned job identifier, echoed back on reports.
    pub job_id: String,
    /// Optional nozzle temperature override, °C.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nozzle_temp: Option<u32>,
    /// Optional bed temperature override, °C.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed_temp: Option<u32>,
}

/// Pause the current job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pause {
    /// The sequence id.
    pub sequence_id: SequenceId,
}

/// Resume a paused job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resume {
    /// The sequence id.
    pub sequence_id: SequenceId,
}

/// Stop the current job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stop {
    /// The sequence id.
    pub sequence_id: SequenceId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_start_serializes_with_command_tag() {
        let cmd = Command::start("bracket.stl", "job-1", Some(215), None);
        let json: serde_json::Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["command"], "start");
        assert_eq!(json["file"], "bracket.stl");
        assert_eq!(json["job_id"], "job-1");
        assert_eq!(json["nozzle_temp"], 215);
        assert!(json["sequence_id"].is_u64());
        assert!(json.get("bed_temp").is_none());
    }

    #[test]
    fn test_pause_round_trips() {
        let cmd = Command::pause();
        let json = serde_json::to_string(&cmd).unwrap();
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }
}
