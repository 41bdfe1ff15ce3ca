use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::Client;

/// Coarse machine state as reported by the host.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct HostState {
    /// One of `idle`, `printing`, `paused` or `error`.
    pub state: String,

    /// Free-form explanation from the host, empty when healthy.
    pub state_message: String,
}

/// Progress of the job currently loaded on the host, if any.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct JobProgress {
    /// File being worked on. Empty string when nothing is loaded.
    pub filename: String,

    /// Fractional progress, `0.0..=1.0`.
    pub progress: f64,

    /// Whether the job is actively running.
    pub is_active: bool,
}

/// Current temperature readings from the host.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Temperatures {
    /// Extruder temperature in °C.
    pub extruder: f64,

    /// Build plate temperature in °C.
    pub bed: f64,
}

/// Full named-object status report for one query call.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct StatusReport {
    /// Coarse machine state.
    pub state: HostState,

    /// Active job progress.
    pub job: JobProgress,

    /// Temperature readings.
    pub temperatures: Temperatures,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
struct QueryResponseWrapper {
    result: StatusReport,
}

impl Client {
    /// Query the host for its current state, job progress, and
    /// temperatures in a single call.
    pub async fn status(&self) -> Result<StatusReport> {
        tracing::debug!(base = self.url_base, "requesting status");
        let client = reqwest::Client::new();

        let resp: QueryResponseWrapper = client
            .get(format!(
                "{}/machine/query?state&job&temperatures",
                self.url_base
            ))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_query_response_decodes() {
        let raw = r#"{
            "result": {
                "state": { "state": "printing", "state_message": "" },
                "job": { "filename": "bracket.stl", "progress": 0.42, "is_active": true },
                "temperatures": { "extruder": 210.4, "bed": 60.1 }
            }
        }"#;

        let wrapper: QueryResponseWrapper = serde_json::from_str(raw).unwrap();
        let status = wrapper.result;
        assert_eq!(status.state.state, "printing");
        assert_eq!(status.job.filename, "bracket.stl");
        assert!(status.job.is_active);
        assert_eq!(status.temperatures.bed, 60.1);
    }
}
