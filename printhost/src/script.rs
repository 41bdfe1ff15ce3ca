use anyhow::Result;

use super::Client;

/// Command token that pauses the active job.
pub const PAUSE_COMMAND: &str = "PAUSE";

/// Command token that resumes a paused job.
pub const RESUME_COMMAND: &str = "RESUME";

/// Command token that cancels the active job.
pub const CANCEL_COMMAND: &str = "CANCEL";

impl Client {
    /// Start working on a previously uploaded file.
    pub async fn start(&self, file_name: &str) -> Result<()> {
        let client = reqwest::Client::new();
        client
            .post(format!("{}/machine/job/start", self.url_base))
            .form(&[("filename", file_name)])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Send a raw command token to the host's generic script endpoint.
    /// Lifecycle control is expressed this way; see [PAUSE_COMMAND],
    /// [RESUME_COMMAND] and [CANCEL_COMMAND].
    pub async fn run_script(&self, script: &str) -> Result<()> {
        tracing::debug!(base = self.url_base, script, "running script");
        let client = reqwest::Client::new();
        client
            .post(format!("{}/machine/script", self.url_base))
            .form(&[("script", script)])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Pause the active job.
    pub async fn pause(&self) -> Result<()> {
        self.run_script(PAUSE_COMMAND).await
    }

    /// Resume a paused job.
    pub async fn resume(&self) -> Result<()> {
        self.run_script(RESUME_COMMAND).await
    }

    /// Cancel the active job.
    pub async fn cancel(&self) -> Result<()> {
        self.run_script(CANCEL_COMMAND).await
    }
}
