use anyhow::Result;
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::Client;

/// File that has been uploaded to the host.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UploadResponseItem {
    /// Path of the file relative to the host's job directory.
    pub path: String,

    /// Root folder on the host. This client always uploads into `jobs`.
    pub root: String,
}

/// Response to an upload request.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UploadResponse {
    /// The file as the host now knows it.
    pub item: UploadResponseItem,
}

impl Client {
    /// Upload a file from disk to the host's job directory.
    pub async fn upload_file(&self, file_name: &Path) -> Result<UploadResponse> {
        let name = file_name
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("bad file name: {}", file_name.display()))?;
        self.upload(name, &tokio::fs::read(file_name).await?).await
    }

    /// Upload a byte payload under the given name.
    pub async fn upload(&self, file_name: &str, payload: &[u8]) -> Result<UploadResponse> {
        tracing::debug!(base = self.url_base, file = file_name, "uploading file");
        let part = multipart::Part::bytes(payload.to_owned())
            .file_name(file_name.to_owned())
            .mime_str("application/octet-stream")?;

        let client = reqwest::Client::new();

        Ok(client
            .post(format!("{}/machine/files/upload", self.url_base))
            .multipart(multipart::Form::new().text("root", "jobs").part("file", part))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_upload_response_decodes() {
        let raw = r#"{ "item": { "path": "bracket.stl", "root": "jobs" } }"#;
        let resp: UploadResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.item.path, "bracket.stl");
        assert_eq!(resp.item.root, "jobs");
    }
}
