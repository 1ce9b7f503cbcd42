use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::future::Future;
use std::path::Path;

use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::models::{AnalysisRequest, AnalyzeResponse, UploadResponse};

/// Multipart field the backend reads the dataset from.
pub const UPLOAD_FIELD: &str = "file";

/// A dataset file chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| DashboardError::Validation(format!("{} is not a file", path.display())))?;
        Ok(Self::new(name, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The analysis server. Each call is exactly one request; failures to reach
/// the server or decode its JSON come back as `DashboardError::Transport`.
pub trait Backend {
    fn upload(&self, file: &UploadFile) -> impl Future<Output = Result<UploadResponse>> + Send;

    fn analyze(&self, request: &AnalysisRequest) -> impl Future<Output = Result<AnalyzeResponse>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Fetches the spreadsheet of the latest analysis and writes it to `dest`.
    pub async fn download_excel(&self, dest: &Path) -> Result<u64> {
        let response = self
            .client
            .get(self.url("download-excel"))
            .send()
            .await
            .map_err(|e| DashboardError::Transport(format!("Failed to fetch spreadsheet: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                format!("Download failed with status {}", status)
            } else {
                body.trim().to_string()
            };
            return Err(DashboardError::Server(message));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DashboardError::Transport(format!("Failed to read spreadsheet bytes: {}", e)))?;
        tokio::fs::write(dest, &bytes).await?;
        tracing::info!("Saved {}KB spreadsheet to {}", bytes.len() / 1024, dest.display());
        Ok(bytes.len() as u64)
    }
}

impl Backend for HttpBackend {
    async fn upload(&self, file: &UploadFile) -> Result<UploadResponse> {
        let part = Part::bytes(file.bytes.to_vec()).file_name(file.name.clone());
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(self.url("upload"))
            .multipart(form)
            .send()
            .await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalyzeResponse> {
        let response = self
            .client
            .post(self.url("analyze"))
            .json(request)
            .send()
            .await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
