//! In-memory backend for controller tests.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::Dashboard;
use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::models::{AnalysisRequest, AnalyzeResponse, UploadResponse};
use crate::services::{Backend, UploadFile};

/// Replays queued JSON replies in order and records every call.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    uploads: Mutex<VecDeque<Result<Value, String>>>,
    analyses: Mutex<VecDeque<Result<Value, String>>>,
    pub upload_calls: AtomicUsize,
    pub analyze_calls: AtomicUsize,
    pub last_request: Mutex<Option<AnalysisRequest>>,
    latency: Option<Duration>,
}

impl ScriptedBackend {
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn reply_upload(self, body: Value) -> Self {
        self.uploads.lock().push_back(Ok(body));
        self
    }

    pub fn fail_upload(self, reason: &str) -> Self {
        self.uploads.lock().push_back(Err(reason.to_string()));
        self
    }

    pub fn reply_analyze(self, body: Value) -> Self {
        self.analyses.lock().push_back(Ok(body));
        self
    }

    pub fn fail_analyze(self, reason: &str) -> Self {
        self.analyses.lock().push_back(Err(reason.to_string()));
        self
    }

    pub fn uploads(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn analyses(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(reply: Option<Result<Value, String>>) -> Result<T> {
    match reply {
        Some(Ok(body)) => Ok(serde_json::from_value(body)?),
        Some(Err(reason)) => Err(DashboardError::Transport(reason)),
        None => Err(DashboardError::Transport("no scripted reply".to_string())),
    }
}

impl Backend for ScriptedBackend {
    async fn upload(&self, _file: &UploadFile) -> Result<UploadResponse> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        let reply = self.uploads.lock().pop_front();
        decode(reply)
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalyzeResponse> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(request.clone());
        self.wait().await;
        let reply = self.analyses.lock().pop_front();
        decode(reply)
    }
}

pub(crate) fn dashboard(backend: ScriptedBackend) -> Dashboard<ScriptedBackend> {
    Dashboard::new(backend, Config::default())
}

pub(crate) fn sample_file() -> UploadFile {
    UploadFile::new("sales.csv", "A,B,C\nx,1,2\n")
}
