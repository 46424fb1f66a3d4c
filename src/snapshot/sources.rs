use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::app::ports::HttpClientPort;
use crate::error::{ConvertError, Result};

/// Where the page's `/data/*.json` endpoints are served from
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Fetch and decode one endpoint, e.g. `/data/superfund.json`
    async fn fetch(&self, endpoint: &str) -> Result<Value>;

    fn describe(&self) -> String;
}

/// Endpoints resolved to files in a local data directory (`/data/tri.json` → `<dir>/tri.json`)
pub struct DirSource {
    data_dir: PathBuf,
}

impl DirSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn resolve(&self, endpoint: &str) -> PathBuf {
        let file_name = Path::new(endpoint)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(endpoint.trim_start_matches('/')));
        self.data_dir.join(file_name)
    }
}

#[async_trait]
impl DatasetSource for DirSource {
    async fn fetch(&self, endpoint: &str) -> Result<Value> {
        let path = self.resolve(endpoint);
        debug!("Loading {} from {}", endpoint, path.display());
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ConvertError::io(&path, e))?;
        serde_json::from_slice(&bytes).map_err(|e| ConvertError::parse(&path, e.to_string()))
    }

    fn describe(&self) -> String {
        self.data_dir.display().to_string()
    }
}

/// Endpoints fetched over HTTP from a deployed site
pub struct HttpSource {
    base_url: String,
    http: Arc<dyn HttpClientPort>,
}

impl HttpSource {
    pub fn new(base_url: &str, http: Arc<dyn HttpClientPort>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }
}

#[async_trait]
impl DatasetSource for HttpSource {
    async fn fetch(&self, endpoint: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Fetching {}", url);
        let resp = self.http.get(&url, &[]).await?;
        if !resp.is_success() {
            return Err(ConvertError::Api {
                message: format!("{} responded with status {}", url, resp.status),
            });
        }
        resp.json(&url)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}
