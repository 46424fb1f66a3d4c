use async_trait::async_trait;

use serde_json::Value;

use crate::error::{ConvertError, Result};

/// Outbound HTTP, kept behind a port so geocoding and remote dataset loads can be tested offline
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpGetResult>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON. The error names the content type, since a proxy or CDN error page
    /// is the usual reason a 200 body is not JSON.
    pub fn json(&self, url: &str) -> Result<Value> {
        serde_json::from_slice(&self.bytes).map_err(|e| {
            let content_type = if self.content_type.is_empty() {
                "no content type"
            } else {
                self.content_type.as_str()
            };
            ConvertError::parse(url, format!("{e} (response was {content_type})"))
        })
    }
}
