use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder};
use tracing::{debug, info};

use crate::error::{ImportError, Result};

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

#[derive(Debug, Clone)]
pub struct EsClient {
    host: String,
    http_client: Client,
}

pub fn build_http_client(timeout_seconds: Option<u64>) -> Result<Client> {
    let mut builder = ClientBuilder::new();
    if let Some(seconds) = timeout_seconds {
        builder = builder.timeout(Duration::from_secs(seconds));
    }
    Ok(builder.build()?)
}

impl EsClient {
    pub fn new(host: &str, http_client: Client) -> Self {
        Self {
            host: host.to_string(),
            http_client,
        }
    }

    pub fn bulk_url(&self, index_name: &str) -> String {
        format!("http://{}/{}/_bulk", self.host, index_name)
    }

    /// Single POST, no retry. The body text comes back for every HTTP answer;
    /// statuses >= 400 carry it inside `ImportError::Submission`.
    pub async fn bulk(&self, index_name: &str, body: String) -> Result<String> {
        let url = self.bulk_url(index_name);
        info!("POST {} ({} bytes)", url, body.len());

        let response = self
            .http_client
            .post(&url)
            .header(CONTENT_TYPE, NDJSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!("Bulk response status={}, body_len={}", status, text.len());

        if status.is_client_error() || status.is_server_error() {
            return Err(ImportError::Submission { status, body: text });
        }
        Ok(text)
    }
}
