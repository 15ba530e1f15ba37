use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::TelemetrySample;

// ---

/// Status and body of one POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

/// Sends one telemetry row. `Err` means no response was obtained at all.
pub trait Transport: Send + Sync {
    fn post(&self, sample: &TelemetrySample) -> impl Future<Output = Result<Response>> + Send;
}

/// Supabase-style REST insert: `POST {base}/rest/v1/telemetry`.
pub struct HttpTransport {
    // ---
    client: Client,
    url: String,
    key: String,
}

impl HttpTransport {
    // ---
    pub fn new(base_url: &str, key: &str, timeout: Duration) -> Result<Self> {
        // ---
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(HttpTransport {
            client,
            url: format!("{}/rest/v1/telemetry", base_url.trim_end_matches('/')),
            key: key.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for HttpTransport {
    // ---
    async fn post(&self, sample: &TelemetrySample) -> Result<Response> {
        // ---
        let resp = self
            .client
            .post(&self.url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", "return=minimal")
            .json(sample)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Ok(Response { status, body })
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_url_is_built_from_base() {
        // ---
        let t = HttpTransport::new("https://example.supabase.co/", "k", Duration::from_secs(10))
            .unwrap();
        assert_eq!(t.url(), "https://example.supabase.co/rest/v1/telemetry");
    }
}
