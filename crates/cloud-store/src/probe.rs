//! Active reachability probe.
//!
//! The OS connectivity flag alone is not trusted: a device can report a
//! connected interface while the link is unusable. Stability is verified
//! by issuing a cheap HEAD request and requiring an actual response
//! within a short window.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use notewell_core::network::NetworkProbe;

/// Probe requests must answer within this window to count as stable.
const PROBE_TIMEOUT_SECS: u64 = 2;
const DEFAULT_PROBE_URL: &str = "https://www.google.com";

/// Verifies the link by round-tripping a HEAD request.
#[derive(Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    probe_url: String,
}

impl HttpProbe {
    pub fn new() -> Self {
        Self::with_probe_url(DEFAULT_PROBE_URL)
    }

    pub fn with_probe_url(probe_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            probe_url: probe_url.to_string(),
        }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkProbe for HttpProbe {
    async fn is_connected(&self) -> bool {
        self.is_stable().await
    }

    async fn is_stable(&self) -> bool {
        match self.client.head(&self.probe_url).send().await {
            Ok(response) => response.status().is_success() || response.status().is_redirection(),
            Err(err) => {
                debug!("stability probe failed: {err}");
                false
            }
        }
    }
}
