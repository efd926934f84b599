//! Heartbeat reporter for POSTing bin identifiers to the webhook target.
//!
//! On a fixed period the reporter drains the aggregator, serializes the
//! qualifying transmitter identifiers as a JSON array of strings, and
//! dispatches them to `{scheme}://{hostname}:{port}/bins` over a pooled
//! keep-alive connection. Reporting failures are logged and swallowed; the
//! next cycle is scheduled unconditionally and ingestion is never blocked.

use crate::aggregator::SharedAggregator;
use crate::config::{Config, ConfigError};
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Path of the webhook endpoint on the target host.
pub const BINS_PATH: &str = "/bins";

/// Periodic reporter of aggregated bin identifiers.
pub struct BinsReporter {
    client: reqwest::Client,
    bins_url: String,
    target: String,
    custom_headers: HeaderMap,
    period: Duration,
    aggregator: SharedAggregator,
}

impl BinsReporter {
    /// Create a reporter from the configuration.
    ///
    /// The underlying client keeps connections alive across heartbeats.
    pub fn new(config: &Config, aggregator: SharedAggregator) -> Result<Self, ConfigError> {
        let custom_headers = config.custom_header_map()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ConfigError::IoError(format!("Failed to create HTTP client: {e}")))?;

        let target = format!("{}:{}", config.hostname, config.port);
        let bins_url = format!("{}://{}{}", config.scheme(), target, BINS_PATH);

        Ok(Self {
            client,
            bins_url,
            target,
            custom_headers,
            period: Duration::from_millis(config.heartbeat_milliseconds),
            aggregator,
        })
    }

    /// Full URL of the webhook endpoint.
    pub fn bins_url(&self) -> &str {
        &self.bins_url
    }

    /// Run the heartbeat loop until the task is dropped.
    ///
    /// The first report is dispatched one full period after start; a slow or
    /// failed dispatch delays, never skips, the following cycle.
    pub async fn run(self) {
        let mut heartbeat = tokio::time::interval(self.period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        heartbeat.tick().await;

        loop {
            heartbeat.tick().await;

            let bin_identifiers = self.aggregator.lock().await.drain();
            self.post_bins(&bin_identifiers).await;
        }
    }

    /// POST the given bin identifiers to the webhook endpoint.
    ///
    /// Transport errors and non-200 responses are logged and swallowed so
    /// the heartbeat continues regardless of outcome.
    pub async fn post_bins(&self, bin_identifiers: &[String]) {
        let body = match serde_json::to_vec(bin_identifiers) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Could not serialize bin identifiers: {}", e);
                return;
            }
        };

        // Custom headers are applied last so they override the defaults on
        // key collision.
        let request = self
            .client
            .post(&self.bins_url)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, body.len())
            .headers(self.custom_headers.clone())
            .body(body);

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                if status != reqwest::StatusCode::OK {
                    // Handle non-OK server responses here, if required
                    tracing::warn!(
                        "Webhook {} returned status {}",
                        self.target,
                        status.as_u16()
                    );
                } else {
                    tracing::debug!(
                        "Reported {} bin identifiers to {}",
                        bin_identifiers.len(),
                        self.target
                    );
                }
            }
            Err(e) => {
                tracing::error!("Error POSTing to {}: {}", self.target, e);
            }
        }
    }
}
