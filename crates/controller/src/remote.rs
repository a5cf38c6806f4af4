//! HTTP client for the remote server: telemetry push and config pull.
//!
//! Both calls are best-effort. The client carries a request timeout well
//! under the cycle period, so a hung request fails before the next tick and
//! is handled like any other transport error: logged, skipped, superseded
//! by the next cycle.

use anyhow::{Context, Result};
use std::time::Duration;

use crate::api::{RemoteConfig, Report};

pub struct HubClient {
    http: reqwest::Client,
    base: String,
}

impl HubClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Push a telemetry report. Acknowledgment-only: the response body is
    /// never consumed for control purposes.
    pub async fn report(&self, report: &Report) -> Result<()> {
        self.http
            .post(format!("{}/api/report", self.base))
            .json(report)
            .send()
            .await
            .context("report request failed")?
            .error_for_status()
            .context("report rejected by server")?;
        Ok(())
    }

    /// Fetch the server's desired state. A body that fails to parse is an
    /// error here; the caller keeps the previous remote intent.
    pub async fn fetch_config(&self) -> Result<RemoteConfig> {
        self.http
            .get(format!("{}/api/config", self.base))
            .send()
            .await
            .context("config request failed")?
            .error_for_status()
            .context("config rejected by server")?
            .json::<RemoteConfig>()
            .await
            .context("malformed config response")
    }
}

// ---------------------------------------------------------------------------
// Link quality
// ---------------------------------------------------------------------------

/// Best-effort WiFi signal level for telemetry. Reads the first station in
/// `/proc/net/wireless`; wired and dev hosts report 0, keeping the wire
/// field present either way.
pub fn link_rssi() -> i32 {
    std::fs::read_to_string("/proc/net/wireless")
        .ok()
        .and_then(|s| parse_wireless(&s))
        .unwrap_or(0)
}

/// Extract the signal level (dBm) from `/proc/net/wireless` contents. The
/// first two lines are headers; data lines carry `face: status link level
/// noise ...` with a trailing dot on the fixed-point fields.
fn parse_wireless(contents: &str) -> Option<i32> {
    let line = contents.lines().nth(2)?;
    let level = line.split_whitespace().nth(3)?;
    level.trim_end_matches('.').parse::<f32>().ok().map(|v| v as i32)
}

// ===========================================================================
// Tests
// ===========================================================================
