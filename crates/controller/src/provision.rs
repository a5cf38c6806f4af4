//! Boot-time provisioning gate.
//!
//! The controller cannot function headless without its remote counterpart,
//! so the boot sequence probes the server before the control loop starts.
//! Exhausting the attempt budget is terminal: the process exits non-zero
//! and the supervisor restarts it into a fresh provisioning attempt. This
//! keeps restart-on-failure out of the steady-state loop entirely.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::remote::HubClient;

/// Block until the server answers a config request, retrying on a fixed
/// delay up to `max_attempts`.
pub async fn wait_for_hub(
    client: &HubClient,
    max_attempts: u32,
    retry: Duration,
) -> Result<()> {
    for attempt in 1..=max_attempts {
        match client.fetch_config().await {
            Ok(_) => {
                info!(attempt, "hub reachable — provisioning complete");
                return Ok(());
            }
            Err(e) => {
                warn!(attempt, max_attempts, "hub not reachable yet: {e:#}");
            }
        }
        if attempt < max_attempts {
            tokio::time::sleep(retry).await;
        }
    }
    bail!("hub unreachable after {max_attempts} attempts — restarting to re-provision")
}

/// Remove stored network credentials so the next boot re-enters
/// provisioning. Missing file is fine: already cleared.
pub fn clear_credentials(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("failed to remove credentials file {}", path.display()))?;
        info!(path = %path.display(), "stored credentials cleared");
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn gives_up_after_attempt_budget() {
        let client = HubClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        let err = wait_for_hub(&client, 2, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("after 2 attempts"), "{err}");
    }

    #[test]
    fn clear_credentials_removes_existing_file() {
        let path = std::env::temp_dir().join("autowater-test-creds");
        std::fs::write(&path, "ssid=x").unwrap();
        clear_credentials(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn clear_credentials_tolerates_missing_file() {
        let path = std::env::temp_dir().join("autowater-test-creds-absent");
        let _ = std::fs::remove_file(&path);
        clear_credentials(&path).unwrap();
    }
}
