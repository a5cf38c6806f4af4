mod api;
#[cfg(feature = "adc")]
mod adc;
mod config;
mod control;
mod cycle;
mod provision;
mod pump;
mod remote;
mod sensor;
#[cfg(feature = "sim")]
mod sim;
mod state;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use std::{env, process};
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cycle::Exit;
use pump::Pump;
use remote::HubClient;
use sensor::Probe;
use state::ControllerState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ── Config ──────────────────────────────────────────────────────
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "controller.toml".to_string());
    let mut cfg = config::load_or_default(&config_path)?;
    if let Ok(url) = env::var("HUB_URL") {
        cfg.hub.url = url;
    }
    cfg.validate()?;

    // ── Provisioning gate ───────────────────────────────────────────
    // The loop never starts without a reachable counterpart; exhausting
    // the attempt budget exits non-zero and the supervisor restarts us.
    let client = HubClient::new(&cfg.hub.url, Duration::from_secs(cfg.hub.http_timeout_secs))?;
    if let Err(e) = provision::wait_for_hub(
        &client,
        cfg.provision.max_attempts,
        Duration::from_secs(cfg.provision.retry_secs),
    )
    .await
    {
        tracing::error!("provisioning failed: {e:#}");
        process::exit(1);
    }

    // ── Hardware ────────────────────────────────────────────────────
    let pump = Pump::new(cfg.pump.gpio_pin, cfg.pump.active_low)
        .context("failed to initialise pump relay")?;
    let probe = Probe::new(&cfg).context("failed to initialise soil probe")?;

    // ── State & loop ────────────────────────────────────────────────
    let shared = Arc::new(RwLock::new(ControllerState::new()));
    {
        let mut st = shared.write().await;
        st.record_system("controller started".to_string());
    }

    info!(hub = %cfg.hub.url, "controller started");

    match cycle::run(&cfg, probe, pump, &client, shared).await {
        Exit::ResetRequested => {
            if let Some(path) = &cfg.provision.credentials_path {
                provision::clear_credentials(Path::new(path))?;
            }
            info!("exiting for re-provisioning");
        }
    }

    Ok(())
}
