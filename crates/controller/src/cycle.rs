//! The control loop: sample → decide → arbitrate → apply → report → poll.
//!
//! A single merged task on one interval; report and poll run on cycle-count
//! cadences on top of the base tick. The decide/arbitrate/apply sequence
//! holds the state write lock for its whole duration, so a poll update can
//! only land between cycles — arbitration is deterministic within a cycle
//! and remote intent becomes visible on the next one.

use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::api::{RemoteConfig, Report};
use crate::config::Config;
use crate::control::{arbitrate, Hysteresis};
use crate::pump::Pump;
use crate::remote::{link_rssi, HubClient};
use crate::sensor::{moisture_percent, Probe};
use crate::state::{ControllerState, SharedState};

/// Why the loop ended. It only ends on purpose.
#[derive(Debug)]
pub enum Exit {
    /// Server asked for a provisioning reset; the pump has been flushed OFF.
    ResetRequested,
}

/// One cycle's decision and actuation against the locked state.
fn actuate(st: &mut ControllerState, pump: &mut Pump, band: &Hysteresis, percent: f32) {
    st.soil_percent = percent;
    let auto_decision = band.decide(percent, st.pump_on);
    let desired = arbitrate(st.mode, auto_decision, st.remote_command, st.pump_on);
    if pump.set(desired) {
        st.pump_on = desired;
        st.record_pump(desired);
    }
}

/// Fold a successful poll into local state. An absent command is a no-op
/// (prior command kept); mode and schedule always track the server.
fn apply_remote(st: &mut ControllerState, rc: &RemoteConfig) {
    st.set_mode(rc.mode());
    if let Some(cmd) = rc.command() {
        st.remote_command = Some(cmd);
    }
    st.schedule = rc.schedule();
}

/// Drive the controller until a reset directive arrives.
pub async fn run(
    cfg: &Config,
    mut probe: Probe,
    mut pump: Pump,
    client: &HubClient,
    shared: SharedState,
) -> Exit {
    let band = Hysteresis {
        low: cfg.control.low_percent,
        high: cfg.control.high_percent,
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(cfg.control.cycle_secs));
    // An overrunning cycle is delayed, never dropped.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        low = band.low,
        high = band.high,
        cycle_secs = cfg.control.cycle_secs,
        report_every = cfg.control.report_every,
        poll_every = cfg.control.poll_every,
        "control loop started"
    );

    let mut tick: u64 = 0;
    loop {
        ticker.tick().await;
        tick += 1;

        // ── Sample ───────────────────────────────────────────
        let raw = match probe.read_raw() {
            Ok(r) => r,
            Err(e) => {
                error!("probe read failed: {e:#}");
                let mut st = shared.write().await;
                st.record_error(format!("probe read failed: {e:#}"));
                continue;
            }
        };
        let percent = moisture_percent(raw, cfg.sensor.raw_dry, cfg.sensor.raw_wet);

        // ── Decide, arbitrate, apply ─────────────────────────
        {
            let mut st = shared.write().await;
            actuate(&mut st, &mut pump, &band, percent);
        }
        probe.set_watering(pump.is_on());

        // ── Report ───────────────────────────────────────────
        if tick % cfg.control.report_every as u64 == 0 {
            let report = {
                let mut st = shared.write().await;
                st.wifi_rssi = link_rssi();
                Report::from_state(&st)
            };
            match client.report(&report).await {
                Ok(()) => debug!(soil = report.soil, pump = report.pump, "report sent"),
                Err(e) => {
                    // Stateless telemetry: no retry, the next cadence
                    // supersedes this report.
                    warn!("report failed: {e:#}");
                    shared.write().await.record_error(format!("report failed: {e:#}"));
                }
            }
        }

        // ── Poll ─────────────────────────────────────────────
        if tick % cfg.control.poll_every as u64 == 0 {
            match client.fetch_config().await {
                Ok(rc) => {
                    let mut st = shared.write().await;
                    apply_remote(&mut st, &rc);
                    if rc.reset_requested() {
                        // Leave the pump in a known state before the
                        // terminal reset path.
                        if pump.set(false) {
                            st.pump_on = false;
                            st.record_pump(false);
                        }
                        st.record_system("reset directive received".to_string());
                        info!("reset directive received — leaving control loop");
                        return Exit::ResetRequested;
                    }
                }
                Err(e) => {
                    // Prior remote intent stays in force until a newer
                    // poll succeeds.
                    warn!("config poll failed: {e:#}");
                    shared
                        .write()
                        .await
                        .record_error(format!("config poll failed: {e:#}"));
                }
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
