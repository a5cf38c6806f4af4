//! In-memory desired-state store for the dev server.
//!
//! Holds what the real backend would persist: the operator's desired mode
//! and pump command, the schedule window, a one-shot reset flag, and the
//! latest device report.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

pub type SharedStore = Arc<RwLock<Store>>;

pub struct Store {
    pub started_at: Instant,
    pub desired: Desired,
    /// One-shot: handed to the device on the next config fetch, then cleared.
    pub reset_wifi: bool,
    pub last_report: Option<DeviceReport>,
    pub reports_seen: u64,
}

/// Operator-desired state served to the device.
#[derive(Debug, Clone, Serialize)]
pub struct Desired {
    pub pump_cmd: bool,
    pub auto: bool,
    pub use_schedule: bool,
    pub start: String,
    pub end: String,
}

impl Default for Desired {
    fn default() -> Self {
        Self {
            pump_cmd: false,
            auto: true,
            use_schedule: false,
            start: "06:00".to_string(),
            end: "06:15".to_string(),
        }
    }
}

/// What the device posts to `/api/report`. Field defaults mirror the
/// device's wire contract so a sparse report still lands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceReport {
    pub soil: f32,
    pub pump: u8,
    pub auto: u8,
    pub wifi_rssi: i32,
}

impl Store {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            desired: Desired::default(),
            reset_wifi: false,
            last_report: None,
            reports_seen: 0,
        }
    }

    /// Consume the one-shot reset flag: true at most once per arming.
    pub fn take_reset(&mut self) -> bool {
        std::mem::take(&mut self.reset_wifi)
    }

    pub fn record_report(&mut self, report: DeviceReport) {
        self.last_report = Some(report);
        self.reports_seen += 1;
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_auto_with_pump_off() {
        let store = Store::new();
        assert!(store.desired.auto);
        assert!(!store.desired.pump_cmd);
        assert!(!store.reset_wifi);
    }

    #[test]
    fn take_reset_fires_once() {
        let mut store = Store::new();
        store.reset_wifi = true;
        assert!(store.take_reset());
        assert!(!store.take_reset());
    }

    #[test]
    fn record_report_tracks_latest_and_count() {
        let mut store = Store::new();
        store.record_report(DeviceReport {
            soil: 40.0,
            pump: 1,
            auto: 1,
            wifi_rssi: -60,
        });
        store.record_report(DeviceReport {
            soil: 55.0,
            ..Default::default()
        });
        assert_eq!(store.reports_seen, 2);
        assert_eq!(store.last_report.as_ref().unwrap().soil, 55.0);
    }
}
