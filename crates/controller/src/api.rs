//! Wire records exchanged with the remote server.
//!
//! Outbound report: `POST /api/report` with soil percentage, pump and mode
//! flags as 0/1 integers, and link RSSI. Inbound config: `GET /api/config`.
//! Every inbound field is optional on the wire; absent fields default to
//! the safe value (automatic mode, no pump command) instead of failing the
//! whole poll.

use serde::{Deserialize, Serialize};

use crate::state::{ControllerState, Mode, Schedule};

// ---------------------------------------------------------------------------
// Outbound telemetry
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct Report {
    pub soil: f32,
    pub pump: u8,
    pub auto: u8,
    pub wifi_rssi: i32,
}

impl Report {
    pub fn from_state(st: &ControllerState) -> Self {
        Self {
            soil: st.soil_percent,
            pump: st.pump_on as u8,
            auto: (st.mode == Mode::Auto) as u8,
            wifi_rssi: st.wifi_rssi,
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound remote config
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct RemoteConfig {
    /// Desired pump state, meaningful in manual mode. Absent = no command.
    #[serde(default)]
    pub pump_cmd: Option<u8>,
    /// 1 = automatic, 0 = manual. Absent defaults to automatic: only an
    /// explicit 0 hands control to the operator.
    #[serde(default)]
    pub auto: Option<u8>,
    #[serde(default)]
    pub use_schedule: u8,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    /// One-shot directive: clear provisioning and restart.
    #[serde(default)]
    pub reset_wifi: u8,
}

impl RemoteConfig {
    pub fn mode(&self) -> Mode {
        match self.auto {
            Some(0) => Mode::Manual,
            _ => Mode::Auto,
        }
    }

    pub fn command(&self) -> Option<bool> {
        self.pump_cmd.map(|v| v != 0)
    }

    pub fn schedule(&self) -> Schedule {
        Schedule {
            enabled: self.use_schedule != 0,
            start: self.start.clone(),
            end: self.end.clone(),
        }
    }

    pub fn reset_requested(&self) -> bool {
        self.reset_wifi != 0
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -- Report -------------------------------------------------------------

    #[test]
    fn report_serializes_exact_field_set() {
        let mut st = ControllerState::new();
        st.soil_percent = 42.5;
        st.pump_on = true;
        st.wifi_rssi = -61;

        let json = serde_json::to_value(Report::from_state(&st)).unwrap();
        assert_eq!(json["soil"], 42.5);
        assert_eq!(json["pump"], 1);
        assert_eq!(json["auto"], 1);
        assert_eq!(json["wifi_rssi"], -61);
        assert_eq!(json.as_object().unwrap().len(), 4);
    }

    #[test]
    fn report_flags_manual_mode_as_zero() {
        let mut st = ControllerState::new();
        st.set_mode(Mode::Manual);
        let json = serde_json::to_value(Report::from_state(&st)).unwrap();
        assert_eq!(json["auto"], 0);
        assert_eq!(json["pump"], 0);
    }

    // -- RemoteConfig -------------------------------------------------------

    #[test]
    fn full_response_parses() {
        let json = r#"{"pump_cmd":1,"auto":0,"use_schedule":1,"start":"06:00","end":"06:15","reset_wifi":0}"#;
        let rc: RemoteConfig = serde_json::from_str(json).unwrap();
        assert_eq!(rc.mode(), Mode::Manual);
        assert_eq!(rc.command(), Some(true));
        assert!(!rc.reset_requested());
        let s = rc.schedule();
        assert!(s.enabled);
        assert_eq!(s.start, "06:00");
        assert_eq!(s.end, "06:15");
    }

    #[test]
    fn absent_auto_defaults_to_auto_mode() {
        let rc: RemoteConfig = serde_json::from_str(r#"{"pump_cmd":1}"#).unwrap();
        assert_eq!(rc.mode(), Mode::Auto);
    }

    #[test]
    fn explicit_auto_one_is_auto_mode() {
        let rc: RemoteConfig = serde_json::from_str(r#"{"auto":1}"#).unwrap();
        assert_eq!(rc.mode(), Mode::Auto);
    }

    #[test]
    fn explicit_auto_zero_is_manual_mode() {
        let rc: RemoteConfig = serde_json::from_str(r#"{"auto":0}"#).unwrap();
        assert_eq!(rc.mode(), Mode::Manual);
    }

    #[test]
    fn absent_pump_cmd_is_no_command() {
        let rc: RemoteConfig = serde_json::from_str(r#"{"auto":0}"#).unwrap();
        assert_eq!(rc.command(), None);
    }

    #[test]
    fn pump_cmd_zero_is_an_off_command_not_absent() {
        let rc: RemoteConfig = serde_json::from_str(r#"{"pump_cmd":0}"#).unwrap();
        assert_eq!(rc.command(), Some(false));
    }

    #[test]
    fn empty_object_is_all_safe_defaults() {
        let rc: RemoteConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(rc.mode(), Mode::Auto);
        assert_eq!(rc.command(), None);
        assert!(!rc.reset_requested());
        assert_eq!(rc.schedule(), Schedule::default());
    }

    #[test]
    fn extra_fields_are_ignored() {
        let rc: RemoteConfig =
            serde_json::from_str(r#"{"auto":1,"firmware_update":"v2"}"#).unwrap();
        assert_eq!(rc.mode(), Mode::Auto);
    }

    #[test]
    fn schedule_fields_are_stored_verbatim() {
        // Even nonsense windows are carried, never interpreted.
        let rc: RemoteConfig =
            serde_json::from_str(r#"{"use_schedule":1,"start":"25:99","end":""}"#).unwrap();
        let s = rc.schedule();
        assert!(s.enabled);
        assert_eq!(s.start, "25:99");
        assert_eq!(s.end, "");
    }

    #[test]
    fn reset_directive_parses() {
        let rc: RemoteConfig = serde_json::from_str(r#"{"reset_wifi":1}"#).unwrap();
        assert!(rc.reset_requested());
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(serde_json::from_str::<RemoteConfig>(r#"{"auto":"yes"}"#).is_err());
        assert!(serde_json::from_str::<RemoteConfig>("pump on please").is_err());
    }
}
