use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Maximum number of events retained in the ring buffer.
const MAX_EVENTS: usize = 200;

// ---------------------------------------------------------------------------
// Public type alias
// ---------------------------------------------------------------------------

/// All cycle logic takes the write lock for the whole read-then-write
/// sequence (decide, arbitrate, apply), so a concurrent poll update can
/// never interleave with arbitration.
pub type SharedState = Arc<RwLock<ControllerState>>;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// Which authority drives the pump. Remote-authoritative: only a config
/// poll ever changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Auto,
    Manual,
}

/// Time-window fields received from the server. Stored and re-exposed,
/// never interpreted by the control logic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schedule {
    pub enabled: bool,
    pub start: String,
    pub end: String,
}

pub struct ControllerState {
    pub started_at: Instant,
    /// Latest calibrated reading; produced and consumed within one cycle.
    pub soil_percent: f32,
    pub pump_on: bool,
    pub mode: Mode,
    /// Last desired pump state received from the server. `None` until the
    /// first poll carries a command; meaningful only in manual mode.
    pub remote_command: Option<bool>,
    pub schedule: Schedule,
    pub wifi_rssi: i32,
    pub events: VecDeque<ControlEvent>,
}

#[derive(Clone, Serialize)]
pub struct ControlEvent {
    pub ts: i64,
    pub kind: EventKind,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Pump,
    Mode,
    Error,
    System,
}

// ---------------------------------------------------------------------------
// Construction & mutation
// ---------------------------------------------------------------------------

impl ControllerState {
    /// Boot state: pump off, automatic control, no remote command yet.
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            soil_percent: 0.0,
            pump_on: false,
            mode: Mode::Auto,
            remote_command: None,
            schedule: Schedule::default(),
            wifi_rssi: 0,
            events: VecDeque::with_capacity(MAX_EVENTS),
        }
    }

    /// Record a pump edge. Callers only invoke this when the state actually
    /// changed, so every entry is a discrete off→on or on→off transition.
    pub fn record_pump(&mut self, on: bool) {
        let edge = if on { "off -> on" } else { "on -> off" };
        self.push_event(EventKind::Pump, format!("pump {edge}"));
    }

    /// Update the control mode, recording an event only on an actual change.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.push_event(EventKind::Mode, format!("mode -> {mode:?}"));
    }

    pub fn record_error(&mut self, detail: String) {
        self.push_event(EventKind::Error, detail);
    }

    pub fn record_system(&mut self, detail: String) {
        self.push_event(EventKind::System, detail);
    }

    fn push_event(&mut self, kind: EventKind, detail: String) {
        if self.events.len() >= MAX_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(ControlEvent {
            ts: now_unix(),
            kind,
            detail,
        });
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

// ===========================================================================
// Tests
// ===========================================================================
