//! Pump decision logic: hysteresis thresholds and authority arbitration.
//!
//! Both functions are pure so the whole decision path can be tested without
//! hardware, network, or an async runtime. The cycle glues them together
//! under a single state lock.

use crate::state::Mode;

// ---------------------------------------------------------------------------
// Hysteresis
// ---------------------------------------------------------------------------

/// Two-threshold pump control with a dead band.
///
/// The band between `low` and `high` is deliberate: a single trigger point
/// would chatter the relay on sensor noise. Inside the band (inclusive) the
/// current state is held, whatever it is.
#[derive(Debug, Clone, Copy)]
pub struct Hysteresis {
    pub low: f32,
    pub high: f32,
}

impl Hysteresis {
    /// Decide the next pump state from the current moisture percentage.
    ///
    /// Returns the input state unchanged unless the reading crossed a
    /// threshold in the direction that demands a transition, so repeated
    /// readings on the same side of a threshold produce no repeated edges.
    pub fn decide(&self, percent: f32, pump_on: bool) -> bool {
        if percent < self.low && !pump_on {
            true
        } else if percent > self.high && pump_on {
            false
        } else {
            pump_on
        }
    }
}

// ---------------------------------------------------------------------------
// Arbitration
// ---------------------------------------------------------------------------

/// Resolve which authority drives the pump this cycle.
///
/// - `Auto`: the hysteresis decision wins; a remote command is ignored even
///   if a stale poll left one behind.
/// - `Manual`: the remote command wins; with no command received yet the
///   current state is held rather than forced to a default.
pub fn arbitrate(
    mode: Mode,
    auto_decision: bool,
    remote_command: Option<bool>,
    current: bool,
) -> bool {
    match mode {
        Mode::Auto => auto_decision,
        Mode::Manual => remote_command.unwrap_or(current),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const BAND: Hysteresis = Hysteresis {
        low: 45.0,
        high: 60.0,
    };

    // -- hysteresis ---------------------------------------------------------

    #[test]
    fn dry_soil_turns_pump_on() {
        assert!(BAND.decide(30.0, false));
    }

    #[test]
    fn wet_soil_turns_pump_off() {
        assert!(!BAND.decide(75.0, true));
    }

    #[test]
    fn band_holds_state_regardless_of_history() {
        // Everything inside [low, high] leaves the state alone, both ways.
        for tenths in 450..=600 {
            let p = tenths as f32 / 10.0;
            assert!(!BAND.decide(p, false), "band turned pump on at {p}");
            assert!(BAND.decide(p, true), "band turned pump off at {p}");
        }
    }

    #[test]
    fn thresholds_themselves_hold_state() {
        // Strict comparisons: exactly low / exactly high is still the band.
        assert!(!BAND.decide(45.0, false));
        assert!(BAND.decide(45.0, true));
        assert!(!BAND.decide(60.0, false));
        assert!(BAND.decide(60.0, true));
    }

    #[test]
    fn already_on_below_low_stays_on_without_retrigger() {
        // Remaining below `low` while on demands no transition.
        assert!(BAND.decide(30.0, true));
        assert!(BAND.decide(44.9, true));
    }

    #[test]
    fn already_off_above_high_stays_off() {
        assert!(!BAND.decide(80.0, false));
    }

    #[test]
    fn one_transition_per_downward_crossing() {
        // Walk a falling sequence; count edges, not re-assertions.
        let readings = [50.0, 46.0, 44.0, 40.0, 35.0, 30.0];
        let mut on = false;
        let mut edges = 0;
        for r in readings {
            let next = BAND.decide(r, on);
            if next != on {
                edges += 1;
            }
            on = next;
        }
        assert!(on);
        assert_eq!(edges, 1, "exactly one off->on edge per crossing");
    }

    #[test]
    fn falling_then_rising_sequence_transitions_at_both_edges() {
        // low=45, high=60, starting off: on at 44, held at 30 and 55,
        // off at 62.
        let mut on = false;
        let mut trace = Vec::new();
        for r in [50.0, 44.0, 30.0, 55.0, 62.0] {
            on = BAND.decide(r, on);
            trace.push(on);
        }
        assert_eq!(trace, vec![false, true, true, true, false]);
    }

    // -- arbitration --------------------------------------------------------

    #[test]
    fn auto_follows_hysteresis_decision() {
        assert!(arbitrate(Mode::Auto, true, None, false));
        assert!(!arbitrate(Mode::Auto, false, None, true));
    }

    #[test]
    fn auto_ignores_every_remote_command() {
        for cmd in [None, Some(true), Some(false)] {
            assert!(arbitrate(Mode::Auto, true, cmd, false), "cmd={cmd:?}");
            assert!(!arbitrate(Mode::Auto, false, cmd, true), "cmd={cmd:?}");
        }
    }

    #[test]
    fn manual_applies_remote_command() {
        assert!(arbitrate(Mode::Manual, false, Some(true), false));
        assert!(!arbitrate(Mode::Manual, true, Some(false), true));
    }

    #[test]
    fn manual_without_command_holds_current_state() {
        // No command ever received: state is held indefinitely, never
        // forced to a default and never handed back to the auto decision.
        assert!(arbitrate(Mode::Manual, false, None, true));
        assert!(!arbitrate(Mode::Manual, true, None, false));
    }

    #[test]
    fn manual_on_beats_wet_soil_auto_off() {
        // Soil at 80% would demand OFF in auto; manual ON must win.
        let auto = BAND.decide(80.0, true);
        assert!(!auto);
        assert!(arbitrate(Mode::Manual, auto, Some(true), true));
    }
}
