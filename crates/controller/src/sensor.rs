//! Soil moisture probe: raw-to-percent calibration and the probe front-end.
//!
//! The `adc` feature reads a real ADS1115 channel; the default build wraps
//! the stateful simulator so the controller runs end-to-end on a dev machine.

use anyhow::Result;

use crate::config::Config;

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

/// Map a raw reading onto 0-100% using the dry/wet calibration endpoints,
/// clamped. Raw values outside the calibrated span are legal (probe in open
/// air, probe submerged) and clamp rather than fail. Works for either
/// endpoint ordering; `raw_dry == raw_wet` is rejected at config validation,
/// so the guard here only avoids a division by zero on a hand-built config.
pub fn moisture_percent(raw: i32, raw_dry: i32, raw_wet: i32) -> f32 {
    let range = raw_wet - raw_dry;
    if range == 0 {
        return 0.0;
    }
    let m = (raw - raw_dry) as f64 / range as f64 * 100.0;
    m.clamp(0.0, 100.0) as f32
}

// ---------------------------------------------------------------------------
// Probe front-end (real ADC)
// ---------------------------------------------------------------------------

#[cfg(feature = "adc")]
pub struct Probe {
    adc: crate::adc::Ads1115,
}

#[cfg(feature = "adc")]
impl Probe {
    pub fn new(cfg: &Config) -> Result<Self> {
        let adc = crate::adc::Ads1115::new(cfg.sensor.adc_addr, cfg.sensor.adc_channel as usize)?;
        Ok(Self { adc })
    }

    pub fn read_raw(&mut self) -> Result<i32> {
        Ok(self.adc.read_single_shot()? as i32)
    }

    /// Real soil responds to the pump on its own; nothing to signal.
    pub fn set_watering(&mut self, _on: bool) {}
}

// ---------------------------------------------------------------------------
// Probe front-end (simulator)
// ---------------------------------------------------------------------------

#[cfg(not(feature = "adc"))]
pub struct Probe {
    sim: crate::sim::SoilSim,
}

#[cfg(not(feature = "adc"))]
impl Probe {
    pub fn new(cfg: &Config) -> Result<Self> {
        tracing::info!("using simulated soil probe");
        Ok(Self {
            sim: crate::sim::SoilSim::new(cfg.sensor.raw_dry as f64, cfg.sensor.raw_wet as f64),
        })
    }

    pub fn read_raw(&mut self) -> Result<i32> {
        Ok(self.sim.sample())
    }

    /// Close the loop: simulated soil gets wetter while the pump runs.
    pub fn set_watering(&mut self, on: bool) {
        self.sim.set_watering(on);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
