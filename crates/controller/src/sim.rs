//! Stateful soil moisture simulator for development without hardware.
//!
//! Models the parts of real capacitive-probe behaviour the control loop
//! cares about: temporal coherence (random walk with mean reversion),
//! gradual drying drift, per-reading electronic noise, and a closed-loop
//! wetting response while the pump runs.

/// Approximate a sample from N(0, sigma): sum of 12 uniform [0,1) values
/// minus 6 (Irwin-Hall).
fn gauss(sigma: f64) -> f64 {
    let mut sum = 0.0;
    for _ in 0..12 {
        sum += fastrand::f64();
    }
    (sum - 6.0) * sigma
}

/// Simulated probe producing raw ADC readings. Higher raw = drier when
/// `raw_dry > raw_wet` (the ADS1115 default calibration); the walk follows
/// whichever ordering the calibration uses.
pub struct SoilSim {
    /// Current "true" soil state in raw ADC units.
    base: f64,
    raw_dry: f64,
    raw_wet: f64,
    /// Per-sample movement toward the dry endpoint (evaporation).
    drift: f64,
    /// Random walk step sigma.
    walk_sigma: f64,
    /// Pull toward the calibration midpoint, keeps the walk bounded.
    reversion: f64,
    /// Per-reading electronic noise sigma.
    noise_sigma: f64,
    watering: bool,
    /// Per-sample movement toward the wet endpoint while watering. Larger
    /// than `drift` so a running pump visibly wins.
    wet_rate: f64,
}

impl SoilSim {
    pub fn new(raw_dry: f64, raw_wet: f64) -> Self {
        let range = (raw_dry - raw_wet).abs();
        Self {
            base: (raw_dry + raw_wet) / 2.0,
            raw_dry,
            raw_wet,
            drift: range * 0.002,
            walk_sigma: range * 0.005,
            reversion: 0.01,
            noise_sigma: range * 0.004,
            watering: false,
            wet_rate: range * 0.02,
        }
    }

    /// Inform the simulator whether the pump is currently running.
    pub fn set_watering(&mut self, on: bool) {
        self.watering = on;
    }

    /// Produce the next raw reading. The internal state evolves with each
    /// call, so call once per control cycle.
    pub fn sample(&mut self) -> i32 {
        let toward_dry = (self.raw_dry - self.base).signum();
        let center = (self.raw_dry + self.raw_wet) / 2.0;

        let mut step = self.drift * toward_dry;
        step += self.reversion * (center - self.base);
        step += gauss(self.walk_sigma);
        if self.watering {
            // Wetting pushes away from the dry endpoint.
            step -= self.wet_rate * toward_dry;
        }

        let lo = self.raw_dry.min(self.raw_wet);
        let hi = self.raw_dry.max(self.raw_wet);
        self.base = (self.base + step).clamp(lo, hi);

        let reading = self.base + gauss(self.noise_sigma);
        reading.round().clamp(0.0, 32767.0) as i32
    }
}

// ===========================================================================
// Tests
// ===========================================================================
