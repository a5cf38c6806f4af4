//! TOML configuration loading and validation for the controller.
//!
//! Every knob has a baked-in default so the binary runs without a config
//! file (simulated probe against a local devhub). A partial file overrides
//! only the sections it names. Validation reports every violation found,
//! not just the first one.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

/// ADS1115 I2C addresses selectable via the ADDR pin.
const ADS1115_ADDRS: &[u16] = &[0x48, 0x49, 0x4a, 0x4b];

/// Maximum single-ended reading from the ADS1115 (15-bit unsigned).
const ADS1115_MAX: i32 = 32767;

/// BCM GPIO pins usable for the pump relay on a Raspberry Pi 40-pin header.
/// GPIO 0-1 are reserved for the ID EEPROM; GPIO 28+ are not exposed.
const VALID_GPIO_PINS: &[u8] = &[
    2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27,
];

// ---------------------------------------------------------------------------
// Config structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub hub: HubSection,
    pub sensor: SensorSection,
    pub control: ControlSection,
    pub pump: PumpSection,
    pub provision: ProvisionSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HubSection {
    /// Base URL of the remote server, e.g. "http://192.168.1.10:5000".
    pub url: String,
    /// Per-request timeout. Must stay well under the report/poll cadence.
    pub http_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SensorSection {
    /// Raw reading with the probe in dry air.
    pub raw_dry: i32,
    /// Raw reading with the probe in water.
    pub raw_wet: i32,
    /// ADS1115 I2C address (`adc` feature).
    pub adc_addr: u16,
    /// ADS1115 single-ended channel 0-3 (`adc` feature).
    pub adc_channel: u8,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlSection {
    /// Pump turns ON when moisture drops below this percentage (auto mode).
    pub low_percent: f32,
    /// Pump turns OFF when moisture rises above this percentage (auto mode).
    pub high_percent: f32,
    /// Base control cycle period.
    pub cycle_secs: u64,
    /// Send a telemetry report every N cycles.
    pub report_every: u32,
    /// Poll the remote config every N cycles.
    pub poll_every: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PumpSection {
    /// BCM pin driving the pump relay (`gpio` feature).
    pub gpio_pin: u8,
    /// Most relay boards are active-low.
    pub active_low: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProvisionSection {
    /// Connectivity probes at boot before giving up and exiting.
    pub max_attempts: u32,
    /// Delay between connectivity probes.
    pub retry_secs: u64,
    /// Stored network credentials, removed on a remote reset directive.
    pub credentials_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for Config {
    fn default() -> Self {
        Self {
            hub: HubSection::default(),
            sensor: SensorSection::default(),
            control: ControlSection::default(),
            pump: PumpSection::default(),
            provision: ProvisionSection::default(),
        }
    }
}

impl Default for HubSection {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000".to_string(),
            http_timeout_secs: 5,
        }
    }
}

impl Default for SensorSection {
    fn default() -> Self {
        // Typical capacitive probe on an ADS1115 at PGA ±4.096 V.
        Self {
            raw_dry: 26000,
            raw_wet: 12000,
            adc_addr: 0x48,
            adc_channel: 0,
        }
    }
}

impl Default for ControlSection {
    fn default() -> Self {
        Self {
            low_percent: 45.0,
            high_percent: 60.0,
            cycle_secs: 1,
            report_every: 5,
            poll_every: 5,
        }
    }
}

impl Default for PumpSection {
    fn default() -> Self {
        Self {
            gpio_pin: 26,
            active_low: true,
        }
    }
}

impl Default for ProvisionSection {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            retry_secs: 2,
            credentials_path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parse a TOML string into a `Config`.
pub fn parse(s: &str) -> Result<Config> {
    toml::from_str(s).context("failed to parse config TOML")
}

/// Load the config file at `path`, falling back to defaults when the file
/// does not exist. A present-but-broken file is an error; silently ignoring
/// it would mask typos in deployed configs.
pub fn load_or_default(path: &str) -> Result<Config> {
    if !Path::new(path).exists() {
        tracing::info!(path, "no config file — using built-in defaults");
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {path}"))?;
    parse(&raw).with_context(|| format!("in config file {path}"))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Config {
    /// Validate all sections. Returns `Ok(())` or an error describing every
    /// violation found.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        // ── Hub ─────────────────────────────────────────────────
        if !self.hub.url.starts_with("http://") && !self.hub.url.starts_with("https://") {
            errors.push(format!(
                "hub.url '{}' must start with http:// or https://",
                self.hub.url
            ));
        }
        if self.hub.http_timeout_secs == 0 {
            errors.push("hub.http_timeout_secs must be positive".to_string());
        }

        // ── Sensor calibration ──────────────────────────────────
        for (name, v) in [
            ("sensor.raw_dry", self.sensor.raw_dry),
            ("sensor.raw_wet", self.sensor.raw_wet),
        ] {
            if !(0..=ADS1115_MAX).contains(&v) {
                errors.push(format!("{name} {v} out of ADC range [0, {ADS1115_MAX}]"));
            }
        }
        if self.sensor.raw_dry == self.sensor.raw_wet {
            errors.push(format!(
                "sensor.raw_dry and sensor.raw_wet are both {} — calibration range is zero",
                self.sensor.raw_dry
            ));
        }
        if !ADS1115_ADDRS.contains(&self.sensor.adc_addr) {
            errors.push(format!(
                "sensor.adc_addr 0x{:02x} is not a valid ADS1115 address (0x48-0x4b)",
                self.sensor.adc_addr
            ));
        }
        if self.sensor.adc_channel > 3 {
            errors.push(format!(
                "sensor.adc_channel {} out of range (0-3)",
                self.sensor.adc_channel
            ));
        }

        // ── Control thresholds ──────────────────────────────────
        if !(0.0..=100.0).contains(&self.control.low_percent) {
            errors.push(format!(
                "control.low_percent {} out of range [0, 100]",
                self.control.low_percent
            ));
        }
        if !(0.0..=100.0).contains(&self.control.high_percent) {
            errors.push(format!(
                "control.high_percent {} out of range [0, 100]",
                self.control.high_percent
            ));
        }
        if self.control.low_percent >= self.control.high_percent {
            errors.push(format!(
                "control.low_percent ({}) must be below control.high_percent ({}) — \
                 the band between them is what prevents pump chatter",
                self.control.low_percent, self.control.high_percent
            ));
        }

        // ── Cadences ────────────────────────────────────────────
        if self.control.cycle_secs == 0 {
            errors.push("control.cycle_secs must be positive".to_string());
        }
        if self.control.report_every == 0 {
            errors.push("control.report_every must be at least 1".to_string());
        }
        if self.control.poll_every == 0 {
            errors.push("control.poll_every must be at least 1".to_string());
        }

        // ── Pump ────────────────────────────────────────────────
        if !VALID_GPIO_PINS.contains(&self.pump.gpio_pin) {
            errors.push(format!(
                "pump.gpio_pin {} is not a valid BCM GPIO pin (allowed: 2-27)",
                self.pump.gpio_pin
            ));
        }

        // ── Provisioning ────────────────────────────────────────
        if self.provision.max_attempts == 0 {
            errors.push("provision.max_attempts must be at least 1".to_string());
        }
        if self.provision.retry_secs == 0 {
            errors.push("provision.retry_secs must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "config validation failed ({} error{}):\n  - {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                errors.join("\n  - ")
            );
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
