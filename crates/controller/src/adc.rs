//! ADS1115 single-channel driver over I2C (`adc` feature).
//!
//! Single-ended, single-shot reads at PGA ±4.096 V and 128 SPS — the
//! configuration the default `raw_dry`/`raw_wet` calibration was taken with
//! for a 3.3 V capacitive soil probe.

use anyhow::{ensure, Context, Result};
use rppal::i2c::I2c;
use std::{thread, time::Duration};

/// Conversion result register (read-only, 16-bit signed).
const REG_CONVERSION: u8 = 0x00;
/// Configuration register (read/write).
const REG_CONFIG: u8 = 0x01;

/// OS=1 (start single-shot), PGA=001 (±4.096 V), MODE=1 (single-shot),
/// DR=100 (128 SPS), comparator disabled. MUX bits are OR-ed in per read.
const CONFIG_BASE: u16 = 0b1_000_001_1_100_0_0_0_11;

/// MUX values for single-ended reads (AINx vs GND), shifted into [14:12].
const MUX_SINGLE_ENDED: [u16; 4] = [0b100, 0b101, 0b110, 0b111];
const MUX_SHIFT: u8 = 12;

/// Bit 15 of the config register reads back as conversion-ready.
const OS_READY_BIT: u16 = 1 << 15;

/// Conversion time at 128 SPS is ~7.8 ms; wait 9 ms for margin.
const CONVERSION_WAIT: Duration = Duration::from_millis(9);

pub struct Ads1115 {
    i2c: I2c,
    config: u16,
}

impl Ads1115 {
    /// Open I2C bus 1 and target the ADS1115 at `addr`, reading single-ended
    /// `channel` (0-3).
    pub fn new(addr: u16, channel: usize) -> Result<Self> {
        ensure!(channel <= 3, "ADS1115 channel {channel} out of range (0-3)");

        let mut i2c = I2c::new().context("failed to open I2C bus")?;
        i2c.set_slave_address(addr)
            .with_context(|| format!("failed to address ADS1115 at 0x{addr:02x}"))?;

        tracing::info!(
            addr = format_args!("0x{addr:02x}"),
            channel,
            "ads1115 probe initialised"
        );

        Ok(Self {
            i2c,
            config: CONFIG_BASE | (MUX_SINGLE_ENDED[channel] << MUX_SHIFT),
        })
    }

    /// Start one conversion and return the raw value (0-32767 single-ended;
    /// negative readings from a floating input clamp to 0).
    pub fn read_single_shot(&mut self) -> Result<i16> {
        self.i2c
            .block_write(REG_CONFIG, &self.config.to_be_bytes())
            .context("ads1115: failed to start conversion")?;

        thread::sleep(CONVERSION_WAIT);

        // One wait is normally enough at 128 SPS; retry briefly to be safe.
        for _ in 0..3 {
            let mut buf = [0u8; 2];
            self.i2c
                .block_read(REG_CONFIG, &mut buf)
                .context("ads1115: failed to read status")?;
            if u16::from_be_bytes(buf) & OS_READY_BIT != 0 {
                let mut out = [0u8; 2];
                self.i2c
                    .block_read(REG_CONVERSION, &mut out)
                    .context("ads1115: failed to read conversion")?;
                return Ok(i16::from_be_bytes(out).max(0));
            }
            thread::sleep(Duration::from_millis(2));
        }

        anyhow::bail!("ads1115: conversion never became ready")
    }
}
