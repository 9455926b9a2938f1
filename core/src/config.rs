use crate::error::{ModemError, Result};

/// Modem parameter set, bound at component construction and immutable
/// afterwards. Parameter changes go through an explicit reconfigure on the
/// component that owns the affected state.
#[derive(Debug, Clone)]
pub struct ModemConfig {
    /// Mark tone (logical 1) in Hz.
    pub mark_freq: u32,
    /// Space tone (logical 0) in Hz.
    pub space_freq: u32,
    /// Bit rate in bits/s.
    pub baud_rate: u32,
    /// Output amplitude as a fraction of full scale, 0.0..=1.0.
    pub amplitude: f32,
    /// Tone-table length; must be a power of two.
    pub samples_per_cycle: usize,
    /// Receive-side sample rate in Hz.
    pub sample_rate: u32,
    /// Samples per Goertzel detection block; must be a power of two.
    pub goertzel_block: usize,
    /// Zero reference subtracted from receive samples before detection.
    /// 0.0 for already-centered float captures, the ADC midpoint for raw
    /// converter readings.
    pub input_midpoint: f32,
    /// PTT settling time before and after the audio burst, in ms.
    pub tx_delay_ms: u32,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            mark_freq: crate::MARK_FREQ,
            space_freq: crate::SPACE_FREQ,
            baud_rate: crate::BAUD_RATE,
            amplitude: 0.8,
            samples_per_cycle: crate::SAMPLES_PER_CYCLE,
            sample_rate: crate::SAMPLE_RATE,
            goertzel_block: crate::GOERTZEL_BLOCK,
            input_midpoint: 0.0,
            tx_delay_ms: 50,
        }
    }
}

impl ModemConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.amplitude) {
            return Err(ModemError::InvalidConfig(format!(
                "amplitude {} outside 0.0..=1.0",
                self.amplitude
            )));
        }
        if self.samples_per_cycle == 0 || !self.samples_per_cycle.is_power_of_two() {
            return Err(ModemError::InvalidConfig(format!(
                "samples_per_cycle {} is not a power of two",
                self.samples_per_cycle
            )));
        }
        if self.goertzel_block == 0 || !self.goertzel_block.is_power_of_two() {
            return Err(ModemError::InvalidConfig(format!(
                "goertzel_block {} is not a power of two",
                self.goertzel_block
            )));
        }
        if self.mark_freq == 0 || self.space_freq == 0 {
            return Err(ModemError::InvalidConfig("tone frequency is zero".into()));
        }
        if self.mark_freq == self.space_freq {
            return Err(ModemError::InvalidConfig(
                "mark and space frequencies are equal".into(),
            ));
        }
        if self.baud_rate == 0 {
            return Err(ModemError::InvalidConfig("baud rate is zero".into()));
        }
        if self.sample_rate == 0 {
            return Err(ModemError::InvalidConfig("sample rate is zero".into()));
        }
        Ok(())
    }
}
