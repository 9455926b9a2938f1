//! Dual-frequency Goertzel energy detection over fixed sample blocks.

use std::f32::consts::PI;

use crate::config::ModemConfig;
use crate::error::Result;

/// Per-block mark/space tone detector.
///
/// Two second-order recursions run in parallel over one block of input,
/// one tuned to each tone. The accumulators live on the stack and are
/// re-initialized every block, so no energy leaks between blocks.
pub struct GoertzelDetector {
    coeff_mark: f32,
    coeff_space: f32,
    block_len: usize,
    input_midpoint: f32,
}

impl GoertzelDetector {
    pub fn new(config: &ModemConfig) -> Result<Self> {
        config.validate()?;
        let sample_rate = config.sample_rate as f32;
        Ok(Self {
            coeff_mark: 2.0 * (2.0 * PI * config.mark_freq as f32 / sample_rate).cos(),
            coeff_space: 2.0 * (2.0 * PI * config.space_freq as f32 / sample_rate).cos(),
            block_len: config.goertzel_block,
            input_midpoint: config.input_midpoint,
        })
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Detect the dominant tone in one block; true is mark.
    ///
    /// Silence and exact energy ties detect as space: the comparison is
    /// strict, so mark must win outright.
    pub fn detect_block(&self, block: &[f32]) -> bool {
        let mut qm1 = 0.0f32;
        let mut qm2 = 0.0f32;
        let mut qs1 = 0.0f32;
        let mut qs2 = 0.0f32;

        for &sample in block {
            let x = sample - self.input_midpoint;
            let qm0 = self.coeff_mark * qm1 - qm2 + x;
            let qs0 = self.coeff_space * qs1 - qs2 + x;
            qm2 = qm1;
            qm1 = qm0;
            qs2 = qs1;
            qs1 = qs0;
        }

        let mag_mark = qm1 * qm1 + qm2 * qm2 - qm1 * qm2 * self.coeff_mark;
        let mag_space = qs1 * qs1 + qs2 * qs2 - qs1 * qs2 * self.coeff_space;
        mag_mark > mag_space
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone_block(freq: f32, config: &ModemConfig) -> Vec<f32> {
        let step = 2.0 * PI * freq / config.sample_rate as f32;
        (0..config.goertzel_block)
            .map(|i| 0.8 * (step * i as f32).sin())
            .collect()
    }

    #[test]
    fn test_pure_mark_detects_mark() {
        let config = ModemConfig::default();
        let detector = GoertzelDetector::new(&config).unwrap();
        assert!(detector.detect_block(&tone_block(1200.0, &config)));
    }

    #[test]
    fn test_pure_space_detects_space() {
        let config = ModemConfig::default();
        let detector = GoertzelDetector::new(&config).unwrap();
        assert!(!detector.detect_block(&tone_block(2200.0, &config)));
    }

    #[test]
    fn test_silence_detects_space() {
        let config = ModemConfig::default();
        let detector = GoertzelDetector::new(&config).unwrap();
        let silence = vec![0.0f32; config.goertzel_block];
        assert!(!detector.detect_block(&silence));
    }

    #[test]
    fn test_dc_offset_input_centered() {
        let mut config = ModemConfig::default();
        config.input_midpoint = 2048.0;
        let detector = GoertzelDetector::new(&config).unwrap();
        // ADC-style capture: 12-bit readings around the converter midpoint
        let step = 2.0 * PI * 1200.0 / config.sample_rate as f32;
        let block: Vec<f32> = (0..config.goertzel_block)
            .map(|i| 2048.0 + 1000.0 * (step * i as f32).sin())
            .collect();
        assert!(detector.detect_block(&block));
    }

    #[test]
    fn test_no_state_carries_between_blocks() {
        let config = ModemConfig::default();
        let detector = GoertzelDetector::new(&config).unwrap();
        let mark = tone_block(1200.0, &config);
        let space = tone_block(2200.0, &config);
        // a loud mark block must not bias the following space block
        assert!(detector.detect_block(&mark));
        assert!(!detector.detect_block(&space));
        assert!(detector.detect_block(&mark));
    }

    #[test]
    fn test_attenuated_tone_still_detected() {
        let config = ModemConfig::default();
        let detector = GoertzelDetector::new(&config).unwrap();
        let quiet: Vec<f32> = tone_block(2200.0, &config)
            .iter()
            .map(|s| s * 0.05)
            .collect();
        assert!(!detector.detect_block(&quiet));
        let quiet_mark: Vec<f32> = tone_block(1200.0, &config)
            .iter()
            .map(|s| s * 0.05)
            .collect();
        assert!(detector.detect_block(&quiet_mark));
    }
}
