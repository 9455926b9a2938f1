//! Tone-table waveform synthesis and the per-bit sample clock.
//!
//! One sine table covers both tones; the frequency difference comes from
//! the rate the table is walked at. On every bit boundary the tick
//! interval is recomputed for the new tone, but the table index is never
//! reset, so the waveform stays phase-continuous across bit boundaries.

use std::f32::consts::PI;

use crate::config::ModemConfig;
use crate::error::Result;

/// Timer frequency the tick intervals are computed against, 10 MHz
/// (an 80 MHz reference clock behind a divide-by-8 prescaler).
pub const TIMER_FREQ: u64 = 10_000_000;

/// Midpoint of the 8-bit output range; the line rests here.
pub const DAC_MIDPOINT: u8 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Mark,
    Space,
}

impl Tone {
    /// Tone for an NRZI line level: high is mark, low is space.
    pub fn from_level(level: bool) -> Self {
        if level {
            Tone::Mark
        } else {
            Tone::Space
        }
    }
}

/// Output device for quantized waveform samples.
///
/// `write_sample` is called from the time-critical sample-clock context
/// and must complete in bounded, short time: no allocation, no logging.
/// A real-time sink paces the caller by blocking for its sample period,
/// which is also the cooperative suspension point of a transmission; an
/// in-memory sink simply records.
pub trait SampleSink {
    fn write_sample(&mut self, sample: u8);
}

impl SampleSink for Vec<u8> {
    fn write_sample(&mut self, sample: u8) {
        self.push(sample);
    }
}

/// Single-cycle sine table walked by the sample clock.
///
/// The table and the sample index are owned here exclusively. Emission is
/// pausable; `reconfigure` regenerates the table under a pause/swap/resume
/// sequence so the clock never observes a half-built table, and a cleared
/// synthesizer holds the output at midpoint instead of emitting garbage.
pub struct ToneSynthesizer {
    table: Vec<u8>,
    index: usize,
    paused: bool,
    current: Tone,
    ticks_per_sample: u64,
    mark_freq: u32,
    space_freq: u32,
    baud_rate: u32,
    samples_per_cycle: usize,
}

impl ToneSynthesizer {
    pub fn new(config: &ModemConfig) -> Result<Self> {
        config.validate()?;
        let mut synth = Self {
            table: generate_table(config.samples_per_cycle, config.amplitude),
            index: 0,
            paused: false,
            current: Tone::Mark,
            ticks_per_sample: 0,
            mark_freq: config.mark_freq,
            space_freq: config.space_freq,
            baud_rate: config.baud_rate,
            samples_per_cycle: config.samples_per_cycle,
        };
        synth.set_tone(Tone::Mark);
        Ok(synth)
    }

    /// True once a table is present; a cleared synthesizer only emits
    /// midpoint.
    pub fn is_ready(&self) -> bool {
        !self.table.is_empty()
    }

    fn freq_of(&self, tone: Tone) -> u32 {
        match tone {
            Tone::Mark => self.mark_freq,
            Tone::Space => self.space_freq,
        }
    }

    /// Select the tone for the next bit. Recomputes the tick interval for
    /// the new frequency; the table index is deliberately left alone.
    pub fn set_tone(&mut self, tone: Tone) {
        self.current = tone;
        let denom = self.freq_of(tone) as u64 * self.samples_per_cycle as u64;
        self.ticks_per_sample = TIMER_FREQ / denom;
    }

    /// Timer ticks between samples at the current tone. A hardware port
    /// programs its periodic alarm with this value on every bit boundary.
    pub fn ticks_per_sample(&self) -> u64 {
        self.ticks_per_sample
    }

    /// Samples emitted for one bit period at the current tone.
    pub fn samples_per_bit(&self) -> usize {
        let per_second = self.freq_of(self.current) as u64 * self.samples_per_cycle as u64;
        ((per_second + self.baud_rate as u64 / 2) / self.baud_rate as u64) as usize
    }

    /// One sample-clock tick: emit the next table value and advance.
    pub fn tick<S: SampleSink>(&mut self, sink: &mut S) {
        if self.paused || self.table.is_empty() {
            sink.write_sample(DAC_MIDPOINT);
            return;
        }
        sink.write_sample(self.table[self.index]);
        self.index = (self.index + 1) % self.table.len();
    }

    /// Emit one full bit period of the given tone.
    pub fn emit_bit<S: SampleSink>(&mut self, tone: Tone, sink: &mut S) {
        self.set_tone(tone);
        for _ in 0..self.samples_per_bit() {
            self.tick(sink);
        }
    }

    /// Force the output to midpoint without disturbing the index.
    pub fn force_idle<S: SampleSink>(&self, sink: &mut S) {
        sink.write_sample(DAC_MIDPOINT);
    }

    /// Replace amplitude and table parameters atomically with respect to
    /// the sample clock: emission is paused, the table swapped wholesale,
    /// then emission resumed. Validation failures leave the old state
    /// untouched.
    pub fn reconfigure(&mut self, config: &ModemConfig) -> Result<()> {
        config.validate()?;
        self.paused = true;
        self.table = generate_table(config.samples_per_cycle, config.amplitude);
        self.mark_freq = config.mark_freq;
        self.space_freq = config.space_freq;
        self.baud_rate = config.baud_rate;
        self.samples_per_cycle = config.samples_per_cycle;
        self.index %= self.table.len();
        self.set_tone(self.current);
        self.paused = false;
        Ok(())
    }

    /// Release the table; subsequent ticks hold the line at midpoint
    /// until a successful `reconfigure`.
    pub fn clear(&mut self) {
        self.table.clear();
        self.index = 0;
    }

    #[cfg(test)]
    pub(crate) fn sample_index(&self) -> usize {
        self.index
    }
}

/// One sine cycle quantized to 8 bits, centered at midpoint and scaled by
/// the amplitude fraction.
fn generate_table(samples_per_cycle: usize, amplitude: f32) -> Vec<u8> {
    (0..samples_per_cycle)
        .map(|i| {
            let angle = 2.0 * PI * i as f32 / samples_per_cycle as f32;
            (DAC_MIDPOINT as f32 + amplitude * 127.0 * angle.sin()) as u8
        })
        .collect()
}

/// Uniform-rate rendering of an NRZI level stream.
///
/// The alternative output path for targets without a per-sample timer:
/// the same tone contract as [`ToneSynthesizer`], produced as float
/// samples at the receive sample rate with a continuous phase
/// accumulator. Each bit spans exactly one detector block, because the
/// demodulator has no bit-clock recovery and block-aligned pacing keeps
/// file and in-memory paths self-consistent; over-the-air timing belongs
/// to the timer-driven synthesizer instead.
pub struct WaveformRenderer {
    phase: f32,
    step_mark: f32,
    step_space: f32,
    samples_per_bit: usize,
    amplitude: f32,
}

impl WaveformRenderer {
    pub fn new(config: &ModemConfig) -> Result<Self> {
        config.validate()?;
        let sample_rate = config.sample_rate as f32;
        Ok(Self {
            phase: 0.0,
            step_mark: 2.0 * PI * config.mark_freq as f32 / sample_rate,
            step_space: 2.0 * PI * config.space_freq as f32 / sample_rate,
            samples_per_bit: config.goertzel_block,
            amplitude: config.amplitude,
        })
    }

    pub fn samples_per_bit(&self) -> usize {
        self.samples_per_bit
    }

    /// Append one bit period of the level's tone.
    pub fn render_level(&mut self, level: bool, out: &mut Vec<f32>) {
        let step = match Tone::from_level(level) {
            Tone::Mark => self.step_mark,
            Tone::Space => self.step_space,
        };
        for _ in 0..self.samples_per_bit {
            out.push(self.amplitude * self.phase.sin());
            self.phase += step;
            if self.phase > 2.0 * PI {
                self.phase -= 2.0 * PI;
            }
        }
    }

    /// Render a whole level stream, phase-continuous across bits.
    pub fn render(&mut self, levels: &[bool]) -> Vec<f32> {
        let mut out = Vec::with_capacity(levels.len() * self.samples_per_bit);
        for &level in levels {
            self.render_level(level, &mut out);
        }
        out
    }
}
