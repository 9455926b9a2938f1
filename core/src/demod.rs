//! Receive pipeline: tone detection feeding the frame synchronizer,
//! with CRC screening of every candidate frame.

use log::{debug, trace};

use crate::config::ModemConfig;
use crate::crc;
use crate::error::Result;
use crate::framesync::FrameSync;
use crate::goertzel::GoertzelDetector;

/// Pull-based source of audio samples, one detector block at a time.
///
/// Implementations fill `buf` completely and return `Ok(true)`, or
/// return `Ok(false)` once the stream is exhausted.
pub trait SampleSource {
    fn read_block(&mut self, buf: &mut [f32]) -> Result<bool>;
}

/// Full receive chain. Feed it audio with [`push_samples`] or drain a
/// [`SampleSource`] with [`poll`]; validated frames come back with the
/// trailing FCS stripped.
///
/// [`push_samples`]: Demodulator::push_samples
/// [`poll`]: Demodulator::poll
pub struct Demodulator {
    detector: GoertzelDetector,
    sync: FrameSync,
    pending: Vec<f32>,
    block_len: usize,
    frames_ok: u64,
    frames_dropped: u64,
}

impl Demodulator {
    pub fn new(config: &ModemConfig) -> Result<Self> {
        let detector = GoertzelDetector::new(config)?;
        let block_len = detector.block_len();
        Ok(Demodulator {
            detector,
            sync: FrameSync::new(),
            pending: Vec::with_capacity(block_len),
            block_len,
            frames_ok: 0,
            frames_dropped: 0,
        })
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Frames that passed the CRC screen since construction or [`reset`].
    ///
    /// [`reset`]: Demodulator::reset
    pub fn frames_ok(&self) -> u64 {
        self.frames_ok
    }

    /// Candidate frames discarded by the CRC screen.
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }

    /// Drop partial state between unrelated recordings. Counters are
    /// cleared as well.
    pub fn reset(&mut self) {
        self.sync.reset();
        self.pending.clear();
        self.frames_ok = 0;
        self.frames_dropped = 0;
    }

    /// Run one complete detector block through the frame synchronizer.
    pub fn process_block(&mut self, block: &[f32]) -> Option<Vec<u8>> {
        debug_assert_eq!(block.len(), self.block_len);
        let level = self.detector.detect_block(block);
        trace!("block level {}", if level { 1 } else { 0 });
        let candidate = self.sync.push_level(level)?;
        self.screen(candidate)
    }

    /// Feed an arbitrary run of samples, buffering any partial block
    /// for the next call. Returns every frame validated along the way.
    pub fn push_samples(&mut self, samples: &[f32]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        let mut rest = samples;

        if !self.pending.is_empty() {
            let need = self.block_len - self.pending.len();
            let take = need.min(rest.len());
            self.pending.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.pending.len() < self.block_len {
                return frames;
            }
            let block = std::mem::take(&mut self.pending);
            frames.extend(self.process_block(&block));
        }

        let mut chunks = rest.chunks_exact(self.block_len);
        for block in &mut chunks {
            frames.extend(self.process_block(block));
        }
        self.pending.extend_from_slice(chunks.remainder());
        frames
    }

    /// Drain a sample source to exhaustion.
    pub fn poll<S: SampleSource>(&mut self, source: &mut S) -> Result<Vec<Vec<u8>>> {
        let mut frames = Vec::new();
        let mut block = vec![0.0f32; self.block_len];
        while source.read_block(&mut block)? {
            frames.extend(self.process_block(&block));
        }
        Ok(frames)
    }

    fn screen(&mut self, candidate: Vec<u8>) -> Option<Vec<u8>> {
        if crc::check_frame(&candidate) {
            self.frames_ok += 1;
            let mut frame = candidate;
            frame.truncate(frame.len() - 2);
            Some(frame)
        } else {
            self.frames_dropped += 1;
            debug!("dropping {}-byte candidate, bad check sequence", candidate.len());
            None
        }
    }
}
