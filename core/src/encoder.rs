//! AX.25 transmit path: one KISS data frame in, one PTT-gated audio
//! burst out.
//!
//! `transmit` is fully synchronous: it returns only after the whole
//! burst, settling intervals included, has been pushed into the sink.
//! Frame validation and encoding happen before PTT is touched, so a
//! rejected frame has no side effects.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;

use crate::bitstuff;
use crate::config::ModemConfig;
use crate::crc;
use crate::error::{ModemError, Result};
use crate::nrzi::NrziEncoder;
use crate::tone::{SampleSink, Tone, ToneSynthesizer, DAC_MIDPOINT};
use crate::{AX25_FLAG, KISS_DATA_FRAME, NRZI_BIT_CAPACITY};

/// Push-to-talk key line plus its status indicator; written only from
/// the transmit sequence.
pub trait PttLine {
    fn set_ptt(&mut self, keyed: bool);
}

/// Single-transmission guard. Cloning yields a handle onto the same gate,
/// so another logical context can observe or contend for the transmitter.
#[derive(Clone, Default)]
pub struct TxGate(Arc<AtomicBool>);

impl TxGate {
    pub fn try_acquire(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub struct AfskTransmitter {
    config: ModemConfig,
    synth: ToneSynthesizer,
    gate: TxGate,
}

impl AfskTransmitter {
    pub fn new(config: &ModemConfig) -> Result<Self> {
        let synth = ToneSynthesizer::new(config)?;
        Ok(Self {
            config: config.clone(),
            synth,
            gate: TxGate::default(),
        })
    }

    /// Handle onto the transmit gate, for callers that need to observe
    /// or test the busy state from another logical context.
    pub fn gate(&self) -> TxGate {
        self.gate.clone()
    }

    /// Strip the KISS command byte, append the FCS, stuff, and
    /// NRZI-encode one frame into line levels.
    ///
    /// A keyup flag precedes the frame: a receiver that held a constant
    /// line level misreads the first bit after the transition, so the
    /// leading flag absorbs that and the frame's own opening flag
    /// arrives on a synchronized decoder.
    pub fn encode_levels(&self, kiss_frame: &[u8]) -> Result<Vec<bool>> {
        let payload = unwrap_kiss(kiss_frame)?;

        let mut frame = payload.to_vec();
        frame.extend_from_slice(&crc::fcs(payload));

        let stuffed = bitstuff::stuff_frame(&frame)?;

        let mut nrzi = NrziEncoder::new();
        let mut levels = nrzi.encode_bytes(&[AX25_FLAG]);
        levels.extend(nrzi.encode_bytes(&stuffed));
        if levels.len() > NRZI_BIT_CAPACITY {
            return Err(ModemError::EncodeOverflow(NRZI_BIT_CAPACITY));
        }
        Ok(levels)
    }

    /// Transmit one KISS data frame as a modulated audio burst.
    ///
    /// At most one transmission runs at a time; a call while the gate is
    /// held fails with [`ModemError::TransmitBusy`] instead of queueing.
    pub fn transmit<S: SampleSink, P: PttLine>(
        &mut self,
        kiss_frame: &[u8],
        sink: &mut S,
        ptt: &mut P,
    ) -> Result<()> {
        if !self.synth.is_ready() {
            return Err(ModemError::NotInitialized);
        }

        // Reject malformed or oversized frames before keying anything.
        let levels = self.encode_levels(kiss_frame)?;

        if !self.gate.try_acquire() {
            return Err(ModemError::TransmitBusy);
        }

        debug!("transmitting {} bit cells", levels.len());
        ptt.set_ptt(true);
        self.settle(sink);

        for &level in &levels {
            self.synth.emit_bit(Tone::from_level(level), sink);
        }

        self.settle(sink);
        self.synth.force_idle(sink);
        ptt.set_ptt(false);
        self.gate.release();
        Ok(())
    }

    /// Replace modem parameters; goes through the synthesizer's
    /// pause/swap/resume critical section.
    pub fn reconfigure(&mut self, config: ModemConfig) -> Result<()> {
        self.synth.reconfigure(&config)?;
        self.config = config;
        Ok(())
    }

    /// Release the tone table; subsequent transmissions fail with
    /// [`ModemError::NotInitialized`] until a successful `reconfigure`.
    pub fn end(&mut self) {
        self.synth.clear();
    }

    /// PTT settling interval rendered as midpoint samples, paced at the
    /// mark-tone sample rate.
    fn settle<S: SampleSink>(&self, sink: &mut S) {
        let per_second = self.config.mark_freq as u64 * self.config.samples_per_cycle as u64;
        let count = per_second * self.config.tx_delay_ms as u64 / 1000;
        for _ in 0..count {
            sink.write_sample(DAC_MIDPOINT);
        }
    }
}

fn unwrap_kiss(frame: &[u8]) -> Result<&[u8]> {
    match frame.split_first() {
        Some((&KISS_DATA_FRAME, payload)) if !payload.is_empty() => Ok(payload),
        _ => Err(ModemError::InvalidKissFrame),
    }
}
