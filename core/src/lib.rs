//! AFSK modem library bridging a KISS/AX.25 packet stream to radio audio
//!
//! Transmit path: AX.25 bit-stuffing, NRZI line coding and tone-table
//! waveform synthesis under a per-bit sample clock, gated by PTT.
//! Receive path: Goertzel dual-tone block detection, flag synchronization
//! with destuffing, and CRC-16-CCITT frame validation.

pub mod bitstuff;
pub mod config;
pub mod crc;
pub mod demod;
pub mod encoder;
pub mod error;
pub mod framesync;
pub mod goertzel;
pub mod kiss;
pub mod nrzi;
pub mod tone;

pub use config::ModemConfig;
pub use demod::{Demodulator, SampleSource};
pub use encoder::{AfskTransmitter, PttLine, TxGate};
pub use error::{ModemError, Result};
pub use framesync::FrameSync;
pub use goertzel::GoertzelDetector;
pub use kiss::KissDeframer;
pub use tone::{SampleSink, Tone, ToneSynthesizer, WaveformRenderer};

// Reference configuration (Bell 202 style 1200 baud AFSK)
pub const MARK_FREQ: u32 = 1200; // Hz
pub const SPACE_FREQ: u32 = 2200; // Hz
pub const BAUD_RATE: u32 = 1200; // bits/s
pub const SAMPLE_RATE: u32 = 9600; // Hz, receive side
pub const SAMPLES_PER_CYCLE: usize = 32; // per tone-table cycle, power of two
pub const GOERTZEL_BLOCK: usize = 64; // samples per detection block, power of two

/// AX.25 frame delimiter, 0b01111110.
pub const AX25_FLAG: u8 = 0x7E;

/// KISS command byte for a data frame on port 0.
pub const KISS_DATA_FRAME: u8 = 0x00;

/// Encode-side capacity for the stuffed frame, flags included.
pub const STUFFED_CAPACITY: usize = 600;

/// Encode-side capacity in NRZI bit cells.
pub const NRZI_BIT_CAPACITY: usize = STUFFED_CAPACITY * 8;

/// Receive-side frame buffer capacity in bytes; bits beyond this are dropped.
pub const FRAME_BUFFER_CAPACITY: usize = 330;
