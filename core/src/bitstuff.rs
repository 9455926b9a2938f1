//! AX.25 bit-level framing: flag wrapping and "0 after five 1s" stuffing.
//!
//! Stuffing is a streaming bit-level transform. Runs of ones are tracked
//! across byte boundaries, output bits are packed LSB-first, and the final
//! partial byte is flushed as written. The opening and closing 0x7E flags
//! are byte-aligned in the output; the stuffed payload between them in
//! general is not.

use crate::error::{ModemError, Result};
use crate::{AX25_FLAG, STUFFED_CAPACITY};

/// LSB-first bit packer with a bounded output.
struct BitPacker {
    out: Vec<u8>,
    acc: u8,
    filled: u8,
    capacity: usize,
}

impl BitPacker {
    fn new(capacity: usize) -> Self {
        Self {
            out: Vec::new(),
            acc: 0,
            filled: 0,
            capacity,
        }
    }

    fn push_bit(&mut self, bit: bool) -> Result<()> {
        if bit {
            self.acc |= 1 << self.filled;
        }
        self.filled += 1;
        if self.filled == 8 {
            self.push_byte(self.acc)?;
            self.acc = 0;
            self.filled = 0;
        }
        Ok(())
    }

    fn push_byte(&mut self, byte: u8) -> Result<()> {
        if self.out.len() >= self.capacity {
            return Err(ModemError::EncodeOverflow(self.capacity));
        }
        self.out.push(byte);
        Ok(())
    }

    /// Flush the partial byte, remaining bits left as written.
    fn finish(mut self) -> Result<Vec<u8>> {
        if self.filled > 0 {
            self.push_byte(self.acc)?;
        }
        Ok(self.out)
    }
}

/// Stuff `payload` and wrap it in flag bytes.
///
/// Fails with [`ModemError::EncodeOverflow`] when the stuffed frame would
/// exceed [`STUFFED_CAPACITY`] bytes.
pub fn stuff_frame(payload: &[u8]) -> Result<Vec<u8>> {
    let mut packer = BitPacker::new(STUFFED_CAPACITY);
    packer.push_byte(AX25_FLAG)?;

    let mut ones = 0u8;
    for &byte in payload {
        for j in 0..8 {
            let bit = byte & (1 << j) != 0;
            ones = if bit { ones + 1 } else { 0 };
            packer.push_bit(bit)?;
            if ones == 5 {
                packer.push_bit(false)?;
                ones = 0;
            }
        }
    }

    let mut out = packer.finish()?;
    if out.len() >= STUFFED_CAPACITY {
        return Err(ModemError::EncodeOverflow(STUFFED_CAPACITY));
    }
    out.push(AX25_FLAG);
    Ok(out)
}

/// Inverse of [`stuff_frame`]: strip the flags, drop each 0 that follows
/// five consecutive 1s, and return the complete payload bytes. Trailing
/// pad bits from the transmit-side partial-byte flush are discarded.
///
/// Six consecutive 1s inside the payload area can only be a flag or abort
/// pattern and is rejected as [`ModemError::InvalidStuffing`].
pub fn destuff_frame(stuffed: &[u8]) -> Result<Vec<u8>> {
    let inner = match stuffed {
        [AX25_FLAG, inner @ .., AX25_FLAG] => inner,
        _ => return Err(ModemError::InvalidStuffing),
    };

    let mut bits = Vec::with_capacity(inner.len() * 8);
    let mut ones = 0u8;
    for &byte in inner {
        for j in 0..8 {
            let bit = byte & (1 << j) != 0;
            if bit {
                ones += 1;
                if ones == 6 {
                    return Err(ModemError::InvalidStuffing);
                }
                bits.push(true);
            } else {
                if ones == 5 {
                    ones = 0;
                    continue; // stuffed zero
                }
                ones = 0;
                bits.push(false);
            }
        }
    }

    let mut out = Vec::with_capacity(bits.len() / 8);
    for chunk in bits.chunks_exact(8) {
        let mut byte = 0u8;
        for (j, &bit) in chunk.iter().enumerate() {
            if bit {
                byte |= 1 << j;
            }
        }
        out.push(byte);
    }
    Ok(out)
}

/// Number of five-ones runs in `payload`, counted the way the stuffer
/// counts them (run counter resets after each insertion).
pub fn count_stuff_points(payload: &[u8]) -> usize {
    let mut ones = 0u8;
    let mut runs = 0usize;
    for &byte in payload {
        for j in 0..8 {
            if byte & (1 << j) != 0 {
                ones += 1;
                if ones == 5 {
                    runs += 1;
                    ones = 0;
                }
            } else {
                ones = 0;
            }
        }
    }
    runs
}
