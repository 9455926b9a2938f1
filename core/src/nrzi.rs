//! NRZI line coding: a logical 0 toggles the line level, a 1 holds it.
//!
//! Level state is initialized high (mark) and persists only for one
//! contiguous transmission or reception run; call `reset` between runs.

/// NRZI encoder holding the current line level.
#[derive(Debug)]
pub struct NrziEncoder {
    level: bool,
}

impl NrziEncoder {
    pub fn new() -> Self {
        Self { level: true }
    }

    pub fn reset(&mut self) {
        self.level = true;
    }

    /// Encode one logical bit into a line level.
    pub fn encode_bit(&mut self, bit: bool) -> bool {
        if !bit {
            self.level = !self.level;
        }
        self.level
    }

    /// Encode a byte sequence, LSB-first, into line levels.
    pub fn encode_bytes(&mut self, bytes: &[u8]) -> Vec<bool> {
        let mut levels = Vec::with_capacity(bytes.len() * 8);
        for &byte in bytes {
            for j in 0..8 {
                levels.push(self.encode_bit(byte & (1 << j) != 0));
            }
        }
        levels
    }
}

impl Default for NrziEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// NRZI decoder holding the previous line level.
#[derive(Debug)]
pub struct NrziDecoder {
    last: bool,
}

impl NrziDecoder {
    pub fn new() -> Self {
        Self { last: true }
    }

    pub fn reset(&mut self) {
        self.last = true;
    }

    /// Recover the logical bit from an incoming line level: 1 when the
    /// level held, 0 when it transitioned.
    pub fn decode_bit(&mut self, level: bool) -> bool {
        let bit = !(self.last ^ level);
        self.last = level;
        bit
    }
}

impl Default for NrziDecoder {
    fn default() -> Self {
        Self::new()
    }
}
