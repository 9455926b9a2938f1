//! KISS serial framing: FEND-delimited frames with FESC transposition,
//! as spoken between a host application and the modem.

use crate::error::{ModemError, Result};
use crate::KISS_DATA_FRAME;

pub const FEND: u8 = 0xC0;
pub const FESC: u8 = 0xDB;
pub const TFEND: u8 = 0xDC;
pub const TFESC: u8 = 0xDD;

/// Wrap a payload as a KISS data frame: FEND, command byte, escaped
/// payload, FEND.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 3);
    out.push(FEND);
    out.push(KISS_DATA_FRAME);
    for &byte in payload {
        match byte {
            FEND => out.extend_from_slice(&[FESC, TFEND]),
            FESC => out.extend_from_slice(&[FESC, TFESC]),
            _ => out.push(byte),
        }
    }
    out.push(FEND);
    out
}

/// Unwrap one complete KISS frame: strip the delimiters, undo the
/// escapes, and hand back command byte plus payload.
pub fn unframe(raw: &[u8]) -> Result<Vec<u8>> {
    let inner = match raw {
        [FEND, inner @ .., FEND] => inner,
        _ => return Err(ModemError::InvalidKissFrame),
    };
    let mut out = Vec::with_capacity(inner.len());
    let mut escaped = false;
    for &byte in inner {
        if escaped {
            match byte {
                TFEND => out.push(FEND),
                TFESC => out.push(FESC),
                _ => return Err(ModemError::InvalidKissFrame),
            }
            escaped = false;
        } else if byte == FESC {
            escaped = true;
        } else if byte == FEND {
            return Err(ModemError::InvalidKissFrame);
        } else {
            out.push(byte);
        }
    }
    if escaped || out.is_empty() {
        return Err(ModemError::InvalidKissFrame);
    }
    Ok(out)
}

/// Incremental deframer for a serial byte stream. Bytes outside a
/// FEND pair are discarded, back-to-back FENDs collapse, and a bad
/// escape drops the frame in progress.
#[derive(Default)]
pub struct KissDeframer {
    inside: bool,
    escaped: bool,
    frame: Vec<u8>,
}

impl KissDeframer {
    pub fn new() -> Self {
        KissDeframer::default()
    }

    pub fn reset(&mut self) {
        self.inside = false;
        self.escaped = false;
        self.frame.clear();
    }

    /// Feed received bytes; returns the command-plus-payload of every
    /// frame completed by this chunk.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        for &byte in bytes {
            match byte {
                FEND => {
                    if self.inside && !self.frame.is_empty() && !self.escaped {
                        frames.push(std::mem::take(&mut self.frame));
                    }
                    self.inside = true;
                    self.escaped = false;
                    self.frame.clear();
                }
                _ if !self.inside => {}
                FESC => self.escaped = true,
                _ if self.escaped => {
                    self.escaped = false;
                    match byte {
                        TFEND => self.frame.push(FEND),
                        TFESC => self.frame.push(FESC),
                        // bad escape, discard the frame in progress
                        _ => {
                            self.inside = false;
                            self.frame.clear();
                        }
                    }
                }
                _ => self.frame.push(byte),
            }
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_plain_payload() {
        assert_eq!(
            frame(&[0x82, 0xA0, 0x40]),
            vec![FEND, 0x00, 0x82, 0xA0, 0x40, FEND]
        );
    }

    #[test]
    fn test_frame_escapes_reserved_bytes() {
        assert_eq!(
            frame(&[FEND, 0x01, FESC]),
            vec![FEND, 0x00, FESC, TFEND, 0x01, FESC, TFESC, FEND]
        );
    }

    #[test]
    fn test_unframe_roundtrip() {
        let payload = [0x00u8, FEND, FESC, 0x7E, 0xFF];
        let wire = frame(&payload);
        let mut expected = vec![KISS_DATA_FRAME];
        expected.extend_from_slice(&payload);
        assert_eq!(unframe(&wire).unwrap(), expected);
    }

    #[test]
    fn test_unframe_rejects_missing_delimiters() {
        assert_eq!(unframe(&[0x00, 0x01]), Err(ModemError::InvalidKissFrame));
        assert_eq!(unframe(&[FEND, 0x00, 0x01]), Err(ModemError::InvalidKissFrame));
        assert_eq!(unframe(&[FEND, FEND]), Err(ModemError::InvalidKissFrame));
    }

    #[test]
    fn test_unframe_rejects_bad_escape() {
        assert_eq!(
            unframe(&[FEND, 0x00, FESC, 0x42, FEND]),
            Err(ModemError::InvalidKissFrame)
        );
        assert_eq!(
            unframe(&[FEND, 0x00, FESC, FEND]),
            Err(ModemError::InvalidKissFrame)
        );
    }

    #[test]
    fn test_deframer_single_frame_split_across_chunks() {
        let wire = frame(&[0x11, FEND, 0x33]);
        let mut deframer = KissDeframer::new();
        let mut frames = Vec::new();
        for chunk in wire.chunks(2) {
            frames.extend(deframer.push_bytes(chunk));
        }
        assert_eq!(frames, vec![vec![0x00, 0x11, FEND, 0x33]]);
    }

    #[test]
    fn test_deframer_skips_noise_between_frames() {
        let mut wire = vec![0xAA, 0xBB];
        wire.extend(frame(&[0x01]));
        wire.extend([FEND, FEND, FEND]);
        wire.extend(frame(&[0x02]));
        let mut deframer = KissDeframer::new();
        assert_eq!(
            deframer.push_bytes(&wire),
            vec![vec![0x00, 0x01], vec![0x00, 0x02]]
        );
    }

    #[test]
    fn test_deframer_drops_frame_on_bad_escape() {
        let mut wire = vec![FEND, 0x00, FESC, 0x42, FEND];
        wire.extend(frame(&[0x07]));
        let mut deframer = KissDeframer::new();
        // the FEND that ends the bad frame opens the next one
        assert_eq!(deframer.push_bytes(&wire), vec![vec![0x00, 0x07]]);
    }
}
