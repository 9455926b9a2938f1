//! CRC-16-CCITT frame check sequence generation and validation.
//!
//! MSB-first per-bit processing, initial value 0xFFFF, polynomial 0x1021.
//! A received frame is accepted when the CRC computed over the whole frame,
//! trailing FCS bytes included, lands on the residue constant 0xF0B8.

/// Residue of a well-formed frame including its FCS.
pub const CRC_RESIDUE: u16 = 0xF0B8;

/// `CRC_RESIDUE` divided by x^16 modulo the polynomial. Shifting any
/// 16-bit word through the register multiplies it by x^16, so appending
/// `crc16_ccitt(payload) ^ FCS_XOR` leaves the receiver at `CRC_RESIDUE`.
const FCS_XOR: u16 = 0x8FD3;

/// CRC-16-CCITT over `data`, init 0xFFFF, poly 0x1021, MSB-first.
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Frame check sequence for `payload`, to be appended high byte first.
pub fn fcs(payload: &[u8]) -> [u8; 2] {
    let word = crc16_ccitt(payload) ^ FCS_XOR;
    [(word >> 8) as u8, word as u8]
}

/// Validate a candidate frame that still carries its trailing FCS bytes.
pub fn check_frame(frame: &[u8]) -> bool {
    frame.len() >= 3 && crc16_ccitt(frame) == CRC_RESIDUE
}
