//! Integrity code over payload and counter.

/// A deterministic 16-bit integrity function.
///
/// Sender and receiver must use the same implementation. It has to be order
/// sensitive so that transposed bytes are detected.
pub trait Checksum {
    fn checksum(&self, data: &[u8]) -> u16;
}

/// CRC-16/XMODEM: polynomial 0x1021, initial value 0, no reflection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Crc16;

impl Checksum for Crc16 {
    fn checksum(&self, data: &[u8]) -> u16 {
        crc16(data)
    }
}

impl<F> Checksum for F
where
    F: Fn(&[u8]) -> u16,
{
    fn checksum(&self, data: &[u8]) -> u16 {
        self(data)
    }
}

/// CRC-16/XMODEM of `data`.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}
