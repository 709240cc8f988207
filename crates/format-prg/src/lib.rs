//! Commodore PRG files.
//!
//! A PRG file is a 2-byte little-endian load address followed by the data
//! bytes.

use emu_core::Bus;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrgError {
    #[error("PRG too short: {0} bytes")]
    TooShort(usize),
}

/// A parsed PRG image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prg<'a> {
    pub load_address: u16,
    pub payload: &'a [u8],
}

impl<'a> Prg<'a> {
    /// Split `data` into load address and payload. At least one payload
    /// byte is required.
    pub fn parse(data: &'a [u8]) -> Result<Self, PrgError> {
        match data {
            [lo, hi, payload @ ..] if !payload.is_empty() => Ok(Self {
                load_address: u16::from_le_bytes([*lo, *hi]),
                payload,
            }),
            _ => Err(PrgError::TooShort(data.len())),
        }
    }

    /// First address past the payload. Wraps at $FFFF.
    #[must_use]
    pub fn end_address(&self) -> u16 {
        self.load_address.wrapping_add(self.payload.len() as u16)
    }

    /// Write the payload at its load address. Addresses wrap at $FFFF.
    pub fn load(&self, bus: &mut impl Bus) {
        let mut addr = self.load_address;
        for &byte in self.payload {
            bus.write(addr, byte);
            addr = addr.wrapping_add(1);
        }
    }
}
