//! Cartridge image parser.
//!
//! A VIC-20 cartridge is a raw 4K or 8K ROM dump for one of the four
//! cartridge windows ($2000, $4000, $6000, $A000). Many dumps carry a
//! two-byte load address in front, like a PRG.

use crate::error::{Result, Vic20Error};
use crate::memory::CARTRIDGE_SIZE;

/// Smallest image accepted.
const HALF_SIZE: usize = CARTRIDGE_SIZE / 2;

/// A cartridge ready to be plugged into a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cartridge {
    /// Address the image was loaded for.
    pub address: u16,
    /// Window: 0 = $2000, 1 = $4000, 2 = $6000, 3 = $A000.
    pub slot: usize,
    /// Full 8K window contents. A 4K image appears twice.
    pub image: Box<[u8]>,
}

impl Cartridge {
    /// Parse `data` for the window at `address`.
    ///
    /// With no `address`, or with a 4098/8194-byte image, the first two
    /// bytes are taken as a little-endian load address. Leading bytes are
    /// then dropped until exactly 4K or 8K remain. Addresses other than
    /// $2000/$4000/$6000 select the $A000 window.
    pub fn parse(data: &[u8], address: Option<u16>) -> Result<Self> {
        let (address, body) = match address {
            Some(addr) if data.len() != HALF_SIZE + 2 && data.len() != CARTRIDGE_SIZE + 2 => {
                (addr, data)
            }
            _ => match data {
                [lo, hi, rest @ ..] => (u16::from_le_bytes([*lo, *hi]), rest),
                _ => return Err(Vic20Error::CartridgeTooShort(data.len())),
            },
        };

        let slot = match address {
            0x2000 => 0,
            0x4000 => 1,
            0x6000 => 2,
            _ => 3,
        };

        let rom = if body.len() >= CARTRIDGE_SIZE {
            &body[body.len() - CARTRIDGE_SIZE..]
        } else if body.len() >= HALF_SIZE {
            &body[body.len() - HALF_SIZE..]
        } else {
            return Err(Vic20Error::CartridgeTooShort(data.len()));
        };

        let image: Box<[u8]> = if rom.len() == HALF_SIZE {
            [rom, rom].concat().into_boxed_slice()
        } else {
            rom.into()
        };

        Ok(Self {
            address,
            slot,
            image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i >> 8) as u8).collect()
    }

    #[test]
    fn header_read_when_no_address_given() {
        let mut data = vec![0x00, 0xA0];
        data.extend(rom(CARTRIDGE_SIZE));
        let cart = Cartridge::parse(&data, None).expect("parse");
        assert_eq!(cart.address, 0xA000);
        assert_eq!(cart.slot, 3);
        assert_eq!(cart.image.len(), CARTRIDGE_SIZE);
        assert_eq!(cart.image[0x100], 1);
    }

    #[test]
    fn header_size_overrides_given_address() {
        let mut data = vec![0x00, 0x60];
        data.extend(rom(HALF_SIZE));
        let cart = Cartridge::parse(&data, Some(0xA000)).expect("parse");
        assert_eq!(cart.address, 0x6000);
        assert_eq!(cart.slot, 2);
    }

    #[test]
    fn raw_image_at_given_address() {
        let cart = Cartridge::parse(&rom(CARTRIDGE_SIZE), Some(0x2000)).expect("parse");
        assert_eq!(cart.address, 0x2000);
        assert_eq!(cart.slot, 0);
        assert_eq!(cart.image.len(), CARTRIDGE_SIZE);
    }

    #[test]
    fn four_k_image_is_mirrored() {
        let cart = Cartridge::parse(&rom(HALF_SIZE), Some(0x4000)).expect("parse");
        assert_eq!(cart.slot, 1);
        assert_eq!(cart.image.len(), CARTRIDGE_SIZE);
        assert_eq!(cart.image[..HALF_SIZE], cart.image[HALF_SIZE..]);
        assert_eq!(cart.image[HALF_SIZE + 0x300], 3);
    }

    #[test]
    fn leading_bytes_are_skipped() {
        let mut data = vec![0xEE; 100];
        data.extend(rom(HALF_SIZE));
        let cart = Cartridge::parse(&data, Some(0xA000)).expect("parse");
        assert_eq!(cart.image[0], 0);
        assert_eq!(cart.image[0xFFF], 0x0F);
    }

    #[test]
    fn other_addresses_select_the_a000_window() {
        let cart = Cartridge::parse(&rom(CARTRIDGE_SIZE), Some(0x1234)).expect("parse");
        assert_eq!(cart.slot, 3);
    }

    #[test]
    fn short_images_are_rejected() {
        assert!(matches!(
            Cartridge::parse(&rom(4000), Some(0xA000)),
            Err(Vic20Error::CartridgeTooShort(4000))
        ));
        assert!(matches!(
            Cartridge::parse(&[0x00], None),
            Err(Vic20Error::CartridgeTooShort(1))
        ));
    }
}
