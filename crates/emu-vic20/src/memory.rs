//! VIC-20 memory: internal RAM, ROMs, colour RAM, RAM expansion blocks and
//! cartridge ROM.
//!
//! # Map
//!
//! | Range       | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | $0000-$03FF | 1K RAM                                                |
//! | $0400-$0FFF | expansion block 0 (3K)                                |
//! | $1000-$1FFF | 4K RAM                                                |
//! | $2000-$7FFF | cartridge 0-2, else expansion blocks 1-3              |
//! | $8000-$8FFF | character ROM                                         |
//! | $9000-$93FF | VIC and VIAs (decoded by the bus)                     |
//! | $9400-$97FF | colour RAM, 4 bits wide                               |
//! | $A000-$BFFF | cartridge 3, else expansion block 4                   |
//! | $C000-$DFFF | BASIC ROM                                             |
//! | $E000-$FFFF | KERNAL ROM                                            |
//!
//! Reads from nothing return the high byte of the address.

#![allow(clippy::cast_possible_truncation)]

use mos_vic_6561::VideoMemory;

use crate::config::Roms;
use crate::error::{Result, Vic20Error};

/// Sizes of expansion blocks 0-4.
pub const EXPANSION_BLOCK_SIZES: [usize; 5] = [0x0C00, 0x2000, 0x2000, 0x2000, 0x2000];
/// Number of expansion blocks.
pub const EXPANSION_BLOCKS: usize = EXPANSION_BLOCK_SIZES.len();
/// Cartridge windows: $2000, $4000, $6000, $A000.
pub const CARTRIDGE_SLOTS: usize = 4;
/// Each cartridge window is 8K.
pub const CARTRIDGE_SIZE: usize = 0x2000;

/// VIC-20 memory subsystem.
pub struct Vic20Memory {
    low_ram: Box<[u8; 0x400]>,
    high_ram: Box<[u8; 0x1000]>,
    /// Only the low nibble is wired; the full byte is stored.
    colour_ram: [u8; 0x400],
    expansion: [Option<Box<[u8]>>; EXPANSION_BLOCKS],
    cartridges: [Option<Box<[u8]>>; CARTRIDGE_SLOTS],
    kernal_rom: Vec<u8>,
    basic_rom: Vec<u8>,
    char_rom: Vec<u8>,
}

impl Vic20Memory {
    /// Build memory around the given ROM images. ROM sizes are checked.
    pub fn new(roms: Roms) -> Result<Self> {
        roms.validate()?;
        Ok(Self {
            low_ram: Box::new([0; 0x400]),
            high_ram: Box::new([0; 0x1000]),
            colour_ram: [0; 0x400],
            expansion: Default::default(),
            cartridges: Default::default(),
            kernal_rom: roms.kernal,
            basic_rom: roms.basic,
            char_rom: roms.character,
        })
    }

    /// CPU read. I/O space at $9000-$93FF is not decoded here.
    #[must_use]
    pub fn read(&self, addr: u16) -> u8 {
        let unmapped = (addr >> 8) as u8;
        let a = usize::from(addr);
        match addr >> 12 {
            0x0 if addr < 0x400 => self.low_ram[a],
            0x0 => self.expansion[0].as_ref().map_or(unmapped, |b| b[a - 0x400]),
            0x1 => self.high_ram[a & 0xFFF],
            0x2..=0x7 => {
                let slot = usize::from((addr >> 13) - 1);
                self.window(slot, slot + 1).map_or(unmapped, |b| b[a & 0x1FFF])
            }
            0x8 => self.char_rom[a & 0xFFF],
            0x9 if (0x9400..0x9800).contains(&addr) => self.colour_ram[a & 0x3FF] & 0x0F,
            0xA | 0xB => self.window(3, 4).map_or(unmapped, |b| b[a & 0x1FFF]),
            0xC | 0xD => self.basic_rom[a & 0x1FFF],
            0xE | 0xF => self.kernal_rom[a & 0x1FFF],
            _ => unmapped,
        }
    }

    /// CPU write. ROM and unmapped writes are dropped.
    pub fn write(&mut self, addr: u16, value: u8) {
        let a = usize::from(addr);
        match addr >> 12 {
            0x0 if addr < 0x400 => self.low_ram[a] = value,
            0x0 => {
                if let Some(block) = self.expansion[0].as_mut() {
                    block[a - 0x400] = value;
                }
            }
            0x1 => self.high_ram[a & 0xFFF] = value,
            0x2..=0x7 => {
                let block = usize::from(addr >> 13);
                self.write_expansion(block, a, value);
            }
            0x9 if (0x9400..0x9800).contains(&addr) => self.colour_ram[a & 0x3FF] = value,
            0xA | 0xB => self.write_expansion(4, a, value),
            _ => {}
        }
    }

    /// Cartridge in `slot` if present, otherwise expansion `block`.
    fn window(&self, slot: usize, block: usize) -> Option<&[u8]> {
        self.cartridges[slot]
            .as_deref()
            .or_else(|| self.expansion[block].as_deref())
    }

    /// Writes reach expansion RAM even while a cartridge hides it.
    fn write_expansion(&mut self, block: usize, addr: usize, value: u8) {
        if let Some(ram) = self.expansion[block].as_mut() {
            ram[addr & 0x1FFF] = value;
        }
    }

    /// Fit or remove expansion block `block` (0-4). A newly fitted block is
    /// zeroed; one already fitted keeps its contents.
    pub fn enable_block(&mut self, block: usize, enabled: bool) -> Result<()> {
        let slot = self
            .expansion
            .get_mut(block)
            .ok_or(Vic20Error::InvalidBlock(block))?;
        match (enabled, slot.is_some()) {
            (true, false) => {
                let size = EXPANSION_BLOCK_SIZES[block];
                let mut ram = Vec::new();
                ram.try_reserve_exact(size)
                    .map_err(|_| Vic20Error::Allocation { block, size })?;
                ram.resize(size, 0);
                *slot = Some(ram.into_boxed_slice());
                log::debug!("vic20: expansion block {block} fitted ({size} bytes)");
            }
            (false, true) => {
                *slot = None;
                log::debug!("vic20: expansion block {block} removed");
            }
            _ => {}
        }
        Ok(())
    }

    #[must_use]
    pub fn block_enabled(&self, block: usize) -> bool {
        self.expansion.get(block).is_some_and(Option::is_some)
    }

    /// Plug an 8K cartridge image into `slot` (0-3).
    pub(crate) fn insert_cartridge(&mut self, slot: usize, image: Box<[u8]>) {
        debug_assert_eq!(image.len(), CARTRIDGE_SIZE);
        self.cartridges[slot] = Some(image);
    }

    pub fn remove_cartridges(&mut self) {
        self.cartridges = Default::default();
    }

    #[must_use]
    pub fn has_cartridge(&self, slot: usize) -> bool {
        self.cartridges.get(slot).is_some_and(Option::is_some)
    }
}

impl VideoMemory for Vic20Memory {
    // The VIC only sees the internal RAM and colour RAM, never expansion.
    fn video_read(&self, addr: u16) -> u8 {
        if addr < 0x400 {
            self.low_ram[usize::from(addr)]
        } else {
            self.high_ram[usize::from(addr & 0xFFF)]
        }
    }

    fn colour_read(&self, offset: u16) -> u8 {
        self.colour_ram[usize::from(offset & 0x3FF)]
    }

    fn char_read(&self, addr: u16) -> u8 {
        match addr >> 12 {
            0x0 => self.low_ram[usize::from(addr & 0x3FF)],
            0x1 => self.high_ram[usize::from(addr & 0xFFF)],
            _ => self.char_rom[usize::from(addr & 0xFFF)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BASIC_SIZE, CHARACTER_SIZE, KERNAL_SIZE};

    fn memory() -> Vic20Memory {
        let mut character = vec![0; CHARACTER_SIZE];
        character[0x10] = 0x3C;
        let mut basic = vec![0; BASIC_SIZE];
        basic[0] = 0xBA;
        let mut kernal = vec![0; KERNAL_SIZE];
        kernal[0x1FFC] = 0x22;
        Vic20Memory::new(Roms {
            kernal,
            basic,
            character,
        })
        .expect("roms")
    }

    #[test]
    fn internal_ram_round_trips() {
        let mut mem = memory();
        for addr in [0x0000, 0x03FF, 0x1000, 0x1FFF] {
            mem.write(addr, 0x5A);
            assert_eq!(mem.read(addr), 0x5A, "{addr:04X}");
        }
    }

    #[test]
    fn missing_expansion_reads_high_byte() {
        let mut mem = memory();
        mem.write(0x0400, 0x11);
        assert_eq!(mem.read(0x0400), 0x04);
        assert_eq!(mem.read(0x2345), 0x23);
        assert_eq!(mem.read(0xA001), 0xA0);
        assert_eq!(mem.read(0x9800), 0x98);
    }

    #[test]
    fn expansion_blocks_round_trip() {
        let mut mem = memory();
        for block in 0..EXPANSION_BLOCKS {
            mem.enable_block(block, true).expect("enable");
        }
        for addr in [0x0400, 0x0FFF, 0x2000, 0x5555, 0x7FFF, 0xA000, 0xBFFF] {
            mem.write(addr, 0xC3);
            assert_eq!(mem.read(addr), 0xC3, "{addr:04X}");
        }
        mem.enable_block(2, false).expect("disable");
        assert!(!mem.block_enabled(2));
        assert_eq!(mem.read(0x5555), 0x55);
    }

    #[test]
    fn invalid_block_is_an_error() {
        let mut mem = memory();
        assert!(matches!(
            mem.enable_block(5, true),
            Err(Vic20Error::InvalidBlock(5))
        ));
    }

    #[test]
    fn re_enabling_keeps_contents() {
        let mut mem = memory();
        mem.enable_block(1, true).expect("enable");
        mem.write(0x2000, 0x42);
        mem.enable_block(1, true).expect("enable again");
        assert_eq!(mem.read(0x2000), 0x42);
    }

    #[test]
    fn cartridge_shadows_expansion_ram() {
        let mut mem = memory();
        mem.enable_block(4, true).expect("enable");
        mem.write(0xA000, 0x11);
        let mut image = vec![0; CARTRIDGE_SIZE].into_boxed_slice();
        image[0] = 0x99;
        mem.insert_cartridge(3, image);

        assert_eq!(mem.read(0xA000), 0x99);
        mem.write(0xA000, 0x22);
        assert_eq!(mem.read(0xA000), 0x99);

        mem.remove_cartridges();
        assert!(!mem.has_cartridge(3));
        assert_eq!(mem.read(0xA000), 0x22);
    }

    #[test]
    fn colour_ram_is_a_nibble() {
        let mut mem = memory();
        mem.write(0x9400, 0xAB);
        assert_eq!(mem.read(0x9400), 0x0B);
        assert_eq!(mem.read(0x97FF), 0x00);
        assert_eq!(mem.colour_read(0), 0xAB);
    }

    #[test]
    fn roms_are_read_only() {
        let mut mem = memory();
        mem.write(0xC000, 0);
        mem.write(0xFFFC, 0);
        mem.write(0x8010, 0);
        assert_eq!(mem.read(0xC000), 0xBA);
        assert_eq!(mem.read(0xFFFC), 0x22);
        assert_eq!(mem.read(0x8010), 0x3C);
    }

    #[test]
    fn vic_sees_internal_ram_and_char_rom() {
        let mut mem = memory();
        mem.write(0x1E00, 0x20);
        mem.write(0x0010, 0x81);
        assert_eq!(mem.video_read(0x1E00), 0x20);
        assert_eq!(mem.char_read(0x0010), 0x81);
        assert_eq!(mem.char_read(0x1E00), 0x20);
        assert_eq!(mem.char_read(0x8010), 0x3C);
    }
}
