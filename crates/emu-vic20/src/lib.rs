//! PAL Commodore VIC-20 emulator.
//!
//! A 6502 at 1,108,405 Hz, two 6522 VIAs, the 6561 VIC and a high-level
//! serial disk drive. The machine is stepped an instruction at a time; one
//! frame is 312 raster lines x 71 cycles = 22,152 CPU cycles (~50 Hz).
//!
//! ROM images are supplied by the host through [`Roms`]; none are bundled.

mod bus;
pub mod cartridge;
pub mod config;
mod error;
pub mod input;
mod keyboard;
mod memory;
pub mod prg;
mod vic20;

pub use bus::Vic20Bus;
pub use cartridge::Cartridge;
pub use config::{RamExpansion, Roms, Vic20Config};
pub use error::{Result, Vic20Error};
pub use input::{Joy, VicKey};
pub use keyboard::KeyboardMatrix;
pub use memory::{CARTRIDGE_SIZE, EXPANSION_BLOCK_SIZES, EXPANSION_BLOCKS, Vic20Memory};
pub use vic20::{MAX_BOOT_FRAMES, Vic20};

pub use drive_iec::{FsStorage, StorageProvider};
