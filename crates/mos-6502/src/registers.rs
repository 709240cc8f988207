//! 6502 register file.

use crate::flags::{I, Status};

/// A, X, Y, S, PC and P.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    /// Stack pointer. The stack lives at $0100-$01FF.
    pub s: u8,
    pub pc: u16,
    pub p: Status,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Power-on values. A, X and Y are really undefined; zero keeps runs
    /// reproducible.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0xFD,
            pc: 0,
            p: Status(I),
        }
    }

    /// Address for the next push, post-decrementing S within page 1.
    pub fn push_addr(&mut self) -> u16 {
        let addr = 0x0100 | u16::from(self.s);
        self.s = self.s.wrapping_sub(1);
        addr
    }

    /// Address for the next pull, pre-incrementing S within page 1.
    pub fn pull_addr(&mut self) -> u16 {
        self.s = self.s.wrapping_add(1);
        0x0100 | u16::from(self.s)
    }
}
