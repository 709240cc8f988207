//! Operand resolution for the 6502 addressing modes.
//!
//! Only architecturally visible accesses reach the bus. The dummy reads a
//! real 6502 performs on index-add cycles are skipped so that I/O registers
//! with read side effects (VIA port and timer registers) are not disturbed.

use emu_core::Bus;

use crate::Mos6502;
use crate::decode::Mode;

/// A resolved operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operand {
    None,
    Accumulator,
    Immediate(u8),
    Address(u16),
    Branch { target: u16, crossed: bool },
}

const fn page_crossed(a: u16, b: u16) -> bool {
    a & 0xFF00 != b & 0xFF00
}

impl Mos6502 {
    pub(crate) fn fetch(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    pub(crate) fn fetch_word(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.fetch(bus);
        let hi = self.fetch(bus);
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn read_word(bus: &mut impl Bus, addr: u16) -> u16 {
        let lo = bus.read(addr);
        let hi = bus.read(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    /// Word read whose high byte stays in the same page. Used by zero-page
    /// pointers and by JMP ($xxFF).
    fn read_word_in_page(bus: &mut impl Bus, addr: u16) -> u16 {
        let lo = bus.read(addr);
        let hi = bus.read((addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF));
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn push(&mut self, bus: &mut impl Bus, value: u8) {
        let addr = self.regs.push_addr();
        bus.write(addr, value);
    }

    pub(crate) fn pull(&mut self, bus: &mut impl Bus) -> u8 {
        let addr = self.regs.pull_addr();
        bus.read(addr)
    }

    pub(crate) fn push_word(&mut self, bus: &mut impl Bus, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.push(bus, hi);
        self.push(bus, lo);
    }

    pub(crate) fn pull_word(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        u16::from_le_bytes([lo, hi])
    }

    /// Consume the operand bytes for `mode`. The flag reports whether an
    /// indexed access crossed a page.
    pub(crate) fn resolve(&mut self, bus: &mut impl Bus, mode: Mode) -> (Operand, bool) {
        match mode {
            Mode::Implied => (Operand::None, false),
            Mode::Accumulator => (Operand::Accumulator, false),
            Mode::Immediate => (Operand::Immediate(self.fetch(bus)), false),
            Mode::ZeroPage => (Operand::Address(u16::from(self.fetch(bus))), false),
            Mode::ZeroPageX => {
                let zp = self.fetch(bus).wrapping_add(self.regs.x);
                (Operand::Address(u16::from(zp)), false)
            }
            Mode::ZeroPageY => {
                let zp = self.fetch(bus).wrapping_add(self.regs.y);
                (Operand::Address(u16::from(zp)), false)
            }
            Mode::Absolute => (Operand::Address(self.fetch_word(bus)), false),
            Mode::AbsoluteX => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(u16::from(self.regs.x));
                (Operand::Address(addr), page_crossed(base, addr))
            }
            Mode::AbsoluteY => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(u16::from(self.regs.y));
                (Operand::Address(addr), page_crossed(base, addr))
            }
            Mode::IndexedIndirect => {
                let zp = self.fetch(bus).wrapping_add(self.regs.x);
                let addr = Self::read_word_in_page(bus, u16::from(zp));
                (Operand::Address(addr), false)
            }
            Mode::IndirectIndexed => {
                let zp = self.fetch(bus);
                let base = Self::read_word_in_page(bus, u16::from(zp));
                let addr = base.wrapping_add(u16::from(self.regs.y));
                (Operand::Address(addr), page_crossed(base, addr))
            }
            Mode::Relative => {
                let offset = self.fetch(bus) as i8;
                let target = self.regs.pc.wrapping_add_signed(i16::from(offset));
                let crossed = page_crossed(self.regs.pc, target);
                (Operand::Branch { target, crossed }, false)
            }
            Mode::Indirect => {
                let ptr = self.fetch_word(bus);
                (Operand::Address(Self::read_word_in_page(bus, ptr)), false)
            }
        }
    }
}
