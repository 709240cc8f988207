//! NMOS 6502 CPU core.
//!
//! The CPU is stepped one instruction at a time through
//! [`emu_core::Cpu::step`], which returns the cycles the instruction took.
//! Interrupts are delivered by the caller between steps via `irq()` and
//! `nmi()`.
//!
//! Besides the documented instruction set the stable undocumented opcodes
//! are implemented (LAX, SAX, DCP, ISC, SLO, SRE, RLA, RRA, ANC, ALR, ARR,
//! SBX and the multi-byte NOPs). JAM and the unstable opcodes are consumed
//! and return zero cycles.

mod addressing;
mod cpu;
mod decode;
pub mod flags;
mod registers;

pub use cpu::Mos6502;
pub use flags::Status;
pub use registers::Registers;
