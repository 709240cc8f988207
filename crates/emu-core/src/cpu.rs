//! CPU core trait.

use crate::Bus;

/// An instruction-stepped CPU.
///
/// Every entry point returns the number of CPU cycles it consumed, so the
/// owning machine can advance the other chips in lock-step. The bus is
/// passed in rather than owned so the machine can keep sole ownership of
/// memory and peripherals.
pub trait Cpu {
    /// Execute one instruction. Returns elapsed cycles.
    fn step<B: Bus>(&mut self, bus: &mut B) -> u32;

    /// Reset registers and load PC from the reset vector.
    fn reset<B: Bus>(&mut self, bus: &mut B) -> u32;

    /// Service a maskable interrupt. Returns 0 if the CPU ignored it.
    fn irq<B: Bus>(&mut self, bus: &mut B) -> u32;

    /// Service a non-maskable interrupt.
    fn nmi<B: Bus>(&mut self, bus: &mut B) -> u32;

    /// Current program counter.
    fn pc(&self) -> u16;

    /// Redirect execution.
    fn set_pc(&mut self, pc: u16);
}
