//! Core traits shared by the VIC-20 emulation crates.
//!
//! The machine is instruction-stepped: the CPU executes one instruction at a
//! time and reports how many cycles it took. Every other chip is then
//! advanced by exactly that many cycles.

mod bus;
mod cpu;
mod observable;

pub use bus::{Bus, FlatBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value, parse_address};
