//! MOS 6522 Versatile Interface Adapter (VIA).
//!
//! The 6522 provides two 8-bit I/O ports, two 16-bit timers, a shift
//! register, four handshake/control lines and an interrupt controller.
//! The VIC-20 has two: VIA1 at $9110 (user port, joystick, RESTORE on CA1,
//! serial ATN out) drives NMI, and VIA2 at $9120 (keyboard matrix, serial
//! CLK/DATA out, jiffy timer) drives IRQ.
//!
//! # Registers ($0-$F)
//!
//! | Reg | Name | Description                         |
//! |-----|------|-------------------------------------|
//! | $0  | ORB  | Port B data (handshake on access)   |
//! | $1  | ORA  | Port A data (handshake on access)   |
//! | $2  | DDRB | Port B data direction (1 = output)  |
//! | $3  | DDRA | Port A data direction (1 = output)  |
//! | $4  | T1CL | Timer 1 counter low (read clears T1 IRQ) |
//! | $5  | T1CH | Timer 1 counter high (write starts T1) |
//! | $6  | T1LL | Timer 1 latch low                   |
//! | $7  | T1LH | Timer 1 latch high                  |
//! | $8  | T2CL | Timer 2 counter low (read clears T2 IRQ) |
//! | $9  | T2CH | Timer 2 counter high (write starts T2) |
//! | $A  | SR   | Shift register                      |
//! | $B  | ACR  | Auxiliary control register           |
//! | $C  | PCR  | Peripheral control register          |
//! | $D  | IFR  | Interrupt flag register              |
//! | $E  | IER  | Interrupt enable register            |
//! | $F  | ORA  | Port A data (no handshake)           |
//!
//! # Port wiring
//!
//! What sits on the pins is machine-specific. Register accesses that touch
//! a port call back into a [`PortSink`] supplied by the caller: `port_in`
//! before a port is sampled, `port_out` after an output changes.

use emu_core::{Observable, Value};

/// A port or control line reported through [`PortSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    Pa,
    Pb,
    Ca2,
    Cb2,
}

/// Machine-side wiring for a VIA's pins.
///
/// Both methods default to doing nothing, so a sink only implements the
/// directions it cares about.
pub trait PortSink {
    /// Called before `port` is read. The sink may drive input pins with
    /// [`Via6522::set_pa`], [`Via6522::set_bit_pb`] and friends.
    fn port_in(&mut self, _via: &mut Via6522, _port: Port) {}

    /// Called after `port` was driven by a register write.
    fn port_out(&mut self, _via: &Via6522, _port: Port) {}
}

/// A sink with nothing connected.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unconnected;

impl PortSink for Unconnected {}

// IFR/IER bit masks
pub const IFR_CA2: u8 = 0x01;
pub const IFR_CA1: u8 = 0x02;
pub const IFR_SR: u8 = 0x04;
pub const IFR_CB2: u8 = 0x08;
pub const IFR_CB1: u8 = 0x10;
pub const IFR_T2: u8 = 0x20;
pub const IFR_T1: u8 = 0x40;

const ACR_T1_FREE_RUN: u8 = 0x40;
const ACR_T2_COUNT_PULSES: u8 = 0x20;

/// MOS 6522 Versatile Interface Adapter.
#[derive(Debug, Clone)]
pub struct Via6522 {
    /// Levels on the port A pins.
    pa: u8,
    /// Levels on the port B pins.
    pb: u8,
    /// Input latches as returned by reads of ORA/ORB.
    ira: u8,
    irb: u8,
    ora: u8,
    orb: u8,
    ddra: u8,
    ddrb: u8,

    /// Timer 1 counter. Signed so that a multi-cycle tick can overshoot
    /// zero and carry the remainder into the reload.
    t1_counter: i32,
    t1_latch: u16,
    /// One-shot T1 has already raised its interrupt.
    t1_fired: bool,

    t2_counter: i32,
    t2_latch_lo: u8,
    t2_fired: bool,

    sr: u8,
    /// Bits 7-6: T1 control, bit 5: T2 pulse counting, bits 4-2: SR mode.
    acr: u8,
    /// Bits 7-5: CB2 control, bit 4: CB1 edge, bits 3-1: CA2 control,
    /// bit 0: CA1 edge. Edge bit set selects the rising edge.
    pcr: u8,
    ifr: u8,
    ier: u8,

    ca1: bool,
    ca1_prev: bool,
    ca2: bool,
    cb1: bool,
    cb1_prev: bool,
    cb2: bool,
}

impl Default for Via6522 {
    fn default() -> Self {
        Self::new()
    }
}

impl Via6522 {
    /// Create a new VIA with all registers in their reset state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pa: 0xFF,
            pb: 0xFF,
            ira: 0xFF,
            irb: 0xFF,
            ora: 0,
            orb: 0,
            ddra: 0,
            ddrb: 0,
            t1_counter: 0,
            t1_latch: 0,
            t1_fired: false,
            t2_counter: 0,
            t2_latch_lo: 0,
            t2_fired: false,
            sr: 0,
            acr: 0,
            pcr: 0,
            ifr: 0,
            ier: 0,
            ca1: false,
            ca1_prev: false,
            ca2: false,
            cb1: false,
            cb1_prev: false,
            cb2: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance both timers and sample CA1/CB1 edges.
    ///
    /// Returns true while an enabled interrupt is pending.
    pub fn tick(&mut self, cycles: u32) -> bool {
        let cycles = cycles as i32;

        self.t1_counter -= cycles;
        if self.t1_counter <= 0 {
            if self.acr & ACR_T1_FREE_RUN != 0 {
                // Reload includes the 2-cycle restart delay
                self.t1_counter += i32::from(self.t1_latch) + 2;
                self.ifr |= IFR_T1;
            } else if !self.t1_fired {
                self.t1_counter += 0xFFFF;
                self.t1_fired = true;
                self.ifr |= IFR_T1;
            } else {
                self.t1_counter = i32::from(self.t1_counter as u16);
            }
        }

        // Pulse counting on PB6 is not modelled: the counter holds.
        if self.acr & ACR_T2_COUNT_PULSES == 0 {
            self.t2_counter -= cycles;
            if self.t2_counter <= 0 && !self.t2_fired {
                self.t2_counter += 0xFFFF;
                self.t2_fired = true;
                self.ifr |= IFR_T2;
            }
        }

        if self.ca1 != self.ca1_prev {
            if self.ca1 == (self.pcr & 0x01 != 0) {
                self.ifr |= IFR_CA1;
            }
            self.ca1_prev = self.ca1;
        }

        if self.cb1 != self.cb1_prev {
            if self.cb1 == (self.pcr & 0x10 != 0) {
                self.ifr |= IFR_CB1;
            }
            self.cb1_prev = self.cb1;
        }

        self.irq_active()
    }

    /// True if an enabled interrupt flag is set.
    #[must_use]
    pub const fn irq_active(&self) -> bool {
        self.ifr & self.ier & 0x7F != 0
    }

    /// Read a VIA register.
    pub fn read(&mut self, reg: u8, sink: &mut impl PortSink) -> u8 {
        match reg & 0x0F {
            0x00 => {
                self.ifr &= !(IFR_CB1 | IFR_CB2);
                sink.port_in(self, Port::Pb);
                self.irb
            }
            0x01 => {
                self.ifr &= !(IFR_CA1 | IFR_CA2);
                sink.port_in(self, Port::Pa);
                self.ira
            }
            0x02 => self.ddrb,
            0x03 => self.ddra,
            0x04 => {
                self.ifr &= !IFR_T1;
                self.t1_counter as u8
            }
            0x05 => (self.t1_counter >> 8) as u8,
            0x06 => self.t1_latch as u8,
            0x07 => (self.t1_latch >> 8) as u8,
            0x08 => {
                self.ifr &= !IFR_T2;
                self.t2_counter as u8
            }
            0x09 => (self.t2_counter >> 8) as u8,
            0x0A => self.sr,
            0x0B => self.acr,
            0x0C => self.pcr,
            0x0D => {
                let any = if self.irq_active() { 0x80 } else { 0 };
                (self.ifr & 0x7F) | any
            }
            0x0E => self.ier | 0x80,
            _ => {
                // ORA without handshake
                sink.port_in(self, Port::Pa);
                self.ira
            }
        }
    }

    /// Write a VIA register.
    pub fn write(&mut self, reg: u8, value: u8, sink: &mut impl PortSink) {
        match reg & 0x0F {
            0x00 => {
                self.orb = value;
                self.refresh_pb();
                sink.port_out(self, Port::Pb);
                self.ifr &= !(IFR_CB1 | IFR_CB2);
            }
            0x01 => {
                self.ifr &= !(IFR_CA1 | IFR_CA2);
                self.write_ora(value, sink);
            }
            0x02 => {
                self.ddrb = value;
                self.refresh_pb();
            }
            0x03 => {
                self.ddra = value;
                self.refresh_pa();
            }
            0x04 | 0x06 => {
                self.t1_latch = (self.t1_latch & 0xFF00) | u16::from(value);
            }
            0x05 => {
                self.t1_latch = (self.t1_latch & 0x00FF) | (u16::from(value) << 8);
                self.t1_counter = i32::from(self.t1_latch);
                self.ifr &= !IFR_T1;
                self.t1_fired = false;
            }
            0x07 => {
                self.t1_latch = (self.t1_latch & 0x00FF) | (u16::from(value) << 8);
                self.ifr &= !IFR_T1;
            }
            0x08 => self.t2_latch_lo = value,
            0x09 => {
                self.t2_counter = i32::from((u16::from(value) << 8) | u16::from(self.t2_latch_lo));
                self.ifr &= !IFR_T2;
                self.t2_fired = false;
            }
            0x0A => self.sr = value,
            0x0B => self.acr = value,
            0x0C => {
                self.pcr = value;
                // Manual output modes: 110 drives low, 111 drives high
                match (value >> 1) & 0b111 {
                    0b110 => {
                        self.ca2 = false;
                        sink.port_out(self, Port::Ca2);
                    }
                    0b111 => {
                        self.ca2 = true;
                        sink.port_out(self, Port::Ca2);
                    }
                    _ => {}
                }
                match (value >> 5) & 0b111 {
                    0b110 => {
                        self.cb2 = false;
                        sink.port_out(self, Port::Cb2);
                    }
                    0b111 => {
                        self.cb2 = true;
                        sink.port_out(self, Port::Cb2);
                    }
                    _ => {}
                }
            }
            0x0D => self.ifr &= !value & 0x7F,
            0x0E => {
                if value & 0x80 != 0 {
                    self.ier |= value & 0x7F;
                } else {
                    self.ier &= !value & 0x7F;
                }
            }
            _ => self.write_ora(value, sink),
        }
    }

    fn write_ora(&mut self, value: u8, sink: &mut impl PortSink) {
        self.ora = value;
        self.refresh_pa();
        sink.port_out(self, Port::Pa);
    }

    fn refresh_pa(&mut self) {
        self.pa = (self.ora & self.ddra) | (self.pa & !self.ddra);
        self.ira = self.pa;
    }

    fn refresh_pb(&mut self) {
        self.pb = (self.orb & self.ddrb) | (self.pb & !self.ddrb);
        self.irb = (self.pb & !self.ddrb) | (self.orb & self.ddrb);
    }

    // --- Pin access for the machine side ---

    /// Levels currently on port A.
    #[must_use]
    pub const fn pa(&self) -> u8 {
        self.pa
    }

    /// Levels currently on port B.
    #[must_use]
    pub const fn pb(&self) -> u8 {
        self.pb
    }

    /// Drive all of port A. IRA follows the pins exactly.
    pub fn set_pa(&mut self, value: u8) {
        self.pa = value;
        self.ira = value;
    }

    /// Drive all of port B. Output bits still read back from ORB.
    pub fn set_pb(&mut self, value: u8) {
        self.pb = value;
        self.irb = (self.pb & !self.ddrb) | (self.orb & self.ddrb);
    }

    pub fn set_bit_pa(&mut self, bit: u8, value: bool) {
        let mask = 1 << bit;
        self.set_pa((self.pa & !mask) | if value { mask } else { 0 });
    }

    pub fn set_bit_pb(&mut self, bit: u8, value: bool) {
        let mask = 1 << bit;
        self.set_pb((self.pb & !mask) | if value { mask } else { 0 });
    }

    /// Release a port A pin: outputs return to ORA, inputs are pulled up.
    pub fn open_bit_pa(&mut self, bit: u8) {
        let mask = 1 << bit;
        let level = if self.ddra & mask != 0 {
            self.ora & mask != 0
        } else {
            true
        };
        self.set_bit_pa(bit, level);
    }

    /// Release a port B pin: outputs return to ORB, inputs are pulled up.
    pub fn open_bit_pb(&mut self, bit: u8) {
        let mask = 1 << bit;
        let level = if self.ddrb & mask != 0 {
            self.orb & mask != 0
        } else {
            true
        };
        self.set_bit_pb(bit, level);
    }

    #[must_use]
    pub const fn ca1(&self) -> bool {
        self.ca1
    }

    /// Set the CA1 input level. The edge is seen on the next `tick()`.
    pub fn set_ca1(&mut self, level: bool) {
        self.ca1_prev = self.ca1;
        self.ca1 = level;
    }

    #[must_use]
    pub const fn ca2(&self) -> bool {
        self.ca2
    }

    pub fn set_ca2(&mut self, level: bool) {
        self.ca2 = level;
    }

    #[must_use]
    pub const fn cb1(&self) -> bool {
        self.cb1
    }

    /// Set the CB1 input level. The edge is seen on the next `tick()`.
    pub fn set_cb1(&mut self, level: bool) {
        self.cb1_prev = self.cb1;
        self.cb1 = level;
    }

    #[must_use]
    pub const fn cb2(&self) -> bool {
        self.cb2
    }

    pub fn set_cb2(&mut self, level: bool) {
        self.cb2 = level;
    }

    #[must_use]
    pub const fn ddra(&self) -> u8 {
        self.ddra
    }

    #[must_use]
    pub const fn ddrb(&self) -> u8 {
        self.ddrb
    }

    /// Get the current IFR value (for diagnostic/debug use).
    #[must_use]
    pub const fn ifr(&self) -> u8 {
        self.ifr
    }

    /// Get the current IER value (for diagnostic/debug use).
    #[must_use]
    pub const fn ier(&self) -> u8 {
        self.ier
    }

    #[must_use]
    pub const fn acr(&self) -> u8 {
        self.acr
    }

    #[must_use]
    pub const fn pcr(&self) -> u8 {
        self.pcr
    }

    /// Timer 1 counter as the chip would present it.
    #[must_use]
    pub const fn timer1_counter(&self) -> u16 {
        self.t1_counter as u16
    }

    #[must_use]
    pub const fn timer2_counter(&self) -> u16 {
        self.t2_counter as u16
    }
}

impl Observable for Via6522 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pa" => Some(self.pa.into()),
            "pb" => Some(self.pb.into()),
            "ddra" => Some(self.ddra.into()),
            "ddrb" => Some(self.ddrb.into()),
            "t1" => Some(self.timer1_counter().into()),
            "t1_latch" => Some(self.t1_latch.into()),
            "t2" => Some(self.timer2_counter().into()),
            "acr" => Some(self.acr.into()),
            "pcr" => Some(self.pcr.into()),
            "ifr" => Some(self.ifr.into()),
            "ier" => Some(self.ier.into()),
            "ca1" => Some(self.ca1.into()),
            "ca2" => Some(self.ca2.into()),
            "cb1" => Some(self.cb1.into()),
            "cb2" => Some(self.cb2.into()),
            "irq" => Some(self.irq_active().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pa", "pb", "ddra", "ddrb", "t1", "t1_latch", "t2", "acr", "pcr", "ifr", "ier", "ca1",
            "ca2", "cb1", "cb2", "irq",
        ]
    }
}
