//! VIC-20 bus: memory and I/O routing, and the wiring behind the VIA pins.
//!
//! $9000-$90FF is the VIC. $9100-$93FF holds both VIAs, selected by
//! address bits 4 (VIA1) and 5 (VIA2); every other address goes to
//! `Vic20Memory`.
//!
//! VIA1 carries the joystick (PA2-PA5), the serial ATN output (PA7), the
//! serial CLK/DATA inputs (PA0/PA1) and RESTORE (CA1). VIA2 scans the
//! keyboard on PA/PB, reads joystick right on PB7 and drives serial
//! CLK/DATA on CA2/CB2.

#![allow(clippy::cast_possible_truncation)]

use drive_iec::IecDrive;
use emu_core::Bus;
use mos_via_6522::{Port, PortSink, Unconnected, Via6522};
use mos_vic_6561::Vic6561;

use crate::input::Joy;
use crate::keyboard::KeyboardMatrix;
use crate::memory::Vic20Memory;

/// The VIC-20 bus, implementing `emu_core::Bus`.
///
/// Owns every subsystem except the CPU.
pub struct Vic20Bus {
    pub memory: Vic20Memory,
    pub vic: Vic6561,
    pub via1: Via6522,
    pub via2: Via6522,
    pub keyboard: KeyboardMatrix,
    /// Pressed state per `Joy`.
    pub joystick: [bool; 5],
    pub drive: IecDrive,
}

/// What VIA1's pins are connected to.
struct Via1Pins<'a> {
    joystick: &'a [bool; 5],
    drive: &'a mut IecDrive,
}

impl PortSink for Via1Pins<'_> {
    fn port_in(&mut self, via: &mut Via6522, port: Port) {
        if port != Port::Pa {
            return;
        }
        for joy in Joy::ALL {
            if let Some(bit) = joy.via1_bit() {
                if self.joystick[joy.index()] {
                    via.set_bit_pa(bit, false);
                } else {
                    via.open_bit_pa(bit);
                }
            }
        }
    }

    fn port_out(&mut self, via: &Via6522, port: Port) {
        // ATN goes out through an inverter; PA7 high pulls the line.
        if port == Port::Pa {
            self.drive.set_atn(via.pa() & 0x80 != 0);
        }
    }
}

/// What VIA2's pins are connected to.
struct Via2Pins<'a> {
    keyboard: &'a mut KeyboardMatrix,
    joystick: &'a [bool; 5],
    drive: &'a mut IecDrive,
}

impl PortSink for Via2Pins<'_> {
    fn port_in(&mut self, via: &mut Via6522, port: Port) {
        match port {
            Port::Pb => {
                via.set_pb(self.keyboard.col_status());
                if self.joystick[Joy::Right.index()] {
                    via.set_bit_pb(7, false);
                }
            }
            Port::Pa => via.set_pa(self.keyboard.row_status()),
            _ => {}
        }
    }

    fn port_out(&mut self, via: &Via6522, port: Port) {
        match port {
            Port::Pa => self.keyboard.select_rows(via.pa()),
            Port::Pb => self.keyboard.select_cols(via.pb()),
            Port::Ca2 => self.drive.set_clk(via.ca2()),
            Port::Cb2 => self.drive.set_data(via.cb2()),
        }
    }
}

impl Vic20Bus {
    #[must_use]
    pub fn new(memory: Vic20Memory, drive: IecDrive) -> Self {
        Self {
            memory,
            vic: Vic6561::new(),
            via1: Via6522::new(),
            via2: Via6522::new(),
            keyboard: KeyboardMatrix::new(),
            joystick: [false; 5],
            drive,
        }
    }

    /// Copy the drive's CLK and DATA outputs onto VIA1 PA0/PA1. A pulled
    /// line reads low.
    pub fn sync_serial_inputs(&mut self) {
        self.via1.set_bit_pa(0, !self.drive.clk_out());
        self.via1.set_bit_pa(1, !self.drive.data_out());
    }

    /// Advance the VIC by `cycles`.
    pub fn tick_vic(&mut self, cycles: u32) {
        self.vic.tick(cycles, &self.memory);
    }

    /// Read without side effects: VIA registers are read from a copy with
    /// nothing on the pins.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        let reg = (addr & 0x0F) as u8;
        match addr {
            0x9000..=0x90FF => self.vic.read(reg),
            0x9100..=0x93FF => {
                if addr & 0x10 != 0 {
                    self.via1.clone().read(reg, &mut Unconnected)
                } else if addr & 0x20 != 0 {
                    self.via2.clone().read(reg, &mut Unconnected)
                } else {
                    (addr >> 8) as u8
                }
            }
            _ => self.memory.read(addr),
        }
    }
}

impl Bus for Vic20Bus {
    fn read(&mut self, addr: u16) -> u8 {
        let reg = (addr & 0x0F) as u8;
        match addr {
            0x9000..=0x90FF => self.vic.read(reg),
            0x9100..=0x93FF => {
                if addr & 0x10 != 0 {
                    let mut pins = Via1Pins {
                        joystick: &self.joystick,
                        drive: &mut self.drive,
                    };
                    self.via1.read(reg, &mut pins)
                } else if addr & 0x20 != 0 {
                    let mut pins = Via2Pins {
                        keyboard: &mut self.keyboard,
                        joystick: &self.joystick,
                        drive: &mut self.drive,
                    };
                    self.via2.read(reg, &mut pins)
                } else {
                    (addr >> 8) as u8
                }
            }
            _ => self.memory.read(addr),
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        let reg = (addr & 0x0F) as u8;
        match addr {
            0x9000..=0x90FF => self.vic.write(reg, value),
            0x9100..=0x93FF => {
                if addr & 0x10 != 0 {
                    let mut pins = Via1Pins {
                        joystick: &self.joystick,
                        drive: &mut self.drive,
                    };
                    self.via1.write(reg, value, &mut pins);
                } else if addr & 0x20 != 0 {
                    let mut pins = Via2Pins {
                        keyboard: &mut self.keyboard,
                        joystick: &self.joystick,
                        drive: &mut self.drive,
                    };
                    self.via2.write(reg, value, &mut pins);
                }
            }
            _ => self.memory.write(addr, value),
        }
    }
}
