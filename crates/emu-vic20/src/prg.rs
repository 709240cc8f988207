//! BASIC pointer fix-up after a PRG load.
//!
//! After a BASIC program is poked in, the KERNAL's end-of-program pointers
//! must be moved past it so RUN and new variables do not trample the code.

use emu_core::Bus;

/// Start of BASIC text (TXTTAB).
pub const BASIC_START: u16 = 0x002B;
/// Start of variables (VARTAB), start of arrays (ARYTAB) and end of arrays
/// (STREND) all point at the end of the program.
const BASIC_END_POINTERS: [u16; 3] = [0x002D, 0x002F, 0x0031];
/// Tape buffer scrolling.
const TAPE_SCROLL: u16 = 0x00AC;
/// Tape end address / end of program.
const TAPE_END: u16 = 0x00AE;

fn read_word(bus: &mut impl Bus, addr: u16) -> u16 {
    u16::from_le_bytes([bus.read(addr), bus.read(addr.wrapping_add(1))])
}

fn write_word(bus: &mut impl Bus, addr: u16, value: u16) {
    let [lo, hi] = value.to_le_bytes();
    bus.write(addr, lo);
    bus.write(addr.wrapping_add(1), hi);
}

/// Point the BASIC end-of-program pointers `len` bytes past the start of
/// BASIC. Returns the new end address.
pub fn set_basic_end(bus: &mut impl Bus, len: usize) -> u16 {
    let end = read_word(bus, BASIC_START).wrapping_add(len as u16);
    write_word(bus, TAPE_SCROLL, 0);
    for ptr in BASIC_END_POINTERS {
        write_word(bus, ptr, end);
    }
    write_word(bus, TAPE_END, end);
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::FlatBus;

    #[test]
    fn basic_pointers_follow_program() {
        let mut bus = FlatBus::new();
        bus.write(0x2B, 0x01);
        bus.write(0x2C, 0x10);
        bus.write(0xAC, 0x55);
        let end = set_basic_end(&mut bus, 0x20);
        assert_eq!(end, 0x1021);
        for ptr in [0x2D, 0x2F, 0x31, 0xAE] {
            assert_eq!(bus.read(ptr), 0x21, "{ptr:02X}");
            assert_eq!(bus.read(ptr + 1), 0x10, "{ptr:02X}");
        }
        assert_eq!(bus.read(0xAC), 0);
        assert_eq!(bus.read(0xAD), 0);
    }
}
