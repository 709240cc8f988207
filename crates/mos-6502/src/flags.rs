//! Processor status register (P).

/// Carry.
pub const C: u8 = 0x01;
/// Zero.
pub const Z: u8 = 0x02;
/// IRQ disable.
pub const I: u8 = 0x04;
/// Decimal mode: ADC/SBC use BCD.
pub const D: u8 = 0x08;
/// Break. Only exists in the copy pushed by BRK/PHP.
pub const B: u8 = 0x10;
/// Unused. Always 1 when pushed.
pub const U: u8 = 0x20;
/// Overflow.
pub const V: u8 = 0x40;
/// Negative.
pub const N: u8 = 0x80;

/// Status flags. B and U are not stored; they are synthesized on push.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    /// Load from a byte pulled off the stack. B and U are discarded.
    #[must_use]
    pub const fn from_stack(value: u8) -> Self {
        Self(value & !(B | U))
    }

    /// Byte pushed by IRQ and NMI: U set, B clear.
    #[must_use]
    pub const fn to_stack_interrupt(self) -> u8 {
        (self.0 | U) & !B
    }

    /// Byte pushed by BRK and PHP: U and B set.
    #[must_use]
    pub const fn to_stack_break(self) -> u8 {
        self.0 | U | B
    }

    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    /// Update N and Z from a result byte.
    pub fn update_nz(&mut self, value: u8) {
        self.set_if(N, value & 0x80 != 0);
        self.set_if(Z, value == 0);
    }
}
