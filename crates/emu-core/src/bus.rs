//! Memory bus interface.

/// 16-bit memory bus.
///
/// Components reach memory and memory-mapped chips through this trait. The
/// implementor owns address decoding.
pub trait Bus {
    /// Read a byte. Reads may have side effects on I/O registers.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte.
    fn write(&mut self, address: u16, value: u8);
}

/// A flat 64K RAM bus with no decoding. Handy for CPU tests.
pub struct FlatBus {
    pub memory: Box<[u8; 0x10000]>,
}

impl FlatBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
        }
    }

    /// Copy `bytes` into memory starting at `address`, wrapping at $FFFF.
    pub fn load(&mut self, address: u16, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            self.memory[usize::from(address.wrapping_add(i as u16))] = b;
        }
    }
}

impl Default for FlatBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for FlatBus {
    fn read(&mut self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
    }
}
