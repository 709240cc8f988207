//! VIC-20 colour palette.
//!
//! 16 colours as ARGB32. Each component is one of four levels
//! (0x00, 0x55, 0xAA, 0xFF), the same 2-bit-per-channel table a
//! 64-colour VGA DAC would be programmed with.

const fn rgb222(r: u32, g: u32, b: u32) -> u32 {
    0xFF00_0000 | ((r * 0x55) << 16) | ((g * 0x55) << 8) | (b * 0x55)
}

/// VIC palette: 16 colours indexed 0-15 in ARGB32 format.
pub const PALETTE: [u32; 16] = [
    rgb222(0, 0, 0), // 0: Black
    rgb222(3, 3, 3), // 1: White
    rgb222(3, 0, 0), // 2: Red
    rgb222(0, 2, 2), // 3: Cyan
    rgb222(2, 0, 2), // 4: Magenta
    rgb222(0, 2, 0), // 5: Green
    rgb222(0, 0, 2), // 6: Blue
    rgb222(2, 2, 0), // 7: Yellow
    rgb222(2, 1, 0), // 8: Orange
    rgb222(3, 2, 0), // 9: Light orange
    rgb222(3, 2, 2), // 10: Pink
    rgb222(0, 3, 3), // 11: Light cyan
    rgb222(3, 0, 3), // 12: Light magenta
    rgb222(0, 3, 0), // 13: Light green
    rgb222(0, 0, 3), // 14: Light blue
    rgb222(3, 3, 0), // 15: Light yellow
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels() {
        assert_eq!(PALETTE[0], 0xFF00_0000);
        assert_eq!(PALETTE[1], 0xFFFF_FFFF);
        assert_eq!(PALETTE[3], 0xFF00_AAAA);
        assert_eq!(PALETTE[8], 0xFFAA_5500);
    }
}
