//! MOS 6561 Video Interface Chip (PAL VIC).
//!
//! The VIC generates a character-mapped display: a video matrix of up to
//! 32 columns of character codes, an 8x8 or 8x16 character table, and a
//! 1K colour RAM holding one nibble per cell. Cells are hires (1 bit per
//! pixel, foreground/background) or multicolour (2 bits per double-width
//! pixel, four colour slots). A border surrounds the character area.
//!
//! # Standalone IC
//!
//! The chip reads memory through the [`VideoMemory`] trait supplied by the
//! caller, so it is independent of the machine's memory map.
//!
//! # Timing (PAL)
//!
//! - 284 pixel clocks per line, four per CPU cycle (71 cycles per line)
//! - 312 lines per frame, the first 28 in vertical blanking
//! - 22,152 CPU cycles per frame
//!
//! # Framebuffer
//!
//! 220x284 ARGB32: the visible part of each line after horizontal
//! blanking, for every line after vertical blanking. Pixels are produced
//! in groups of four.
//!
//! # Registers ($9000-$900F)
//!
//! | Reg | Function                                                |
//! |-----|---------------------------------------------------------|
//! | $0  | bits 0-6 left origin                                    |
//! | $1  | top origin                                              |
//! | $2  | bits 0-6 columns, bit 7 video matrix address bit 9      |
//! | $3  | bit 0 char height 16, bits 1-6 rows, bit 7 raster bit 0 |
//! | $4  | raster line bits 8-1                                    |
//! | $5  | bits 0-3 char table, bits 4-7 video matrix              |
//! | $A-$D | sound oscillators (stored only)                       |
//! | $E  | bits 4-7 auxiliary colour, bits 0-3 volume              |
//! | $F  | bits 4-7 background, bit 3 normal/reverse, bits 0-2 border |

mod palette;

pub use palette::PALETTE;

use emu_core::{Observable, Value, parse_address};

pub const CHAR_WIDTH: i32 = 8;
/// Dot clock in Hz. The CPU runs at a quarter of this.
pub const PHI2: u32 = 4_433_618;
/// Pixel clocks per line, including horizontal blanking.
pub const FRAME_WIDTH: u16 = 284;
/// Lines per frame, including vertical blanking.
pub const FRAME_HEIGHT: u16 = 312;
pub const HORIZONTAL_BLANKING: u16 = 63;
pub const VERTICAL_BLANKING: u16 = 28;
pub const CYCLES_PER_FRAME: u32 = FRAME_WIDTH as u32 * FRAME_HEIGHT as u32 / 4;
pub const MAX_TEXT_COLUMNS: u8 = 32;

/// Offset from scan X to framebuffer X: blanking rounded up to a
/// 4-pixel boundary.
const X_OFFSET: u16 = HORIZONTAL_BLANKING + (4 - (HORIZONTAL_BLANKING & 3));

/// Framebuffer dimensions.
pub const FB_WIDTH: u32 = (FRAME_WIDTH - X_OFFSET) as u32;
pub const FB_HEIGHT: u32 = (FRAME_HEIGHT - VERTICAL_BLANKING) as u32;

/// Memory as seen by the VIC. Reads must not have side effects.
pub trait VideoMemory {
    /// Read a video-matrix byte (character code) at a CPU address.
    fn video_read(&self, addr: u16) -> u8;
    /// Read colour RAM at `offset` (0-$3FF). Only the low nibble is used.
    fn colour_read(&self, offset: u16) -> u8;
    /// Read a character-definition byte at a CPU address.
    fn char_read(&self, addr: u16) -> u8;
}

/// Convert a VIC address to the CPU address the VIC actually sees.
///
/// VIC $0000-$1FFF is CPU $8000-$9FFF (character ROM and I/O) and VIC
/// $2000-$3FFF is CPU $0000-$1FFF (RAM).
#[must_use]
pub const fn vic_to_cpu(addr: u32) -> u16 {
    ((addr & 0x1FFF) | (!((addr & 0x2000) << 2) & 0x8000)) as u16
}

/// MOS 6561 VIC, PAL variant.
pub struct Vic6561 {
    regs: [u8; 16],

    columns: i32,
    rows: i32,
    char_height: i32,
    char_area_height: i32,
    left: i32,
    right: i32,
    top: i32,
    video_matrix: u16,
    char_table: u16,

    /// Beam position in pixel clocks and lines.
    scan_x: u16,
    scan_y: u16,

    /// Current line is in the top or bottom border.
    v_border: bool,
    /// CPU address of the current text row in the video matrix.
    video_line: u16,
    char_column: i32,
    in_char_row: i32,
    /// Fetch a new cell at the next character-area group.
    load_char: bool,
    hi_nibble: [u32; 4],
    lo_nibble: [u32; 4],

    invert_mask: u8,
    border: u32,
    /// Hires slots: background, foreground.
    hcolours: [u32; 2],
    /// Multicolour slots: background, border, foreground, auxiliary.
    mcolours: [u32; 4],

    frame_complete: bool,
    framebuffer: Vec<u32>,
}

impl Default for Vic6561 {
    fn default() -> Self {
        Self::new()
    }
}

impl Vic6561 {
    #[must_use]
    pub fn new() -> Self {
        let mut vic = Self {
            regs: [0; 16],
            columns: 0,
            rows: 23,
            char_height: 8,
            char_area_height: 0,
            left: 0,
            right: 0,
            top: 0,
            video_matrix: 0,
            char_table: 0,
            scan_x: 0,
            scan_y: 0,
            v_border: false,
            video_line: 0,
            char_column: 0,
            in_char_row: 0,
            load_char: false,
            hi_nibble: [PALETTE[0]; 4],
            lo_nibble: [PALETTE[0]; 4],
            invert_mask: 0,
            border: PALETTE[0],
            hcolours: [PALETTE[0]; 2],
            mcolours: [PALETTE[0]; 4],
            frame_complete: false,
            framebuffer: vec![PALETTE[0]; (FB_WIDTH * FB_HEIGHT) as usize],
        };
        vic.reset();
        vic
    }

    /// Reset registers, geometry and beam. The framebuffer keeps its
    /// contents until overwritten.
    pub fn reset(&mut self) {
        self.regs = [0; 16];
        self.columns = 0;
        self.rows = 23;
        self.char_height = 8;
        self.video_matrix = 0;
        self.char_table = 0;
        self.scan_x = 0;
        self.scan_y = 0;
        self.char_column = 0;
        self.in_char_row = 0;
        self.top = 0;
        self.left = 0;
        self.v_border = false;
        self.invert_mask = 0;
        self.mcolours[3] = PALETTE[0];
        self.frame_complete = false;
    }

    /// Write a register. Writing the value already stored does nothing.
    pub fn write(&mut self, reg: u8, value: u8) {
        let reg = usize::from(reg & 0x0F);
        if self.regs[reg] == value {
            return;
        }
        self.regs[reg] = value;

        match reg {
            0x0 => {
                self.left = (i32::from(value & 0x7F) - 7) * 4;
                self.right = self.left + self.columns * CHAR_WIDTH;
            }
            0x1 => self.top = (i32::from(value) - 14) * 2,
            0x2 => {
                self.update_video_matrix();
                self.columns = i32::from((value & 0x7F).min(MAX_TEXT_COLUMNS));
                self.right = self.left + self.columns * CHAR_WIDTH;
            }
            0x3 => {
                self.char_height = if value & 0x01 != 0 { 16 } else { 8 };
                self.rows = i32::from((value >> 1) & 0x3F);
                self.char_area_height = self.rows * self.char_height;
            }
            0x5 => {
                self.char_table = u16::from(value & 0x0F) << 10;
                self.update_video_matrix();
            }
            0xE => self.mcolours[3] = PALETTE[usize::from(value >> 4)],
            0xF => {
                let background = PALETTE[usize::from(value >> 4)];
                self.invert_mask = if value & 0x08 == 0 { 0xFF } else { 0x00 };
                self.border = PALETTE[usize::from(value & 0x07)];
                self.mcolours[1] = self.border;
                self.mcolours[0] = background;
                self.hcolours[0] = background;
            }
            _ => {}
        }
    }

    fn update_video_matrix(&mut self) {
        let r2 = u16::from(self.regs[2]);
        let r5 = u16::from(self.regs[5]);
        self.video_matrix = ((r2 & 0x80) << 2) | ((r5 & 0x70) << 6) | ((!r5 & 0x80) << 8);
    }

    /// Read a register. $3 and $4 report the raster line.
    #[must_use]
    pub fn read(&self, reg: u8) -> u8 {
        let reg = reg & 0x0F;
        match reg {
            0x3 => (self.regs[3] & 0x7F) | (((self.scan_y & 1) as u8) << 7),
            0x4 => (self.scan_y >> 1) as u8,
            _ => self.regs[usize::from(reg)],
        }
    }

    /// Advance the beam by `cycles` CPU cycles (four pixels each).
    pub fn tick(&mut self, cycles: u32, mem: &impl VideoMemory) {
        for _ in 0..cycles {
            self.scan_x += 4;

            if self.scan_x == FRAME_WIDTH {
                self.scan_x = 0;
                self.scan_y += 1;

                if self.scan_y == FRAME_HEIGHT {
                    self.scan_y = 0;
                    self.v_border = false;
                    self.frame_complete = true;
                } else if self.scan_y >= VERTICAL_BLANKING {
                    self.start_line();
                }
            }

            if self.scan_y >= VERTICAL_BLANKING && self.scan_x >= HORIZONTAL_BLANKING {
                self.draw_group(mem);
            }
        }
    }

    fn start_line(&mut self) {
        let y = i32::from(self.scan_y - VERTICAL_BLANKING);
        self.v_border = y < self.top || y >= self.top + self.char_area_height;
        if !self.v_border {
            self.char_column = if self.left < 0 { -self.left / 8 } else { 0 };
            let row = (y - self.top) / self.char_height;
            self.in_char_row = (y - self.top) % self.char_height;
            self.video_line = self
                .video_matrix
                .wrapping_add((row * self.columns) as u16);
            self.load_char = true;
        }
    }

    /// Emit the next four pixels of the current line.
    fn draw_group(&mut self, mem: &impl VideoMemory) {
        let x = i32::from(self.scan_x - X_OFFSET);
        let y = usize::from(self.scan_y - VERTICAL_BLANKING);
        let start = y * FB_WIDTH as usize + x as usize;

        if self.v_border || x < self.left || x >= self.right {
            self.framebuffer[start..start + 4].fill(self.border);
            return;
        }

        if self.load_char {
            self.load_char = false;
            let column = self.char_column as u16;
            let code = mem.video_read(self.video_line.wrapping_add(column));
            let def = u32::from(self.char_table)
                + u32::from(code) * self.char_height as u32
                + self.in_char_row as u32;
            let bits = mem.char_read(vic_to_cpu(def));
            let colour = mem.colour_read(self.video_line.wrapping_add(column) & 0x3FF);

            if colour & 0x08 != 0 {
                self.mcolours[2] = PALETTE[usize::from(colour & 0x07)];
                let m = |shift: u8| self.mcolours[usize::from((bits >> shift) & 3)];
                let (a, b, c, d) = (m(6), m(4), m(2), m(0));
                self.hi_nibble = [a, a, b, b];
                self.lo_nibble = [c, c, d, d];
            } else {
                self.hcolours[1] = PALETTE[usize::from(colour & 0x07)];
                let bits = bits ^ self.invert_mask;
                let h = |bit: u8| self.hcolours[usize::from((bits >> bit) & 1)];
                self.hi_nibble = [h(7), h(6), h(5), h(4)];
                self.lo_nibble = [h(3), h(2), h(1), h(0)];
            }
        }

        let out = &mut self.framebuffer[start..start + 4];
        if !(self.left + x) & 4 != 0 {
            out.copy_from_slice(&self.hi_nibble);
        } else {
            out.copy_from_slice(&self.lo_nibble);
            self.char_column += 1;
            self.load_char = true;
        }
    }

    /// Has a frame completed since the last call? Auto-clears.
    pub fn take_frame_complete(&mut self) -> bool {
        let result = self.frame_complete;
        self.frame_complete = false;
        result
    }

    /// ARGB32 framebuffer, `FB_WIDTH` x `FB_HEIGHT`.
    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        &self.framebuffer
    }

    /// One framebuffer row.
    #[must_use]
    pub fn scanline(&self, y: usize) -> &[u32] {
        let start = y * FB_WIDTH as usize;
        &self.framebuffer[start..start + FB_WIDTH as usize]
    }

    #[must_use]
    pub fn raster_x(&self) -> u16 {
        self.scan_x
    }

    #[must_use]
    pub fn raster_y(&self) -> u16 {
        self.scan_y
    }

    /// CPU address of the video matrix.
    #[must_use]
    pub fn video_matrix(&self) -> u16 {
        self.video_matrix
    }

    /// VIC address of the character table.
    #[must_use]
    pub fn char_table(&self) -> u16 {
        self.char_table
    }

    #[must_use]
    pub fn columns(&self) -> u8 {
        self.columns as u8
    }

    #[must_use]
    pub fn rows(&self) -> u8 {
        self.rows as u8
    }

    #[must_use]
    pub fn char_height(&self) -> u8 {
        self.char_height as u8
    }

    /// Left edge of the character area in framebuffer pixels.
    #[must_use]
    pub fn left(&self) -> i32 {
        self.left
    }

    /// Top edge of the character area in framebuffer lines.
    #[must_use]
    pub fn top(&self) -> i32 {
        self.top
    }
}

impl Observable for Vic6561 {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(reg) = path.strip_prefix("reg.") {
            let reg = parse_address(reg).filter(|&r| r < 16)?;
            return Some(self.regs[usize::from(reg)].into());
        }
        match path {
            "raster_x" => Some(self.scan_x.into()),
            "raster_y" => Some(self.scan_y.into()),
            "columns" => Some(self.columns().into()),
            "rows" => Some(self.rows().into()),
            "char_height" => Some(self.char_height().into()),
            "video_matrix" => Some(self.video_matrix.into()),
            "char_table" => Some(self.char_table.into()),
            "left" => Some(self.left.into()),
            "top" => Some(self.top.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "raster_x",
            "raster_y",
            "columns",
            "rows",
            "char_height",
            "video_matrix",
            "char_table",
            "left",
            "top",
            "reg.<n>",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants() {
        assert_eq!(CYCLES_PER_FRAME, 22_152);
        assert_eq!(X_OFFSET, 64);
        assert_eq!(FB_WIDTH, 220);
        assert_eq!(FB_HEIGHT, 284);
    }

    #[test]
    fn vic_address_translation() {
        assert_eq!(vic_to_cpu(0x0000), 0x8000);
        assert_eq!(vic_to_cpu(0x1C00), 0x9C00);
        assert_eq!(vic_to_cpu(0x2000), 0x0000);
        assert_eq!(vic_to_cpu(0x3C00), 0x1C00);
    }

    #[test]
    fn reset_geometry() {
        let vic = Vic6561::new();
        assert_eq!(vic.rows(), 23);
        assert_eq!(vic.char_height(), 8);
        assert_eq!(vic.columns(), 0);
        assert_eq!(vic.video_matrix(), 0);
    }

    #[test]
    fn video_matrix_from_r2_and_r5() {
        let mut vic = Vic6561::new();
        vic.write(0x5, 0xF0);
        vic.write(0x2, 0x96);
        assert_eq!(vic.video_matrix(), 0x1E00);
        assert_eq!(vic.columns(), 22);
        assert_eq!(vic.char_table(), 0x0000);

        vic.write(0x5, 0xCC);
        assert_eq!(vic.video_matrix(), 0x1200);
        assert_eq!(vic.char_table(), 0x3000);
    }

    #[test]
    fn columns_are_clamped() {
        let mut vic = Vic6561::new();
        vic.write(0x2, 0x7F);
        assert_eq!(vic.columns(), 32);
    }

    #[test]
    fn origins() {
        let mut vic = Vic6561::new();
        vic.write(0x2, 22);
        vic.write(0x0, 0x0C);
        vic.write(0x1, 0x26);
        assert_eq!(vic.left(), 20);
        assert_eq!(vic.right, 20 + 22 * 8);
        assert_eq!(vic.top(), 48);
    }

    #[test]
    fn double_height_chars() {
        let mut vic = Vic6561::new();
        vic.write(0x3, 0x2F);
        assert_eq!(vic.char_height(), 16);
        assert_eq!(vic.rows(), 23);
        assert_eq!(vic.char_area_height, 23 * 16);
    }

    #[test]
    fn rewriting_same_value_is_a_no_op() {
        let mut vic = Vic6561::new();
        vic.write(0x3, 0x2E);
        // Poke the derived state; an identical write must not recompute it.
        vic.char_area_height = 1;
        vic.write(0x3, 0x2E);
        assert_eq!(vic.char_area_height, 1);
        vic.write(0x3, 0x2C);
        assert_eq!(vic.char_area_height, 22 * 8);
    }

    #[test]
    fn background_border_and_reverse() {
        let mut vic = Vic6561::new();
        vic.write(0xF, 0x1B);
        assert_eq!(vic.border, PALETTE[3]);
        assert_eq!(vic.hcolours[0], PALETTE[1]);
        assert_eq!(vic.mcolours[1], PALETTE[3]);
        assert_eq!(vic.invert_mask, 0);

        vic.write(0xF, 0x13);
        assert_eq!(vic.invert_mask, 0xFF);
    }

    #[test]
    fn auxiliary_colour_fills_slot_three() {
        let mut vic = Vic6561::new();
        vic.write(0xE, 0x5F);
        assert_eq!(vic.mcolours[3], PALETTE[5]);
        assert_eq!(vic.read(0xE), 0x5F);
    }

    #[test]
    fn query_registers() {
        let mut vic = Vic6561::new();
        vic.write(0x2, 0x96);
        assert_eq!(vic.query("reg.2"), Some(Value::U8(0x96)));
        assert_eq!(vic.query("reg.0x10"), None);
        assert_eq!(vic.query("columns"), Some(Value::U8(22)));
    }
}
