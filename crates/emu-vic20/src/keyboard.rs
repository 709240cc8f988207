//! VIC-20 keyboard matrix.
//!
//! The 8x8 matrix is scanned through VIA2: the KERNAL drives one port low
//! to select rows or columns and reads the other port back. Both directions
//! work, so the last scan result is latched for each port.

/// 8x8 key matrix, `[row][col]`, plus the latched scan results.
pub struct KeyboardMatrix {
    keys: [[bool; 8]; 8],
    /// What VIA2 port A reads: active-low rows.
    row_status: u8,
    /// What VIA2 port B reads: active-low columns.
    col_status: u8,
}

impl KeyboardMatrix {
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: [[false; 8]; 8],
            row_status: 0xFF,
            col_status: 0xFF,
        }
    }

    /// Press or release the key at `row`, `col`. Out-of-range cells are
    /// ignored.
    pub fn set_key(&mut self, row: u8, col: u8, pressed: bool) {
        if let Some(cell) = self
            .keys
            .get_mut(usize::from(row))
            .and_then(|r| r.get_mut(usize::from(col)))
        {
            *cell = pressed;
        }
    }

    #[must_use]
    pub fn is_pressed(&self, row: u8, col: u8) -> bool {
        self.keys
            .get(usize::from(row))
            .and_then(|r| r.get(usize::from(col)))
            .copied()
            .unwrap_or(false)
    }

    pub fn release_all(&mut self) {
        self.keys = [[false; 8]; 8];
        self.row_status = 0xFF;
        self.col_status = 0xFF;
    }

    /// Port A drove `pa`: every low bit selects a row. Latches the pressed
    /// columns of those rows, active low.
    pub fn select_rows(&mut self, pa: u8) {
        let rows = !pa;
        let mut cols = 0u8;
        for (r, row) in self.keys.iter().enumerate() {
            if rows & (1 << r) != 0 {
                for (c, &down) in row.iter().enumerate() {
                    cols |= u8::from(down) << c;
                }
            }
        }
        self.col_status = !cols;
    }

    /// Port B drove `pb`: every low bit selects a column. Latches the
    /// pressed rows of those columns, active low.
    pub fn select_cols(&mut self, pb: u8) {
        let cols = !pb;
        let mut rows = 0u8;
        for (r, row) in self.keys.iter().enumerate() {
            for (c, &down) in row.iter().enumerate() {
                if down && cols & (1 << c) != 0 {
                    rows |= 1 << r;
                }
            }
        }
        self.row_status = !rows;
    }

    #[must_use]
    pub fn row_status(&self) -> u8 {
        self.row_status
    }

    #[must_use]
    pub fn col_status(&self) -> u8 {
        self.col_status
    }
}

impl Default for KeyboardMatrix {
    fn default() -> Self {
        Self::new()
    }
}
