//! Host input: logical keys, joystick directions and RESTORE.
//!
//! `VicKey` names every key on the matrix. RESTORE is not on the matrix;
//! it drives VIA1 CA1 and is set with `Vic20::set_restore`.

/// Logical key on the VIC-20 keyboard.
///
/// Matrix layout (row = VIA2 PA, col = VIA2 PB):
///
/// | Row | Col0 | Col1   | Col2 | Col3     | Col4  | Col5 | Col6  | Col7 |
/// |-----|------|--------|------|----------|-------|------|-------|------|
/// | 0   | 1    | ←      | CTRL | RUN/STOP | SPACE | C=   | Q     | 2    |
/// | 1   | 3    | W      | A    | LSHFT    | Z     | S    | E     | 4    |
/// | 2   | 5    | R      | D    | X        | C     | F    | T     | 6    |
/// | 3   | 7    | Y      | G    | V        | B     | H    | U     | 8    |
/// | 4   | 9    | I      | J    | N        | M     | K    | O     | 0    |
/// | 5   | +    | P      | L    | ,        | .     | :    | @     | -    |
/// | 6   | £    | *      | ;    | /        | RSHFT | =    | ↑     | HOME |
/// | 7   | DEL  | RETURN | →    | ↓        | F1    | F3   | F5    | F7   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VicKey {
    // Row 0
    N1,
    LeftArrow,
    Ctrl,
    RunStop,
    Space,
    Commodore,
    Q,
    N2,
    // Row 1
    N3,
    W,
    A,
    LShift,
    Z,
    S,
    E,
    N4,
    // Row 2
    N5,
    R,
    D,
    X,
    C,
    F,
    T,
    N6,
    // Row 3
    N7,
    Y,
    G,
    V,
    B,
    H,
    U,
    N8,
    // Row 4
    N9,
    I,
    J,
    N,
    M,
    K,
    O,
    N0,
    // Row 5
    Plus,
    P,
    L,
    Comma,
    Period,
    Colon,
    At,
    Minus,
    // Row 6
    Pound,
    Asterisk,
    Semicolon,
    Slash,
    RShift,
    Equals,
    UpArrow,
    Home,
    // Row 7
    Delete,
    Return,
    CursorRight,
    CursorDown,
    F1,
    F3,
    F5,
    F7,
}

impl VicKey {
    /// Return the (row, col) pair for this key in the keyboard matrix.
    #[must_use]
    pub const fn matrix(self) -> (u8, u8) {
        match self {
            // Row 0
            Self::N1 => (0, 0),
            Self::LeftArrow => (0, 1),
            Self::Ctrl => (0, 2),
            Self::RunStop => (0, 3),
            Self::Space => (0, 4),
            Self::Commodore => (0, 5),
            Self::Q => (0, 6),
            Self::N2 => (0, 7),
            // Row 1
            Self::N3 => (1, 0),
            Self::W => (1, 1),
            Self::A => (1, 2),
            Self::LShift => (1, 3),
            Self::Z => (1, 4),
            Self::S => (1, 5),
            Self::E => (1, 6),
            Self::N4 => (1, 7),
            // Row 2
            Self::N5 => (2, 0),
            Self::R => (2, 1),
            Self::D => (2, 2),
            Self::X => (2, 3),
            Self::C => (2, 4),
            Self::F => (2, 5),
            Self::T => (2, 6),
            Self::N6 => (2, 7),
            // Row 3
            Self::N7 => (3, 0),
            Self::Y => (3, 1),
            Self::G => (3, 2),
            Self::V => (3, 3),
            Self::B => (3, 4),
            Self::H => (3, 5),
            Self::U => (3, 6),
            Self::N8 => (3, 7),
            // Row 4
            Self::N9 => (4, 0),
            Self::I => (4, 1),
            Self::J => (4, 2),
            Self::N => (4, 3),
            Self::M => (4, 4),
            Self::K => (4, 5),
            Self::O => (4, 6),
            Self::N0 => (4, 7),
            // Row 5
            Self::Plus => (5, 0),
            Self::P => (5, 1),
            Self::L => (5, 2),
            Self::Comma => (5, 3),
            Self::Period => (5, 4),
            Self::Colon => (5, 5),
            Self::At => (5, 6),
            Self::Minus => (5, 7),
            // Row 6
            Self::Pound => (6, 0),
            Self::Asterisk => (6, 1),
            Self::Semicolon => (6, 2),
            Self::Slash => (6, 3),
            Self::RShift => (6, 4),
            Self::Equals => (6, 5),
            Self::UpArrow => (6, 6),
            Self::Home => (6, 7),
            // Row 7
            Self::Delete => (7, 0),
            Self::Return => (7, 1),
            Self::CursorRight => (7, 2),
            Self::CursorDown => (7, 3),
            Self::F1 => (7, 4),
            Self::F3 => (7, 5),
            Self::F5 => (7, 6),
            Self::F7 => (7, 7),
        }
    }
}

/// Joystick switch. Up, down, left and fire read on VIA1 port A; right
/// reads on VIA2 PB7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joy {
    Up,
    Down,
    Left,
    Right,
    Fire,
}

impl Joy {
    pub const ALL: [Self; 5] = [Self::Up, Self::Down, Self::Left, Self::Right, Self::Fire];

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// VIA1 port A bit for this switch, `None` for right.
    #[must_use]
    pub const fn via1_bit(self) -> Option<u8> {
        match self {
            Self::Up => Some(2),
            Self::Down => Some(3),
            Self::Left => Some(4),
            Self::Fire => Some(5),
            Self::Right => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_cells_are_unique() {
        let keys = [
            VicKey::N1,
            VicKey::RunStop,
            VicKey::LShift,
            VicKey::A,
            VicKey::N0,
            VicKey::UpArrow,
            VicKey::Home,
            VicKey::Return,
            VicKey::F7,
        ];
        let cells: Vec<_> = keys.iter().map(|k| k.matrix()).collect();
        for (i, a) in cells.iter().enumerate() {
            for b in &cells[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn known_positions() {
        assert_eq!(VicKey::N1.matrix(), (0, 0));
        assert_eq!(VicKey::N2.matrix(), (0, 7));
        assert_eq!(VicKey::N0.matrix(), (4, 7));
        assert_eq!(VicKey::LShift.matrix(), (1, 3));
        assert_eq!(VicKey::UpArrow.matrix(), (6, 6));
        assert_eq!(VicKey::F7.matrix(), (7, 7));
    }

    #[test]
    fn joystick_bits() {
        let bits: Vec<_> = Joy::ALL.iter().filter_map(|j| j.via1_bit()).collect();
        assert_eq!(bits, [2, 3, 4, 5]);
        assert_eq!(Joy::Right.index(), 3);
    }
}
