//! BASIC program images.
//!
//! A stored BASIC program is a chain of lines. Every line is a next-line
//! pointer, a line number, the text and a terminating zero. A 00 00
//! pointer ends the program.

/// Builds a loadable BASIC program image line by line.
///
/// The image starts with the two-byte load address, so it can be served
/// as a PRG file. Line text is stored as given: nothing is tokenised.
pub struct ProgramBuilder {
    start: u16,
    image: Vec<u8>,
    /// Offset of the pointer that will link to the next line.
    slot: usize,
}

impl ProgramBuilder {
    #[must_use]
    pub fn new(start: u16) -> Self {
        let [lo, hi] = start.to_le_bytes();
        Self {
            start,
            image: vec![lo, hi, 0, 0],
            slot: 2,
        }
    }

    pub fn add_line(&mut self, number: u16, text: &[u8]) {
        self.image.extend_from_slice(&number.to_le_bytes());
        self.image.extend_from_slice(text);
        self.image.push(0);

        let next = self.image.len();
        let link = self.start.wrapping_add((next - 2) as u16);
        self.image[self.slot..self.slot + 2].copy_from_slice(&link.to_le_bytes());
        self.image.extend_from_slice(&[0, 0]);
        self.slot = next;
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.image
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.image
    }
}
