/// A byte cursor over XRF source that tracks the line and column of the
/// last-read byte.
///
/// Positions are 1-based. The column starts at 0 and is bumped before a
/// byte is reported, so the first byte of a line sits at column 1; a
/// newline advances the line and resets the column.
pub struct SourceReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> SourceReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            line: 1,
            col: 0,
        }
    }

    /// Returns the next byte, or `None` at end of input.
    pub fn read(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;

        if b == b'\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }

        Some(b)
    }

    /// Line of the last-read byte.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Column of the last-read byte.
    pub fn col(&self) -> u32 {
        self.col
    }
}
