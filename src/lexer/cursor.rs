//! Byte-by-byte navigation through one source file's text with line/column
//! tracking. Operates on a `&str`'s UTF-8 bytes directly; multi-byte
//! sequences only ever occur inside character literals and `string`/`error`
//! rest-of-line captures, both of which are handled by decoding `char`s from
//! the byte slice rather than assuming ASCII.

pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Decode the `char` starting at the current byte position, if any.
    pub fn peek(&self) -> Option<char> {
        std::str::from_utf8(&self.bytes[self.pos..])
            .ok()
            .and_then(|s| s.chars().next())
    }

    pub fn peek2(&self) -> Option<char> {
        std::str::from_utf8(&self.bytes[self.pos..])
            .ok()
            .and_then(|s| s.chars().nth(1))
    }

    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn current_pos(&self) -> (usize, usize) {
        (self.line, self.col)
    }

    /// Remaining bytes on the current line, not including the line
    /// terminator (`\n`, `\r`, or `\r\n`).
    pub fn rest_of_line(&self) -> &'a [u8] {
        let nl = self.bytes[self.pos..]
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
            .map(|i| self.pos + i)
            .unwrap_or(self.bytes.len());
        &self.bytes[self.pos..nl]
    }

    /// Advance the cursor past `n` bytes (used after consuming
    /// `rest_of_line`'s result verbatim). Counts bytes, not `char`s, since
    /// `advance()` moves one `char` at a time and a multi-byte `char`
    /// consumes more than one of the `n` bytes being skipped.
    pub fn advance_bytes(&mut self, n: usize) {
        let mut consumed = 0;
        while consumed < n {
            match self.advance() {
                Some(ch) => consumed += ch.len_utf8(),
                None => break,
            }
        }
    }
}
