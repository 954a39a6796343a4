//! Byte cursor over the source text.
//!
//! Reads past the end return `0`, which no token starts with, so the
//! scanner never needs explicit bounds checks.

#[derive(Clone, Copy, Debug)]
pub(crate) struct Cursor<'a> {
    src: &'a str,
    pos: u32,
}

impl<'a> Cursor<'a> {
    /// The caller guarantees `src.len() <= u32::MAX`.
    pub(crate) fn new(src: &'a str) -> Self {
        Cursor { src, pos: 0 }
    }

    #[inline]
    fn byte_at(&self, pos: u32) -> u8 {
        self.src.as_bytes().get(pos as usize).copied().unwrap_or(0)
    }

    #[inline]
    pub(crate) fn current(&self) -> u8 {
        self.byte_at(self.pos)
    }

    #[inline]
    pub(crate) fn peek(&self) -> u8 {
        self.byte_at(self.pos + 1)
    }

    #[inline]
    pub(crate) fn pos(&self) -> u32 {
        self.pos
    }

    #[inline]
    pub(crate) fn is_eof(&self) -> bool {
        self.pos as usize >= self.src.len()
    }

    #[inline]
    pub(crate) fn advance(&mut self) {
        self.pos += 1;
    }

    /// Consume the current byte if it equals `expected`.
    #[inline]
    pub(crate) fn eat(&mut self, expected: u8) -> bool {
        if !self.is_eof() && self.current() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while !self.is_eof() && pred(self.current()) {
            self.pos += 1;
        }
    }

    fn remaining(&self) -> &'a [u8] {
        self.src
            .as_bytes()
            .get(self.pos as usize..)
            .unwrap_or_default()
    }

    /// Move to the next `\n` (not consumed) or to the end of input.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "offsets are bounded by the source length, which fits in u32"
    )]
    pub(crate) fn eat_until_newline_or_eof(&mut self) {
        match memchr::memchr(b'\n', self.remaining()) {
            Some(offset) => self.pos += offset as u32,
            None => self.pos = self.src.len() as u32,
        }
    }

    /// Move to the next `"` (not consumed). Returns the number of newlines
    /// skipped and whether the quote was found.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "offsets are bounded by the source length, which fits in u32"
    )]
    pub(crate) fn skip_to_quote(&mut self) -> (u32, bool) {
        let remaining = self.remaining();
        let (body, found) = match memchr::memchr(b'"', remaining) {
            Some(offset) => (&remaining[..offset], true),
            None => (remaining, false),
        };
        let newlines = memchr::memchr_iter(b'\n', body).count() as u32;
        self.pos += body.len() as u32;
        (newlines, found)
    }

    pub(crate) fn slice(&self, start: u32, end: u32) -> &'a str {
        self.src.get(start as usize..end as usize).unwrap_or_default()
    }

    pub(crate) fn slice_from(&self, start: u32) -> &'a str {
        self.slice(start, self.pos)
    }
}
