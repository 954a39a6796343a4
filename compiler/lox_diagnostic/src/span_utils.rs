//! Line and column lookup for spans.
//!
//! Tokens only carry byte offsets; terminal output wants `line:col`.

/// Byte offset of every line start, for O(log L) lookups.
///
/// ```
/// use lox_diagnostic::span_utils::LineOffsetTable;
///
/// let source = "1 +\n  nil";
/// let table = LineOffsetTable::build(source);
///
/// assert_eq!(table.offset_to_line_col(source, 0), (1, 1));
/// assert_eq!(table.offset_to_line_col(source, 6), (2, 3));
/// ```
#[derive(Clone, Debug, Default)]
pub struct LineOffsetTable {
    /// `offsets[i]` is where line `i + 1` begins.
    offsets: Vec<u32>,
}

impl LineOffsetTable {
    pub fn build(source: &str) -> Self {
        let mut offsets = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                offsets.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
            }
        }
        LineOffsetTable { offsets }
    }

    /// 1-based line containing `offset`.
    #[inline]
    pub fn line_from_offset(&self, offset: u32) -> u32 {
        let line_idx = match self.offsets.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert.saturating_sub(1),
        };
        u32::try_from(line_idx).unwrap_or(u32::MAX - 1) + 1
    }

    /// 1-based `(line, column)`; the column counts characters, not bytes.
    pub fn offset_to_line_col(&self, source: &str, offset: u32) -> (u32, u32) {
        let line = self.line_from_offset(offset);
        let line_start = self
            .offsets
            .get((line - 1) as usize)
            .copied()
            .unwrap_or(0) as usize;
        let end = (offset as usize).min(source.len());

        let col = source
            .get(line_start..end)
            .map_or(0, |text| text.chars().count());
        let col = u32::try_from(col).unwrap_or(u32::MAX - 1) + 1;

        (line, col)
    }

    /// Source text of a 1-based line, without its newline.
    pub fn line_text<'s>(&self, source: &'s str, line: u32) -> Option<&'s str> {
        let idx = line.checked_sub(1)? as usize;
        let start = *self.offsets.get(idx)? as usize;
        let end = self
            .offsets
            .get(idx + 1)
            .map_or(source.len(), |next| *next as usize);
        source
            .get(start..end)
            .map(|text| text.trim_end_matches(['\n', '\r']))
    }

    pub fn line_count(&self) -> usize {
        self.offsets.len()
    }
}
