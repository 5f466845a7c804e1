//! Per-call analysis context: raw source, split lines, and offset math.
//!
//! rustpython node ranges are byte offsets into the source; rule checks and
//! the parse-error path want 1-based lines and 0-based columns. The
//! [`LineIndex`] does that translation once per `analyze` call.

use rustpython_parser::ast;

/// Byte-offset to line/column translation for one source string.
#[derive(Debug)]
pub struct LineIndex<'a> {
    source: &'a str,
    /// Byte offset of the start of each line.
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        Self { source, line_starts }
    }

    /// Translate a byte offset to (1-based line, 0-based column).
    ///
    /// The column counts characters, not bytes, so multi-byte characters
    /// earlier on the line do not skew it. Offsets past the end of the
    /// source clamp to the end of the last line.
    pub fn location(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.source.len());
        let line_idx = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts[line_idx];
        let column = self
            .source
            .get(line_start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset - line_start);
        (line_idx + 1, column)
    }
}

/// Everything a rule check needs for one `analyze` call.
pub struct AnalysisContext<'a> {
    pub source: &'a str,
    pub lines: Vec<&'a str>,
    pub suite: &'a [ast::Stmt],
    index: LineIndex<'a>,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(source: &'a str, suite: &'a [ast::Stmt]) -> Self {
        Self {
            source,
            lines: source.split('\n').collect(),
            suite,
            index: LineIndex::new(source),
        }
    }

    /// (1-based line, 0-based column) for a byte offset.
    pub fn location(&self, offset: usize) -> (usize, usize) {
        self.index.location(offset)
    }

    /// Trimmed content of a 1-based line; empty for out-of-range lines.
    pub fn snippet(&self, line: usize) -> &'a str {
        line.checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(|content| content.trim())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_locations() {
        let index = LineIndex::new("abc\ndef\n\nghi");
        assert_eq!(index.location(0), (1, 0));
        assert_eq!(index.location(2), (1, 2));
        assert_eq!(index.location(4), (2, 0));
        assert_eq!(index.location(8), (3, 0));
        assert_eq!(index.location(9), (4, 0));
        assert_eq!(index.location(11), (4, 2));
        // Past the end clamps to the end of the last line.
        assert_eq!(index.location(100), (4, 3));
    }

    #[test]
    fn test_location_counts_characters_not_bytes() {
        // 'é' is two bytes; columns after it must not drift.
        let index = LineIndex::new("s = \"héllo\"\nx = 1");
        // Byte offset of the closing quote is 11; it is the 11th character
        // (0-based column 10).
        assert_eq!(index.location(11), (1, 10));
        assert_eq!(index.location(13), (2, 0));
    }

    #[test]
    fn test_snippet_trims_and_bounds() {
        let suite = vec![];
        let ctx = AnalysisContext::new("  x = 1  \ny = 2", &suite);
        assert_eq!(ctx.snippet(1), "x = 1");
        assert_eq!(ctx.snippet(2), "y = 2");
        assert_eq!(ctx.snippet(0), "");
        assert_eq!(ctx.snippet(3), "");
    }
}
