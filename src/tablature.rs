//! Plain-text tablature: fixed-width six-line blocks with rest gaps for
//! silence between strokes, plus the header/file format around them.
//!
//! Strings are stored bass-to-treble and printed treble-first (e B G D A E),
//! each line as `"<LABEL> |<content>|"` with the label uppercased.

use crate::error::TabError;
use crate::types::*;
use log::info;
use std::fmt;
use std::io::{self, Write};
use std::path::Path;

/// One fixed-width chunk of tablature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabBlock {
    /// Per-string content, indexed by `StringLabel::index()` (bass to treble)
    pub lines: [String; NUM_STRINGS],
}

impl TabBlock {
    pub fn width(&self) -> usize {
        self.lines[0].chars().count()
    }

    /// The six printed lines, treble string first.
    pub fn render_lines(&self) -> Vec<String> {
        StringLabel::ALL
            .iter()
            .rev()
            .map(|s| format!("{} |{}|", s.name().to_uppercase(), self.lines[s.index()]))
            .collect()
    }

    /// Read back a block printed by [`render_lines`](Self::render_lines).
    pub fn parse<S: AsRef<str>>(printed: &[S]) -> Result<Self, TabError> {
        if printed.len() != NUM_STRINGS {
            return Err(TabError::parse(format!(
                "expected {} lines, got {}",
                NUM_STRINGS,
                printed.len()
            )));
        }

        let mut lines: [String; NUM_STRINGS] = Default::default();
        for (line, string) in printed.iter().zip(StringLabel::ALL.iter().rev()) {
            let line = line.as_ref();
            let prefix = format!("{} |", string.name().to_uppercase());
            let content = line
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_suffix('|'))
                .ok_or_else(|| {
                    TabError::parse(format!("line for {} is not `{}…|`: {:?}", string, prefix, line))
                })?;
            if let Some(bad) = content.chars().find(|c| *c != REST && !c.is_ascii_digit()) {
                return Err(TabError::parse(format!(
                    "unexpected character {:?} on {} string",
                    bad, string
                )));
            }
            lines[string.index()] = content.to_string();
        }

        let width = lines[0].len();
        if lines.iter().any(|l| l.len() != width) {
            return Err(TabError::parse("string lines differ in length"));
        }
        Ok(Self { lines })
    }
}

impl fmt::Display for TabBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.render_lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Lays stroke columns out into fixed-width blocks.
///
/// Frames between consecutive strokes become rest columns, one per frame.
/// Once the running lines reach `line_length` they are padded to a whole
/// number of blocks and sliced.
#[derive(Debug, Clone)]
pub struct TabRenderer {
    line_length: usize,
    running: [String; NUM_STRINGS],
    prev_end: Option<usize>,
    blocks: Vec<TabBlock>,
}

impl TabRenderer {
    pub fn new(line_length: usize) -> Self {
        Self {
            line_length: line_length.max(1),
            running: Default::default(),
            prev_end: None,
            blocks: Vec::new(),
        }
    }

    /// Append one stroke's column. Strokes must arrive in start order.
    pub fn push(&mut self, column: &StrokeColumn, start_frame: usize, end_frame: usize) {
        if let Some(prev_end) = self.prev_end {
            let gap = start_frame.saturating_sub(prev_end + 1);
            self.push_rests(gap);
        }
        self.prev_end = Some(end_frame);

        let tokens: Vec<String> = StringLabel::ALL.iter().map(|s| column.token(*s)).collect();
        let width = tokens.iter().map(String::len).max().unwrap_or(1);
        for (line, token) in self.running.iter_mut().zip(&tokens) {
            line.push_str(token);
            pad_to(line, line.len() + width - token.len());
        }

        if self.running.iter().all(|l| l.len() >= self.line_length) {
            self.flush_full();
        }
    }

    /// Append `count` all-rest columns.
    pub fn push_rests(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        for line in self.running.iter_mut() {
            pad_to(line, line.len() + count);
        }
    }

    fn flush_full(&mut self) {
        let len = self.running[0].len();
        let padded = len.div_ceil(self.line_length) * self.line_length;
        let running = std::mem::take(&mut self.running);
        let padded_lines: Vec<String> = running
            .into_iter()
            .map(|mut l| {
                pad_to(&mut l, padded);
                l
            })
            .collect();

        for offset in (0..padded).step_by(self.line_length) {
            let lines = std::array::from_fn(|i| {
                padded_lines[i][offset..offset + self.line_length].to_string()
            });
            self.blocks.push(TabBlock { lines });
        }
    }

    /// Blocks completed so far.
    pub fn blocks(&self) -> &[TabBlock] {
        &self.blocks
    }

    /// Flush the partial block, padded with rests to `line_length`.
    pub fn finish(mut self) -> Vec<TabBlock> {
        if self.running.iter().any(|l| !l.is_empty()) {
            let running = std::mem::take(&mut self.running);
            let lines = running.map(|mut l| {
                pad_to(&mut l, self.line_length);
                l
            });
            self.blocks.push(TabBlock { lines });
        }
        self.blocks
    }
}

fn pad_to(line: &mut String, len: usize) {
    while line.len() < len {
        line.push(REST);
    }
}

// ─── Output file ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct TabHeader {
    pub title: String,
    pub artist: String,
    pub tempo: u32,
    pub instrument: String,
}

impl TabHeader {
    pub const DEFAULT_INSTRUMENT: &'static str = "Guitar, standard tuning (E A D G B e)";
}

impl Default for TabHeader {
    fn default() -> Self {
        Self {
            title: "Untitled".to_string(),
            artist: "Unknown".to_string(),
            tempo: 120,
            instrument: Self::DEFAULT_INSTRUMENT.to_string(),
        }
    }
}

/// Header plus blocks: the complete text artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct TabDocument {
    pub header: TabHeader,
    pub blocks: Vec<TabBlock>,
}

impl TabDocument {
    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        writeln!(w, "Title: {}", self.header.title)?;
        writeln!(w, "Artist: {}", self.header.artist)?;
        writeln!(w, "Tempo: {}", self.header.tempo)?;
        writeln!(w, "{}", self.header.instrument)?;
        writeln!(w)?;
        for block in &self.blocks {
            write!(w, "{}", block)?;
            writeln!(w)?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), TabError> {
        let file =
            std::fs::File::create(path).map_err(|e| TabError::io("creating tab file", e))?;
        let mut writer = io::BufWriter::new(file);
        self.write_to(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| TabError::io("writing tab file", e))?;
        info!("Tab saved: {} blocks → {:?}", self.blocks.len(), path);
        Ok(())
    }
}

impl fmt::Display for TabDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        self.write_to(&mut buf).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(frets: &[(StringLabel, usize)]) -> StrokeColumn {
        let mut c = StrokeColumn::default();
        for &(s, f) in frets {
            c.set(s, f);
        }
        c
    }

    fn line(block: &TabBlock, s: StringLabel) -> &str {
        &block.lines[s.index()]
    }

    #[test]
    fn test_single_column_padded_to_block() {
        let mut r = TabRenderer::new(10);
        r.push(&column(&[(StringLabel::G, 3)]), 0, 0);
        let blocks = r.finish();
        assert_eq!(blocks.len(), 1);
        assert_eq!(line(&blocks[0], StringLabel::G), "3---------");
        assert_eq!(line(&blocks[0], StringLabel::LowE), "----------");
        assert_eq!(blocks[0].width(), 10);
    }

    #[test]
    fn test_silence_gap_inserts_rest_columns() {
        let mut r = TabRenderer::new(60);
        r.push(&column(&[(StringLabel::A, 2)]), 3, 5);
        r.push(&column(&[(StringLabel::A, 7)]), 10, 10);
        let blocks = r.finish();
        // 10 - 5 - 1 = 4 rests between the two notes
        assert!(line(&blocks[0], StringLabel::A).starts_with("2----7-"));
    }

    #[test]
    fn test_adjacent_strokes_have_no_gap() {
        let mut r = TabRenderer::new(8);
        r.push(&column(&[(StringLabel::D, 1)]), 0, 2);
        r.push(&column(&[(StringLabel::D, 2)]), 3, 4);
        let blocks = r.finish();
        assert_eq!(line(&blocks[0], StringLabel::D), "12------");
    }

    #[test]
    fn test_multi_digit_frets_keep_columns_aligned() {
        let mut r = TabRenderer::new(6);
        r.push(&column(&[(StringLabel::HighE, 12), (StringLabel::B, 3)]), 0, 0);
        let blocks = r.finish();
        assert_eq!(line(&blocks[0], StringLabel::HighE), "12----");
        assert_eq!(line(&blocks[0], StringLabel::B), "3-----");
        assert_eq!(line(&blocks[0], StringLabel::G), "------");
    }

    #[test]
    fn test_wraps_at_line_length() {
        let mut r = TabRenderer::new(4);
        for i in 0..5 {
            r.push(&column(&[(StringLabel::LowE, i)]), i, i);
        }
        assert_eq!(r.blocks().len(), 1);
        let blocks = r.finish();
        assert_eq!(blocks.len(), 2);
        assert_eq!(line(&blocks[0], StringLabel::LowE), "0123");
        assert_eq!(line(&blocks[1], StringLabel::LowE), "4---");
    }

    #[test]
    fn test_long_gap_spans_several_blocks() {
        let mut r = TabRenderer::new(5);
        r.push(&column(&[(StringLabel::G, 1)]), 0, 0);
        r.push(&column(&[(StringLabel::G, 2)]), 12, 12);
        let blocks = r.finish();
        // 1 + 11 rests + 2 = 13 chars, padded to 15 and sliced
        assert_eq!(blocks.len(), 3);
        assert_eq!(line(&blocks[0], StringLabel::G), "1----");
        assert_eq!(line(&blocks[1], StringLabel::G), "-----");
        assert_eq!(line(&blocks[2], StringLabel::G), "--2--");
        for b in &blocks {
            assert!(b.lines.iter().all(|l| l.len() == 5));
        }
    }

    #[test]
    fn test_no_strokes_no_blocks() {
        assert!(TabRenderer::new(60).finish().is_empty());
    }

    #[test]
    fn test_render_order_and_shape() {
        let mut r = TabRenderer::new(5);
        r.push(&column(&[(StringLabel::HighE, 0), (StringLabel::LowE, 3)]), 0, 0);
        let printed = r.finish()[0].render_lines();
        assert_eq!(
            printed,
            vec![
                "E |0----|",
                "B |-----|",
                "G |-----|",
                "D |-----|",
                "A |-----|",
                "E |3----|",
            ]
        );
    }

    #[test]
    fn test_parse_recovers_rendered_block() {
        let mut r = TabRenderer::new(12);
        r.push(&column(&[(StringLabel::G, 3), (StringLabel::B, 10)]), 0, 1);
        r.push(&column(&[(StringLabel::A, 5)]), 4, 4);
        let block = r.finish().remove(0);
        let printed = block.render_lines();
        for l in &printed {
            assert_eq!(l.len(), "E |".len() + 12 + 1);
        }
        let parsed = TabBlock::parse(&printed).unwrap();
        assert_eq!(parsed, block);
        assert_eq!(line(&parsed, StringLabel::B), "10----------");
        assert_eq!(line(&parsed, StringLabel::G), "3-----------");
        assert_eq!(line(&parsed, StringLabel::A), "----5-------");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(TabBlock::parse(&["E |---|"]).is_err());
        let mut lines = vec!["E |---|", "B |---|", "G |---|", "D |---|", "A |---|", "E |---|"];
        lines[1] = "B |-x-|";
        assert!(TabBlock::parse(&lines).is_err());
        lines[1] = "G |---|";
        assert!(TabBlock::parse(&lines).is_err());
        lines[1] = "B |----|";
        assert!(TabBlock::parse(&lines).is_err());
        lines[1] = "B |---|";
        assert!(TabBlock::parse(&lines).is_ok());
    }

    #[test]
    fn test_document_format() {
        let doc = TabDocument {
            header: TabHeader {
                title: "Song".into(),
                artist: "Band".into(),
                tempo: 90,
                ..TabHeader::default()
            },
            blocks: vec![TabBlock {
                lines: std::array::from_fn(|_| "--".to_string()),
            }],
        };
        let text = doc.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Title: Song");
        assert_eq!(lines[1], "Artist: Band");
        assert_eq!(lines[2], "Tempo: 90");
        assert_eq!(lines[3], TabHeader::DEFAULT_INSTRUMENT);
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "E |--|");
        assert_eq!(lines[10], "E |--|");
        assert_eq!(lines[11], "");
        assert_eq!(lines.len(), 12);
    }
}
