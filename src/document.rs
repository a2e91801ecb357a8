//! Document - maps a text buffer onto a plane of equally sized cells
//!
//! Tabs advance to the next multiple of `TAB_WIDTH`; every other char
//! occupies one column.

use std::path::Path;

pub const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct Document {
    lines: Vec<String>,
}

impl Document {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::from_text(&String::from_utf8_lossy(&bytes)))
    }

    pub fn from_text(text: &str) -> Self {
        let mut lines: Vec<String> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        // A trailing newline does not start another line
        if lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        Self { lines }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> &str {
        self.lines.get(index).map(String::as_str).unwrap_or("")
    }

    /// Columns a char occupies when it starts at column `column`
    pub fn char_width(ch: char, column: usize) -> usize {
        if ch == '\t' {
            TAB_WIDTH - column % TAB_WIDTH
        } else {
            1
        }
    }

    /// Display column where the char at `offset` starts
    pub fn column_for_char(&self, offset: usize, line: usize) -> usize {
        self.line(line)
            .chars()
            .take(offset)
            .fold(0, |column, ch| column + Self::char_width(ch, column))
    }

    /// Char offset covering display column `column`; clamps to the line end
    pub fn char_for_column(&self, column: usize, line: usize) -> usize {
        let mut h = 0;
        for (offset, ch) in self.line(line).chars().enumerate() {
            h += Self::char_width(ch, h);
            if h > column {
                return offset;
            }
        }
        self.line(line).chars().count()
    }

    /// The line with tabs expanded to spaces
    pub fn expand_line(&self, line: usize) -> String {
        let mut out = String::new();
        for ch in self.line(line).chars() {
            if ch == '\t' {
                let width = Self::char_width(ch, out.chars().count());
                out.extend(std::iter::repeat(' ').take(width));
            } else {
                out.push(ch);
            }
        }
        out
    }
}
