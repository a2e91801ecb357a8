//! Read-only document pane

use crate::config;
use crate::dialog::Dialog;
use crate::document::Document;
use crate::legend::HelpPanel;
use crate::list::ListCursor;
use crate::provider::{ContentProvider, Frame};
use crate::surface::{Attrs, Canvas, Style};
use crossterm::event::{KeyCode, KeyEvent};
use std::path::Path;

pub struct Viewer {
    name: String,
    doc: Document,
    cursor: ListCursor,
    // Char offset of the cursor within its line
    column: usize,
    // Display column kept across vertical moves
    goal: usize,
    // First display column shown
    left: usize,
    // Rows visible at the last paint, used for paging
    height: usize,
}

impl Viewer {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let doc = Document::open(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        log::debug!("Viewing {} ({} lines)", path.display(), doc.line_count());
        Ok(Self::new(name, doc))
    }

    pub fn new(name: impl Into<String>, doc: Document) -> Self {
        Self {
            name: name.into(),
            doc,
            cursor: ListCursor::default(),
            column: 0,
            goal: 0,
            left: 0,
            height: 0,
        }
    }

    fn line_len(&self) -> usize {
        self.doc.line(self.cursor.selected()).chars().count()
    }

    /// Display column of the cursor
    fn display_column(&self) -> usize {
        self.doc.column_for_char(self.column, self.cursor.selected())
    }

    fn move_column(&mut self, code: KeyCode) -> bool {
        let column = match code {
            KeyCode::Left => self.column.saturating_sub(1),
            KeyCode::Right => (self.column + 1).min(self.line_len()),
            _ => return false,
        };
        self.column = column;
        self.goal = self.display_column();
        true
    }

    fn scroll_to_cursor(&mut self, width: usize) {
        let column = self.display_column();
        if column < self.left {
            self.left = column;
        } else if width > 0 && column >= self.left + width {
            self.left = column + 1 - width;
        }
    }
}

impl ContentProvider for Viewer {
    fn paint(&mut self, canvas: &mut Canvas<'_>, focused: bool) {
        self.height = canvas.height() as usize;
        self.cursor.scroll_into_view(self.height);
        self.scroll_to_cursor(canvas.width() as usize);

        let top = self.cursor.top();
        for row in 0..canvas.height() {
            let index = top + row as usize;
            let current = focused && index == self.cursor.selected();
            let style = if current {
                Style::default().with(Attrs::REVERSE)
            } else {
                Style::default()
            };
            canvas.fill_row(row, ' ', style);
            if index >= self.doc.line_count() {
                canvas.put_str(0, row, "~", Style::default().with(Attrs::DIM));
                continue;
            }
            let visible: String = self.doc.expand_line(index).chars().skip(self.left).collect();
            canvas.put_str(0, row, &visible, style);
            if current {
                // The cursor cell stands out from the highlighted line
                let x = self.display_column() - self.left;
                let ch = visible.chars().nth(x).unwrap_or(' ');
                canvas.put_char(x.min(u16::MAX as usize) as u16, row, ch, Style::default());
            }
        }
    }

    fn process(&mut self, frame: &mut Frame, key: KeyEvent) -> bool {
        if key.code == config::KEY_CLOSE_PANE && key.modifiers.contains(config::CLOSE_PANE_MODIFIERS) {
            Dialog::show(
                frame,
                format!("Close {}? (y/n)", self.name),
                |frame| frame.request_close(),
                |_| {},
            );
            return true;
        }
        if self.move_column(key.code) {
            frame.request_repaint();
        } else if self.cursor.navigate(key.code, self.doc.line_count(), self.height) {
            self.column = self.doc.char_for_column(self.goal, self.cursor.selected());
            frame.request_repaint();
        }
        true
    }

    fn title(&self) -> String {
        self.name.clone()
    }

    fn status(&self) -> Option<String> {
        Some(format!(
            "Ln {}/{}, Col {}",
            self.cursor.selected() + 1,
            self.doc.line_count(),
            self.display_column() + 1
        ))
    }

    fn set_help(&self, panel: &mut HelpPanel) {
        panel.add("←↑↓→", "Move");
        panel.add("PgUp/PgDn", "Page");
        panel.add("^W", "Close");
    }
}
