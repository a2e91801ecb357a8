//! Selection and scroll state shared by the list-like panes

use crate::config;
use crossterm::event::KeyCode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListCursor {
    selected: usize,
    top: usize,
}

impl ListCursor {
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// First visible row
    pub fn top(&self) -> usize {
        self.top
    }

    pub fn move_by(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        let max = (len - 1) as isize;
        self.selected = (self.selected as isize).saturating_add(delta).clamp(0, max) as usize;
    }

    pub fn select(&mut self, index: usize, len: usize) {
        self.selected = index.min(len.saturating_sub(1));
    }

    /// Keep the selection valid after the list shrank
    pub fn clamp(&mut self, len: usize) {
        self.select(self.selected, len);
        self.top = self.top.min(self.selected);
    }

    /// Scroll so the selection is inside a `height`-row view
    pub fn scroll_into_view(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.top {
            self.top = self.selected;
        } else if self.selected >= self.top + height {
            self.top = self.selected + 1 - height;
        }
    }

    /// Apply a navigation key; returns whether it was one
    pub fn navigate(&mut self, code: KeyCode, len: usize, page: usize) -> bool {
        let page = page.saturating_sub(config::PAGE_OVERLAP).max(1) as isize;
        match code {
            KeyCode::Up => self.move_by(-1, len),
            KeyCode::Down => self.move_by(1, len),
            KeyCode::PageUp => self.move_by(-page, len),
            KeyCode::PageDown => self.move_by(page, len),
            KeyCode::Home => self.select(0, len),
            KeyCode::End => self.select(usize::MAX, len),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_clamps() {
        let mut cursor = ListCursor::default();
        cursor.move_by(-3, 10);
        assert_eq!(cursor.selected(), 0);
        cursor.move_by(25, 10);
        assert_eq!(cursor.selected(), 9);
        cursor.move_by(1, 0);
        assert_eq!(cursor.selected(), 0);
    }

    #[test]
    fn test_scroll_into_view() {
        let mut cursor = ListCursor::default();
        cursor.select(12, 20);
        cursor.scroll_into_view(5);
        assert_eq!(cursor.top(), 8);
        cursor.select(3, 20);
        cursor.scroll_into_view(5);
        assert_eq!(cursor.top(), 3);
    }

    #[test]
    fn test_navigate_keys() {
        let mut cursor = ListCursor::default();
        assert!(cursor.navigate(KeyCode::PageDown, 100, 10));
        assert_eq!(cursor.selected(), 9);
        assert!(cursor.navigate(KeyCode::End, 100, 10));
        assert_eq!(cursor.selected(), 99);
        assert!(cursor.navigate(KeyCode::Home, 100, 10));
        assert_eq!(cursor.selected(), 0);
        assert!(!cursor.navigate(KeyCode::Enter, 100, 10));
    }

    #[test]
    fn test_clamp_after_shrink() {
        let mut cursor = ListCursor::default();
        cursor.select(8, 10);
        cursor.scroll_into_view(3);
        cursor.clamp(4);
        assert_eq!(cursor.selected(), 3);
        assert!(cursor.top() <= 3);
    }
}
