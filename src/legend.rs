//! Key legend - hints reported by panes and dialogs, drawn on the bottom row

use crate::config;
use crate::error::Result;
use crate::surface::{Attrs, Canvas, Rect, SharedBackend, Style, SurfaceId};

/// One legend entry, e.g. ("Y", "Yes")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyHint {
    pub key: String,
    pub description: String,
}

/// Ordered set of key hints; purely advisory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelpPanel {
    hints: Vec<KeyHint>,
}

impl HelpPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, description: impl Into<String>) {
        self.hints.push(KeyHint {
            key: key.into(),
            description: description.into(),
        });
    }

    pub fn hints(&self) -> &[KeyHint] {
        &self.hints
    }

    pub fn extend(&mut self, other: &HelpPanel) {
        self.hints.extend(other.hints.iter().cloned());
    }
}

/// One-row legend surface pinned to the bottom of the screen
pub struct HelpBar {
    screen: SharedBackend,
    surface: SurfaceId,
}

impl HelpBar {
    pub fn new(screen: SharedBackend) -> Result<Self> {
        let surface = screen.borrow_mut().create(Rect::default())?;
        Ok(Self { screen, surface })
    }

    /// Pin to the last row of a `width` x `height` screen
    pub fn layout(&mut self, width: u16, height: u16) -> Result<()> {
        let target = Rect::new(0, height.saturating_sub(1), width, height.min(1));
        let mut screen = self.screen.borrow_mut();
        match screen.bounds(self.surface) {
            Some(rect) if rect.same_size(&target) => {
                if !rect.same_origin(&target) {
                    screen.move_to(self.surface, target.x, target.y);
                }
            }
            _ => self.surface = screen.replace(self.surface, target)?,
        }
        screen.raise(self.surface);
        Ok(())
    }

    pub fn paint(&self, panel: &HelpPanel) -> Result<()> {
        let mut screen = self.screen.borrow_mut();
        let mut canvas = Canvas::new(&mut *screen, self.surface)?;
        canvas.fill_row(0, ' ', Style::default());

        let key_style = Style::default()
            .fg(config::COLOR_LEGEND_KEY)
            .with(Attrs::BOLD);
        let mut x = 1u16;
        for hint in panel.hints() {
            if x >= canvas.width() {
                break;
            }
            x += canvas.put_str(x, 0, &hint.key, key_style);
            x += canvas.put_str(x, 0, " ", Style::default());
            x += canvas.put_str(x, 0, &hint.description, Style::default());
            x = x.saturating_add(2);
        }
        Ok(())
    }
}

impl Drop for HelpBar {
    fn drop(&mut self) {
        if let Ok(mut screen) = self.screen.try_borrow_mut() {
            screen.destroy(self.surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::CellScreen;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_panel_order() {
        let mut panel = HelpPanel::new();
        panel.add("Y", "Yes");
        panel.add("N", "No");
        let keys: Vec<_> = panel.hints().iter().map(|h| h.key.as_str()).collect();
        assert_eq!(keys, ["Y", "N"]);
    }

    #[test]
    fn test_bar_renders_bottom_row() {
        let screen = Rc::new(RefCell::new(CellScreen::new(30, 4)));
        let mut bar = HelpBar::new(screen.clone()).unwrap();
        bar.layout(30, 4).unwrap();

        let mut panel = HelpPanel::new();
        panel.add("Y", "Yes");
        panel.add("N", "No");
        bar.paint(&panel).unwrap();

        assert_eq!(screen.borrow().screen_row(3).trim_end(), " Y Yes  N No");
    }
}
