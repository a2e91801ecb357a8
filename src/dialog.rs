//! Yes/no dialog - a one-row modal prompt over a window's bottom row

use crate::config;
use crate::legend::HelpPanel;
use crate::provider::Frame;
use crate::surface::{Attrs, Canvas, Rect, Style};
use crossterm::event::{KeyCode, KeyEvent};

/// Callback fired when the user answers
pub type Action = Box<dyn FnOnce(&mut Frame)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Open,
    Resolved,
}

/// Single-shot prompt: exactly one of its actions fires, once
pub struct Dialog {
    text: String,
    yes: Option<Action>,
    no: Option<Action>,
    state: DialogState,
}

impl Dialog {
    /// Panics if `text` is empty
    pub fn new(
        text: impl Into<String>,
        yes: impl FnOnce(&mut Frame) + 'static,
        no: impl FnOnce(&mut Frame) + 'static,
    ) -> Self {
        let text = text.into();
        assert!(!text.is_empty(), "dialog prompt must not be empty");
        Self {
            text,
            yes: Some(Box::new(yes)),
            no: Some(Box::new(no)),
            state: DialogState::Open,
        }
    }

    /// Build a dialog and ask the frame's window to show it
    pub fn show(
        frame: &mut Frame,
        text: impl Into<String>,
        yes: impl FnOnce(&mut Frame) + 'static,
        no: impl FnOnce(&mut Frame) + 'static,
    ) {
        frame.show_dialog(Self::new(text, yes, no));
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    #[cfg(test)]
    pub fn state(&self) -> DialogState {
        self.state
    }

    /// The single bottom row of `region`, full width
    pub fn layout(region: Rect) -> Rect {
        Rect::new(
            region.x,
            region.y + region.height.saturating_sub(1),
            region.width,
            region.height.min(1),
        )
    }

    /// Returns false once answered, telling the host to tear it down
    pub fn process(&mut self, frame: &mut Frame, key: KeyEvent) -> bool {
        if self.state == DialogState::Resolved {
            return false;
        }
        let chosen = match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => self.yes.take(),
            KeyCode::Char('n') | KeyCode::Char('N') => self.no.take(),
            _ => return true,
        };
        self.yes = None;
        self.no = None;
        self.state = DialogState::Resolved;
        log::debug!("Dialog {:?} resolved by {:?}", self.text, key.code);
        if let Some(action) = chosen {
            action(frame);
        }
        false
    }

    pub fn set_help(&self, panel: &mut HelpPanel) {
        panel.add("Y", "Yes");
        panel.add("N", "No");
    }

    pub fn paint(&self, canvas: &mut Canvas<'_>, focused: bool) {
        let style = if focused {
            Style::default()
                .fg(config::COLOR_DIALOG_FG)
                .bg(config::COLOR_DIALOG_BG)
        } else {
            Style::default().with(Attrs::REVERSE)
        };
        canvas.fill_row(0, ' ', style);
        canvas.put_str(0, 0, &self.text, style);
    }
}
