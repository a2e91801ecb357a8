//! Content providers - the panes a window displays

use crate::dialog::Dialog;
use crate::legend::HelpPanel;
use crate::surface::Canvas;
use crossterm::event::KeyEvent;

/// Capability implemented by every pane type (viewer, browser, menu, ...).
/// A window holds exactly one and never inspects its concrete type.
pub trait ContentProvider {
    /// One-time hookup when the owning window is built
    fn open(&mut self, _frame: &mut Frame) {}

    /// Draw the whole content region
    fn paint(&mut self, canvas: &mut Canvas<'_>, focused: bool);

    /// Handle a key; returns whether the window should stay open
    fn process(&mut self, frame: &mut Frame, key: KeyEvent) -> bool;

    /// Idle tick between keys; returns whether the window should stay open
    fn poll(&mut self, _frame: &mut Frame) -> bool {
        true
    }

    fn title(&self) -> String;

    fn status(&self) -> Option<String> {
        None
    }

    /// Populate key legend hints
    fn set_help(&self, _panel: &mut HelpPanel) {}
}

/// Requests a provider (or dialog action) makes of its hosting window
/// during a single call. The window applies them afterwards.
#[derive(Default)]
pub struct Frame {
    repaint: bool,
    close: bool,
    dialogs: Vec<Dialog>,
    spawned: Vec<Box<dyn ContentProvider>>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content changed and must be repainted
    pub fn request_repaint(&mut self) {
        self.repaint = true;
    }

    /// Close the hosting window once this call returns
    pub fn request_close(&mut self) {
        self.close = true;
    }

    /// Overlay a modal prompt on the hosting window. Prompts requested
    /// while another is showing wait their turn.
    pub fn show_dialog(&mut self, dialog: Dialog) {
        if !self.dialogs.is_empty() {
            log::debug!("Queueing dialog {:?} behind an earlier request", dialog.text());
        }
        self.dialogs.push(dialog);
    }

    /// Ask the shell to open another window
    pub fn spawn(&mut self, provider: Box<dyn ContentProvider>) {
        self.spawned.push(provider);
    }

    pub fn repaint_requested(&self) -> bool {
        self.repaint
    }

    pub fn close_requested(&self) -> bool {
        self.close
    }

    /// Requested dialogs, oldest first
    pub(crate) fn take_dialogs(&mut self) -> Vec<Dialog> {
        std::mem::take(&mut self.dialogs)
    }

    pub(crate) fn take_spawned(&mut self) -> Vec<Box<dyn ContentProvider>> {
        std::mem::take(&mut self.spawned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialogs_kept_in_request_order() {
        let mut frame = Frame::new();
        Dialog::show(&mut frame, "First?", |_| {}, |_| {});
        Dialog::show(&mut frame, "Second?", |_| {}, |_| {});
        let texts: Vec<String> = frame.take_dialogs().iter().map(|d| d.text().to_string()).collect();
        assert_eq!(texts, ["First?", "Second?"]);
        assert!(frame.take_dialogs().is_empty());
    }
}
