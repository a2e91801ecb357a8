//! Shell - owns the open windows, slices the screen between them and
//! routes keys to the focused one

use crate::config::{self, Settings};
use crate::error::Result;
use crate::legend::{HelpBar, HelpPanel};
use crate::projects::{self, ProjectMenu};
use crate::provider::ContentProvider;
use crate::surface::{Backend, CellScreen};
use crate::window::Window;
use crossterm::event::KeyEvent;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Split `width` columns into `count` side-by-side slices as
/// (column, width) pairs. Neighbours are one column apart so that they
/// share the border drawn there. Leftover columns go to the first slices.
pub fn slices(width: u16, count: usize) -> Vec<(u16, u16)> {
    if count == 0 {
        return Vec::new();
    }
    let count = count.min(u16::MAX as usize) as u16;
    let usable = width.saturating_sub(count - 1);
    let base = usable / count;
    let remainder = usable % count;

    let mut result = Vec::with_capacity(count as usize);
    let mut column = 0u16;
    for i in 0..count {
        let extra = if i < remainder { 1 } else { 0 };
        let slice = base + extra;
        // Degenerate screens stack leftover windows on the right edge
        result.push((column.min(width), slice));
        column = column.saturating_add(slice + 1);
    }
    result
}

pub struct Shell {
    screen: Rc<RefCell<CellScreen>>,
    windows: Vec<Window>,
    focus: Option<usize>,
    legend: Option<HelpBar>,
    settings: Settings,
    prefix_mode: bool,
    running: bool,
}

impl Shell {
    pub fn new(width: u16, height: u16, settings: Settings) -> Result<Self> {
        let screen = Rc::new(RefCell::new(CellScreen::new(width, height)));
        let legend = if settings.legend {
            Some(HelpBar::new(screen.clone())?)
        } else {
            None
        };
        let mut shell = Self {
            screen,
            windows: Vec::new(),
            focus: None,
            legend,
            settings,
            prefix_mode: false,
            running: true,
        };
        shell.layout()?;
        Ok(shell)
    }

    #[cfg(test)]
    pub fn screen(&self) -> &Rc<RefCell<CellScreen>> {
        &self.screen
    }

    #[cfg(test)]
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    #[cfg(test)]
    pub fn focus(&self) -> Option<usize> {
        self.focus
    }

    pub fn focused(&self) -> Option<&Window> {
        self.focus.and_then(|i| self.windows.get(i))
    }

    /// False once the user quit or the last window closed
    pub fn is_running(&self) -> bool {
        self.running && !self.windows.is_empty()
    }

    /// Open a window right of the focused one and focus it
    pub fn open(&mut self, provider: Box<dyn ContentProvider>) -> Result<()> {
        let mut window = Window::new(self.screen.clone(), provider)?;
        window.set_taskbar_height(self.settings.taskbar_height)?;
        let index = self.focus.map_or(self.windows.len(), |f| f + 1);
        self.windows.insert(index, window);
        self.layout()?;
        self.focus_index(index)
    }

    /// Give each window its slice of the screen above the legend
    pub fn layout(&mut self) -> Result<()> {
        let (width, height) = self.screen.borrow().size();
        let legend_rows = if self.legend.is_some() { height.min(1) } else { 0 };
        let area_height = height - legend_rows;

        let slices = slices(width, self.windows.len());
        for (window, &(column, slice)) in self.windows.iter_mut().zip(&slices) {
            let lframe = column > 0;
            let rframe = (column as u32 + slice as u32) < width as u32;
            window.layout(column, area_height, slice, lframe, rframe)?;
        }
        if let Some(legend) = self.legend.as_mut() {
            legend.layout(width, height)?;
        }
        log::debug!("Laid out {} windows on {}x{}", self.windows.len(), width, height);
        Ok(())
    }

    pub fn resize(&mut self, width: u16, height: u16) -> Result<()> {
        self.screen.borrow_mut().resize(width, height);
        self.layout()
    }

    fn focus_index(&mut self, index: usize) -> Result<()> {
        if let Some(old) = self.focus.filter(|&f| f != index) {
            if let Some(window) = self.windows.get_mut(old) {
                window.clear_focus()?;
            }
        }
        self.focus = Some(index);
        if let Some(window) = self.windows.get_mut(index) {
            window.set_focus()?;
        }
        Ok(())
    }

    pub fn focus_next(&mut self) -> Result<()> {
        let count = self.windows.len();
        if count == 0 {
            return Ok(());
        }
        let next = self.focus.map_or(0, |f| (f + 1) % count);
        self.focus_index(next)
    }

    pub fn focus_prev(&mut self) -> Result<()> {
        let count = self.windows.len();
        if count == 0 {
            return Ok(());
        }
        let prev = match self.focus {
            Some(0) | None => count - 1,
            Some(f) => f - 1,
        };
        self.focus_index(prev)
    }

    /// Tear down a window and hand its slice to the survivors
    pub fn close(&mut self, index: usize) -> Result<()> {
        if index >= self.windows.len() {
            return Ok(());
        }
        let window = self.windows.remove(index);
        log::debug!("Closing window {:?}", window.title());
        drop(window);

        // Adjust focus
        if self.windows.is_empty() {
            self.focus = None;
        } else if let Some(f) = self.focus {
            if f >= self.windows.len() {
                self.focus = Some(self.windows.len() - 1);
            } else if f > index {
                self.focus = Some(f - 1);
            }
        }

        self.layout()?;
        if let Some(f) = self.focus {
            self.windows[f].set_focus()?;
        }
        Ok(())
    }

    /// Handle one key; returns whether the shell keeps running
    pub fn process(&mut self, key: KeyEvent) -> Result<bool> {
        if !self.prefix_mode && key.code == config::PREFIX_KEY && key.modifiers.contains(config::PREFIX_MODIFIERS) {
            self.prefix_mode = true;
            return Ok(self.is_running());
        }
        if self.prefix_mode {
            self.prefix_mode = false;
            self.command(key)?;
            return Ok(self.is_running());
        }
        if let Some(index) = self.focus {
            self.forward(index, key)?;
        }
        Ok(self.is_running())
    }

    fn forward(&mut self, index: usize, key: KeyEvent) -> Result<()> {
        let keep_open = self.windows[index].process(key)?;
        let spawned = self.windows[index].take_spawned();
        if !keep_open {
            self.close(index)?;
        }
        for provider in spawned {
            self.open(provider)?;
        }
        Ok(())
    }

    fn command(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            config::KEY_QUIT => {
                log::info!("Quit requested");
                self.running = false;
            }
            config::KEY_FOCUS_NEXT => self.focus_next()?,
            config::KEY_FOCUS_PREV => self.focus_prev()?,
            config::KEY_CLOSE_WINDOW => {
                if let Some(index) = self.focus {
                    self.close(index)?;
                }
            }
            config::KEY_OPEN_PROJECTS => {
                let entries = self
                    .settings
                    .projects_root()
                    .map(|root| projects::discover(&root))
                    .unwrap_or_default();
                self.open(Box::new(ProjectMenu::new(entries)))?;
            }
            // Prefix twice sends the prefix key itself
            config::PREFIX_KEY => {
                if let Some(index) = self.focus {
                    let key = KeyEvent::new(config::PREFIX_KEY, config::PREFIX_MODIFIERS);
                    self.forward(index, key)?;
                }
            }
            other => log::debug!("Unbound command key {:?}", other),
        }
        Ok(())
    }

    /// Idle tick for every window
    pub fn poll(&mut self) -> Result<bool> {
        let mut closed = Vec::new();
        let mut spawned = Vec::new();
        for (index, window) in self.windows.iter_mut().enumerate() {
            if !window.poll()? {
                closed.push(index);
            }
            spawned.extend(window.take_spawned());
        }
        for index in closed.into_iter().rev() {
            self.close(index)?;
        }
        for provider in spawned {
            self.open(provider)?;
        }
        Ok(self.is_running())
    }

    /// Legend for the current state
    pub fn help(&self) -> HelpPanel {
        let mut panel = HelpPanel::new();
        if self.prefix_mode {
            panel.add("j", "Next");
            panel.add("k", "Prev");
            panel.add("x", "Close");
            panel.add("p", "Projects");
            panel.add("q", "Quit");
            return panel;
        }
        panel.add("^B", "Prefix");
        if let Some(window) = self.focused() {
            panel.extend(&window.help());
        }
        panel
    }

    /// Draw the legend and flush changed cells to `writer`
    pub fn render<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        if let Some(legend) = &self.legend {
            legend.paint(&self.help())?;
        }
        self.screen.borrow_mut().flush(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::Browser;
    use crate::document::Document;
    use crate::surface::Rect;
    use crate::viewer::Viewer;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn viewer(name: &str) -> Box<dyn ContentProvider> {
        Box::new(Viewer::new(name, Document::from_text("first\nsecond\n")))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn command(shell: &mut Shell, c: char) -> bool {
        shell.process(ctrl('b')).unwrap();
        shell.process(key(KeyCode::Char(c))).unwrap()
    }

    fn shell_with(names: &[&str]) -> Shell {
        let mut shell = Shell::new(80, 24, Settings::default()).unwrap();
        for name in names {
            shell.open(viewer(name)).unwrap();
        }
        shell
    }

    #[test]
    fn test_slices() {
        assert!(slices(80, 0).is_empty());
        assert_eq!(slices(80, 1), [(0, 80)]);
        assert_eq!(slices(80, 2), [(0, 40), (41, 39)]);
        assert_eq!(slices(80, 3), [(0, 26), (27, 26), (54, 26)]);
        assert_eq!(slices(3, 5), [(0, 0), (1, 0), (2, 0), (3, 0), (3, 0)]);
    }

    #[test]
    fn test_neighbours_share_border() {
        let shell = shell_with(&["left", "right"]);
        let (left, right) = (&shell.windows()[0], &shell.windows()[1]);
        assert!(!left.has_left_frame() && left.has_right_frame());
        assert!(right.has_left_frame() && !right.has_right_frame());

        let left_frame = left.frame_bounds().unwrap();
        let right_frame = right.frame_bounds().unwrap();
        assert_eq!(left_frame, Rect::new(0, 0, 41, 23));
        assert_eq!(right_frame, Rect::new(40, 0, 40, 23));
        assert_eq!(left_frame.right() - 1, right_frame.x as u32);
    }

    #[test]
    fn test_open_focuses_new_window() {
        let shell = shell_with(&["a", "b"]);
        assert_eq!(shell.focus(), Some(1));
        assert!(!shell.windows()[0].has_focus());
        assert!(shell.windows()[1].has_focus());
        assert_eq!(shell.focused().unwrap().title(), "b");
    }

    #[test]
    fn test_focus_cycles() {
        let mut shell = shell_with(&["a", "b", "c"]);
        command(&mut shell, 'j');
        assert_eq!(shell.focus(), Some(0));
        command(&mut shell, 'k');
        assert_eq!(shell.focus(), Some(2));
        command(&mut shell, 'k');
        assert_eq!(shell.focus(), Some(1));
        let focused: Vec<bool> = shell.windows().iter().map(|w| w.has_focus()).collect();
        assert_eq!(focused, [false, true, false]);
    }

    #[test]
    fn test_close_relayouts_survivors() {
        let mut shell = shell_with(&["a", "b"]);
        assert!(command(&mut shell, 'x'));
        assert_eq!(shell.windows().len(), 1);
        let survivor = &shell.windows()[0];
        assert!(survivor.has_focus());
        assert!(!survivor.has_left_frame() && !survivor.has_right_frame());
        assert_eq!(survivor.content_bounds().unwrap(), Rect::new(0, 1, 80, 22));
        // Closed window's surfaces are gone: frame, content, legend
        assert_eq!(shell.screen().borrow().surface_count(), 3);
    }

    #[test]
    fn test_dialog_close_flow() {
        let mut shell = shell_with(&["a", "b"]);
        assert!(shell.process(ctrl('w')).unwrap());
        assert!(shell.focused().unwrap().has_dialog());

        let mut out = Vec::new();
        shell.render(&mut out).unwrap();
        let legend = shell.screen().borrow().screen_row(23);
        assert!(legend.contains("Y Yes") && legend.contains("N No"), "{legend}");

        // Keys go to the dialog while it is open
        assert!(shell.process(key(KeyCode::Down)).unwrap());
        assert_eq!(shell.windows().len(), 2);

        assert!(shell.process(key(KeyCode::Char('y'))).unwrap());
        assert_eq!(shell.windows().len(), 1);
        assert_eq!(shell.focused().unwrap().title(), "a");
    }

    #[test]
    fn test_last_window_stops_shell() {
        let mut shell = shell_with(&["only"]);
        assert!(!command(&mut shell, 'x'));
        assert!(!shell.is_running());
    }

    #[test]
    fn test_quit() {
        let mut shell = shell_with(&["a"]);
        assert!(!command(&mut shell, 'q'));
        assert_eq!(shell.windows().len(), 1);
    }

    #[test]
    fn test_legend_follows_focus() {
        let mut shell = shell_with(&["a"]);
        let mut out = Vec::new();
        shell.render(&mut out).unwrap();
        let legend = shell.screen().borrow().screen_row(23);
        assert!(legend.starts_with(" ^B Prefix"), "{legend}");
        assert!(legend.contains("^W Close"));

        shell.process(ctrl('b')).unwrap();
        shell.render(&mut out).unwrap();
        assert!(shell.screen().borrow().screen_row(23).contains("q Quit"));
    }

    #[test]
    fn test_resize() {
        let mut shell = shell_with(&["a", "b"]);
        shell.resize(100, 30).unwrap();
        shell.render(&mut Vec::new()).unwrap();
        let frames: Vec<Rect> = shell.windows().iter().map(|w| w.frame_bounds().unwrap()).collect();
        assert_eq!(frames, [Rect::new(0, 0, 51, 29), Rect::new(50, 0, 50, 29)]);
        assert_eq!(shell.screen().borrow().screen_row(29).trim(), "^B Prefix  ←↑↓→ Move  PgUp/PgDn Page  ^W Close");
    }

    #[test]
    fn test_spawned_window_opens() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "a\tb\n").unwrap();
        let mut shell = Shell::new(80, 24, Settings::default()).unwrap();
        shell.open(Box::new(Browser::new(dir.path().to_path_buf()))).unwrap();

        shell.process(key(KeyCode::Enter)).unwrap();
        assert_eq!(shell.windows().len(), 2);
        assert_eq!(shell.focused().unwrap().title(), "notes.txt");
        assert_eq!(shell.focused().unwrap().status(), Some("Ln 1/1, Col 1"));
    }

    #[test]
    fn test_without_legend() {
        let settings = Settings {
            legend: false,
            taskbar_height: 1,
            ..Settings::default()
        };
        let mut shell = Shell::new(40, 10, settings).unwrap();
        shell.open(viewer("a")).unwrap();
        let window = &shell.windows()[0];
        assert_eq!(window.frame_bounds().unwrap(), Rect::new(0, 0, 40, 10));
        assert_eq!(window.content_bounds().unwrap(), Rect::new(0, 1, 40, 8));
        assert_eq!(window.taskbar_height(), 1);
    }
}
