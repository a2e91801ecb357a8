//! Windows - a content provider framed by chrome
//!
//! Each window owns two surfaces: the frame (title bar, side frames, task
//! bar) and the content region inset within it. They are repainted
//! independently, each behind its own dirty flag.

use crate::chrome::Chrome;
use crate::dialog::Dialog;
use crate::error::{Error, Result};
use crate::legend::HelpPanel;
use crate::provider::{ContentProvider, Frame};
use crate::surface::{Backend, Canvas, Rect, SharedBackend, SurfaceId};
use crossterm::event::KeyEvent;
use std::collections::VecDeque;

/// What reconciling a surface with its target bounds did to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    Unchanged,
    Moved,
    Recreated,
}

/// Bring `surface` to `target`: a size change recreates it (content lost),
/// a position change only relocates it (content kept).
pub fn reconcile(backend: &mut dyn Backend, surface: &mut SurfaceId, target: Rect) -> Result<Reconcile> {
    let current = backend.bounds(*surface).ok_or(Error::UnknownSurface(*surface))?;
    if !current.same_size(&target) {
        *surface = backend.replace(*surface, target)?;
        Ok(Reconcile::Recreated)
    } else if !current.same_origin(&target) {
        backend.move_to(*surface, target.x, target.y);
        Ok(Reconcile::Moved)
    } else {
        Ok(Reconcile::Unchanged)
    }
}

/// Content bounds inside a frame: one title row, one column per side
/// frame, and the task bar rows at the bottom. Clamps at zero.
pub fn content_bounds(frame: Rect, lframe: bool, rframe: bool, taskbar_height: u16) -> Rect {
    let left = (lframe as u16).min(frame.width);
    let top = frame.height.min(1);
    Rect::new(
        frame.x + left,
        frame.y + top,
        frame.width.saturating_sub(lframe as u16 + rframe as u16),
        frame.height.saturating_sub(1).saturating_sub(taskbar_height),
    )
}

/// An open dialog and the surface it draws on
struct Overlay {
    dialog: Dialog,
    surface: SurfaceId,
    dirty: bool,
}

pub struct Window {
    screen: SharedBackend,
    frame_surface: SurfaceId,
    content_surface: SurfaceId,
    provider: Option<Box<dyn ContentProvider>>,
    overlay: Option<Overlay>,
    // Dialogs waiting for the open one to be answered
    queued: VecDeque<Dialog>,
    spawned: Vec<Box<dyn ContentProvider>>,
    title: String,
    status: Option<String>,
    lframe: bool,
    rframe: bool,
    taskbar_height: u16,
    has_focus: bool,
    dirty_chrome: bool,
    dirty_content: bool,
}

impl Window {
    pub fn new(screen: SharedBackend, provider: Box<dyn ContentProvider>) -> Result<Self> {
        let frame_surface = screen.borrow_mut().create(Rect::default())?;
        let created = screen.borrow_mut().create(Rect::default());
        let content_surface = match created {
            Ok(id) => id,
            Err(e) => {
                screen.borrow_mut().destroy(frame_surface);
                return Err(e);
            }
        };

        let mut window = Self {
            screen,
            frame_surface,
            content_surface,
            provider: Some(provider),
            overlay: None,
            queued: VecDeque::new(),
            spawned: Vec::new(),
            title: String::new(),
            status: None,
            lframe: false,
            rframe: false,
            taskbar_height: 0,
            has_focus: false,
            dirty_chrome: true,
            dirty_content: true,
        };

        let mut frame = Frame::new();
        if let Some(provider) = window.provider.as_mut() {
            provider.open(&mut frame);
        }
        if window.apply(frame)? {
            log::warn!("Provider asked to close while opening; ignored");
        }
        window.sync_labels();
        log::debug!("Opened window {:?}", window.title);
        window.paint()?;
        Ok(window)
    }

    /// Place the window in the screen slice starting at `column`.
    ///
    /// Side frames follow the geometry: a left frame only when there is
    /// screen to the left, a right frame only when the slice stops short of
    /// the right edge. The requested flags are advisory.
    pub fn layout(
        &mut self,
        column: u16,
        height: u16,
        width: u16,
        want_lframe: bool,
        want_rframe: bool,
    ) -> Result<()> {
        let (screen_width, _) = self.screen.borrow().size();
        let lframe = column > 0;
        let rframe = (column as u32 + width as u32) < screen_width as u32;
        if (lframe, rframe) != (want_lframe, want_rframe) {
            log::trace!(
                "Frames ({}, {}) at column {} override requested ({}, {})",
                lframe,
                rframe,
                column,
                want_lframe,
                want_rframe
            );
        }
        if (lframe, rframe) != (self.lframe, self.rframe) {
            self.lframe = lframe;
            self.rframe = rframe;
            self.dirty_chrome = true;
        }

        // Grow outward by one column per active side frame
        let target = Rect::new(
            column - lframe as u16,
            0,
            width.saturating_add(lframe as u16 + rframe as u16),
            height,
        );
        let outcome = {
            let mut screen = self.screen.borrow_mut();
            reconcile(&mut *screen, &mut self.frame_surface, target)?
        };
        if outcome == Reconcile::Recreated {
            self.dirty_chrome = true;
        }
        log::trace!("Frame {:?} -> {:?}", target, outcome);

        // Frame flags can change without the frame size changing, so the
        // content region is always recomputed.
        self.layout_content()?;
        self.layout_overlay()?;
        self.paint()
    }

    fn layout_content(&mut self) -> Result<()> {
        let mut screen = self.screen.borrow_mut();
        let frame = screen
            .bounds(self.frame_surface)
            .ok_or(Error::UnknownSurface(self.frame_surface))?;
        let target = content_bounds(frame, self.lframe, self.rframe, self.taskbar_height);
        if reconcile(&mut *screen, &mut self.content_surface, target)? == Reconcile::Recreated {
            self.dirty_content = true;
        }
        Ok(())
    }

    fn layout_overlay(&mut self) -> Result<()> {
        let Some(overlay) = self.overlay.as_mut() else {
            return Ok(());
        };
        let mut screen = self.screen.borrow_mut();
        let frame = screen
            .bounds(self.frame_surface)
            .ok_or(Error::UnknownSurface(self.frame_surface))?;
        if reconcile(&mut *screen, &mut overlay.surface, Dialog::layout(frame))? == Reconcile::Recreated {
            overlay.dirty = true;
        }
        Ok(())
    }

    pub fn set_taskbar_height(&mut self, height: u16) -> Result<()> {
        if height == self.taskbar_height {
            return Ok(());
        }
        self.taskbar_height = height;
        self.dirty_chrome = true;
        self.layout_content()?;
        self.paint()
    }

    pub fn set_focus(&mut self) -> Result<()> {
        self.has_focus = true;
        self.mark_focus_dirty();
        self.bring_forward();
        self.paint()
    }

    pub fn clear_focus(&mut self) -> Result<()> {
        self.has_focus = false;
        self.mark_focus_dirty();
        self.paint()
    }

    fn mark_focus_dirty(&mut self) {
        self.dirty_chrome = true;
        self.dirty_content = true;
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.dirty = true;
        }
    }

    /// Raise this window's surfaces to the top of the stack
    pub fn bring_forward(&mut self) {
        let mut screen = self.screen.borrow_mut();
        screen.raise(self.frame_surface);
        screen.raise(self.content_surface);
        if let Some(overlay) = &self.overlay {
            screen.raise(overlay.surface);
        }
    }

    /// Handle a key; an open dialog sees it before the provider does.
    /// Returns whether the window should stay open.
    pub fn process(&mut self, key: KeyEvent) -> Result<bool> {
        let mut frame = Frame::new();
        let answered = self
            .overlay
            .as_mut()
            .map(|overlay| !overlay.dialog.process(&mut frame, key));
        let keep_open = match answered {
            Some(done) => {
                if done {
                    self.finish_dialog()?;
                }
                true
            }
            None => match self.provider.as_mut() {
                Some(provider) => provider.process(&mut frame, key),
                None => false,
            },
        };
        let close = self.apply(frame)?;
        self.sync_labels();
        self.paint()?;
        Ok(keep_open && !close)
    }

    /// Idle tick; returns whether the window should stay open
    pub fn poll(&mut self) -> Result<bool> {
        let mut frame = Frame::new();
        let keep_open = match self.provider.as_mut() {
            Some(provider) => provider.poll(&mut frame),
            None => false,
        };
        let close = self.apply(frame)?;
        self.sync_labels();
        self.paint()?;
        Ok(keep_open && !close)
    }

    /// Apply what the provider asked for; returns whether it asked to close
    fn apply(&mut self, mut frame: Frame) -> Result<bool> {
        if frame.repaint_requested() {
            self.dirty_content = true;
        }
        for dialog in frame.take_dialogs() {
            self.queue_dialog(dialog)?;
        }
        self.spawned.extend(frame.take_spawned());
        Ok(frame.close_requested())
    }

    /// Show `dialog` now, or after the open one is answered
    fn queue_dialog(&mut self, dialog: Dialog) -> Result<()> {
        if self.overlay.is_some() {
            log::debug!("Dialog {:?} waits behind the open one", dialog.text());
            self.queued.push_back(dialog);
            return Ok(());
        }
        self.open_dialog(dialog)
    }

    fn open_dialog(&mut self, dialog: Dialog) -> Result<()> {
        let mut screen = self.screen.borrow_mut();
        let frame = screen
            .bounds(self.frame_surface)
            .ok_or(Error::UnknownSurface(self.frame_surface))?;
        let surface = screen.create(Dialog::layout(frame))?;
        log::debug!("Showing dialog {:?} over {:?}", dialog.text(), self.title);
        self.overlay = Some(Overlay {
            dialog,
            surface,
            dirty: true,
        });
        Ok(())
    }

    /// Tear down the answered dialog and show the next queued one
    fn finish_dialog(&mut self) -> Result<()> {
        if let Some(overlay) = self.overlay.take() {
            self.screen.borrow_mut().destroy(overlay.surface);
        }
        match self.queued.pop_front() {
            Some(next) => self.open_dialog(next),
            None => Ok(()),
        }
    }

    fn sync_labels(&mut self) {
        let Some(provider) = self.provider.as_ref() else {
            return;
        };
        let (title, status) = (provider.title(), provider.status());
        self.set_title(title);
        self.set_status(status);
    }

    /// Marks chrome dirty when the title changes
    pub fn set_title(&mut self, title: String) {
        if self.title != title {
            self.title = title;
            self.dirty_chrome = true;
        }
    }

    /// Marks chrome dirty when the status changes
    pub fn set_status(&mut self, status: Option<String>) {
        if self.status != status {
            self.status = status;
            self.dirty_chrome = true;
        }
    }

    /// Repaint whatever is dirty
    pub fn paint(&mut self) -> Result<()> {
        if self.dirty_content {
            self.paint_content()?;
        }
        if self.dirty_chrome {
            self.paint_chrome()?;
        }
        self.paint_overlay()
    }

    fn paint_content(&mut self) -> Result<()> {
        let mut screen = self.screen.borrow_mut();
        let mut canvas = Canvas::new(&mut *screen, self.content_surface)?;
        if let Some(provider) = self.provider.as_mut() {
            provider.paint(&mut canvas, self.has_focus);
        }
        self.dirty_content = false;
        Ok(())
    }

    fn paint_chrome(&mut self) -> Result<()> {
        let chrome = Chrome {
            title: &self.title,
            status: self.status.as_deref(),
            focused: self.has_focus,
            lframe: self.lframe,
            rframe: self.rframe,
            taskbar_height: self.taskbar_height,
        };
        let mut screen = self.screen.borrow_mut();
        let mut canvas = Canvas::new(&mut *screen, self.frame_surface)?;
        chrome.paint(&mut canvas);
        self.dirty_chrome = false;
        Ok(())
    }

    fn paint_overlay(&mut self) -> Result<()> {
        let Some(overlay) = self.overlay.as_mut() else {
            return Ok(());
        };
        if !overlay.dirty {
            return Ok(());
        }
        let mut screen = self.screen.borrow_mut();
        let mut canvas = Canvas::new(&mut *screen, overlay.surface)?;
        overlay.dialog.paint(&mut canvas, self.has_focus);
        overlay.dirty = false;
        Ok(())
    }

    /// Legend hints: the dialog's while one is open, else the provider's
    pub fn help(&self) -> HelpPanel {
        let mut panel = HelpPanel::new();
        match (&self.overlay, &self.provider) {
            (Some(overlay), _) => overlay.dialog.set_help(&mut panel),
            (None, Some(provider)) => provider.set_help(&mut panel),
            (None, None) => {}
        }
        panel
    }

    /// Providers this window asked the shell to open
    pub fn take_spawned(&mut self) -> Vec<Box<dyn ContentProvider>> {
        std::mem::take(&mut self.spawned)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    #[cfg(test)]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    #[cfg(test)]
    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    #[cfg(test)]
    pub fn has_dialog(&self) -> bool {
        self.overlay.is_some()
    }

    #[cfg(test)]
    pub fn has_left_frame(&self) -> bool {
        self.lframe
    }

    #[cfg(test)]
    pub fn has_right_frame(&self) -> bool {
        self.rframe
    }

    #[cfg(test)]
    pub fn taskbar_height(&self) -> u16 {
        self.taskbar_height
    }

    /// (chrome, content) dirty flags
    #[cfg(test)]
    pub fn dirty(&self) -> (bool, bool) {
        (self.dirty_chrome, self.dirty_content)
    }

    #[cfg(test)]
    pub fn frame_surface(&self) -> SurfaceId {
        self.frame_surface
    }

    #[cfg(test)]
    pub fn content_surface(&self) -> SurfaceId {
        self.content_surface
    }

    #[cfg(test)]
    pub fn frame_bounds(&self) -> Option<Rect> {
        self.screen.borrow().bounds(self.frame_surface)
    }

    #[cfg(test)]
    pub fn content_bounds(&self) -> Option<Rect> {
        self.screen.borrow().bounds(self.content_surface)
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        // Release the provider before the surfaces it paints
        self.provider = None;
        self.spawned.clear();
        if !self.queued.is_empty() {
            log::warn!("Dropping {} unanswered dialogs with window {:?}", self.queued.len(), self.title);
        }
        self.queued.clear();
        match self.screen.try_borrow_mut() {
            Ok(mut screen) => {
                if let Some(overlay) = self.overlay.take() {
                    screen.destroy(overlay.surface);
                }
                screen.destroy(self.content_surface);
                screen.destroy(self.frame_surface);
            }
            Err(_) => log::error!("Screen busy while closing window {:?}", self.title),
        }
    }
}
