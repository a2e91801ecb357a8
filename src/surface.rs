//! Surfaces - independently stacked character-cell drawables
//!
//! A surface can be relocated in place but never resized: a new size means
//! destroying it and creating a replacement. The backend keeps a z-order
//! stack; raising a surface moves it to the top of that stack.

use crate::error::{Error, Result};
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Color, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

/// Rectangle in screen cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    /// Column just past the right edge
    pub fn right(&self) -> u32 {
        self.x as u32 + self.width as u32
    }

    /// Row just past the bottom edge
    pub fn bottom(&self) -> u32 {
        self.y as u32 + self.height as u32
    }

    pub fn same_size(&self, other: &Rect) -> bool {
        self.width == other.width && self.height == other.height
    }

    pub fn same_origin(&self, other: &Rect) -> bool {
        self.x == other.x && self.y == other.y
    }
}

/// Handle to a surface owned by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u32);

/// Text attributes as bitflags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attrs(u8);

impl Attrs {
    pub const BOLD: u8 = 1 << 0;
    pub const DIM: u8 = 1 << 1;
    pub const ITALIC: u8 = 1 << 2;
    pub const UNDERLINE: u8 = 1 << 3;
    pub const REVERSE: u8 = 1 << 4;

    pub fn has(&self, attr: u8) -> bool {
        self.0 & attr != 0
    }

    pub fn set(&mut self, attr: u8) {
        self.0 |= attr;
    }
}

/// How a glyph is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub attrs: Attrs,
}

impl Style {
    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    pub fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    pub fn with(mut self, attr: u8) -> Self {
        self.attrs.set(attr);
        self
    }
}

/// A cell in a surface or on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub attrs: Attrs,
}

impl Cell {
    pub fn styled(ch: char, style: Style) -> Self {
        Self {
            ch,
            fg: style.fg,
            bg: style.bg,
            attrs: style.attrs,
        }
    }

    pub fn style(&self) -> Style {
        Style {
            fg: self.fg,
            bg: self.bg,
            attrs: self.attrs,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg: None,
            attrs: Attrs::default(),
        }
    }
}

/// Surface lifecycle events, recorded on request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Created(SurfaceId),
    Recreated { old: SurfaceId, new: SurfaceId },
    Moved(SurfaceId),
    Raised(SurfaceId),
    Destroyed(SurfaceId),
}

/// The drawing backend a window composes onto
pub trait Backend {
    /// Screen size as (width, height)
    fn size(&self) -> (u16, u16);

    /// Create a blank surface on top of the stack
    fn create(&mut self, rect: Rect) -> Result<SurfaceId>;

    /// Destroy `old` and create a blank surface at `rect` in its stack slot
    fn replace(&mut self, old: SurfaceId, rect: Rect) -> Result<SurfaceId>;

    fn destroy(&mut self, id: SurfaceId);

    /// Relocate without touching content
    fn move_to(&mut self, id: SurfaceId, x: u16, y: u16);

    /// Move to the top of the stack
    fn raise(&mut self, id: SurfaceId);

    fn bounds(&self, id: SurfaceId) -> Option<Rect>;

    /// Write one glyph at surface-relative coordinates; clipped
    fn put(&mut self, id: SurfaceId, x: u16, y: u16, ch: char, style: Style);

    /// Write a string left to right, clipped at the right edge.
    /// Returns the number of columns written.
    fn put_str(&mut self, id: SurfaceId, x: u16, y: u16, text: &str, style: Style) -> u16 {
        let Some(rect) = self.bounds(id) else {
            return 0;
        };
        let mut col = x;
        for ch in text.chars() {
            if col >= rect.width || y >= rect.height {
                break;
            }
            self.put(id, col, y, ch, style);
            col += 1;
        }
        col.saturating_sub(x)
    }

    fn hline(&mut self, id: SurfaceId, x: u16, y: u16, len: u16, ch: char, style: Style) {
        let Some(rect) = self.bounds(id) else {
            return;
        };
        let end = (x as u32 + len as u32).min(rect.width as u32) as u16;
        for col in x..end {
            self.put(id, col, y, ch, style);
        }
    }

    fn vline(&mut self, id: SurfaceId, x: u16, y: u16, len: u16, ch: char, style: Style) {
        let Some(rect) = self.bounds(id) else {
            return;
        };
        let end = (y as u32 + len as u32).min(rect.height as u32) as u16;
        for row in y..end {
            self.put(id, x, row, ch, style);
        }
    }

    fn fill_row(&mut self, id: SurfaceId, y: u16, ch: char, style: Style) {
        if let Some(rect) = self.bounds(id) {
            self.hline(id, 0, y, rect.width, ch, style);
        }
    }

    fn clear(&mut self, id: SurfaceId) {
        if let Some(rect) = self.bounds(id) {
            for row in 0..rect.height {
                self.fill_row(id, row, ' ', Style::default());
            }
        }
    }
}

/// Backend shared by the shell and every window
pub type SharedBackend = Rc<RefCell<dyn Backend>>;

/// A borrowed view of one surface, handed to painters
pub struct Canvas<'a> {
    backend: &'a mut dyn Backend,
    surface: SurfaceId,
    width: u16,
    height: u16,
}

impl<'a> Canvas<'a> {
    pub fn new(backend: &'a mut dyn Backend, surface: SurfaceId) -> Result<Self> {
        let rect = backend.bounds(surface).ok_or(Error::UnknownSurface(surface))?;
        Ok(Self {
            backend,
            surface,
            width: rect.width,
            height: rect.height,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn put_char(&mut self, x: u16, y: u16, ch: char, style: Style) {
        self.backend.put(self.surface, x, y, ch, style);
    }

    pub fn put_str(&mut self, x: u16, y: u16, text: &str, style: Style) -> u16 {
        self.backend.put_str(self.surface, x, y, text, style)
    }

    pub fn hline(&mut self, x: u16, y: u16, len: u16, ch: char, style: Style) {
        self.backend.hline(self.surface, x, y, len, ch, style);
    }

    pub fn vline(&mut self, x: u16, y: u16, len: u16, ch: char, style: Style) {
        self.backend.vline(self.surface, x, y, len, ch, style);
    }

    pub fn fill_row(&mut self, y: u16, ch: char, style: Style) {
        self.backend.fill_row(self.surface, y, ch, style);
    }

    pub fn clear(&mut self) {
        self.backend.clear(self.surface);
    }
}

/// One surface's backing store
struct SurfaceBuf {
    rect: Rect,
    cells: Vec<Cell>,
}

impl SurfaceBuf {
    fn blank(rect: Rect) -> Self {
        Self {
            rect,
            cells: vec![Cell::default(); (rect.width as usize) * (rect.height as usize)],
        }
    }

    fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if x >= self.rect.width || y >= self.rect.height {
            return None;
        }
        self.cells.get((y as usize) * (self.rect.width as usize) + (x as usize))
    }
}

/// Cell-buffer backend that composites its surface stack onto the terminal
pub struct CellScreen {
    width: u16,
    height: u16,
    surfaces: HashMap<SurfaceId, SurfaceBuf>,
    // Bottom to top
    stack: Vec<SurfaceId>,
    next_id: u32,
    events: Option<Vec<SurfaceEvent>>,
    // Track what's currently on screen to minimize updates
    last_frame: Vec<Cell>,
}

impl CellScreen {
    pub fn new(width: u16, height: u16) -> Self {
        let mut screen = Self {
            width,
            height,
            surfaces: HashMap::new(),
            stack: Vec::new(),
            next_id: 0,
            events: None,
            last_frame: Vec::new(),
        };
        screen.reset_frame();
        screen
    }

    /// Start recording surface lifecycle events
    #[cfg(test)]
    pub fn record_events(&mut self) {
        self.events = Some(Vec::new());
    }

    /// Drain recorded events
    #[cfg(test)]
    pub fn take_events(&mut self) -> Vec<SurfaceEvent> {
        self.events.as_mut().map(std::mem::take).unwrap_or_default()
    }

    /// Handle a terminal resize; the next flush redraws everything
    pub fn resize(&mut self, width: u16, height: u16) {
        log::debug!("Screen resized to {}x{}", width, height);
        self.width = width;
        self.height = height;
        self.reset_frame();
    }

    /// Mark the entire frame as dirty (forces full redraw)
    pub fn invalidate(&mut self) {
        for cell in &mut self.last_frame {
            cell.ch = '\x00'; // Invalid char forces redraw
        }
    }

    fn reset_frame(&mut self) {
        self.last_frame = vec![Cell::default(); (self.width as usize) * (self.height as usize)];
        self.invalidate();
    }

    /// Surfaces bottom to top
    #[cfg(test)]
    pub fn stack(&self) -> &[SurfaceId] {
        &self.stack
    }

    #[cfg(test)]
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Read back a cell of a surface
    #[cfg(test)]
    pub fn cell(&self, id: SurfaceId, x: u16, y: u16) -> Option<Cell> {
        self.surfaces.get(&id).and_then(|s| s.get(x, y)).copied()
    }

    /// Read back one row of a surface as text
    #[cfg(test)]
    pub fn row_text(&self, id: SurfaceId, y: u16) -> String {
        match self.surfaces.get(&id) {
            Some(surface) => (0..surface.rect.width)
                .filter_map(|x| surface.get(x, y).map(|c| c.ch))
                .collect(),
            None => String::new(),
        }
    }

    /// Flatten the stack into one frame, bottom surface first
    pub fn compose(&self) -> Vec<Cell> {
        let width = self.width as usize;
        let mut frame = vec![Cell::default(); width * (self.height as usize)];
        for id in &self.stack {
            let Some(surface) = self.surfaces.get(id) else {
                continue;
            };
            let rect = surface.rect;
            for y in 0..rect.height {
                let screen_y = rect.y as u32 + y as u32;
                if screen_y >= self.height as u32 {
                    break;
                }
                for x in 0..rect.width {
                    let screen_x = rect.x as u32 + x as u32;
                    if screen_x >= self.width as u32 {
                        break;
                    }
                    if let Some(cell) = surface.get(x, y) {
                        frame[(screen_y as usize) * width + (screen_x as usize)] = *cell;
                    }
                }
            }
        }
        frame
    }

    /// One composed screen row as text
    #[cfg(test)]
    pub fn screen_row(&self, y: u16) -> String {
        let width = self.width as usize;
        let start = (y as usize) * width;
        self.compose()
            .get(start..start + width)
            .map(|row| row.iter().map(|c| c.ch).collect())
            .unwrap_or_default()
    }

    /// Write changed cells to the terminal
    pub fn flush<W: Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        let frame = self.compose();
        if self.last_frame.len() != frame.len() {
            self.reset_frame();
        }

        let mut last_style: Option<Style> = None;
        let mut need_move = true;

        for y in 0..self.height {
            for x in 0..self.width {
                let idx = (y as usize) * (self.width as usize) + (x as usize);
                let cell = frame[idx];

                // Cell unchanged, skip it
                if self.last_frame[idx] == cell {
                    need_move = true;
                    continue;
                }

                if need_move {
                    queue!(writer, MoveTo(x, y))?;
                    need_move = false;
                }

                if last_style != Some(cell.style()) {
                    // Reset all attributes first
                    queue!(writer, SetAttribute(Attribute::Reset), ResetColor)?;

                    if cell.attrs.has(Attrs::BOLD) {
                        queue!(writer, SetAttribute(Attribute::Bold))?;
                    }
                    if cell.attrs.has(Attrs::DIM) {
                        queue!(writer, SetAttribute(Attribute::Dim))?;
                    }
                    if cell.attrs.has(Attrs::ITALIC) {
                        queue!(writer, SetAttribute(Attribute::Italic))?;
                    }
                    if cell.attrs.has(Attrs::UNDERLINE) {
                        queue!(writer, SetAttribute(Attribute::Underlined))?;
                    }
                    if cell.attrs.has(Attrs::REVERSE) {
                        queue!(writer, SetAttribute(Attribute::Reverse))?;
                    }
                    if let Some(fg) = cell.fg {
                        queue!(writer, SetForegroundColor(fg))?;
                    }
                    if let Some(bg) = cell.bg {
                        queue!(writer, SetBackgroundColor(bg))?;
                    }
                    last_style = Some(cell.style());
                }

                write!(writer, "{}", cell.ch)?;
                self.last_frame[idx] = cell;
            }

            // End of row - next row needs MoveTo
            need_move = true;
        }

        queue!(writer, SetAttribute(Attribute::Reset), ResetColor)?;
        writer.flush()
    }

    fn fits(&self, rect: Rect) -> bool {
        rect.right() <= self.width as u32 && rect.bottom() <= self.height as u32
    }

    fn allocate(&mut self, rect: Rect) -> Result<SurfaceId> {
        if !self.fits(rect) {
            return Err(Error::SurfaceOutOfBounds {
                rect,
                width: self.width,
                height: self.height,
            });
        }
        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        self.surfaces.insert(id, SurfaceBuf::blank(rect));
        Ok(id)
    }

    fn record(&mut self, event: SurfaceEvent) {
        log::trace!("{:?}", event);
        if let Some(events) = self.events.as_mut() {
            events.push(event);
        }
    }
}

impl Backend for CellScreen {
    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn create(&mut self, rect: Rect) -> Result<SurfaceId> {
        let id = self.allocate(rect)?;
        self.stack.push(id);
        self.record(SurfaceEvent::Created(id));
        Ok(id)
    }

    fn replace(&mut self, old: SurfaceId, rect: Rect) -> Result<SurfaceId> {
        let slot = self
            .stack
            .iter()
            .position(|&s| s == old)
            .ok_or(Error::UnknownSurface(old))?;
        let new = self.allocate(rect)?;
        self.surfaces.remove(&old);
        self.stack[slot] = new;
        self.record(SurfaceEvent::Recreated { old, new });
        Ok(new)
    }

    fn destroy(&mut self, id: SurfaceId) {
        if self.surfaces.remove(&id).is_some() {
            self.stack.retain(|&s| s != id);
            self.record(SurfaceEvent::Destroyed(id));
        }
    }

    fn move_to(&mut self, id: SurfaceId, x: u16, y: u16) {
        if let Some(surface) = self.surfaces.get_mut(&id) {
            surface.rect.x = x;
            surface.rect.y = y;
            self.record(SurfaceEvent::Moved(id));
        }
    }

    fn raise(&mut self, id: SurfaceId) {
        if let Some(pos) = self.stack.iter().position(|&s| s == id) {
            self.stack.remove(pos);
            self.stack.push(id);
            self.record(SurfaceEvent::Raised(id));
        }
    }

    fn bounds(&self, id: SurfaceId) -> Option<Rect> {
        self.surfaces.get(&id).map(|s| s.rect)
    }

    fn put(&mut self, id: SurfaceId, x: u16, y: u16, ch: char, style: Style) {
        if let Some(surface) = self.surfaces.get_mut(&id) {
            if x < surface.rect.width && y < surface.rect.height {
                let idx = (y as usize) * (surface.rect.width as usize) + (x as usize);
                surface.cells[idx] = Cell::styled(ch, style);
            }
        }
    }
}
