//! Window chrome - title bar, side frames and task bar
//!
//! Title bar cells, relative to the bar (the frame row minus corner columns):
//!
//! ```text
//!   [0] rule  [1] space  [2 .. w-2) title  [w-2] space  [w-1] rule
//! ```
//!
//! Status text is right-aligned inside the title span with a one-space
//! gutter on each side and never takes more than half of it.

use crate::config;
use crate::surface::{Attrs, Canvas, Style};

/// Inputs to a chrome paint; painting is a pure function of these
#[derive(Debug, Clone, Copy)]
pub struct Chrome<'a> {
    pub title: &'a str,
    pub status: Option<&'a str>,
    pub focused: bool,
    pub lframe: bool,
    pub rframe: bool,
    pub taskbar_height: u16,
}

/// Columns available to the title for a frame `width` columns wide
pub fn title_width(width: u16, lframe: bool, rframe: bool) -> u16 {
    bar_width(width, lframe, rframe).saturating_sub(4)
}

fn bar_width(width: u16, lframe: bool, rframe: bool) -> u16 {
    width.saturating_sub(lframe as u16 + rframe as u16)
}

/// Truncate to `width` chars, marking the cut with an ellipsis
pub fn elide(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push(config::GLYPH_ELLIPSIS);
    out
}

impl Chrome<'_> {
    pub fn paint(&self, canvas: &mut Canvas<'_>) {
        let (width, height) = (canvas.width(), canvas.height());
        if width == 0 || height == 0 {
            return;
        }
        self.paint_title_bar(canvas, width);
        if self.lframe {
            self.paint_side(canvas, 0, height);
        }
        if self.rframe {
            self.paint_side(canvas, width - 1, height);
        }
        if self.taskbar_height > 0 {
            self.paint_task_bar(canvas, width, height);
        }
    }

    fn rule_style(&self) -> Style {
        if self.focused {
            Style::default().fg(config::COLOR_FRAME_FOCUSED)
        } else {
            Style::default().fg(config::COLOR_FRAME_UNFOCUSED)
        }
    }

    fn bar_style(&self) -> Style {
        Style::default()
            .fg(config::COLOR_FRAME_FOCUSED)
            .with(Attrs::REVERSE)
            .with(Attrs::BOLD)
    }

    fn paint_title_bar(&self, canvas: &mut Canvas<'_>, width: u16) {
        let rule = self.rule_style();
        canvas.hline(0, 0, width, config::GLYPH_HLINE, rule);
        if self.lframe {
            canvas.put_char(0, 0, config::GLYPH_UL_CORNER, rule);
        }
        if self.rframe {
            canvas.put_char(width - 1, 0, config::GLYPH_UR_CORNER, rule);
        }

        let bar_x = self.lframe as u16;
        let bar_width = bar_width(width, self.lframe, self.rframe);
        let avail = title_width(width, self.lframe, self.rframe);
        let title = elide(self.title, avail as usize);

        let text_style = if self.focused {
            // The whole bar is highlighted and the title padded across it
            let style = self.bar_style();
            canvas.hline(bar_x, 0, bar_width, ' ', style);
            let padded = format!("{:<width$}", title, width = avail as usize);
            canvas.put_str(bar_x + 2, 0, &padded, style);
            style
        } else {
            if avail > 0 {
                canvas.put_char(bar_x + 1, 0, ' ', rule);
                let written = canvas.put_str(bar_x + 2, 0, &title, Style::default());
                canvas.put_char(bar_x + 2 + written, 0, ' ', rule);
            }
            Style::default()
        };

        let Some(status) = self.status.filter(|s| !s.is_empty()) else {
            return;
        };
        let stat_chars = status.chars().count().min(avail as usize / 2) as u16;
        if stat_chars == 0 {
            return;
        }
        let text: String = status.chars().take(stat_chars as usize).collect();
        let stat_x = bar_x + bar_width - 2 - stat_chars;
        canvas.put_char(stat_x - 1, 0, ' ', text_style);
        canvas.put_str(stat_x, 0, &text, text_style);
        canvas.put_char(stat_x + stat_chars, 0, ' ', text_style);
    }

    fn lower_edge(&self, height: u16) -> u16 {
        height.saturating_sub(self.taskbar_height)
    }

    fn paint_side(&self, canvas: &mut Canvas<'_>, x: u16, height: u16) {
        let rows = self.lower_edge(height).saturating_sub(1);
        canvas.vline(x, 1, rows, config::GLYPH_VLINE, self.rule_style());
    }

    fn paint_task_bar(&self, canvas: &mut Canvas<'_>, width: u16, height: u16) {
        let lower = self.lower_edge(height);
        // No room below the title row
        if lower == 0 {
            return;
        }
        let rule = self.rule_style();
        canvas.hline(0, lower, width, config::GLYPH_HLINE, rule);
        if self.lframe {
            canvas.put_char(0, lower, config::GLYPH_LL_CORNER, rule);
        }
        if self.rframe {
            canvas.put_char(width - 1, lower, config::GLYPH_LR_CORNER, rule);
        }
        for row in lower + 1..height {
            canvas.fill_row(row, ' ', Style::default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Backend, Cell, CellScreen, Rect, SurfaceId};

    fn chrome(title: &str) -> Chrome<'_> {
        Chrome {
            title,
            status: None,
            focused: false,
            lframe: true,
            rframe: true,
            taskbar_height: 0,
        }
    }

    fn paint(chrome: &Chrome<'_>, width: u16, height: u16) -> (CellScreen, SurfaceId) {
        let mut screen = CellScreen::new(width, height);
        let id = screen.create(Rect::new(0, 0, width, height)).unwrap();
        let mut canvas = Canvas::new(&mut screen, id).unwrap();
        chrome.paint(&mut canvas);
        (screen, id)
    }

    fn snapshot(screen: &CellScreen, id: SurfaceId, width: u16, height: u16) -> Vec<Cell> {
        (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| screen.cell(id, x, y).unwrap())
            .collect()
    }

    #[test]
    fn test_unfocused_title_continues_rule() {
        let (screen, id) = paint(&chrome("main.rs"), 20, 3);
        assert_eq!(screen.row_text(id, 0), "┌─ main.rs ────────┐");
        assert_eq!(screen.row_text(id, 1), "│                  │");
    }

    #[test]
    fn test_no_side_frames() {
        let mut c = chrome("ab");
        c.lframe = false;
        c.rframe = false;
        let (screen, id) = paint(&c, 10, 3);
        assert_eq!(screen.row_text(id, 0), "─ ab ─────");
        assert_eq!(screen.row_text(id, 1), "          ");
    }

    #[test]
    fn test_empty_title_keeps_gutter() {
        let (screen, id) = paint(&chrome(""), 12, 2);
        assert_eq!(screen.row_text(id, 0), "┌─  ───────┐");
        let (screen, id) = paint(&chrome(""), 5, 1);
        assert_eq!(screen.row_text(id, 0), "┌───┐");
    }

    #[test]
    fn test_focused_title_fills_bar() {
        let mut c = chrome("main.rs");
        c.focused = true;
        let (screen, id) = paint(&c, 20, 2);
        assert_eq!(screen.row_text(id, 0), "┌  main.rs         ┐");
        for x in 1..19 {
            assert!(screen.cell(id, x, 0).unwrap().attrs.has(Attrs::REVERSE));
        }
        assert!(!screen.cell(id, 0, 0).unwrap().attrs.has(Attrs::REVERSE));
    }

    #[test]
    fn test_long_title_elided_to_width() {
        let c = chrome("a_very_long_file_name_indeed.rs");
        let (screen, id) = paint(&c, 16, 2);
        let avail = title_width(16, true, true) as usize;
        let row: Vec<char> = screen.row_text(id, 0).chars().collect();
        let title: String = row[3..3 + avail].iter().collect();
        assert_eq!(title.chars().count(), avail);
        assert!(title.ends_with('…'));
        assert_eq!(row[3 + avail], ' ');
        assert_eq!(row.len(), 16);
    }

    #[test]
    fn test_elide() {
        assert_eq!(elide("abc", 3), "abc");
        assert_eq!(elide("abcd", 3), "ab…");
        assert_eq!(elide("abcd", 1), "…");
        assert_eq!(elide("abcd", 0), "");
    }

    #[test]
    fn test_status_right_aligned() {
        let mut c = chrome("notes.txt");
        c.status = Some("Ln 4/9");
        let (screen, id) = paint(&c, 30, 2);
        let row = screen.row_text(id, 0);
        assert!(row.ends_with(" Ln 4/9 ─┐"), "{row}");
        assert!(row.starts_with("┌─ notes.txt "));
    }

    #[test]
    fn test_status_limited_to_half_width() {
        for width in 0..40u16 {
            for &(lframe, rframe) in &[(false, false), (true, false), (false, true), (true, true)] {
                let c = Chrome {
                    title: "",
                    status: Some("################################"),
                    focused: false,
                    lframe,
                    rframe,
                    taskbar_height: 0,
                };
                let (screen, id) = paint(&c, width.max(1), 1);
                let row: Vec<char> = screen.row_text(id, 0).chars().collect();
                let bar_x = lframe as usize;
                // The two cells opening the bar always keep the title gutter
                for x in bar_x..(bar_x + 2).min(row.len()) {
                    assert_ne!(row[x], '#', "width {width} frames {lframe}/{rframe}");
                }
                let shown = row.iter().filter(|&&ch| ch == '#').count();
                assert!(shown <= title_width(width.max(1), lframe, rframe) as usize / 2);
            }
        }
    }

    #[test]
    fn test_task_bar() {
        let mut c = chrome("x");
        c.taskbar_height = 2;
        let (screen, id) = paint(&c, 8, 6);
        assert_eq!(screen.row_text(id, 3), "│      │");
        assert_eq!(screen.row_text(id, 4), "└──────┘");
        assert_eq!(screen.row_text(id, 5), "        ");
    }

    #[test]
    fn test_paint_idempotent() {
        let mut c = chrome("idempotent");
        c.status = Some("ok");
        c.taskbar_height = 1;
        let mut screen = CellScreen::new(24, 5);
        let id = screen.create(Rect::new(0, 0, 24, 5)).unwrap();

        let mut canvas = Canvas::new(&mut screen, id).unwrap();
        c.paint(&mut canvas);
        let first = snapshot(&screen, id, 24, 5);

        let mut canvas = Canvas::new(&mut screen, id).unwrap();
        c.paint(&mut canvas);
        assert_eq!(first, snapshot(&screen, id, 24, 5));
    }

    #[test]
    fn test_degenerate_sizes() {
        for width in 0..6 {
            for height in 0..3 {
                let mut c = chrome("title");
                c.status = Some("status");
                c.taskbar_height = 3;
                let mut screen = CellScreen::new(8, 8);
                let id = screen.create(Rect::new(0, 0, width, height)).unwrap();
                let mut canvas = Canvas::new(&mut screen, id).unwrap();
                c.paint(&mut canvas);
            }
        }
    }
}
