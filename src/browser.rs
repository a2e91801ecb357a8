//! Directory browser - a lazily scanned tree of the filesystem

use crate::config;
use crate::legend::HelpPanel;
use crate::list::ListCursor;
use crate::provider::{ContentProvider, Frame};
use crate::surface::{Attrs, Canvas, Style};
use crate::viewer::Viewer;
use crossterm::event::{KeyCode, KeyEvent};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    Directory,
    File,
    Other,
}

/// A filesystem node whose children are read on first expansion
#[derive(Debug)]
pub struct DirTree {
    path: PathBuf,
    name: String,
    kind: EntryKind,
    expanded: bool,
    items: Option<Vec<DirTree>>,
}

impl DirTree {
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let kind = match std::fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => EntryKind::Directory,
            Ok(meta) if meta.is_file() => EntryKind::File,
            _ => EntryKind::Other,
        };
        Self {
            path,
            name,
            kind,
            expanded: false,
            items: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Children, directories first, each group sorted by name
    pub fn items(&mut self) -> &mut Vec<DirTree> {
        let path = &self.path;
        self.items.get_or_insert_with(|| scan(path))
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded && self.is_directory();
    }

    fn node_mut(&mut self, route: &[usize]) -> Option<&mut DirTree> {
        match route.split_first() {
            None => Some(self),
            Some((&first, rest)) => self.items.as_mut()?.get_mut(first)?.node_mut(rest),
        }
    }
}

fn scan(path: &Path) -> Vec<DirTree> {
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot read {}: {}", path.display(), e);
            return Vec::new();
        }
    };
    let mut items: Vec<DirTree> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| DirTree::new(entry.path()))
        .collect();
    items.sort_by(|a, b| (a.kind, &a.name).cmp(&(b.kind, &b.name)));
    items
}

/// One visible line of the tree
#[derive(Debug, Clone)]
struct Row {
    depth: usize,
    route: Vec<usize>,
    name: String,
    kind: EntryKind,
    expanded: bool,
}

fn flatten(node: &mut DirTree, depth: usize, route: &mut Vec<usize>, rows: &mut Vec<Row>) {
    let count = node.items().len();
    for index in 0..count {
        route.push(index);
        let child = &mut node.items()[index];
        rows.push(Row {
            depth,
            route: route.clone(),
            name: child.name.clone(),
            kind: child.kind,
            expanded: child.expanded,
        });
        if child.expanded {
            flatten(child, depth + 1, route, rows);
        }
        route.pop();
    }
}

pub struct Browser {
    root: DirTree,
    rows: Vec<Row>,
    cursor: ListCursor,
    height: usize,
    error: Option<String>,
}

impl Browser {
    pub fn new(path: PathBuf) -> Self {
        let mut root = DirTree::new(path);
        root.expanded = true;
        let mut browser = Self {
            root,
            rows: Vec::new(),
            cursor: ListCursor::default(),
            height: 0,
            error: None,
        };
        browser.refresh();
        browser
    }

    fn refresh(&mut self) {
        self.rows.clear();
        flatten(&mut self.root, 0, &mut Vec::new(), &mut self.rows);
        self.cursor.clamp(self.rows.len());
    }

    /// Names of the visible rows, indented by depth
    #[cfg(test)]
    pub fn visible_names(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| format!("{}{}", "  ".repeat(row.depth), row.name))
            .collect()
    }

    fn selected_node(&mut self) -> Option<&mut DirTree> {
        let row = self.rows.get(self.cursor.selected())?;
        self.root.node_mut(&row.route)
    }

    fn set_selected_expanded(&mut self, expanded: bool) -> bool {
        match self.selected_node() {
            Some(node) if node.is_directory() && node.expanded != expanded => {
                node.set_expanded(expanded);
                self.refresh();
                true
            }
            _ => false,
        }
    }

    /// Expand or collapse a directory, or open a file in a new window
    fn activate(&mut self, frame: &mut Frame) -> bool {
        let Some(node) = self.selected_node() else {
            return false;
        };
        match node.kind() {
            EntryKind::Directory => {
                let expanded = !node.is_expanded();
                self.set_selected_expanded(expanded)
            }
            EntryKind::File => {
                let path = node.path().to_path_buf();
                match Viewer::open(&path) {
                    Ok(viewer) => {
                        frame.spawn(Box::new(viewer));
                        self.error = None;
                    }
                    Err(e) => {
                        log::warn!("Cannot open {}: {}", path.display(), e);
                        self.error = Some(e.to_string());
                    }
                }
                false
            }
            EntryKind::Other => false,
        }
    }
}

impl ContentProvider for Browser {
    fn paint(&mut self, canvas: &mut Canvas<'_>, focused: bool) {
        self.height = canvas.height() as usize;
        self.cursor.scroll_into_view(self.height);

        let top = self.cursor.top();
        for y in 0..canvas.height() {
            let index = top + y as usize;
            let selected = focused && index == self.cursor.selected();
            let base = if selected {
                Style::default().with(Attrs::REVERSE)
            } else {
                Style::default()
            };
            canvas.fill_row(y, ' ', base);
            let Some(row) = self.rows.get(index) else {
                continue;
            };
            let (marker, style) = match row.kind {
                EntryKind::Directory if row.expanded => ("▾ ", base.fg(config::COLOR_DIRECTORY)),
                EntryKind::Directory => ("▸ ", base.fg(config::COLOR_DIRECTORY)),
                _ => ("  ", base),
            };
            let mut x = (row.depth * 2).min(u16::MAX as usize) as u16;
            x = x.saturating_add(canvas.put_str(x, y, marker, style));
            canvas.put_str(x, y, &row.name, style);
        }
    }

    fn process(&mut self, frame: &mut Frame, key: KeyEvent) -> bool {
        if key.code == config::KEY_CLOSE_PANE && key.modifiers.contains(config::CLOSE_PANE_MODIFIERS) {
            return false;
        }
        let changed = match key.code {
            KeyCode::Enter => self.activate(frame),
            KeyCode::Right => self.set_selected_expanded(true),
            KeyCode::Left => self.set_selected_expanded(false),
            code => self.cursor.navigate(code, self.rows.len(), self.height),
        };
        if changed {
            frame.request_repaint();
        }
        true
    }

    fn title(&self) -> String {
        self.root.name.clone()
    }

    fn status(&self) -> Option<String> {
        self.error.clone()
    }

    fn set_help(&self, panel: &mut HelpPanel) {
        panel.add("Enter", "Open");
        panel.add("←→", "Fold");
        panel.add("^W", "Close");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src").join("main.rs"), "fn main() {}\n").unwrap();
        std::fs::write(dir.path().join("README"), "hello\n").unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        dir
    }

    fn press(browser: &mut Browser, code: KeyCode) -> Frame {
        let mut frame = Frame::new();
        assert!(browser.process(&mut frame, KeyEvent::new(code, KeyModifiers::NONE)));
        frame
    }

    #[test]
    fn test_directories_first() {
        let dir = fixture();
        let browser = Browser::new(dir.path().to_path_buf());
        assert_eq!(browser.visible_names(), ["docs", "src", "README"]);
    }

    #[test]
    fn test_expand_and_collapse() {
        let dir = fixture();
        let mut browser = Browser::new(dir.path().to_path_buf());
        press(&mut browser, KeyCode::Down);
        let frame = press(&mut browser, KeyCode::Enter);
        assert!(frame.repaint_requested());
        assert_eq!(browser.visible_names(), ["docs", "src", "  main.rs", "README"]);

        press(&mut browser, KeyCode::Left);
        assert_eq!(browser.visible_names(), ["docs", "src", "README"]);
    }

    #[test]
    fn test_enter_on_file_spawns_viewer() {
        let dir = fixture();
        let mut browser = Browser::new(dir.path().to_path_buf());
        press(&mut browser, KeyCode::End);
        let mut frame = press(&mut browser, KeyCode::Enter);
        let spawned = frame.take_spawned();
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].title(), "README");
    }

    #[test]
    fn test_close_key() {
        let dir = fixture();
        let mut browser = Browser::new(dir.path().to_path_buf());
        let mut frame = Frame::new();
        let key = KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL);
        assert!(!browser.process(&mut frame, key));
    }

    #[test]
    fn test_unreadable_root() {
        let browser = Browser::new(PathBuf::from("/nonexistent/path/for/tessel"));
        assert!(browser.visible_names().is_empty());
        assert_eq!(browser.title(), "tessel");
    }
}
