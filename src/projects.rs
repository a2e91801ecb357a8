//! Project menu - lists version-controlled directories to browse
//!
//! Discovery is kept separate from the menu: `discover` produces the
//! entries, the menu only displays and opens them.

use crate::browser::Browser;
use crate::config;
use crate::legend::HelpPanel;
use crate::list::ListCursor;
use crate::provider::{ContentProvider, Frame};
use crate::surface::{Attrs, Canvas, Style};
use crossterm::event::{KeyCode, KeyEvent};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsKind {
    Git,
    Svn,
}

impl VcsKind {
    pub fn label(&self) -> &'static str {
        match self {
            VcsKind::Git => "git",
            VcsKind::Svn => "svn",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEntry {
    pub title: String,
    pub path: PathBuf,
    pub kind: VcsKind,
}

/// Which version control system manages `path`, if any
pub fn repo_kind(path: &Path) -> Option<VcsKind> {
    if path.join(".git").is_dir() {
        Some(VcsKind::Git)
    } else if path.join(".svn").is_dir() {
        Some(VcsKind::Svn)
    } else {
        None
    }
}

/// Scan the immediate subdirectories of `root` for repositories.
/// Titles use `~` for the home directory.
pub fn discover(root: &Path) -> Vec<ProjectEntry> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot scan {} for projects: {}", root.display(), e);
            return Vec::new();
        }
    };
    let prefix = if dirs::home_dir().as_deref() == Some(root) {
        "~".to_string()
    } else {
        root.display().to_string()
    };

    let mut projects: Vec<ProjectEntry> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| {
            let path = entry.path();
            let kind = repo_kind(&path)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            Some(ProjectEntry {
                title: format!("{}/{}", prefix.trim_end_matches('/'), name),
                path,
                kind,
            })
        })
        .collect();
    projects.sort_by(|a, b| a.title.cmp(&b.title));
    log::debug!("Found {} projects under {}", projects.len(), root.display());
    projects
}

pub struct ProjectMenu {
    entries: Vec<ProjectEntry>,
    cursor: ListCursor,
    height: usize,
    last_project: Option<String>,
}

impl ProjectMenu {
    pub fn new(entries: Vec<ProjectEntry>) -> Self {
        Self {
            entries,
            cursor: ListCursor::default(),
            height: 0,
            last_project: None,
        }
    }

    fn open_selected(&mut self, frame: &mut Frame) {
        let Some(entry) = self.entries.get(self.cursor.selected()) else {
            return;
        };
        log::debug!("Opening project {}", entry.path.display());
        frame.spawn(Box::new(Browser::new(entry.path.clone())));
        self.last_project = Some(entry.title.clone());
    }
}

impl ContentProvider for ProjectMenu {
    fn paint(&mut self, canvas: &mut Canvas<'_>, focused: bool) {
        self.height = canvas.height() as usize;
        self.cursor.scroll_into_view(self.height);

        if self.entries.is_empty() {
            canvas.clear();
            canvas.put_str(1, 0, "No projects found", Style::default().with(Attrs::DIM));
            return;
        }

        let width = self.entries.iter().map(|e| e.title.chars().count()).max().unwrap_or(0);
        let top = self.cursor.top();
        for y in 0..canvas.height() {
            let index = top + y as usize;
            let style = if focused && index == self.cursor.selected() {
                Style::default().with(Attrs::REVERSE)
            } else {
                Style::default()
            };
            canvas.fill_row(y, ' ', style);
            if let Some(entry) = self.entries.get(index) {
                let line = format!(" {:<width$}  {}", entry.title, entry.kind.label(), width = width);
                canvas.put_str(0, y, &line, style);
            }
        }
    }

    fn process(&mut self, frame: &mut Frame, key: KeyEvent) -> bool {
        if key.code == config::KEY_CLOSE_PANE && key.modifiers.contains(config::CLOSE_PANE_MODIFIERS) {
            return false;
        }
        match key.code {
            KeyCode::Enter => self.open_selected(frame),
            code => {
                if self.cursor.navigate(code, self.entries.len(), self.height) {
                    frame.request_repaint();
                }
            }
        }
        true
    }

    fn title(&self) -> String {
        match &self.last_project {
            Some(project) => format!("Project: {}", project),
            None => "Project".to_string(),
        }
    }

    fn set_help(&self, panel: &mut HelpPanel) {
        panel.add("Enter", "Browse");
        panel.add("^W", "Close");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Backend, CellScreen, Rect};
    use crossterm::event::KeyModifiers;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("beta").join(".git")).unwrap();
        fs::create_dir_all(dir.path().join("alpha").join(".svn")).unwrap();
        fs::create_dir_all(dir.path().join("plain")).unwrap();
        fs::write(dir.path().join("file.txt"), "").unwrap();
        dir
    }

    #[test]
    fn test_discover() {
        let dir = fixture();
        let projects = discover(dir.path());
        let found: Vec<_> = projects.iter().map(|p| (p.path.clone(), p.kind)).collect();
        assert_eq!(
            found,
            [
                (dir.path().join("alpha"), VcsKind::Svn),
                (dir.path().join("beta"), VcsKind::Git),
            ]
        );
        assert!(projects[0].title.ends_with("/alpha"));
    }

    #[test]
    fn test_discover_missing_root() {
        assert!(discover(Path::new("/nonexistent/tessel/projects")).is_empty());
    }

    #[test]
    fn test_open_spawns_browser() {
        let dir = fixture();
        let mut menu = ProjectMenu::new(discover(dir.path()));
        assert_eq!(menu.title(), "Project");

        let mut frame = Frame::new();
        menu.process(&mut frame, KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        assert!(frame.repaint_requested());
        menu.process(&mut frame, KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        let spawned = frame.take_spawned();
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].title(), "beta");
        assert!(menu.title().starts_with("Project: ") && menu.title().ends_with("/beta"));
    }

    #[test]
    fn test_paint_entries() {
        let entries = vec![
            ProjectEntry {
                title: "~/tessel".into(),
                path: PathBuf::from("/home/u/tessel"),
                kind: VcsKind::Git,
            },
            ProjectEntry {
                title: "~/old".into(),
                path: PathBuf::from("/home/u/old"),
                kind: VcsKind::Svn,
            },
        ];
        let mut menu = ProjectMenu::new(entries);
        let mut screen = CellScreen::new(20, 3);
        let id = screen.create(Rect::new(0, 0, 20, 3)).unwrap();
        let mut canvas = Canvas::new(&mut screen, id).unwrap();
        menu.paint(&mut canvas, false);
        assert_eq!(screen.row_text(id, 0).trim_end(), " ~/tessel  git");
        assert_eq!(screen.row_text(id, 1).trim_end(), " ~/old     svn");
        assert_eq!(screen.row_text(id, 2).trim_end(), "");
    }
}
