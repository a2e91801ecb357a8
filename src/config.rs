//! User configuration
//!
//! Key bindings and glyphs are compile-time constants; edit this file to
//! customize them. Runtime settings come from an optional TOML file.

use crate::error::{Error, Result};
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::style::Color;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ============================================================================
// GENERAL SETTINGS
// ============================================================================

/// Rows reserved under each window's content for its task bar
pub const TASKBAR_HEIGHT: u16 = 0;

/// Whether the key legend occupies the bottom screen row
pub const SHOW_LEGEND: bool = true;

/// Application directory name under the platform config dir
pub const APP_NAME: &str = "tessel";

/// Config file name inside the application directory
pub const CONFIG_FILE: &str = "config.toml";

// ============================================================================
// PREFIX KEY
// ============================================================================

/// The prefix key that activates shell command mode
/// Default: Ctrl+B (same as tmux)
pub const PREFIX_KEY: KeyCode = KeyCode::Char('b');
pub const PREFIX_MODIFIERS: KeyModifiers = KeyModifiers::CONTROL;

// ============================================================================
// KEYBINDINGS (after prefix)
// ============================================================================

pub const KEY_QUIT: KeyCode = KeyCode::Char('q');
pub const KEY_CLOSE_WINDOW: KeyCode = KeyCode::Char('x');
pub const KEY_FOCUS_NEXT: KeyCode = KeyCode::Char('j');
pub const KEY_FOCUS_PREV: KeyCode = KeyCode::Char('k');
pub const KEY_OPEN_PROJECTS: KeyCode = KeyCode::Char('p');

// ============================================================================
// PANE KEYBINDINGS
// ============================================================================

/// Close the focused pane (viewers ask first)
pub const KEY_CLOSE_PANE: KeyCode = KeyCode::Char('w');
pub const CLOSE_PANE_MODIFIERS: KeyModifiers = KeyModifiers::CONTROL;

/// Rows moved by PageUp/PageDown beyond the visible height
pub const PAGE_OVERLAP: usize = 1;

// ============================================================================
// FRAME GLYPHS
// ============================================================================

pub const GLYPH_HLINE: char = '─';
pub const GLYPH_VLINE: char = '│';
pub const GLYPH_UL_CORNER: char = '┌';
pub const GLYPH_UR_CORNER: char = '┐';
pub const GLYPH_LL_CORNER: char = '└';
pub const GLYPH_LR_CORNER: char = '┘';
pub const GLYPH_ELLIPSIS: char = '…';

// ============================================================================
// COLORS
// ============================================================================

pub const COLOR_FRAME_FOCUSED: Color = Color::Rgb { r: 120, g: 190, b: 120 };
pub const COLOR_FRAME_UNFOCUSED: Color = Color::DarkGrey;
pub const COLOR_DIALOG_BG: Color = Color::Rgb { r: 200, g: 170, b: 60 };
pub const COLOR_DIALOG_FG: Color = Color::Black;
pub const COLOR_LEGEND_KEY: Color = Color::Rgb { r: 80, g: 150, b: 80 };
pub const COLOR_DIRECTORY: Color = Color::Rgb { r: 110, g: 150, b: 200 };

// ============================================================================
// RUNTIME SETTINGS
// ============================================================================

/// Settings read from the TOML config file; every field is optional
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Task bar rows under each window
    pub taskbar_height: u16,
    /// Show the key legend on the bottom row
    pub legend: bool,
    /// Directory scanned for projects (defaults to the home directory)
    pub projects_root: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            taskbar_height: TASKBAR_HEIGHT,
            legend: SHOW_LEGEND,
            projects_root: None,
        }
    }
}

impl Settings {
    /// Default config file location, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Load settings from an explicit path, or the default location.
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => {
                    log::debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::parse(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded config from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    pub fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Directory the project menu scans
    pub fn projects_root(&self) -> Option<PathBuf> {
        self.projects_root.clone().or_else(dirs::home_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_config() {
        let settings = Settings::parse("taskbar_height = 2\nlegend = false\n").unwrap();
        assert_eq!(settings.taskbar_height, 2);
        assert!(!settings.legend);
        assert_eq!(settings.projects_root, None);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Settings::parse("colour = \"red\"").is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Settings::load(Some(Path::new("/nonexistent/tessel.toml"))).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "projects_root = \"/srv/src\"\n").unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.projects_root(), Some(PathBuf::from("/srv/src")));
    }
}
