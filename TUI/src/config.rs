/// Application configuration and constants.
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;
use crate::visibility::Thresholds;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Company shown in the header and on the welcome screen
    pub company_name: String,

    /// Label used for assistant messages
    pub ai_name: String,

    /// Seed history with the demo conversation
    pub seed_welcome_chat: bool,

    /// Main loop tick rate in milliseconds (target 60 FPS = ~16ms)
    pub tick_rate_ms: u64,

    /// How many ticks to show status messages (180 = ~3s at 60fps)
    pub status_timeout_ticks: u64,

    /// Modulo for animation frame counter
    pub animation_frame_mod: usize,

    /// Lines to scroll per key press
    pub scroll_step: usize,

    /// Sidebar width in columns while collapsed
    pub sidebar_collapsed_width: u16,

    /// Sidebar width in columns while expanded
    pub sidebar_expanded_width: u16,

    /// Header height in rows while visible
    pub header_height: u16,

    /// Lower bound of the simulated reply delay
    pub reply_min_delay_ms: u64,

    /// Upper bound (exclusive) of the simulated reply delay
    pub reply_max_delay_ms: u64,

    /// How long the header stays up after launch
    pub header_intro_ms: u64,

    /// Pointer within this distance of the top reveals the header
    pub header_reveal_px: u32,

    /// Pointer beyond this distance hides the header
    pub header_hide_px: u32,

    /// Approximate pixel height of a terminal row
    pub cell_height_px: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            company_name: "Acme Corp".to_string(),
            ai_name: "Assistant".to_string(),
            seed_welcome_chat: true,
            tick_rate_ms: 16,
            status_timeout_ticks: 180,
            animation_frame_mod: 360,
            scroll_step: 3,
            sidebar_collapsed_width: 6,
            sidebar_expanded_width: 34,
            header_height: 3,
            reply_min_delay_ms: 1000,
            reply_max_delay_ms: 3000,
            header_intro_ms: 3000,
            header_reveal_px: 50,
            header_hide_px: 100,
            cell_height_px: 16,
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    /// A missing default file yields the defaults; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| AppError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn reply_delay_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.reply_min_delay_ms),
            Duration::from_millis(self.reply_max_delay_ms),
        )
    }

    pub fn header_intro(&self) -> Duration {
        Duration::from_millis(self.header_intro_ms)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            reveal_px: self.header_reveal_px,
            hide_px: self.header_hide_px,
        }
    }

    /// Pixel offset of the top edge of terminal row `row`.
    pub fn row_to_px(&self, row: u16) -> u32 {
        row as u32 * self.cell_height_px
    }
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("acme-chat").join("config.toml"))
}

/// Slash commands offered in the popup
pub const COMMANDS: &[(&str, &str)] = &[
    ("/new", "Start a new chat"),
    ("/stop", "Stop the pending reply"),
    ("/upload", "Upload a file"),
    ("/copy", "Copy the last reply"),
    ("/like", "Rate the last reply up"),
    ("/dislike", "Rate the last reply down"),
    ("/sidebar", "Pin or unpin the sidebar"),
    ("/help", "Show available commands"),
    ("/quit", "Exit"),
];

/// Conversation starters on the welcome screen
pub const SUGGESTED_PROMPTS: &[&str] = &[
    "Help me analyze this data",
    "Explain a complex concept",
    "Generate creative ideas",
    "Assist with problem solving",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.company_name, "Acme Corp");
        assert_eq!(config.reply_min_delay_ms, 1000);
        assert_eq!(config.reply_max_delay_ms, 3000);
        assert_eq!(config.header_reveal_px, 50);
        assert_eq!(config.header_hide_px, 100);
    }

    #[test]
    fn test_partial_override() {
        let config = Config::parse("company_name = \"Globex\"\nreply_max_delay_ms = 1500\n").unwrap();
        assert_eq!(config.company_name, "Globex");
        assert_eq!(config.reply_max_delay_ms, 1500);
        assert_eq!(config.header_intro_ms, 3000);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tick_rate_ms = \"fast\"").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
    }

    #[test]
    fn test_missing_explicit_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, AppError::Io { .. }));
    }

    #[test]
    fn test_row_to_px() {
        let config = Config::default();
        assert_eq!(config.row_to_px(0), 0);
        assert_eq!(config.row_to_px(3), 48);
        assert_eq!(config.row_to_px(7), 112);
    }
}
