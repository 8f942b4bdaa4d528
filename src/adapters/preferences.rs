//! File-backed theme preference.
//!
//! The file holds a single TOML key, `theme = "dark"`.  A missing or
//! unreadable file reads as the default theme; only saving reports errors.

use std::io;
use std::path::PathBuf;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::PreferenceStore;
use crate::model::Theme;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(default)]
    theme: Theme,
}

#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreferenceStore for FilePreferences {
    fn load_theme(&self) -> Theme {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Theme::default(),
            Err(e) => {
                warn!("Preferences: cannot read {}: {}", self.path.display(), e);
                return Theme::default();
            }
        };
        match toml::from_str::<PreferenceFile>(&content) {
            Ok(prefs) => prefs.theme,
            Err(e) => {
                warn!("Preferences: ignoring malformed {}: {}", self.path.display(), e);
                Theme::default()
            }
        }
    }

    fn save_theme(&mut self, theme: Theme) -> io::Result<()> {
        let body = toml::to_string(&PreferenceFile { theme })
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, body)?;
        debug!("Preferences: theme={} saved to {}", theme, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("growdash-{}-{}.toml", name, std::process::id()))
    }

    #[test]
    fn missing_file_reads_default() {
        let prefs = FilePreferences::new(temp_path("missing"));
        assert_eq!(prefs.load_theme(), Theme::Dark);
    }

    #[test]
    fn saved_theme_is_loaded_back() {
        let path = temp_path("saved");
        let mut prefs = FilePreferences::new(&path);
        prefs.save_theme(Theme::Light).unwrap();
        assert_eq!(prefs.load_theme(), Theme::Light);
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "theme = \"light\"");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn malformed_file_reads_default() {
        let path = temp_path("malformed");
        std::fs::write(&path, "theme = \"neon\"").unwrap();
        assert_eq!(FilePreferences::new(&path).load_theme(), Theme::Dark);
        std::fs::remove_file(path).ok();
    }
}
