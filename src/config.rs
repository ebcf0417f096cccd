/// Application configuration
///
/// Read once at startup from `<config dir>/template-deck/config.toml`:
/// - Linux: ~/.config/template-deck/config.toml
/// - macOS: ~/Library/Application Support/template-deck/config.toml
/// - Windows: %APPDATA%\template-deck\config.toml
///
/// Every key is optional. A missing file means defaults; a malformed file
/// is reported and ignored.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "template-deck";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Catalog database file; defaults to the user data directory
    pub database_path: Option<PathBuf>,
    /// Quiet period after the last keystroke before searching
    pub search_debounce_ms: u64,
    /// Fade-out time before a new visible list is swapped in
    pub filter_settle_ms: u64,
    /// Time one card move holds the navigation lock
    pub navigation_ms: u64,
    /// Default log filter when neither TEMPLATE_DECK_LOG nor RUST_LOG is set
    pub log_level: String,
    /// Insert the bundled demo catalog into an empty database
    pub seed_demo_catalog: bool,
    /// Email of an existing account to grant the admin flag at startup
    pub bootstrap_admin: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            search_debounce_ms: 350,
            filter_settle_ms: 300,
            navigation_ms: 300,
            log_level: "info".to_string(),
            seed_demo_catalog: true,
            bootstrap_admin: None,
        }
    }
}

/// Why the config file was not used
#[derive(Debug)]
pub enum ConfigIssue {
    Unreadable(PathBuf, std::io::Error),
    Malformed(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigIssue::Unreadable(path, e) => write!(f, "cannot read {}: {}", path.display(), e),
            ConfigIssue::Malformed(path, e) => write!(f, "invalid config {}: {}", path.display(), e),
        }
    }
}

impl Config {
    /// Load from the default location.
    ///
    /// Logging is not up yet when this runs, so problems are handed back
    /// to the caller instead of being logged here.
    pub fn load() -> (Self, Option<ConfigIssue>) {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => (Self::default(), None),
        }
    }

    pub fn load_from(path: &Path) -> (Self, Option<ConfigIssue>) {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return (Self::default(), None),
            Err(e) => return (Self::default(), Some(ConfigIssue::Unreadable(path.to_path_buf(), e))),
        };

        match Self::from_toml(&text) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(ConfigIssue::Malformed(path.to_path_buf(), e))),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Where the catalog database lives
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database_path {
            return path.clone();
        }

        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push("catalog.db");
        path
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn filter_settle(&self) -> Duration {
        Duration::from_millis(self.filter_settle_ms)
    }

    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.search_debounce(), Duration::from_millis(350));
        assert_eq!(config.filter_settle(), Duration::from_millis(300));
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml(
            r#"
            search_debounce_ms = 200
            database_path = "/tmp/catalog.db"
            seed_demo_catalog = false
            "#,
        )
        .unwrap();

        assert_eq!(config.search_debounce_ms, 200);
        assert_eq!(config.navigation_ms, 300);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/catalog.db"));
        assert!(!config.seed_demo_catalog);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        assert!(Config::from_toml("search_debounce_ms = \"soon\"").is_err());

        let (config, issue) = Config::load_from(Path::new("/definitely/not/here/config.toml"));
        assert_eq!(config, Config::default());
        assert!(issue.is_none());
    }
}
