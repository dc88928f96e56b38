//! Configuration for wwr
//!
//! Stored as TOML, by default in `$XDG_CONFIG_HOME/wwr/config.toml`.

use crate::DecodeMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = "wwr";
const CONFIG_FILE: &str = "config.toml";

/// wwr configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the issue, comment and user files
    pub data_dir: PathBuf,

    /// Refuse to create an issue whose title is already in use
    pub unique_titles: bool,

    /// How malformed files are handled on startup
    pub decode: DecodeMode,

    /// File names inside `data_dir`
    #[serde(default)]
    pub files: FilesConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            unique_titles: true,
            decode: DecodeMode::Lenient,
            files: FilesConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Persisted file names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub issues: String,
    pub comments: String,
    pub users: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            issues: "context.txt".to_string(),
            comments: "comments.txt".to_string(),
            users: "users.txt".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1234,
        }
    }
}

impl Config {
    /// Default config location, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from an explicit path, or from the default location when none is given.
    ///
    /// A missing file at the default location yields the defaults; a missing
    /// explicit file is an error.
    pub fn discover(explicit: Option<&Path>) -> crate::Result<Self> {
        match explicit {
            Some(path) if !path.exists() => Err(crate::Error::Config(format!(
                "{} does not exist",
                path.display()
            ))),
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) => Self::load(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Load config from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save config to a TOML file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn issues_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.issues)
    }

    pub fn comments_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.comments)
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.users)
    }

    /// Generate a default config file with comments
    pub fn default_with_comments() -> String {
        r#"# wwr configuration

# Directory holding the issue, comment and user files
data_dir = "."

# Refuse to create an issue whose title is already in use
unique_titles = true

# How malformed files are handled on startup (lenient, strict)
# lenient keeps what decodes cleanly and logs a warning for the rest
decode = "lenient"

[files]
issues = "context.txt"
comments = "comments.txt"
users = "users.txt"

[server]
host = "127.0.0.1"
# WWR_API_PORT overrides this
port = 1234
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_matches_defaults() {
        let parsed = Config::parse(&Config::default_with_comments()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let parsed = Config::parse(
            r#"
decode = "strict"

[server]
port = 8080
"#,
        )
        .unwrap();
        assert_eq!(parsed.decode, DecodeMode::Strict);
        assert_eq!(parsed.server.port, 8080);
        assert_eq!(parsed.server.host, "127.0.0.1");
        assert!(parsed.unique_titles);
        assert_eq!(parsed.files.users, "users.txt");
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            Config::parse("decode = \"sloppy\""),
            Err(crate::Error::Config(_))
        ));
    }

    #[test]
    fn test_paths_join_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/srv/wwr"),
            ..Config::default()
        };
        assert_eq!(config.issues_path(), PathBuf::from("/srv/wwr/context.txt"));
        assert_eq!(config.comments_path(), PathBuf::from("/srv/wwr/comments.txt"));
        assert_eq!(config.users_path(), PathBuf::from("/srv/wwr/users.txt"));
    }
}
