use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use maira_core::config::GeminiConfig;
use serde::{Deserialize, Serialize};

/// Default HTTP port when neither config, environment nor CLI set one
pub const DEFAULT_PORT: u16 = 3000;

/// Memory file name inside the data root
pub const MEMORY_FILE_NAME: &str = "maira_memory.json";

/// Scratch subdirectory for spooled uploads inside the data root
pub const UPLOADS_DIR_NAME: &str = "uploads";

/// Server configuration: HTTP knobs, directory layout and the nested
/// provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
    pub public_dir: Option<PathBuf>,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file if it exists, otherwise
    /// returns the defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: Self = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Fills unset fields from the process environment (`PORT`,
    /// `GEMINI_API_KEY`)
    pub fn fill_from_env(mut self) -> Self {
        if self.port.is_none() {
            self.port = env::var("PORT").ok().and_then(|p| p.parse().ok());
        }
        self.gemini = self.gemini.fill_from_env();
        self
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Data root holding the memory file and the uploads scratch dir
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    /// Scratch directory where multipart uploads are spooled before the
    /// Files API accepts them
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir().join(UPLOADS_DIR_NAME)
    }

    /// Path of the persisted memory file
    pub fn memory_file(&self) -> PathBuf {
        self.data_dir().join(MEMORY_FILE_NAME)
    }

    /// Directory of static front-end assets
    pub fn public_dir(&self) -> PathBuf {
        self.public_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("public"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_original_layout() {
        let config = AppConfig::default();
        assert_eq!(config.port(), 3000);
        assert_eq!(config.data_dir(), PathBuf::from("data"));
        assert_eq!(config.uploads_dir(), PathBuf::from("data/uploads"));
        assert_eq!(config.memory_file(), PathBuf::from("data/maira_memory.json"));
        assert_eq!(config.public_dir(), PathBuf::from("public"));
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maira.toml");
        fs::write(
            &path,
            r#"
port = 8080
data_dir = "/var/lib/maira"

[gemini]
fallback_model = "gemini-2.0-flash"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.port(), 8080);
        assert_eq!(config.memory_file(), PathBuf::from("/var/lib/maira/maira_memory.json"));
        assert_eq!(config.gemini.fallback_model(), "gemini-2.0-flash");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load_from_file(Path::new("/nonexistent/maira.toml")).unwrap();
        assert_eq!(config.port(), DEFAULT_PORT);
    }
}
