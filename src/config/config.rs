use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sql::PlaceholderStyle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaoConfig {
    /// How placeholders are written: "pyformat" (`%(name)s`) or "colon" (`:name`)
    pub placeholder_style: PlaceholderStyle,

    /// Write the generated primary key back into inserted records
    pub populate_keys: bool,

    /// Known primary keys per table; skips the `SHOW KEYS` lookup
    pub key_columns: HashMap<String, String>,
}

impl Default for DaoConfig {
    fn default() -> Self {
        Self {
            placeholder_style: PlaceholderStyle::PyFormat,
            populate_keys: true,
            key_columns: HashMap::new(),
        }
    }
}

impl DaoConfig {
    /// Load config from the default location, or defaults if there is none
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: DaoConfig = toml::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("sql-dao").join("config.toml"))
    }

    pub fn key_column(&self, table: &str) -> Option<&str> {
        self.key_columns.get(table).map(String::as_str)
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# sql-dao configuration
# Location: ~/.config/sql-dao/config.toml (Linux)

# Placeholder syntax of the driver: "pyformat" for %(name)s, "colon" for :name
placeholder_style = "pyformat"

# Write auto-increment ids back into records returned by insert
populate_keys = true

# Primary keys known ahead of time, by table
# [key_columns]
# users = "id"
"#
        .to_string()
    }
}
