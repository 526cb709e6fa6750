//! Where the reference tables live and how their columns are named.
//!
//! Configuration is a JSON file; every field is optional and falls back to
//! the layout of the published Qualis, JCR and SciMago exports.
//!
//! ```json
//! {
//!   "data_dir": "/srv/lattes/data",
//!   "jcr": { "file": "jcr-2024.csv", "score_column": "2024 JIF" }
//! }
//! ```

use crate::error::{Result, ScoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a JSON configuration file.
pub const CONFIG_ENV: &str = "LATTES_SCORE_CONFIG";
/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "LATTES_SCORE_DATA_DIR";

/// Qualis table layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityTableConfig {
    pub file: PathBuf,
    pub delimiter: char,
    pub identifier_column: String,
    pub tier_column: String,
}

impl Default for QualityTableConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("qualis.csv"),
            delimiter: ',',
            identifier_column: "ISSN".to_string(),
            tier_column: "Estrato".to_string(),
        }
    }
}

/// JCR table layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JcrTableConfig {
    pub file: PathBuf,
    pub delimiter: char,
    pub identifier_column: String,
    pub alt_identifier_column: String,
    pub score_column: String,
    pub quartile_column: String,
}

impl Default for JcrTableConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("jcr.csv"),
            delimiter: ',',
            identifier_column: "ISSN".to_string(),
            alt_identifier_column: "eISSN".to_string(),
            score_column: "2023 JIF".to_string(),
            quartile_column: "JIF Quartile".to_string(),
        }
    }
}

/// SJR table layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SjrTableConfig {
    pub file: PathBuf,
    pub delimiter: char,
    /// Column holding comma-separated ISSNs.
    pub identifiers_column: String,
    pub score_column: String,
    pub quartile_column: String,
}

impl Default for SjrTableConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("sjr.csv"),
            delimiter: ';',
            identifiers_column: "Issn".to_string(),
            score_column: "SJR".to_string(),
            quartile_column: "SJR Best Quartile".to_string(),
        }
    }
}

/// Participant roster layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterTableConfig {
    pub file: PathBuf,
    pub delimiter: char,
    pub full_name_column: String,
    pub category_column: String,
    pub apa_column: String,
    pub abnt_column: String,
    pub custom_column: String,
}

impl Default for RosterTableConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("roster.csv"),
            delimiter: ',',
            full_name_column: "Nome Completo".to_string(),
            category_column: "Categoria".to_string(),
            apa_column: "APA".to_string(),
            abnt_column: "ABNT".to_string(),
            custom_column: "Custom".to_string(),
        }
    }
}

/// Scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory that relative table paths are resolved against.
    pub data_dir: PathBuf,
    pub qualis: QualityTableConfig,
    pub jcr: JcrTableConfig,
    pub sjr: SjrTableConfig,
    pub roster: RosterTableConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            qualis: QualityTableConfig::default(),
            jcr: JcrTableConfig::default(),
            sjr: SjrTableConfig::default(),
            roster: RosterTableConfig::default(),
        }
    }
}

impl Config {
    /// Load a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ScoreError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&text)
            .map_err(|e| ScoreError::Config(format!("invalid {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from `LATTES_SCORE_CONFIG` and `LATTES_SCORE_DATA_DIR`.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => Self::from_file(path)?,
            _ => Self::default(),
        };
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Override the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Check that every delimiter is a single ASCII byte.
    pub fn validate(&self) -> Result<()> {
        for (table, delimiter) in [
            ("qualis", self.qualis.delimiter),
            ("jcr", self.jcr.delimiter),
            ("sjr", self.sjr.delimiter),
            ("roster", self.roster.delimiter),
        ] {
            delimiter_byte(delimiter).map_err(|_| {
                ScoreError::Config(format!(
                    "{} delimiter must be a single ASCII character, got {:?}",
                    table, delimiter
                ))
            })?;
        }
        Ok(())
    }

    /// Resolve a table file against the data directory.
    pub fn table_path(&self, file: &Path) -> PathBuf {
        self.data_dir.join(file)
    }
}

/// Convert a configured delimiter to the byte the CSV reader expects.
pub fn delimiter_byte(delimiter: char) -> Result<u8> {
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(ScoreError::Config(format!("non-ASCII delimiter {:?}", delimiter)))
    }
}

/// `./data` when present, otherwise the platform data directory.
fn default_data_dir() -> PathBuf {
    let local = PathBuf::from("data");
    if local.is_dir() {
        return local;
    }
    dirs::data_dir()
        .map(|dir| dir.join("lattes-score"))
        .unwrap_or(local)
}
