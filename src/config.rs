use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::names::{AliasTable, Score, Substitution, DEFAULT_LOCALE, DEFAULT_THRESHOLD};

const BUILTIN_CONFIG: &str = include_str!("../config/default.toml");

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub geocoder: GeocoderConfig,
    pub matching: MatchingConfig,
    pub reference: ReferenceConfig,
    /// Raw source name -> geocoder query overrides
    #[serde(default)]
    pub aliases: Vec<Substitution>,
    /// String fixes applied, in order, to every localized name
    #[serde(default)]
    pub normalizations: Vec<Substitution>,
    /// Files fetched by `resolve --download`
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocoderConfig {
    pub endpoint: String,
    pub country_codes: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    pub user_agent: String,
    /// No timeout when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub request_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    #[serde(default = "default_threshold")]
    pub threshold: Score,
    /// Boundary feature property holding the raw municipality name
    pub source_name_field: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReferenceConfig {
    /// Field (after renaming) used as the table key
    pub name_field: String,
    /// Source column header -> field name; unlisted columns are dropped
    pub columns: BTreeMap<String, String>,
    #[serde(default)]
    pub missing_values: Vec<String>,
    /// Fields whose missing values read as 0 instead of null
    #[serde(default)]
    pub zero_fill: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub url: String,
    pub path: PathBuf,
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

fn default_threshold() -> Score {
    DEFAULT_THRESHOLD
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Configuration shipped with the crate
    pub fn builtin() -> Result<Self> {
        toml::from_str(BUILTIN_CONFIG).context("Failed to parse built-in config")
    }

    pub fn alias_table(&self) -> AliasTable {
        AliasTable::new(&self.aliases, &self.normalizations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_config() {
        let config = Config::builtin().unwrap();
        assert_eq!(config.matching.threshold, 70);
        assert_eq!(config.matching.source_name_field, "shapeName");
        assert_eq!(config.geocoder.locale, "he");
        assert_eq!(config.geocoder.country_codes, "il");
        assert!(config.reference.columns.values().any(|f| f == &config.reference.name_field));

        let aliases = config.alias_table();
        assert_eq!(aliases.query_for("Sachnin"), "Sakhnin");
        assert_eq!(aliases.query_for("Arara BaNegev"), "Ar'arat an-Naqab");
        assert_eq!(aliases.normalize(&aliases.query_for("Maghar").to_string()), "מגאר");
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config: Config = toml::from_str(
            r#"
            [geocoder]
            endpoint = "https://nominatim.example.org/search"
            country_codes = "il"
            user_agent = "test"

            [matching]
            source_name_field = "name"

            [reference]
            name_field = "name"
            columns = { "Name" = "name" }
            "#,
        )
        .unwrap();

        assert_eq!(config.matching.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.geocoder.locale, DEFAULT_LOCALE);
        assert_eq!(config.geocoder.timeout_secs, None);
        assert!(config.aliases.is_empty());
        assert!(config.sources.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("munijoin.toml");
        fs::write(&path, BUILTIN_CONFIG).unwrap();
        let config = Config::load_from_file(&path).unwrap();
        assert!(!config.aliases.is_empty());

        assert!(Config::load_from_file(dir.path().join("missing.toml")).is_err());
    }
}
