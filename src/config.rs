use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::Provider;
use crate::error::PhytoError;
use crate::table::TableColumns;
use crate::workspace::default_output_root;
use crate::{imppat, pubchem};

pub const DEFAULT_CONFIG_FILE: &str = "phytofetch.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub imppat_base_url: Option<String>,
    #[serde(default)]
    pub pubchem_base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub default_provider: Option<Provider>,
    #[serde(default)]
    pub name_column: Option<String>,
    #[serde(default)]
    pub identifier_column: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub imppat_base_url: String,
    pub pubchem_base_url: String,
    pub timeout: Duration,
    pub output_dir: Utf8PathBuf,
    pub default_provider: Provider,
    pub columns: TableColumns,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `./phytofetch.json` when no path is given. Only an
    /// explicitly requested file has to exist.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, PhytoError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| PhytoError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| PhytoError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, PhytoError> {
        let timeout_secs = config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(PhytoError::ConfigParse(
                "timeout_secs must be positive".to_string(),
            ));
        }

        let defaults = TableColumns::default();
        let columns = TableColumns {
            name: non_blank(config.name_column).unwrap_or(defaults.name),
            identifier: non_blank(config.identifier_column).unwrap_or(defaults.identifier),
        };

        Ok(ResolvedConfig {
            imppat_base_url: non_blank(config.imppat_base_url)
                .unwrap_or_else(|| imppat::DEFAULT_BASE_URL.to_string()),
            pubchem_base_url: non_blank(config.pubchem_base_url)
                .unwrap_or_else(|| pubchem::DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            output_dir: non_blank(config.output_dir)
                .map(Utf8PathBuf::from)
                .unwrap_or_else(default_output_root),
            default_provider: config.default_provider.unwrap_or(Provider::Imppat),
            columns,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
