use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{Category, DataSourceId};
use crate::error::DataSourceError;

pub const CONFIG_FILE_NAME: &str = "chem-ds.json";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub output_directory: Option<String>,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub runs: Vec<RunEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RunEntry {
    /// `category:source:version`
    Shorthand(String),
    Detailed(RunEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RunEntryObject {
    pub category: String,
    pub source: String,
    pub version: String,
    #[serde(default)]
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredRun {
    pub id: DataSourceId,
    pub version: String,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub output_directory: Utf8PathBuf,
    pub workers: usize,
    pub timeout_secs: Option<u64>,
    pub runs: Vec<ConfiguredRun>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, DataSourceError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE_NAME),
        };

        if path.is_none() && !config_path.exists() {
            return Err(DataSourceError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| DataSourceError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| DataSourceError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, DataSourceError> {
        let runs = config
            .runs
            .into_iter()
            .map(|entry| match entry {
                RunEntry::Shorthand(value) => parse_shorthand(&value),
                RunEntry::Detailed(obj) => Ok(ConfiguredRun {
                    id: DataSourceId::resolve(obj.category.parse()?, &obj.source)?,
                    version: non_empty_version(&obj.version, &obj.version)?,
                    workers: obj.workers,
                }),
            })
            .collect::<Result<Vec<_>, DataSourceError>>()?;

        Ok(ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            output_directory: Utf8PathBuf::from(config.output_directory.unwrap_or_else(|| ".".to_string())),
            workers: config.workers.unwrap_or(1).max(1),
            timeout_secs: config.timeout_secs,
            runs,
        })
    }
}

fn parse_shorthand(value: &str) -> Result<ConfiguredRun, DataSourceError> {
    let mut parts = value.splitn(3, ':');
    let (Some(category), Some(source), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(DataSourceError::InvalidRunEntry(format!(
            "'{value}' (expected category:source:version)"
        )));
    };
    let category: Category = category.parse()?;
    Ok(ConfiguredRun {
        id: DataSourceId::resolve(category, source)?,
        version: non_empty_version(version, value)?,
        workers: None,
    })
}

fn non_empty_version(version: &str, entry: &str) -> Result<String, DataSourceError> {
    let version = version.trim();
    if version.is_empty() {
        return Err(DataSourceError::InvalidRunEntry(format!("'{entry}' has no version")));
    }
    Ok(version.to_string())
}
