//! Download, extract and format one version inside a staging directory.

use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use serde::Serialize;
use tracing::debug;

use crate::adapter::Adapter;
use crate::config::{ConfiguredRun, ResolvedConfig};
use crate::domain::{Category, DataSourceId};
use crate::error::DataSourceError;
use crate::progress::ProgressSink;
use crate::recipe::FormatOptions;
use crate::transfer::Transfer;

const STAGING_SUFFIX: &str = "temporary_output_directory";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub workers: usize,
    pub keep_staging: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            keep_staging: false,
        }
    }
}

/// Batch-wide settings given on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Overrides both the per-entry and the file-level worker count.
    pub workers: Option<usize>,
    pub keep_staging: bool,
}

impl BatchOptions {
    fn run_options(&self, config: &ResolvedConfig, entry: &ConfiguredRun) -> RunOptions {
        RunOptions {
            workers: self.workers.or(entry.workers).unwrap_or(config.workers).max(1),
            keep_staging: self.keep_staging,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub id: DataSourceId,
    pub version: String,
    pub output_dir: Utf8PathBuf,
    pub options: RunOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub category: Category,
    pub source: String,
    pub version: String,
    pub output_path: String,
    pub rows_written: usize,
    pub skipped_records: usize,
    /// Set when the staging directory was kept.
    pub staging_directory: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub runs: Vec<RunResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceList {
    pub category: Category,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionEntry {
    pub version: String,
    pub citation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionList {
    pub category: Category,
    pub source: String,
    pub versions: Vec<VersionEntry>,
}

#[derive(Clone)]
pub struct Pipeline<T: Transfer + Clone> {
    transfer: T,
}

impl<T: Transfer + Clone> Pipeline<T> {
    pub fn new(transfer: T) -> Self {
        Self { transfer }
    }

    pub fn list_sources(&self, category: Category) -> SourceList {
        SourceList {
            category,
            sources: DataSourceId::names_in(category)
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn list_versions(&self, category: Category, name: &str) -> Result<VersionList, DataSourceError> {
        let id = DataSourceId::resolve(category, name)?;
        let catalog = Adapter::new(id, self.transfer.clone()).supported_versions()?;
        Ok(VersionList {
            category,
            source: id.name().to_string(),
            versions: catalog
                .iter()
                .map(|(version, citation)| VersionEntry {
                    version: version.to_string(),
                    citation: citation.to_string(),
                })
                .collect(),
        })
    }

    pub fn run(
        &self,
        request: &RunRequest,
        sink: Option<Arc<dyn ProgressSink>>,
    ) -> Result<RunResult, DataSourceError> {
        let mut adapter = Adapter::new(request.id, self.transfer.clone());
        if let Some(sink) = sink {
            adapter = adapter.with_sink(sink);
        }

        let version = request.version.as_str();
        adapter.recipe(version)?;

        let output_dir = request.output_dir.as_std_path();
        fs::create_dir_all(output_dir)
            .map_err(|err| DataSourceError::Filesystem(format!("{}: {err}", request.output_dir)))?;
        let staging = staging_dir(&request.output_dir);
        fs::create_dir_all(staging.as_std_path())
            .map_err(|err| DataSourceError::Filesystem(format!("{staging}: {err}")))?;
        debug!(staging = %staging, "staging directory created");

        adapter.download(version, staging.as_std_path())?;
        adapter.extract(version, staging.as_std_path(), staging.as_std_path())?;
        let report = adapter.format(
            version,
            staging.as_std_path(),
            output_dir,
            &FormatOptions {
                workers: request.options.workers.max(1),
            },
        )?;

        let staging_directory = if request.options.keep_staging {
            Some(staging.to_string())
        } else {
            fs::remove_dir_all(staging.as_std_path())
                .map_err(|err| DataSourceError::Filesystem(format!("{staging}: {err}")))?;
            None
        };

        Ok(RunResult {
            category: request.id.category(),
            source: request.id.name().to_string(),
            version: request.version.clone(),
            output_path: report.output_path.display().to_string(),
            rows_written: report.rows_written,
            skipped_records: report.skipped_records,
            staging_directory,
        })
    }

    /// Runs every configured entry in order; the first failure ends the batch.
    pub fn run_batch(
        &self,
        config: &ResolvedConfig,
        options: BatchOptions,
        sink: Option<Arc<dyn ProgressSink>>,
    ) -> Result<BatchResult, DataSourceError> {
        let mut runs = Vec::with_capacity(config.runs.len());
        for entry in &config.runs {
            let request = RunRequest {
                id: entry.id,
                version: entry.version.clone(),
                output_dir: config.output_directory.clone(),
                options: options.run_options(config, entry),
            };
            runs.push(self.run(&request, sink.clone())?);
        }
        Ok(BatchResult { runs })
    }
}

/// `{output}/{YYYYMMDDHHMMSS}_temporary_output_directory`
pub fn staging_dir(output_dir: &Utf8Path) -> Utf8PathBuf {
    output_dir.join(format!("{}_{STAGING_SUFFIX}", Local::now().format("%Y%m%d%H%M%S")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_dir_is_timestamped_under_output() {
        let staging = staging_dir(Utf8Path::new("data"));
        assert_eq!(staging.parent(), Some(Utf8Path::new("data")));
        let name = staging.file_name().unwrap();
        let (timestamp, suffix) = name.split_once('_').unwrap();
        assert_eq!(timestamp.len(), 14);
        assert!(timestamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(suffix, STAGING_SUFFIX);
    }

    fn config_with(entry_workers: Option<usize>) -> (ResolvedConfig, ConfiguredRun) {
        let entry = ConfiguredRun {
            id: DataSourceId::OrdReaction,
            version: "v_release_main".to_string(),
            workers: entry_workers,
        };
        let config = ResolvedConfig {
            schema_version: 1,
            output_directory: Utf8PathBuf::from("."),
            workers: 2,
            timeout_secs: None,
            runs: vec![entry.clone()],
        };
        (config, entry)
    }

    #[test]
    fn command_line_workers_win_over_entry_and_file() {
        let (config, entry) = config_with(Some(8));
        let options = BatchOptions {
            workers: Some(3),
            keep_staging: true,
        };
        assert_eq!(
            options.run_options(&config, &entry),
            RunOptions {
                workers: 3,
                keep_staging: true
            }
        );
        assert_eq!(BatchOptions::default().run_options(&config, &entry).workers, 8);

        let (config, entry) = config_with(None);
        assert_eq!(BatchOptions::default().run_options(&config, &entry).workers, 2);
    }

    #[test]
    fn sources_are_listed_per_category() {
        let pipeline = Pipeline::new(
            crate::transfer::HttpTransfer::new(crate::transfer::TransferSettings::default()).unwrap(),
        );
        assert_eq!(
            pipeline.list_sources(Category::ReactionRule).sources,
            vec!["miscellaneous", "retro_rules"]
        );
    }
}
