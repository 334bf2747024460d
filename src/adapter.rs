//! Stage facade over a [`DataSource`] version table.
//!
//! Every stage checks the version against the catalog and resolves its recipe
//! before touching the filesystem, then reports its boundaries to the
//! optional progress sink.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use chrono::Local;

use crate::chem::{MdlReactionParser, ReactionBlockParser};
use crate::domain::{DataSourceId, Stage, VersionCatalog};
use crate::error::DataSourceError;
use crate::progress::{ProgressEvent, ProgressLevel, ProgressSink};
use crate::recipe::{
    FormatOptions, FormatReport, Recipe, output_file_name, run_downloads, run_extracts, run_format,
};
use crate::sources::{DataSource, data_source_for};
use crate::transfer::Transfer;

pub struct Adapter<T: Transfer> {
    source: Box<dyn DataSource>,
    transfer: T,
    sink: Option<Arc<dyn ProgressSink>>,
    parser: Arc<dyn ReactionBlockParser>,
    catalog: OnceLock<VersionCatalog>,
}

impl<T: Transfer> Adapter<T> {
    pub fn new(id: DataSourceId, transfer: T) -> Self {
        Self::from_source(data_source_for(id), transfer)
    }

    pub fn from_source(source: Box<dyn DataSource>, transfer: T) -> Self {
        Self {
            source,
            transfer,
            sink: None,
            parser: Arc::new(MdlReactionParser),
            catalog: OnceLock::new(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replaces the built-in MDL parser used for `$RXN` record files.
    pub fn with_reaction_parser(mut self, parser: Arc<dyn ReactionBlockParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn id(&self) -> DataSourceId {
        self.source.id()
    }

    /// The version catalog, discovered on first use and reused afterwards.
    pub fn supported_versions(&self) -> Result<VersionCatalog, DataSourceError> {
        if let Some(catalog) = self.catalog.get() {
            return Ok(catalog.clone());
        }
        let catalog = self.source.supported_versions(&self.transfer)?;
        Ok(self.catalog.get_or_init(|| catalog).clone())
    }

    pub fn download(&self, version: &str, output_dir: &Path) -> Result<Vec<PathBuf>, DataSourceError> {
        let recipe = self.recipe(version)?;
        self.stage(Stage::Download, version, || {
            run_downloads(&self.transfer, &recipe.downloads, output_dir)
        })
    }

    pub fn extract(
        &self,
        version: &str,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<(), DataSourceError> {
        let recipe = self.recipe(version)?;
        self.stage(Stage::Extract, version, || {
            run_extracts(&recipe.extracts, input_dir, output_dir)
        })
    }

    pub fn format(
        &self,
        version: &str,
        input_dir: &Path,
        output_dir: &Path,
        options: &FormatOptions,
    ) -> Result<FormatReport, DataSourceError> {
        let recipe = self.recipe(version)?;
        let report = self.stage(Stage::Format, version, || {
            let file_name = output_file_name(self.id().slug(), &recipe.output_label, &Local::now());
            run_format(
                &recipe.format,
                input_dir,
                &output_dir.join(file_name),
                options,
                self.parser.as_ref(),
            )
        })?;
        if report.skipped_records > 0 {
            self.emit(
                ProgressLevel::Warn,
                format!(
                    "{} records of the {} ({version}) could not be converted and were skipped.",
                    report.skipped_records,
                    self.id().label()
                ),
                None,
            );
        }
        Ok(report)
    }

    /// The recipe of a supported version; fails without touching the filesystem.
    pub fn recipe(&self, version: &str) -> Result<Recipe, DataSourceError> {
        let catalog = self.supported_versions().inspect_err(|err| {
            self.emit(ProgressLevel::Error, err.to_string(), None);
        })?;
        let recipe = catalog
            .contains(version)
            .then(|| self.source.recipe(version))
            .flatten();
        recipe.ok_or_else(|| {
            let err = DataSourceError::UnsupportedVersion {
                source_label: self.id().label().to_string(),
                version: version.to_string(),
            };
            self.emit(ProgressLevel::Error, err.to_string(), None);
            err
        })
    }

    fn stage<R>(
        &self,
        stage: Stage,
        version: &str,
        run: impl FnOnce() -> Result<R, DataSourceError>,
    ) -> Result<R, DataSourceError> {
        let label = self.id().label();
        let noun = stage.noun();
        self.emit(
            ProgressLevel::Info,
            format!("The {noun} of the data from the {label} ({version}) has been started."),
            None,
        );
        let start = Instant::now();
        match run() {
            Ok(value) => {
                self.emit(
                    ProgressLevel::Info,
                    format!("The {noun} of the data from the {label} ({version}) has been completed."),
                    Some(start.elapsed()),
                );
                Ok(value)
            }
            Err(err) => {
                self.emit(ProgressLevel::Error, err.to_string(), Some(start.elapsed()));
                Err(err)
            }
        }
    }

    fn emit(&self, level: ProgressLevel, message: String, elapsed: Option<Duration>) {
        if let Some(sink) = &self.sink {
            sink.event(ProgressEvent {
                source: self.id(),
                level,
                message,
                elapsed,
            });
        }
    }
}
