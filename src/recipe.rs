//! Declarative version recipes and the drivers that run them.
//!
//! A data source maps each version to a [`Recipe`]. Paths inside a recipe
//! are relative to the stage's input or output directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::debug;

use crate::archive::{
    TarCompression, extract_sevenz_all, extract_tar_member, extract_zip_all, extract_zip_member,
    extract_zip_prefix, gunzip_file,
};
use crate::chem::ReactionBlockParser;
use crate::error::DataSourceError;
use crate::formats::{cml, ord, pickle, rxn_file};
use crate::fs_util::file_name_of;
use crate::table::{ReadOptions, Table};
use crate::transfer::{Transfer, resolve_box_shared_folder};

pub const PROVENANCE_COLUMN: &str = "file_name";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlSource {
    Static(String),
    /// Shared Box folder whose download URL is resolved at download time.
    BoxSharedFolder {
        folder_id: &'static str,
        vanity_name: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetch {
    pub source: UrlSource,
    pub file_name: String,
}

impl Fetch {
    pub fn url(url: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            source: UrlSource::Static(url.into()),
            file_name: file_name.into(),
        }
    }

    /// A URL whose last path segment is the file name.
    pub fn named(url: impl Into<String>) -> Self {
        let url = url.into();
        let file_name = url.rsplit('/').next().unwrap_or_default().to_string();
        Self::url(url, file_name)
    }

    pub fn box_folder(
        folder_id: &'static str,
        vanity_name: &'static str,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            source: UrlSource::BoxSharedFolder {
                folder_id,
                vanity_name,
            },
            file_name: file_name.into(),
        }
    }
}

/// Directory an extract step reads its archive from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepInput {
    Downloads,
    /// The output of an earlier step in the same recipe.
    Extracted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractStep {
    Gunzip {
        from: StepInput,
        archive: String,
        output: String,
    },
    ZipAll {
        archive: String,
    },
    ZipMember {
        archive: String,
        member: String,
        output: String,
    },
    ZipPrefix {
        archive: String,
        prefix: String,
    },
    TarMember {
        archive: String,
        compression: TarCompression,
        member: String,
        output: String,
    },
    SevenZipAll {
        archive: String,
    },
}

impl ExtractStep {
    pub fn gunzip(archive: impl Into<String>, output: impl Into<String>) -> Self {
        Self::Gunzip {
            from: StepInput::Downloads,
            archive: archive.into(),
            output: output.into(),
        }
    }

    /// Gunzips a file that an earlier zip step wrote to the output directory.
    pub fn gunzip_extracted(archive: impl Into<String>, output: impl Into<String>) -> Self {
        Self::Gunzip {
            from: StepInput::Extracted,
            archive: archive.into(),
            output: output.into(),
        }
    }

    /// A zip member written to the output directory under its own file name.
    pub fn zip_member(archive: impl Into<String>, member: impl Into<String>) -> Self {
        let member = member.into();
        let output = member.rsplit('/').next().unwrap_or_default().to_string();
        Self::ZipMember {
            archive: archive.into(),
            member,
            output,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInput {
    pub file: String,
    pub options: ReadOptions,
}

impl TableInput {
    pub fn new(file: impl Into<String>, options: ReadOptions) -> Self {
        Self {
            file: file.into(),
            options,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostStep {
    DropEmptyRows,
    IntegerColumn(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSpec {
    /// Delimited inputs, concatenated. With `provenance` set, each row
    /// carries the name of the file it came from in that column.
    Tables {
        inputs: Vec<TableInput>,
        provenance: Option<&'static str>,
        rename: Vec<(&'static str, &'static str)>,
        post: Vec<PostStep>,
    },
    /// `{prefix}_{left}` and `{prefix}_{right}` line files joined column-wise
    /// for every prefix, tagged with the prefix.
    PairedColumns {
        prefixes: Vec<&'static str>,
        left: &'static str,
        right: &'static str,
        prefix_column: &'static str,
    },
    ParquetFiles {
        files: Vec<String>,
        provenance: Option<&'static str>,
    },
    ReactionBlocks {
        files: Vec<String>,
        provenance: Option<&'static str>,
    },
    OrdDatasets {
        root: String,
    },
    UsptoCml {
        roots: Vec<String>,
    },
    /// Back-to-back pickled `(reaction_smiles, patent_number, class_id)`
    /// tuples and a dictionary from class id to class name.
    PickledReactions {
        streams: Vec<String>,
        class_names: String,
    },
}

impl FormatSpec {
    /// One delimited file written back as is.
    pub fn passthrough(file: impl Into<String>, options: ReadOptions) -> Self {
        Self::Tables {
            inputs: vec![TableInput::new(file, options)],
            provenance: None,
            rename: Vec::new(),
            post: Vec::new(),
        }
    }

    /// Several files read with the same options and tagged with `file_name`.
    pub fn tagged<S: Into<String>>(
        files: impl IntoIterator<Item = S>,
        options: ReadOptions,
        rename: Vec<(&'static str, &'static str)>,
    ) -> Self {
        Self::Tables {
            inputs: files
                .into_iter()
                .map(|file| TableInput::new(file, options))
                .collect(),
            provenance: Some(PROVENANCE_COLUMN),
            rename,
            post: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub downloads: Vec<Fetch>,
    pub extracts: Vec<ExtractStep>,
    pub format: FormatSpec,
    /// Version part of the output file name.
    pub output_label: String,
}

impl Recipe {
    pub fn new(output_label: impl Into<String>, downloads: Vec<Fetch>, format: FormatSpec) -> Self {
        Self {
            downloads,
            extracts: Vec::new(),
            format,
            output_label: output_label.into(),
        }
    }

    pub fn with_extracts(mut self, extracts: Vec<ExtractStep>) -> Self {
        self.extracts = extracts;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub workers: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatReport {
    pub output_path: PathBuf,
    pub rows_written: usize,
    pub skipped_records: usize,
}

/// `{YYYYMMDDHHMMSS}_{slug}_{label}.csv`
pub fn output_file_name(slug: &str, label: &str, timestamp: &DateTime<Local>) -> String {
    format!("{}_{slug}_{label}.csv", timestamp.format("%Y%m%d%H%M%S"))
}

pub fn run_downloads(
    transfer: &dyn Transfer,
    fetches: &[Fetch],
    output_dir: &Path,
) -> Result<Vec<PathBuf>, DataSourceError> {
    let mut written = Vec::with_capacity(fetches.len());
    for fetch in fetches {
        let url = match &fetch.source {
            UrlSource::Static(url) => url.clone(),
            UrlSource::BoxSharedFolder {
                folder_id,
                vanity_name,
            } => resolve_box_shared_folder(transfer, folder_id, vanity_name)?,
        };
        debug!(url = %url, file = %fetch.file_name, "downloading");
        written.push(transfer.download_file(&url, &fetch.file_name, output_dir)?);
    }
    Ok(written)
}

pub fn run_extracts(
    steps: &[ExtractStep],
    input_dir: &Path,
    output_dir: &Path,
) -> Result<(), DataSourceError> {
    for step in steps {
        debug!(?step, "extracting");
        match step {
            ExtractStep::Gunzip {
                from,
                archive,
                output,
            } => {
                let source_dir = match from {
                    StepInput::Downloads => input_dir,
                    StepInput::Extracted => output_dir,
                };
                gunzip_file(&source_dir.join(archive), &output_dir.join(output))?;
            }
            ExtractStep::ZipAll { archive } => {
                extract_zip_all(&input_dir.join(archive), output_dir)?;
            }
            ExtractStep::ZipMember {
                archive,
                member,
                output,
            } => {
                extract_zip_member(&input_dir.join(archive), member, &output_dir.join(output))?;
            }
            ExtractStep::ZipPrefix { archive, prefix } => {
                extract_zip_prefix(&input_dir.join(archive), prefix, output_dir)?;
            }
            ExtractStep::TarMember {
                archive,
                compression,
                member,
                output,
            } => {
                extract_tar_member(
                    &input_dir.join(archive),
                    *compression,
                    member,
                    &output_dir.join(output),
                )?;
            }
            ExtractStep::SevenZipAll { archive } => {
                extract_sevenz_all(&input_dir.join(archive), output_dir)?;
            }
        }
    }
    Ok(())
}

/// Builds the table a format spec describes and writes it to `output_path`.
pub fn run_format(
    spec: &FormatSpec,
    input_dir: &Path,
    output_path: &Path,
    options: &FormatOptions,
    parser: &dyn ReactionBlockParser,
) -> Result<FormatReport, DataSourceError> {
    let (table, skipped_records) = build_table(spec, input_dir, options, parser)?;
    table.write_csv(output_path)?;
    Ok(FormatReport {
        output_path: output_path.to_path_buf(),
        rows_written: table.len(),
        skipped_records,
    })
}

fn build_table(
    spec: &FormatSpec,
    input_dir: &Path,
    options: &FormatOptions,
    parser: &dyn ReactionBlockParser,
) -> Result<(Table, usize), DataSourceError> {
    match spec {
        FormatSpec::Tables {
            inputs,
            provenance,
            rename,
            post,
        } => {
            let mut tables = Vec::with_capacity(inputs.len());
            for input in inputs {
                let table = Table::read_delimited(&input_dir.join(&input.file), &input.options)?;
                tables.push(tag(table, *provenance, &input.file));
            }
            let mut table = Table::concat(tables).rename(rename);
            for step in post {
                table = match step {
                    PostStep::DropEmptyRows => table.drop_empty_rows(),
                    PostStep::IntegerColumn(column) => table.normalize_integer_column(column)?,
                };
            }
            Ok((table, 0))
        }
        FormatSpec::PairedColumns {
            prefixes,
            left,
            right,
            prefix_column,
        } => {
            let options = ReadOptions::csv().no_header();
            let mut tables = Vec::with_capacity(prefixes.len());
            for prefix in prefixes {
                let read = |suffix: &str| {
                    Table::read_delimited(&input_dir.join(format!("{prefix}_{suffix}")), &options)
                };
                let joined = Table::side_by_side(vec![(*left, read(*left)?), (*right, read(*right)?)])?;
                tables.push(joined.with_constant_column(prefix_column, prefix));
            }
            Ok((Table::concat(tables), 0))
        }
        FormatSpec::ParquetFiles { files, provenance } => {
            let mut tables = Vec::with_capacity(files.len());
            for file in files {
                tables.push(tag(Table::read_parquet(&input_dir.join(file))?, *provenance, file));
            }
            Ok((Table::concat(tables), 0))
        }
        FormatSpec::ReactionBlocks { files, provenance } => {
            let mut columns = vec!["reaction_smiles"];
            columns.extend(provenance.iter().copied());
            let mut table = Table::new(columns);
            let mut skipped = 0;
            for file in files {
                let parsed = rxn_file::parse_file(&input_dir.join(file), parser)?;
                skipped += parsed.skipped;
                for smiles in parsed.reactions {
                    let mut row = vec![smiles];
                    if provenance.is_some() {
                        row.push(file_name_of(Path::new(file)));
                    }
                    table.push_row(row);
                }
            }
            Ok((table, skipped))
        }
        FormatSpec::OrdDatasets { root } => ord::read_datasets(&input_dir.join(root), options.workers),
        FormatSpec::UsptoCml { roots } => {
            let roots: Vec<PathBuf> = roots.iter().map(|root| input_dir.join(root)).collect();
            Ok((cml::read_roots(&roots, options.workers)?, 0))
        }
        FormatSpec::PickledReactions {
            streams,
            class_names,
        } => pickled_reactions(input_dir, streams, class_names),
    }
}

fn tag(table: Table, provenance: Option<&str>, file: &str) -> Table {
    match provenance {
        Some(column) => table.with_constant_column(column, &file_name_of(Path::new(file))),
        None => table,
    }
}

fn pickled_reactions(
    input_dir: &Path,
    streams: &[String],
    class_names: &str,
) -> Result<(Table, usize), DataSourceError> {
    let names = pickle::read_string_map(&input_dir.join(class_names))?;
    let mut table = Table::new([
        "reaction_smiles",
        "patent_number",
        "reaction_class_id",
        "reaction_class_name",
        PROVENANCE_COLUMN,
    ]);
    let mut skipped = 0;
    for stream in streams {
        let file_name = file_name_of(Path::new(stream));
        for value in pickle::read_stream_file(&input_dir.join(stream))? {
            let Some(mut fields) = pickle::record_fields(&value).filter(|fields| fields.len() >= 3) else {
                skipped += 1;
                continue;
            };
            fields.truncate(3);
            let class_name = names.get(&fields[2]).cloned().unwrap_or_default();
            fields.push(class_name);
            fields.push(file_name.clone());
            table.push_row(fields);
        }
    }
    Ok((table, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::MdlReactionParser;
    use chrono::TimeZone;
    use std::fs;

    #[test]
    fn output_file_name_uses_second_resolution() {
        let timestamp = Local.with_ymd_and_hms(2024, 3, 13, 9, 5, 7).unwrap();
        assert_eq!(
            output_file_name("uspto", "v_50k_by_20240313_chen_s_et_al", &timestamp),
            "20240313090507_uspto_v_50k_by_20240313_chen_s_et_al.csv"
        );
    }

    #[test]
    fn tables_are_tagged_renamed_and_concatenated() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "CC>>C\nO>>O\n").unwrap();
        fs::write(dir.path().join("b.txt"), "N>>N\n").unwrap();
        let spec = FormatSpec::tagged(
            ["a.txt", "b.txt"],
            ReadOptions::csv().no_header(),
            vec![("0", "reaction_smiles")],
        );
        let output = dir.path().join("out.csv");
        let report = run_format(&spec, dir.path(), &output, &FormatOptions::default(), &MdlReactionParser)
            .unwrap();
        assert_eq!(report.rows_written, 3);
        assert_eq!(report.skipped_records, 0);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "reaction_smiles,file_name\nCC>>C,a.txt\nO>>O,a.txt\nN>>N,b.txt\n"
        );
    }

    #[test]
    fn paired_columns_join_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        for (prefix, target, source) in [("train", "CCO", "<RX_1> CC"), ("test", "O", "<RX_2> [H][H]")] {
            fs::write(dir.path().join(format!("{prefix}_targets")), format!("{target}\n")).unwrap();
            fs::write(dir.path().join(format!("{prefix}_sources")), format!("{source}\n")).unwrap();
        }
        let spec = FormatSpec::PairedColumns {
            prefixes: vec!["train", "test"],
            left: "targets",
            right: "sources",
            prefix_column: "file_name_prefix",
        };
        let output = dir.path().join("out.csv");
        run_format(&spec, dir.path(), &output, &FormatOptions::default(), &MdlReactionParser).unwrap();
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "targets,sources,file_name_prefix\nCCO,<RX_1> CC,train\nO,<RX_2> [H][H],test\n"
        );
    }

    #[test]
    fn post_steps_clean_rows() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rules.txt"), "ID\tRule\n1.0\t[C:1]>>[C:1]\n\t\n2\tX\n").unwrap();
        let spec = FormatSpec::Tables {
            inputs: vec![TableInput::new("rules.txt", ReadOptions::tsv())],
            provenance: None,
            rename: Vec::new(),
            post: vec![PostStep::DropEmptyRows, PostStep::IntegerColumn("ID")],
        };
        let output = dir.path().join("out.csv");
        let report =
            run_format(&spec, dir.path(), &output, &FormatOptions::default(), &MdlReactionParser).unwrap();
        assert_eq!(report.rows_written, 2);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "ID,Rule\n1,[C:1]>>[C:1]\n2,X\n"
        );
    }

    #[test]
    fn missing_input_is_an_error_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let spec = FormatSpec::passthrough("absent.csv", ReadOptions::csv());
        let output = dir.path().join("out.csv");
        assert!(run_format(&spec, dir.path(), &output, &FormatOptions::default(), &MdlReactionParser).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn fetch_named_uses_last_segment() {
        let fetch = Fetch::named("https://zenodo.org/records/6618262/files/b97d3.csv");
        assert_eq!(fetch.file_name, "b97d3.csv");
        let step = ExtractStep::zip_member("data.zip", "data/train.txt");
        assert_matches::assert_matches!(step, ExtractStep::ZipMember { output, .. } if output == "train.txt");
    }
}
