use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum DataSourceError {
    #[error("The {source_label} version '{version}' is not supported.")]
    #[diagnostic(help("run `chem-ds versions` to list the supported versions"))]
    UnsupportedVersion {
        source_label: String,
        version: String,
    },

    #[error("unknown data source '{name}' in category '{category}'")]
    #[diagnostic(help("run `chem-ds sources --category {category}` to list the data sources"))]
    UnknownDataSource { category: String, name: String },

    #[error("invalid data source category: {0}")]
    InvalidCategory(String),

    #[error("invalid run entry: {0}")]
    InvalidRunEntry(String),

    #[error("missing config file chem-ds.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("remote host returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("{0}")]
    Resolution(String),

    #[error("archive member '{member}' not found in {archive}")]
    MissingArchiveMember { archive: PathBuf, member: String },

    #[error("archive error: {0}")]
    Archive(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("pickle error: {0}")]
    Pickle(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("protobuf error: {0}")]
    Protobuf(String),

    #[error("worker pool error: {0}")]
    WorkerPool(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
