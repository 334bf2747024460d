use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use chem_data_source::config::ConfigLoader;
use chem_data_source::domain::{Category, DataSourceId};
use chem_data_source::error::DataSourceError;
use chem_data_source::output::{JsonOutput, OutputMode, PlainOutput};
use chem_data_source::pipeline::{BatchOptions, Pipeline, RunOptions, RunRequest};
use chem_data_source::progress::{ProgressSink, TracingSink};
use chem_data_source::transfer::{HttpTransfer, TransferSettings};

#[derive(Parser)]
#[command(name = "chem-ds")]
#[command(about = "Download, extract and format chemical compound, reaction and reaction rule datasets")]
#[command(version, author)]
struct Cli {
    /// Print results as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List the data sources of a category")]
    Sources(SourcesArgs),
    #[command(about = "List the supported versions of a data source")]
    Versions(SourceArgs),
    #[command(about = "Download, extract and format one version")]
    Run(RunArgs),
    #[command(about = "Run every entry of chem-ds.json")]
    Batch(BatchArgs),
}

#[derive(Args)]
struct SourcesArgs {
    #[arg(long, value_enum)]
    category: Category,
}

#[derive(Args)]
struct SourceArgs {
    #[arg(long, value_enum)]
    category: Category,

    #[arg(long)]
    source: String,

    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[arg(long)]
    version_id: String,

    #[arg(long)]
    output_dir: Utf8PathBuf,

    #[arg(long, default_value_t = 1)]
    workers: usize,

    #[arg(long)]
    keep_staging: bool,
}

#[derive(Args)]
struct BatchArgs {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    output_dir: Option<Utf8PathBuf>,

    /// Worker count for every run, overriding the config file.
    #[arg(long)]
    workers: Option<usize>,

    #[arg(long)]
    keep_staging: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<DataSourceError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &DataSourceError) -> u8 {
    match error {
        DataSourceError::UnsupportedVersion { .. }
        | DataSourceError::UnknownDataSource { .. }
        | DataSourceError::InvalidCategory(_)
        | DataSourceError::InvalidRunEntry(_)
        | DataSourceError::MissingConfig => 2,
        DataSourceError::Http(_)
        | DataSourceError::HttpStatus { .. }
        | DataSourceError::Resolution(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Plain
    };

    match cli.command {
        Commands::Sources(args) => {
            let pipeline = pipeline(None)?;
            let result = pipeline.list_sources(args.category);
            match output_mode {
                OutputMode::Json => JsonOutput::print_sources(&result),
                OutputMode::Plain => PlainOutput::print_sources(&result),
            }
            .into_diagnostic()
        }
        Commands::Versions(args) => {
            let pipeline = pipeline(args.timeout_secs)?;
            let result = pipeline.list_versions(args.category, &args.source)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_versions(&result),
                OutputMode::Plain => PlainOutput::print_versions(&result),
            }
            .into_diagnostic()
        }
        Commands::Run(args) => run_single(args, output_mode),
        Commands::Batch(args) => run_batch(args, output_mode),
    }
}

fn pipeline(timeout_secs: Option<u64>) -> miette::Result<Pipeline<HttpTransfer>> {
    let transfer = HttpTransfer::new(TransferSettings {
        timeout: timeout_secs.map(Duration::from_secs),
    })?;
    Ok(Pipeline::new(transfer))
}

fn run_single(args: RunArgs, output_mode: OutputMode) -> miette::Result<()> {
    let id = DataSourceId::resolve(args.source.category, &args.source.source)?;
    let request = RunRequest {
        id,
        version: args.version_id,
        output_dir: args.output_dir,
        options: RunOptions {
            workers: args.workers,
            keep_staging: args.keep_staging,
        },
    };
    let sink: Arc<dyn ProgressSink> = Arc::new(TracingSink);
    let result = pipeline(args.source.timeout_secs)?.run(&request, Some(sink))?;
    match output_mode {
        OutputMode::Json => JsonOutput::print_run(&result),
        OutputMode::Plain => PlainOutput::print_run(&result),
    }
    .into_diagnostic()
}

fn run_batch(args: BatchArgs, output_mode: OutputMode) -> miette::Result<()> {
    let mut config = ConfigLoader::resolve(args.config.as_deref())?;
    if let Some(output_dir) = args.output_dir {
        config.output_directory = output_dir;
    }
    let options = BatchOptions {
        workers: args.workers,
        keep_staging: args.keep_staging,
    };
    let sink: Arc<dyn ProgressSink> = Arc::new(TracingSink);
    let result = pipeline(config.timeout_secs)?.run_batch(&config, options, Some(sink))?;
    match output_mode {
        OutputMode::Json => JsonOutput::print_batch(&result),
        OutputMode::Plain => PlainOutput::print_batch(&result),
    }
    .into_diagnostic()
}
