use clap::{Parser, Subcommand};
use redline_loc::analyzer::{AnalysisError, FileAnalyzer};
use redline_loc::config::{Config, ConfigError};
use redline_loc::source::{BlobStore, MemorySource, SourceError};
use redline_loc::worker::analyze_parallel;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Marks a version at which the file does not exist
const MISSING_VERSION: &str = "-";

/// Redline diffs and LOC counts across the versions of a file
#[derive(Parser)]
#[command(name = "redline-loc", version, about)]
struct Cli {
    /// Filter options, e.g. "-lang=c -countBraces -tabWidth=4"
    #[arg(long, global = true, allow_hyphen_values = true)]
    options: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compare version files given oldest first
    Diff {
        /// Name used to pick the language; defaults to the last version's path
        #[arg(long)]
        name: Option<String>,

        /// Version files; "-" marks a version where the file does not exist
        #[arg(required = true)]
        versions: Vec<String>,
    },
    /// Record the current content of files as new versions in the store
    Record {
        /// Files to record; a file that no longer exists is recorded as deleted
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Analyze files recorded in the store
    Report {
        /// Files to analyze; every tracked file when empty
        files: Vec<String>,

        #[arg(long, default_value_t = 4)]
        threads: usize,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not read {path:?}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} of the requested files could not be analyzed")]
    Incomplete(usize),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("redline_loc=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Using default configuration: {}", e);
        Config::default()
    });
    let analyzer = build_analyzer(&config, cli.options.as_deref())?;

    match cli.command {
        Command::Diff { name, versions } => diff(&analyzer, name, &versions),
        Command::Record { files } => record(&config, &files),
        Command::Report { files, threads } => report(&config, &analyzer, files, threads),
    }
}

fn build_analyzer(config: &Config, options: Option<&str>) -> Result<FileAnalyzer, CliError> {
    let analyzer = config.analyzer()?;
    Ok(match options {
        // Later options override earlier ones
        Some(options) => {
            let combined = format!("{} {}", analyzer.options(), options);
            analyzer.with_options(&combined)
        }
        None => analyzer,
    })
}

fn diff(analyzer: &FileAnalyzer, name: Option<String>, versions: &[String]) -> Result<(), CliError> {
    let name = name
        .or_else(|| {
            versions
                .iter()
                .rev()
                .find(|v| v.as_str() != MISSING_VERSION)
                .cloned()
        })
        .unwrap_or_else(|| "untitled".to_string());

    let mut source = MemorySource::new();
    for (index, version) in versions.iter().enumerate() {
        let content = if version == MISSING_VERSION {
            None
        } else {
            Some(fs::read(version).map_err(|source| CliError::Read {
                path: version.clone(),
                source,
            })?)
        };
        source.add_version(&name, &(index + 1).to_string(), content);
    }

    let result = analyzer.analyze(&source, &name)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn record(config: &Config, files: &[PathBuf]) -> Result<(), CliError> {
    let store = BlobStore::open(&config.data_dir())?;
    for path in files {
        let name = path.to_string_lossy();
        let version = if path.exists() {
            let content = fs::read(path).map_err(|source| CliError::Read {
                path: name.to_string(),
                source,
            })?;
            store.save(&name, &content)?
        } else {
            store.delete(&name)?
        };
        info!("Recorded {} as version {}", name, version);
    }
    Ok(())
}

fn report(
    config: &Config,
    analyzer: &FileAnalyzer,
    files: Vec<String>,
    threads: usize,
) -> Result<(), CliError> {
    let store = BlobStore::open(&config.data_dir())?;
    let files = if files.is_empty() { store.files()? } else { files };

    let mut results = Vec::new();
    let mut failures = 0;
    for result in analyze_parallel(analyzer, &store, &files, threads) {
        match result {
            Ok(result) => results.push(result),
            Err(_) => failures += 1,
        }
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    if failures > 0 {
        return Err(CliError::Incomplete(failures));
    }
    Ok(())
}
