//! CCR Ingest - stream a CCR release as JSON lines

use anyhow::{Context, Result};
use ccr_common::logging::{init_logging, LogConfig, LogLevel};
use ccr_ingest::{CcrConfig, CcrLoader, SchemaVariant};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde_jsonlines::JsonLinesWriter;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ccr-ingest")]
#[command(author, version, about = "CCR annotation loader")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse the release files and write one JSON document per line
    Load {
        /// Directory holding the release files
        #[arg(short, long, env = "CCR_DATA_DIR")]
        data_dir: PathBuf,

        #[command(flatten)]
        release: ReleaseArgs,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop after this many documents
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Print the release and schema version
    Version {
        #[command(flatten)]
        release: ReleaseArgs,
    },
}

/// Release selection shared by all commands
#[derive(Args, Debug)]
struct ReleaseArgs {
    /// Release manifest (TOML)
    #[arg(short, long, env = "CCR_CONFIG")]
    config: Option<PathBuf>,

    /// Record schema: flat or nested
    #[arg(long)]
    schema: Option<SchemaVariant>,

    /// Key the record is stored under
    #[arg(long)]
    source_key: Option<String>,

    /// Lines between progress log events
    #[arg(long)]
    progress_interval: Option<u64>,

    /// Do not echo skipped lines at the end of each file
    #[arg(long)]
    no_echo_skipped: bool,
}

impl ReleaseArgs {
    /// Defaults, then manifest, then `CCR_*` environment, then flags.
    fn resolve(&self) -> Result<CcrConfig> {
        let config = match &self.config {
            Some(path) => CcrConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => CcrConfig::default(),
        };
        let mut config = config.merge_env()?;

        if let Some(schema) = self.schema {
            config.schema = schema;
        }
        if let Some(key) = &self.source_key {
            config.source_key = key.clone();
        }
        if let Some(interval) = self.progress_interval {
            config.progress_interval = interval;
        }
        if self.no_echo_skipped {
            config.echo_skipped_lines = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flag
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("ccr-ingest")
        .build()
        .merge_env()?;
    let _log_guard = init_logging(&log_config)?;

    match cli.command {
        Command::Load {
            data_dir,
            release,
            output,
            limit,
        } => {
            let loader = CcrLoader::new(release.resolve()?)?;
            load(&loader, &data_dir, output.as_deref(), limit)?;
        },
        Command::Version { release } => {
            let loader = CcrLoader::new(release.resolve()?)?;
            println!("{}", loader.version());
        },
    }

    Ok(())
}

fn load(
    loader: &CcrLoader,
    data_dir: &Path,
    output: Option<&Path>,
    limit: Option<u64>,
) -> Result<()> {
    info!("Loading CCR {} from {}", loader.version(), data_dir.display());
    let mut documents = loader.load_data(data_dir)?;

    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = JsonLinesWriter::new(BufWriter::new(sink));

    // No bar when documents go to stdout. The bar counts input lines.
    let pb = if output.is_some() {
        let expected = loader.config().files.iter().map(|f| f.expected_line_count).sum();
        let pb = ProgressBar::new(expected);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("#>-"),
        );
        pb.set_message("Reading CCR lines");
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut written = 0u64;

    while limit.is_none_or(|limit| written < limit) {
        let Some(doc) = documents.next() else {
            break;
        };
        writer.write(&doc?)?;
        written += 1;
        pb.set_position(documents.lines_read());
    }
    writer.flush()?;
    pb.set_position(documents.lines_read());
    pb.finish_with_message(format!("Wrote {written} documents"));

    for summary in documents.summaries() {
        info!(
            "{}: {} lines, {} documents, {} skipped",
            summary.file_name, summary.lines_read, summary.documents, summary.skipped
        );
    }
    info!("Ingestion complete: {} documents written", written);

    Ok(())
}
