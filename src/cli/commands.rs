use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use super::menu::{Menu, run_interactive, write_inspection, write_outcome, write_status};
use crate::convert::{
    ConvertOptions, HeaderMode, collect_input_files, discover_history_files, split_into_chunks,
    write_canonical,
};
use crate::models::{DurationPolicy, UnknownDuration};
use crate::progress::ProgressStore;
use crate::submit::{
    LastFmClient, PipelineConfig, Submitter, chunk_file_name, inspect_chunk, list_chunk_indices,
};
use crate::utils::Credentials;

#[derive(Parser)]
#[command(name = "scrobble-history")]
#[command(version)]
#[command(
    about = "Convert listening-history exports to CSV chunks and scrobble them to Last.fm",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Where chunk files and run state live
#[derive(Args, Debug, Clone)]
pub struct ChunkPaths {
    /// Directory holding part{i}.csv chunk files
    #[arg(long, default_value = "MusicCSV")]
    pub chunk_dir: PathBuf,

    /// Directory for the progress file and the problem/failed side files
    #[arg(long, default_value = ".")]
    pub state_dir: PathBuf,
}

impl ChunkPaths {
    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            chunk_dir: self.chunk_dir.clone(),
            state_dir: self.state_dir.clone(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert JSON history exports into one canonical "Artist", "Track" file
    Convert {
        /// Export files or directories; defaults to history files in the current directory
        inputs: Vec<PathBuf>,

        /// Canonical output file
        #[arg(short, long, default_value = "output.csv")]
        output: PathBuf,

        /// Minimum play duration in milliseconds for a play to count
        #[arg(long)]
        min_ms: u64,

        /// Keep plays whose duration is missing from the export
        #[arg(long)]
        include_unknown: bool,

        /// Write an "Artist", "Track" header line first
        #[arg(long)]
        header: bool,
    },

    /// Split a canonical file into part{i}.csv chunks
    Split {
        /// Canonical file to split
        #[arg(default_value = "output.csv")]
        input: PathBuf,

        /// Records per chunk file
        #[arg(short = 'n', long, default_value_t = 2500)]
        lines: usize,

        /// Directory to write chunk files into
        #[arg(short, long, default_value = "MusicCSV")]
        out_dir: PathBuf,

        /// Treat the first line of the input as a header
        #[arg(long)]
        has_header: bool,
    },

    /// Show which chunks have been scrobbled
    Status {
        #[command(flatten)]
        paths: ChunkPaths,
    },

    /// Check a chunk file for problems without scrobbling it
    Check {
        /// Chunk index, e.g. 3 for part3.csv
        index: u32,

        #[command(flatten)]
        paths: ChunkPaths,
    },

    /// Scrobble chunk files to Last.fm
    Scrobble {
        #[command(flatten)]
        paths: ChunkPaths,

        /// Process this chunk directly instead of showing the menu
        #[arg(long)]
        chunk: Option<u32>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Convert { inputs, output, min_ms, include_unknown, header }) => {
            let unknown =
                if *include_unknown { UnknownDuration::Include } else { UnknownDuration::Exclude };
            let mut options = ConvertOptions::new(DurationPolicy::new(*min_ms, unknown));
            options.header = *header;
            convert(inputs, output, &options)?;
        }
        Some(Commands::Split { input, lines, out_dir, has_header }) => {
            let mode = if *has_header { HeaderMode::FirstLine } else { HeaderMode::None };
            split(input, *lines, out_dir, mode)?;
        }
        Some(Commands::Status { paths }) => {
            show_status(paths)?;
        }
        Some(Commands::Check { index, paths }) => {
            check(*index, paths)?;
        }
        Some(Commands::Scrobble { paths, chunk }) => {
            scrobble(paths, *chunk)?;
        }
        None => {
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn convert(inputs: &[PathBuf], output: &Path, options: &ConvertOptions) -> Result<()> {
    let files = if inputs.is_empty() {
        discover_history_files(Path::new("."))?
    } else {
        collect_input_files(inputs)
    };
    if files.is_empty() {
        bail!("No history JSON files found");
    }

    let summary = write_canonical(&files, output, options)?;

    println!("Conversion Summary");
    println!("================================");
    println!("Files read: {}", summary.files_read);
    if summary.files_skipped > 0 {
        println!("Files skipped: {}", summary.files_skipped);
    }
    println!("Items seen: {}", summary.items_seen);
    println!("  Missing artist or track: {}", summary.not_extractable);
    println!("  Below duration threshold: {}", summary.filtered);
    println!("Records written: {}", summary.records);
    println!();
    println!("Output: {}", output.display());

    Ok(())
}

fn split(input: &Path, lines: usize, out_dir: &Path, mode: HeaderMode) -> Result<()> {
    let created = split_into_chunks(input, out_dir, lines, mode)?;
    if created == 0 {
        println!("No chunk files created");
    } else {
        println!("Created {} chunk files in {}", created, out_dir.display());
    }
    Ok(())
}

fn show_status(paths: &ChunkPaths) -> Result<()> {
    let available = list_chunk_indices(&paths.chunk_dir)?;
    let state = ProgressStore::in_dir(&paths.state_dir).load()?;
    write_status(&mut io::stdout().lock(), &available, &state)
}

fn check(index: u32, paths: &ChunkPaths) -> Result<()> {
    let config = paths.config();
    let Some(chunk) = inspect_chunk(&config, index)? else {
        bail!("File not found: {}", config.chunk_dir.join(chunk_file_name(index)).display());
    };
    write_inspection(&mut io::stdout().lock(), &chunk)
}

fn scrobble(paths: &ChunkPaths, chunk: Option<u32>) -> Result<()> {
    let config = paths.config();
    list_chunk_indices(&config.chunk_dir)?;

    let credentials = Credentials::from_env()?;
    let client = LastFmClient::connect(&credentials).context("Failed to connect to Last.fm")?;

    let store = ProgressStore::in_dir(&config.state_dir);
    let mut submitter = Submitter::new(client, config);
    let stdin = io::stdin();
    let mut menu = Menu::new(stdin.lock(), io::stdout());

    match chunk {
        Some(index) => {
            let outcome = submitter.process_chunk(index, &store, |preview| menu.confirm(preview))?;
            write_outcome(menu.output(), &outcome)?;
            menu.output().flush()?;
        }
        None => run_interactive(&mut submitter, &store, &mut menu)?,
    }

    Ok(())
}
