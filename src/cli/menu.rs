//! Operator interaction for a scrobble run
//!
//! Input and output are injected so the whole flow can be driven from tests. An answer that
//! cannot be read (end of input) always counts as declining.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::progress::{ProgressState, ProgressStore};
use crate::submit::{
    ChunkOutcome, ChunkPreview, ChunkReport, Clock, LoadedChunk, Pacer, Scrobbler, Submitter,
    chunk_file_name, inspect_chunk, list_chunk_indices,
};
use crate::utils::song_label;

/// Songs listed when inspecting a chunk
pub const INSPECT_LISTING: usize = 10;

const RULE: &str = "==================================================";
const THIN_RULE: &str = "--------------------------------------------------";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ProcessNext,
    ProcessChunk(u32),
    Inspect(u32),
    Exit,
}

/// Prompts over a line-based input and a writer
pub struct Menu<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Print `prompt` and read one trimmed line; `None` at end of input
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).context("Failed to read operator input")?;
        if read == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Show the preview and ask to proceed; only `yes` (any case) proceeds
    pub fn confirm(&mut self, preview: &ChunkPreview) -> Result<bool> {
        write_preview(&mut self.output, preview)?;
        let answer = self.ask("Do you want to proceed? (yes/no): ")?;
        Ok(answer.is_some_and(|a| a.eq_ignore_ascii_case("yes")))
    }

    /// Offer the main menu; an invalid answer exits
    pub fn choose(&mut self, available: &[u32], next: u32) -> Result<MenuChoice> {
        writeln!(self.output, "Next file to process: {}", chunk_file_name(next))?;
        writeln!(self.output)?;
        writeln!(self.output, "Options:")?;
        writeln!(self.output, "1. Process next file automatically")?;
        writeln!(self.output, "2. Choose a specific file")?;
        writeln!(self.output, "3. Check a CSV file for issues")?;
        writeln!(self.output, "4. Exit")?;

        let choice = self.ask("\nEnter your choice (1-4): ")?;
        match choice.as_deref() {
            Some("1") => Ok(MenuChoice::ProcessNext),
            Some("2") => Ok(self
                .ask_chunk_number("Enter file number", available)?
                .map_or(MenuChoice::Exit, MenuChoice::ProcessChunk)),
            Some("3") => Ok(self
                .ask_chunk_number("Enter file number to check", available)?
                .map_or(MenuChoice::Exit, MenuChoice::Inspect)),
            Some("4") | None => Ok(MenuChoice::Exit),
            Some(_) => {
                writeln!(self.output, "Invalid choice!")?;
                Ok(MenuChoice::Exit)
            }
        }
    }

    fn ask_chunk_number(&mut self, prompt: &str, available: &[u32]) -> Result<Option<u32>> {
        let numbers = available.iter().map(u32::to_string).collect::<Vec<_>>().join(", ");
        let Some(answer) = self.ask(&format!("{prompt} ({numbers}): "))? else {
            return Ok(None);
        };

        let Ok(index) = answer.parse::<u32>() else {
            writeln!(self.output, "Invalid number!")?;
            return Ok(None);
        };
        if !available.contains(&index) {
            writeln!(self.output, "Invalid file number!")?;
            return Ok(None);
        }
        Ok(Some(index))
    }
}

/// One interactive session: status, menu, and the chosen action
pub fn run_interactive<S, P, C, R, W>(
    submitter: &mut Submitter<S, P, C>,
    store: &ProgressStore,
    menu: &mut Menu<R, W>,
) -> Result<()>
where
    S: Scrobbler,
    P: Pacer,
    C: Clock,
    R: BufRead,
    W: Write,
{
    let chunk_dir = submitter.config().chunk_dir.clone();
    let available = list_chunk_indices(&chunk_dir)?;
    if available.is_empty() {
        writeln!(menu.output(), "No part*.csv files found in {}", chunk_dir.display())?;
        return Ok(());
    }

    let state = store.load()?;
    write_status(menu.output(), &available, &state)?;

    let Some(next) = state.select_next(&available) else {
        writeln!(menu.output(), "All files have been processed!")?;
        return Ok(());
    };

    match menu.choose(&available, next)? {
        MenuChoice::ProcessNext => process(submitter, store, menu, next),
        MenuChoice::ProcessChunk(index) => process(submitter, store, menu, index),
        MenuChoice::Inspect(index) => {
            let chunk = inspect_chunk(submitter.config(), index)?;
            match chunk {
                Some(chunk) => write_inspection(menu.output(), &chunk)?,
                None => writeln!(menu.output(), "File not found: {}", chunk_file_name(index))?,
            }
            Ok(())
        }
        MenuChoice::Exit => Ok(()),
    }
}

fn process<S, P, C, R, W>(
    submitter: &mut Submitter<S, P, C>,
    store: &ProgressStore,
    menu: &mut Menu<R, W>,
    index: u32,
) -> Result<()>
where
    S: Scrobbler,
    P: Pacer,
    C: Clock,
    R: BufRead,
    W: Write,
{
    let outcome = submitter.process_chunk(index, store, |preview| menu.confirm(preview))?;
    write_outcome(menu.output(), &outcome)
}

pub fn write_status<W: Write>(out: &mut W, available: &[u32], state: &ProgressState) -> Result<()> {
    let completed = state.completed.iter().map(u32::to_string).collect::<Vec<_>>().join(", ");
    let remaining = state.remaining(available);

    writeln!(out, "PROGRESS STATUS:")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "Available files: {}", chunk_names(available))?;
    writeln!(out, "Completed files: [{completed}]")?;
    if remaining.is_empty() {
        writeln!(out, "All files completed!")?;
    } else {
        writeln!(out, "Remaining files: {}", chunk_names(&remaining))?;
    }
    match &state.last_run {
        Some(run) => writeln!(out, "Last run: {} on {}", run.file, run.date)?,
        None => writeln!(out, "Last run: N/A")?,
    }
    writeln!(out, "{RULE}")?;
    Ok(())
}

fn chunk_names(indices: &[u32]) -> String {
    indices.iter().map(|&i| chunk_file_name(i)).collect::<Vec<_>>().join(", ")
}

pub fn write_preview<W: Write>(out: &mut W, preview: &ChunkPreview) -> Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "Processing: {}", preview.file_name)?;
    writeln!(out, "{RULE}")?;
    if preview.problem_lines > 0 {
        writeln!(out, "Skipped {} problematic lines", preview.problem_lines)?;
        if let Some(path) = &preview.problem_file {
            writeln!(out, "Problematic lines saved to: {}", path.display())?;
        }
    }

    writeln!(out, "Sample of songs to be scrobbled:")?;
    writeln!(out, "{THIN_RULE}")?;
    for (i, song) in preview.sample.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, song_label(song))?;
    }
    if preview.total_songs > preview.sample.len() {
        writeln!(out, "... and {} more songs", preview.total_songs - preview.sample.len())?;
    }
    writeln!(out, "{THIN_RULE}")?;
    writeln!(out, "Total songs: {}", preview.total_songs)?;
    writeln!(out, "Total batches: {} (up to 50 songs each)", preview.total_batches)?;
    Ok(())
}

pub fn write_outcome<W: Write>(out: &mut W, outcome: &ChunkOutcome) -> Result<()> {
    match outcome {
        ChunkOutcome::Missing(path) => writeln!(out, "File not found: {}", path.display())?,
        ChunkOutcome::Empty(path) => writeln!(out, "No songs to scrobble in {}", path.display())?,
        ChunkOutcome::Cancelled => writeln!(out, "Cancelled by user")?,
        ChunkOutcome::Finished(report) => write_report(out, report)?,
    }
    Ok(())
}

pub fn write_report<W: Write>(out: &mut W, report: &ChunkReport) -> Result<()> {
    let summary = &report.summary;
    writeln!(out, "{RULE}")?;
    writeln!(out, "SUMMARY: {}", report.file_name)?;
    writeln!(out, "{RULE}")?;
    writeln!(
        out,
        "Successful batches: {}/{}",
        summary.successful_batches, summary.total_batches
    )?;
    writeln!(out, "Songs scrobbled: {}/{}", summary.songs_scrobbled, report.total_songs)?;
    writeln!(out, "Failed songs: {}", summary.failed_songs.len())?;
    if let Some(path) = &report.failed_file {
        writeln!(out, "Failed songs saved to: {}", path.display())?;
    }
    Ok(())
}

pub fn write_inspection<W: Write>(out: &mut W, chunk: &LoadedChunk) -> Result<()> {
    let songs = &chunk.contents.songs;
    writeln!(out, "Found {} valid songs in {}", songs.len(), chunk.file_name)?;
    for (i, song) in songs.iter().take(INSPECT_LISTING).enumerate() {
        writeln!(out, "{}. {}", i + 1, song_label(song))?;
    }
    if songs.len() > INSPECT_LISTING {
        writeln!(out, "... and {} more songs", songs.len() - INSPECT_LISTING)?;
    }

    let problems = chunk.contents.problems.len();
    if problems > 0 {
        writeln!(out, "Problematic lines: {problems}")?;
        if let Some(path) = &chunk.problem_file {
            writeln!(out, "Problematic lines saved to: {}", path.display())?;
        }
    }
    Ok(())
}
