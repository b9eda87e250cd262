use std::path::PathBuf;
use std::time::Duration;

/// Most plays the service accepts in one batch call
pub const MAX_BATCH_SIZE: usize = 50;

/// Tunables for a submission run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding `part{i}.csv` chunk files
    pub chunk_dir: PathBuf,
    /// Directory for the progress file and the problem/failed side files
    pub state_dir: PathBuf,
    /// Songs per batch call, capped at [`MAX_BATCH_SIZE`]
    pub batch_size: usize,
    /// Gap between synthetic timestamps of consecutive songs in a batch
    pub spacing_secs: i64,
    /// Pause after each batch except the last
    pub batch_delay: Duration,
    /// Pause between single-song fallback calls
    pub individual_delay: Duration,
    /// Songs shown in the confirmation preview
    pub preview_len: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_dir: PathBuf::from("MusicCSV"),
            state_dir: PathBuf::from("."),
            batch_size: MAX_BATCH_SIZE,
            spacing_secs: 180,
            batch_delay: Duration::from_secs(3),
            individual_delay: Duration::from_millis(500),
            preview_len: 5,
        }
    }
}

impl PipelineConfig {
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }

    pub fn problem_file(&self, chunk_file_name: &str) -> PathBuf {
        self.state_dir.join(format!("problematic_lines_{chunk_file_name}.json"))
    }

    pub fn failed_file(&self, index: u32) -> PathBuf {
        self.state_dir.join(format!("failed_songs_part{index}.json"))
    }
}
