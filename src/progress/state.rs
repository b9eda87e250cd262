//! Progress state and its merge rules

use std::collections::BTreeSet;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Which chunks have been attempted, and the most recent run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    #[serde(default)]
    pub completed: BTreeSet<u32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::parsers::deserializers::deserialize_empty_object_as_none"
    )]
    pub last_run: Option<LastRun>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastRun {
    pub file: String,
    /// ISO-8601 local time of the run
    pub date: String,
    /// Unix seconds of the run
    pub timestamp: i64,
}

impl LastRun {
    pub fn new(file: impl Into<String>, at: DateTime<Local>) -> Self {
        Self { file: file.into(), date: at.to_rfc3339(), timestamp: at.timestamp() }
    }
}

impl ProgressState {
    /// Record a finished chunk; previously completed indices are kept
    pub fn mark_completed(&mut self, index: u32, last_run: LastRun) {
        self.completed.insert(index);
        self.last_run = Some(last_run);
    }

    /// Union with another state; the other state's `last_run` wins when present
    pub fn merge(&mut self, other: &ProgressState) {
        self.completed.extend(other.completed.iter().copied());
        if other.last_run.is_some() {
            self.last_run.clone_from(&other.last_run);
        }
    }

    /// Available chunk indices not yet completed, ascending
    pub fn remaining(&self, available: &[u32]) -> Vec<u32> {
        let mut remaining: Vec<u32> =
            available.iter().copied().filter(|i| !self.completed.contains(i)).collect();
        remaining.sort_unstable();
        remaining.dedup();
        remaining
    }

    /// Lowest-indexed chunk still to do
    pub fn select_next(&self, available: &[u32]) -> Option<u32> {
        self.remaining(available).first().copied()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn run(file: &str) -> LastRun {
        LastRun::new(file, Local.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    #[test]
    fn test_mark_completed_only_grows() {
        let mut state = ProgressState::default();
        state.mark_completed(1, run("part1.csv"));
        state.mark_completed(0, run("part0.csv"));
        state.mark_completed(1, run("part1.csv"));

        assert_eq!(state.completed.iter().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(state.last_run.as_ref().unwrap().file, "part1.csv");
        assert_eq!(state.last_run.unwrap().timestamp, 1_700_000_000);
    }

    #[test]
    fn test_merge_is_a_union() {
        let mut on_disk = ProgressState::default();
        on_disk.mark_completed(0, run("part0.csv"));
        on_disk.mark_completed(3, run("part3.csv"));

        let mut update = ProgressState::default();
        update.mark_completed(2, run("part2.csv"));

        on_disk.merge(&update);
        assert_eq!(on_disk.completed.iter().copied().collect::<Vec<_>>(), vec![0, 2, 3]);
        assert_eq!(on_disk.last_run.unwrap().file, "part2.csv");
    }

    #[test]
    fn test_merge_keeps_last_run_when_other_has_none() {
        let mut state = ProgressState::default();
        state.mark_completed(0, run("part0.csv"));
        state.merge(&ProgressState::default());
        assert_eq!(state.last_run.unwrap().file, "part0.csv");
    }

    #[test]
    fn test_remaining_and_select_next() {
        let mut state = ProgressState::default();
        state.mark_completed(0, run("part0.csv"));
        state.mark_completed(2, run("part2.csv"));

        let available = [3, 0, 1, 2, 4];
        assert_eq!(state.remaining(&available), vec![1, 3, 4]);
        assert_eq!(state.select_next(&available), Some(1));

        state.mark_completed(1, run("part1.csv"));
        assert_eq!(state.select_next(&available), Some(3));
    }

    #[test]
    fn test_select_next_when_everything_is_done() {
        let mut state = ProgressState::default();
        state.mark_completed(0, run("part0.csv"));
        assert_eq!(state.select_next(&[0]), None);
        assert_eq!(state.select_next(&[]), None);
    }

    #[test]
    fn test_serialized_shape() {
        let mut state = ProgressState::default();
        state.mark_completed(2, run("part2.csv"));
        state.mark_completed(0, run("part0.csv"));

        let json: serde_json::Value = serde_json::to_value(&state).unwrap();
        assert_eq!(json["completed"], serde_json::json!([0, 2]));
        assert_eq!(json["last_run"]["file"], "part0.csv");
        assert_eq!(json["last_run"]["timestamp"], 1_700_000_000);

        let empty = serde_json::to_value(ProgressState::default()).unwrap();
        assert_eq!(empty, serde_json::json!({"completed": []}));
    }
}
