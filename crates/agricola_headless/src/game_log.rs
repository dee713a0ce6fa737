//! Append-only game logs.
//!
//! Every externalized decision is appended to
//! `<logdir>/<game_id>_state.jsonl` as one [`LogRecord`] per line. When the
//! match ends the runner writes a [`MatchReport`] next to it as
//! `<game_id>_result.json`.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use agricola_core::choice::Decision;
use agricola_core::engine::DecisionSource;
use agricola_core::snapshot::Observation;
use thiserror::Error;

use crate::protocol::{LogRecord, MatchReport};

const STATE_SUFFIX: &str = "_state.jsonl";
const RESULT_SUFFIX: &str = "_result.json";

/// Error type for log operations.
#[derive(Error, Debug)]
pub enum LogError {
    /// Log file not found.
    #[error("Log file not found: {0}")]
    FileNotFound(String),
    /// Failed to read or write the file.
    #[error("Log I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// A line is not a valid record.
    #[error("Invalid log record on line {line}: {source}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// A record or report could not be encoded.
    #[error("Failed to encode log record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Path of the state log for `game_id` under `logdir`.
#[must_use]
pub fn state_path(logdir: &Path, game_id: &str) -> PathBuf {
    logdir.join(format!("{game_id}{STATE_SUFFIX}"))
}

/// Path of the result file that belongs to a state log.
#[must_use]
pub fn result_path_for(state_log: &Path) -> Option<PathBuf> {
    let name = state_log.file_name()?.to_str()?;
    let game_id = name.strip_suffix(STATE_SUFFIX)?;
    Some(state_log.with_file_name(format!("{game_id}{RESULT_SUFFIX}")))
}

// ============================================================================
// Writing
// ============================================================================

/// An open state log.
#[derive(Debug)]
pub struct GameLog {
    path: PathBuf,
    writer: BufWriter<File>,
    records: usize,
}

impl GameLog {
    /// Create (or truncate) the log for `game_id`, creating `logdir` if
    /// needed.
    pub fn create(logdir: &Path, game_id: &str) -> Result<Self, LogError> {
        fs::create_dir_all(logdir)?;
        let path = state_path(logdir, game_id);
        let writer = BufWriter::new(File::create(&path)?);
        tracing::debug!(path = %path.display(), "game log opened");
        Ok(Self {
            path,
            writer,
            records: 0,
        })
    }

    /// Append one record and flush it.
    pub fn append(&mut self, record: &LogRecord) -> Result<(), LogError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.records += 1;
        Ok(())
    }

    /// Write the match report next to the log.
    pub fn write_report(&self, report: &MatchReport) -> Result<PathBuf, LogError> {
        let path = self
            .path
            .with_file_name(format!("{}{RESULT_SUFFIX}", report.game_id));
        fs::write(&path, report.to_json()?)?;
        Ok(path)
    }

    /// Location of the log.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written so far.
    #[must_use]
    pub const fn records(&self) -> usize {
        self.records
    }
}

// ============================================================================
// Reading
// ============================================================================

/// Read every record of a state log. Blank lines are skipped.
pub fn read_log(path: &Path) -> Result<Vec<LogRecord>, LogError> {
    if !path.exists() {
        return Err(LogError::FileNotFound(path.display().to_string()));
    }
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| LogError::Parse {
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Read a match report.
pub fn read_report(path: &Path) -> Result<MatchReport, LogError> {
    if !path.exists() {
        return Err(LogError::FileNotFound(path.display().to_string()));
    }
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| LogError::Parse { line: 1, source })
}

// ============================================================================
// Replay
// ============================================================================

/// Feeds a log's decisions back in order.
///
/// Stops (returns `None`) when the records run out, or when the game asks
/// a different seat or a different kind of question than the log recorded.
#[derive(Debug)]
pub struct ReplaySource {
    records: VecDeque<LogRecord>,
    used: usize,
    divergence: Option<String>,
}

impl ReplaySource {
    /// Replay `records`.
    pub fn new(records: impl IntoIterator<Item = LogRecord>) -> Self {
        Self {
            records: records.into_iter().collect(),
            used: 0,
            divergence: None,
        }
    }

    /// Load and replay the log at `path`.
    pub fn from_file(path: &Path) -> Result<Self, LogError> {
        Ok(Self::new(read_log(path)?))
    }

    /// Records replayed so far.
    #[must_use]
    pub const fn used(&self) -> usize {
        self.used
    }

    /// Records not replayed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.records.len()
    }

    /// Why the replay stopped early, if it did.
    #[must_use]
    pub fn divergence(&self) -> Option<&str> {
        self.divergence.as_deref()
    }
}

impl DecisionSource for ReplaySource {
    fn decide(&mut self, observation: &Observation) -> Option<Decision> {
        if self.divergence.is_some() {
            return None;
        }
        let record = self.records.front()?;
        let logged = &record.observation;
        if logged.player != observation.player
            || logged.round != observation.round
            || logged.current_event != observation.current_event
        {
            let message = format!(
                "record {} was player {} round {} {:?}, game asked player {} round {} {:?}",
                self.used + 1,
                logged.player,
                logged.round,
                logged.current_event,
                observation.player,
                observation.round,
                observation.current_event
            );
            tracing::warn!(%message, "replay diverged");
            self.divergence = Some(message);
            return None;
        }
        let record = self.records.pop_front()?;
        self.used += 1;
        Some(record.decision())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_path_for() {
        let state = state_path(Path::new("logs"), "g7");
        assert_eq!(state, Path::new("logs/g7_state.jsonl"));
        assert_eq!(
            result_path_for(&state),
            Some(PathBuf::from("logs/g7_result.json"))
        );
        assert_eq!(result_path_for(Path::new("logs/other.txt")), None);
    }

    #[test]
    fn test_missing_log() {
        let err = read_log(Path::new("does/not/exist_state.jsonl")).unwrap_err();
        assert!(matches!(err, LogError::FileNotFound(_)));
    }

    #[test]
    fn test_empty_replay_gives_up() {
        let mut source = ReplaySource::new(Vec::new());
        let game = agricola_core::engine::Game::new(
            &agricola_core::config::GameConfig::default(),
            agricola_core::cards::CardCatalogue::standard(),
        )
        .unwrap();
        assert_eq!(source.decide(&game.observe(0).unwrap()), None);
        assert!(source.divergence().is_none());
    }
}
