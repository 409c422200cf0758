//! JSON persistence of word-frequency tables.
//!
//! # Output Structure
//!
//! ```text
//! data/
//! ├── news_tracker_2025-05-06.json               # merge mode: one file per day
//! ├── news_tracker_2025-05-06_08-15-02.json      # snapshot mode: one file per run
//! └── news_tracker_2025-05-06_08-15-02-1.json    # snapshot collision in the same second
//! ```
//!
//! # Policies
//!
//! - [`PersistMode::Merge`]: the day's file accumulates. An existing file is
//!   read back and the new counts are added to it before rewriting.
//! - [`PersistMode::Snapshot`]: every run writes its own file and nothing is
//!   ever merged.

use crate::models::WordCounts;
use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    /// Accumulate into one file per source and day.
    #[default]
    Merge,
    /// Write a new timestamped file per run.
    Snapshot,
}

impl PersistMode {
    fn stamp(self, now: NaiveDateTime) -> String {
        match self {
            PersistMode::Merge => now.format("%Y-%m-%d").to_string(),
            PersistMode::Snapshot => now.format("%Y-%m-%d_%H-%M-%S").to_string(),
        }
    }
}

/// Build the output file path for a run.
///
/// # Arguments
///
/// * `data_dir` - Directory holding the JSON count files
/// * `source` - Label naming the file
/// * `mode` - Picks the stamp: the day for [`PersistMode::Merge`], the
///   second for [`PersistMode::Snapshot`]
/// * `now` - Local time of the run
///
/// # Returns
///
/// `<data_dir>/<source>_<stamp>.json`. Snapshot collisions are resolved
/// later by [`write_counts`] with a `-N` suffix.
pub fn output_path(data_dir: &Path, source: &str, mode: PersistMode, now: NaiveDateTime) -> PathBuf {
    data_dir.join(format!("{}_{}.json", source, mode.stamp(now)))
}

/// Persist a run's word counts as indented JSON.
///
/// In merge mode the day's file is read back, the new counts are added to
/// it and the result is rewritten. In snapshot mode a fresh file is claimed
/// with `create_new`, so two runs in the same second (even from separate
/// processes) never overwrite each other.
///
/// # Arguments
///
/// * `counts` - The run's aggregated table
/// * `data_dir` - Directory holding the JSON count files
/// * `source` - Label naming the file
/// * `mode` - Merge or snapshot policy
/// * `now` - Local time of the run, used for the file stamp
///
/// # Returns
///
/// The path that was written.
///
/// # Errors
///
/// Returns an error if:
/// - An existing merge target cannot be read, is not a JSON object of
///   non-negative integers, or would overflow a count when merged; the file
///   is left untouched in all three cases
/// - The file cannot be written
#[instrument(level = "info", skip_all, fields(data_dir = %data_dir.display(), %source, ?mode))]
pub async fn write_counts(
    counts: &WordCounts,
    data_dir: &Path,
    source: &str,
    mode: PersistMode,
    now: NaiveDateTime,
) -> Result<PathBuf, Box<dyn Error>> {
    let path = match mode {
        PersistMode::Merge => {
            let path = output_path(data_dir, source, mode, now);
            let mut table = read_existing(&path).await?;
            let existing = table.len();
            table
                .try_merge(counts)
                .map_err(|e| format!("cannot merge into {}: {e}", path.display()))?;
            info!(path = %path.display(), existing, "Merging into daily file");
            fs::write(&path, serde_json::to_string_pretty(&table)?).await?;
            path
        }
        PersistMode::Snapshot => {
            let json = serde_json::to_string_pretty(counts)?;
            write_snapshot(data_dir, source, now, json.as_bytes()).await?
        }
    };

    info!(path = %path.display(), words = counts.len(), "Wrote word counts");
    Ok(path)
}

async fn read_existing(path: &Path) -> Result<WordCounts, Box<dyn Error>> {
    if !fs::try_exists(path).await? {
        return Ok(WordCounts::new());
    }
    let raw = fs::read_to_string(path).await?;
    serde_json::from_str(&raw)
        .map_err(|e| format!("existing file {} is not a word-count table: {e}", path.display()).into())
}

/// Claim the first free snapshot name and write `body` into it.
async fn write_snapshot(
    data_dir: &Path,
    source: &str,
    now: NaiveDateTime,
    body: &[u8],
) -> Result<PathBuf, Box<dyn Error>> {
    let stamp = PersistMode::Snapshot.stamp(now);
    let mut n = 0u32;
    loop {
        let candidate = if n == 0 {
            output_path(data_dir, source, PersistMode::Snapshot, now)
        } else {
            data_dir.join(format!("{source}_{stamp}-{n}.json"))
        };
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(mut file) => {
                file.write_all(body).await?;
                file.flush().await?;
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e.into()),
        }
    }
}
