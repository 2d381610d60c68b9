//! Source dataset acquisition and snapshot upkeep.
//!
//! Network retrieval is an external collaborator; this module only accepts
//! raw lines (from a local file or supplied by the caller). When a fresh
//! copy of the dataset arrives, [`refresh_snapshot`] diffs it against the
//! previous snapshot, records the changed lines, and replaces the snapshot
//! atomically. A failure to obtain source lines aborts the run before any
//! shard file is touched.

use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::DIFF_FILE_NAME;

/// What a snapshot refresh found and wrote.
#[derive(Debug)]
pub struct SnapshotOutcome {
    /// Lines present in the new dataset but absent from the old snapshot.
    pub changed_lines: usize,
    /// Where the changed lines were written, when there were any.
    pub diff_path: Option<PathBuf>,
}

/// Reads the source dataset into lines.
pub fn load_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read source dataset: {:?}", path))?;
    Ok(content.lines().map(|l| l.to_string()).collect())
}

/// Compares `new_lines` against the snapshot at `snapshot_path`, writes the
/// differences next to it, and atomically replaces the snapshot.
pub fn refresh_snapshot(new_lines: &[String], snapshot_path: &Path) -> Result<SnapshotOutcome> {
    let mut outcome = SnapshotOutcome {
        changed_lines: 0,
        diff_path: None,
    };

    if snapshot_path.exists() {
        let old_lines = load_lines(snapshot_path)?;
        let old_set: FxHashSet<&str> = old_lines.iter().map(|l| l.as_str()).collect();
        let changed: Vec<&String> = new_lines
            .iter()
            .filter(|l| !old_set.contains(l.as_str()))
            .collect();

        if changed.is_empty() {
            info!("Snapshot is up to date, no differences found");
        } else {
            let diff_path = snapshot_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(DIFF_FILE_NAME);
            write_lines(&diff_path, changed.iter().map(|l| l.as_str()))?;
            info!(count = changed.len(), path = ?diff_path, "Differences saved");
            outcome.changed_lines = changed.len();
            outcome.diff_path = Some(diff_path);
        }
    } else {
        info!("No previous snapshot found, saving the new version");
    }

    let tmp_path = snapshot_path.with_extension("csv.tmp");
    write_lines(&tmp_path, new_lines.iter().map(|l| l.as_str()))?;
    fs::rename(&tmp_path, snapshot_path)
        .with_context(|| format!("Failed to replace snapshot: {:?}", snapshot_path))?;

    Ok(outcome)
}

fn write_lines<'a>(path: &Path, lines: impl Iterator<Item = &'a str>) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}
