//! End-to-end write pipeline: lines → parse → partition → per-UF shards.
//!
//! Shards are written sequentially in UF order; the parallelism lives inside
//! each shard's fingerprint fan-out. Every run fully rewrites the shards it
//! touches.

use crate::fingerprint::Fingerprinter;
use crate::parser;
use crate::partition;
use crate::shard;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Counters summarizing one pipeline run.
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub records_parsed: u64,
    pub lines_skipped: u64,
    pub exterior_dropped: u64,
    pub shards_written: u64,
    pub records_written: u64,
}

/// Parses the dataset, partitions it by UF, and writes one shard per region.
///
/// Aborts before creating the output directory when the dataset yields no
/// records, so a bad source never disturbs an existing shard set.
pub fn run_pipeline(
    lines: &[String],
    out_dir: &Path,
    fingerprinter: &Fingerprinter,
) -> Result<PipelineStats> {
    let mut stats = PipelineStats::default();

    let parsed = parser::parse_lines(lines);
    stats.records_parsed = parsed.municipalities.len() as u64;
    stats.lines_skipped = parsed.lines_skipped;
    info!(
        records = stats.records_parsed,
        skipped = stats.lines_skipped,
        "Dataset parsed"
    );

    if parsed.municipalities.is_empty() {
        info!("No records to process");
        return Ok(stats);
    }

    stats.exterior_dropped = partition::count_exterior(&parsed.municipalities);
    let groups = partition::partition_by_uf(parsed.municipalities);

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;

    let pb = ProgressBar::new(groups.len() as u64);
    for (uf, records) in groups {
        let started = Instant::now();
        let (_, written) = shard::write_shard(out_dir, &uf, records, fingerprinter)?;
        info!(
            uf = uf,
            records = written,
            duration_secs = started.elapsed().as_secs_f64(),
            "Shard complete"
        );
        stats.shards_written += 1;
        stats.records_written += written as u64;
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(stats)
}
