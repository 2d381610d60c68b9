//! Shard-aware search over a directory of per-UF binary files.
//!
//! Every operation scans whole shard files; there is no intra-shard index
//! or seeking. Shard sizes are bounded by one region's record count, so a
//! full load per file is acceptable. Corrupt or truncated shards degrade
//! gracefully: they are logged and contribute zero results.

use crate::models::ShardRecord;
use crate::shard::{self, shard_path};
use anyhow::Result;
use rayon::prelude::*;
use std::path::Path;
use tracing::warn;

/// Loads one shard, recovering read failures as an empty result set.
fn read_shard_lossy(path: &Path) -> Vec<ShardRecord> {
    match shard::read_shard(path) {
        Ok(records) => records,
        Err(e) => {
            warn!(path = ?path, error = %e, "Skipping unreadable shard");
            Vec::new()
        }
    }
}

/// All records for one UF, in stored name order.
///
/// The UF is matched case-insensitively; a missing shard file means zero
/// results, not an error.
pub fn search_by_uf(out_dir: &Path, uf: &str) -> Vec<ShardRecord> {
    let path = shard_path(out_dir, uf);
    if !path.exists() {
        return Vec::new();
    }
    read_shard_lossy(&path)
}

/// Case-insensitive substring match against the preferred name, across all
/// shards read in parallel. Results are merged and re-sorted by preferred
/// name.
pub fn search_by_name(out_dir: &Path, term: &str) -> Result<Vec<ShardRecord>> {
    let needle = term.to_lowercase();
    let files = shard::list_shard_files(out_dir)?;

    let mut matches: Vec<ShardRecord> = files
        .par_iter()
        .flat_map_iter(|path| {
            read_shard_lossy(path)
                .into_iter()
                .filter(|r| r.preferred_name().to_lowercase().contains(&needle))
                .collect::<Vec<_>>()
        })
        .collect();

    matches.sort_by_cached_key(|r| r.preferred_name().to_lowercase());
    Ok(matches)
}

/// Exact IBGE code lookup across all shards, read in parallel.
///
/// The code is expected to be unique, but uniqueness is not enforced
/// upstream: at most one match is taken per shard, and if several shards
/// hold the code, all of them are returned rather than silently picking one.
pub fn search_by_ibge(out_dir: &Path, ibge: &str) -> Result<Vec<ShardRecord>> {
    let files = shard::list_shard_files(out_dir)?;

    let matches: Vec<ShardRecord> = files
        .par_iter()
        .filter_map(|path| {
            read_shard_lossy(path)
                .into_iter()
                .find(|r| r.municipality.ibge == ibge)
        })
        .collect();

    Ok(matches)
}
