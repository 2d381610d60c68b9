//! Binary shard container: one file per UF holding that region's records.
//!
//! # Format
//!
//! Little-endian throughout:
//!
//! ```text
//! i32  record_count
//! then record_count times, six length-prefixed strings in field order
//!      {tom, ibge, name_tom, name_ibge, uf, fingerprint}:
//! u32  byte_length
//! [u8] UTF-8 bytes
//! ```
//!
//! Length prefixes rather than delimiters, so field content is unrestricted.
//! Writes go to a temporary path and are renamed into place; a failed write
//! never leaves a truncated file visible under the canonical name.

use crate::fingerprint::Fingerprinter;
use crate::models::{Municipality, ShardRecord};
use anyhow::{Context, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::config::{SHARD_EXT, SHARD_PREFIX};

/// Failure modes when decoding a shard file. Callers recover these as
/// "no records from this shard" instead of aborting a multi-shard search.
#[derive(Debug, Error)]
pub enum ShardReadError {
    #[error("failed to read shard file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid record count: {0}")]
    BadCount(i32),
    #[error("length prefix {length} exceeds remaining {remaining} bytes")]
    LengthOverflow { length: u32, remaining: u64 },
    #[error("field is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("shard ends before the declared {expected} records (read {read})")]
    Truncated { expected: i32, read: usize },
}

/// Canonical path of the shard file for one UF.
pub fn shard_path(out_dir: &Path, uf: &str) -> PathBuf {
    out_dir.join(format!(
        "{}_{}.{}",
        SHARD_PREFIX,
        uf.to_uppercase(),
        SHARD_EXT
    ))
}

/// All shard files currently present under `out_dir`, in name order.
pub fn list_shard_files(out_dir: &Path) -> Result<Vec<PathBuf>> {
    let prefix = format!("{}_", SHARD_PREFIX);
    let suffix = format!(".{}", SHARD_EXT);
    let mut files = Vec::new();

    for entry in fs::read_dir(out_dir)
        .with_context(|| format!("Failed to read shard directory: {:?}", out_dir))?
    {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(&prefix) && name.ends_with(&suffix) {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}

/// Fingerprints one UF's records in parallel and serializes them to the
/// region's shard file. Returns the final path and the record count.
///
/// Completion order of the fingerprint workers is unspecified, so the
/// collected records are re-sorted before serialization; on-disk order is
/// always ascending case-insensitive preferred name, independent of
/// scheduling.
pub fn write_shard(
    out_dir: &Path,
    uf: &str,
    mut municipalities: Vec<Municipality>,
    fingerprinter: &Fingerprinter,
) -> Result<(PathBuf, usize)> {
    municipalities.sort_by_cached_key(|m| m.preferred_name().to_lowercase());

    let mut records: Vec<ShardRecord> = municipalities
        .into_par_iter()
        .map(|m| fingerprinter.seal(m))
        .collect();
    records.sort_by_cached_key(|r| r.preferred_name().to_lowercase());

    let path = shard_path(out_dir, uf);
    let tmp_path = path.with_extension(format!("{}.tmp", SHARD_EXT));

    let file = File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp shard file: {:?}", tmp_path))?;
    let mut writer = BufWriter::new(file);

    encode_records(&mut writer, &records)
        .with_context(|| format!("Failed to serialize shard for UF {}", uf))?;
    let file = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to flush shard file")?;
    file.sync_all().context("Failed to sync shard file")?;

    fs::rename(&tmp_path, &path)
        .with_context(|| format!("Failed to rename temp shard file to: {:?}", path))?;

    debug!(uf = uf, records = records.len(), path = ?path, "Shard written");
    Ok((path, records.len()))
}

fn encode_records<W: Write>(writer: &mut W, records: &[ShardRecord]) -> std::io::Result<()> {
    writer.write_i32::<LittleEndian>(records.len() as i32)?;
    for r in records {
        for field in [
            &r.municipality.tom,
            &r.municipality.ibge,
            &r.municipality.name_tom,
            &r.municipality.name_ibge,
            &r.municipality.uf,
            &r.fingerprint,
        ] {
            writer.write_u32::<LittleEndian>(field.len() as u32)?;
            writer.write_all(field.as_bytes())?;
        }
    }
    Ok(())
}

/// Loads one shard file back into records, in stored (name-sorted) order.
pub fn read_shard(path: &Path) -> Result<Vec<ShardRecord>, ShardReadError> {
    let bytes = fs::read(path)?;
    let mut cursor = Cursor::new(bytes.as_slice());

    let count = cursor.read_i32::<LittleEndian>()?;
    if count < 0 {
        return Err(ShardReadError::BadCount(count));
    }

    // Each record needs at least 24 bytes of length prefixes; a count the
    // file cannot possibly hold is rejected before any allocation.
    let remaining = bytes.len() as u64 - cursor.position();
    if count as u64 > remaining / 24 {
        return Err(ShardReadError::BadCount(count));
    }

    let mut records = Vec::with_capacity(count as usize);
    for read in 0..count as usize {
        let record = decode_record(&mut cursor).map_err(|e| match e {
            // A clean EOF mid-record means the count lied.
            ShardReadError::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                ShardReadError::Truncated {
                    expected: count,
                    read,
                }
            }
            other => other,
        })?;
        records.push(record);
    }

    Ok(records)
}

fn decode_record(cursor: &mut Cursor<&[u8]>) -> Result<ShardRecord, ShardReadError> {
    let tom = read_string(cursor)?;
    let ibge = read_string(cursor)?;
    let name_tom = read_string(cursor)?;
    let name_ibge = read_string(cursor)?;
    let uf = read_string(cursor)?;
    let fingerprint = read_string(cursor)?;
    Ok(ShardRecord {
        municipality: Municipality {
            tom,
            ibge,
            name_tom,
            name_ibge,
            uf,
        },
        fingerprint,
    })
}

fn read_string(cursor: &mut Cursor<&[u8]>) -> Result<String, ShardReadError> {
    let length = cursor.read_u32::<LittleEndian>()?;
    let remaining = cursor.get_ref().len() as u64 - cursor.position();
    if u64::from(length) > remaining {
        return Err(ShardReadError::LengthOverflow { length, remaining });
    }
    let mut buf = vec![0u8; length as usize];
    cursor.read_exact(&mut buf)?;
    Ok(String::from_utf8(buf)?)
}
