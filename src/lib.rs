//! Ufshard: municipal registry fingerprinting and per-UF binary sharding
//!
//! This crate ingests the semicolon-delimited Brazilian municipal registry
//! dataset, derives a salted slow-hash fingerprint per record, and persists
//! the records into one compact binary shard per federative unit (UF),
//! with a shard-aware search layer on top:
//!
//! 1. **Parse** -- Split lines into sanitized records, skipping the optional
//!    header and any malformed lines
//! 2. **Partition** -- Group records by UF (case-insensitive), dropping the
//!    "EX" exterior sentinel, enumerated in alphabetical order
//! 3. **Write** -- Per UF: sort by preferred name, derive fingerprints in
//!    parallel, re-sort, and serialize to a length-prefixed binary container
//!    via an atomic temp-file-plus-rename
//! 4. **Search** -- Point, substring, and region queries answered by
//!    scanning shard files, in parallel across files, tolerating corrupt
//!    shards as empty result sets
//!
//! # Architecture
//!
//! - **Deterministic fingerprints** -- Salt comes from a fast digest of the
//!   IBGE code alone; the digest is PBKDF2-HMAC-SHA256 over the record's
//!   canonical string, so the same fields always produce the same hex
//! - **Parallel derivation** -- The KDF is deliberately slow; rayon fans the
//!   per-record work across cores and the writer re-sorts afterwards so
//!   on-disk order never depends on scheduling
//! - **All-or-nothing writes** -- A shard is either fully replaced or left
//!   untouched; partial output never lands under the canonical name
//! - **Graceful reads** -- A corrupt shard degrades a search to fewer
//!   results, never a crash
//!
//! # Key Modules
//!
//! - [`models`] -- Core record types (Municipality, ShardRecord)
//! - [`parser`] -- Line splitting, sanitization, header detection
//! - [`fingerprint`] -- Salted PBKDF2 fingerprint derivation
//! - [`partition`] -- Case-insensitive grouping by UF
//! - [`shard`] -- Binary container codec and the shard writer
//! - [`search`] -- Region, name-substring, and IBGE-code queries
//! - [`source`] -- Dataset loading and snapshot diff/refresh
//! - [`pipeline`] -- Orchestration of parse, partition, and write
//! - [`config`] -- Constants and the fingerprint configuration
//!
//! # Example Usage
//!
//! ```bash
//! # Parse the dataset and write one binary shard per UF
//! ufshard process -i municipios.csv -o dados_binarios_por_uf/
//!
//! # Query the shard set
//! ufshard search -o dados_binarios_por_uf/ --uf SP
//! ufshard search -o dados_binarios_por_uf/ --name campinas
//! ufshard search -o dados_binarios_por_uf/ --ibge 3509502
//! ```

pub mod config;
pub mod fingerprint;
pub mod models;
pub mod parser;
pub mod partition;
pub mod pipeline;
pub mod search;
pub mod shard;
pub mod source;
