//! Integration tests for the ufshard pipeline.
//!
//! These exercise the complete data flow: raw semicolon-delimited lines
//! through parsing, partitioning, parallel fingerprint derivation, and
//! binary shard serialization, then back out through the search layer in a
//! fresh pass over the on-disk files. Tests are organized into sections:
//!
//! - **Pipeline Tests** -- parse/partition/write end to end
//! - **Determinism Tests** -- identical fingerprints and shard bytes across runs
//! - **Search Tests** -- region, substring, and IBGE-code queries over shards
//! - **Robustness Tests** -- corrupt shards, exterior records, malformed lines
//!
//! # Test Strategy
//!
//! All tests run against a shared `sample_dataset()` fixture covering three
//! UFs, a mixed-case UF, an exterior record, a malformed line, and a header.
//! Fingerprints use `FingerprintConfig::fast()` so the deliberately slow KDF
//! does not dominate test time; determinism is independent of the iteration
//! count. Each test writes into its own `TempDir`.

use std::fs;
use tempfile::TempDir;
use ufshard::config::{FingerprintConfig, EXTERIOR_UF};
use ufshard::fingerprint::Fingerprinter;
use ufshard::parser;
use ufshard::pipeline::run_pipeline;
use ufshard::shard::read_shard;
use ufshard::{search, source};

fn fast_fingerprinter() -> Fingerprinter {
    Fingerprinter::new(FingerprintConfig::fast())
}

/// Sample dataset: header, three UFs (one via mixed case), one exterior
/// record, one malformed line, one record with an empty IBGE name.
fn sample_dataset() -> Vec<String> {
    [
        "TOM;IBGE;NOME_TOM;NOME_IBGE;UF",
        "0001;3509502;CAMPINAS;Campinas;SP",
        "0002;3550308;SAO PAULO;São Paulo;sp",
        "0003;3304557;RIO DE JANEIRO;Rio de Janeiro;RJ",
        "0004;3301702;CAMPOS DOS GOYTACAZES;Campos dos Goytacazes;RJ",
        "0005;1200401;RIO BRANCO;;AC",
        "9901;9700108;ASSUNCAO;Assunção;EX",
        "not;enough",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn write_sample(out: &std::path::Path) {
    run_pipeline(&sample_dataset(), out, &fast_fingerprinter()).unwrap();
}

// ---------------------------------------------------------------------------
// Pipeline Tests
// ---------------------------------------------------------------------------

#[test]
fn pipeline_produces_expected_shard_set() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("shards");

    let stats = run_pipeline(&sample_dataset(), &out, &fast_fingerprinter()).unwrap();
    assert_eq!(stats.records_parsed, 6);
    assert_eq!(stats.lines_skipped, 1);
    assert_eq!(stats.exterior_dropped, 1);
    assert_eq!(stats.shards_written, 3);
    assert_eq!(stats.records_written, 5);

    let mut names: Vec<String> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        ["municipios_AC.bin", "municipios_RJ.bin", "municipios_SP.bin"]
    );
}

#[test]
fn shard_records_are_sorted_by_preferred_name() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("shards");
    write_sample(&out);

    let records = read_shard(&out.join("municipios_RJ.bin")).unwrap();
    let names: Vec<&str> = records.iter().map(|r| r.preferred_name()).collect();
    assert_eq!(names, ["Campos dos Goytacazes", "Rio de Janeiro"]);
}

#[test]
fn every_persisted_record_has_a_fingerprint() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("shards");
    write_sample(&out);

    for file in ["municipios_AC.bin", "municipios_RJ.bin", "municipios_SP.bin"] {
        let records = read_shard(&out.join(file)).unwrap();
        assert!(!records.is_empty());
        for r in &records {
            assert_eq!(r.fingerprint.len(), 64);
            assert!(r.fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}

#[test]
fn preferred_name_falls_back_when_ibge_name_is_empty() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("shards");
    write_sample(&out);

    let records = search::search_by_uf(&out, "AC");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].preferred_name(), "RIO BRANCO");
}

// ---------------------------------------------------------------------------
// Determinism Tests
// ---------------------------------------------------------------------------

#[test]
fn derive_after_parse_is_deterministic() {
    let fp = fast_fingerprinter();
    let line = "0001;3509502;CAMPINAS;Campinas;SP";
    let first = fp.derive(&parser::parse_line(line).unwrap());
    let second = fp.derive(&parser::parse_line(line).unwrap());
    assert_eq!(first, second);
    assert_eq!(first.len(), 64);
}

#[test]
fn two_runs_produce_identical_shard_bytes() {
    let dir = TempDir::new().unwrap();
    let out_a = dir.path().join("run_a");
    let out_b = dir.path().join("run_b");

    // Same dataset in a different input order must serialize identically.
    let mut shuffled = sample_dataset();
    shuffled[1..].reverse();

    run_pipeline(&sample_dataset(), &out_a, &fast_fingerprinter()).unwrap();
    run_pipeline(&shuffled, &out_b, &fast_fingerprinter()).unwrap();

    for file in ["municipios_AC.bin", "municipios_RJ.bin", "municipios_SP.bin"] {
        let a = fs::read(out_a.join(file)).unwrap();
        let b = fs::read(out_b.join(file)).unwrap();
        assert_eq!(a, b, "shard bytes differ for {}", file);
    }
}

#[test]
fn reload_never_rehashes() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("shards");

    // Write with one config, read back: stored digests must be returned
    // verbatim, not recomputed under some other config.
    let fp = Fingerprinter::new(FingerprintConfig {
        iterations: 25,
        digest_len: 32,
    });
    run_pipeline(&sample_dataset(), &out, &fp).unwrap();

    let expected = fp.derive(&parser::parse_line("0001;3509502;CAMPINAS;Campinas;SP").unwrap());
    let records = search::search_by_ibge(&out, "3509502").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].fingerprint, expected);
}

// ---------------------------------------------------------------------------
// Search Tests
// ---------------------------------------------------------------------------

#[test]
fn search_by_uf_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("shards");
    write_sample(&out);

    assert_eq!(search::search_by_uf(&out, "rj").len(), 2);
    assert_eq!(search::search_by_uf(&out, "RJ").len(), 2);
}

#[test]
fn search_by_uf_absent_region_is_empty() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("shards");
    write_sample(&out);

    assert!(search::search_by_uf(&out, "MG").is_empty());
}

#[test]
fn search_by_name_spans_all_shards_sorted() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("shards");
    write_sample(&out);

    let records = search::search_by_name(&out, "rio").unwrap();
    let names: Vec<&str> = records.iter().map(|r| r.preferred_name()).collect();
    assert_eq!(names, ["RIO BRANCO", "Rio de Janeiro"]);
}

#[test]
fn search_by_ibge_finds_exactly_one_record() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("shards");
    write_sample(&out);

    let records = search::search_by_ibge(&out, "3509502").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].municipality.name_ibge, "Campinas");
    assert_eq!(records[0].municipality.uf, "SP");
}

#[test]
fn search_by_ibge_unknown_code_is_empty() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("shards");
    write_sample(&out);

    assert!(search::search_by_ibge(&out, "0000000").unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Robustness Tests
// ---------------------------------------------------------------------------

#[test]
fn exterior_records_never_reach_a_shard() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("shards");
    write_sample(&out);

    assert!(!out.join(format!("municipios_{}.bin", EXTERIOR_UF)).exists());
    assert!(search::search_by_ibge(&out, "9700108").unwrap().is_empty());
}

#[test]
fn corrupted_shard_does_not_poison_a_search() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("shards");
    write_sample(&out);

    fs::write(out.join("municipios_RJ.bin"), b"definitely not a shard").unwrap();

    let records = search::search_by_name(&out, "rio").unwrap();
    let names: Vec<&str> = records.iter().map(|r| r.preferred_name()).collect();
    assert_eq!(names, ["RIO BRANCO"]);
}

#[test]
fn snapshot_refresh_then_pipeline_end_to_end() {
    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("municipios.csv");
    let out = dir.path().join("shards");

    let first = sample_dataset();
    source::refresh_snapshot(&first, &snapshot).unwrap();

    let mut second = first.clone();
    second.push("0006;3106200;BELO HORIZONTE;Belo Horizonte;MG".to_string());
    let outcome = source::refresh_snapshot(&second, &snapshot).unwrap();
    assert_eq!(outcome.changed_lines, 1);

    let lines = source::load_lines(&snapshot).unwrap();
    run_pipeline(&lines, &out, &fast_fingerprinter()).unwrap();
    assert_eq!(search::search_by_uf(&out, "MG").len(), 1);
}
