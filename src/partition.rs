//! Grouping of parsed records into per-UF partitions.

use crate::config::EXTERIOR_UF;
use crate::models::Municipality;
use std::collections::BTreeMap;
use tracing::debug;

/// Groups municipalities by UF, case-insensitively, dropping the exterior
/// sentinel group.
///
/// Keys are uppercased; the `BTreeMap` hands partitions to the writer in
/// ascending alphabetical order, keeping shard generation order (and logs)
/// reproducible. Within each group, first-seen input order is preserved;
/// the writer imposes the final name sort.
pub fn partition_by_uf(municipalities: Vec<Municipality>) -> BTreeMap<String, Vec<Municipality>> {
    let mut groups: BTreeMap<String, Vec<Municipality>> = BTreeMap::new();
    let mut exterior_dropped = 0u64;

    for m in municipalities {
        let key = m.uf.to_uppercase();
        if key == EXTERIOR_UF {
            exterior_dropped += 1;
            continue;
        }
        groups.entry(key).or_default().push(m);
    }

    if exterior_dropped > 0 {
        debug!(count = exterior_dropped, "Dropped exterior records");
    }

    groups
}

/// Count of records that `partition_by_uf` would drop as exterior.
pub fn count_exterior(municipalities: &[Municipality]) -> u64 {
    municipalities
        .iter()
        .filter(|m| m.uf.eq_ignore_ascii_case(EXTERIOR_UF))
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn muni(ibge: &str, name: &str, uf: &str) -> Municipality {
        Municipality {
            tom: "0000".to_string(),
            ibge: ibge.to_string(),
            name_tom: name.to_uppercase(),
            name_ibge: name.to_string(),
            uf: uf.to_string(),
        }
    }

    #[test]
    fn groups_case_insensitively_under_uppercase_keys() {
        let groups = partition_by_uf(vec![
            muni("3509502", "Campinas", "sp"),
            muni("3550308", "São Paulo", "SP"),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["SP"].len(), 2);
    }

    #[test]
    fn drops_exterior_sentinel_any_case() {
        let groups = partition_by_uf(vec![
            muni("9700108", "Assunção", "EX"),
            muni("9700205", "Buenos Aires", "ex"),
            muni("3509502", "Campinas", "SP"),
        ]);
        assert_eq!(groups.len(), 1);
        assert!(groups.contains_key("SP"));
    }

    #[test]
    fn keys_enumerate_in_alphabetical_order() {
        let groups = partition_by_uf(vec![
            muni("3304557", "Rio de Janeiro", "RJ"),
            muni("1200401", "Rio Branco", "AC"),
            muni("3509502", "Campinas", "SP"),
        ]);
        let keys: Vec<&String> = groups.keys().collect();
        assert_eq!(keys, ["AC", "RJ", "SP"]);
    }

    #[test]
    fn preserves_first_seen_order_within_group() {
        let groups = partition_by_uf(vec![
            muni("3550308", "São Paulo", "SP"),
            muni("3509502", "Campinas", "SP"),
        ]);
        assert_eq!(groups["SP"][0].ibge, "3550308");
        assert_eq!(groups["SP"][1].ibge, "3509502");
    }

    #[test]
    fn count_exterior_matches_dropped_records() {
        let records = vec![
            muni("9700108", "Assunção", "Ex"),
            muni("3509502", "Campinas", "SP"),
        ];
        assert_eq!(count_exterior(&records), 1);
    }
}
