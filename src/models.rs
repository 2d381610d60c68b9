//! Core data types for municipal registry records.
//!
//! A record moves through two stages: [`Municipality`] is the immutable
//! parsed form, and [`ShardRecord`] is the fingerprinted form that gets
//! persisted. A `ShardRecord` is never re-hashed after construction.

use std::fmt;

/// One municipality as parsed from the registry dataset.
///
/// Field order matches the source format: `TOM;IBGE;Nome(TOM);Nome(IBGE);UF`.
/// The `ibge` code is the natural key; duplicates are a data-quality anomaly
/// the pipeline tolerates rather than rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Municipality {
    /// Legacy TOM code.
    pub tom: String,
    /// National IBGE code, the unique lookup key.
    pub ibge: String,
    /// Display name from the TOM registry.
    pub name_tom: String,
    /// Display name from the IBGE registry.
    pub name_ibge: String,
    /// Two-letter federative unit code, normalized to uppercase at parse time.
    pub uf: String,
}

impl Municipality {
    /// The IBGE name when present, falling back to the TOM name.
    pub fn preferred_name(&self) -> &str {
        if self.name_ibge.trim().is_empty() {
            &self.name_tom
        } else {
            &self.name_ibge
        }
    }

    /// Canonical concatenation of all five raw fields, the fingerprint input.
    ///
    /// Uses the raw sanitized fields (not `preferred_name`) in fixed order so
    /// the fingerprint is a total function of exactly the persisted fields.
    pub fn canonical_string(&self) -> String {
        format!(
            "{};{};{};{};{}",
            self.tom, self.ibge, self.name_tom, self.name_ibge, self.uf
        )
    }
}

impl fmt::Display for Municipality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[IBGE: {}] {} - {}",
            self.ibge,
            self.preferred_name(),
            self.uf
        )
    }
}

/// A municipality with its fingerprint attached, ready for persistence.
///
/// Produced either by the fingerprint deriver during a write pass or by the
/// shard reader, which reconstructs the record with the stored digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardRecord {
    pub municipality: Municipality,
    /// Lowercase hex digest of the canonical string. Never empty once persisted.
    pub fingerprint: String,
}

impl ShardRecord {
    pub fn preferred_name(&self) -> &str {
        self.municipality.preferred_name()
    }
}

impl fmt::Display for ShardRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.municipality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campinas() -> Municipality {
        Municipality {
            tom: "0001".to_string(),
            ibge: "3509502".to_string(),
            name_tom: "CAMPINAS".to_string(),
            name_ibge: "Campinas".to_string(),
            uf: "SP".to_string(),
        }
    }

    #[test]
    fn preferred_name_uses_ibge_name() {
        assert_eq!(campinas().preferred_name(), "Campinas");
    }

    #[test]
    fn preferred_name_falls_back_to_tom_name() {
        let mut m = campinas();
        m.name_ibge = String::new();
        assert_eq!(m.preferred_name(), "CAMPINAS");
    }

    #[test]
    fn preferred_name_treats_whitespace_as_empty() {
        let mut m = campinas();
        m.name_ibge = "   ".to_string();
        assert_eq!(m.preferred_name(), "CAMPINAS");
    }

    #[test]
    fn canonical_string_joins_all_five_fields_in_order() {
        assert_eq!(
            campinas().canonical_string(),
            "0001;3509502;CAMPINAS;Campinas;SP"
        );
    }

    #[test]
    fn display_shows_ibge_code_and_preferred_name() {
        assert_eq!(campinas().to_string(), "[IBGE: 3509502] Campinas - SP");
    }
}
