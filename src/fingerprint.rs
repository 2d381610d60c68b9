//! Salted slow-hash fingerprint derivation.
//!
//! Each record gets a deterministic content fingerprint: the salt is derived
//! from the record's IBGE code alone (same code, same salt, any run, any
//! platform), and the digest is PBKDF2-HMAC-SHA256 over the record's
//! canonical string. The fingerprint is a dedup/integrity key, not a
//! security credential; the deliberately slow KDF is why derivation is
//! fanned out across a worker pool in the write path.

use crate::config::{FingerprintConfig, SALT_LEN};
use crate::models::{Municipality, ShardRecord};
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};

/// Derives fingerprints under one fixed configuration.
///
/// Derivation is infallible given valid inputs; a failure here is a defect,
/// not a runtime condition to recover from.
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    config: FingerprintConfig,
}

impl Fingerprinter {
    pub fn new(config: FingerprintConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> FingerprintConfig {
        self.config
    }

    /// Derives the lowercase hex fingerprint for one municipality.
    pub fn derive(&self, municipality: &Municipality) -> String {
        let salt = build_salt(&municipality.ibge);
        let mut digest = vec![0u8; self.config.digest_len];
        pbkdf2_hmac::<Sha256>(
            municipality.canonical_string().as_bytes(),
            &salt,
            self.config.iterations,
            &mut digest,
        );
        to_hex(&digest)
    }

    /// Attaches a fingerprint, sealing the record for persistence.
    pub fn seal(&self, municipality: Municipality) -> ShardRecord {
        let fingerprint = self.derive(&municipality);
        ShardRecord {
            municipality,
            fingerprint,
        }
    }
}

/// Fixed-length salt from a fast digest of the IBGE code.
fn build_salt(ibge: &str) -> [u8; SALT_LEN] {
    let digest = Sha256::digest(ibge.as_bytes());
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&digest[..SALT_LEN]);
    salt
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
