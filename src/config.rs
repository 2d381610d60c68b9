//! Constants and fingerprint configuration.

/// Region code marking records located outside the country; excluded from
/// every partition and shard.
pub const EXTERIOR_UF: &str = "EX";

/// Shard file name prefix (`<prefix>_<UF>.bin`).
pub const SHARD_PREFIX: &str = "municipios";

/// Shard file extension.
pub const SHARD_EXT: &str = "bin";

/// Salt length in bytes, taken from the front of the SHA-256 of the IBGE code.
pub const SALT_LEN: usize = 16;

/// File name for the line-level diff produced when refreshing the snapshot.
pub const DIFF_FILE_NAME: &str = "differences.csv";

/// Parameters for the slow key-derivation step.
///
/// The config that computed a fingerprint is the config of record for the
/// shards it wrote; fingerprints derived under different parameters are not
/// comparable. Tests construct cheap instances, production uses `default()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintConfig {
    /// PBKDF2 iteration count.
    pub iterations: u32,
    /// Digest length in bytes; hex output is twice this.
    pub digest_len: usize,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            iterations: 10_000,
            digest_len: 32,
        }
    }
}

impl FingerprintConfig {
    /// Cheap parameters for tests; never used on a persistence path that
    /// production reads back.
    pub fn fast() -> Self {
        Self {
            iterations: 10,
            digest_len: 32,
        }
    }
}
