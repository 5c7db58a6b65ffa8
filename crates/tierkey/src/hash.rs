//! Identity hashing and key flattening
//!
//! Two families of hashes live here:
//! - the polynomial recurrence `hash = 31*hash + x` used for every key identity
//! - flattening of a whole identity sequence into one hash-map key, either with
//!   a fast 64-bit hash or a SHA-256 digest

use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};

use ahash::RandomState;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Multiplier of the polynomial identity recurrence
pub const POLY_PRIME: i64 = 31;

// Fixed so content hashes agree between cache instances of one process.
const SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// Fold a sequence with `hash = 31*hash + x`, wrapping on overflow
pub fn polynomial<I>(parts: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    parts
        .into_iter()
        .fold(0i64, |hash, x| hash.wrapping_mul(POLY_PRIME).wrapping_add(x))
}

/// Polynomial identity of a string, one step per byte
pub fn str_identity(s: &str) -> i64 {
    polynomial(s.bytes().map(i64::from))
}

/// Fast 64-bit content hash of any hashable value
///
/// Deterministic within a build; not a persistence format.
pub fn content_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = fixed_state().build_hasher();
    value.hash(&mut hasher);
    hasher.finish()
}

fn fixed_state() -> RandomState {
    RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3])
}

/// A whole composite key collapsed into a single map key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlatKey {
    /// Output of [`FlattenStrategy::Fast64`]
    Fast(u64),
    /// Lower-case hex SHA-256 digest from [`FlattenStrategy::Sha256`]
    Digest(String),
}

impl fmt::Display for FlatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlatKey::Fast(h) => write!(f, "{:016x}", h),
            FlatKey::Digest(d) => f.write_str(d),
        }
    }
}

/// How the flat hash cache collapses identity sequences
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlattenStrategy {
    /// Non-cryptographic 64-bit hash (default)
    #[default]
    Fast64,
    /// Collision-resistant SHA-256 digest
    Sha256,
}

impl FlattenStrategy {
    /// Collapse an identity sequence into one key
    pub fn flatten(&self, ids: &[i64]) -> FlatKey {
        match self {
            FlattenStrategy::Fast64 => FlatKey::Fast(content_hash(ids)),
            FlattenStrategy::Sha256 => {
                let mut hasher = Sha256::new();
                for id in ids {
                    hasher.update(id.to_le_bytes());
                }
                FlatKey::Digest(hex::encode(hasher.finalize()))
            }
        }
    }
}

impl fmt::Display for FlattenStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlattenStrategy::Fast64 => write!(f, "fast64"),
            FlattenStrategy::Sha256 => write!(f, "sha256"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polynomial_recurrence() {
        assert_eq!(polynomial(Vec::new()), 0);
        assert_eq!(polynomial([7]), 7);
        assert_eq!(polynomial([1, 2, 3]), (31 + 2) * 31 + 3);
    }

    #[test]
    fn test_str_identity_matches_manual_fold() {
        let mut expected = 0i64;
        for b in "kp_2".bytes() {
            expected = 31 * expected + b as i64;
        }
        assert_eq!(str_identity("kp_2"), expected);
        assert_eq!(str_identity(""), 0);
    }

    #[test]
    fn test_str_identity_wraps() {
        let long = "x".repeat(4096);
        // Must not panic on overflow in debug builds
        let _ = str_identity(&long);
    }

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(content_hash("abc"), content_hash("abc"));
        assert_ne!(content_hash("abc"), content_hash("abd"));
    }

    #[test]
    fn test_fast64_flatten() {
        let s = FlattenStrategy::Fast64;
        assert_eq!(s.flatten(&[1, 2, 3]), s.flatten(&[1, 2, 3]));
        assert_ne!(s.flatten(&[1, 2, 3]), s.flatten(&[1, 2, 3, 4]));
        assert!(matches!(s.flatten(&[1]), FlatKey::Fast(_)));
    }

    #[test]
    fn test_sha256_flatten() {
        let s = FlattenStrategy::Sha256;
        let key = s.flatten(&[1, 2, 3]);
        match &key {
            FlatKey::Digest(d) => {
                assert_eq!(d.len(), 64);
                assert!(d.chars().all(|c| c.is_ascii_hexdigit()));
            }
            other => panic!("unexpected flat key {:?}", other),
        }
        assert_eq!(key, s.flatten(&[1, 2, 3]));
        assert_ne!(key, s.flatten(&[3, 2, 1]));
    }

    #[test]
    fn test_strategy_serde() {
        let json = serde_json::to_string(&FlattenStrategy::Sha256).unwrap();
        assert_eq!(json, "\"sha256\"");
        let back: FlattenStrategy = serde_json::from_str("\"fast64\"").unwrap();
        assert_eq!(back, FlattenStrategy::Fast64);
        assert_eq!(FlattenStrategy::default(), FlattenStrategy::Fast64);
    }
}
