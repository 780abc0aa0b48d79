//! blake3 digests of problems and orders, as recorded in manifests.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::phase::PhaseId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl From<blake3::Hash> for Hash256 {
    fn from(h: blake3::Hash) -> Self {
        Hash256(*h.as_bytes())
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Digest of a linearization. Each id is length-prefixed, so `["ab", "c"]`
/// and `["a", "bc"]` differ.
pub fn hash_order(order: &[PhaseId]) -> Hash256 {
    let mut h = blake3::Hasher::new();
    h.update(&(order.len() as u64).to_le_bytes());
    for id in order {
        h.update(&(id.as_str().len() as u64).to_le_bytes());
        h.update(id.as_str().as_bytes());
    }
    h.finalize().into()
}

/// Digest of any serializable value, streamed through its JSON form.
pub fn hash_serde<T: Serialize>(v: &T) -> Result<Hash256> {
    let mut h = blake3::Hasher::new();
    serde_json::to_writer(&mut h, v)?;
    Ok(h.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<PhaseId> {
        v.iter().map(|s| PhaseId::from(*s)).collect()
    }

    #[test]
    fn order_hash_is_positional() {
        let a = hash_order(&ids(&["b", "a"]));
        assert_eq!(a, hash_order(&ids(&["b", "a"])));
        assert_ne!(a, hash_order(&ids(&["a", "b"])));
        assert_ne!(hash_order(&ids(&["ab", "c"])), hash_order(&ids(&["a", "bc"])));
        assert_ne!(hash_order(&[]), hash_order(&ids(&[""])));
    }

    #[test]
    fn hex_matches_blake3() {
        let h = hash_order(&ids(&["x"]));
        assert_eq!(h.to_hex().len(), 64);
        assert_eq!(h.to_string(), h.to_hex());
    }

    #[test]
    fn serde_hash_tracks_content() {
        let x = ids(&["b", "a"]);
        assert_eq!(hash_serde(&x).unwrap(), hash_serde(&x.clone()).unwrap());
        assert_ne!(hash_serde(&x).unwrap(), hash_serde(&ids(&["a", "b"])).unwrap());
    }
}
