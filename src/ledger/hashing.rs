use serde::Serialize;
use sha2::{Digest, Sha256};

/// Canonical byte encoding shared by storage values and hash preimages.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    // bincode encoding of an in-memory value does not fail
    bincode::serialize(value).unwrap()
}

/// SHA-256 digest of raw bytes.
pub fn digest_bytes(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Canonical encode-then-digest primitive, returned as lowercase hex. Both
/// transaction identity and block identity go through this path.
pub fn hash_encoded<T: Serialize>(value: &T) -> String {
    hex::encode(digest_bytes(&canonical_bytes(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_sha256() {
        let digest = digest_bytes(b"");
        assert_eq!(
            hex::encode(digest),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_encoded_is_stable() {
        let value = ("algorithm".to_string(), 42u64);
        assert_eq!(hash_encoded(&value), hash_encoded(&value));
        assert_eq!(hash_encoded(&value).len(), 64);
    }
}
