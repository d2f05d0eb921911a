//! sha256 helpers shared by lock fingerprints and generated-output hashes.

use sha2::{Digest, Sha256};

/// Hex-encoded sha256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Hex-encoded sha256 over a sequence of fields.
///
/// Each field is length-prefixed so `["ab", "c"]` and `["a", "bc"]` differ.
pub fn sha256_fields<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut hasher = Sha256::new();
    for field in fields {
        let bytes = field.as_ref();
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn fields_are_length_prefixed() {
        assert_ne!(sha256_fields(["ab", "c"]), sha256_fields(["a", "bc"]));
        assert_eq!(sha256_fields(["a", "b"]), sha256_fields(["a", "b"]));
    }
}
