//! Content-derived document identifiers.

use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of a byte slice, returning a hex string.
pub fn compute_content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Short identifier for an uploaded document, stable for identical bytes.
pub fn document_id(content: &[u8]) -> String {
    let mut hash = compute_content_hash(content);
    hash.truncate(16);
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_content_hash() {
        let hash = compute_content_hash(b"hello world");
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_document_id_is_hash_prefix() {
        assert_eq!(document_id(b"hello world"), "b94d27b9934d3e08");
        assert_ne!(document_id(b"a.pdf"), document_id(b"b.pdf"));
    }
}
