pub mod chord {
    tonic::include_proto!("chord");
}

/// SHA-256 of a UTF-8 label, the hash used both to derive a node's own
/// identifier from its listen address and to resolve a key's owning
/// identifier in `find_host_for_key`.
pub fn hash_label(label: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}
