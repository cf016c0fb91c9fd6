use sha2::{Digest, Sha256};

/// Transaction id capability. Inputs are raw serializations; outputs are
/// display-order (byte-reversed) hex strings.
pub trait TxHasher {
    /// Id over the witness-stripped serialization
    fn txid(&self, stripped: &[u8]) -> String;

    /// Id over the full serialization including marker, flag and witnesses
    fn wtxid(&self, full: &[u8]) -> String;
}

/// SHA256(SHA256(bytes)), reversed for display
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256dHasher;

pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(&first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    out
}

fn display_hex(hash: [u8; 32]) -> String {
    let reversed: Vec<u8> = hash.iter().rev().cloned().collect();
    hex::encode(reversed)
}

impl TxHasher for Sha256dHasher {
    fn txid(&self, stripped: &[u8]) -> String {
        display_hex(sha256d(stripped))
    }

    fn wtxid(&self, full: &[u8]) -> String {
        display_hex(sha256d(full))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256d_empty() {
        assert_eq!(
            hex::encode(sha256d(b"")),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn test_display_order_is_reversed() {
        let hasher = Sha256dHasher;
        let id = hasher.txid(b"");
        assert_eq!(id, "56944c5d3f98413ef45cf54545538103cc9f298e0575820ad3591376e2e0f65d");
        assert_eq!(hasher.wtxid(b""), id);
    }
}
