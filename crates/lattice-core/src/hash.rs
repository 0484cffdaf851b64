//! blake3-based short hashes for ids, anchors, and trace signatures.

use crate::constants::HASH_HEX_LEN;

/// Unit separator between hashed parts, so `["ab", "c"]` and `["a", "bc"]` differ.
const SEP: &[u8] = &[0x1f];

/// Hash `parts` with separators and keep the first [`HASH_HEX_LEN`] hex chars.
pub fn short_hash<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
        hasher.update(SEP);
    }
    let hex = hasher.finalize().to_hex();
    hex[..HASH_HEX_LEN].to_string()
}

/// Whether `s` looks like a short hash: exactly [`HASH_HEX_LEN`] lowercase hex chars.
pub fn is_short_hash(s: &str) -> bool {
    s.len() == HASH_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_prevents_concatenation_collisions() {
        let a = short_hash([b"ab".as_slice(), b"c".as_slice()]);
        let b = short_hash([b"a".as_slice(), b"bc".as_slice()]);
        assert_ne!(a, b);
        assert!(is_short_hash(&a));
    }
}
