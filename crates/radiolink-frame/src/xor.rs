//! Single-key XOR obfuscation.
//!
//! This hides payloads from casual listeners on a shared channel. It is not
//! encryption in any meaningful sense.

/// Key used by stations that do not configure one (`'Q'`).
pub const DEFAULT_KEY: u8 = 0x51;

/// XOR every byte of `bytes` with `key`, returning a new buffer.
pub fn apply(bytes: &[u8], key: u8) -> Vec<u8> {
    bytes.iter().map(|b| b ^ key).collect()
}

/// XOR every byte of `bytes` with `key` in place.
pub fn apply_in_place(bytes: &mut [u8], key: u8) {
    for b in bytes.iter_mut() {
        *b ^= key;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn involutive_for_every_key() {
        let data: Vec<u8> = (0..=255).collect();
        for key in 0..=255u8 {
            assert_eq!(apply(&apply(&data, key), key), data);
        }
    }

    #[test]
    fn length_preserving() {
        assert!(apply(&[], DEFAULT_KEY).is_empty());
        assert_eq!(apply(b"HELLO", DEFAULT_KEY).len(), 5);
    }

    #[test]
    fn zero_key_is_identity() {
        assert_eq!(apply(b"plain", 0), b"plain");
    }

    #[test]
    fn in_place_matches_copying_variant() {
        let mut data = b"radio check".to_vec();
        let copied = apply(&data, 0x5A);
        apply_in_place(&mut data, 0x5A);
        assert_eq!(data, copied);
        assert_eq!(data[0], b'r' ^ 0x5A);
    }
}
