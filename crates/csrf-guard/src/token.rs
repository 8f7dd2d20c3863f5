//! CSRF token generation.

use rand::RngCore;

/// Characters a token may contain (62 symbols).
const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Generate a random alphanumeric token of the given length.
///
/// Bytes come from the thread-local CSPRNG and are mapped modulo 62 into
/// the alphabet. The mapping carries a small modulo bias, fine at
/// anti-forgery token lengths but not suitable for key material.
pub(crate) fn generate(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
        .into_iter()
        .map(|b| ALPHABET[b as usize % ALPHABET.len()] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_token_has_requested_length() {
        for length in [1, 16, 32, 64] {
            assert_eq!(generate(length).len(), length);
        }
    }

    #[test]
    fn generated_token_is_alphanumeric() {
        let token = generate(256);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generated_tokens_differ() {
        assert_ne!(generate(32), generate(32));
    }
}
