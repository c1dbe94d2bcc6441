/// Refresh token helpers
///
/// Refresh tokens are self-contained JWTs, but the principal store never
/// keeps the plaintext: it keeps a SHA-256 fingerprint. Each refresh token
/// also carries a random `jti` so that two rotations in the same second still
/// produce different tokens.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};

const TOKEN_ID_LEN: usize = 32;

/// Random alphanumeric nonce for the `jti` claim
pub fn generate_token_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_ID_LEN)
        .map(char::from)
        .collect()
}

/// SHA-256 hex digest of a token, as stored on the principal
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_id() {
        let id = generate_token_id();

        assert_eq!(id.len(), TOKEN_ID_LEN);
        assert!(id.chars().all(|c| c.is_alphanumeric()));
        assert_ne!(id, generate_token_id());
    }

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let hash1 = token_fingerprint("header.payload.signature");
        let hash2 = token_fingerprint("header.payload.signature");

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
        assert!(hash1.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(hash1, token_fingerprint("header.payload.signaturf"));
    }
}
