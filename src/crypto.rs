//! Repository API key generation.

use rand::{Rng, thread_rng};

/// Prefix carried by every repository API key.
pub const API_KEY_PREFIX: &str = "rk_";

/// Generate a new repository API key: `rk_` followed by 64 lowercase hex
/// characters (256 bits of entropy). Uniqueness is enforced by the database
/// constraint, not here.
pub fn generate_api_key() -> String {
    let mut key_bytes = [0u8; 32];
    thread_rng().fill(&mut key_bytes);
    format!("{API_KEY_PREFIX}{}", hex::encode(key_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_format() {
        let key = generate_api_key();
        assert!(key.starts_with(API_KEY_PREFIX));
        assert_eq!(key.len(), API_KEY_PREFIX.len() + 64);
        assert!(
            key[API_KEY_PREFIX.len()..]
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_keys_are_unique() {
        let keys: HashSet<String> = (0..1000).map(|_| generate_api_key()).collect();
        assert_eq!(keys.len(), 1000);
    }
}
