//! Opaque token generation
//!
//! Display tokens and personal entry tokens grant scoped access without
//! authentication, so they must be unguessable. 128 bits from the OS CSPRNG,
//! hex-encoded (32 chars, URL-safe).

use rand::RngCore;

pub fn opaque_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tokens_are_distinct_and_well_formed() {
        let tokens: HashSet<String> = (0..100).map(|_| opaque_token()).collect();
        assert_eq!(tokens.len(), 100);
        for t in &tokens {
            assert_eq!(t.len(), 32);
            assert!(t.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
