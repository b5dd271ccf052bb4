//! bcrypt password hashing.
//!
//! Stored form is the standard modular crypt string (`$2b$<cost>$...`), so
//! the salt and cost travel with the hash.

use bcrypt::BcryptError;

#[cfg(not(test))]
const COST: u32 = bcrypt::DEFAULT_COST;

// Minimum cost keeps the test suite fast.
#[cfg(test)]
const COST: u32 = 4;

pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    bcrypt::hash(password, COST)
}

/// Checks a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match bcrypt::verify(password, stored) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("Unreadable password hash: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("hunter22").unwrap();

        assert!(stored.starts_with("$2"));
        assert!(verify_password("hunter22", &stored));
        assert!(!verify_password("hunter23", &stored));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(
            hash_password("same").unwrap(),
            hash_password("same").unwrap()
        );
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "no-separator"));
        assert!(!verify_password("x", "!!!$???"));
    }
}
