use argon2::{Config, Error as Argon2Error};
use rand::Rng;

/// The administrator password, held only as an Argon2 hash.
///
/// Hashed once when the server ignites and placed in managed state.
pub struct AdminPassword {
    hash: String,
}

impl AdminPassword {
    /// Hash the plaintext password with a fresh salt.
    pub fn hash(password: &str) -> Result<Self, Argon2Error> {
        // 16 bytes is recommended for password hashing:
        //  https://en.wikipedia.org/wiki/Argon2
        let salt = {
            let mut salt = [0_u8; 16];
            rand::thread_rng().fill(&mut salt);
            salt
        };
        let hash = argon2::hash_encoded(password.as_bytes(), &salt, &Config::default())?;
        Ok(Self { hash })
    }

    /// Check whether the given password is correct.
    pub fn verify(&self, password: &str) -> Result<bool, Argon2Error> {
        argon2::verify_encoded(&self.hash, password.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify() {
        let password = AdminPassword::hash("correct horse battery staple").unwrap();
        assert!(password.verify("correct horse battery staple").unwrap());
        assert!(!password.verify("Correct horse battery staple").unwrap());
        assert!(!password.verify("").unwrap());
    }

    #[test]
    fn salted() {
        let first = AdminPassword::hash("hunter22").unwrap();
        let second = AdminPassword::hash("hunter22").unwrap();
        assert_ne!(first.hash, second.hash);
    }
}
