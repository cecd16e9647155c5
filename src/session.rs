use crate::errors::prelude::*;

use base64::{engine::general_purpose, Engine};
use rand::RngCore;

/// Session keys shorter than this are never handed out.
pub const MIN_SESSION_KEY_LEN: usize = 24;

/// Generates random session keys encoded as URL-safe base64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandSessionKeyGen {
    length: usize,
}

impl RandSessionKeyGen {
    /// `length` is the number of random bytes per key.
    pub fn new(length: usize) -> RandSessionKeyGen {
        if length < MIN_SESSION_KEY_LEN {
            warn!(
                "Session key length {} is too short, using {} bytes",
                length, MIN_SESSION_KEY_LEN
            );
        }
        RandSessionKeyGen {
            length: length.max(MIN_SESSION_KEY_LEN),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn generate(&self) -> AnonCredsResult<String> {
        let mut bytes = vec![0u8; self.length];
        rand::thread_rng().try_fill_bytes(&mut bytes)?;
        Ok(general_purpose::URL_SAFE.encode(&bytes))
    }
}

impl Default for RandSessionKeyGen {
    fn default() -> RandSessionKeyGen {
        RandSessionKeyGen::new(32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_length_falls_back_to_minimum() {
        assert_eq!(MIN_SESSION_KEY_LEN, RandSessionKeyGen::new(8).length());
        assert_eq!(40, RandSessionKeyGen::new(40).length());
    }

    #[test]
    fn keys_are_url_safe_and_fresh() {
        let gen = RandSessionKeyGen::new(24);
        let key = gen.generate().unwrap();
        assert_eq!(32, key.len());
        assert!(key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        let decoded = general_purpose::URL_SAFE.decode(&key).unwrap();
        assert_eq!(24, decoded.len());
        assert_ne!(key, gen.generate().unwrap());
    }
}
