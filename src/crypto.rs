//! At-rest encryption for cached payloads
//!
//! The stored format is `IV || ciphertext`: a random 16 byte IV followed by
//! the AES-256-CFB stream. There is no authentication tag, corrupted
//! ciphertext only fails when it is shorter than one block.

use crate::error::{Error, Result};
use aes::Aes256;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use sha2::{Digest, Sha256};
use std::fmt;

/// AES block length, also the IV length
pub const BLOCK_SIZE: usize = 16;

const KEY_LEN: usize = 32;
const PBKDF2_ROUNDS: u32 = 1048;

type Encryptor = cfb_mode::Encryptor<Aes256>;
type Decryptor = cfb_mode::Decryptor<Aes256>;

/// Symmetric key derived from a passphrase
#[derive(Clone, PartialEq, Eq)]
pub struct CacheKey([u8; KEY_LEN]);

impl CacheKey {
    /// Derive the cache key from a passphrase
    ///
    /// `SHA-256(passphrase)` is split into a 15 byte password (bytes 0..15)
    /// and a 16 byte salt (bytes 16..32), then stretched with
    /// PBKDF2-HMAC-SHA256. The same passphrase always yields the same key,
    /// so data written before a restart stays readable.
    #[must_use]
    pub fn derive(passphrase: &str) -> Self {
        let digest: [u8; 32] = Sha256::digest(passphrase.as_bytes()).into();

        // byte 15 belongs to neither half
        let (password, rest) = digest.split_at(15);
        let (_, salt) = rest.split_at(1);

        let mut key = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ROUNDS, &mut key);

        Self(key)
    }

    /// Encrypt `plaintext` under a fresh random IV
    ///
    /// # Errors
    ///
    /// Returns [`Error::Crypto`] if the cipher cannot be constructed
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let iv: [u8; BLOCK_SIZE] = rand::random();
        let cipher = Encryptor::new_from_slices(&self.0, &iv)
            .map_err(|e| Error::Crypto(format!("could not create cipher: {e}")))?;

        let mut payload = Vec::with_capacity(BLOCK_SIZE + plaintext.len());
        payload.extend_from_slice(&iv);
        payload.extend_from_slice(plaintext);

        let (_, body) = payload.split_at_mut(BLOCK_SIZE);
        cipher.encrypt(body);

        Ok(payload)
    }

    /// Decrypt an `IV || ciphertext` payload
    ///
    /// # Errors
    ///
    /// Returns [`Error::Crypto`] if the payload is shorter than one block or
    /// the cipher cannot be constructed
    pub fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let (iv, ciphertext) = payload.split_at_checked(BLOCK_SIZE).ok_or_else(|| {
            Error::Crypto("Ciphertext is too short. Probably corrupted data".to_string())
        })?;

        let cipher = Decryptor::new_from_slices(&self.0, iv)
            .map_err(|e| Error::Crypto(format!("could not create cipher: {e}")))?;

        let mut plaintext = ciphertext.to_vec();
        cipher.decrypt(&mut plaintext);

        Ok(plaintext)
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CacheKey(..)")
    }
}
