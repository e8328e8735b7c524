/// Authenticated encryption for secrets persisted at rest.
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    ChaCha20Poly1305, Key, Nonce,
};

use crate::error::AuthError;

const NONCE_LEN: usize = 12;

/// ChaCha20-Poly1305 wrapper around the two-factor secret column. Sealed
/// values are base64(nonce || ciphertext) and the associated data binds the
/// ciphertext to its owning account.
#[derive(Clone)]
pub struct SecretBox {
    cipher: ChaCha20Poly1305,
}

impl SecretBox {
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(key)),
        }
    }

    /// Key material supplied as base64, the form it takes in configuration.
    pub fn from_base64(encoded: &str) -> Result<Self, AuthError> {
        let raw = BASE64
            .decode(encoded)
            .map_err(|e| AuthError::Internal(format!("two-factor key is not valid base64: {e}")))?;
        let key: [u8; 32] = raw
            .try_into()
            .map_err(|_| AuthError::Internal("two-factor key must be 32 bytes".into()))?;
        Ok(Self::new(&key))
    }

    pub fn seal(&self, plaintext: &[u8], aad: &[u8]) -> Result<String, AuthError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|_| AuthError::Internal("secret encryption failed".into()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(nonce.as_slice());
        out.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(out))
    }

    pub fn open(&self, sealed: &str, aad: &[u8]) -> Result<Vec<u8>, AuthError> {
        let raw = BASE64
            .decode(sealed)
            .map_err(|_| AuthError::Internal("stored secret is not valid base64".into()))?;
        if raw.len() <= NONCE_LEN {
            return Err(AuthError::Internal("stored secret is truncated".into()));
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        self.cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| AuthError::Internal("secret decryption failed".into()))
    }
}
