//! Symmetric payload codec shared by the decryption and encryption stages.
//!
//! AES-CBC with PKCS#7 padding, ciphertext carried as standard base64. The
//! key length picks AES-128/192/256 and the first 16 bytes of the key double
//! as the IV, which keeps ciphertext byte-identical with existing clients.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

const IV_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Encryption key is not configured")]
    MissingKey,

    #[error("Encryption key must be 16, 24 or 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("Ciphertext is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("Ciphertext has an invalid length or padding")]
    InvalidPadding,
}

impl CryptoError {
    /// True when the key itself is unusable, as opposed to the input
    pub fn is_config_error(&self) -> bool {
        matches!(self, CryptoError::MissingKey | CryptoError::InvalidKeyLength(_))
    }
}

/// Wire wrapper carrying ciphertext in both directions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub data: String,
}

#[derive(Clone)]
pub struct PayloadCipher {
    key: Vec<u8>,
}

impl std::fmt::Debug for PayloadCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCipher")
            .field("key_len", &self.key.len())
            .finish()
    }
}

impl PayloadCipher {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, CryptoError> {
        let key = secret.as_ref();
        match key.len() {
            0 => Err(CryptoError::MissingKey),
            16 | 24 | 32 => Ok(Self { key: key.to_vec() }),
            other => Err(CryptoError::InvalidKeyLength(other)),
        }
    }

    /// Build from `ENCRYPTION_KEY` in the global configuration
    pub fn from_config() -> Result<Self, CryptoError> {
        match &config::config().security.encryption_key {
            Some(secret) => Self::new(secret),
            None => Err(CryptoError::MissingKey),
        }
    }

    fn iv(&self) -> &[u8] {
        &self.key[..IV_LEN]
    }

    /// Encrypt UTF-8 text into base64 ciphertext
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        self.encrypt_bytes(plaintext.as_bytes())
    }

    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let ciphertext = match self.key.len() {
            16 => cbc::Encryptor::<aes::Aes128>::new_from_slices(&self.key, self.iv())
                .map_err(|_| CryptoError::InvalidKeyLength(self.key.len()))?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            24 => cbc::Encryptor::<aes::Aes192>::new_from_slices(&self.key, self.iv())
                .map_err(|_| CryptoError::InvalidKeyLength(self.key.len()))?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            32 => cbc::Encryptor::<aes::Aes256>::new_from_slices(&self.key, self.iv())
                .map_err(|_| CryptoError::InvalidKeyLength(self.key.len()))?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            other => return Err(CryptoError::InvalidKeyLength(other)),
        };
        Ok(STANDARD.encode(ciphertext))
    }

    /// Decrypt base64 ciphertext into raw bytes.
    ///
    /// Surrounding whitespace is ignored and spaces are read back as `+`,
    /// since form encoding turns `+` into a space in transit.
    pub fn decrypt(&self, ciphertext: &str) -> Result<Vec<u8>, CryptoError> {
        let cleaned = ciphertext.trim().replace(' ', "+");
        let bytes = STANDARD.decode(cleaned.as_bytes())?;
        if bytes.is_empty() || bytes.len() % IV_LEN != 0 {
            return Err(CryptoError::InvalidPadding);
        }

        let plaintext = match self.key.len() {
            16 => cbc::Decryptor::<aes::Aes128>::new_from_slices(&self.key, self.iv())
                .map_err(|_| CryptoError::InvalidKeyLength(self.key.len()))?
                .decrypt_padded_vec_mut::<Pkcs7>(&bytes),
            24 => cbc::Decryptor::<aes::Aes192>::new_from_slices(&self.key, self.iv())
                .map_err(|_| CryptoError::InvalidKeyLength(self.key.len()))?
                .decrypt_padded_vec_mut::<Pkcs7>(&bytes),
            32 => cbc::Decryptor::<aes::Aes256>::new_from_slices(&self.key, self.iv())
                .map_err(|_| CryptoError::InvalidKeyLength(self.key.len()))?
                .decrypt_padded_vec_mut::<Pkcs7>(&bytes),
            other => return Err(CryptoError::InvalidKeyLength(other)),
        };
        plaintext.map_err(|_| CryptoError::InvalidPadding)
    }

    /// Decrypt and require UTF-8 text
    pub fn decrypt_to_string(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let bytes = self.decrypt(ciphertext)?;
        String::from_utf8(bytes).map_err(|_| CryptoError::InvalidPadding)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn decrypt_inverts_encrypt(plaintext in any::<String>()) {
            let cipher = PayloadCipher::new("0123456789abcdef").unwrap();
            let ciphertext = cipher.encrypt(&plaintext).unwrap();
            prop_assert_eq!(cipher.decrypt_to_string(&ciphertext).unwrap(), plaintext);
        }

        #[test]
        fn round_trip_holds_for_every_key_size(
            key in prop_oneof!["[ -~]{16}", "[ -~]{24}", "[ -~]{32}"],
            plaintext in any::<String>(),
        ) {
            let cipher = PayloadCipher::new(&key).unwrap();
            let ciphertext = cipher.encrypt(&plaintext).unwrap();
            prop_assert_eq!(cipher.decrypt(&ciphertext).unwrap(), plaintext.into_bytes());
        }
    }
}
