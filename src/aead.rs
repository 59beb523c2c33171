//! AES-256-GCM encryption bound to the header's IV and key.
//!
//! No associated data is bound in (see spec §4.3): the header is parsed
//! before decryption and is considered structurally bound to the
//! ciphertext by the calling convention, not by AEAD AAD.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::header::{IV_LEN, TAG_LEN};

#[derive(Debug, Error)]
pub enum AeadError {
    #[error("authentication failed")]
    AuthFail,
}

/// Encrypts `plaintext`, returning `(ciphertext, tag)`. Ciphertext length
/// equals `plaintext.len()`; the tag is always [`TAG_LEN`] bytes.
pub fn encrypt(
    key: &[u8; 32],
    iv: &[u8; IV_LEN],
    plaintext: &[u8],
) -> Result<(Vec<u8>, [u8; TAG_LEN]), AeadError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let mut sealed = cipher
        .encrypt(
            Nonce::from_slice(iv),
            Payload {
                msg: plaintext,
                aad: &[],
            },
        )
        .map_err(|_| AeadError::AuthFail)?;
    let tag_bytes = sealed.split_off(sealed.len() - TAG_LEN);
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&tag_bytes);
    Ok((sealed, tag))
}

/// Decrypts `ciphertext` under `(key, iv)`, verifying `tag`. A tag mismatch
/// and a wrong key are indistinguishable, both reported as
/// [`AeadError::AuthFail`].
pub fn decrypt(
    key: &[u8; 32],
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
) -> Result<Zeroizing<Vec<u8>>, AeadError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(tag);

    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(iv),
            Payload {
                msg: &sealed,
                aad: &[],
            },
        )
        .map_err(|_| AeadError::AuthFail)?;
    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let key = [1u8; 32];
        let iv = [2u8; IV_LEN];
        let plaintext = b"squeamish ossifrage";

        let (ciphertext, tag) = encrypt(&key, &iv, plaintext).unwrap();
        assert_eq!(ciphertext.len(), plaintext.len());

        let decrypted = decrypt(&key, &iv, &ciphertext, &tag).unwrap();
        assert_eq!(decrypted.as_slice(), plaintext);
    }

    #[test]
    fn tamper_in_ciphertext_fails() {
        let key = [3u8; 32];
        let iv = [4u8; IV_LEN];
        let (mut ciphertext, tag) = encrypt(&key, &iv, b"hello world").unwrap();
        ciphertext[0] ^= 0xff;
        assert!(matches!(
            decrypt(&key, &iv, &ciphertext, &tag),
            Err(AeadError::AuthFail)
        ));
    }

    #[test]
    fn wrong_key_fails_indistinguishably_from_tamper() {
        let key = [5u8; 32];
        let wrong_key = [6u8; 32];
        let iv = [7u8; IV_LEN];
        let (ciphertext, tag) = encrypt(&key, &iv, b"hello world").unwrap();
        assert!(matches!(
            decrypt(&wrong_key, &iv, &ciphertext, &tag),
            Err(AeadError::AuthFail)
        ));
    }

    #[test]
    fn tampered_tag_fails() {
        let key = [8u8; 32];
        let iv = [9u8; IV_LEN];
        let (ciphertext, mut tag) = encrypt(&key, &iv, b"hello world").unwrap();
        tag[0] ^= 0xff;
        assert!(matches!(
            decrypt(&key, &iv, &ciphertext, &tag),
            Err(AeadError::AuthFail)
        ));
    }
}
