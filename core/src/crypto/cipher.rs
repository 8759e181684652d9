// AES-128-CBC with PKCS#7 padding, keyed by the share key
//
// The share key doubles as the IV. This keeps the wire format identical
// across builds and devices at the cost of determinism: equal inputs give
// equal ciphertexts.

use super::key::ShareKey;
use aes::cipher::{
    block_padding::Pkcs7, generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut,
    KeyIvInit,
};
use thiserror::Error;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("Ciphertext length {0} is not a positive multiple of {BLOCK_SIZE}")]
    InvalidLength(usize),

    #[error("Padding check failed: wrong key or corrupted ciphertext")]
    BadPadding,
}

/// Encrypt `plaintext`; the output is always a non-empty multiple of the block size
pub fn encrypt(key: &ShareKey, plaintext: &[u8]) -> Vec<u8> {
    let k = GenericArray::from_slice(key.as_bytes());
    Aes128CbcEnc::new(k, k).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypt `ciphertext` and strip its padding
pub fn decrypt(key: &ShareKey, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CipherError::InvalidLength(ciphertext.len()));
    }

    let k = GenericArray::from_slice(key.as_bytes());
    Aes128CbcDec::new(k, k)
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CipherError::BadPadding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key::KEY_LEN;

    fn test_key() -> ShareKey {
        ShareKey::from_bytes(*b"0123456789abcdef")
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = test_key();
        let plaintext = b"Hello, QR share!";

        let ciphertext = encrypt(&key, plaintext);
        assert_ne!(&ciphertext[..], &plaintext[..]);

        let decrypted = decrypt(&key, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_padding_always_adds_a_block_when_aligned() {
        let key = test_key();
        // A full block of plaintext gets a full block of padding
        let ciphertext = encrypt(&key, &[7u8; BLOCK_SIZE]);
        assert_eq!(ciphertext.len(), 2 * BLOCK_SIZE);
    }

    #[test]
    fn test_empty_plaintext_encrypts_to_one_block() {
        let key = test_key();
        let ciphertext = encrypt(&key, b"");
        assert_eq!(ciphertext.len(), BLOCK_SIZE);
        assert_eq!(decrypt(&key, &ciphertext).unwrap(), b"");
    }

    #[test]
    fn test_encrypt_deterministic() {
        let key = test_key();
        assert_eq!(encrypt(&key, b"same"), encrypt(&key, b"same"));
    }

    #[test]
    fn test_key_reused_as_iv_matches_reference() {
        // AES-128-CBC("") with key = iv = 00..0f. A lone padding block
        // 0x10 * 16 is XORed with the IV and encrypted once.
        let key = ShareKey::from_bytes([
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
            0x0e, 0x0f,
        ]);
        let ciphertext = encrypt(&key, b"");

        use aes::cipher::{BlockEncrypt, KeyInit};
        let aes = aes::Aes128::new(GenericArray::from_slice(key.as_bytes()));
        let mut block = [0x10u8; KEY_LEN];
        for (b, iv) in block.iter_mut().zip(key.as_bytes()) {
            *b ^= iv;
        }
        let mut block = GenericArray::from(block);
        aes.encrypt_block(&mut block);

        assert_eq!(ciphertext, block.to_vec());
    }

    #[test]
    fn test_decrypt_wrong_key_fails_or_differs() {
        let ciphertext = encrypt(&test_key(), b"secret message that spans blocks");
        let other = ShareKey::from_bytes([9u8; KEY_LEN]);

        match decrypt(&other, &ciphertext) {
            Err(e) => assert_eq!(e, CipherError::BadPadding),
            Ok(plain) => assert_ne!(plain, b"secret message that spans blocks"),
        }
    }

    #[test]
    fn test_decrypt_rejects_empty() {
        assert_eq!(
            decrypt(&test_key(), b""),
            Err(CipherError::InvalidLength(0))
        );
    }

    #[test]
    fn test_decrypt_rejects_unaligned() {
        assert_eq!(
            decrypt(&test_key(), &[0u8; 17]),
            Err(CipherError::InvalidLength(17))
        );
    }
}
