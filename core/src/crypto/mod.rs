// Cryptography module: build-time share key and AES-128-CBC

pub mod cipher;
pub mod key;

pub use cipher::{decrypt, encrypt, CipherError, BLOCK_SIZE};
pub use key::{KeyError, ShareKey, KEY_LEN};
