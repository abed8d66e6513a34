//! Password-based authenticated encryption of guild messages.
//!
//! # Ciphertext format
//!
//! Base64 (standard alphabet, padded) of:
//!
//! ```text
//! [8 bytes: crypt salt][8 bytes: auth salt][16 bytes: IV]
//! [AES-256-CBC ciphertext, PKCS#7 padded]
//! [32 bytes: HMAC-SHA256 over everything before it]
//! ```
//!
//! Both keys are derived from the password with PBKDF2-HMAC-SHA1, 10 000
//! rounds, each with its own salt. Peers reject passwords shorter than
//! [`MIN_PASSWORD_LEN`], so shorter ones are padded with `*` first.

use aes::Aes256;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;
use sha2::Sha256;

use crate::error::CipherError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Minimum password length, in characters, accepted as key material.
pub const MIN_PASSWORD_LEN: usize = 12;

const PASSWORD_PAD: char = '*';
const SALT_LEN: usize = 8;
const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const TAG_LEN: usize = 32;
const PBKDF2_ROUNDS: u32 = 10_000;
const HEADER_LEN: usize = SALT_LEN * 2 + IV_LEN;

/// Right-pads a password with `*` up to [`MIN_PASSWORD_LEN`] characters.
pub fn normalize_password(password: &str) -> String {
    let missing = MIN_PASSWORD_LEN.saturating_sub(password.chars().count());
    let mut out = String::with_capacity(password.len() + missing);
    out.push_str(password);
    out.extend(std::iter::repeat_n(PASSWORD_PAD, missing));
    out
}

/// Encrypts and decrypts guild messages under one shared password.
#[derive(Clone)]
pub struct GuildCipher {
    password: String,
}

impl GuildCipher {
    /// Creates a cipher for the given password, normalizing it first.
    pub fn new(password: &str) -> Self {
        Self {
            password: normalize_password(password),
        }
    }

    /// Encrypts a plaintext message with fresh random salts and IV.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut rng = rand::thread_rng();
        let mut crypt_salt = [0u8; SALT_LEN];
        let mut auth_salt = [0u8; SALT_LEN];
        let mut iv = [0u8; IV_LEN];
        rng.fill_bytes(&mut crypt_salt);
        rng.fill_bytes(&mut auth_salt);
        rng.fill_bytes(&mut iv);
        self.encrypt_with(plaintext, &crypt_salt, &auth_salt, iv)
    }

    fn encrypt_with(
        &self,
        plaintext: &str,
        crypt_salt: &[u8; SALT_LEN],
        auth_salt: &[u8; SALT_LEN],
        iv: [u8; IV_LEN],
    ) -> Result<String, CipherError> {
        let crypt_key = derive_key(&self.password, crypt_salt);
        let auth_key = derive_key(&self.password, auth_salt);

        let ciphertext = Aes256CbcEnc::new(&crypt_key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len() + TAG_LEN);
        out.extend_from_slice(crypt_salt);
        out.extend_from_slice(auth_salt);
        out.extend_from_slice(&iv);
        out.extend_from_slice(&ciphertext);

        let mut mac = HmacSha256::new_from_slice(&auth_key).map_err(|_| CipherError::TagMismatch)?;
        mac.update(&out);
        out.extend_from_slice(&mac.finalize().into_bytes());

        Ok(STANDARD.encode(out))
    }

    /// Verifies and decrypts a message produced by [`encrypt`](Self::encrypt).
    ///
    /// Fails on a wrong password, tampered or truncated input, or non-UTF-8
    /// plaintext. Callers drop the record in every case.
    pub fn decrypt(&self, encoded: &str) -> Result<String, CipherError> {
        let data = STANDARD.decode(encoded)?;
        if data.len() < HEADER_LEN + TAG_LEN {
            return Err(CipherError::Truncated(data.len()));
        }

        let (body, tag) = data.split_at(data.len() - TAG_LEN);
        let (crypt_salt, rest) = body.split_at(SALT_LEN);
        let (auth_salt, rest) = rest.split_at(SALT_LEN);
        let (iv, ciphertext) = rest.split_at(IV_LEN);

        let auth_key = derive_key(&self.password, auth_salt);
        let mut mac = HmacSha256::new_from_slice(&auth_key).map_err(|_| CipherError::TagMismatch)?;
        mac.update(body);
        mac.verify_slice(tag).map_err(|_| CipherError::TagMismatch)?;

        let crypt_key = derive_key(&self.password, crypt_salt);
        let iv: [u8; IV_LEN] = iv
            .try_into()
            .map_err(|_| CipherError::Truncated(data.len()))?;
        let plaintext = Aes256CbcDec::new(&crypt_key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CipherError::Padding)?;

        Ok(String::from_utf8(plaintext)?)
    }
}

impl std::fmt::Debug for GuildCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuildCipher").finish_non_exhaustive()
    }
}

fn derive_key(password: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha1>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut key);
    key
}
