//! Authenticated encryption of user data under the key recovered by the client.
//!
//! Every call draws a fresh 32 byte salt. HKDF-SHA-512 stretches the master key
//! and salt into an AES-256-GCM key and nonce, and the salt is prepended to the
//! ciphertext: `salt || ciphertext || tag`.

use crate::params::Context;
use crate::utils::generate_nonce;
use crate::{Error, Result};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use hkdf::Hkdf;
use rand_core::CryptoRngCore;
use sha2::Sha512;
use zeroize::Zeroize;

/// Length of the master key
pub const KEY_LEN: usize = 32;
/// Length of the random salt prefixed to every ciphertext
pub const SALT_LEN: usize = 32;
/// Length of the GCM authentication tag
pub const TAG_LEN: usize = 16;

const NONCE_LEN: usize = 12;

fn cipher_for(ctx: &Context, key: &[u8], salt: &[u8]) -> Result<(Aes256Gcm, [u8; NONCE_LEN])> {
    let kdf = Hkdf::<Sha512>::new(Some(salt), key);
    let mut key_nonce = [0u8; KEY_LEN + NONCE_LEN];
    kdf.expand(&ctx.domains().encrypt, &mut key_nonce)
        .map_err(|_| Error::Kdf)?;

    let cipher = Aes256Gcm::new_from_slice(&key_nonce[..KEY_LEN]);
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&key_nonce[KEY_LEN..]);
    key_nonce.zeroize();

    Ok((cipher.map_err(|_| Error::InvalidKeyLength)?, nonce))
}

/// Encrypt `data` under a 32 byte master `key`
///
/// The key and nonce are bound to the `encrypt` domain tag of `ctx`.
pub fn encrypt<CSPRNG: CryptoRngCore>(
    ctx: &Context,
    rng: &mut CSPRNG,
    data: &[u8],
    key: &[u8],
) -> Result<Vec<u8>> {
    if key.len() != KEY_LEN {
        return Err(Error::InvalidKeyLength);
    }

    let salt: [u8; SALT_LEN] = generate_nonce(rng);
    let (cipher, nonce) = cipher_for(ctx, key, &salt)?;
    let sealed = cipher
        .encrypt(&Nonce::from(nonce), data)
        .map_err(|_| Error::Encoding)?;

    let mut out = Vec::with_capacity(SALT_LEN + sealed.len());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Decrypt a `salt || ciphertext || tag` produced by [`encrypt`]
pub fn decrypt(ctx: &Context, ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    if key.len() != KEY_LEN {
        return Err(Error::InvalidKeyLength);
    }
    if ciphertext.len() < SALT_LEN + TAG_LEN {
        return Err(Error::InvalidCiphertext);
    }

    let (salt, sealed) = ciphertext.split_at(SALT_LEN);
    let (cipher, nonce) = cipher_for(ctx, key, salt)?;
    cipher
        .decrypt(&Nonce::from(nonce), sealed)
        .map_err(|_| Error::DecryptionFailed)
}
