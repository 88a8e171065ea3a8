//! Versioned key strings and records.
//!
//! Keys and update tokens are exchanged as `PREFIX.version.base64` strings,
//! where the prefix is `SK` for a client private key, `PK` for a server public
//! key and `UT` for an update token. Every rotation bumps the version by one,
//! and a token may only be applied to keys and records exactly one version
//! behind it.

use crate::client::rotate_client_keys;
use crate::messages::Message;
use crate::params::Context;
use crate::server::update_record;
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// What a versioned string holds
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyKind {
    /// Client private key, `SK`
    SecretKey,
    /// Server public key, `PK`
    PublicKey,
    /// Update token, `UT`
    UpdateToken,
}

impl KeyKind {
    /// The string prefix for this kind
    pub fn prefix(self) -> &'static str {
        match self {
            KeyKind::SecretKey => "SK",
            KeyKind::PublicKey => "PK",
            KeyKind::UpdateToken => "UT",
        }
    }

    fn from_prefix(prefix: &str) -> Result<Self> {
        match prefix {
            "SK" => Ok(KeyKind::SecretKey),
            "PK" => Ok(KeyKind::PublicKey),
            "UT" => Ok(KeyKind::UpdateToken),
            _ => Err(Error::InvalidKeyString),
        }
    }
}

/// A key or update token tagged with the version of the server key it belongs to
#[derive(Clone, PartialEq, Eq)]
pub struct VersionedKey {
    kind: KeyKind,
    version: u32,
    content: Vec<u8>,
}

impl VersionedKey {
    /// Tag `content` with a kind and version, which must be at least 1
    pub fn new(kind: KeyKind, version: u32, content: Vec<u8>) -> Result<Self> {
        if version < 1 {
            return Err(Error::InvalidKeyString);
        }
        Ok(Self {
            kind,
            version,
            content,
        })
    }

    /// Parse a `PREFIX.version.base64` string, requiring the prefix of `kind`
    pub fn parse(kind: KeyKind, s: &str) -> Result<Self> {
        let key: Self = s.parse()?;
        if key.kind != kind {
            return Err(Error::InvalidKeyString);
        }
        Ok(key)
    }

    /// The kind of key
    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    /// The version
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The raw key or serialized token
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    fn expect_kind(&self, kind: KeyKind) -> Result<()> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(Error::InvalidKeyString)
        }
    }
}

impl FromStr for VersionedKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('.');
        let (prefix, version, content) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(prefix), Some(version), Some(content), None) => (prefix, version, content),
                _ => return Err(Error::InvalidKeyString),
            };

        let kind = KeyKind::from_prefix(prefix)?;
        let version = version.parse().map_err(|_| Error::InvalidKeyString)?;
        let content = STANDARD
            .decode(content)
            .map_err(|_| Error::InvalidKeyString)?;

        Self::new(kind, version, content)
    }
}

impl fmt::Display for VersionedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.kind.prefix(),
            self.version,
            STANDARD.encode(&self.content)
        )
    }
}

impl fmt::Debug for VersionedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedKey")
            .field("kind", &self.kind)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl Drop for VersionedKey {
    fn drop(&mut self) {
        self.content.zeroize();
    }
}

fn next_version(version: u32, token: &VersionedKey) -> Result<()> {
    match version.checked_add(1) {
        Some(next) if next == token.version => Ok(()),
        _ => Err(Error::VersionMismatch),
    }
}

/// Rotate a client private key and server public key with an update token
///
/// # Arguments:
/// - `secret_key`: the client's `SK` key
/// - `public_key`: the server's `PK` key, of the same version as `secret_key`
/// - `token`: an `UT` token exactly one version ahead of both keys
///
/// # Return:
/// (`secret_key`, `public_key`) at the token's version
///
pub fn rotate_versioned_keys(
    secret_key: &VersionedKey,
    public_key: &VersionedKey,
    token: &VersionedKey,
) -> Result<(VersionedKey, VersionedKey)> {
    secret_key.expect_kind(KeyKind::SecretKey)?;
    public_key.expect_kind(KeyKind::PublicKey)?;
    token.expect_kind(KeyKind::UpdateToken)?;

    if secret_key.version != public_key.version {
        return Err(Error::KeyMismatch);
    }
    next_version(secret_key.version, token)?;

    let (mut new_secret, new_public) =
        rotate_client_keys(&public_key.content, &secret_key.content, &token.content)?;

    let rotated = (
        VersionedKey::new(KeyKind::SecretKey, token.version, new_secret.to_vec())?,
        VersionedKey::new(KeyKind::PublicKey, token.version, new_public.to_vec())?,
    );
    new_secret.zeroize();
    Ok(rotated)
}

/// An enrollment record tagged with the version of the server key it was made under
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedRecord {
    /// Server key version
    pub version: u32,
    /// A serialized [`EnrollmentRecord`](crate::EnrollmentRecord)
    pub record: Vec<u8>,
}

impl Message for VersionedRecord {
    const DECODE_ERROR: Error = Error::InvalidRecord;
}

/// Move a versioned record to the next server key
///
/// Fails with [`Error::VersionMismatch`] unless the token is exactly one version
/// ahead of the record.
///
pub fn update_versioned_record(
    ctx: &Context,
    record: &VersionedRecord,
    token: &VersionedKey,
) -> Result<VersionedRecord> {
    token.expect_kind(KeyKind::UpdateToken)?;
    next_version(record.version, token)?;

    Ok(VersionedRecord {
        version: token.version,
        record: update_record(ctx, &record.record, &token.content)?,
    })
}
