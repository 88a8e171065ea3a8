//! Messages exchanged between client and server, and the records they persist.
//!
//! Every message is a plain serde structure of byte strings, encoded with
//! `postcard`. Nothing is trusted until `validate` has decoded its points and
//! scalars and checked their lengths.

use crate::point::{Point, POINT_LEN};
use crate::utils::{private_scalar_from_slice, scalar_from_slice, NONCE_LEN, SCALAR_LEN};
use crate::{Error, Result};
use core::fmt;
use p256::elliptic_curve::Field;
use p256::Scalar;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Binary encoding shared by all protocol messages
pub trait Message: Serialize + DeserializeOwned {
    /// Error reported when bytes do not decode to this message
    const DECODE_ERROR: Error;

    /// Serialize the message
    fn to_bytes(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|_| Error::Encoding)
    }

    /// Deserialize a message, rejecting trailing bytes
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (message, rest) = postcard::take_from_bytes(bytes).map_err(|_| Self::DECODE_ERROR)?;
        if !rest.is_empty() {
            return Err(Self::DECODE_ERROR);
        }
        Ok(message)
    }
}

fn nonce_from_slice(bytes: &[u8]) -> Result<[u8; NONCE_LEN]> {
    bytes.try_into().map_err(|_| Error::InvalidScalarLength)
}

/// The server's long term key pair
#[derive(Clone, Serialize, Deserialize)]
pub struct Keypair {
    /// Uncompressed encoding of `X = G^x`
    pub public_key: Vec<u8>,
    /// The 32 byte scalar `x`
    pub private_key: Vec<u8>,
}

impl Message for Keypair {
    const DECODE_ERROR: Error = Error::InvalidKey;
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl Drop for Keypair {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

/// A decoded server key pair whose halves are known to belong together
pub(crate) struct ServerKeypair {
    pub(crate) private_key: Scalar,
    pub(crate) public_key: Point,
    pub(crate) public_key_bytes: [u8; POINT_LEN],
}

impl Drop for ServerKeypair {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

impl Keypair {
    pub(crate) fn validate(&self) -> Result<ServerKeypair> {
        if self.private_key.len() != SCALAR_LEN {
            return Err(Error::InvalidKey);
        }
        let private_key = private_scalar_from_slice(&self.private_key)?;
        let public_key = Point::unmarshal(&self.public_key)?;
        if Point::scalar_base_mult(&private_key) != public_key {
            return Err(Error::KeyMismatch);
        }

        Ok(ServerKeypair {
            private_key,
            public_key,
            public_key_bytes: public_key.marshal()?,
        })
    }
}

/// Proof that `C0 = Hs0^x` and `C1 = Hs1^x` for the `x` behind the server's public key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfSuccess {
    /// `Hs0^r`
    pub term1: Vec<u8>,
    /// `Hs1^r`
    pub term2: Vec<u8>,
    /// `G^r`
    pub term3: Vec<u8>,
    /// `r + x * challenge`
    pub blind_x: Vec<u8>,
}

pub(crate) struct ValidProofOfSuccess {
    pub(crate) term1: Point,
    pub(crate) term2: Point,
    pub(crate) term3: Point,
    pub(crate) blind_x: Scalar,
}

impl ProofOfSuccess {
    pub(crate) fn validate(&self) -> Result<ValidProofOfSuccess> {
        let point = |bytes: &[u8]| Point::unmarshal(bytes).map_err(|_| Error::InvalidProof);

        Ok(ValidProofOfSuccess {
            term1: point(&self.term1)?,
            term2: point(&self.term2)?,
            term3: point(&self.term3)?,
            blind_x: scalar_from_slice(&self.blind_x).ok_or(Error::InvalidProof)?,
        })
    }
}

/// Proof that `C0 != Hs0^x` for the `x` behind the server's public key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfFail {
    /// `C0^blindA`
    pub term1: Vec<u8>,
    /// `Hs0^blindB`
    pub term2: Vec<u8>,
    /// `X^blindA`
    pub term3: Vec<u8>,
    /// `G^blindB`
    pub term4: Vec<u8>,
    /// `blindA + r * challenge`
    pub blind_a: Vec<u8>,
    /// `blindB - r * x * challenge`
    pub blind_b: Vec<u8>,
}

pub(crate) struct ValidProofOfFail {
    pub(crate) term1: Point,
    pub(crate) term2: Point,
    pub(crate) term3: Point,
    pub(crate) term4: Point,
    pub(crate) blind_a: Scalar,
    pub(crate) blind_b: Scalar,
}

impl ProofOfFail {
    pub(crate) fn validate(&self) -> Result<ValidProofOfFail> {
        let point = |bytes: &[u8]| Point::unmarshal(bytes).map_err(|_| Error::InvalidProof);
        let scalar = |bytes: &[u8]| scalar_from_slice(bytes).ok_or(Error::InvalidProof);

        Ok(ValidProofOfFail {
            term1: point(&self.term1)?,
            term2: point(&self.term2)?,
            term3: point(&self.term3)?,
            term4: point(&self.term4)?,
            blind_a: scalar(&self.blind_a)?,
            blind_b: scalar(&self.blind_b)?,
        })
    }
}

/// Either kind of proof a server attaches to a password check
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Proof {
    /// The password matched
    Success(ProofOfSuccess),
    /// The password did not match
    Fail(ProofOfFail),
}

/// Server's answer to an enrollment request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentResponse {
    /// Server nonce
    pub ns: Vec<u8>,
    /// `Hs0^x`
    pub c0: Vec<u8>,
    /// `Hs1^x`
    pub c1: Vec<u8>,
    /// Proof that `c0` and `c1` were computed with the server's private key
    pub proof: ProofOfSuccess,
}

impl Message for EnrollmentResponse {
    const DECODE_ERROR: Error = Error::InvalidResponse;
}

impl EnrollmentResponse {
    pub(crate) fn validate(&self) -> Result<([u8; NONCE_LEN], Point, Point)> {
        Ok((
            nonce_from_slice(&self.ns)?,
            Point::unmarshal(&self.c0)?,
            Point::unmarshal(&self.c1)?,
        ))
    }
}

/// What the client stores for every enrolled password
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    /// Server nonce
    pub ns: Vec<u8>,
    /// Client nonce
    pub nc: Vec<u8>,
    /// `Hs0^x * Hc0^y`
    pub t0: Vec<u8>,
    /// `Hs1^x * Hc1^y * M^y`
    pub t1: Vec<u8>,
}

impl Message for EnrollmentRecord {
    const DECODE_ERROR: Error = Error::InvalidRecord;
}

pub(crate) struct ValidRecord {
    pub(crate) ns: [u8; NONCE_LEN],
    pub(crate) nc: [u8; NONCE_LEN],
    pub(crate) t0: Point,
    pub(crate) t1: Point,
}

impl EnrollmentRecord {
    pub(crate) fn validate(&self) -> Result<ValidRecord> {
        Ok(ValidRecord {
            ns: nonce_from_slice(&self.ns)?,
            nc: nonce_from_slice(&self.nc)?,
            t0: Point::unmarshal(&self.t0)?,
            t1: Point::unmarshal(&self.t1)?,
        })
    }
}

/// Client's request to check a password attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyPasswordRequest {
    /// `T0 / Hc0^y`, equal to `Hs0^x` iff the password is correct
    pub c0: Vec<u8>,
    /// Server nonce from the record
    pub ns: Vec<u8>,
}

impl Message for VerifyPasswordRequest {
    const DECODE_ERROR: Error = Error::InvalidRequest;
}

impl VerifyPasswordRequest {
    pub(crate) fn validate(&self) -> Result<([u8; NONCE_LEN], Point)> {
        Ok((nonce_from_slice(&self.ns)?, Point::unmarshal(&self.c0)?))
    }
}

/// Server's answer to a password check
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyPasswordResponse {
    /// Whether the password matched
    pub res: bool,
    /// `Hs1^x` on success, a random point on failure
    pub c1: Vec<u8>,
    /// Proof of the result
    pub proof: Proof,
}

impl Message for VerifyPasswordResponse {
    const DECODE_ERROR: Error = Error::InvalidResponse;
}

/// Outcome of a password check as seen by the server
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VerifyPasswordResult {
    /// Whether the password matched
    pub res: bool,
    /// Server nonce of the record that was checked
    pub salt: [u8; NONCE_LEN],
}

/// Scalars `a, b` that move keys and records from one server key to the next
#[derive(Clone, Serialize, Deserialize)]
pub struct UpdateToken {
    /// Multiplier
    pub a: Vec<u8>,
    /// Offset
    pub b: Vec<u8>,
}

impl Message for UpdateToken {
    const DECODE_ERROR: Error = Error::InvalidToken;
}

impl fmt::Debug for UpdateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateToken").finish_non_exhaustive()
    }
}

impl Drop for UpdateToken {
    fn drop(&mut self) {
        self.a.zeroize();
        self.b.zeroize();
    }
}

impl UpdateToken {
    pub(crate) fn validate(&self) -> Result<(Scalar, Scalar)> {
        let a = scalar_from_slice(&self.a).ok_or(Error::InvalidToken)?;
        let b = scalar_from_slice(&self.b).ok_or(Error::InvalidToken)?;
        if bool::from(a.is_zero()) {
            return Err(Error::InvalidToken);
        }
        Ok((a, b))
    }
}
