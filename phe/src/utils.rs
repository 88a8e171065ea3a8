use crate::params::Context;
use crate::point::Point;
use crate::swu::POINT_HASH_LEN;
use crate::{Error, Result};
use hkdf::Hkdf;
use p256::elliptic_curve::bigint::U256;
use p256::elliptic_curve::ops::Reduce;
use p256::elliptic_curve::PrimeField;
use p256::{FieldBytes, NonZeroScalar, Scalar};
use rand_core::CryptoRngCore;
use sha2::digest::Output;
use sha2::{Digest, Sha512};
use zeroize::Zeroize;

/// Length of the server and client nonces
pub const NONCE_LEN: usize = 32;

/// Length of a scalar on the wire
pub const SCALAR_LEN: usize = 32;

/// Length of the symmetric key handed to the client
pub const CLIENT_KEY_LEN: usize = 32;

// Candidates drawn by `hash_z` before falling back to a modular reduction
const HASH_Z_CANDIDATES: usize = 8;

/// Generate a fixed length nonce using a CSPRNG
#[inline(always)]
pub(crate) fn generate_nonce<CSPRNG, const N: usize>(rng: &mut CSPRNG) -> [u8; N]
where
    CSPRNG: CryptoRngCore,
{
    let mut nonce = [0; N];
    rng.fill_bytes(&mut nonce);
    nonce
}

/// SHA-512 over `domain || parts[0] || parts[1] || ...`
pub(crate) fn hash(domain: &[u8], parts: &[&[u8]]) -> Output<Sha512> {
    let mut hasher = Sha512::new();
    hasher.update(domain);
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize()
}

/// Hash `parts` to a scalar modulo the group order.
///
/// The parts are hashed without a domain and fed to HKDF-SHA-512 as input key
/// material, salted with `domain`. Consecutive 32 byte blocks of the HKDF
/// output are read until one is below `n`.
pub(crate) fn hash_z(domain: &[u8], info: &[u8], parts: &[&[u8]]) -> Result<Scalar> {
    let ikm = hash(&[], parts);
    let kdf = Hkdf::<Sha512>::new(Some(domain), &ikm);

    let mut okm = [0u8; SCALAR_LEN * HASH_Z_CANDIDATES];
    kdf.expand(info, &mut okm).map_err(|_| Error::Kdf)?;

    let mut candidate = FieldBytes::default();
    for chunk in okm.chunks_exact(SCALAR_LEN) {
        candidate.copy_from_slice(chunk);
        if let Some(z) = Option::<Scalar>::from(Scalar::from_repr(candidate)) {
            return Ok(z);
        }
    }
    Ok(<Scalar as Reduce<U256>>::reduce_bytes(&candidate))
}

/// Uniformly random nonzero scalar
pub(crate) fn random_z<CSPRNG: CryptoRngCore>(rng: &mut CSPRNG) -> Scalar {
    *NonZeroScalar::random(rng)
}

/// Parse a 32 byte big-endian scalar, rejecting values not below `n`
pub(crate) fn scalar_from_slice(bytes: &[u8]) -> Option<Scalar> {
    let bytes: [u8; SCALAR_LEN] = bytes.try_into().ok()?;
    Scalar::from_repr(FieldBytes::from(bytes)).into()
}

/// Parse a nonzero private scalar of at most 32 bytes, left padding shorter encodings
pub(crate) fn private_scalar_from_slice(bytes: &[u8]) -> Result<Scalar> {
    if bytes.is_empty() || bytes.len() > SCALAR_LEN {
        return Err(Error::InvalidKey);
    }
    let mut repr = FieldBytes::default();
    repr[SCALAR_LEN - bytes.len()..].copy_from_slice(bytes);

    let key: Option<NonZeroScalar> = NonZeroScalar::from_repr(repr).into();
    key.map(|k| *k).ok_or(Error::InvalidKey)
}

/// Fixed width encoding of a scalar
pub(crate) fn scalar_to_bytes(z: &Scalar) -> [u8; SCALAR_LEN] {
    z.to_repr().into()
}

/// Hash `domain || parts` and map the first 32 bytes of the digest onto the curve
pub(crate) fn hash_to_point(ctx: &Context, domain: &[u8], parts: &[&[u8]]) -> Result<Point> {
    let digest = hash(domain, parts);
    let mut truncated = [0u8; POINT_HASH_LEN];
    truncated.copy_from_slice(&digest[..POINT_HASH_LEN]);

    let (x, y) = ctx.curve().swu().hash_to_point(&truncated);
    Point::from_coordinates(&x, &y)
}

/// Derive the client's symmetric key from the secret point `M`
pub(crate) fn derive_client_key(ctx: &Context, m: &Point) -> Result<[u8; CLIENT_KEY_LEN]> {
    let mut ikm = m.marshal()?;
    let kdf = Hkdf::<Sha512>::new(None, &ikm);
    ikm.zeroize();

    let mut key = [0u8; CLIENT_KEY_LEN];
    kdf.expand(&ctx.domains().kdf_info_client_key, &mut key)
        .map_err(|_| Error::Kdf)?;
    Ok(key)
}
