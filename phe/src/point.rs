//! NIST P-256 group elements and their 65 byte uncompressed SEC1 encoding.

use crate::{Error, Result};
use core::ops::{Add, Mul, Neg, Sub};
use num_bigint::BigUint;
use p256::elliptic_curve::group::Group;
use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

/// Length of an uncompressed point encoding: `0x04 || X || Y`
pub const POINT_LEN: usize = 65;

const COORDINATE_LEN: usize = 32;

/// A point on the P-256 curve
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Point(ProjectivePoint);

impl Point {
    /// The base point `G`
    pub fn generator() -> Self {
        Self(ProjectivePoint::GENERATOR)
    }

    /// Uncompressed encoding of the base point `G`
    pub fn generator_bytes() -> [u8; POINT_LEN] {
        let encoded = AffinePoint::GENERATOR.to_encoded_point(false);
        let mut bytes = [0u8; POINT_LEN];
        bytes.copy_from_slice(encoded.as_bytes());
        bytes
    }

    /// Build a point from its affine coordinates, checking that it lies on the curve
    pub fn from_coordinates(x: &BigUint, y: &BigUint) -> Result<Self> {
        let encoded =
            EncodedPoint::from_affine_coordinates(&field_bytes(x)?, &field_bytes(y)?, false);
        Self::from_encoded(&encoded)
    }

    /// Decode a 65 byte uncompressed encoding.
    ///
    /// Any other length, a compressed or identity encoding, and coordinates that
    /// are not on the curve are rejected with [`Error::InvalidPoint`].
    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        if data.len() != POINT_LEN || data[0] != 0x04 {
            return Err(Error::InvalidPoint);
        }
        let encoded = EncodedPoint::from_bytes(data).map_err(|_| Error::InvalidPoint)?;
        Self::from_encoded(&encoded)
    }

    fn from_encoded(encoded: &EncodedPoint) -> Result<Self> {
        let affine: Option<AffinePoint> = AffinePoint::from_encoded_point(encoded).into();
        affine
            .map(|p| Self(ProjectivePoint::from(p)))
            .ok_or(Error::InvalidPoint)
    }

    /// Encode as `0x04 || X || Y`.
    ///
    /// The identity has no such encoding and yields [`Error::InvalidPoint`].
    pub fn marshal(&self) -> Result<[u8; POINT_LEN]> {
        let encoded = self.0.to_affine().to_encoded_point(false);
        encoded
            .as_bytes()
            .try_into()
            .map_err(|_| Error::InvalidPoint)
    }

    /// `G^k`
    pub fn scalar_base_mult(k: &Scalar) -> Self {
        Self(ProjectivePoint::GENERATOR * k)
    }

    /// Whether this is the point at infinity
    pub fn is_identity(&self) -> bool {
        self.0.is_identity().into()
    }
}

fn field_bytes(coordinate: &BigUint) -> Result<FieldBytes> {
    let bytes = coordinate.to_bytes_be();
    if bytes.len() > COORDINATE_LEN {
        return Err(Error::InvalidPoint);
    }
    let mut padded = FieldBytes::default();
    padded[COORDINATE_LEN - bytes.len()..].copy_from_slice(&bytes);
    Ok(padded)
}

impl ConstantTimeEq for Point {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl Zeroize for Point {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point(self.0 + rhs.0)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point(self.0 - rhs.0)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point(-self.0)
    }
}

impl Mul<&Scalar> for Point {
    type Output = Point;

    fn mul(self, k: &Scalar) -> Point {
        Point(self.0 * k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::elliptic_curve::Field;
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_marshal_round_trip() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);

        for _ in 0..64 {
            let p = Point::scalar_base_mult(&Scalar::random(&mut rng));
            let bytes = p.marshal().unwrap();
            assert_eq!(bytes[0], 0x04);
            assert_eq!(Point::unmarshal(&bytes).unwrap(), p);
        }
    }

    #[test]
    fn test_unmarshal_rejects_malformed() {
        let g = Point::generator_bytes();

        assert_eq!(Point::unmarshal(&g[..64]), Err(Error::InvalidPoint));
        assert_eq!(Point::unmarshal(&[0u8]), Err(Error::InvalidPoint));
        assert_eq!(Point::unmarshal(&[]), Err(Error::InvalidPoint));

        let mut compressed = [0u8; 33];
        compressed.copy_from_slice(&g[..33]);
        compressed[0] = 0x02;
        assert_eq!(Point::unmarshal(&compressed), Err(Error::InvalidPoint));

        let mut bad_tag = g;
        bad_tag[0] = 0x05;
        assert_eq!(Point::unmarshal(&bad_tag), Err(Error::InvalidPoint));

        let mut off_curve = g;
        off_curve[64] ^= 0x01;
        assert_eq!(Point::unmarshal(&off_curve), Err(Error::InvalidPoint));
    }

    #[test]
    fn test_identity_does_not_marshal() {
        let g = Point::generator();
        let identity = g + (-g);

        assert!(identity.is_identity());
        assert!(!g.is_identity());
        assert_eq!(identity.marshal(), Err(Error::InvalidPoint));
        assert_eq!(
            Point(ProjectivePoint::IDENTITY).marshal(),
            Err(Error::InvalidPoint)
        );
    }

    #[test]
    fn test_group_operations() {
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let a = Scalar::random(&mut rng);
        let b = Scalar::random(&mut rng);
        let g = Point::generator();

        assert_eq!(g * &a + g * &b, Point::scalar_base_mult(&(a + b)));
        assert_eq!(g * &a - g * &b, Point::scalar_base_mult(&(a - b)));
        assert_eq!(-(g * &a), Point::scalar_base_mult(&(-a)));
        assert!(bool::from((g * &a).ct_eq(&Point::scalar_base_mult(&a))));
        assert!(!bool::from((g * &a).ct_eq(&(g * &b))));
        assert_eq!(Point::generator().marshal().unwrap(), Point::generator_bytes());
    }

    #[test]
    fn test_zeroize_resets_to_identity() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let mut secret = Point::scalar_base_mult(&Scalar::random(&mut rng));
        assert!(!secret.is_identity());

        secret.zeroize();
        assert!(secret.is_identity());
        assert_eq!(secret.marshal(), Err(Error::InvalidPoint));
    }

    #[test]
    fn test_from_coordinates() {
        let g = Point::generator_bytes();
        let x = BigUint::from_bytes_be(&g[1..33]);
        let y = BigUint::from_bytes_be(&g[33..]);

        assert_eq!(Point::from_coordinates(&x, &y).unwrap(), Point::generator());
        assert_eq!(
            Point::from_coordinates(&x, &(y + 1u8)),
            Err(Error::InvalidPoint)
        );
    }
}
