//! Simplified Shallue-van de Woestijne-Ulas map from a 32-byte digest to a
//! point on a short Weierstrass curve `y^2 = x^3 + ax + b` with `p = 3 mod 4`.
//!
//! The map is deterministic, so nobody can choose which point a given input
//! lands on, nor learn a discrete-log relation between two such points.

use crate::gf::Gf;
use num_bigint::BigUint;
use num_traits::One;
use sha2::{Digest, Sha512};

/// Length of a digest accepted by [`Swu::hash_to_point`]
pub const POINT_HASH_LEN: usize = 32;

/// Precomputed curve constants for the map
#[derive(Clone, Debug)]
pub struct Swu {
    gf: Gf,
    a: BigUint,
    b: BigUint,
    // -b / a
    mba: BigUint,
    // (p - 3) / 4
    p34: BigUint,
    // (p + 1) / 4
    p14: BigUint,
}

impl Swu {
    /// Precompute the constants for the curve `y^2 = x^3 - 3x + b` over `GF(p)`
    pub fn new(gf: Gf, b: BigUint) -> Self {
        let a = gf.neg(&BigUint::from(3u8));
        let mba = gf.neg(&gf.div(&b, &a));
        let p34 = &a >> 2;
        let p14 = (gf.modulus() + BigUint::one()) >> 2;

        Self {
            gf,
            a,
            b,
            mba,
            p34,
            p14,
        }
    }

    /// The base field the map works in
    pub fn field(&self) -> &Gf {
        &self.gf
    }

    /// Map a 32 byte hash to the affine coordinates of a point on the curve
    pub fn hash_to_point(&self, hash: &[u8; POINT_HASH_LEN]) -> (BigUint, BigUint) {
        let gf = &self.gf;
        let t = BigUint::from_bytes_be(hash);

        // alpha = -t^2
        let alpha = gf.neg(&gf.square(&t));
        let asqa = gf.add(&gf.square(&alpha), &alpha);
        let asqa1 = gf.add(&BigUint::one(), &gf.inv(&asqa));

        // x2 = -(b / a) * (1 + 1 / (alpha^2 + alpha))
        let x2 = gf.mul(&self.mba, &asqa1);
        // x3 = alpha * x2
        let x3 = gf.mul(&alpha, &x2);

        // h2 = x2^3 + a*x2 + b
        let h2 = gf.add(&gf.add(&gf.cube(&x2), &gf.mul(&self.a, &x2)), &self.b);
        // h3 = x3^3 + a*x3 + b
        let h3 = gf.add(&gf.add(&gf.cube(&x3), &gf.mul(&self.a, &x3)), &self.b);

        // tmp = h2 ^ ((p - 3) / 4)
        let tmp = gf.pow(&h2, &self.p34);

        if gf.mul(&gf.square(&tmp), &h2).is_one() {
            (x2, gf.mul(&tmp, &h2))
        } else {
            (x3, gf.pow(&h3, &self.p14))
        }
    }

    /// Hash arbitrary data with SHA-512 and map the first 32 bytes of the digest to the curve
    pub fn data_to_point(&self, data: &[u8]) -> (BigUint, BigUint) {
        let digest = Sha512::digest(data);
        let mut hash = [0u8; POINT_HASH_LEN];
        hash.copy_from_slice(&digest[..POINT_HASH_LEN]);
        self.hash_to_point(&hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{P256_B, P256_P};
    use rand_chacha::rand_core::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    fn p256() -> Swu {
        Swu::new(Gf::from_be_bytes(&P256_P), BigUint::from_bytes_be(&P256_B))
    }

    fn on_curve(swu: &Swu, x: &BigUint, y: &BigUint) -> bool {
        let gf = swu.field();
        let rhs = gf.add(&gf.add(&gf.cube(x), &gf.mul(&swu.a, x)), &swu.b);
        gf.square(y) == rhs
    }

    #[test]
    fn test_hash_to_point_lands_on_curve() {
        let swu = p256();
        let mut rng = ChaCha20Rng::seed_from_u64(0x5755);
        let mut hash = [0u8; POINT_HASH_LEN];

        for _ in 0..10_000 {
            rng.fill_bytes(&mut hash);
            let (x, y) = swu.hash_to_point(&hash);
            assert!(on_curve(&swu, &x, &y), "{}", hex::encode(hash));
        }
    }

    #[test]
    fn test_hash_to_point_is_deterministic() {
        let swu = p256();
        let hash = [0x42u8; POINT_HASH_LEN];

        assert_eq!(swu.hash_to_point(&hash), swu.hash_to_point(&hash));
        assert_ne!(swu.hash_to_point(&hash), swu.hash_to_point(&[0x43; POINT_HASH_LEN]));
    }

    #[test]
    fn test_data_to_point() {
        let swu = p256();
        let (x, y) = swu.data_to_point(b"correct horse battery staple");

        assert!(on_curve(&swu, &x, &y));
        assert_eq!((x, y), swu.data_to_point(b"correct horse battery staple"));
    }

    #[test]
    fn test_constants() {
        let swu = p256();
        let p = swu.field().modulus();

        assert_eq!(&swu.a + BigUint::from(3u8), *p);
        assert_eq!((&swu.p34 << 2) + BigUint::from(3u8), *p);
        assert_eq!((&swu.p14 << 2) - BigUint::one(), *p);
    }
}
