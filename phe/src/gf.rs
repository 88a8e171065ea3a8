//! Arithmetic in a prime field `GF(p)`.
//!
//! Every result is reduced into `[0, p)`. The `*_bytes` variants accept a
//! big-endian byte string for their first operand so call sites holding wire
//! encodings don't have to convert first.

use num_bigint::BigUint;
use num_traits::Zero;

/// Galois field over a prime modulus
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gf {
    p: BigUint,
}

impl Gf {
    /// Create a field over the prime `p`
    pub fn new(p: BigUint) -> Self {
        Self { p }
    }

    /// Create a field from a big-endian encoding of its prime modulus
    pub fn from_be_bytes(p: &[u8]) -> Self {
        Self::new(BigUint::from_bytes_be(p))
    }

    /// The prime modulus `p`
    pub fn modulus(&self) -> &BigUint {
        &self.p
    }

    /// Reduce an arbitrary integer into `[0, p)`
    pub fn reduce(&self, a: &BigUint) -> BigUint {
        a % &self.p
    }

    /// `-a`
    pub fn neg(&self, a: &BigUint) -> BigUint {
        let a = self.reduce(a);
        if a.is_zero() {
            a
        } else {
            &self.p - a
        }
    }

    /// `-a` with `a` given as big-endian bytes
    pub fn neg_bytes(&self, a: &[u8]) -> BigUint {
        self.neg(&BigUint::from_bytes_be(a))
    }

    /// `a^2`
    pub fn square(&self, a: &BigUint) -> BigUint {
        self.mul(a, a)
    }

    /// `a^3`
    pub fn cube(&self, a: &BigUint) -> BigUint {
        self.mul(&self.square(a), a)
    }

    /// `a^b`
    pub fn pow(&self, a: &BigUint, b: &BigUint) -> BigUint {
        a.modpow(b, &self.p)
    }

    /// Multiplicative inverse `a^-1`, computed as `a^(p-2)`.
    ///
    /// Zero has no inverse; `inv(0)` returns zero.
    pub fn inv(&self, a: &BigUint) -> BigUint {
        let exponent = &self.p - BigUint::from(2u8);
        self.pow(a, &exponent)
    }

    /// `a^-1` with `a` given as big-endian bytes
    pub fn inv_bytes(&self, a: &[u8]) -> BigUint {
        self.inv(&BigUint::from_bytes_be(a))
    }

    /// `a + b`
    pub fn add(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a + b) % &self.p
    }

    /// `a + b` with `a` given as big-endian bytes
    pub fn add_bytes(&self, a: &[u8], b: &BigUint) -> BigUint {
        self.add(&BigUint::from_bytes_be(a), b)
    }

    /// `a - b`
    pub fn sub(&self, a: &BigUint, b: &BigUint) -> BigUint {
        self.add(a, &self.neg(b))
    }

    /// `a * b`
    pub fn mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &self.p
    }

    /// `a * b` with `a` given as big-endian bytes
    pub fn mul_bytes(&self, a: &[u8], b: &BigUint) -> BigUint {
        self.mul(&BigUint::from_bytes_be(a), b)
    }

    /// `a / b`, i.e. `a * b^-1`
    pub fn div(&self, a: &BigUint, b: &BigUint) -> BigUint {
        self.mul(a, &self.inv(b))
    }
}
