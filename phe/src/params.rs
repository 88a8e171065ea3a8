//! Curve parameters and protocol domain tags, built once and shared by every
//! client and server.

use crate::gf::Gf;
use crate::point::{Point, POINT_LEN};
use crate::swu::Swu;
use num_bigint::BigUint;
use std::sync::Arc;

/// Prime of the NIST P-256 base field
pub(crate) const P256_P: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
];

/// Order of the NIST P-256 base point
pub(crate) const P256_N: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xbc, 0xe6, 0xfa, 0xad, 0xa7, 0x17, 0x9e, 0x84, 0xf3, 0xb9, 0xca, 0xc2, 0xfc, 0x63, 0x25, 0x51,
];

/// Coefficient `b` of the NIST P-256 curve equation
pub(crate) const P256_B: [u8; 32] = [
    0x5a, 0xc6, 0x35, 0xd8, 0xaa, 0x3a, 0x93, 0xe7, 0xb3, 0xeb, 0xbd, 0x55, 0x76, 0x98, 0x86, 0xbc,
    0x65, 0x1d, 0x06, 0xb0, 0xcc, 0x53, 0xb0, 0xf6, 0x3b, 0xce, 0x3c, 0x3e, 0x27, 0xd2, 0x60, 0x4b,
];

/// Length of a domain separation tag
pub const DOMAIN_LEN: usize = 8;

/// Common prefix of every domain separation tag: `VRGLPHE`
const DOMAIN_PREFIX: [u8; DOMAIN_LEN - 1] = *b"VRGLPHE";

const fn domain(suffix: u8) -> [u8; DOMAIN_LEN] {
    let mut tag = [0u8; DOMAIN_LEN];
    let mut i = 0;
    while i < DOMAIN_PREFIX.len() {
        tag[i] = DOMAIN_PREFIX[i];
        i += 1;
    }
    tag[DOMAIN_LEN - 1] = suffix;
    tag
}

/// Domain separation tags, one for every distinct use of a hash in the protocol
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProtocolDomains {
    /// Client point `Hc0`
    pub client0: [u8; DOMAIN_LEN],
    /// Client point `Hc1`
    pub client1: [u8; DOMAIN_LEN],
    /// Server point `Hs0`
    pub server0: [u8; DOMAIN_LEN],
    /// Server point `Hs1`
    pub server1: [u8; DOMAIN_LEN],
    /// Challenge of a proof of success
    pub proof_ok: [u8; DOMAIN_LEN],
    /// Challenge of a proof of failure
    pub proof_error: [u8; DOMAIN_LEN],
    /// HKDF info for [`encrypt`](crate::encrypt)/[`decrypt`](crate::decrypt)
    pub encrypt: [u8; DOMAIN_LEN],
    /// HKDF info when hashing to a scalar
    pub kdf_info_z: [u8; DOMAIN_LEN],
    /// HKDF info when deriving the client's symmetric key
    pub kdf_info_client_key: [u8; DOMAIN_LEN],
}

impl ProtocolDomains {
    /// The tags used by every deployed PHE service
    pub const DEFAULT: Self = Self {
        client0: domain(0x31),
        client1: domain(0x32),
        server0: domain(0x33),
        server1: domain(0x34),
        proof_ok: domain(0x35),
        proof_error: domain(0x36),
        encrypt: domain(0x37),
        kdf_info_z: domain(0x38),
        kdf_info_client_key: domain(0x39),
    };
}

impl Default for ProtocolDomains {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Constants of the NIST P-256 curve needed by the protocol
#[derive(Clone, Debug)]
pub struct CurveParams {
    swu: Swu,
    scalar_field: Gf,
    generator: [u8; POINT_LEN],
}

impl CurveParams {
    /// Precompute the P-256 parameters
    pub fn p256() -> Self {
        Self {
            swu: Swu::new(Gf::from_be_bytes(&P256_P), BigUint::from_bytes_be(&P256_B)),
            scalar_field: Gf::from_be_bytes(&P256_N),
            generator: Point::generator_bytes(),
        }
    }

    /// The hash-to-curve map
    pub fn swu(&self) -> &Swu {
        &self.swu
    }

    /// Arithmetic modulo the order `n` of the base point
    pub fn scalar_field(&self) -> &Gf {
        &self.scalar_field
    }

    /// Encoding of the base point `G`, as bound into every proof transcript
    pub fn generator_bytes(&self) -> &[u8; POINT_LEN] {
        &self.generator
    }
}

/// Everything a client or server needs besides its keys.
///
/// Construct it once and clone it into every component; the curve parameters
/// are shared, not copied.
#[derive(Clone, Debug)]
pub struct Context {
    curve: Arc<CurveParams>,
    domains: ProtocolDomains,
}

impl Context {
    /// Create a context for P-256 with the default domain tags
    pub fn new() -> Self {
        Self::with_domains(ProtocolDomains::DEFAULT)
    }

    /// Create a context for P-256 with custom domain tags
    pub fn with_domains(domains: ProtocolDomains) -> Self {
        Self {
            curve: Arc::new(CurveParams::p256()),
            domains,
        }
    }

    /// The curve parameters
    pub fn curve(&self) -> &CurveParams {
        &self.curve
    }

    /// The domain separation tags
    pub fn domains(&self) -> &ProtocolDomains {
        &self.domains
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
