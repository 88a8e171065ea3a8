#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg",
    html_favicon_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg"
)]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

//! # Usage
//! Add `phe` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! phe = "0.1"
//! ```
//!
//! Next read documentation for [`client`](client/index.html) and
//! [`server`](server/index.html) modules.
//!
//! # Protocol description
//! PHE splits password checking between a client, which stores the records,
//! and a server, which holds a private key but never sees passwords or records.
//! Neither can check a password, or recover the key protecting a user's data,
//! without the other. All arithmetic is done on the NIST P-256 curve with base
//! point `G` and order `n`; `Hs0`, `Hs1`, `Hc0`, `Hc1` are points obtained by
//! hashing onto the curve under distinct domain tags.
//!
//! |       Server                    |   Data transfer        |      Client                       |
//! |---------------------------------|------------------------|-----------------------------------|
//! |                                 | Enrollment             |                                   |
//! |`ns = ${0,1}^256`                |                        |                                   |
//! |`Hs0 = H(ns)`, `Hs1 = H'(ns)`    |                        |                                   |
//! |`C0 = Hs0^x`, `C1 = Hs1^x`       |`ns, C0, C1, proof` ->  |verify `proof`                     |
//! |                                 |                        |`nc = ${0,1}^256`, `M = ${G}`      |
//! |                                 |                        |`T0 = C0 * Hc0(nc, pw)^y`          |
//! |                                 |                        |`T1 = C1 * Hc1(nc, pw)^y * M^y`    |
//! |                                 |                        |store `ns, nc, T0, T1`; `K=KDF(M)` |
//! |                                 | Verification           |                                   |
//! |                                 | <- `ns, C0`            |`C0 = T0 / Hc0(nc, pw)^y`          |
//! |if `C0 == Hs0^x`: `C1 = Hs1^x`   |`C1, proof of success`->|`M = (T1 / C1 / Hc1^y)^(1/y)`      |
//! |else `C1 = (C0 / Hs0^x)^r`       |`C1, proof of failure`->|wrong password                     |
//! |                                 | Rotation               |                                   |
//! |`a, b = ${1..n}`, `x' = x*a + b` | `a, b` ->              |`y' = y*a`, `X' = X^a * G^b`       |
//! |                                 |                        |`T0' = T0^a * Hs0^b`               |
//! |                                 |                        |`T1' = T1^a * Hs1^b`               |
//!
//! Variables and notations have the following meaning:
//!
//! - `x`, `X = G^x`: the server's private and public key
//! - `y`: the client's private key
//! - `ns`, `nc`: server and client nonces
//! - `pw`: the password
//! - `M`: a random point, the secret from which the data encryption key `K` is derived
//! - `proof`: a non-interactive zero knowledge proof that the server used `x`
//! - `a`, `b`: the update token
//! - `${a..b}`: pick a number between `a` and `b`
//! - `^`: Curve point multiplication
//! - `*`: Scalar value multiplication, or point addition between points

mod errors;
mod utils;

/// Module containing the implementation of the client for the PHE protocol
pub mod client;

/// Module containing the implementation of the server for the PHE protocol
pub mod server;

/// Module containing the protocol messages
pub mod messages;

pub mod aead;
pub mod gf;
pub mod params;
pub mod point;
pub mod swu;
pub mod versioned;

pub use self::{
    aead::{decrypt, encrypt},
    client::{generate_client_key, rotate_client_keys, PheClient},
    errors::{Error, Result},
    messages::{
        EnrollmentRecord, EnrollmentResponse, Keypair, Message, Proof, ProofOfFail,
        ProofOfSuccess, UpdateToken, VerifyPasswordRequest, VerifyPasswordResponse,
        VerifyPasswordResult,
    },
    params::{Context, CurveParams, ProtocolDomains},
    point::Point,
    server::{update_record, PheServer},
    utils::{CLIENT_KEY_LEN, NONCE_LEN, SCALAR_LEN},
    versioned::{
        rotate_versioned_keys, update_versioned_record, KeyKind, VersionedKey, VersionedRecord,
    },
};

/// Default Server instantiation with OsRng
#[cfg(feature = "getrandom")]
pub type Server = PheServer<rand_core::OsRng>;

/// Default Client instantiation with OsRng
#[cfg(feature = "getrandom")]
pub type Client = PheClient<rand_core::OsRng>;
