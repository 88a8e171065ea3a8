use core::fmt;

/// Errors that can occur during the protocol
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A curve point encoding was malformed, not on the curve, or the identity
    InvalidPoint,
    /// A nonce or scalar was not exactly 32 bytes long
    InvalidScalarLength,
    /// A Fiat-Shamir proof failed to verify, or was of the wrong kind for the result it accompanies
    InvalidProof,
    /// An enrollment record failed to decode or validate
    InvalidRecord,
    /// An update token failed to decode or validate
    InvalidToken,
    /// A verify password request failed to decode or validate
    InvalidRequest,
    /// An enrollment or verify password response failed to decode
    InvalidResponse,
    /// A private key was zero, out of range or otherwise malformed
    InvalidKey,
    /// The server attested, with a valid proof of failure, that the password did not match
    WrongPassword,
    /// A public key does not belong to its private key, or paired keys carry different versions
    KeyMismatch,
    /// An update token's version is not exactly one more than the version it is applied to
    VersionMismatch,
    /// A versioned key string was not of the form `PREFIX.version.base64`
    InvalidKeyString,
    /// A symmetric key was not exactly 32 bytes long
    InvalidKeyLength,
    /// A ciphertext was too short to contain the salt and tag
    InvalidCiphertext,
    /// Authenticated decryption failed
    DecryptionFailed,
    /// HKDF was asked for more output than it can produce
    Kdf,
    /// A message could not be serialized
    Encoding,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPoint => write!(f, "invalid curve point"),
            Error::InvalidScalarLength => write!(f, "nonce or scalar must be exactly 32 bytes"),
            Error::InvalidProof => write!(f, "proof verification failed"),
            Error::InvalidRecord => write!(f, "invalid enrollment record"),
            Error::InvalidToken => write!(f, "invalid update token"),
            Error::InvalidRequest => write!(f, "invalid password verify request"),
            Error::InvalidResponse => write!(f, "invalid server response"),
            Error::InvalidKey => write!(f, "invalid private key"),
            Error::WrongPassword => write!(f, "wrong password"),
            Error::KeyMismatch => write!(f, "public and private keys do not match"),
            Error::VersionMismatch => write!(
                f,
                "key version must be 1 less than update token version"
            ),
            Error::InvalidKeyString => write!(f, "invalid versioned key string"),
            Error::InvalidKeyLength => write!(f, "key must be exactly 32 bytes"),
            Error::InvalidCiphertext => write!(f, "invalid ciphertext length"),
            Error::DecryptionFailed => write!(f, "decryption failed"),
            Error::Kdf => write!(f, "invalid key derivation output length"),
            Error::Encoding => write!(f, "message encoding failed"),
        }
    }
}

impl std::error::Error for Error {}

/// Result type
pub type Result<T> = core::result::Result<T, Error>;
