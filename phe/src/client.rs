use crate::messages::{
    EnrollmentRecord, EnrollmentResponse, Message, Proof, ProofOfFail, ProofOfSuccess,
    UpdateToken, VerifyPasswordRequest, VerifyPasswordResponse,
};
use crate::params::Context;
use crate::point::{Point, POINT_LEN};
use crate::swu::POINT_HASH_LEN;
use crate::utils::{
    derive_client_key, generate_nonce, hash_to_point, hash_z, private_scalar_from_slice,
    random_z, scalar_to_bytes, CLIENT_KEY_LEN, NONCE_LEN, SCALAR_LEN,
};
use crate::{Error, Result};
use p256::Scalar;
use rand_core::CryptoRngCore;
use zeroize::Zeroize;

/// Generate a new random client private key
pub fn generate_client_key<CSPRNG: CryptoRngCore>(rng: &mut CSPRNG) -> [u8; SCALAR_LEN] {
    scalar_to_bytes(&random_z(rng))
}

/// Implementation of the client side of the PHE protocol
///
/// The client holds its private key `y` and the server's public key `X`. It
/// turns enrollment responses into records, and turns a record plus a password
/// attempt into a request for the server and, given the server's answer, into
/// the record's symmetric key.
pub struct PheClient<CSPRNG>
where
    CSPRNG: CryptoRngCore,
{
    /// The CSPRNG used to generate random values where needed
    rng: CSPRNG,

    ctx: Context,

    private_key: Scalar,

    /// `-y`
    neg_key: Scalar,

    /// `y^-1`
    inv_key: Scalar,

    server_public_key: Point,

    server_public_key_bytes: [u8; POINT_LEN],
}

impl<CSPRNG> PheClient<CSPRNG>
where
    CSPRNG: CryptoRngCore,
{
    /// Create a new client
    ///
    /// # Arguments:
    /// - `rng`: the CSPRNG used for nonces and the data encryption secret
    /// - `server_public_key`: the server's uncompressed public key
    /// - `private_key`: the client's private key, as returned by [`generate_client_key`]
    ///
    /// # Return:
    /// - Ok(`client`)
    /// - Err([`Error::InvalidPoint`]): the public key is malformed
    /// - Err([`Error::InvalidKey`]): the private key is zero, too long or not below the group order
    ///
    pub fn new(rng: CSPRNG, server_public_key: &[u8], private_key: &[u8]) -> Result<Self> {
        Self::with_context(Context::new(), rng, server_public_key, private_key)
    }

    /// Create a new client sharing an existing [`Context`]
    pub fn with_context(
        ctx: Context,
        rng: CSPRNG,
        server_public_key: &[u8],
        private_key: &[u8],
    ) -> Result<Self> {
        let server_public_key = Point::unmarshal(server_public_key)?;
        let private_key = private_scalar_from_slice(private_key)?;

        let mut client = Self {
            rng,
            ctx,
            private_key: Scalar::ZERO,
            neg_key: Scalar::ZERO,
            inv_key: Scalar::ZERO,
            server_public_key,
            server_public_key_bytes: server_public_key.marshal()?,
        };
        client.set_private_key(private_key)?;
        Ok(client)
    }

    fn set_private_key(&mut self, private_key: Scalar) -> Result<()> {
        let inv_key: Option<Scalar> = private_key.invert().into();
        self.inv_key = inv_key.ok_or(Error::InvalidKey)?;
        self.neg_key = -private_key;
        self.private_key = private_key;
        Ok(())
    }

    /// The client's current private key
    pub fn private_key(&self) -> [u8; SCALAR_LEN] {
        scalar_to_bytes(&self.private_key)
    }

    /// The server public key the client currently trusts
    pub fn server_public_key(&self) -> &[u8; POINT_LEN] {
        &self.server_public_key_bytes
    }

    /// Enroll a password using a fresh enrollment response from the server
    ///
    /// # Arguments:
    /// - `password`: the password, or a hash of it
    /// - `response`: a serialized [`EnrollmentResponse`]
    ///
    /// # Return:
    /// (`record`, `key`):
    /// - `record`: a serialized [`EnrollmentRecord`] to be stored by the client
    /// - `key`: a symmetric key which can only be recovered again with the password
    ///   and the server's cooperation
    ///
    /// Fails with [`Error::InvalidProof`] if the server cannot prove the response
    /// was computed with its private key.
    ///
    pub fn enroll_account(
        &mut self,
        password: &[u8],
        response: &[u8],
    ) -> Result<(Vec<u8>, [u8; CLIENT_KEY_LEN])> {
        let response = EnrollmentResponse::from_bytes(response)?;
        let (ns, c0, c1) = response.validate()?;
        self.verify_proof_of_success(&response.proof, &ns, &c0, &c1)?;

        let domains = self.ctx.domains();
        let nc: [u8; NONCE_LEN] = generate_nonce(&mut self.rng);
        let hc0 = hash_to_point(&self.ctx, &domains.client0, &[&nc, password])?;
        let hc1 = hash_to_point(&self.ctx, &domains.client1, &[&nc, password])?;

        // the data encryption secret in the form of a random point
        let mut seed: [u8; POINT_HASH_LEN] = generate_nonce(&mut self.rng);
        let m = hash_to_point(&self.ctx, &seed, &[]);
        seed.zeroize();
        let mut m = m?;

        let t0 = c0 + hc0 * &self.private_key;
        let t1 = c1 + hc1 * &self.private_key + m * &self.private_key;

        let key = derive_client_key(&self.ctx, &m);
        m.zeroize();
        let key = key?;

        let record = EnrollmentRecord {
            ns: ns.to_vec(),
            nc: nc.to_vec(),
            t0: t0.marshal()?.to_vec(),
            t1: t1.marshal()?.to_vec(),
        };
        Ok((record.to_bytes()?, key))
    }

    /// Create a request asking the server to check a password attempt against a record
    ///
    /// The request looks the same whether or not the password is right.
    ///
    pub fn create_verify_password_request(
        &self,
        password: &[u8],
        record: &[u8],
    ) -> Result<Vec<u8>> {
        let record = EnrollmentRecord::from_bytes(record)?.validate()?;
        let hc0 = hash_to_point(&self.ctx, &self.ctx.domains().client0, &[&record.nc, password])?;

        let c0 = record.t0 + hc0 * &self.neg_key;

        VerifyPasswordRequest {
            c0: c0.marshal()?.to_vec(),
            ns: record.ns.to_vec(),
        }
        .to_bytes()
    }

    /// Check the server's answer to a password check and recover the record's key
    ///
    /// # Return:
    /// - Ok(`key`): the password was right, and the key is the one returned at enrollment
    /// - Err([`Error::WrongPassword`]): the server proved that the password was wrong
    /// - Err([`Error::InvalidProof`]): the server's proof of either outcome did not verify
    ///
    pub fn check_response_and_decrypt(
        &self,
        password: &[u8],
        record: &[u8],
        response: &[u8],
    ) -> Result<[u8; CLIENT_KEY_LEN]> {
        let record = EnrollmentRecord::from_bytes(record)?.validate()?;
        let response = VerifyPasswordResponse::from_bytes(response)?;
        let c1 = Point::unmarshal(&response.c1)?;

        let domains = self.ctx.domains();
        let hc0 = hash_to_point(&self.ctx, &domains.client0, &[&record.nc, password])?;
        let hc1 = hash_to_point(&self.ctx, &domains.client1, &[&record.nc, password])?;

        let c0 = record.t0 + hc0 * &self.neg_key;

        match (response.res, &response.proof) {
            (true, Proof::Success(proof)) => {
                self.verify_proof_of_success(proof, &record.ns, &c0, &c1)?;

                let mut m = (record.t1 - c1 + hc1 * &self.neg_key) * &self.inv_key;
                let key = derive_client_key(&self.ctx, &m);
                m.zeroize();
                key
            }
            (false, Proof::Fail(proof)) => {
                let hs0 = hash_to_point(&self.ctx, &domains.server0, &[&record.ns])?;
                self.verify_proof_of_fail(proof, &c0, &c1, &hs0)?;
                Err(Error::WrongPassword)
            }
            _ => Err(Error::InvalidProof),
        }
    }

    /// Move to the server's next key pair using the update token it issued
    ///
    /// Records must be moved with [`update_record`](crate::update_record) using the same token.
    ///
    pub fn rotate(&mut self, token: &[u8]) -> Result<()> {
        let (a, b) = UpdateToken::from_bytes(token)?.validate()?;
        let (private_key, public_key) =
            rotate_keys(&self.private_key, &self.server_public_key, &a, &b);

        self.server_public_key_bytes = public_key.marshal()?;
        self.server_public_key = public_key;
        self.set_private_key(private_key)
    }

    fn verify_proof_of_success(
        &self,
        proof: &ProofOfSuccess,
        ns: &[u8; NONCE_LEN],
        c0: &Point,
        c1: &Point,
    ) -> Result<()> {
        let valid = proof.validate()?;
        let domains = self.ctx.domains();

        let hs0 = hash_to_point(&self.ctx, &domains.server0, &[ns])?;
        let hs1 = hash_to_point(&self.ctx, &domains.server1, &[ns])?;

        let challenge = hash_z(
            &domains.proof_ok,
            &domains.kdf_info_z,
            &[
                &self.server_public_key_bytes,
                self.ctx.curve().generator_bytes(),
                &c0.marshal()?,
                &c1.marshal()?,
                &proof.term1,
                &proof.term2,
                &proof.term3,
            ],
        )?;

        // term1 * c0^challenge == hs0^blind_x
        let ok = valid.term1 + *c0 * &challenge == hs0 * &valid.blind_x
            // term2 * c1^challenge == hs1^blind_x
            && valid.term2 + *c1 * &challenge == hs1 * &valid.blind_x
            // term3 * X^challenge == G^blind_x
            && valid.term3 + self.server_public_key * &challenge
                == Point::scalar_base_mult(&valid.blind_x);

        if ok {
            Ok(())
        } else {
            Err(Error::InvalidProof)
        }
    }

    fn verify_proof_of_fail(
        &self,
        proof: &ProofOfFail,
        c0: &Point,
        c1: &Point,
        hs0: &Point,
    ) -> Result<()> {
        let valid = proof.validate()?;
        let domains = self.ctx.domains();

        let challenge = hash_z(
            &domains.proof_error,
            &domains.kdf_info_z,
            &[
                &self.server_public_key_bytes,
                self.ctx.curve().generator_bytes(),
                &c0.marshal()?,
                &c1.marshal()?,
                &proof.term1,
                &proof.term2,
                &proof.term3,
                &proof.term4,
            ],
        )?;

        // term1 * term2 * c1^challenge == c0^blind_a * hs0^blind_b
        let ok = valid.term1 + valid.term2 + *c1 * &challenge
            == *c0 * &valid.blind_a + *hs0 * &valid.blind_b
            // term3 * term4 == X^blind_a * G^blind_b
            && valid.term3 + valid.term4
                == self.server_public_key * &valid.blind_a
                    + Point::scalar_base_mult(&valid.blind_b);

        if ok {
            Ok(())
        } else {
            Err(Error::InvalidProof)
        }
    }
}

impl<CSPRNG> Drop for PheClient<CSPRNG>
where
    CSPRNG: CryptoRngCore,
{
    fn drop(&mut self) {
        self.private_key.zeroize();
        self.neg_key.zeroize();
        self.inv_key.zeroize();
    }
}

// y' = y * a, X' = X^a * G^b
fn rotate_keys(
    private_key: &Scalar,
    public_key: &Point,
    a: &Scalar,
    b: &Scalar,
) -> (Scalar, Point) {
    (private_key * a, *public_key * a + Point::scalar_base_mult(b))
}

/// Compute the client's keys after a server rotation, without a client instance
///
/// # Arguments:
/// - `server_public_key`: the server's current public key
/// - `client_private_key`: the client's current private key
/// - `token`: a serialized [`UpdateToken`]
///
/// # Return:
/// (`new_client_private_key`, `new_server_public_key`)
///
pub fn rotate_client_keys(
    server_public_key: &[u8],
    client_private_key: &[u8],
    token: &[u8],
) -> Result<([u8; SCALAR_LEN], [u8; POINT_LEN])> {
    let (a, b) = UpdateToken::from_bytes(token)?.validate()?;
    let public_key = Point::unmarshal(server_public_key)?;
    let mut private_key = private_scalar_from_slice(client_private_key)?;

    let (mut new_private_key, new_public_key) = rotate_keys(&private_key, &public_key, &a, &b);
    let rotated = (scalar_to_bytes(&new_private_key), new_public_key.marshal()?);

    private_key.zeroize();
    new_private_key.zeroize();
    Ok(rotated)
}
