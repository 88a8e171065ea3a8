use crate::messages::{
    EnrollmentRecord, EnrollmentResponse, Keypair, Message, Proof, ProofOfFail, ProofOfSuccess,
    ServerKeypair, UpdateToken, VerifyPasswordRequest, VerifyPasswordResponse,
    VerifyPasswordResult,
};
use crate::params::Context;
use crate::point::Point;
use crate::utils::{generate_nonce, hash_to_point, hash_z, random_z, scalar_to_bytes, NONCE_LEN};
use crate::Result;
use rand_core::CryptoRngCore;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// Implementation of the server side of the PHE protocol
///
/// The server is stateless apart from its CSPRNG; its key pair is passed to
/// every call in serialized form, as produced by
/// [`generate_server_keypair`](PheServer::generate_server_keypair).
pub struct PheServer<CSPRNG>
where
    CSPRNG: CryptoRngCore,
{
    /// The CSPRNG used to generate random values where needed
    rng: CSPRNG,

    ctx: Context,
}

impl<CSPRNG> PheServer<CSPRNG>
where
    CSPRNG: CryptoRngCore,
{
    /// Create a new server
    pub fn new(rng: CSPRNG) -> Self {
        Self::with_context(Context::new(), rng)
    }

    /// Create a new server sharing an existing [`Context`]
    pub fn with_context(ctx: Context, rng: CSPRNG) -> Self {
        Self { rng, ctx }
    }

    /// Generate a new long-term key pair
    ///
    /// # Return:
    /// a serialized [`Keypair`]
    ///
    pub fn generate_server_keypair(&mut self) -> Result<Vec<u8>> {
        let private_key = random_z(&mut self.rng);
        let public_key = Point::scalar_base_mult(&private_key);

        Keypair {
            public_key: public_key.marshal()?.to_vec(),
            private_key: scalar_to_bytes(&private_key).to_vec(),
        }
        .to_bytes()
    }

    /// The public key of a serialized key pair, for distribution to clients
    pub fn get_public_key(&self, keypair: &[u8]) -> Result<Vec<u8>> {
        let keypair = Keypair::from_bytes(keypair)?;
        keypair.validate()?;
        Ok(keypair.public_key.clone())
    }

    /// Answer an enrollment request
    ///
    /// # Return:
    /// a serialized [`EnrollmentResponse`] for a fresh server nonce, carrying a
    /// proof that it was computed with the server's private key
    ///
    pub fn get_enrollment(&mut self, keypair: &[u8]) -> Result<Vec<u8>> {
        let kp = Keypair::from_bytes(keypair)?.validate()?;

        let ns: [u8; NONCE_LEN] = generate_nonce(&mut self.rng);
        let (hs0, hs1) = self.server_points(&ns)?;
        let c0 = hs0 * &kp.private_key;
        let c1 = hs1 * &kp.private_key;
        let proof = self.prove_success(&kp, &hs0, &hs1, &c0, &c1)?;

        EnrollmentResponse {
            ns: ns.to_vec(),
            c0: c0.marshal()?.to_vec(),
            c1: c1.marshal()?.to_vec(),
            proof,
        }
        .to_bytes()
    }

    /// Check a password attempt
    ///
    /// # Return:
    /// a serialized [`VerifyPasswordResponse`] carrying a proof of either success or failure
    ///
    pub fn verify_password(&mut self, keypair: &[u8], request: &[u8]) -> Result<Vec<u8>> {
        self.verify_password_extended(keypair, request)
            .map(|(response, _)| response)
    }

    /// Check a password attempt, also reporting the outcome to the caller
    ///
    /// # Return:
    /// (`response`, `result`):
    /// - `response`: a serialized [`VerifyPasswordResponse`] for the client
    /// - `result`: whether the password matched, and the nonce of the record it was checked against
    ///
    pub fn verify_password_extended(
        &mut self,
        keypair: &[u8],
        request: &[u8],
    ) -> Result<(Vec<u8>, VerifyPasswordResult)> {
        let request = VerifyPasswordRequest::from_bytes(request)?;
        let kp = Keypair::from_bytes(keypair)?.validate()?;
        let (ns, c0) = request.validate()?;

        let (hs0, hs1) = self.server_points(&ns)?;

        let (response, res) = if bool::from((hs0 * &kp.private_key).ct_eq(&c0)) {
            let c1 = hs1 * &kp.private_key;
            let proof = self.prove_success(&kp, &hs0, &hs1, &c0, &c1)?;
            let response = VerifyPasswordResponse {
                res: true,
                c1: c1.marshal()?.to_vec(),
                proof: Proof::Success(proof),
            };
            (response, true)
        } else {
            let (c1, proof) = self.prove_failure(&kp, &c0, &hs0)?;
            let response = VerifyPasswordResponse {
                res: false,
                c1: c1.marshal()?.to_vec(),
                proof: Proof::Fail(proof),
            };
            (response, false)
        };

        Ok((response.to_bytes()?, VerifyPasswordResult { res, salt: ns }))
    }

    /// Rotate the server's key pair
    ///
    /// # Return:
    /// (`token`, `new_keypair`):
    /// - `token`: a serialized [`UpdateToken`] for clients and their records
    /// - `new_keypair`: the serialized [`Keypair`] replacing the old one
    ///
    pub fn rotate(&mut self, keypair: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        let kp = Keypair::from_bytes(keypair)?.validate()?;

        let mut a = random_z(&mut self.rng);
        let mut b = random_z(&mut self.rng);
        let mut private_key = kp.private_key * a + b;
        let public_key = kp.public_key * &a + Point::scalar_base_mult(&b);

        let token = UpdateToken {
            a: scalar_to_bytes(&a).to_vec(),
            b: scalar_to_bytes(&b).to_vec(),
        };
        let new_keypair = Keypair {
            public_key: public_key.marshal()?.to_vec(),
            private_key: scalar_to_bytes(&private_key).to_vec(),
        };
        a.zeroize();
        b.zeroize();
        private_key.zeroize();

        Ok((token.to_bytes()?, new_keypair.to_bytes()?))
    }

    fn server_points(&self, ns: &[u8; NONCE_LEN]) -> Result<(Point, Point)> {
        server_points(&self.ctx, ns)
    }

    fn prove_success(
        &mut self,
        kp: &ServerKeypair,
        hs0: &Point,
        hs1: &Point,
        c0: &Point,
        c1: &Point,
    ) -> Result<ProofOfSuccess> {
        let domains = self.ctx.domains();
        let mut blind_x = random_z(&mut self.rng);

        let term1 = (*hs0 * &blind_x).marshal()?;
        let term2 = (*hs1 * &blind_x).marshal()?;
        let term3 = Point::scalar_base_mult(&blind_x).marshal()?;

        let challenge = hash_z(
            &domains.proof_ok,
            &domains.kdf_info_z,
            &[
                &kp.public_key_bytes,
                self.ctx.curve().generator_bytes(),
                &c0.marshal()?,
                &c1.marshal()?,
                &term1,
                &term2,
                &term3,
            ],
        )?;
        let res = blind_x + kp.private_key * challenge;
        blind_x.zeroize();

        Ok(ProofOfSuccess {
            term1: term1.to_vec(),
            term2: term2.to_vec(),
            term3: term3.to_vec(),
            blind_x: scalar_to_bytes(&res).to_vec(),
        })
    }

    fn prove_failure(
        &mut self,
        kp: &ServerKeypair,
        c0: &Point,
        hs0: &Point,
    ) -> Result<(Point, ProofOfFail)> {
        let domains = self.ctx.domains();

        let mut r = random_z(&mut self.rng);
        let mut minus_rx = -(r * kp.private_key);

        // c1 = c0^r * hs0^(-r*x), so that c1 = I^r for I = c0 / hs0^x
        let c1 = *c0 * &r + *hs0 * &minus_rx;

        let mut blind_a = random_z(&mut self.rng);
        let mut blind_b = random_z(&mut self.rng);

        let term1 = (*c0 * &blind_a).marshal()?;
        let term2 = (*hs0 * &blind_b).marshal()?;
        let term3 = (kp.public_key * &blind_a).marshal()?;
        let term4 = Point::scalar_base_mult(&blind_b).marshal()?;

        let challenge = hash_z(
            &domains.proof_error,
            &domains.kdf_info_z,
            &[
                &kp.public_key_bytes,
                self.ctx.curve().generator_bytes(),
                &c0.marshal()?,
                &c1.marshal()?,
                &term1,
                &term2,
                &term3,
                &term4,
            ],
        )?;

        let proof = ProofOfFail {
            term1: term1.to_vec(),
            term2: term2.to_vec(),
            term3: term3.to_vec(),
            term4: term4.to_vec(),
            blind_a: scalar_to_bytes(&(blind_a + challenge * r)).to_vec(),
            blind_b: scalar_to_bytes(&(blind_b + challenge * minus_rx)).to_vec(),
        };
        r.zeroize();
        minus_rx.zeroize();
        blind_a.zeroize();
        blind_b.zeroize();

        Ok((c1, proof))
    }
}

fn server_points(ctx: &Context, ns: &[u8; NONCE_LEN]) -> Result<(Point, Point)> {
    let domains = ctx.domains();
    Ok((
        hash_to_point(ctx, &domains.server0, &[ns])?,
        hash_to_point(ctx, &domains.server1, &[ns])?,
    ))
}

/// Move an enrollment record to the server's next key pair
///
/// Needs neither the password nor any private key: `T0' = T0^a * Hs0^b` and
/// `T1' = T1^a * Hs1^b`, with `Hs0, Hs1` recomputed from the record's server nonce.
///
/// # Arguments:
/// - `ctx`: the protocol context
/// - `record`: a serialized [`EnrollmentRecord`]
/// - `token`: a serialized [`UpdateToken`]
///
pub fn update_record(ctx: &Context, record: &[u8], token: &[u8]) -> Result<Vec<u8>> {
    let record = EnrollmentRecord::from_bytes(record)?.validate()?;
    let (a, b) = UpdateToken::from_bytes(token)?.validate()?;

    let (hs0, hs1) = server_points(ctx, &record.ns)?;
    let t0 = record.t0 * &a + hs0 * &b;
    let t1 = record.t1 * &a + hs1 * &b;

    EnrollmentRecord {
        ns: record.ns.to_vec(),
        nc: record.nc.to_vec(),
        t0: t0.marshal()?.to_vec(),
        t1: t1.marshal()?.to_vec(),
    }
    .to_bytes()
}
