use phe::{
    decrypt, encrypt, generate_client_key, Context, EnrollmentResponse, Error, Message,
    PheClient, PheServer, ProtocolDomains, Result, VerifyPasswordResponse, VerifyPasswordResult,
};
use rand_chacha::rand_core::{CryptoRng, Error as RngError, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

const PASSWORD: &[u8] = b"passw0rd";
const WRONG_PASSWORD: &[u8] = b"passw1rd";

fn init(seed: u64) -> Result<(PheServer<ChaCha20Rng>, PheClient<ChaCha20Rng>, Vec<u8>)> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut server = PheServer::new(ChaCha20Rng::from_rng(&mut rng).unwrap());
    let keypair = server.generate_server_keypair()?;
    let public_key = server.get_public_key(&keypair)?;

    let client_key = generate_client_key(&mut rng);
    let client = PheClient::new(rng, &public_key, &client_key)?;

    Ok((server, client, keypair))
}

/// enroll a password then recover the key with the same password
#[test]
fn test_enroll_and_verify() -> Result<()> {
    let (mut server, mut client, keypair) = init(1)?;

    let response = server.get_enrollment(&keypair)?;
    let (record, key) = client.enroll_account(PASSWORD, &response)?;

    let request = client.create_verify_password_request(PASSWORD, &record)?;
    let (response, result) = server.verify_password_extended(&keypair, &request)?;
    let recovered = client.check_response_and_decrypt(PASSWORD, &record, &response)?;

    assert_eq!(key, recovered);
    assert!(result.res);

    // the key can be recovered any number of times
    let request = client.create_verify_password_request(PASSWORD, &record)?;
    let response = server.verify_password(&keypair, &request)?;
    assert_eq!(
        client.check_response_and_decrypt(PASSWORD, &record, &response)?,
        key
    );

    Ok(())
}

/// a wrong password yields a proven failure, never a key
#[test]
fn test_wrong_password() -> Result<()> {
    let (mut server, mut client, keypair) = init(2)?;

    let response = server.get_enrollment(&keypair)?;
    let (record, _) = client.enroll_account(PASSWORD, &response)?;

    let request = client.create_verify_password_request(WRONG_PASSWORD, &record)?;
    let (response, result) = server.verify_password_extended(&keypair, &request)?;

    assert!(!result.res);
    assert!(!VerifyPasswordResponse::from_bytes(&response)?.res);
    assert_eq!(
        client.check_response_and_decrypt(WRONG_PASSWORD, &record, &response),
        Err(Error::WrongPassword)
    );

    Ok(())
}

/// enrolling the same password twice gives unrelated records and keys
#[test]
fn test_enrollments_are_independent() -> Result<()> {
    let (mut server, mut client, keypair) = init(3)?;

    let (record1, key1) = client.enroll_account(PASSWORD, &server.get_enrollment(&keypair)?)?;
    let (record2, key2) = client.enroll_account(PASSWORD, &server.get_enrollment(&keypair)?)?;

    assert_ne!(record1, record2);
    assert_ne!(key1, key2);

    // a response for one record does not open the other
    let request = client.create_verify_password_request(PASSWORD, &record1)?;
    let response = server.verify_password(&keypair, &request)?;
    assert!(client
        .check_response_and_decrypt(PASSWORD, &record2, &response)
        .is_err());

    Ok(())
}

/// the server reports the outcome and the nonce of the checked record
#[test]
fn test_verify_password_result() -> Result<()> {
    let (mut server, mut client, keypair) = init(4)?;

    let response = server.get_enrollment(&keypair)?;
    let ns = EnrollmentResponse::from_bytes(&response)?.ns;
    let (record, _) = client.enroll_account(PASSWORD, &response)?;

    let request = client.create_verify_password_request(WRONG_PASSWORD, &record)?;
    let (_, result) = server.verify_password_extended(&keypair, &request)?;

    let mut salt = [0u8; 32];
    salt.copy_from_slice(&ns);
    assert_eq!(result, VerifyPasswordResult { res: false, salt });

    Ok(())
}

/// flipping any byte of an enrollment response makes enrollment fail
#[test]
fn test_tampered_enrollment_response() -> Result<()> {
    let (mut server, mut client, keypair) = init(5)?;
    let response = server.get_enrollment(&keypair)?;

    for i in 0..response.len() {
        let mut tampered = response.clone();
        tampered[i] ^= 0x01;
        assert!(
            client.enroll_account(PASSWORD, &tampered).is_err(),
            "byte {}",
            i
        );
    }

    Ok(())
}

/// flipping any byte of a successful verify response never yields a key
#[test]
fn test_tampered_verify_response() -> Result<()> {
    let (mut server, mut client, keypair) = init(6)?;

    let (record, _) = client.enroll_account(PASSWORD, &server.get_enrollment(&keypair)?)?;
    let request = client.create_verify_password_request(PASSWORD, &record)?;
    let response = server.verify_password(&keypair, &request)?;

    for i in 0..response.len() {
        let mut tampered = response.clone();
        tampered[i] ^= 0x01;
        assert!(
            client
                .check_response_and_decrypt(PASSWORD, &record, &tampered)
                .is_err(),
            "byte {}",
            i
        );
    }

    Ok(())
}

/// a response whose result flag contradicts its proof is rejected
#[test]
fn test_result_flag_must_match_proof() -> Result<()> {
    let (mut server, mut client, keypair) = init(7)?;

    let (record, _) = client.enroll_account(PASSWORD, &server.get_enrollment(&keypair)?)?;

    let request = client.create_verify_password_request(PASSWORD, &record)?;
    let response = server.verify_password(&keypair, &request)?;
    let mut response = VerifyPasswordResponse::from_bytes(&response)?;
    response.res = false;
    assert_eq!(
        client.check_response_and_decrypt(PASSWORD, &record, &response.to_bytes()?),
        Err(Error::InvalidProof)
    );

    let request = client.create_verify_password_request(WRONG_PASSWORD, &record)?;
    let response = server.verify_password(&keypair, &request)?;
    let mut response = VerifyPasswordResponse::from_bytes(&response)?;
    response.res = true;
    assert_eq!(
        client.check_response_and_decrypt(WRONG_PASSWORD, &record, &response.to_bytes()?),
        Err(Error::InvalidProof)
    );

    Ok(())
}

/// flipping any byte of a stored record makes verification fail
#[test]
fn test_tampered_record() -> Result<()> {
    let (mut server, mut client, keypair) = init(8)?;
    let (record, _) = client.enroll_account(PASSWORD, &server.get_enrollment(&keypair)?)?;

    for i in 0..record.len() {
        let mut tampered = record.clone();
        tampered[i] ^= 0x01;

        let outcome = client
            .create_verify_password_request(PASSWORD, &tampered)
            .and_then(|request| server.verify_password(&keypair, &request))
            .and_then(|response| {
                client.check_response_and_decrypt(PASSWORD, &tampered, &response)
            });
        assert!(outcome.is_err(), "byte {}", i);
    }

    Ok(())
}

/// a failure proof made with another server's key is not accepted as a wrong password
#[test]
fn test_failure_proof_from_another_server() -> Result<()> {
    let (mut server, mut client, keypair) = init(9)?;
    let (mut other_server, _, other_keypair) = init(10)?;

    let (record, _) = client.enroll_account(PASSWORD, &server.get_enrollment(&keypair)?)?;
    let request = client.create_verify_password_request(PASSWORD, &record)?;
    let response = other_server.verify_password(&other_keypair, &request)?;

    assert_eq!(
        client.check_response_and_decrypt(PASSWORD, &record, &response),
        Err(Error::InvalidProof)
    );

    Ok(())
}

/// parties configured with different domain tags cannot talk to each other
#[test]
fn test_domain_separation() -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(11);
    let domains = ProtocolDomains {
        proof_ok: *b"OTHERPH5",
        ..ProtocolDomains::DEFAULT
    };

    let mut server = PheServer::with_context(
        Context::with_domains(domains),
        ChaCha20Rng::from_rng(&mut rng).unwrap(),
    );
    let keypair = server.generate_server_keypair()?;
    let public_key = server.get_public_key(&keypair)?;

    let client_key = generate_client_key(&mut rng);
    let mut client = PheClient::new(rng, &public_key, &client_key)?;

    assert_eq!(
        client.enroll_account(PASSWORD, &server.get_enrollment(&keypair)?),
        Err(Error::InvalidProof)
    );

    Ok(())
}

/// the recovered key protects user data
#[test]
fn test_encrypt_with_recovered_key() -> Result<()> {
    let (mut server, mut client, keypair) = init(12)?;
    let mut rng = ChaCha20Rng::seed_from_u64(13);
    let ctx = Context::new();

    let (record, key) = client.enroll_account(PASSWORD, &server.get_enrollment(&keypair)?)?;
    let ciphertext = encrypt(&ctx, &mut rng, b"the user's data", &key)?;

    let request = client.create_verify_password_request(PASSWORD, &record)?;
    let response = server.verify_password(&keypair, &request)?;
    let recovered = client.check_response_and_decrypt(PASSWORD, &record, &response)?;

    assert_eq!(decrypt(&ctx, &ciphertext, &recovered)?, b"the user's data");

    Ok(())
}

/// RNG whose first 32 byte request is answered with zeros
struct ZeroNonceRng {
    inner: ChaCha20Rng,
    used: bool,
}

impl RngCore for ZeroNonceRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if !self.used && dest.len() == 32 {
            self.used = true;
            dest.fill(0);
        } else {
            self.inner.fill_bytes(dest);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> core::result::Result<(), RngError> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for ZeroNonceRng {}

/// an all zero server nonce still enrolls and verifies
#[test]
fn test_zero_server_nonce() -> Result<()> {
    let (_, mut client, keypair) = init(14)?;
    let mut zero_server = PheServer::new(ZeroNonceRng {
        inner: ChaCha20Rng::seed_from_u64(15),
        used: false,
    });

    let response = zero_server.get_enrollment(&keypair)?;
    assert_eq!(EnrollmentResponse::from_bytes(&response)?.ns, vec![0u8; 32]);

    let (record, key) = client.enroll_account(b"correct horse", &response)?;

    let request = client.create_verify_password_request(b"correct horse", &record)?;
    let response = zero_server.verify_password(&keypair, &request)?;
    let recovered = client.check_response_and_decrypt(b"correct horse", &record, &response)?;
    assert_eq!(recovered.len(), 32);
    assert_eq!(recovered, key);

    let request = client.create_verify_password_request(b"wrong", &record)?;
    let response = zero_server.verify_password(&keypair, &request)?;
    assert_eq!(
        client.check_response_and_decrypt(b"wrong", &record, &response),
        Err(Error::WrongPassword)
    );

    Ok(())
}
