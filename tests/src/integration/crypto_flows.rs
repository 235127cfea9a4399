//! # Crypto Flows
//!
//! Cryptographic pass-throughs exercised from inside contracts, checked
//! against reference implementations.

#[cfg(test)]
mod tests {
    use crate::fixtures::{call_from_alice, funded_host};
    use contract_runtime::prelude::*;
    use k256::ecdsa::SigningKey;
    use sha3::{Digest, Keccak256, Keccak512};

    const VERIFIER: &str = "verifier.test";

    /// `recover`: input is `signature (64) || v (1) || message`; returns the
    /// 64-byte signer key, or nothing when recovery fails.
    fn verifier() -> MethodTable<InMemoryHost> {
        MethodTable::new("verifier")
            .method("recover", |env| {
                let input = env.input_raw()?;
                env.require(input.len() >= 65, "input too short")?;
                let (signature, rest) = input.split_at(64);
                let hash = env.keccak256(&rest[1..])?;
                match env.ecrecover(&hash, signature, rest[0], true)? {
                    Some(public_key) => env.value_return_raw(&public_key),
                    None => env.log_str("no signer"),
                }
            })
            .method("digests", |env| {
                let input = env.input_raw()?;
                let mut out = Vec::new();
                out.extend_from_slice(&env.sha256(&input)?);
                out.extend_from_slice(&env.keccak256(&input)?);
                out.extend_from_slice(&env.keccak512(&input)?);
                out.extend_from_slice(&env.ripemd160(&input)?);
                env.value_return_raw(&out)
            })
            .method("bad_hash", |env| {
                env.ecrecover(&[0u8; 31], &[0u8; 64], 0, false)?;
                Ok(())
            })
    }

    fn run(method: &str, input: Vec<u8>) -> InvocationOutcome {
        let mut host = funded_host(&[VERIFIER]);
        let mut scheduler = PromiseScheduler::new(&host);
        scheduler.deploy(VERIFIER, verifier());
        scheduler
            .call(&mut host, call_from_alice(VERIFIER).with_input(input), method)
            .entry
    }

    fn returned(outcome: &InvocationOutcome) -> Option<Vec<u8>> {
        match outcome.effects().map(|e| &e.return_data) {
            Some(ReturnData::Value(bytes)) => Some(bytes.clone()),
            _ => None,
        }
    }

    fn signed(message: &[u8]) -> (Vec<u8>, [u8; 64]) {
        let signing_key = SigningKey::from_bytes((&[0x5Au8; 32]).into()).unwrap();
        let hash = Keccak256::digest(message);
        let (signature, recovery_id) = signing_key.sign_prehash_recoverable(&hash).unwrap();

        let mut input = signature.to_bytes().to_vec();
        input.push(recovery_id.to_byte());
        input.extend_from_slice(message);

        let encoded = signing_key.verifying_key().to_encoded_point(false);
        let mut public_key = [0u8; 64];
        public_key.copy_from_slice(&encoded.as_bytes()[1..]);
        (input, public_key)
    }

    // =============================================================================
    // SIGNATURES
    // =============================================================================

    #[test]
    fn test_contract_recovers_signer() {
        let (input, public_key) = signed(b"withdraw 10");
        let outcome = run("recover", input);
        assert_eq!(returned(&outcome), Some(public_key.to_vec()));
    }

    #[test]
    fn test_tampered_message_does_not_recover_signer() {
        let (mut input, public_key) = signed(b"withdraw 10");
        let last = input.len() - 1;
        input[last] = b'9';

        let outcome = run("recover", input);
        assert!(outcome.is_committed());
        assert_ne!(returned(&outcome), Some(public_key.to_vec()));
    }

    #[test]
    fn test_malformed_hash_traps() {
        let outcome = run("bad_hash", Vec::new());
        assert!(matches!(
            outcome.trap(),
            Some(Trap::MalformedSignatureInput(_))
        ));
    }

    // =============================================================================
    // HASHES
    // =============================================================================

    #[test]
    fn test_digests_match_reference() {
        let outcome = run("digests", b"abc".to_vec());
        let bytes = returned(&outcome).unwrap();
        assert_eq!(bytes.len(), 32 + 32 + 64 + 20);

        assert_eq!(
            hex::encode(&bytes[..32]),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(&bytes[32..64], Keccak256::digest(b"abc").as_slice());
        assert_eq!(&bytes[64..128], Keccak512::digest(b"abc").as_slice());
        assert_eq!(
            hex::encode(&bytes[128..]),
            "8eb208f7e05d987a9b044a8e98c6b087f15a0bfc"
        );
    }

    // =============================================================================
    // ALT_BN128
    // =============================================================================

    fn generator() -> [u8; 64] {
        let mut point = [0u8; 64];
        point[0] = 1;
        point[32] = 2;
        point
    }

    #[test]
    fn test_curve_operations_through_host() {
        let mut host = funded_host(&[VERIFIER]);
        let mut runner = InvocationRunner::new();
        let g = generator();

        let outcome = runner.invoke(&mut host, call_from_alice(VERIFIER), "curve", |env| {
            let mut multiexp = g.to_vec();
            let mut two = [0u8; 32];
            two[0] = 2;
            multiexp.extend_from_slice(&two);
            let doubled = env.alt_bn128_g1_multiexp(&multiexp)?;

            let mut sum = vec![0u8];
            sum.extend_from_slice(&g);
            sum.push(0);
            sum.extend_from_slice(&g);
            let added = env.alt_bn128_g1_sum(&sum)?;

            env.require(doubled == added, "2g != g + g")?;
            let paired = env.alt_bn128_pairing_check(&[])?;
            env.require(paired, "empty pairing must pass")?;
            env.value_return_raw(&doubled)
        });

        assert!(outcome.is_committed());
        assert_ne!(returned(&outcome), Some(vec![0u8; 64]));
    }

    #[test]
    fn test_misaligned_curve_input_traps() {
        let mut host = funded_host(&[VERIFIER]);
        let mut runner = InvocationRunner::new();

        let outcome = runner.invoke(&mut host, call_from_alice(VERIFIER), "curve", |env| {
            env.alt_bn128_g1_sum(&[0u8; 64]).map(drop)
        });

        assert_eq!(
            outcome.trap(),
            Some(&Trap::MalformedCurveInput {
                op: "alt_bn128_g1_sum",
                len: 64,
                item_size: 65
            })
        );
    }
}
