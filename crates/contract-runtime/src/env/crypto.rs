//! # Cryptographic Primitives
//!
//! Pass-throughs to the host's hash, recovery and curve functions.
//! Malformed input traps in the host; a signature that does not recover and
//! a failed pairing check are ordinary results.

use super::Env;
use crate::channel::{fetch, fetch_array, RegisterOutcome};
use crate::domain::value_objects::ATOMIC_OP_REGISTER;
use crate::errors::{HostResult, Trap};
use crate::ports::outbound::HostApi;

impl<H: HostApi> Env<'_, H> {
    /// SHA-256 digest.
    pub fn sha256(&mut self, value: &[u8]) -> HostResult<[u8; 32]> {
        self.host.sha256(value, ATOMIC_OP_REGISTER)?;
        fetch_array(self.host, ATOMIC_OP_REGISTER)
    }

    /// Keccak-256 digest.
    pub fn keccak256(&mut self, value: &[u8]) -> HostResult<[u8; 32]> {
        self.host.keccak256(value, ATOMIC_OP_REGISTER)?;
        fetch_array(self.host, ATOMIC_OP_REGISTER)
    }

    /// Keccak-512 digest.
    pub fn keccak512(&mut self, value: &[u8]) -> HostResult<[u8; 64]> {
        self.host.keccak512(value, ATOMIC_OP_REGISTER)?;
        fetch_array(self.host, ATOMIC_OP_REGISTER)
    }

    /// RIPEMD-160 digest.
    pub fn ripemd160(&mut self, value: &[u8]) -> HostResult<[u8; 20]> {
        self.host.ripemd160(value, ATOMIC_OP_REGISTER)?;
        fetch_array(self.host, ATOMIC_OP_REGISTER)
    }

    /// Recover the 64-byte secp256k1 public key that produced `signature`
    /// over `hash`.
    ///
    /// With `malleability_flag` set, high-S signatures are rejected.
    pub fn ecrecover(
        &mut self,
        hash: &[u8],
        signature: &[u8],
        v: u8,
        malleability_flag: bool,
    ) -> HostResult<Option<[u8; 64]>> {
        let status = self.host.ecrecover(
            hash,
            signature,
            u64::from(v),
            u64::from(malleability_flag),
            ATOMIC_OP_REGISTER,
        )?;
        let outcome = RegisterOutcome::from_status("ecrecover", status, ATOMIC_OP_REGISTER)?;
        let Some(bytes) = fetch(self.host, outcome)? else {
            return Ok(None);
        };
        <[u8; 64]>::try_from(bytes.as_slice())
            .map(Some)
            .map_err(|_| Trap::UnexpectedRegisterLength {
                register_id: ATOMIC_OP_REGISTER,
                expected: 64,
                actual: bytes.len(),
            })
    }

    /// `sum_i s_i * g_i` over packed little-endian `(G1, Fr)` items.
    pub fn alt_bn128_g1_multiexp(&mut self, value: &[u8]) -> HostResult<[u8; 64]> {
        self.host.alt_bn128_g1_multiexp(value, ATOMIC_OP_REGISTER)?;
        fetch_array(self.host, ATOMIC_OP_REGISTER)
    }

    /// `sum_i (-1)^{sign_i} g_i` over packed `(sign, G1)` items.
    pub fn alt_bn128_g1_sum(&mut self, value: &[u8]) -> HostResult<[u8; 64]> {
        self.host.alt_bn128_g1_sum(value, ATOMIC_OP_REGISTER)?;
        fetch_array(self.host, ATOMIC_OP_REGISTER)
    }

    /// Returns true if the product of pairings over packed `(G1, G2)` items
    /// is one.
    pub fn alt_bn128_pairing_check(&mut self, value: &[u8]) -> HostResult<bool> {
        let status = self.host.alt_bn128_pairing_check(value)?;
        Ok(RegisterOutcome::from_status("alt_bn128_pairing_check", status, ATOMIC_OP_REGISTER)?
            .is_populated())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::adapters::InMemoryHost;
    use crate::domain::entities::InvocationContext;
    use crate::env::Env;
    use crate::errors::Trap;
    use crate::ports::outbound::HostLifecycle;
    use k256::ecdsa::SigningKey;

    fn host() -> InMemoryHost {
        let mut host = InMemoryHost::new();
        host.begin(InvocationContext::new("crypto.test", "alice.test"));
        host
    }

    #[test]
    fn test_hash_digests() {
        let mut host = host();
        let mut env = Env::new(&mut host);

        assert_eq!(
            hex::encode(env.sha256(b"abc").unwrap()),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            hex::encode(env.keccak256(b"").unwrap()),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(env.keccak512(b"").unwrap().len(), 64);
        assert_eq!(
            hex::encode(env.ripemd160(b"abc").unwrap()),
            "8eb208f7e05d987a9b044a8e98c6b087f15a0bfc"
        );
    }

    #[test]
    fn test_ecrecover_round_trip() {
        let signing_key = SigningKey::from_bytes((&[0x21u8; 32]).into()).unwrap();
        let mut host = host();
        let mut env = Env::new(&mut host);

        let hash = env.keccak256(b"withdraw 5").unwrap();
        let (signature, recovery_id) = signing_key.sign_prehash_recoverable(&hash).unwrap();
        let expected = signing_key.verifying_key().to_encoded_point(false);

        let recovered = env
            .ecrecover(&hash, &signature.to_bytes(), recovery_id.to_byte(), true)
            .unwrap();
        assert_eq!(recovered.unwrap().as_slice(), &expected.as_bytes()[1..]);
    }

    #[test]
    fn test_ecrecover_mismatch_is_absent() {
        let mut host = host();
        let mut env = Env::new(&mut host);
        assert_eq!(env.ecrecover(&[1u8; 32], &[0u8; 64], 0, false), Ok(None));
    }

    #[test]
    fn test_ecrecover_malformed_traps() {
        let mut host = host();
        let mut env = Env::new(&mut host);
        assert!(matches!(
            env.ecrecover(&[1u8; 31], &[0u8; 64], 0, false),
            Err(Trap::MalformedSignatureInput(_))
        ));
    }

    #[test]
    fn test_curve_operations() {
        let mut host = host();
        let mut env = Env::new(&mut host);

        let mut generator = [0u8; 64];
        generator[0] = 1;
        generator[32] = 2;

        let mut item = generator.to_vec();
        let mut one = [0u8; 32];
        one[0] = 1;
        item.extend_from_slice(&one);
        assert_eq!(env.alt_bn128_g1_multiexp(&item).unwrap(), generator);

        let mut sum = vec![0u8];
        sum.extend_from_slice(&generator);
        sum.push(1);
        sum.extend_from_slice(&generator);
        assert_eq!(env.alt_bn128_g1_sum(&sum).unwrap(), [0u8; 64]);

        assert!(env.alt_bn128_pairing_check(&[]).unwrap());
    }

    #[test]
    fn test_malformed_curve_input_traps() {
        let mut host = host();
        let mut env = Env::new(&mut host);
        assert!(matches!(
            env.alt_bn128_g1_sum(&[0u8; 10]),
            Err(Trap::MalformedCurveInput {
                len: 10,
                item_size: 65,
                ..
            })
        ));
        assert!(matches!(
            env.alt_bn128_pairing_check(&[0u8; 191]),
            Err(Trap::MalformedCurveInput { .. })
        ));
    }
}
