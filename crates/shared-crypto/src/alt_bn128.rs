//! # alt_bn128 (BN254) Aggregate Operations
//!
//! Backs the `alt_bn128_g1_multiexp`, `alt_bn128_g1_sum` and
//! `alt_bn128_pairing_check` host calls.
//!
//! ## Encoding
//!
//! All inputs are packed, fixed-width, little-endian sequences. Every field
//! element is 32 bytes. The point at infinity is encoded as all zeros.
//!
//! | Item | Layout | Size |
//! |------|--------|------|
//! | G1 point | `x: Fq, y: Fq` | 64 |
//! | G2 point | `x: (re: Fq, im: Fq), y: (re: Fq, im: Fq)` | 128 |
//! | multiexp item | `G1, scalar: Fr` | 96 |
//! | sum item | `sign: u8, G1` | 65 |
//! | pairing item | `G1, G2` | 192 |
//!
//! A length that is not a multiple of the item size, an out-of-range field
//! element or a point off the curve is malformed input. The host performs no
//! tolerant parsing.

use crate::CryptoError;
use substrate_bn::{arith::U256, AffineG1, AffineG2, Fq, Fq2, Fr, Group, Gt, G1, G2};

/// Size of one field element in bytes.
pub const SCALAR_LEN: usize = 32;
/// Size of an encoded G1 point.
pub const G1_LEN: usize = 2 * SCALAR_LEN;
/// Size of an encoded G2 point.
pub const G2_LEN: usize = 4 * SCALAR_LEN;
/// Size of one `(G1, Fr)` multiexp item.
pub const MULTIEXP_ITEM_LEN: usize = G1_LEN + SCALAR_LEN;
/// Size of one `(sign, G1)` sum item.
pub const SUM_ITEM_LEN: usize = 1 + G1_LEN;
/// Size of one `(G1, G2)` pairing item.
pub const PAIRING_ITEM_LEN: usize = G1_LEN + G2_LEN;

/// Compute `sum_i s_i * g_i` over packed `(G1, Fr)` items.
pub fn g1_multiexp(input: &[u8]) -> Result<[u8; G1_LEN], CryptoError> {
    check_sequence("alt_bn128_g1_multiexp", input, MULTIEXP_ITEM_LEN)?;

    let mut acc = G1::zero();
    for item in input.chunks_exact(MULTIEXP_ITEM_LEN) {
        let point = decode_g1(&item[..G1_LEN])?;
        let scalar = decode_fr(&item[G1_LEN..])?;
        acc = acc + point * scalar;
    }
    encode_g1(acc)
}

/// Compute `sum_i (-1)^{sign_i} g_i` over packed `(sign, G1)` items.
pub fn g1_sum(input: &[u8]) -> Result<[u8; G1_LEN], CryptoError> {
    check_sequence("alt_bn128_g1_sum", input, SUM_ITEM_LEN)?;

    let mut acc = G1::zero();
    for item in input.chunks_exact(SUM_ITEM_LEN) {
        let point = decode_g1(&item[1..])?;
        acc = match item[0] {
            0 => acc + point,
            1 => acc - point,
            other => return Err(CryptoError::InvalidSignByte(other)),
        };
    }
    encode_g1(acc)
}

/// Check that `prod_i e(g1_i, g2_i) == 1` over packed `(G1, G2)` items.
///
/// An empty sequence passes.
pub fn pairing_check(input: &[u8]) -> Result<bool, CryptoError> {
    check_sequence("alt_bn128_pairing_check", input, PAIRING_ITEM_LEN)?;

    let pairs = input
        .chunks_exact(PAIRING_ITEM_LEN)
        .map(|item| Ok((decode_g1(&item[..G1_LEN])?, decode_g2(&item[G1_LEN..])?)))
        .collect::<Result<Vec<(G1, G2)>, CryptoError>>()?;

    Ok(substrate_bn::pairing_batch(&pairs) == Gt::one())
}

// =============================================================================
// ENCODING HELPERS
// =============================================================================

fn check_sequence(op: &'static str, input: &[u8], item_size: usize) -> Result<(), CryptoError> {
    if input.len() % item_size != 0 {
        return Err(CryptoError::InvalidSequenceLength {
            op,
            len: input.len(),
            item_size,
        });
    }
    Ok(())
}

/// Little-endian 32 bytes to the big-endian form `substrate_bn` parses.
fn to_big_endian(le: &[u8]) -> [u8; SCALAR_LEN] {
    let mut be = [0u8; SCALAR_LEN];
    be.copy_from_slice(le);
    be.reverse();
    be
}

fn decode_fq(le: &[u8]) -> Result<Fq, CryptoError> {
    Fq::from_slice(&to_big_endian(le)).map_err(|_| CryptoError::InvalidFieldElement)
}

fn decode_fr(le: &[u8]) -> Result<Fr, CryptoError> {
    let value = U256::from_slice(&to_big_endian(le)).map_err(|_| CryptoError::InvalidFieldElement)?;
    Fr::new(value).ok_or(CryptoError::InvalidFieldElement)
}

fn decode_g1(bytes: &[u8]) -> Result<G1, CryptoError> {
    if bytes.iter().all(|&b| b == 0) {
        return Ok(G1::zero());
    }
    let x = decode_fq(&bytes[..SCALAR_LEN])?;
    let y = decode_fq(&bytes[SCALAR_LEN..G1_LEN])?;
    AffineG1::new(x, y)
        .map(G1::from)
        .map_err(|_| CryptoError::PointNotOnCurve)
}

fn decode_g2(bytes: &[u8]) -> Result<G2, CryptoError> {
    if bytes.iter().all(|&b| b == 0) {
        return Ok(G2::zero());
    }
    let x = Fq2::new(
        decode_fq(&bytes[..SCALAR_LEN])?,
        decode_fq(&bytes[SCALAR_LEN..2 * SCALAR_LEN])?,
    );
    let y = Fq2::new(
        decode_fq(&bytes[2 * SCALAR_LEN..3 * SCALAR_LEN])?,
        decode_fq(&bytes[3 * SCALAR_LEN..G2_LEN])?,
    );
    AffineG2::new(x, y)
        .map(G2::from)
        .map_err(|_| CryptoError::PointNotOnCurve)
}

fn encode_g1(point: G1) -> Result<[u8; G1_LEN], CryptoError> {
    let mut out = [0u8; G1_LEN];
    let Some(affine) = AffineG1::from_jacobian(point) else {
        // Point at infinity
        return Ok(out);
    };
    affine
        .x()
        .to_big_endian(&mut out[..SCALAR_LEN])
        .map_err(|_| CryptoError::InvalidFieldElement)?;
    affine
        .y()
        .to_big_endian(&mut out[SCALAR_LEN..])
        .map_err(|_| CryptoError::InvalidFieldElement)?;
    out[..SCALAR_LEN].reverse();
    out[SCALAR_LEN..].reverse();
    Ok(out)
}

// =============================================================================
// TESTS
// =============================================================================
