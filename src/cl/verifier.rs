use super::attribute::{AttrCond, AttrValue, Attribute};
use super::hash::hash_numbers;
use super::helpers::{e_range, multi_exp};
use super::{Cred, Params, PubKey};
use crate::bn::BigNumber;
use crate::errors::prelude::*;
use crate::zkp::representation::{self, RepresentationProof};

use std::collections::HashMap;

/// Fiat-Shamir challenge of a credential request. It binds the issuer
/// nonce, the pseudonym, `U`, every attribute commitment and the first
/// message of each sub-proof.
pub fn cred_request_challenge(
    pub_key: &PubKey,
    u: &BigNumber,
    nym: &BigNumber,
    issuer_nonce: &BigNumber,
    commitments_of_attrs: &[BigNumber],
    random_data: &[&BigNumber],
) -> AnonCredsResult<BigNumber> {
    let context = pub_key.context()?;
    let mut nums = vec![&context, u, nym, issuer_nonce];
    nums.extend(commitments_of_attrs.iter());
    nums.extend(random_data.iter());
    hash_numbers(&nums)
}

/// Challenge of the issuer's proof that `A = Q^(1/E)`.
pub fn signature_challenge(
    pub_key: &PubKey,
    q: &BigNumber,
    a: &BigNumber,
    random_data: &BigNumber,
    nonce: &BigNumber,
) -> AnonCredsResult<BigNumber> {
    let context = pub_key.context()?;
    hash_numbers(&[&context, q, a, random_data, nonce])
}

/// Challenge of a proof of possession. Binds the randomized `A'` and the
/// target `y`, which carries every revealed value.
pub fn possession_challenge(
    pub_key: &PubKey,
    a: &BigNumber,
    y: &BigNumber,
    random_data: &BigNumber,
    nonce: &BigNumber,
) -> AnonCredsResult<BigNumber> {
    let context = pub_key.context()?;
    hash_numbers(&[&context, a, y, random_data, nonce])
}

/// Checks that `E` lies strictly inside `(2^(EBitLen-1), 2^(EBitLen-1) + 2^(E1BitLen-1))`
/// and passes `params.prime_checks` Miller-Rabin rounds.
pub fn check_e(params: &Params, e: &BigNumber) -> AnonCredsResult<bool> {
    let (start, end) = e_range(params.e_bit_len, params.e1_bit_len)?;
    if e <= &start || e >= &end {
        debug!("E is not of the proper bit length");
        return Ok(false);
    }
    if !e.is_probable_prime(params.prime_checks)? {
        debug!("E is not prime");
        return Ok(false);
    }
    Ok(true)
}

/// Verifies a freshly issued credential against the values it signs.
///
/// `v` is the full blinding exponent `V1 + V11`. The hidden, committed and
/// known terms are folded into `Q = Z / (S^v * prod R_i^m_i)` and
/// `A^E == Q` is required before the issuer's proof of `A = Q^(1/E)` is
/// checked.
pub fn verify_signature(
    params: &Params,
    pub_key: &PubKey,
    cred: &Cred,
    v: &BigNumber,
    known: &[BigNumber],
    commitments: &[BigNumber],
    hidden: &[BigNumber],
    a_proof: &RepresentationProof,
    nonce: &BigNumber,
) -> AnonCredsResult<bool> {
    trace!(
        "verify_signature: >>> cred: {:?}, a_proof: {:?}, nonce: {:?}",
        cred,
        a_proof,
        nonce
    );

    if !check_e(params, &cred.e)? {
        return Ok(false);
    }

    let group = pub_key.group();
    if known.len() != pub_key.rs_known.len()
        || commitments.len() != pub_key.rs_committed.len()
        || hidden.len() != pub_key.rs_hidden.len()
    {
        debug!("Attribute counts do not match the public key");
        return Ok(false);
    }

    let mut bases = vec![pub_key.s.clone()];
    bases.extend(pub_key.rs_known.iter().cloned());
    bases.extend(pub_key.rs_committed.iter().cloned());
    bases.extend(pub_key.rs_hidden.iter().cloned());

    let mut exps = vec![v.clone()];
    exps.extend(known.iter().cloned());
    exps.extend(commitments.iter().cloned());
    exps.extend(hidden.iter().cloned());

    let denom = multi_exp(&bases, &exps, &group.n)?;
    let q = group.mul(&pub_key.z, &group.inv(&denom)?)?;

    if group.exp(&cred.a, &cred.e)? != q {
        debug!("Q should be A^e (mod n)");
        return Ok(false);
    }

    let challenge = signature_challenge(pub_key, &q, &cred.a, &a_proof.random_data, nonce)?;
    if challenge != a_proof.challenge {
        debug!("Signature proof challenge is not correct");
        return Ok(false);
    }

    let valid = representation::verify(&group, &[q], &cred.a, a_proof)?;

    trace!("verify_signature: <<< valid: {:?}", valid);

    Ok(valid)
}

/// What a holder discloses along with a proof of possession.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disclosure {
    pub revealed_known_indices: Vec<usize>,
    pub revealed_committed_indices: Vec<usize>,
    pub revealed_known: Vec<BigNumber>,
    pub revealed_commitments: Vec<BigNumber>,
}

impl Disclosure {
    fn check_structure(&self, pub_key: &PubKey) -> AnonCredsResult<()> {
        let protocol_err = |msg: &str| err_msg(AnonCredsErrorKind::Protocol, msg.to_string());

        if self.revealed_known.len() != self.revealed_known_indices.len() {
            return Err(protocol_err("Revealed known values do not match their indices"));
        }
        if self.revealed_commitments.len() != self.revealed_committed_indices.len() {
            return Err(protocol_err("Revealed commitments do not match their indices"));
        }
        if !strictly_increasing_below(&self.revealed_known_indices, pub_key.rs_known.len()) {
            return Err(protocol_err("Invalid revealed known attribute indices"));
        }
        if !strictly_increasing_below(&self.revealed_committed_indices, pub_key.rs_committed.len()) {
            return Err(protocol_err("Invalid revealed committed attribute indices"));
        }
        Ok(())
    }
}

pub(crate) fn strictly_increasing_below(indices: &[usize], len: usize) -> bool {
    indices.windows(2).all(|w| w[0] < w[1]) && indices.iter().all(|i| *i < len)
}

/// Bases and target of a possession proof over the unrevealed terms.
///
/// Revealed terms are folded into `y = Z / (A'^(2^(EBitLen-1)) * prod R_i^m_i)`,
/// so the exponent proven for `A'` is `e' = E - 2^(EBitLen-1)`. The remaining
/// bases are unrevealed known, unrevealed committed, hidden, `A'` and `S`.
pub fn possession_statement(
    params: &Params,
    pub_key: &PubKey,
    a: &BigNumber,
    revealed_known_indices: &[usize],
    revealed_committed_indices: &[usize],
    revealed_known: &[BigNumber],
    revealed_commitments: &[BigNumber],
) -> AnonCredsResult<(Vec<BigNumber>, BigNumber)> {
    let group = pub_key.group();

    let mut bases = Vec::new();
    let mut revealed_bases = Vec::new();
    for (i, r) in pub_key.rs_known.iter().enumerate() {
        if revealed_known_indices.contains(&i) {
            revealed_bases.push(r.clone());
        } else {
            bases.push(r.clone());
        }
    }
    for (i, r) in pub_key.rs_committed.iter().enumerate() {
        if revealed_committed_indices.contains(&i) {
            revealed_bases.push(r.clone());
        } else {
            bases.push(r.clone());
        }
    }
    bases.extend(pub_key.rs_hidden.iter().cloned());
    bases.push(a.clone());
    bases.push(pub_key.s.clone());

    let mut revealed: Vec<BigNumber> = revealed_known
        .iter()
        .chain(revealed_commitments.iter())
        .cloned()
        .collect();
    revealed_bases.push(a.clone());
    revealed.push(e_range(params.e_bit_len, params.e1_bit_len)?.0);

    let denom = multi_exp(&revealed_bases, &revealed, &group.n)?;
    let y = group.mul(&pub_key.z, &group.inv(&denom)?)?;

    Ok((bases, y))
}

/// Randomness bit lengths of a possession proof, in the order of the bases
/// returned by [`possession_statement`]. A response may exceed its boundary
/// by one bit at most.
pub fn possession_boundaries(
    params: &Params,
    unrevealed_known: usize,
    unrevealed_committed: usize,
    hidden: usize,
) -> Vec<usize> {
    let slack = params.sec_param + params.hash_bit_len;
    // committed exponents are commitments modulo N1
    let committed_len = std::cmp::max(params.attr_bit_len, params.n_length);

    let mut boundaries = vec![params.attr_bit_len + slack; unrevealed_known];
    boundaries.extend(vec![committed_len + slack; unrevealed_committed]);
    boundaries.extend(vec![params.attr_bit_len + slack; hidden]);
    boundaries.push(params.e1_bit_len + slack);
    boundaries.push(params.v_bit_len + slack);
    boundaries
}

/// Verifies a proof of possession of a randomized credential `A'` for the
/// disclosed partition.
pub fn verify_possession(
    params: &Params,
    pub_key: &PubKey,
    a: &BigNumber,
    proof: &RepresentationProof,
    disclosure: &Disclosure,
    nonce: &BigNumber,
) -> AnonCredsResult<bool> {
    trace!(
        "verify_possession: >>> a: {:?}, disclosure: {:?}, nonce: {:?}",
        a,
        disclosure,
        nonce
    );

    disclosure.check_structure(pub_key)?;

    let group = pub_key.group();
    if !group.is_element(a) {
        debug!("Randomized A is not a group element");
        return Ok(false);
    }

    let boundaries = possession_boundaries(
        params,
        pub_key.rs_known.len() - disclosure.revealed_known_indices.len(),
        pub_key.rs_committed.len() - disclosure.revealed_committed_indices.len(),
        pub_key.rs_hidden.len(),
    );
    if proof.responses.len() != boundaries.len() {
        debug!("Possession proof carries a wrong number of responses");
        return Ok(false);
    }
    let oversized = proof
        .responses
        .iter()
        .zip(boundaries.iter())
        .any(|(response, boundary)| response.num_bits() > boundary + 1);
    if oversized {
        debug!("Possession proof response exceeds its boundary");
        return Ok(false);
    }

    let (bases, y) = possession_statement(
        params,
        pub_key,
        a,
        &disclosure.revealed_known_indices,
        &disclosure.revealed_committed_indices,
        &disclosure.revealed_known,
        &disclosure.revealed_commitments,
    )?;

    let challenge = possession_challenge(pub_key, a, &y, &proof.random_data, nonce)?;
    if challenge != proof.challenge {
        debug!("Possession proof challenge is not correct");
        return Ok(false);
    }

    let valid = representation::verify(&group, &bases, &y, proof)?;

    trace!("verify_possession: <<< valid: {:?}", valid);

    Ok(valid)
}

/// Checks every revealed known attribute carrying a condition against the
/// reference data. `known_attrs` are the schema's known attributes in index
/// order, `revealed` pairs partition positions with disclosed values.
///
/// Revealed commitments are never checked, their values stay hidden.
pub fn check_conditions(
    known_attrs: &[&Attribute],
    revealed_indices: &[usize],
    revealed_values: &[BigNumber],
    reference: &HashMap<String, AttrValue>,
) -> AnonCredsResult<()> {
    for (position, value) in revealed_indices.iter().zip(revealed_values.iter()) {
        let schema_attr = known_attrs.get(*position).ok_or_else(|| {
            err_msg(
                AnonCredsErrorKind::Protocol,
                format!("No known attribute at position {}", position),
            )
        })?;
        if schema_attr.cond() == AttrCond::None {
            continue;
        }

        let mut attr = (*schema_attr).clone();
        attr.update_value(AttrValue::from_internal(attr.attr_type(), value)?)?;

        let reference_value = reference.get(attr.name()).ok_or_else(|| {
            err_msg(
                AnonCredsErrorKind::Condition,
                format!("No reference value for '{}'", attr.name()),
            )
        })?;

        if !attr.validate_against(reference_value)? {
            debug!(
                "Attribute '{}' does not satisfy '{}' against the reference value",
                attr.name(),
                attr.cond()
            );
            return Err(err_msg(
                AnonCredsErrorKind::Condition,
                format!("Condition on '{}' not satisfied", attr.name()),
            ));
        }
    }
    Ok(())
}
