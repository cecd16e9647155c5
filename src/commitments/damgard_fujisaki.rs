use crate::bn::BigNumber;
use crate::cl::helpers::{bn_rand, bn_rand_range};
use crate::errors::prelude::*;
use crate::groups::qr::{QrSpecialRsa, QrSpecialRsaSecret};
use crate::utils::commitment::get_pedersen_commitment;

/// Damgård-Fujisaki commitment parameters over a special RSA modulus.
/// Committed values are bounded by `T = N`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamgardFujisakiParams {
    pub n: BigNumber,
    pub g: BigNumber,
    pub h: BigNumber,
}

impl DamgardFujisakiParams {
    /// `H` is a random quadratic residue and `G = H^alpha`.
    pub fn generate(secret: &QrSpecialRsaSecret) -> AnonCredsResult<DamgardFujisakiParams> {
        let group = &secret.group;
        let h = group.random_element()?;
        let alpha = secret.random_exponent()?;
        let g = group.exp(&h, &alpha)?;
        Ok(DamgardFujisakiParams {
            n: group.n.clone(),
            g,
            h,
        })
    }

    pub fn group(&self) -> QrSpecialRsa {
        QrSpecialRsa::new(self.n.clone())
    }

    pub fn compute_commit(&self, a: &BigNumber, r: &BigNumber) -> AnonCredsResult<BigNumber> {
        get_pedersen_commitment(&self.g, a, &self.h, r, &self.n)
    }
}

#[derive(Debug, Clone)]
pub struct DamgardFujisakiCommitter {
    params: DamgardFujisakiParams,
    sec_param: usize,
    value: BigNumber,
    r: BigNumber,
    commitment: BigNumber,
}

impl DamgardFujisakiCommitter {
    /// Commits to `a` with `r` drawn from `[0, 2^(sec_param + |N|))`.
    pub fn commit(
        params: &DamgardFujisakiParams,
        sec_param: usize,
        a: &BigNumber,
    ) -> AnonCredsResult<DamgardFujisakiCommitter> {
        let r = bn_rand(sec_param + params.n.num_bits())?;
        let commitment = params.compute_commit(a, &r)?;
        Ok(DamgardFujisakiCommitter {
            params: params.clone(),
            sec_param,
            value: a.clone(),
            r,
            commitment,
        })
    }

    pub fn commitment(&self) -> &BigNumber {
        &self.commitment
    }
}

/// Non-interactive proof of knowledge of the opening `(a, r)` of a
/// Damgård-Fujisaki commitment. Responses live in `Z`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningProof {
    pub random_data: BigNumber,
    pub challenge: BigNumber,
    pub response1: BigNumber,
    pub response2: BigNumber,
}

pub struct OpeningProver {
    committer: DamgardFujisakiCommitter,
    challenge_bits: usize,
    r1: BigNumber,
    r2: BigNumber,
}

impl OpeningProver {
    pub fn new(committer: DamgardFujisakiCommitter, challenge_bits: usize) -> OpeningProver {
        OpeningProver {
            committer,
            challenge_bits,
            r1: BigNumber::new(),
            r2: BigNumber::new(),
        }
    }

    /// First message `G^r1 * H^r2`, with `r1` from `[0, T*2^(|N|+c))` and
    /// `r2` from `[0, 2^(k+2|N|+c))`.
    pub fn random_data(&mut self) -> AnonCredsResult<BigNumber> {
        let params = &self.committer.params;
        let n_len = params.n.num_bits();

        let bound1 = params.n.lshift(n_len + self.challenge_bits)?;
        self.r1 = bn_rand_range(&bound1)?;
        self.r2 = bn_rand(self.committer.sec_param + 2 * n_len + self.challenge_bits)?;

        params.compute_commit(&self.r1, &self.r2)
    }

    /// Returns `(r1 + c*a, r2 + c*r)` computed in `Z`.
    pub fn response(&self, challenge: &BigNumber) -> AnonCredsResult<(BigNumber, BigNumber)> {
        let s1 = challenge.mul(&self.committer.value)?.add(&self.r1)?;
        let s2 = challenge.mul(&self.committer.r)?.add(&self.r2)?;
        Ok((s1, s2))
    }
}

/// Checks `t * C^c == G^s1 * H^s2 (mod N)`.
pub fn verify_opening(
    params: &DamgardFujisakiParams,
    commitment: &BigNumber,
    proof: &OpeningProof,
) -> AnonCredsResult<bool> {
    let group = params.group();
    let left = group.mul(&proof.random_data, &group.exp(commitment, &proof.challenge)?)?;
    let right = params.compute_commit(&proof.response1, &proof.response2)?;
    Ok(left == right)
}
