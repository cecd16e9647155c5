use crate::bn::BigNumber;
use crate::cl::helpers::{bn_rand, bn_rand_also_neg, multi_exp};
use crate::errors::prelude::*;
use crate::groups::qr::QrSpecialRsa;

/// Proof of knowledge of exponents `x_i` with `y = prod base_i^x_i (mod N)`
/// in a group of hidden order. Responses are computed in `Z`, so the
/// randomness of every term is drawn from a boundary wide enough to hide
/// `c * x_i` statistically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentationProof {
    pub random_data: BigNumber,
    pub challenge: BigNumber,
    pub responses: Vec<BigNumber>,
}

pub struct RepresentationProver {
    group: QrSpecialRsa,
    secrets: Vec<BigNumber>,
    bases: Vec<BigNumber>,
    randomness: Vec<BigNumber>,
}

impl RepresentationProver {
    pub fn new(
        group: &QrSpecialRsa,
        secrets: Vec<BigNumber>,
        bases: Vec<BigNumber>,
    ) -> AnonCredsResult<RepresentationProver> {
        if secrets.len() != bases.len() {
            return Err(err_msg(
                AnonCredsErrorKind::InvalidStructure,
                format!(
                    "{} secrets for {} bases in representation proof",
                    secrets.len(),
                    bases.len()
                ),
            ));
        }
        Ok(RepresentationProver {
            group: group.clone(),
            secrets,
            bases,
            randomness: Vec::new(),
        })
    }

    /// First message `prod base_i^r_i` where `r_i` is taken from
    /// `{0,1}^boundaries[i]`, or from `±{0,1}^boundaries[i]` when
    /// `also_neg` is set.
    pub fn random_data_given_boundaries(
        &mut self,
        boundaries: &[usize],
        also_neg: bool,
    ) -> AnonCredsResult<BigNumber> {
        if boundaries.len() != self.bases.len() {
            return Err(err_msg(
                AnonCredsErrorKind::InvalidStructure,
                format!(
                    "{} boundaries for {} bases in representation proof",
                    boundaries.len(),
                    self.bases.len()
                ),
            ));
        }

        self.randomness = boundaries
            .iter()
            .map(|b| if also_neg { bn_rand_also_neg(*b) } else { bn_rand(*b) })
            .collect::<AnonCredsResult<Vec<BigNumber>>>()?;

        multi_exp(&self.bases, &self.randomness, &self.group.n)
    }

    /// `z_i = r_i + c * x_i` in `Z`.
    pub fn responses(&self, challenge: &BigNumber) -> AnonCredsResult<Vec<BigNumber>> {
        if self.randomness.len() != self.secrets.len() {
            return Err(err_msg(
                AnonCredsErrorKind::InvalidState,
                "Proof random data has not been generated",
            ));
        }
        self.secrets
            .iter()
            .zip(self.randomness.iter())
            .map(|(secret, r)| challenge.mul(secret)?.add(r))
            .collect()
    }
}

/// Checks `prod base_i^z_i == t * y^c (mod N)`.
pub fn verify(
    group: &QrSpecialRsa,
    bases: &[BigNumber],
    y: &BigNumber,
    proof: &RepresentationProof,
) -> AnonCredsResult<bool> {
    if bases.len() != proof.responses.len() {
        debug!(
            "Representation proof carries {} responses for {} bases",
            proof.responses.len(),
            bases.len()
        );
        return Ok(false);
    }

    let left = multi_exp(bases, &proof.responses, &group.n)?;
    let right = group.mul(&proof.random_data, &group.exp(y, &proof.challenge)?)?;
    Ok(left == right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cl::hash::hash_numbers;
    use crate::groups::qr::QrSpecialRsaSecret;

    #[test]
    fn proof_with_negative_secrets_verifies() {
        let group = QrSpecialRsaSecret::generate(128).unwrap().group;
        let bases = vec![
            group.random_element().unwrap(),
            group.random_element().unwrap(),
        ];
        let secrets = vec![
            BigNumber::rand(100).unwrap(),
            BigNumber::rand(100).unwrap().set_negative(true).unwrap(),
        ];
        let y = multi_exp(&bases, &secrets, &group.n).unwrap();

        let mut prover = RepresentationProver::new(&group, secrets, bases.clone()).unwrap();
        let random_data = prover
            .random_data_given_boundaries(&[100 + 80 + 512, 100 + 80 + 512], true)
            .unwrap();
        let challenge = hash_numbers(&[&y, &random_data]).unwrap();
        let responses = prover.responses(&challenge).unwrap();

        let proof = RepresentationProof {
            random_data,
            challenge,
            responses,
        };
        assert!(verify(&group, &bases, &y, &proof).unwrap());

        let other_y = group.mul(&y, &bases[0]).unwrap();
        assert!(!verify(&group, &bases, &other_y, &proof).unwrap());
    }

    #[test]
    fn mismatched_boundaries_are_rejected() {
        let group = QrSpecialRsaSecret::generate(128).unwrap().group;
        let base = group.random_element().unwrap();
        let mut prover =
            RepresentationProver::new(&group, vec![BigNumber::from_u32(5).unwrap()], vec![base])
                .unwrap();
        assert!(prover.random_data_given_boundaries(&[10, 10], false).is_err());
    }

    #[test]
    fn proof_with_missing_response_fails() {
        let group = QrSpecialRsaSecret::generate(128).unwrap().group;
        let base = group.random_element().unwrap();
        let proof = RepresentationProof {
            random_data: base.clone(),
            challenge: BigNumber::from_u32(1).unwrap(),
            responses: vec![],
        };
        assert!(!verify(&group, &[base.clone()], &base, &proof).unwrap());
    }
}
