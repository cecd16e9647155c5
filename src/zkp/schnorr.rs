use crate::bn::BigNumber;
use crate::cl::helpers::multi_exp;
use crate::errors::prelude::*;
use crate::groups::schnorr::SchnorrGroup;

/// Proof of knowledge of a representation of `y` in bases `g_1..g_k` of a
/// Schnorr group. Responses are reduced modulo the group order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchnorrProof {
    pub random_data: BigNumber,
    pub challenge: BigNumber,
    pub responses: Vec<BigNumber>,
}

pub struct SchnorrProver {
    group: SchnorrGroup,
    secrets: Vec<BigNumber>,
    bases: Vec<BigNumber>,
    randomness: Vec<BigNumber>,
}

impl SchnorrProver {
    pub fn new(
        group: &SchnorrGroup,
        secrets: Vec<BigNumber>,
        bases: Vec<BigNumber>,
    ) -> AnonCredsResult<SchnorrProver> {
        if secrets.len() != bases.len() {
            return Err(err_msg(
                AnonCredsErrorKind::InvalidStructure,
                "Number of secrets and bases must match",
            ));
        }
        Ok(SchnorrProver {
            group: group.clone(),
            secrets,
            bases,
            randomness: Vec::new(),
        })
    }

    pub fn random_data(&mut self) -> AnonCredsResult<BigNumber> {
        self.randomness = self
            .bases
            .iter()
            .map(|_| self.group.random_exponent())
            .collect::<AnonCredsResult<Vec<BigNumber>>>()?;
        multi_exp(&self.bases, &self.randomness, &self.group.p)
    }

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
            .map(|(secret, r)| challenge.mul(secret)?.add(r)?.modulus(&self.group.q))
            .collect()
    }
}

/// Checks `prod g_i^z_i == t * y^c (mod p)`.
pub fn verify(
    group: &SchnorrGroup,
    bases: &[BigNumber],
    y: &BigNumber,
    proof: &SchnorrProof,
) -> AnonCredsResult<bool> {
    if bases.len() != proof.responses.len() {
        debug!(
            "Schnorr proof carries {} responses for {} bases",
            proof.responses.len(),
            bases.len()
        );
        return Ok(false);
    }

    let left = multi_exp(bases, &proof.responses, &group.p)?;
    let right = group.mul(&proof.random_data, &group.exp(y, &proof.challenge)?)?;
    Ok(left == right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cl::hash::hash_numbers;

    #[test]
    fn two_base_proof_verifies() {
        let group = SchnorrGroup::generate(64, 64).unwrap();
        let h = group.random_element().unwrap();
        let bases = vec![group.g.clone(), h];
        let secrets = vec![
            group.random_exponent().unwrap(),
            group.random_exponent().unwrap(),
        ];
        let y = multi_exp(&bases, &secrets, &group.p).unwrap();

        let mut prover = SchnorrProver::new(&group, secrets, bases.clone()).unwrap();
        let random_data = prover.random_data().unwrap();
        let challenge = hash_numbers(&[&y, &random_data]).unwrap();
        let responses = prover.responses(&challenge).unwrap();

        let proof = SchnorrProof {
            random_data,
            challenge,
            responses,
        };
        assert!(verify(&group, &bases, &y, &proof).unwrap());

        let mut forged = proof.clone();
        forged.challenge = forged.challenge.increment().unwrap();
        assert!(!verify(&group, &bases, &y, &forged).unwrap());
    }

    #[test]
    fn responses_before_random_data_fail() {
        let group = SchnorrGroup::generate(64, 64).unwrap();
        let prover = SchnorrProver::new(&group, vec![BigNumber::from_u32(3).unwrap()], vec![group.g.clone()]).unwrap();
        let err = prover.responses(&BigNumber::from_u32(1).unwrap()).unwrap_err();
        assert_eq!(AnonCredsErrorKind::InvalidState, err.kind());
    }
}
