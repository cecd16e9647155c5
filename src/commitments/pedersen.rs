use crate::bn::BigNumber;
use crate::errors::prelude::*;
use crate::groups::schnorr::SchnorrGroup;
use crate::utils::commitment::get_pedersen_commitment;

/// Pedersen commitment parameters: a Schnorr group and a second generator
/// `h` whose discrete logarithm to `g` is unknown to committers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PedersenParams {
    pub group: SchnorrGroup,
    pub h: BigNumber,
}

impl PedersenParams {
    pub fn generate(group: SchnorrGroup) -> AnonCredsResult<PedersenParams> {
        let trapdoor = group.random_exponent()?;
        let h = group.exp(&group.g, &trapdoor)?;
        Ok(PedersenParams { group, h })
    }

    pub fn compute_commit(&self, value: &BigNumber, r: &BigNumber) -> AnonCredsResult<BigNumber> {
        get_pedersen_commitment(&self.group.g, value, &self.h, r, &self.group.p)
    }

    pub fn verify_opening(
        &self,
        commitment: &BigNumber,
        value: &BigNumber,
        r: &BigNumber,
    ) -> AnonCredsResult<bool> {
        Ok(&self.compute_commit(value, r)? == commitment)
    }
}

/// Holds a value committed under Pedersen parameters together with its
/// opening.
#[derive(Debug, Clone)]
pub struct PedersenCommitter {
    params: PedersenParams,
    value: BigNumber,
    r: BigNumber,
    commitment: BigNumber,
}

impl PedersenCommitter {
    pub fn commit(params: &PedersenParams, value: &BigNumber) -> AnonCredsResult<PedersenCommitter> {
        let r = params.group.random_exponent()?;
        let commitment = params.compute_commit(value, &r)?;
        Ok(PedersenCommitter {
            params: params.clone(),
            value: value.clone(),
            r,
            commitment,
        })
    }

    pub fn commitment(&self) -> &BigNumber {
        &self.commitment
    }

    pub fn params(&self) -> &PedersenParams {
        &self.params
    }

    /// Returns `(value, r)`.
    pub fn decommitment(&self) -> (&BigNumber, &BigNumber) {
        (&self.value, &self.r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_opens() {
        let params = PedersenParams::generate(SchnorrGroup::generate(64, 64).unwrap()).unwrap();
        let value = params.group.random_exponent().unwrap();
        let committer = PedersenCommitter::commit(&params, &value).unwrap();

        let (v, r) = committer.decommitment();
        assert!(params.verify_opening(committer.commitment(), v, r).unwrap());

        let other = value.increment().unwrap();
        assert!(!params.verify_opening(committer.commitment(), &other, r).unwrap());
    }

    #[test]
    fn commitments_are_hiding() {
        let params = PedersenParams::generate(SchnorrGroup::generate(64, 64).unwrap()).unwrap();
        let value = BigNumber::from_u32(42).unwrap();
        let c1 = PedersenCommitter::commit(&params, &value).unwrap();
        let c2 = PedersenCommitter::commit(&params, &value).unwrap();
        assert_ne!(c1.commitment(), c2.commitment());
        assert!(params.group.is_element(c1.commitment()));
    }
}
