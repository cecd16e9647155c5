use super::helpers::*;
use super::raw_cred::RawCred;
use super::verifier::{
    cred_request_challenge, possession_boundaries, possession_challenge, possession_statement,
    strictly_increasing_below, verify_signature,
};
use super::*;
use crate::bn::BigNumber;
use crate::commitments::damgard_fujisaki::{DamgardFujisakiCommitter, OpeningProof, OpeningProver};
use crate::commitments::pedersen::PedersenCommitter;
use crate::errors::prelude::*;
use crate::zkp::representation::{RepresentationProof, RepresentationProver};
use crate::zkp::schnorr::{SchnorrProof, SchnorrProver};

/// Serializable snapshot of a credential manager. Together with the master
/// secret and the attribute values it restores a manager able to update
/// and prove, but not to request a new credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredManagerContext {
    pub nym: BigNumber,
    pub v1: Option<BigNumber>,
    pub cred_req_nonce: Option<BigNumber>,
    pub pub_key: PubKey,
    pub params: Params,
    pub commitments_of_attrs: Vec<BigNumber>,
}

enum ManagerState {
    Fresh {
        nym_committer: PedersenCommitter,
        attr_committers: Vec<DamgardFujisakiCommitter>,
    },
    Restored,
}

/// Holder side of the scheme: requests, checks, randomizes and proves
/// possession of one credential.
pub struct CredManager {
    params: Params,
    pub_key: PubKey,
    master_secret: BigNumber,
    raw_cred: RawCred,
    nym: BigNumber,
    v1: Option<BigNumber>,
    cred_req_nonce: Option<BigNumber>,
    commitments_of_attrs: Vec<BigNumber>,
    // schemas never declare hidden attributes, the key may still carry bases
    hidden: Vec<BigNumber>,
    state: ManagerState,
}

impl CredManager {
    /// Commits to every committed attribute and derives the pseudonym from
    /// `master_secret`. All attributes of `raw_cred` must have values.
    pub fn new(
        params: Params,
        pub_key: PubKey,
        master_secret: BigNumber,
        raw_cred: RawCred,
    ) -> AnonCredsResult<CredManager> {
        trace!(
            "CredManager::new: >>> pub_key: {:?}, master_secret: {:?}, raw_cred: {}",
            pub_key,
            secret!(&master_secret),
            raw_cred
        );

        Self::check_raw_cred(&params, &pub_key, &raw_cred)?;

        let df_params = pub_key.df_params();
        let attr_committers = raw_cred
            .committed_values()?
            .iter()
            .map(|v| DamgardFujisakiCommitter::commit(&df_params, params.sec_param, v))
            .collect::<AnonCredsResult<Vec<DamgardFujisakiCommitter>>>()?;
        let commitments_of_attrs = attr_committers
            .iter()
            .map(|c| c.commitment().clone())
            .collect();

        let nym_committer = PedersenCommitter::commit(&pub_key.pedersen, &master_secret)?;
        let nym = nym_committer.commitment().clone();

        trace!("CredManager::new: <<< nym: {:?}", nym);

        Ok(CredManager {
            params,
            pub_key,
            master_secret,
            raw_cred,
            nym,
            v1: None,
            cred_req_nonce: None,
            commitments_of_attrs,
            hidden: Vec::new(),
            state: ManagerState::Fresh {
                nym_committer,
                attr_committers,
            },
        })
    }

    pub fn restore(
        context: CredManagerContext,
        master_secret: BigNumber,
        raw_cred: RawCred,
    ) -> AnonCredsResult<CredManager> {
        trace!("CredManager::restore: >>> context: {:?}", context);

        Self::check_raw_cred(&context.params, &context.pub_key, &raw_cred)?;
        if context.commitments_of_attrs.len() != context.pub_key.rs_committed.len() {
            return Err(err_msg(
                AnonCredsErrorKind::InvalidStructure,
                "Context carries a wrong number of attribute commitments",
            ));
        }

        Ok(CredManager {
            params: context.params,
            pub_key: context.pub_key,
            master_secret,
            raw_cred,
            nym: context.nym,
            v1: context.v1,
            cred_req_nonce: context.cred_req_nonce,
            commitments_of_attrs: context.commitments_of_attrs,
            hidden: Vec::new(),
            state: ManagerState::Restored,
        })
    }

    pub fn context(&self) -> CredManagerContext {
        CredManagerContext {
            nym: self.nym.clone(),
            v1: self.v1.clone(),
            cred_req_nonce: self.cred_req_nonce.clone(),
            pub_key: self.pub_key.clone(),
            params: self.params.clone(),
            commitments_of_attrs: self.commitments_of_attrs.clone(),
        }
    }

    fn check_raw_cred(params: &Params, pub_key: &PubKey, raw_cred: &RawCred) -> AnonCredsResult<()> {
        params.validate()?;
        raw_cred.missing_attrs()?;
        pub_key.check_attr_count(&raw_cred.attr_count())?;

        if !check_bit_len(&raw_cred.known_values()?, params.attr_bit_len)
            || !check_bit_len(&raw_cred.committed_values()?, params.attr_bit_len)
        {
            return Err(err_msg(
                AnonCredsErrorKind::Attribute,
                format!("Attribute value exceeds {} bits", params.attr_bit_len),
            ));
        }
        Ok(())
    }

    pub fn nym(&self) -> &BigNumber {
        &self.nym
    }

    pub fn raw_cred(&self) -> &RawCred {
        &self.raw_cred
    }

    pub fn pub_key(&self) -> &PubKey {
        &self.pub_key
    }

    pub fn cred_req_nonce(&self) -> Option<&BigNumber> {
        self.cred_req_nonce.as_ref()
    }

    /// Builds a credential request answering `issuer_nonce` and remembers
    /// the blinding exponent `V1` and the request nonce.
    pub fn cred_request(&mut self, issuer_nonce: &BigNumber) -> AnonCredsResult<CredRequest> {
        trace!("CredManager::cred_request: >>> issuer_nonce: {:?}", issuer_nonce);

        let (nym_committer, attr_committers) = match self.state {
            ManagerState::Fresh {
                ref nym_committer,
                ref attr_committers,
            } => (nym_committer, attr_committers),
            ManagerState::Restored => {
                return Err(err_msg(
                    AnonCredsErrorKind::InvalidState,
                    "Restored credential manager cannot request a new credential",
                ))
            }
        };

        let params = &self.params;
        let pub_key = &self.pub_key;
        let group = pub_key.group();

        let v1 = bn_rand_also_neg(params.n_length + params.sec_param)?;

        let mut u_bases = pub_key.rs_hidden.clone();
        u_bases.push(pub_key.s.clone());
        let mut u_secrets = self.hidden.clone();
        u_secrets.push(v1.clone());
        let u = multi_exp(&u_bases, &u_secrets, &group.n)?;

        let pedersen = nym_committer.params();
        let (ms, r) = nym_committer.decommitment();
        let mut nym_prover = SchnorrProver::new(
            &pedersen.group,
            vec![ms.clone(), r.clone()],
            vec![pedersen.group.g.clone(), pedersen.h.clone()],
        )?;
        let nym_random_data = nym_prover.random_data()?;

        let mut u_boundaries =
            vec![params.attr_bit_len + params.sec_param + params.hash_bit_len + 1; self.hidden.len()];
        u_boundaries.push(params.n_length + 2 * params.sec_param + params.hash_bit_len);
        let mut u_prover = RepresentationProver::new(&group, u_secrets, u_bases)?;
        let u_random_data = u_prover.random_data_given_boundaries(&u_boundaries, true)?;

        let mut attr_provers: Vec<OpeningProver> = attr_committers
            .iter()
            .map(|c| OpeningProver::new(c.clone(), params.hash_bit_len))
            .collect();
        let attr_random_data = attr_provers
            .iter_mut()
            .map(OpeningProver::random_data)
            .collect::<AnonCredsResult<Vec<BigNumber>>>()?;

        let mut random_data = vec![&nym_random_data, &u_random_data];
        random_data.extend(attr_random_data.iter());
        let challenge = cred_request_challenge(
            pub_key,
            &u,
            &self.nym,
            issuer_nonce,
            &self.commitments_of_attrs,
            &random_data,
        )?;

        let nym_proof = SchnorrProof {
            random_data: nym_random_data.clone(),
            challenge: challenge.clone(),
            responses: nym_prover.responses(&challenge)?,
        };
        let u_proof = RepresentationProof {
            random_data: u_random_data.clone(),
            challenge: challenge.clone(),
            responses: u_prover.responses(&challenge)?,
        };
        let commitments_of_attrs_proofs = attr_provers
            .iter()
            .zip(attr_random_data.iter())
            .map(|(prover, t)| {
                let (response1, response2) = prover.response(&challenge)?;
                Ok(OpeningProof {
                    random_data: t.clone(),
                    challenge: challenge.clone(),
                    response1,
                    response2,
                })
            })
            .collect::<AnonCredsResult<Vec<OpeningProof>>>()?;

        let nonce = new_nonce(params)?;

        let request = CredRequest {
            nym: self.nym.clone(),
            known_attrs: self.raw_cred.known_values()?,
            commitments_of_attrs: self.commitments_of_attrs.clone(),
            nym_proof,
            u,
            u_proof,
            commitments_of_attrs_proofs,
            nonce: nonce.clone(),
        };

        self.v1 = Some(v1);
        self.cred_req_nonce = Some(nonce);

        trace!("CredManager::cred_request: <<< request: {:?}", request);

        Ok(request)
    }

    fn v1(&self) -> AnonCredsResult<&BigNumber> {
        self.v1.as_ref().ok_or_else(|| {
            err_msg(
                AnonCredsErrorKind::InvalidState,
                "No credential has been requested yet",
            )
        })
    }

    /// Checks a credential and the issuer's proof against the current
    /// attribute values. `Ok(false)` means the credential is not valid.
    pub fn verify(&self, cred: &Cred, a_proof: &RepresentationProof) -> AnonCredsResult<bool> {
        self.verify_known(&self.raw_cred.known_values()?, cred, a_proof)
    }

    /// Like [`verify`](CredManager::verify), but against the values of an
    /// update that has not been applied yet.
    pub fn verify_update(
        &self,
        raw_cred: &RawCred,
        cred: &Cred,
        a_proof: &RepresentationProof,
    ) -> AnonCredsResult<bool> {
        self.check_update(raw_cred)?;
        self.verify_known(&raw_cred.known_values()?, cred, a_proof)
    }

    fn verify_known(
        &self,
        known: &[BigNumber],
        cred: &Cred,
        a_proof: &RepresentationProof,
    ) -> AnonCredsResult<bool> {
        trace!(
            "CredManager::verify: >>> cred: {:?}, a_proof: {:?}",
            cred,
            a_proof
        );

        let v = self.v1()?.add(&cred.v11)?;
        let nonce = self.cred_req_nonce.as_ref().ok_or_else(|| {
            err_msg(
                AnonCredsErrorKind::InvalidState,
                "No credential request nonce",
            )
        })?;

        let valid = verify_signature(
            &self.params,
            &self.pub_key,
            cred,
            &v,
            known,
            &self.commitments_of_attrs,
            &self.hidden,
            a_proof,
            nonce,
        )?;

        trace!("CredManager::verify: <<< valid: {:?}", valid);

        Ok(valid)
    }

    /// Fails unless `raw_cred` can replace the current values. Committed
    /// values are bound by their commitments and cannot change.
    pub fn check_update(&self, raw_cred: &RawCred) -> AnonCredsResult<()> {
        Self::check_raw_cred(&self.params, &self.pub_key, raw_cred)?;
        if raw_cred.committed_values()? != self.raw_cred.committed_values()? {
            return Err(err_msg(
                AnonCredsErrorKind::Attribute,
                "Committed attributes cannot be updated",
            ));
        }
        Ok(())
    }

    /// Replaces the attribute values once a credential over them is held.
    pub fn update(&mut self, raw_cred: RawCred) -> AnonCredsResult<()> {
        trace!("CredManager::update: >>> raw_cred: {}", raw_cred);

        self.check_update(&raw_cred)?;
        self.raw_cred = raw_cred;
        Ok(())
    }

    /// Known values and commitments at the given partition positions.
    pub fn filter_attributes(
        &self,
        revealed_known_indices: &[usize],
        revealed_committed_indices: &[usize],
    ) -> AnonCredsResult<(Vec<BigNumber>, Vec<BigNumber>)> {
        let known = self.raw_cred.known_values()?;
        if !strictly_increasing_below(revealed_known_indices, known.len())
            || !strictly_increasing_below(revealed_committed_indices, self.commitments_of_attrs.len())
        {
            return Err(err_msg(
                AnonCredsErrorKind::Attribute,
                "Revealed indices must be ascending positions of existing attributes",
            ));
        }

        let known = revealed_known_indices
            .iter()
            .map(|i| known[*i].clone())
            .collect();
        let commitments = revealed_committed_indices
            .iter()
            .map(|i| self.commitments_of_attrs[*i].clone())
            .collect();
        Ok((known, commitments))
    }

    /// `A' = A * S^r`, `V11' = V11 - E*r` for `r` from `±{0,1}^(NLength+SecParam)`.
    pub fn randomize(&self, cred: &Cred) -> AnonCredsResult<Cred> {
        let group = self.pub_key.group();
        let r = bn_rand_also_neg(self.params.n_length + self.params.sec_param)?;

        let a = group.mul(&cred.a, &group.exp(&self.pub_key.s, &r)?)?;
        let v11 = cred.v11.sub(&cred.e.mul(&r)?)?;

        Ok(Cred::new(a, cred.e.clone(), v11))
    }

    /// Randomizes `cred` and proves possession of it, revealing the known
    /// values and commitments at the given positions. The verifier has to
    /// use the returned `A'`.
    pub fn build_proof(
        &self,
        cred: &Cred,
        revealed_known_indices: &[usize],
        revealed_committed_indices: &[usize],
        nonce: &BigNumber,
    ) -> AnonCredsResult<(Cred, RepresentationProof)> {
        trace!(
            "CredManager::build_proof: >>> revealed_known_indices: {:?}, revealed_committed_indices: {:?}, nonce: {:?}",
            revealed_known_indices,
            revealed_committed_indices,
            nonce
        );

        let v1 = self.v1()?;
        let params = &self.params;
        let (revealed_known, revealed_commitments) =
            self.filter_attributes(revealed_known_indices, revealed_committed_indices)?;

        let rcred = self.randomize(cred)?;

        let (bases, y) = possession_statement(
            params,
            &self.pub_key,
            &rcred.a,
            revealed_known_indices,
            revealed_committed_indices,
            &revealed_known,
            &revealed_commitments,
        )?;

        let mut secrets = Vec::new();
        for (i, value) in self.raw_cred.known_values()?.into_iter().enumerate() {
            if !revealed_known_indices.contains(&i) {
                secrets.push(value);
            }
        }
        let unrevealed_known = secrets.len();
        for (i, commitment) in self.commitments_of_attrs.iter().enumerate() {
            if !revealed_committed_indices.contains(&i) {
                secrets.push(commitment.clone());
            }
        }
        let unrevealed_committed = secrets.len() - unrevealed_known;
        secrets.extend(self.hidden.iter().cloned());
        let (e_start, _) = e_range(params.e_bit_len, params.e1_bit_len)?;
        secrets.push(rcred.e.sub(&e_start)?);
        secrets.push(v1.add(&rcred.v11)?);

        let boundaries = possession_boundaries(
            params,
            unrevealed_known,
            unrevealed_committed,
            self.hidden.len(),
        );
        let mut prover = RepresentationProver::new(&self.pub_key.group(), secrets, bases)?;
        let random_data = prover.random_data_given_boundaries(&boundaries, true)?;
        let challenge = possession_challenge(&self.pub_key, &rcred.a, &y, &random_data, nonce)?;
        let responses = prover.responses(&challenge)?;

        let proof = RepresentationProof {
            random_data,
            challenge,
            responses,
        };

        trace!("CredManager::build_proof: <<< a: {:?}", rcred.a);

        Ok((rcred, proof))
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use crate::cl::attribute::{AttrCount, AttrType};
    use crate::cl::issuer;

    /// `date_from`, `date_to` and `name` known, `gender` committed.
    pub fn raw_cred() -> RawCred {
        let mut rc = RawCred::new(AttrCount::new(3, 1, 0));
        rc.add_empty_attr("date_from", 0, true, AttrType::Int64).unwrap();
        rc.add_empty_attr("date_to", 1, true, AttrType::Int64).unwrap();
        rc.add_empty_attr("name", 2, true, AttrType::String).unwrap();
        rc.add_empty_attr("gender", 3, false, AttrType::String).unwrap();
        rc.update_attr("date_from", 1512643000i64).unwrap();
        rc.update_attr("date_to", 1592643000i64).unwrap();
        rc.update_attr("name", "Jack").unwrap();
        rc.update_attr("gender", "M").unwrap();
        rc
    }

    pub fn cred_manager() -> CredManager {
        let pub_key = issuer::mocks::key_pair().pub_key;
        let master_secret = pub_key.generate_master_secret().unwrap();
        CredManager::new(Params::default(), pub_key, master_secret, raw_cred()).unwrap()
    }
}
