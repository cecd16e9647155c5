use super::attribute::AttrCount;
use super::helpers::*;
use super::verifier::{cred_request_challenge, signature_challenge};
use super::*;
use crate::bn::BigNumber;
use crate::commitments::damgard_fujisaki::{self, DamgardFujisakiParams};
use crate::commitments::pedersen::PedersenParams;
use crate::errors::prelude::*;
use crate::groups::qr::QrSpecialRsaSecret;
use crate::groups::schnorr::SchnorrGroup;
use crate::zkp::representation::{self, RepresentationProver};
use crate::zkp::schnorr;

/// What the issuer remembers about a credential it signed, keyed by the
/// holder's pseudonym. Enough to sign again over new known values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiverRecord {
    pub known_attrs: Vec<BigNumber>,
    pub commitments_of_attrs: Vec<BigNumber>,
    pub u: BigNumber,
    pub nonce: BigNumber,
}

/// Trust source that signs credentials.
#[derive(Debug)]
pub struct Issuer {
    params: Params,
    key_pair: KeyPair,
}

impl Issuer {
    pub fn new(params: Params, key_pair: KeyPair) -> Issuer {
        Issuer { params, key_pair }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn pub_key(&self) -> &PubKey {
        &self.key_pair.pub_key
    }

    /// Generates a key pair supporting the given attribute layout.
    ///
    /// # Example
    /// ```
    /// use clauth::cl::attribute::AttrCount;
    /// use clauth::cl::issuer::Issuer;
    /// use clauth::cl::Params;
    ///
    /// let key_pair = Issuer::new_key_pair(&Params::default(), &AttrCount::new(2, 1, 0)).unwrap();
    /// assert_eq!(2, key_pair.pub_key.rs_known.len());
    /// ```
    pub fn new_key_pair(params: &Params, attr_count: &AttrCount) -> AnonCredsResult<KeyPair> {
        trace!(
            "Issuer::new_key_pair: >>> params: {:?}, attr_count: {}",
            params,
            attr_count
        );

        params.validate()?;

        let qr = QrSpecialRsaSecret::generate(params.n_length)?;
        let group = &qr.group;

        let s = group.random_element()?;
        let gen_base = |count: usize| -> AnonCredsResult<Vec<BigNumber>> {
            (0..count)
                .map(|_| group.exp(&s, &qr.random_exponent()?))
                .collect()
        };

        let z = group.exp(&s, &qr.random_exponent()?)?;
        let rs_known = gen_base(attr_count.known)?;
        let rs_committed = gen_base(attr_count.committed)?;
        let rs_hidden = gen_base(attr_count.hidden)?;

        let df_qr = QrSpecialRsaSecret::generate(params.n_length)?;
        let df = DamgardFujisakiParams::generate(&df_qr)?;

        let pedersen = PedersenParams::generate(SchnorrGroup::generate(
            params.rho_bit_len,
            params.rho_bit_len,
        )?)?;

        let pub_key = PubKey {
            n: group.n.clone(),
            s,
            z,
            rs_known,
            rs_committed,
            rs_hidden,
            pedersen,
            n1: df.n,
            g: df.g,
            h: df.h,
        };

        trace!("Issuer::new_key_pair: <<< pub_key: {:?}", pub_key);

        Ok(KeyPair {
            pub_key,
            sec_key: SecKey { qr },
        })
    }

    pub fn new_nonce(&self) -> AnonCredsResult<BigNumber> {
        new_nonce(&self.params)
    }

    /// Verifies a credential request and signs it.
    ///
    /// `issuer_nonce` is the nonce sent to the holder before the request was
    /// built. Malformed requests fail with `Protocol`, requests whose proofs
    /// do not verify fail with `ProofRejected`.
    pub fn issue(
        &self,
        request: &CredRequest,
        issuer_nonce: &BigNumber,
    ) -> AnonCredsResult<(IssuedCred, ReceiverRecord)> {
        trace!(
            "Issuer::issue: >>> request: {:?}, issuer_nonce: {:?}",
            request,
            issuer_nonce
        );

        self.check_request_structure(request)?;
        self.check_request_proofs(request, issuer_nonce)?;

        let issued = self.sign(
            &request.u,
            &request.known_attrs,
            &request.commitments_of_attrs,
            &request.nonce,
        )?;
        let record = ReceiverRecord {
            known_attrs: request.known_attrs.clone(),
            commitments_of_attrs: request.commitments_of_attrs.clone(),
            u: request.u.clone(),
            nonce: request.nonce.clone(),
        };

        trace!("Issuer::issue: <<< issued: {:?}", issued);

        Ok((issued, record))
    }

    /// Signs again over new known values for a previously issued
    /// credential. Committed and hidden attributes are taken from `record`
    /// and are not checked again.
    pub fn update(
        &self,
        record: &ReceiverRecord,
        nonce: &BigNumber,
        new_known_attrs: &[BigNumber],
    ) -> AnonCredsResult<(IssuedCred, ReceiverRecord)> {
        trace!(
            "Issuer::update: >>> record: {:?}, nonce: {:?}, new_known_attrs: {:?}",
            record,
            nonce,
            new_known_attrs
        );

        if nonce != &record.nonce {
            return Err(err_msg(
                AnonCredsErrorKind::Protocol,
                "Update nonce does not match the issued credential",
            ));
        }
        self.check_known_attrs(new_known_attrs)?;

        let issued = self.sign(
            &record.u,
            new_known_attrs,
            &record.commitments_of_attrs,
            &record.nonce,
        )?;
        let record = ReceiverRecord {
            known_attrs: new_known_attrs.to_vec(),
            ..record.clone()
        };

        trace!("Issuer::update: <<< issued: {:?}", issued);

        Ok((issued, record))
    }

    fn check_known_attrs(&self, known_attrs: &[BigNumber]) -> AnonCredsResult<()> {
        let pub_key = self.pub_key();
        if known_attrs.len() != pub_key.rs_known.len() {
            return Err(err_msg(
                AnonCredsErrorKind::Protocol,
                format!(
                    "Expected {} known attributes, got {}",
                    pub_key.rs_known.len(),
                    known_attrs.len()
                ),
            ));
        }
        if !check_bit_len(known_attrs, self.params.attr_bit_len) {
            return Err(err_msg(
                AnonCredsErrorKind::Protocol,
                "Known attribute exceeds the attribute bit length",
            ));
        }
        Ok(())
    }

    fn check_request_structure(&self, request: &CredRequest) -> AnonCredsResult<()> {
        let pub_key = self.pub_key();
        self.check_known_attrs(&request.known_attrs)?;

        if request.commitments_of_attrs.len() != pub_key.rs_committed.len()
            || request.commitments_of_attrs_proofs.len() != pub_key.rs_committed.len()
        {
            return Err(err_msg(
                AnonCredsErrorKind::Protocol,
                format!(
                    "Expected {} committed attributes with opening proofs",
                    pub_key.rs_committed.len()
                ),
            ));
        }
        if request.nym_proof.responses.len() != 2
            || request.u_proof.responses.len() != pub_key.rs_hidden.len() + 1
        {
            return Err(err_msg(
                AnonCredsErrorKind::Protocol,
                "Credential request proofs carry a wrong number of responses",
            ));
        }
        Ok(())
    }

    fn check_request_proofs(
        &self,
        request: &CredRequest,
        issuer_nonce: &BigNumber,
    ) -> AnonCredsResult<()> {
        let pub_key = self.pub_key();
        let rejected = |msg: &str| err_msg(AnonCredsErrorKind::ProofRejected, msg.to_string());

        let mut random_data = vec![&request.nym_proof.random_data, &request.u_proof.random_data];
        random_data.extend(
            request
                .commitments_of_attrs_proofs
                .iter()
                .map(|p| &p.random_data),
        );
        let challenge = cred_request_challenge(
            pub_key,
            &request.u,
            &request.nym,
            issuer_nonce,
            &request.commitments_of_attrs,
            &random_data,
        )?;

        if request.nym_proof.challenge != challenge
            || request.u_proof.challenge != challenge
            || request
                .commitments_of_attrs_proofs
                .iter()
                .any(|p| p.challenge != challenge)
        {
            debug!("Credential request challenge is not correct");
            return Err(rejected("Credential request challenge mismatch"));
        }

        let pedersen = &pub_key.pedersen;
        let nym_bases = [pedersen.group.g.clone(), pedersen.h.clone()];
        if !schnorr::verify(&pedersen.group, &nym_bases, &request.nym, &request.nym_proof)? {
            debug!("Nym proof does not verify");
            return Err(rejected("Nym proof failed"));
        }

        let mut u_bases = pub_key.rs_hidden.clone();
        u_bases.push(pub_key.s.clone());
        if !representation::verify(&pub_key.group(), &u_bases, &request.u, &request.u_proof)? {
            debug!("U proof does not verify");
            return Err(rejected("U proof failed"));
        }

        let df_params = pub_key.df_params();
        for (commitment, proof) in request
            .commitments_of_attrs
            .iter()
            .zip(request.commitments_of_attrs_proofs.iter())
        {
            if !damgard_fujisaki::verify_opening(&df_params, commitment, proof)? {
                debug!("Commitment opening proof does not verify");
                return Err(rejected("Commitment opening proof failed"));
            }
        }

        Ok(())
    }

    /// `A = Q^(1/E)` with `Q = Z / (U * S^V11 * prod R_i^m_i)`, together with
    /// a proof of knowledge of `1/E` bound to `nonce`.
    fn sign(
        &self,
        u: &BigNumber,
        known_attrs: &[BigNumber],
        commitments_of_attrs: &[BigNumber],
        nonce: &BigNumber,
    ) -> AnonCredsResult<IssuedCred> {
        trace!(
            "Issuer::sign: >>> u: {:?}, known_attrs: {:?}, nonce: {:?}",
            u,
            known_attrs,
            nonce
        );

        let params = &self.params;
        let pub_key = self.pub_key();
        let group = pub_key.group();

        let (e_start, e_end) = e_range(params.e_bit_len, params.e1_bit_len)?;
        let e = generate_prime_in_range(&e_start, &e_end)?;
        let v11 = generate_v11(params.v_bit_len)?;

        let mut bases = vec![pub_key.s.clone()];
        bases.extend(pub_key.rs_known.iter().cloned());
        bases.extend(pub_key.rs_committed.iter().cloned());
        let mut exps = vec![v11.clone()];
        exps.extend(known_attrs.iter().cloned());
        exps.extend(commitments_of_attrs.iter().cloned());

        let denom = group.mul(u, &multi_exp(&bases, &exps, &group.n)?)?;
        let q = group.mul(&pub_key.z, &group.inv(&denom)?)?;

        let order = self.key_pair.sec_key.qr.order()?;
        let e_inv = e.inverse(&order)?;
        let a = group.exp(&q, &e_inv)?;

        let mut prover = RepresentationProver::new(&group, vec![e_inv], vec![q.clone()])?;
        let random_data = prover.random_data_given_boundaries(
            &[params.n_length + params.sec_param + params.hash_bit_len],
            false,
        )?;
        let challenge = signature_challenge(pub_key, &q, &a, &random_data, nonce)?;
        let responses = prover.responses(&challenge)?;

        let issued = IssuedCred {
            cred: Cred::new(a, e, v11),
            a_proof: representation::RepresentationProof {
                random_data,
                challenge,
                responses,
            },
        };

        trace!("Issuer::sign: <<< cred: {:?}", issued.cred);

        Ok(issued)
    }
}
