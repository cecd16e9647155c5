pub mod attribute;
pub mod client;
pub mod constants;
pub mod hash;
pub mod helpers;
pub mod issuer;
pub mod messages;
pub mod prover;
pub mod raw_cred;
pub mod server;
pub mod storage;
pub mod verifier;

use self::attribute::AttrCount;
use self::constants::*;
use self::hash::hash_numbers;
use crate::bn::BigNumber;
use crate::commitments::damgard_fujisaki::{DamgardFujisakiParams, OpeningProof};
use crate::commitments::pedersen::PedersenParams;
use crate::errors::prelude::*;
use crate::groups::qr::{QrSpecialRsa, QrSpecialRsaSecret};
use crate::zkp::representation::RepresentationProof;
use crate::zkp::schnorr::SchnorrProof;

use std::fs;
use std::path::Path;

/// Bit lengths of the scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub rho_bit_len: usize,
    pub n_length: usize,
    pub attr_bit_len: usize,
    pub hash_bit_len: usize,
    pub sec_param: usize,
    pub e_bit_len: usize,
    pub e1_bit_len: usize,
    pub v_bit_len: usize,
    /// Miller-Rabin rounds applied to a credential's `E`.
    pub prime_checks: usize,
}

impl Default for Params {
    fn default() -> Params {
        Params {
            rho_bit_len: RHO_BIT_LEN,
            n_length: N_LENGTH,
            attr_bit_len: ATTR_BIT_LEN,
            hash_bit_len: HASH_BIT_LEN,
            sec_param: SEC_PARAM,
            e_bit_len: E_BIT_LEN,
            e1_bit_len: E1_BIT_LEN,
            v_bit_len: V_BIT_LEN,
            prime_checks: PRIME_CHECKS,
        }
    }
}

impl Params {
    /// Rejects zero bit lengths and an `E` window wider than `E` itself.
    pub fn validate(&self) -> AnonCredsResult<()> {
        let lengths = [
            ("rho_bit_len", self.rho_bit_len),
            ("n_length", self.n_length),
            ("attr_bit_len", self.attr_bit_len),
            ("hash_bit_len", self.hash_bit_len),
            ("sec_param", self.sec_param),
            ("e_bit_len", self.e_bit_len),
            ("e1_bit_len", self.e1_bit_len),
            ("v_bit_len", self.v_bit_len),
        ];
        if let Some((name, _)) = lengths.iter().find(|(_, len)| *len == 0) {
            return Err(err_msg(
                AnonCredsErrorKind::InvalidStructure,
                format!("Parameter '{}' must be positive", name),
            ));
        }
        if self.e1_bit_len >= self.e_bit_len {
            return Err(err_msg(
                AnonCredsErrorKind::InvalidStructure,
                format!(
                    "E1 bit length {} must be below E bit length {}",
                    self.e1_bit_len, self.e_bit_len
                ),
            ));
        }
        Ok(())
    }
}

/// Issuer public key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PubKey {
    pub n: BigNumber,
    pub s: BigNumber,
    pub z: BigNumber,
    pub rs_known: Vec<BigNumber>,
    pub rs_committed: Vec<BigNumber>,
    pub rs_hidden: Vec<BigNumber>,
    pub pedersen: PedersenParams,
    pub n1: BigNumber,
    pub g: BigNumber,
    pub h: BigNumber,
}

impl PubKey {
    pub fn group(&self) -> QrSpecialRsa {
        QrSpecialRsa::new(self.n.clone())
    }

    pub fn df_params(&self) -> DamgardFujisakiParams {
        DamgardFujisakiParams {
            n: self.n1.clone(),
            g: self.g.clone(),
            h: self.h.clone(),
        }
    }

    pub fn attr_count(&self) -> AttrCount {
        AttrCount::new(
            self.rs_known.len(),
            self.rs_committed.len(),
            self.rs_hidden.len(),
        )
    }

    /// Hash of every public element. Bound into each Fiat-Shamir challenge.
    pub fn context(&self) -> AnonCredsResult<BigNumber> {
        let mut nums: Vec<&BigNumber> = vec![&self.n, &self.s, &self.z];
        nums.extend(self.rs_known.iter());
        nums.extend(self.rs_committed.iter());
        nums.extend(self.rs_hidden.iter());
        nums.extend(&[
            &self.pedersen.group.p,
            &self.pedersen.group.q,
            &self.pedersen.group.g,
            &self.pedersen.h,
            &self.n1,
            &self.g,
            &self.h,
        ]);
        hash_numbers(&nums)
    }

    /// A fresh master secret, an exponent of the pseudonym group.
    pub fn generate_master_secret(&self) -> AnonCredsResult<BigNumber> {
        self.pedersen.group.random_exponent()
    }

    /// Fails when the key was generated for a different attribute layout.
    pub fn check_attr_count(&self, count: &AttrCount) -> AnonCredsResult<()> {
        let expected = self.attr_count();
        let mismatch = |what: &str, config: usize, key: usize| {
            err_msg(
                AnonCredsErrorKind::Config,
                format!(
                    "Expected {} {} attributes, key supports {}",
                    config, what, key
                ),
            )
        };

        if count.known != expected.known {
            return Err(mismatch("known", count.known, expected.known));
        }
        if count.committed != expected.committed {
            return Err(mismatch("committed", count.committed, expected.committed));
        }
        if count.hidden != expected.hidden {
            return Err(mismatch("hidden", count.hidden, expected.hidden));
        }
        Ok(())
    }
}

/// Factorization of the signing modulus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecKey {
    pub qr: QrSpecialRsaSecret,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPair {
    pub pub_key: PubKey,
    pub sec_key: SecKey,
}

impl KeyPair {
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> AnonCredsResult<()> {
        trace!("KeyPair::write_to_file: >>> path: {:?}", path.as_ref());
        fs::write(path, serde_json::to_vec(self)?)?;
        Ok(())
    }

    pub fn read_from_file<P: AsRef<Path>>(path: P) -> AnonCredsResult<KeyPair> {
        trace!("KeyPair::read_from_file: >>> path: {:?}", path.as_ref());
        let data = fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }
}

/// Issuer's signature `(A, E, V11)` over a credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cred {
    pub a: BigNumber,
    pub e: BigNumber,
    pub v11: BigNumber,
}

impl Cred {
    pub fn new(a: BigNumber, e: BigNumber, v11: BigNumber) -> Cred {
        Cred { a, e, v11 }
    }
}

/// Everything the issuer needs to sign a credential for a pseudonym.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredRequest {
    pub nym: BigNumber,
    pub known_attrs: Vec<BigNumber>,
    pub commitments_of_attrs: Vec<BigNumber>,
    pub nym_proof: SchnorrProof,
    pub u: BigNumber,
    pub u_proof: RepresentationProof,
    pub commitments_of_attrs_proofs: Vec<OpeningProof>,
    pub nonce: BigNumber,
}

/// A credential together with the issuer's proof that `A = Q^(1/E)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedCred {
    pub cred: Cred,
    pub a_proof: RepresentationProof,
}

/// Random nonce of `sec_param` bits.
pub fn new_nonce(params: &Params) -> AnonCredsResult<BigNumber> {
    helpers::bn_rand(params.sec_param)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_default_matches_scheme_sizes() {
        let params = Params::default();
        assert_eq!(256, params.n_length);
        assert_eq!(597, params.e_bit_len);
        assert_eq!(2724, params.v_bit_len);
        assert_eq!(20, params.prime_checks);
    }

    #[test]
    fn params_validate_works() {
        Params::default().validate().unwrap();

        let params: Params = serde_json::from_str(r#"{"e_bit_len": 0}"#).unwrap();
        let err = params.validate().unwrap_err();
        assert_eq!(AnonCredsErrorKind::InvalidStructure, err.kind());

        let params = Params {
            e1_bit_len: 597,
            ..Params::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn params_fill_missing_fields_with_defaults() {
        let params: Params = serde_json::from_str(r#"{"n_length": 1024}"#).unwrap();
        assert_eq!(1024, params.n_length);
        assert_eq!(80, params.sec_param);
    }
}
