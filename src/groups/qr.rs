use crate::bn::{BigNumber, BIGNUMBER_1};
use crate::cl::helpers::{bn_rand_range, generate_safe_prime, random_qr};
use crate::errors::prelude::*;

/// Group of quadratic residues modulo a special RSA modulus `N = (2p'+1)(2q'+1)`.
///
/// Only `N` is known, so the group order stays hidden. Exponents are taken
/// from `Z` and a negative exponent exponentiates the inverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrSpecialRsa {
    pub n: BigNumber,
}

impl QrSpecialRsa {
    pub fn new(n: BigNumber) -> QrSpecialRsa {
        QrSpecialRsa { n }
    }

    pub fn mul(&self, x: &BigNumber, y: &BigNumber) -> AnonCredsResult<BigNumber> {
        x.mod_mul(y, &self.n)
    }

    pub fn exp(&self, x: &BigNumber, exp: &BigNumber) -> AnonCredsResult<BigNumber> {
        x.mod_exp(exp, &self.n)
    }

    pub fn inv(&self, x: &BigNumber) -> AnonCredsResult<BigNumber> {
        x.inverse(&self.n)
    }

    /// Elements must lie in `[1, N)` and be units.
    pub fn is_element(&self, x: &BigNumber) -> bool {
        !x.is_negative() && !x.is_zero() && x < &self.n && x.inverse(&self.n).is_ok()
    }

    pub fn random_element(&self) -> AnonCredsResult<BigNumber> {
        random_qr(&self.n)
    }
}

/// The same group together with the factorization of `N`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrSpecialRsaSecret {
    pub group: QrSpecialRsa,
    pub p: BigNumber,
    pub q: BigNumber,
    pub p1: BigNumber,
    pub q1: BigNumber,
}

impl QrSpecialRsaSecret {
    /// Generates a modulus of `n_length` bits out of two safe primes.
    pub fn generate(n_length: usize) -> AnonCredsResult<QrSpecialRsaSecret> {
        trace!("QrSpecialRsaSecret::generate: >>> n_length: {}", n_length);

        let (p, q) = loop {
            let p = generate_safe_prime(n_length / 2)?;
            let q = generate_safe_prime(n_length / 2)?;
            if p != q {
                break (p, q);
            }
        };
        let p1 = p.sub(&BIGNUMBER_1)?.rshift(1)?;
        let q1 = q.sub(&BIGNUMBER_1)?.rshift(1)?;
        let n = p.mul(&q)?;

        trace!("QrSpecialRsaSecret::generate: <<< n: {:?}", n);

        Ok(QrSpecialRsaSecret {
            group: QrSpecialRsa::new(n),
            p,
            q,
            p1,
            q1,
        })
    }

    /// Order of the group of quadratic residues, `p'q'`.
    pub fn order(&self) -> AnonCredsResult<BigNumber> {
        self.p1.mul(&self.q1)
    }

    pub fn random_exponent(&self) -> AnonCredsResult<BigNumber> {
        bn_rand_range(&self.order()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_group_has_expected_structure() {
        let secret = QrSpecialRsaSecret::generate(128).unwrap();
        assert!(secret.p1.is_prime());
        assert!(secret.q1.is_prime());
        assert_eq!(secret.group.n, secret.p.mul(&secret.q).unwrap());
    }

    #[test]
    fn order_annihilates_residues() {
        let secret = QrSpecialRsaSecret::generate(128).unwrap();
        let group = &secret.group;
        let x = group.random_element().unwrap();
        assert!(group.is_element(&x));
        assert_eq!(*BIGNUMBER_1, group.exp(&x, &secret.order().unwrap()).unwrap());
    }

    #[test]
    fn negative_exponent_inverts() {
        let secret = QrSpecialRsaSecret::generate(128).unwrap();
        let group = &secret.group;
        let x = group.random_element().unwrap();
        let e = BigNumber::from_u32(12345).unwrap();
        let pos = group.exp(&x, &e).unwrap();
        let neg = group.exp(&x, &e.set_negative(true).unwrap()).unwrap();
        assert_eq!(*BIGNUMBER_1, group.mul(&pos, &neg).unwrap());
    }

    #[test]
    fn is_element_rejects_out_of_range() {
        let group = QrSpecialRsa::new(BigNumber::from_u32(77).unwrap());
        assert!(!group.is_element(&BigNumber::from_u32(0).unwrap()));
        assert!(!group.is_element(&BigNumber::from_u32(77).unwrap()));
        assert!(!group.is_element(&BigNumber::from_u32(14).unwrap()));
        assert!(group.is_element(&BigNumber::from_u32(4).unwrap()));
    }
}
