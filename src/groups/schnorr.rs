use crate::bn::{BigNumber, BIGNUMBER_1, BIGNUMBER_2};
use crate::cl::helpers::{bn_rand, bn_rand_nonzero, bn_rand_range, pow2};
use crate::errors::prelude::*;

/// Subgroup of prime order `q` of `Z_p^*`, where `p = r*q + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchnorrGroup {
    pub p: BigNumber,
    pub q: BigNumber,
    pub g: BigNumber,
}

impl SchnorrGroup {
    /// Generates a group whose order has `q_bit_len` bits. The cofactor `r`
    /// has `r_bit_len` bits.
    pub fn generate(q_bit_len: usize, r_bit_len: usize) -> AnonCredsResult<SchnorrGroup> {
        trace!(
            "SchnorrGroup::generate: >>> q_bit_len: {}, r_bit_len: {}",
            q_bit_len,
            r_bit_len
        );

        let q = BigNumber::generate_prime(q_bit_len)?;
        let top = pow2(r_bit_len - 1)?;

        let (p, r) = loop {
            // even cofactor keeps p odd
            let mut r = bn_rand(r_bit_len - 1)?.add(&top)?;
            if r.is_bit_set(0) {
                r = r.add(&BIGNUMBER_1)?;
            }
            let p = r.mul(&q)?.increment()?;
            if p.is_prime() {
                break (p, r);
            }
        };

        let g = loop {
            let h = bn_rand_range(&p.sub(&BIGNUMBER_2)?)?.add(&BIGNUMBER_2)?;
            let g = h.mod_exp(&r, &p)?;
            if g != *BIGNUMBER_1 {
                break g;
            }
        };

        trace!("SchnorrGroup::generate: <<< p: {:?}, q: {:?}, g: {:?}", p, q, g);

        Ok(SchnorrGroup { p, q, g })
    }

    pub fn mul(&self, x: &BigNumber, y: &BigNumber) -> AnonCredsResult<BigNumber> {
        x.mod_mul(y, &self.p)
    }

    pub fn exp(&self, x: &BigNumber, exp: &BigNumber) -> AnonCredsResult<BigNumber> {
        x.mod_exp(exp, &self.p)
    }

    pub fn inv(&self, x: &BigNumber) -> AnonCredsResult<BigNumber> {
        x.inverse(&self.p)
    }

    /// Random exponent from `[1, q)`.
    pub fn random_exponent(&self) -> AnonCredsResult<BigNumber> {
        bn_rand_nonzero(&self.q)
    }

    /// Random element of the subgroup other than the identity.
    pub fn random_element(&self) -> AnonCredsResult<BigNumber> {
        self.exp(&self.g, &self.random_exponent()?)
    }

    pub fn is_element(&self, x: &BigNumber) -> bool {
        if x.is_negative() || x.is_zero() || x >= &self.p {
            return false;
        }
        match self.exp(x, &self.q) {
            Ok(res) => res == *BIGNUMBER_1,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_group_works() {
        let group = SchnorrGroup::generate(64, 64).unwrap();
        assert!(group.q.is_prime());
        assert!(group.p.is_prime());
        assert_eq!(
            BigNumber::new(),
            group.p.decrement().unwrap().modulus(&group.q).unwrap()
        );
        assert!(group.is_element(&group.g));
        assert_ne!(*BIGNUMBER_1, group.g);
    }

    #[test]
    fn random_elements_belong_to_group() {
        let group = SchnorrGroup::generate(64, 64).unwrap();
        for _ in 0..10 {
            let x = group.random_element().unwrap();
            assert!(group.is_element(&x));
            let inv = group.inv(&x).unwrap();
            assert_eq!(*BIGNUMBER_1, group.mul(&x, &inv).unwrap());
        }
    }

    #[test]
    fn is_element_rejects_outsiders() {
        let group = SchnorrGroup {
            p: BigNumber::from_u32(23).unwrap(),
            q: BigNumber::from_u32(11).unwrap(),
            g: BigNumber::from_u32(4).unwrap(),
        };
        // 5 generates the whole of Z_23^*
        assert!(!group.is_element(&BigNumber::from_u32(5).unwrap()));
        assert!(!group.is_element(&BigNumber::from_u32(23).unwrap()));
        assert!(group.is_element(&BigNumber::from_u32(2).unwrap()));
    }
}
