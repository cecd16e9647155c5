use crate::errors::prelude::*;

use glass_pumpkin::{prime, safe_prime};
use num_bigint::{BigInt, BigUint, RandBigInt, Sign, ToBigInt};
use num_integer::Integer;
use num_traits::identities::{One, Zero};
use num_traits::{Num, Pow, Signed, ToPrimitive};
use rand::rngs::OsRng;

use serde::de::{Deserialize, Deserializer, Error as DError, Visitor};
use serde::ser::{Serialize, Serializer};

use std::cmp::Ordering;
use std::fmt;

#[derive(Clone, Default)]
pub struct BigNumber {
    bn: BigInt,
}

macro_rules! prime_generation {
    ($f:ident, $size:ident, $msg:expr) => {
        match $f::new($size)
            .map_err(|err| err_msg(AnonCredsErrorKind::InvalidState, format!("{:?}", err)))?
            .to_bigint()
        {
            Some(bn) => Ok(BigNumber { bn }),
            None => Err(err_msg(AnonCredsErrorKind::InvalidState, $msg)),
        }
    };
}

impl BigNumber {
    pub fn new() -> BigNumber {
        BigNumber { bn: BigInt::zero() }
    }

    pub fn generate_prime(size: usize) -> AnonCredsResult<BigNumber> {
        prime_generation!(prime, size, "Unable to generate prime")
    }

    pub fn generate_safe_prime(size: usize) -> AnonCredsResult<BigNumber> {
        prime_generation!(safe_prime, size, "Unable to generate safe prime")
    }

    /// Returns a random prime in the open interval `(start, end)`.
    pub fn generate_prime_in_range(
        start: &BigNumber,
        end: &BigNumber,
    ) -> AnonCredsResult<BigNumber> {
        let (start, end) = match (start.bn.to_biguint(), end.bn.to_biguint()) {
            (Some(s), Some(e)) if s < e => (s + BigUint::one(), e),
            _ => {
                return Err(err_msg(
                    AnonCredsErrorKind::InvalidStructure,
                    format!("Invalid prime range: ({:?}, {:?})", start, end),
                ))
            }
        };

        let mut rng = OsRng;
        let mut iteration = 0;
        loop {
            let mut candidate = rng.gen_biguint_range(&start, &end);
            candidate |= BigUint::one();

            if candidate < end && prime::check(&candidate) {
                debug!("Found prime in {} iteration", iteration);
                return Ok(BigNumber {
                    bn: BigInt::from_biguint(Sign::Plus, candidate),
                });
            }
            iteration += 1;
        }
    }

    pub fn is_prime(&self) -> bool {
        match self.bn.to_biguint() {
            Some(bn) if !self.is_negative() => prime::check(&bn),
            _ => false,
        }
    }

    /// Miller-Rabin test with `rounds` random bases.
    pub fn is_probable_prime(&self, rounds: usize) -> AnonCredsResult<bool> {
        let two = BigInt::from(2u32);
        let three = BigInt::from(3u32);

        if self.bn < two {
            return Ok(false);
        }
        if self.bn == two || self.bn == three {
            return Ok(true);
        }
        if self.bn.is_even() {
            return Ok(false);
        }

        let n_minus_one = &self.bn - BigInt::one();
        let mut d = n_minus_one.clone();
        let mut s = 0u64;
        while d.is_even() {
            d >>= 1;
            s += 1;
        }

        let mut rng = OsRng;
        'witness: for _ in 0..rounds {
            let a = rng.gen_bigint_range(&two, &n_minus_one);
            let mut x = a.modpow(&d, &self.bn);
            if x.is_one() || x == n_minus_one {
                continue;
            }
            for _ in 1..s {
                x = x.modpow(&two, &self.bn);
                if x == n_minus_one {
                    continue 'witness;
                }
            }
            return Ok(false);
        }
        Ok(true)
    }

    /// Uniformly random number of at most `size` bits.
    pub fn rand(size: usize) -> AnonCredsResult<BigNumber> {
        let mut rng = OsRng;
        let res = rng.gen_biguint(size as u64);
        Ok(BigNumber {
            bn: BigInt::from_biguint(Sign::Plus, res),
        })
    }

    /// Uniformly random number in `[0, self)`.
    pub fn rand_range(&self) -> AnonCredsResult<BigNumber> {
        if !self.bn.is_positive() {
            return Err(err_msg(
                AnonCredsErrorKind::InvalidStructure,
                "Upper bound of random range must be positive",
            ));
        }
        let mut rng = OsRng;
        Ok(BigNumber {
            bn: rng.gen_bigint_range(&BigInt::zero(), &self.bn),
        })
    }

    /// Uniformly random number in the open interval `(-2^size, 2^size)`.
    pub fn rand_symmetric(size: usize) -> AnonCredsResult<BigNumber> {
        let bound = BigInt::one() << size;
        let mut rng = OsRng;
        Ok(BigNumber {
            bn: rng.gen_bigint_range(&(BigInt::one() - &bound), &bound),
        })
    }

    pub fn num_bits(&self) -> usize {
        self.bn.bits() as usize
    }

    pub fn is_bit_set(&self, n: usize) -> bool {
        let res = self.bn.magnitude() >> n;
        res.is_odd()
    }

    pub fn set_bit(&mut self, n: usize) -> &mut BigNumber {
        self.bn |= BigInt::one() << n;
        self
    }

    pub fn flip_bit(&self, n: usize) -> BigNumber {
        BigNumber {
            bn: &self.bn ^ (BigInt::one() << n),
        }
    }

    pub fn from_u32(n: usize) -> AnonCredsResult<BigNumber> {
        Ok(BigNumber {
            bn: BigInt::from(n),
        })
    }

    pub fn from_i64(n: i64) -> BigNumber {
        BigNumber {
            bn: BigInt::from(n),
        }
    }

    pub fn to_i64(&self) -> AnonCredsResult<i64> {
        self.bn.to_i64().ok_or_else(|| {
            err_msg(
                AnonCredsErrorKind::InvalidStructure,
                format!("{} does not fit into i64", self.bn),
            )
        })
    }

    pub fn from_dec(dec: &str) -> AnonCredsResult<BigNumber> {
        Ok(BigNumber {
            bn: BigInt::from_str_radix(dec, 10)?,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> AnonCredsResult<BigNumber> {
        Ok(BigNumber {
            bn: BigInt::from_bytes_be(Sign::Plus, bytes),
        })
    }

    pub fn to_dec(&self) -> AnonCredsResult<String> {
        Ok(self.bn.to_str_radix(10))
    }

    /// Big-endian magnitude. The sign is not encoded.
    pub fn to_bytes(&self) -> AnonCredsResult<Vec<u8>> {
        let (_, res) = self.bn.to_bytes_be();
        Ok(res)
    }

    pub fn add(&self, a: &BigNumber) -> AnonCredsResult<BigNumber> {
        Ok(BigNumber { bn: &self.bn + &a.bn })
    }

    pub fn sub(&self, a: &BigNumber) -> AnonCredsResult<BigNumber> {
        Ok(BigNumber { bn: &self.bn - &a.bn })
    }

    pub fn sqr(&self) -> AnonCredsResult<BigNumber> {
        Ok(BigNumber { bn: &self.bn * &self.bn })
    }

    pub fn mul(&self, a: &BigNumber) -> AnonCredsResult<BigNumber> {
        Ok(BigNumber { bn: &self.bn * &a.bn })
    }

    pub fn mod_mul(&self, a: &BigNumber, n: &BigNumber) -> AnonCredsResult<BigNumber> {
        check_modulus(n)?;
        Ok(BigNumber {
            bn: (&self.bn * &a.bn).mod_floor(&n.bn),
        })
    }

    /// `self^a mod b`. A negative exponent exponentiates the inverse of `self`.
    pub fn mod_exp(&self, a: &BigNumber, b: &BigNumber) -> AnonCredsResult<BigNumber> {
        check_modulus(b)?;
        if a.is_negative() {
            let res = self.inverse(b)?;
            Ok(BigNumber {
                bn: res.bn.modpow(&a.bn.abs(), &b.bn),
            })
        } else {
            let base = self.bn.mod_floor(&b.bn);
            Ok(BigNumber {
                bn: base.modpow(&a.bn, &b.bn),
            })
        }
    }

    /// Non-negative remainder of `self` modulo `a`.
    pub fn modulus(&self, a: &BigNumber) -> AnonCredsResult<BigNumber> {
        check_modulus(a)?;
        Ok(BigNumber {
            bn: self.bn.mod_floor(&a.bn),
        })
    }

    pub fn exp(&self, a: &BigNumber) -> AnonCredsResult<BigNumber> {
        if self.bn.bits() == 0 {
            return Ok(BigNumber::default());
        } else if a.bn.is_one() {
            return Ok(self.clone());
        }

        match a.bn.to_u64() {
            Some(num) => Ok(BigNumber {
                bn: Pow::pow(&self.bn, num),
            }),
            None => Err(err_msg(
                AnonCredsErrorKind::InvalidStructure,
                "Exponent cannot be held in u64",
            )),
        }
    }

    pub fn inverse(&self, n: &BigNumber) -> AnonCredsResult<BigNumber> {
        if n.bn.is_one() || !n.bn.is_positive() {
            return Err(err_msg(AnonCredsErrorKind::InvalidStructure, "Invalid modulus"));
        }

        // Extended Euclid, the Bezout coefficient of `n` is not needed.
        let (mut t, mut new_t) = (BigInt::zero(), BigInt::one());
        let (mut r, mut new_r) = (n.bn.clone(), self.bn.mod_floor(&n.bn));

        while !new_r.is_zero() {
            let quotient = &r / &new_r;

            let next_t = &t - &quotient * &new_t;
            t = std::mem::replace(&mut new_t, next_t);

            let next_r = &r - &quotient * &new_r;
            r = std::mem::replace(&mut new_r, next_r);
        }

        if r > BigInt::one() {
            return Err(err_msg(AnonCredsErrorKind::InvalidStructure, "Not invertible"));
        }

        Ok(BigNumber {
            bn: t.mod_floor(&n.bn),
        })
    }

    pub fn set_negative(&self, negative: bool) -> AnonCredsResult<BigNumber> {
        let bn = if negative { -self.bn.abs() } else { self.bn.abs() };
        Ok(BigNumber { bn })
    }

    pub fn is_negative(&self) -> bool {
        self.bn.is_negative()
    }

    pub fn is_zero(&self) -> bool {
        self.bn.is_zero()
    }

    pub fn increment(&self) -> AnonCredsResult<BigNumber> {
        Ok(BigNumber { bn: &self.bn + 1 })
    }

    pub fn decrement(&self) -> AnonCredsResult<BigNumber> {
        Ok(BigNumber { bn: &self.bn - 1 })
    }

    pub fn lshift(&self, n: usize) -> AnonCredsResult<BigNumber> {
        Ok(BigNumber { bn: &self.bn << n })
    }

    pub fn rshift(&self, n: usize) -> AnonCredsResult<BigNumber> {
        Ok(BigNumber { bn: &self.bn >> n })
    }
}

fn check_modulus(n: &BigNumber) -> AnonCredsResult<()> {
    if n.bn.is_positive() {
        Ok(())
    } else {
        Err(err_msg(
            AnonCredsErrorKind::InvalidStructure,
            format!("Modulus must be positive, got {}", n.bn),
        ))
    }
}

impl fmt::Debug for BigNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BigNumber {{ bn: {} }}", self.bn.to_str_radix(10))
    }
}

impl fmt::Display for BigNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.bn.to_str_radix(10))
    }
}

impl Ord for BigNumber {
    fn cmp(&self, other: &BigNumber) -> Ordering {
        self.bn.cmp(&other.bn)
    }
}

impl Eq for BigNumber {}

impl PartialOrd for BigNumber {
    fn partial_cmp(&self, other: &BigNumber) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for BigNumber {
    fn eq(&self, other: &BigNumber) -> bool {
        self.bn == other.bn
    }
}

impl Serialize for BigNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_newtype_struct("BigNumber", &self.bn.to_str_radix(10))
    }
}

impl<'a> Deserialize<'a> for BigNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'a>,
    {
        struct BigNumberVisitor;

        impl<'a> Visitor<'a> for BigNumberVisitor {
            type Value = BigNumber;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("expected BigNumber")
            }

            fn visit_str<E>(self, value: &str) -> Result<BigNumber, E>
            where
                E: DError,
            {
                BigNumber::from_dec(value).map_err(DError::custom)
            }
        }

        deserializer.deserialize_str(BigNumberVisitor)
    }
}

// Constants that are used throughout the code, so avoiding recomputation.
lazy_static! {
    pub static ref BIGNUMBER_1: BigNumber = BigNumber {
        bn: BigInt::one()
    };
    pub static ref BIGNUMBER_2: BigNumber = BigNumber {
        bn: BigInt::from(2u32)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[test]
    fn exp_works() {
        let test = BigNumber::from_u32(3)
            .unwrap()
            .exp(&BigNumber::from_u32(2).unwrap())
            .unwrap();
        assert_eq!(BigNumber::from_u32(9).unwrap(), test);

        let test = BigNumber::from_u32(2)
            .unwrap()
            .exp(&BigNumber::from_u32(16).unwrap())
            .unwrap();
        assert_eq!(BigNumber::from_u32(65536).unwrap(), test);
    }

    #[test]
    fn inverse_works() {
        let bn = BigNumber::from_u32(3).unwrap();
        assert_eq!(
            BigNumber::from_u32(16).unwrap(),
            bn.inverse(&BigNumber::from_u32(47).unwrap()).unwrap()
        );

        let modulus = BigNumber::generate_prime(128).unwrap();
        for _ in 0..25 {
            let r = BigNumber::rand(127).unwrap().increment().unwrap();
            let s = r.inverse(&modulus).unwrap();
            assert_eq!(*BIGNUMBER_1, r.mod_mul(&s, &modulus).unwrap());
        }
    }

    #[test]
    fn inverse_of_negative_number_works() {
        let bn = BigNumber::from_i64(-3);
        let modulus = BigNumber::from_u32(47).unwrap();
        let inv = bn.inverse(&modulus).unwrap();
        assert_eq!(*BIGNUMBER_1, bn.mod_mul(&inv, &modulus).unwrap());
    }

    #[test]
    fn inverse_fails_for_common_factor() {
        let bn = BigNumber::from_u32(6).unwrap();
        assert!(bn.inverse(&BigNumber::from_u32(9).unwrap()).is_err());
    }

    #[test]
    fn mod_exp_with_negative_exponent_works() {
        let base = BigNumber::from_u32(6).unwrap();
        let exp = BigNumber::from_i64(-5);
        let modulus = BigNumber::from_u32(13).unwrap();
        assert_eq!(
            BigNumber::from_u32(7).unwrap(),
            base.mod_exp(&exp, &modulus).unwrap()
        );
    }

    #[test]
    fn modulus_is_never_negative() {
        let bn = BigNumber::from_i64(-7);
        assert_eq!(
            BigNumber::from_u32(3).unwrap(),
            bn.modulus(&BigNumber::from_u32(5).unwrap()).unwrap()
        );
    }

    #[test]
    fn is_prime_works() {
        let primes: Vec<i64> = vec![2, 23, 31, 42885908609, 24473809133, 47055833459];
        for pr in primes {
            let num = BigNumber::from_i64(pr);
            assert!(num.is_prime());
            assert!(num.is_probable_prime(20).unwrap());
        }
        let num = BigNumber::from_dec("36").unwrap();
        assert!(!num.is_prime());
        assert!(!num.is_probable_prime(20).unwrap());

        // Carmichael number
        let num = BigNumber::from_i64(561);
        assert!(!num.is_probable_prime(20).unwrap());

        let v1 = BigNumber::from_bytes(&[9, 252, 51, 8, 129]).unwrap();
        assert!(v1.is_prime());
    }

    #[test]
    fn generate_prime_in_range_works() {
        let start = BigNumber::from_u32(1).unwrap().lshift(100).unwrap();
        let end = start.add(&BigNumber::from_u32(1).unwrap().lshift(40).unwrap()).unwrap();
        let random_prime = BigNumber::generate_prime_in_range(&start, &end).unwrap();
        assert!(start < random_prime);
        assert!(end > random_prime);
        assert!(random_prime.is_probable_prime(20).unwrap());
    }

    #[test]
    fn rand_symmetric_stays_in_bounds() {
        let bound = BigNumber::from_u32(1).unwrap().lshift(16).unwrap();
        for _ in 0..50 {
            let r = BigNumber::rand_symmetric(16).unwrap();
            assert!(r < bound);
            assert!(r > bound.set_negative(true).unwrap());
        }
    }

    #[test]
    fn flip_bit_works() {
        let num = BigNumber::from_u32(1000).unwrap();
        assert_eq!(BigNumber::from_u32(1001).unwrap(), num.flip_bit(0));
        assert_eq!(num, num.flip_bit(0).flip_bit(0));
    }

    #[test]
    fn shifts_work() {
        let num = BigNumber::from_u32(1024).unwrap();
        assert_eq!(num.rshift(1).unwrap(), BigNumber::from_u32(512).unwrap());
        assert_eq!(num.rshift(4).unwrap(), BigNumber::from_u32(64).unwrap());
        assert_eq!(num.lshift(1).unwrap(), BigNumber::from_u32(2048).unwrap());
    }

    #[derive(Serialize, Deserialize)]
    struct Test {
        field: BigNumber,
    }

    #[test]
    fn serialize_works() {
        let s = Test {
            field: BigNumber::from_dec("1").unwrap(),
        };
        assert_eq!("{\"field\":\"1\"}", serde_json::to_string(&s).unwrap());
    }

    #[test]
    fn deserialize_works() {
        let bn: Test = serde_json::from_str("{\"field\":\"-12\"}").unwrap();
        assert_eq!(BigNumber::from_i64(-12), bn.field);
    }
}
