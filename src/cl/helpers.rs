use crate::bn::{BigNumber, BIGNUMBER_1};
use crate::errors::prelude::*;

pub fn bn_rand(size: usize) -> AnonCredsResult<BigNumber> {
    trace!("Helpers::bn_rand: >>> size:: {:?}", size);

    let res = BigNumber::rand(size)?;

    trace!("Helpers::bn_rand: <<< res: {:?}", secret!(&res));

    Ok(res)
}

pub fn bn_rand_range(bn: &BigNumber) -> AnonCredsResult<BigNumber> {
    trace!("Helpers::bn_rand_range: >>> bn:: {:?}", bn);

    let res = bn.rand_range()?;

    trace!("Helpers::bn_rand_range: <<< res: {:?}", secret!(&res));

    Ok(res)
}

/// Random number from `±{0,1}^size`.
pub fn bn_rand_also_neg(size: usize) -> AnonCredsResult<BigNumber> {
    trace!("Helpers::bn_rand_also_neg: >>> size:: {:?}", size);

    let res = BigNumber::rand_symmetric(size)?;

    trace!("Helpers::bn_rand_also_neg: <<< res: {:?}", secret!(&res));

    Ok(res)
}

pub fn pow2(exp: usize) -> AnonCredsResult<BigNumber> {
    BIGNUMBER_1.lshift(exp)
}

/// Random number from `[1, bound)`. Used for exponents that must not vanish.
pub fn bn_rand_nonzero(bound: &BigNumber) -> AnonCredsResult<BigNumber> {
    loop {
        let res = bn_rand_range(bound)?;
        if !res.is_zero() {
            return Ok(res);
        }
    }
}

pub fn generate_safe_prime(size: usize) -> AnonCredsResult<BigNumber> {
    trace!("Helpers::generate_safe_prime: >>> size: {:?}", size);

    let safe_prime = BigNumber::generate_safe_prime(size)?;

    trace!(
        "Helpers::generate_safe_prime: <<< safe_prime: {:?}",
        secret!(&safe_prime)
    );

    Ok(safe_prime)
}

pub fn generate_prime_in_range(start: &BigNumber, end: &BigNumber) -> AnonCredsResult<BigNumber> {
    trace!(
        "Helpers::generate_prime_in_range: >>> start: {:?}, end: {:?}",
        start,
        end
    );

    let prime = BigNumber::generate_prime_in_range(start, end)?;

    trace!("Helpers::generate_prime_in_range: <<< prime: {:?}", prime);

    Ok(prime)
}

/// Random element of the quadratic residues modulo `n`.
pub fn random_qr(n: &BigNumber) -> AnonCredsResult<BigNumber> {
    trace!("Helpers::random_qr: >>> n: {:?}", n);

    let qr = bn_rand_nonzero(n)?.sqr()?.modulus(n)?;

    trace!("Helpers::random_qr: <<< qr: {:?}", qr);

    Ok(qr)
}

pub fn bitwise_or_big_int(a: &BigNumber, b: &BigNumber) -> AnonCredsResult<BigNumber> {
    trace!("Helpers::bitwise_or_big_int: >>> a: {:?}, b: {:?}", a, b);

    let significant_bits = std::cmp::max(a.num_bits(), b.num_bits());
    let mut result = BigNumber::new();
    for i in 0..significant_bits {
        if a.is_bit_set(i) || b.is_bit_set(i) {
            result.set_bit(i);
        }
    }

    trace!("Helpers::bitwise_or_big_int: <<< result: {:?}", result);

    Ok(result)
}

/// `V11` drawn from `{0,1}^(v_bit_len-1)` with the top bit forced.
pub fn generate_v11(v_bit_len: usize) -> AnonCredsResult<BigNumber> {
    trace!("Helpers::generate_v11: >>> v_bit_len: {:?}", v_bit_len);

    let top = bit_len_minus_one(v_bit_len)?;
    let a = bn_rand(top)?;
    let v11 = bitwise_or_big_int(&a, &pow2(top)?)?;

    trace!("Helpers::generate_v11: <<< v11: {:?}", secret!(&v11));

    Ok(v11)
}

/// Lower and upper bound of the prime exponent `E`.
pub fn e_range(e_bit_len: usize, e1_bit_len: usize) -> AnonCredsResult<(BigNumber, BigNumber)> {
    let start = pow2(bit_len_minus_one(e_bit_len)?)?;
    let end = start.add(&pow2(bit_len_minus_one(e1_bit_len)?)?)?;
    Ok((start, end))
}

fn bit_len_minus_one(len: usize) -> AnonCredsResult<usize> {
    len.checked_sub(1).ok_or_else(|| {
        err_msg(
            AnonCredsErrorKind::InvalidStructure,
            "Bit length must be positive",
        )
    })
}

pub fn check_bit_len(values: &[BigNumber], len: usize) -> bool {
    values.iter().all(|v| v.num_bits() <= len)
}

/// Product of `bases[i]^exps[i]` modulo `n`.
pub fn multi_exp(bases: &[BigNumber], exps: &[BigNumber], n: &BigNumber) -> AnonCredsResult<BigNumber> {
    if bases.len() != exps.len() {
        return Err(err_msg(
            AnonCredsErrorKind::InvalidStructure,
            format!(
                "{} bases but {} exponents in multi exponentiation",
                bases.len(),
                exps.len()
            ),
        ));
    }

    bases
        .iter()
        .zip(exps.iter())
        .try_fold(BIGNUMBER_1.clone(), |acc, (base, exp)| {
            acc.mod_mul(&base.mod_exp(exp, n)?, n)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitwise_or_big_int_works() {
        let a = BigNumber::from_dec("778378032744961463933002553964902776831187587689736807008034459507677878432383414623740074").unwrap();
        let b = BigNumber::from_dec("1018517988167243043134222844204689080525734196832968125318070224677190649881668353091698688").unwrap();
        let result = BigNumber::from_dec("1796896020912204507067225398169591857356921784522704932326104684184868528314051767715438762").unwrap();
        assert_eq!(result, bitwise_or_big_int(&a, &b).unwrap());
    }

    #[test]
    fn generate_v11_sets_top_bit() {
        let v11 = generate_v11(200).unwrap();
        assert_eq!(200, v11.num_bits());
    }

    #[test]
    fn e_range_spans_expected_window() {
        let (start, end) = e_range(10, 4).unwrap();
        assert_eq!(BigNumber::from_u32(512).unwrap(), start);
        assert_eq!(BigNumber::from_u32(520).unwrap(), end);
    }

    #[test]
    fn zero_bit_lengths_are_rejected() {
        let err = e_range(0, 4).unwrap_err();
        assert_eq!(AnonCredsErrorKind::InvalidStructure, err.kind());
        assert!(e_range(10, 0).is_err());
        assert!(generate_v11(0).is_err());
    }

    #[test]
    fn random_qr_is_square() {
        let n = BigNumber::from_u32(23 * 47).unwrap();
        let qr = random_qr(&n).unwrap();
        assert!(qr < n);
    }

    #[test]
    fn multi_exp_works() {
        let n = BigNumber::from_u32(101).unwrap();
        let bases = vec![
            BigNumber::from_u32(2).unwrap(),
            BigNumber::from_u32(3).unwrap(),
        ];
        let exps = vec![
            BigNumber::from_u32(5).unwrap(),
            BigNumber::from_u32(2).unwrap(),
        ];
        // 32 * 9 = 288 = 86 mod 101
        assert_eq!(
            BigNumber::from_u32(86).unwrap(),
            multi_exp(&bases, &exps, &n).unwrap()
        );
        assert!(multi_exp(&bases, &exps[..1], &n).is_err());
    }

    #[test]
    fn check_bit_len_works() {
        let values = vec![BigNumber::from_u32(255).unwrap(), BigNumber::from_u32(3).unwrap()];
        assert!(check_bit_len(&values, 8));
        assert!(!check_bit_len(&values, 7));
    }
}
