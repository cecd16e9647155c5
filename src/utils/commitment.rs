use crate::bn::BigNumber;
use crate::errors::prelude::*;

/// Generate a pedersen commitment to a given number
///
/// # Arguments
/// * `gen_1` - first generator
/// * `m` - exponent of the first generator
/// * `gen_2` - second generator
/// * `r` - exponent of the second generator
/// * `modulus` - all computations are done this modulo
///
/// # Result
/// Return the pedersen commitment, i.e `(gen_1^m)*(gen_2^r)`
pub fn get_pedersen_commitment(
    gen_1: &BigNumber,
    m: &BigNumber,
    gen_2: &BigNumber,
    r: &BigNumber,
    modulus: &BigNumber,
) -> AnonCredsResult<BigNumber> {
    let commitment = gen_1
        .mod_exp(m, modulus)?
        .mod_mul(&gen_2.mod_exp(r, modulus)?, modulus)?;
    Ok(commitment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_pedersen_commitment_works() {
        let modulus = BigNumber::from_u32(23).unwrap();
        let g = BigNumber::from_u32(4).unwrap();
        let h = BigNumber::from_u32(9).unwrap();
        let m = BigNumber::from_u32(3).unwrap();
        let r = BigNumber::from_u32(5).unwrap();

        // 4^3 * 9^5 = 3779136 = 6 mod 23
        let commitment = get_pedersen_commitment(&g, &m, &h, &r, &modulus).unwrap();
        assert_eq!(BigNumber::from_u32(6).unwrap(), commitment);
    }
}
