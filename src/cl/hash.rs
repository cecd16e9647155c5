use crate::bn::BigNumber;
use crate::errors::prelude::*;

use sha2::{Digest, Sha512};

pub fn get_hash_as_int(nums: &[Vec<u8>]) -> AnonCredsResult<BigNumber> {
    trace!("Helpers::get_hash_as_int: >>> nums: {:?}", nums);

    let mut hasher = Sha512::new();
    for num in nums.iter() {
        hasher.update(num);
    }
    let hash = BigNumber::from_bytes(&hasher.finalize())?;

    trace!("Helpers::get_hash_as_int: <<< hash: {:?}", hash);

    Ok(hash)
}

/// Fiat-Shamir challenge over the big-endian encodings of `nums`, each
/// prefixed with its byte length as a big-endian `u64`.
pub fn hash_numbers(nums: &[&BigNumber]) -> AnonCredsResult<BigNumber> {
    let mut bytes = Vec::with_capacity(2 * nums.len());
    for num in nums {
        let encoded = num.to_bytes()?;
        bytes.push((encoded.len() as u64).to_be_bytes().to_vec());
        bytes.push(encoded);
    }
    get_hash_as_int(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_hash_as_int_works() {
        let nums = vec![
            BigNumber::from_dec(
                "115617495274587954808035271385929791684599344627298365716787448455575743757311",
            )
            .unwrap()
            .to_bytes()
            .unwrap(),
            BigNumber::from_dec(
                "115617495274587954808035271385929791684599344627298365716787447492830472947014",
            )
            .unwrap()
            .to_bytes()
            .unwrap(),
        ];
        let res = get_hash_as_int(&nums).unwrap();

        assert_eq!(
            "13178835240733632444195716985773409997136487834687377584044420261228835535252438002078210988153280708042087972004135431381392549376168874744332895536678961",
            res.to_dec().unwrap()
        );
    }

    #[test]
    fn hash_numbers_frames_each_number() {
        let a = BigNumber::from_u32(1234).unwrap();
        let b = BigNumber::from_u32(5678).unwrap();
        assert_ne!(hash_numbers(&[&a, &b]).unwrap(), hash_numbers(&[&b, &a]).unwrap());

        let one = BigNumber::from_u32(0x01).unwrap();
        let two = BigNumber::from_u32(0x02).unwrap();
        let joined = BigNumber::from_u32(0x0102).unwrap();
        assert_ne!(
            hash_numbers(&[&one, &two]).unwrap(),
            hash_numbers(&[&joined]).unwrap()
        );
        assert_ne!(
            get_hash_as_int(&[one.to_bytes().unwrap(), two.to_bytes().unwrap()]).unwrap(),
            hash_numbers(&[&one, &two]).unwrap()
        );
    }
}
