// Default scheme parameters. The modulus sizes are test sized, production
// deployments should use at least 2048 bit moduli.
pub const RHO_BIT_LEN: usize = 256;
pub const N_LENGTH: usize = 256;
pub const ATTR_BIT_LEN: usize = 256;
pub const HASH_BIT_LEN: usize = 512;
pub const SEC_PARAM: usize = 80;
pub const E_BIT_LEN: usize = 597;
pub const E1_BIT_LEN: usize = 120;
pub const V_BIT_LEN: usize = 2724;

/// Miller-Rabin rounds used when checking the prime exponent of a credential.
pub const PRIME_CHECKS: usize = 20;
