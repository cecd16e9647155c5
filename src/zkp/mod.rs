//! Sigma protocols collapsed with Fiat-Shamir. Callers compute the challenge
//! themselves so that several proofs can share one transcript.
pub mod representation;
pub mod schnorr;
