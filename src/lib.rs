//! Camenisch-Lysyanskaya anonymous credentials over a special RSA modulus.
//!
//! An issuer signs attribute values for a pseudonymous holder, partly in
//! clear and partly as commitments. The holder later proves possession of
//! the credential while revealing only selected attributes, and every proof
//! is unlinkable to the issuance and to other proofs.
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

// To use macros from util inside of other modules it must be loaded first.
#[macro_use]
pub mod utils;

#[path = "bn/rust.rs"]
pub mod bn;
pub mod cl;
pub mod commitments;
pub mod errors;
pub mod groups;
pub mod session;
pub mod transport;
pub mod zkp;
