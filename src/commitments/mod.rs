pub mod damgard_fujisaki;
pub mod pedersen;
