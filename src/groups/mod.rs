pub mod qr;
pub mod schnorr;
