pub mod commitment;
#[macro_use]
pub mod logger;
