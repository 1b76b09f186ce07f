pub mod address;
pub mod ecdsa;
pub mod hash;
pub mod kem;
