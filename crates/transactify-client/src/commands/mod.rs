pub mod convert;
pub mod hash;
