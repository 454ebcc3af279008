pub mod filter;
pub mod set;
