pub mod admission;
pub mod filter;
