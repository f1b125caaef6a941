pub mod cache;
pub mod delivery;
