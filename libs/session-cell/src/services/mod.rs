pub mod gate;
pub mod provider;
