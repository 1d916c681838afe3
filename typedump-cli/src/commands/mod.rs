pub mod common;
pub mod dump;
