//! Utilities shared by the Hubbub packages.

pub mod logger;
pub mod time;
