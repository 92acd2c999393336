//! Core types and utilities

pub mod cover;
pub mod records;
pub mod season;
pub mod units;

pub use cover::*;
pub use records::*;
pub use season::Season;
pub use units::*;
