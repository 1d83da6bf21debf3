//! Checking submitted output against expected values.

pub mod challenges;
pub mod comparator;

pub use challenges::{Challenge, ChallengeCatalog, Difficulty};
pub use comparator::evaluate;
