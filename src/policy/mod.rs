//! Admission and collision policy
//!
//! - `admit` - pure cutoff-date filter returning the dropped count
//! - `check_collision` - destination probe deciding proceed / overwrite / skip

mod admission;
mod collision;

pub use admission::{admit, Admission};
pub use collision::{check_collision, date_span, CollisionDecision, CollisionWindow};

#[cfg(test)]
mod tests;
