//! Timer service: a deadline-ordered wait queue plus sleep futures.

pub(crate) mod queue;
pub mod sleep;
