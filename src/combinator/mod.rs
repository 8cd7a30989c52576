//! Task combinators: join-all and race-first.

pub mod join;
pub mod race;
