//! Trip planner core: simulator passes, rescue planning, and route diagnostics.

pub mod diagnostics;
pub mod providers;
pub mod trip;

pub use facade::*;

mod facade;
