//! Terminal presentation for a puzzle round.
//!
//! Organized along FP/Unix boundaries:
//! - `state`: Pure data types (App, Screen, Action, Transition)
//! - `update`: Pure transitions, plus the one place effects touch the round
//! - `view`: Pure rendering
//! - `run`: Terminal lifecycle and event loop

pub mod run;
pub mod state;
pub mod theme;
pub mod update;
pub mod view;

pub use run::run;
pub use state::{App, Texts};
