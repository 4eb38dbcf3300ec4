//! pick-captcha: an image-selection puzzle ("pick the matching images").
//!
//! The core is [`round::PuzzleRound`]: it shuffles a fixed catalog, tracks
//! the user's selection and verifies it against the hidden targets. It has
//! no rendering dependency; [`tui`] is one presentation built on top.

pub mod config;
pub mod error;
pub mod report;
pub mod round;
pub mod shuffle;
pub mod stats;
pub mod tui;
pub mod types;

pub use error::{ConfigError, PuzzleError};
pub use round::PuzzleRound;
