//! Step definitions for change set publishing scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
