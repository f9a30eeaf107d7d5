//! Step definitions for hierarchical task workflow scenarios.

pub mod world;

mod given;
mod then;
mod when;
