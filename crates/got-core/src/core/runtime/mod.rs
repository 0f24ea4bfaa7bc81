//! Process-facing plumbing: the git collaborator and command outcome shaping.

pub mod effects;
mod facade;

pub use facade::*;
