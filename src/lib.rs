//! Six-bus active-network-management environment for reinforcement learning.

pub mod case;
pub mod config;
pub mod constants;
/// Agent-facing environment interface and the bundled state source.
pub mod env;
pub mod render;
