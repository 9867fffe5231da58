//! Generators and the session orchestrator.

pub mod config;
pub mod level;
pub mod pipeline;
pub mod quest;
pub mod story;
pub mod text;
pub mod validation;
