//! Narrative Graph — procedural story, level and quest graphs for games.
//!
//! Builds the interlinked content of one generation session: a story with
//! a branching timeline, a tile-grid level with points of interest, and a
//! quest graph whose objectives and links point back into both. Everything
//! is in-memory and synchronous; a session is owned by a single writer.

pub mod core;
pub mod schema;

pub use crate::core::pipeline::{NarrativeGenerator, SessionError, SessionSnapshot};
pub use crate::core::validation::{ContentGenerator, ValidationReport};
