//! Plain data records shared by the generators.

pub mod grid;
pub mod ids;
pub mod level;
pub mod quest;
pub mod story;
pub mod value;
