use serde::{Deserialize, Serialize};

use super::grid::Grid;
use super::ids::{ConnectionId, ElementId, LevelId, PoiId};
use super::value::Properties;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Static classification of a grid cell. Movement rules live elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Walkable,
    Obstacle,
    PointOfInterest,
    Transition,
}

impl CellKind {
    /// Whether a flood fill may enter this cell.
    pub fn is_passable(&self) -> bool {
        !matches!(self, Self::Obstacle)
    }

    /// Single-character glyph used by map previews.
    pub fn glyph(&self) -> char {
        match self {
            Self::Walkable => '.',
            Self::Obstacle => '#',
            Self::PointOfInterest => '@',
            Self::Transition => '>',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
    pub kind: CellKind,
    pub properties: Properties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoiKind {
    Quest,
    Shop,
    Story,
    Challenge,
}

/// A named, positioned node of the level graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: PoiId,
    pub name: String,
    pub kind: PoiKind,
    pub position: Position,
    pub story_elements: Vec<ElementId>,
    pub requirements: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionKind {
    Path,
    Door,
    Portal,
}

impl ConnectionKind {
    /// Paths and doors can be walked both ways; portals only lead `from → to`.
    pub fn is_bidirectional(&self) -> bool {
        !matches!(self, Self::Portal)
    }
}

impl Default for ConnectionKind {
    fn default() -> Self {
        Self::Path
    }
}

/// An edge between two POIs. Endpoints are not checked on creation and
/// parallel edges are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub from: PoiId,
    pub to: PoiId,
    pub kind: ConnectionKind,
    pub properties: Properties,
}

/// A tile-grid level with its POI and connection graph layered on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    pub id: LevelId,
    pub name: String,
    pub description: String,
    pub grid: Grid<GridCell>,
    pub points_of_interest: Vec<PointOfInterest>,
    pub connections: Vec<Connection>,
    /// Designated flood-fill origin for reachability checks.
    #[serde(default)]
    pub entry: Option<Position>,
}

impl LevelLayout {
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<&GridCell> {
        self.grid.get(x, y)
    }

    pub fn poi(&self, id: PoiId) -> Option<&PointOfInterest> {
        self.points_of_interest.iter().find(|p| p.id == id)
    }

    pub fn pois_at(&self, position: Position) -> impl Iterator<Item = &PointOfInterest> {
        self.points_of_interest
            .iter()
            .filter(move |p| p.position == position)
    }

    /// Render the grid as rows of cell glyphs.
    pub fn render_ascii(&self) -> String {
        let mut out = String::with_capacity(self.grid.len() + self.height());
        for (i, cell) in self.grid.iter().enumerate() {
            if i > 0 && i % self.width() == 0 {
                out.push('\n');
            }
            out.push(cell.kind.glyph());
        }
        out
    }
}
