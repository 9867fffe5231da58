/// Level model — a dense tile grid with a POI/connection graph layered on top.
use rand::rngs::StdRng;
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::core::validation::{ContentGenerator, IssueKind, Subject, ValidationReport};
use crate::schema::grid::Grid;
use crate::schema::ids::{ConnectionId, ElementId, LevelId, PoiId};
use crate::schema::level::{
    CellKind, Connection, ConnectionKind, GridCell, LevelLayout, PoiKind, PointOfInterest,
    Position,
};
use crate::schema::value::Properties;

/// Owns one level layout and keeps grid cells in step with the POI list.
///
/// Out-of-bounds coordinates are absorbed as no-ops. Obstacles and transitions
/// overwrite whatever cell they land on, so place them before POIs.
#[derive(Debug, Clone)]
pub struct LevelDesigner {
    layout: LevelLayout,
}

impl LevelDesigner {
    /// Allocate a `width × height` grid with every cell walkable.
    pub fn new(
        width: usize,
        height: usize,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let grid = Grid::from_fn(width, height, |x, y| GridCell {
            x: x as i32,
            y: y as i32,
            kind: CellKind::Walkable,
            properties: Properties::new(),
        });
        Self {
            layout: LevelLayout {
                id: LevelId::new(),
                name: name.into(),
                description: description.into(),
                grid,
                points_of_interest: Vec::new(),
                connections: Vec::new(),
                entry: None,
            },
        }
    }

    /// Wrap an existing layout, e.g. one loaded from disk.
    pub fn from_layout(layout: LevelLayout) -> Self {
        Self { layout }
    }

    /// Record a POI. An in-bounds position also marks its cell as a point of
    /// interest; an out-of-bounds POI is kept but leaves the grid untouched.
    pub fn add_point_of_interest(
        &mut self,
        name: impl Into<String>,
        kind: PoiKind,
        position: Position,
        story_elements: Vec<ElementId>,
        requirements: Vec<String>,
    ) -> &PointOfInterest {
        let poi = PointOfInterest {
            id: PoiId::new(),
            name: name.into(),
            kind,
            position,
            story_elements,
            requirements,
        };

        match self.layout.grid.get_mut(position.x, position.y) {
            Some(cell) => cell.kind = CellKind::PointOfInterest,
            None => warn!(
                poi = %poi.id,
                x = position.x,
                y = position.y,
                "POI placed outside the grid; cell left untouched"
            ),
        }

        debug!(id = %poi.id, name = %poi.name, x = position.x, y = position.y, "POI added");
        let pois = &mut self.layout.points_of_interest;
        pois.push(poi);
        &pois[pois.len() - 1]
    }

    pub fn set_obstacle(&mut self, x: i32, y: i32, properties: Properties) {
        self.overwrite_cell(x, y, CellKind::Obstacle, properties);
    }

    pub fn set_transition(&mut self, x: i32, y: i32, properties: Properties) {
        self.overwrite_cell(x, y, CellKind::Transition, properties);
    }

    fn overwrite_cell(&mut self, x: i32, y: i32, kind: CellKind, properties: Properties) {
        match self.layout.grid.get_mut(x, y) {
            Some(cell) => {
                *cell = GridCell {
                    x,
                    y,
                    kind,
                    properties,
                }
            }
            None => warn!(x, y, ?kind, "ignoring cell write outside the grid"),
        }
    }

    /// Designate the flood-fill origin used by reachability checks.
    pub fn set_entry(&mut self, position: Position) {
        self.layout.entry = Some(position);
    }

    /// Append a connection. Endpoints are not checked.
    pub fn add_connection(
        &mut self,
        from: PoiId,
        to: PoiId,
        kind: ConnectionKind,
        properties: Properties,
    ) -> &Connection {
        let connection = Connection {
            id: ConnectionId::new(),
            from,
            to,
            kind,
            properties,
        };
        debug!(id = %connection.id, %from, %to, ?kind, "connection added");
        let connections = &mut self.layout.connections;
        connections.push(connection);
        &connections[connections.len() - 1]
    }

    pub fn layout(&self) -> &LevelLayout {
        &self.layout
    }

    pub fn into_layout(self) -> LevelLayout {
        self.layout
    }

    /// The explicit entry, else the first transition cell in row-major
    /// order, else the first in-bounds POI.
    pub fn resolve_entry(&self) -> Option<Position> {
        if let Some(entry) = self.layout.entry {
            return Some(entry);
        }
        let transition = self
            .layout
            .grid
            .iter()
            .find(|c| c.kind == CellKind::Transition)
            .map(|c| Position::new(c.x, c.y));
        transition.or_else(|| {
            self.layout
                .points_of_interest
                .iter()
                .map(|p| p.position)
                .find(|p| self.layout.grid.contains(p.x, p.y))
        })
    }

    /// POIs reachable from the entry by walking non-obstacle cells or by
    /// following connections.
    pub fn reachable_pois(&self) -> FxHashSet<PoiId> {
        let mut reached = FxHashSet::default();
        let Some(entry) = self.resolve_entry() else {
            return reached;
        };
        let grid = &self.layout.grid;
        if !grid.get(entry.x, entry.y).is_some_and(|c| c.kind.is_passable()) {
            return reached;
        }

        let mut pois_at: FxHashMap<(i32, i32), Vec<&PointOfInterest>> = FxHashMap::default();
        for poi in &self.layout.points_of_interest {
            pois_at
                .entry((poi.position.x, poi.position.y))
                .or_default()
                .push(poi);
        }
        let positions: FxHashMap<PoiId, Position> = self
            .layout
            .points_of_interest
            .iter()
            .map(|p| (p.id, p.position))
            .collect();
        let mut edges: FxHashMap<PoiId, Vec<PoiId>> = FxHashMap::default();
        for conn in &self.layout.connections {
            edges.entry(conn.from).or_default().push(conn.to);
            if conn.kind.is_bidirectional() {
                edges.entry(conn.to).or_default().push(conn.from);
            }
        }

        enum Node {
            Cell(i32, i32),
            Poi(PoiId),
        }

        let mut seen_cells: FxHashSet<(i32, i32)> = FxHashSet::default();
        let mut queue = VecDeque::new();
        seen_cells.insert((entry.x, entry.y));
        queue.push_back(Node::Cell(entry.x, entry.y));

        while let Some(node) = queue.pop_front() {
            match node {
                Node::Cell(x, y) => {
                    for poi in pois_at.get(&(x, y)).into_iter().flatten() {
                        if reached.insert(poi.id) {
                            queue.push_back(Node::Poi(poi.id));
                        }
                    }
                    for (nx, ny) in grid.neighbors(x, y) {
                        let passable = grid.get(nx, ny).is_some_and(|c| c.kind.is_passable());
                        if passable && seen_cells.insert((nx, ny)) {
                            queue.push_back(Node::Cell(nx, ny));
                        }
                    }
                }
                Node::Poi(id) => {
                    for next in edges.get(&id).into_iter().flatten() {
                        // Dangling endpoints have no position and are skipped.
                        if positions.contains_key(next) && reached.insert(*next) {
                            queue.push_back(Node::Poi(*next));
                        }
                    }
                    if let Some(pos) = positions.get(&id) {
                        let passable = grid.get(pos.x, pos.y).is_some_and(|c| c.kind.is_passable());
                        if passable && seen_cells.insert((pos.x, pos.y)) {
                            queue.push_back(Node::Cell(pos.x, pos.y));
                        }
                    }
                }
            }
        }

        reached
    }

    /// Check grid/POI consistency, dangling connections and reachability.
    pub fn validation_report(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        let layout = &self.layout;
        let grid = &layout.grid;

        for poi in &layout.points_of_interest {
            match grid.get(poi.position.x, poi.position.y) {
                None => report.error(Subject::Poi(poi.id), IssueKind::OutOfBounds),
                Some(cell) if cell.kind != CellKind::PointOfInterest => {
                    report.error(Subject::Poi(poi.id), IssueKind::CellDesync)
                }
                Some(_) => {}
            }
        }

        let occupied: FxHashSet<Position> =
            layout.points_of_interest.iter().map(|p| p.position).collect();
        for cell in grid.iter() {
            let pos = Position::new(cell.x, cell.y);
            if cell.kind == CellKind::PointOfInterest && !occupied.contains(&pos) {
                report.error(Subject::Cell(pos), IssueKind::OrphanCell);
            }
        }

        let known: FxHashSet<PoiId> = layout.points_of_interest.iter().map(|p| p.id).collect();
        for conn in &layout.connections {
            for end in [conn.from, conn.to] {
                if !known.contains(&end) {
                    report.error(Subject::Connection(conn.id), IssueKind::DanglingEndpoint(end));
                }
            }
        }

        if layout.points_of_interest.is_empty() {
            return report;
        }
        let Some(entry) = self.resolve_entry() else {
            report.error(Subject::Entry, IssueKind::MissingEntry);
            return report;
        };
        match grid.get(entry.x, entry.y) {
            None => {
                report.error(Subject::Entry, IssueKind::OutOfBounds);
                return report;
            }
            Some(cell) if !cell.kind.is_passable() => {
                report.error(Subject::Entry, IssueKind::EntryBlocked);
                return report;
            }
            Some(_) => {}
        }

        let reached = self.reachable_pois();
        for poi in &layout.points_of_interest {
            if !reached.contains(&poi.id) {
                report.error(Subject::Poi(poi.id), IssueKind::Unreachable);
            }
        }

        report
    }

    pub fn validate_layout(&self) -> bool {
        self.validation_report().is_valid()
    }

    /// Turn walkable cells into obstacles with probability `density`,
    /// skipping `protected` positions. Returns how many cells were blocked.
    /// `density` is clamped to `0.0..=1.0`; a non-finite value places nothing.
    pub fn scatter_obstacles(
        &mut self,
        rng: &mut StdRng,
        density: f64,
        protected: &[Position],
    ) -> usize {
        let density = if density.is_finite() {
            density.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mut placed = 0;
        for cell in self.layout.grid.iter_mut() {
            if cell.kind != CellKind::Walkable
                || protected.contains(&Position::new(cell.x, cell.y))
            {
                continue;
            }
            if rng.gen_bool(density) {
                cell.kind = CellKind::Obstacle;
                cell.properties = Properties::new();
                placed += 1;
            }
        }
        debug!(placed, density, "obstacles scattered");
        placed
    }

    /// Produce `count` alternative layouts with reseeded obstacles.
    ///
    /// Each variation gets a fresh level id and keeps the POIs and
    /// connections. A variation is rerolled up to `attempts` times until it
    /// validates; after that the obstacle-free version is used.
    pub fn generate_variations(
        &self,
        count: usize,
        rng: &mut StdRng,
        density: f64,
        attempts: u32,
    ) -> Vec<LevelLayout> {
        let mut base = self.layout.clone();
        for cell in base.grid.iter_mut() {
            if cell.kind == CellKind::Obstacle {
                cell.kind = CellKind::Walkable;
                cell.properties = Properties::new();
            }
        }
        let base = LevelDesigner::from_layout(base);
        let protected: Vec<Position> = base.resolve_entry().into_iter().collect();

        let mut variations = Vec::with_capacity(count);
        for index in 0..count {
            let mut chosen = None;
            for _ in 0..attempts {
                let mut candidate = base.clone();
                candidate.scatter_obstacles(rng, density, &protected);
                if candidate.validate_layout() {
                    chosen = Some(candidate);
                    break;
                }
            }
            let mut variation = match chosen {
                Some(designer) => designer.into_layout(),
                None => {
                    warn!(index, attempts, "no valid variation found; using obstacle-free layout");
                    base.layout.clone()
                }
            };
            variation.id = LevelId::new();
            variations.push(variation);
        }
        variations
    }
}

impl ContentGenerator for LevelDesigner {
    type Artifact = LevelLayout;

    fn validate_report(&self) -> ValidationReport {
        self.validation_report()
    }

    fn emit(&self) -> LevelLayout {
        self.layout.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn kind_at(designer: &LevelDesigner, x: i32, y: i32) -> CellKind {
        designer.layout().cell(x, y).unwrap().kind
    }

    #[test]
    fn new_level_is_all_walkable() {
        for (w, h) in [(0, 0), (0, 5), (1, 1), (3, 7), (10, 10)] {
            let designer = LevelDesigner::new(w, h, "test", "");
            let layout = designer.layout();
            assert_eq!(layout.grid.len(), w * h);
            assert!(layout.grid.iter().all(|c| c.kind == CellKind::Walkable));
            assert!(layout.points_of_interest.is_empty());
            assert!(layout.connections.is_empty());
        }
    }

    #[test]
    fn cells_know_their_coordinates() {
        let designer = LevelDesigner::new(4, 3, "", "");
        let cell = designer.layout().cell(3, 2).unwrap();
        assert_eq!((cell.x, cell.y), (3, 2));
    }

    #[test]
    fn shrine_marks_its_cell() {
        let mut designer = LevelDesigner::new(10, 10, "Temple", "");
        let id = designer
            .add_point_of_interest("Shrine", PoiKind::Story, Position::new(5, 5), vec![], vec![])
            .id;
        assert_eq!(kind_at(&designer, 5, 5), CellKind::PointOfInterest);
        assert!(designer.layout().poi(id).is_some());
    }

    #[test]
    fn out_of_bounds_poi_is_kept_without_touching_grid() {
        let mut designer = LevelDesigner::new(3, 3, "", "");
        let before = designer.layout().grid.clone();
        designer.add_point_of_interest("Far", PoiKind::Shop, Position::new(9, -1), vec![], vec![]);
        assert_eq!(designer.layout().points_of_interest.len(), 1);
        assert_eq!(designer.layout().grid, before);
    }

    #[test]
    fn out_of_bounds_cell_writes_are_no_ops() {
        let mut designer = LevelDesigner::new(4, 4, "", "");
        let before = designer.layout().clone();
        for (x, y) in [(-1, 0), (0, -1), (4, 0), (0, 4), (i32::MAX, i32::MIN)] {
            designer.set_obstacle(x, y, Properties::new());
            designer.set_transition(x, y, Properties::new());
        }
        assert_eq!(designer.layout(), &before);
    }

    #[test]
    fn obstacle_overwrites_kind_and_properties() {
        let mut designer = LevelDesigner::new(4, 4, "", "");
        let props = Properties::from([("sprite".to_string(), "rock".into())]);
        designer.set_obstacle(1, 2, props.clone());
        let cell = designer.layout().cell(1, 2).unwrap();
        assert_eq!(cell.kind, CellKind::Obstacle);
        assert_eq!(cell.properties, props);

        designer.set_transition(1, 2, Properties::new());
        assert_eq!(kind_at(&designer, 1, 2), CellKind::Transition);
        assert!(designer.layout().cell(1, 2).unwrap().properties.is_empty());
    }

    #[test]
    fn parallel_connections_are_allowed() {
        let mut designer = LevelDesigner::new(4, 4, "", "");
        let a = designer
            .add_point_of_interest("A", PoiKind::Quest, Position::new(0, 0), vec![], vec![])
            .id;
        let b = designer
            .add_point_of_interest("B", PoiKind::Quest, Position::new(3, 3), vec![], vec![])
            .id;
        designer.add_connection(a, b, ConnectionKind::Path, Properties::new());
        designer.add_connection(a, b, ConnectionKind::Door, Properties::new());
        assert_eq!(designer.layout().connections.len(), 2);
        assert!(designer.validate_layout());
    }

    #[test]
    fn walled_off_poi_is_unreachable() {
        let mut designer = LevelDesigner::new(5, 5, "", "");
        for y in 0..5 {
            designer.set_obstacle(2, y, Properties::new());
        }
        designer.set_transition(0, 0, Properties::new());
        let near = designer
            .add_point_of_interest("Near", PoiKind::Shop, Position::new(1, 4), vec![], vec![])
            .id;
        let far = designer
            .add_point_of_interest("Far", PoiKind::Challenge, Position::new(4, 4), vec![], vec![])
            .id;

        let report = designer.validation_report();
        assert!(!report.is_valid());
        assert!(report.has(Subject::Poi(far), &IssueKind::Unreachable));
        assert!(!report.has(Subject::Poi(near), &IssueKind::Unreachable));
    }

    #[test]
    fn portal_reaches_across_walls_one_way() {
        let mut designer = LevelDesigner::new(5, 5, "", "");
        for y in 0..5 {
            designer.set_obstacle(2, y, Properties::new());
        }
        designer.set_entry(Position::new(0, 0));
        let near = designer
            .add_point_of_interest("Gate", PoiKind::Story, Position::new(1, 1), vec![], vec![])
            .id;
        let far = designer
            .add_point_of_interest("Vault", PoiKind::Quest, Position::new(4, 1), vec![], vec![])
            .id;
        designer.add_connection(near, far, ConnectionKind::Portal, Properties::new());
        assert!(designer.reachable_pois().contains(&far));
        assert!(designer.validate_layout());

        // Reversed portal leads out of the far side only.
        let mut reversed = LevelDesigner::new(5, 5, "", "");
        for y in 0..5 {
            reversed.set_obstacle(2, y, Properties::new());
        }
        reversed.set_entry(Position::new(0, 0));
        let near = reversed
            .add_point_of_interest("Gate", PoiKind::Story, Position::new(1, 1), vec![], vec![])
            .id;
        let far = reversed
            .add_point_of_interest("Vault", PoiKind::Quest, Position::new(4, 1), vec![], vec![])
            .id;
        reversed.add_connection(far, near, ConnectionKind::Portal, Properties::new());
        assert!(!reversed.reachable_pois().contains(&far));
    }

    #[test]
    fn obstacle_over_poi_is_reported_as_desync() {
        let mut designer = LevelDesigner::new(3, 3, "", "");
        let id = designer
            .add_point_of_interest("Well", PoiKind::Story, Position::new(1, 1), vec![], vec![])
            .id;
        designer.set_obstacle(1, 1, Properties::new());
        let report = designer.validation_report();
        assert!(report.has(Subject::Poi(id), &IssueKind::CellDesync));
    }

    #[test]
    fn dangling_connection_is_reported() {
        let mut designer = LevelDesigner::new(3, 3, "", "");
        let a = designer
            .add_point_of_interest("A", PoiKind::Story, Position::new(0, 0), vec![], vec![])
            .id;
        let ghost = PoiId::new();
        let conn = designer
            .add_connection(a, ghost, ConnectionKind::Door, Properties::new())
            .id;
        let report = designer.validation_report();
        assert!(report.has(Subject::Connection(conn), &IssueKind::DanglingEndpoint(ghost)));
    }

    #[test]
    fn blocked_entry_is_reported() {
        let mut designer = LevelDesigner::new(3, 3, "", "");
        designer.set_obstacle(0, 0, Properties::new());
        designer.set_entry(Position::new(0, 0));
        designer.add_point_of_interest("A", PoiKind::Story, Position::new(2, 2), vec![], vec![]);
        let report = designer.validation_report();
        assert!(report.has(Subject::Entry, &IssueKind::EntryBlocked));
    }

    #[test]
    fn entry_falls_back_to_first_transition() {
        let mut designer = LevelDesigner::new(4, 4, "", "");
        designer.set_transition(3, 1, Properties::new());
        designer.set_transition(0, 2, Properties::new());
        assert_eq!(designer.resolve_entry(), Some(Position::new(3, 1)));
    }

    #[test]
    fn scatter_respects_protected_cells() {
        let mut designer = LevelDesigner::new(6, 6, "", "");
        let mut rng = StdRng::seed_from_u64(7);
        let keep = Position::new(2, 2);
        let placed = designer.scatter_obstacles(&mut rng, 1.0, &[keep]);
        assert_eq!(placed, 35);
        assert_eq!(kind_at(&designer, 2, 2), CellKind::Walkable);
    }

    #[test]
    fn non_finite_density_places_nothing() {
        let mut designer = LevelDesigner::new(4, 4, "", "");
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(designer.scatter_obstacles(&mut rng, f64::NAN, &[]), 0);
        assert_eq!(designer.scatter_obstacles(&mut rng, f64::INFINITY, &[]), 0);
        assert!(designer
            .layout()
            .grid
            .iter()
            .all(|c| c.kind == CellKind::Walkable));
        assert_eq!(designer.generate_variations(2, &mut rng, f64::NAN, 3).len(), 2);
    }

    #[test]
    fn variations_are_valid_and_distinct() {
        let mut designer = LevelDesigner::new(12, 12, "Caves", "");
        designer.set_transition(0, 0, Properties::new());
        designer.add_point_of_interest("Camp", PoiKind::Shop, Position::new(6, 6), vec![], vec![]);
        designer.add_point_of_interest("Den", PoiKind::Challenge, Position::new(11, 11), vec![], vec![]);

        let mut rng = StdRng::seed_from_u64(99);
        let variations = designer.generate_variations(3, &mut rng, 0.2, 20);
        assert_eq!(variations.len(), 3);
        for v in &variations {
            assert_ne!(v.id, designer.layout().id);
            assert_eq!(v.points_of_interest, designer.layout().points_of_interest);
            assert!(LevelDesigner::from_layout(v.clone()).validate_layout());
        }
        assert!(designer.generate_variations(0, &mut rng, 0.2, 20).is_empty());
    }
}
