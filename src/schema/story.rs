use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::ids::{BranchId, ElementId, EventId, PlotPointId, StoryId};
use super::value::Properties;

/// What a story element stands for in the narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Character,
    Location,
    Event,
    Item,
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Location => "location",
            Self::Event => "event",
            Self::Item => "item",
        }
    }
}

/// A character, place, happening or object that quests and POIs can point at.
///
/// Identity never changes; `properties` may be edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryElement {
    pub id: ElementId,
    pub kind: ElementKind,
    pub name: String,
    pub description: String,
    pub properties: Properties,
}

/// A discrete narrative beat. `order` is the creation index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    pub id: PlotPointId,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub consequences: Vec<String>,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: EventId,
    pub plot_point_id: PlotPointId,
    pub timestamp: i64,
    pub dependencies: Vec<EventId>,
}

impl TimelineEvent {
    /// Build a detached event, e.g. for use as a branch alternative.
    pub fn new(plot_point_id: PlotPointId, timestamp: i64, dependencies: Vec<EventId>) -> Self {
        Self {
            id: EventId::new(),
            plot_point_id,
            timestamp,
            dependencies,
        }
    }
}

/// An alternate sub-timeline activated when `condition` holds.
///
/// Branch events never appear in the main event sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineBranch {
    pub id: BranchId,
    pub condition: String,
    pub alternative_events: Vec<TimelineEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub events: Vec<TimelineEvent>,
    pub branches: Vec<TimelineBranch>,
}

impl Timeline {
    /// Main events plus the events of every branch whose condition is active,
    /// ordered by timestamp. Ties keep main-timeline-first insertion order.
    pub fn resolve(&self, active_conditions: &FxHashSet<String>) -> Vec<&TimelineEvent> {
        let mut resolved: Vec<&TimelineEvent> = self.events.iter().collect();
        for branch in &self.branches {
            if active_conditions.contains(&branch.condition) {
                resolved.extend(branch.alternative_events.iter());
            }
        }
        resolved.sort_by_key(|event| event.timestamp);
        resolved
    }

    /// Find an event on the main timeline or inside any branch.
    pub fn find_event(&self, id: EventId) -> Option<&TimelineEvent> {
        self.events.iter().find(|e| e.id == id).or_else(|| {
            self.branches
                .iter()
                .flat_map(|b| b.alternative_events.iter())
                .find(|e| e.id == id)
        })
    }
}

/// The accumulated narrative of one generation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryStructure {
    pub id: StoryId,
    pub title: String,
    pub synopsis: String,
    pub elements: Vec<StoryElement>,
    pub plot_points: Vec<PlotPoint>,
    pub timeline: Timeline,
}

impl Default for StoryStructure {
    fn default() -> Self {
        Self {
            id: StoryId::new(),
            title: String::new(),
            synopsis: String::new(),
            elements: Vec::new(),
            plot_points: Vec::new(),
            timeline: Timeline::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline_with_branch() -> (Timeline, PlotPointId) {
        let pp = PlotPointId::new();
        let timeline = Timeline {
            events: vec![
                TimelineEvent::new(pp, 10, vec![]),
                TimelineEvent::new(pp, 30, vec![]),
            ],
            branches: vec![TimelineBranch {
                id: BranchId::new(),
                condition: "hero_falls".to_string(),
                alternative_events: vec![TimelineEvent::new(pp, 20, vec![])],
            }],
        };
        (timeline, pp)
    }

    #[test]
    fn resolve_without_active_branches_is_main_timeline() {
        let (timeline, _) = timeline_with_branch();
        let resolved = timeline.resolve(&FxHashSet::default());
        let stamps: Vec<i64> = resolved.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![10, 30]);
    }

    #[test]
    fn resolve_splices_active_branch_by_timestamp() {
        let (timeline, _) = timeline_with_branch();
        let mut active = FxHashSet::default();
        active.insert("hero_falls".to_string());
        let stamps: Vec<i64> = timeline.resolve(&active).iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![10, 20, 30]);
        // Main sequence itself is untouched.
        assert_eq!(timeline.events.len(), 2);
    }

    #[test]
    fn find_event_searches_branches() {
        let (timeline, _) = timeline_with_branch();
        let branch_event = timeline.branches[0].alternative_events[0].id;
        assert!(timeline.find_event(branch_event).is_some());
        assert!(timeline.find_event(EventId::new()).is_none());
    }

    #[test]
    fn element_kind_names() {
        assert_eq!(ElementKind::Character.name(), "character");
        assert_eq!(ElementKind::Item.name(), "item");
    }
}
