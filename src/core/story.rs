/// Story model — elements, ordered plot points and a branching timeline.
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::core::validation::{ContentGenerator, IssueKind, Subject, ValidationReport};
use crate::schema::ids::{BranchId, ElementId, EventId, PlotPointId};
use crate::schema::story::{
    ElementKind, PlotPoint, StoryElement, StoryStructure, TimelineBranch, TimelineEvent,
};
use crate::schema::value::Properties;

/// Accumulates the narrative content of one session.
///
/// Every mutator appends and returns the new record; nothing is ever removed.
/// Cross references (timeline → plot point, event → event) are accepted as-is
/// and only checked by [`StoryGenerator::validation_report`].
#[derive(Debug, Clone, Default)]
pub struct StoryGenerator {
    story: StoryStructure,
}

impl StoryGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume work on a previously emitted story.
    pub fn from_story(story: StoryStructure) -> Self {
        Self { story }
    }

    pub fn set_basics(&mut self, title: impl Into<String>, synopsis: impl Into<String>) {
        self.story.title = title.into();
        self.story.synopsis = synopsis.into();
    }

    pub fn add_element(
        &mut self,
        kind: ElementKind,
        name: impl Into<String>,
        description: impl Into<String>,
        properties: Properties,
    ) -> &StoryElement {
        let element = StoryElement {
            id: ElementId::new(),
            kind,
            name: name.into(),
            description: description.into(),
            properties,
        };
        debug!(id = %element.id, kind = element.kind.name(), name = %element.name, "story element added");
        self.story.elements.push(element);
        &self.story.elements[self.story.elements.len() - 1]
    }

    pub fn element(&self, id: ElementId) -> Option<&StoryElement> {
        self.story.elements.iter().find(|e| e.id == id)
    }

    /// Mutable access for editing an element's properties in place.
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut StoryElement> {
        self.story.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn elements_of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &StoryElement> {
        self.story.elements.iter().filter(move |e| e.kind == kind)
    }

    /// Append a plot point. Its `order` is the number of plot points before it.
    pub fn add_plot_point(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        requirements: Vec<String>,
        consequences: Vec<String>,
    ) -> &PlotPoint {
        let plot_point = PlotPoint {
            id: PlotPointId::new(),
            title: title.into(),
            description: description.into(),
            requirements,
            consequences,
            order: self.story.plot_points.len(),
        };
        debug!(id = %plot_point.id, order = plot_point.order, "plot point added");
        self.story.plot_points.push(plot_point);
        &self.story.plot_points[self.story.plot_points.len() - 1]
    }

    pub fn plot_point(&self, id: PlotPointId) -> Option<&PlotPoint> {
        self.story.plot_points.iter().find(|p| p.id == id)
    }

    pub fn plot_points_in_order(&self) -> Vec<&PlotPoint> {
        let mut points: Vec<&PlotPoint> = self.story.plot_points.iter().collect();
        points.sort_by_key(|p| p.order);
        points
    }

    /// Append an event to the main timeline. The plot point does not have to
    /// exist yet.
    pub fn add_timeline_event(
        &mut self,
        plot_point_id: PlotPointId,
        timestamp: i64,
        dependencies: Vec<EventId>,
    ) -> &TimelineEvent {
        if self.plot_point(plot_point_id).is_none() {
            warn!(%plot_point_id, "timeline event references an unknown plot point");
        }
        let event = TimelineEvent::new(plot_point_id, timestamp, dependencies);
        debug!(id = %event.id, timestamp, "timeline event added");
        let events = &mut self.story.timeline.events;
        events.push(event);
        &events[events.len() - 1]
    }

    pub fn add_timeline_branch(
        &mut self,
        condition: impl Into<String>,
        alternative_events: Vec<TimelineEvent>,
    ) -> &TimelineBranch {
        let branch = TimelineBranch {
            id: BranchId::new(),
            condition: condition.into(),
            alternative_events,
        };
        debug!(id = %branch.id, condition = %branch.condition, "timeline branch added");
        let branches = &mut self.story.timeline.branches;
        branches.push(branch);
        &branches[branches.len() - 1]
    }

    pub fn story(&self) -> &StoryStructure {
        &self.story
    }

    /// Check the timeline for dangling references and plot holes.
    pub fn validation_report(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        let timeline = &self.story.timeline;

        let plot_points: FxHashSet<PlotPointId> =
            self.story.plot_points.iter().map(|p| p.id).collect();

        let all_events: Vec<&TimelineEvent> = timeline
            .events
            .iter()
            .chain(timeline.branches.iter().flat_map(|b| b.alternative_events.iter()))
            .collect();
        let by_id: FxHashMap<EventId, &TimelineEvent> =
            all_events.iter().map(|e| (e.id, *e)).collect();

        for event in &all_events {
            let subject = Subject::Event(event.id);
            if !plot_points.contains(&event.plot_point_id) {
                report.error(subject, IssueKind::MissingPlotPoint(event.plot_point_id));
            }
            for dep in &event.dependencies {
                if *dep == event.id {
                    report.error(subject, IssueKind::SelfDependency);
                    continue;
                }
                match by_id.get(dep) {
                    None => report.error(subject, IssueKind::UnknownDependency(*dep)),
                    Some(d) if d.timestamp > event.timestamp => {
                        report.warning(subject, IssueKind::DependencyScheduledLater(*dep))
                    }
                    Some(_) => {}
                }
            }
        }

        let mut in_cycle: Vec<EventId> = cycle_members(&all_events).into_iter().collect();
        in_cycle.sort();
        for id in in_cycle {
            report.error(Subject::Event(id), IssueKind::DependencyCycle);
        }

        for branch in &timeline.branches {
            if branch.condition.trim().is_empty() {
                report.warning(Subject::Branch(branch.id), IssueKind::EmptyCondition);
            }
        }

        let scheduled: FxHashSet<PlotPointId> =
            timeline.events.iter().map(|e| e.plot_point_id).collect();
        for point in &self.story.plot_points {
            if !scheduled.contains(&point.id) {
                report.warning(Subject::PlotPoint(point.id), IssueKind::Unscheduled);
            }
        }

        report
    }

    pub fn validate(&self) -> bool {
        self.validation_report().is_valid()
    }
}

impl ContentGenerator for StoryGenerator {
    type Artifact = StoryStructure;

    fn validate_report(&self) -> ValidationReport {
        self.validation_report()
    }

    fn emit(&self) -> StoryStructure {
        self.story.clone()
    }
}

/// Events that sit on a dependency cycle (self-loops excluded).
///
/// Iterative DFS: `path` holds the events currently on the walk, each paired
/// with the index of the next dependency to follow.
fn cycle_members(events: &[&TimelineEvent]) -> FxHashSet<EventId> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnStack,
        Done,
    }

    let index: FxHashMap<EventId, usize> =
        events.iter().enumerate().map(|(i, e)| (e.id, i)).collect();
    let mut marks = vec![Mark::Unvisited; events.len()];
    let mut members = FxHashSet::default();
    let mut path: Vec<(usize, usize)> = Vec::new();

    for root in 0..events.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::OnStack;
        path.push((root, 0));

        while let Some(top) = path.last_mut() {
            let (i, next) = *top;
            let Some(dep) = events[i].dependencies.get(next) else {
                marks[i] = Mark::Done;
                path.pop();
                continue;
            };
            top.1 += 1;
            if *dep == events[i].id {
                continue;
            }
            let Some(&j) = index.get(dep) else { continue };
            match marks[j] {
                Mark::OnStack => {
                    if let Some(start) = path.iter().position(|&(p, _)| p == j) {
                        members.extend(path[start..].iter().map(|&(p, _)| events[p].id));
                    }
                }
                Mark::Unvisited => {
                    marks[j] = Mark::OnStack;
                    path.push((j, 0));
                }
                Mark::Done => {}
            }
        }
    }
    members
}
