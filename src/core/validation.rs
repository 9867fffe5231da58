/// Structured validation reports and the generator capability trait.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::schema::ids::{
    BranchId, ConnectionId, ElementId, EventId, ObjectiveId, PlotPointId, PoiId, QuestId,
    RequirementId, RewardId,
};
use crate::schema::level::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// The entity an issue is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    Element(ElementId),
    PlotPoint(PlotPointId),
    Event(EventId),
    Branch(BranchId),
    Poi(PoiId),
    Connection(ConnectionId),
    Cell(Position),
    Entry,
    Quest(QuestId),
    Requirement(RequirementId),
    Objective(ObjectiveId),
    Reward(RewardId),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(id) => write!(f, "element {}", id),
            Self::PlotPoint(id) => write!(f, "plot point {}", id),
            Self::Event(id) => write!(f, "timeline event {}", id),
            Self::Branch(id) => write!(f, "branch {}", id),
            Self::Poi(id) => write!(f, "POI {}", id),
            Self::Connection(id) => write!(f, "connection {}", id),
            Self::Cell(pos) => write!(f, "cell ({}, {})", pos.x, pos.y),
            Self::Entry => write!(f, "level entry"),
            Self::Quest(id) => write!(f, "quest {}", id),
            Self::Requirement(id) => write!(f, "requirement {}", id),
            Self::Objective(id) => write!(f, "objective {}", id),
            Self::Reward(id) => write!(f, "reward {}", id),
        }
    }
}

/// Why an entity was flagged.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum IssueKind {
    #[error("references missing plot point {0}")]
    MissingPlotPoint(PlotPointId),
    #[error("depends on unknown event {0}")]
    UnknownDependency(EventId),
    #[error("depends on itself")]
    SelfDependency,
    #[error("is part of a dependency cycle")]
    DependencyCycle,
    #[error("is scheduled before its dependency {0}")]
    DependencyScheduledLater(EventId),
    #[error("has an empty condition")]
    EmptyCondition,
    #[error("is never scheduled on the main timeline")]
    Unscheduled,
    #[error("lies outside the grid")]
    OutOfBounds,
    #[error("sits on a cell that is no longer marked as a point of interest")]
    CellDesync,
    #[error("is marked as a point of interest but no POI stands there")]
    OrphanCell,
    #[error("names missing POI {0}")]
    DanglingEndpoint(PoiId),
    #[error("is not set and no fallback entry exists")]
    MissingEntry,
    #[error("is blocked by an obstacle")]
    EntryBlocked,
    #[error("is unreachable from the entry")]
    Unreachable,
    #[error("has negative amount {0}")]
    NegativeAmount(i64),
    #[error("has an empty target")]
    EmptyTarget,
    #[error("requires itself")]
    SelfRequirement,
    #[error("has no objectives")]
    NoObjectives,
    #[error("points at POI {0} which is not in the level")]
    UnknownPoi(PoiId),
    #[error("links story element {0} which is not in the story")]
    UnknownElement(ElementId),
    #[error("requires quest '{0}' which does not exist")]
    UnknownQuest(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub subject: Subject,
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        };
        write!(f, "{}: {} {}", level, self.subject, self.kind)
    }
}

/// Every issue found by a validation pass, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, subject: Subject, kind: IssueKind) {
        self.issues.push(ValidationIssue {
            severity: Severity::Error,
            subject,
            kind,
        });
    }

    pub fn warning(&mut self, subject: Subject, kind: IssueKind) {
        self.issues.push(ValidationIssue {
            severity: Severity::Warning,
            subject,
            kind,
        });
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.issues.extend(other.issues);
    }

    /// No error-severity issues. Warnings do not invalidate.
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    /// Whether any issue about `subject` has the given kind.
    pub fn has(&self, subject: Subject, kind: &IssueKind) -> bool {
        self.issues
            .iter()
            .any(|i| i.subject == subject && &i.kind == kind)
    }
}

/// Capability shared by every generator: check itself, hand out its artifact.
pub trait ContentGenerator {
    type Artifact;

    fn validate_report(&self) -> ValidationReport;

    fn emit(&self) -> Self::Artifact;

    fn validate(&self) -> bool {
        self.validate_report().is_valid()
    }
}
