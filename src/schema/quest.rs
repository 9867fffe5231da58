use serde::{Deserialize, Serialize};

use super::ids::{ElementId, ObjectiveId, PoiId, QuestId, RequirementId, RewardId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestKind {
    Main,
    Side,
    Hidden,
    Repeatable,
}

/// Quest lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestState {
    Locked,
    Available,
    Active,
    Completed,
    Failed,
}

impl QuestState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Available => "available",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// The lifecycle table enforced by strict transitions.
    ///
    /// `update_state` ignores this table; it is consulted by
    /// `QuestGenerator::transition` and used to flag unusual moves.
    pub fn can_transition_to(&self, next: QuestState) -> bool {
        use QuestState::*;
        matches!(
            (self, next),
            (Locked, Available)
                | (Available, Locked)
                | (Available, Active)
                | (Active, Completed)
                | (Active, Failed)
                | (Failed, Available)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequirementKind {
    Level,
    Item,
    Quest,
    Reputation,
    Skill,
}

/// A precondition consulted by the game runtime. Never enforced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestRequirement {
    pub id: RequirementId,
    pub kind: RequirementKind,
    pub target: String,
    pub value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectiveKind {
    Collect,
    Kill,
    Interact,
    Reach,
    Escort,
    Defend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestObjective {
    pub id: ObjectiveId,
    pub description: String,
    pub kind: ObjectiveKind,
    pub target: String,
    pub amount: i64,
    pub location: Option<PoiId>,
    pub completed: bool,
    pub optional: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardKind {
    Experience,
    Item,
    Currency,
    Reputation,
    Skill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestReward {
    pub id: RewardId,
    pub kind: RewardKind,
    pub item: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub title: String,
    pub description: String,
    pub kind: QuestKind,
    pub difficulty: i32,
    pub requirements: Vec<QuestRequirement>,
    pub objectives: Vec<QuestObjective>,
    pub rewards: Vec<QuestReward>,
    pub state: QuestState,
    pub linked_story_elements: Vec<ElementId>,
}

impl Quest {
    /// `(completed, total)` counts over the non-optional objectives.
    pub fn required_progress(&self) -> (usize, usize) {
        let required = self.objectives.iter().filter(|o| !o.optional);
        let (done, total) = required.fold((0, 0), |(done, total), o| {
            (done + usize::from(o.completed), total + 1)
        });
        (done, total)
    }

    /// True when the quest has at least one required objective and all of
    /// them are completed.
    pub fn required_objectives_done(&self) -> bool {
        let (done, total) = self.required_progress();
        total > 0 && done == total
    }

    pub fn objective(&self, id: ObjectiveId) -> Option<&QuestObjective> {
        self.objectives.iter().find(|o| o.id == id)
    }
}
