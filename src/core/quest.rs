/// Quest model — requirements, objectives, rewards and the lifecycle state machine.
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::validation::{ContentGenerator, IssueKind, Subject, ValidationReport};
use crate::schema::ids::{ElementId, ObjectiveId, PoiId, QuestId, RequirementId, RewardId};
use crate::schema::quest::{
    ObjectiveKind, Quest, QuestKind, QuestObjective, QuestRequirement, QuestReward, QuestState,
    RequirementKind, RewardKind,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("quest not found: {0}")]
    QuestNotFound(QuestId),
    #[error("cannot move quest from {} to {}", .from.name(), .to.name())]
    NotAllowed { from: QuestState, to: QuestState },
}

/// Owns every quest of a session, in creation order.
///
/// Lookups by id that miss return `None`/`false` and leave all quests as
/// they were. Quests are never removed.
#[derive(Debug, Clone, Default)]
pub struct QuestGenerator {
    quests: Vec<Quest>,
}

impl QuestGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_quests(quests: Vec<Quest>) -> Self {
        Self { quests }
    }

    /// Create a quest in the `Locked` state.
    pub fn create_quest(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        kind: QuestKind,
        difficulty: i32,
        linked_story_elements: Vec<ElementId>,
    ) -> &Quest {
        let quest = Quest {
            id: QuestId::new(),
            title: title.into(),
            description: description.into(),
            kind,
            difficulty,
            requirements: Vec::new(),
            objectives: Vec::new(),
            rewards: Vec::new(),
            state: QuestState::Locked,
            linked_story_elements,
        };
        debug!(id = %quest.id, title = %quest.title, ?kind, difficulty, "quest created");
        self.quests.push(quest);
        &self.quests[self.quests.len() - 1]
    }

    pub fn quest(&self, id: QuestId) -> Option<&Quest> {
        self.quests.iter().find(|q| q.id == id)
    }

    fn quest_mut(&mut self, id: QuestId) -> Option<&mut Quest> {
        let found = self.quests.iter_mut().find(|q| q.id == id);
        if found.is_none() {
            warn!(quest = %id, "quest lookup missed");
        }
        found
    }

    pub fn add_requirement(
        &mut self,
        quest_id: QuestId,
        kind: RequirementKind,
        target: impl Into<String>,
        value: i64,
    ) -> Option<&QuestRequirement> {
        let quest = self.quest_mut(quest_id)?;
        quest.requirements.push(QuestRequirement {
            id: RequirementId::new(),
            kind,
            target: target.into(),
            value,
        });
        quest.requirements.last()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_objective(
        &mut self,
        quest_id: QuestId,
        description: impl Into<String>,
        kind: ObjectiveKind,
        target: impl Into<String>,
        amount: i64,
        location: Option<PoiId>,
        optional: bool,
    ) -> Option<&QuestObjective> {
        let quest = self.quest_mut(quest_id)?;
        quest.objectives.push(QuestObjective {
            id: ObjectiveId::new(),
            description: description.into(),
            kind,
            target: target.into(),
            amount,
            location,
            completed: false,
            optional,
        });
        quest.objectives.last()
    }

    pub fn add_reward(
        &mut self,
        quest_id: QuestId,
        kind: RewardKind,
        item: impl Into<String>,
        amount: i64,
    ) -> Option<&QuestReward> {
        let quest = self.quest_mut(quest_id)?;
        quest.rewards.push(QuestReward {
            id: RewardId::new(),
            kind,
            item: item.into(),
            amount,
        });
        quest.rewards.last()
    }

    /// Overwrite a quest's state without consulting the lifecycle table.
    /// Returns `false` if the quest does not exist.
    pub fn update_state(&mut self, quest_id: QuestId, state: QuestState) -> bool {
        let Some(quest) = self.quest_mut(quest_id) else {
            return false;
        };
        if quest.state != state && !quest.state.can_transition_to(state) {
            warn!(
                quest = %quest_id,
                from = quest.state.name(),
                to = state.name(),
                "state change outside the lifecycle table"
            );
        }
        quest.state = state;
        true
    }

    /// Move a quest only along the lifecycle table.
    pub fn transition(&mut self, quest_id: QuestId, state: QuestState) -> Result<(), TransitionError> {
        let quest = self
            .quest_mut(quest_id)
            .ok_or(TransitionError::QuestNotFound(quest_id))?;
        if !quest.state.can_transition_to(state) {
            return Err(TransitionError::NotAllowed {
                from: quest.state,
                to: state,
            });
        }
        quest.state = state;
        Ok(())
    }

    /// Mark an objective done. If that leaves every required objective
    /// completed, the quest becomes `Completed`. Quests with no required
    /// objectives are never completed this way.
    pub fn complete_objective(&mut self, quest_id: QuestId, objective_id: ObjectiveId) -> bool {
        let Some(quest) = self.quest_mut(quest_id) else {
            return false;
        };
        let Some(objective) = quest.objectives.iter_mut().find(|o| o.id == objective_id) else {
            warn!(quest = %quest_id, objective = %objective_id, "objective lookup missed");
            return false;
        };
        objective.completed = true;

        if quest.required_objectives_done() && quest.state != QuestState::Completed {
            info!(quest = %quest_id, title = %quest.title, "all required objectives done");
            quest.state = QuestState::Completed;
        }
        true
    }

    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    pub fn available_quests(&self) -> Vec<&Quest> {
        self.quests_in_state(QuestState::Available)
    }

    pub fn quests_in_state(&self, state: QuestState) -> Vec<&Quest> {
        self.quests.iter().filter(|q| q.state == state).collect()
    }

    pub fn quests_by_kind(&self, kind: QuestKind) -> Vec<&Quest> {
        self.quests.iter().filter(|q| q.kind == kind).collect()
    }

    /// Create `count` locked side quests forming a linear unlock chain behind
    /// `main_id`: the first requires the main quest, each later one requires
    /// its predecessor. Returns `None` if the main quest does not exist.
    pub fn generate_quest_chain(
        &mut self,
        main_id: QuestId,
        count: usize,
        difficulty: i32,
    ) -> Option<Vec<QuestId>> {
        let main = self.quest(main_id)?;
        let title = main.title.clone();
        let links = main.linked_story_elements.clone();

        let mut chain = Vec::with_capacity(count);
        let mut previous = main_id;
        for part in 1..=count {
            let id = self
                .create_quest(
                    format!("{}: Part {}", title, part),
                    format!("Step {} of {} following '{}'", part, count, title),
                    QuestKind::Side,
                    difficulty,
                    links.clone(),
                )
                .id;
            self.add_requirement(id, RequirementKind::Quest, previous.to_string(), 1);
            chain.push(id);
            previous = id;
        }
        debug!(main = %main_id, count, "quest chain generated");
        Some(chain)
    }

    /// Check one quest for malformed requirements, objectives and rewards.
    pub fn quest_report(&self, quest: &Quest) -> ValidationReport {
        let mut report = ValidationReport::new();
        let own_id = quest.id.to_string();

        if quest.objectives.is_empty() {
            report.warning(Subject::Quest(quest.id), IssueKind::NoObjectives);
        }

        for req in &quest.requirements {
            let subject = Subject::Requirement(req.id);
            if req.value < 0 {
                report.error(subject, IssueKind::NegativeAmount(req.value));
            }
            if req.target.trim().is_empty() {
                report.error(subject, IssueKind::EmptyTarget);
            }
            if req.kind == RequirementKind::Quest && req.target == own_id {
                report.error(subject, IssueKind::SelfRequirement);
            }
        }

        for obj in &quest.objectives {
            let subject = Subject::Objective(obj.id);
            if obj.amount < 0 {
                report.error(subject, IssueKind::NegativeAmount(obj.amount));
            }
            if obj.target.trim().is_empty() {
                report.error(subject, IssueKind::EmptyTarget);
            }
        }

        for reward in &quest.rewards {
            let subject = Subject::Reward(reward.id);
            if reward.amount < 0 {
                report.error(subject, IssueKind::NegativeAmount(reward.amount));
            }
            if reward.item.trim().is_empty() {
                report.error(subject, IssueKind::EmptyTarget);
            }
        }

        report
    }

    pub fn validate_quest(&self, quest: &Quest) -> bool {
        self.quest_report(quest).is_valid()
    }

    /// Every quest's report, plus `quest` requirements naming unknown quests.
    pub fn validation_report(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        let known: FxHashSet<String> = self.quests.iter().map(|q| q.id.to_string()).collect();
        for quest in &self.quests {
            report.merge(self.quest_report(quest));
            for req in &quest.requirements {
                if req.kind == RequirementKind::Quest
                    && !req.target.trim().is_empty()
                    && !known.contains(&req.target)
                {
                    report.warning(
                        Subject::Requirement(req.id),
                        IssueKind::UnknownQuest(req.target.clone()),
                    );
                }
            }
        }
        report
    }
}

impl ContentGenerator for QuestGenerator {
    type Artifact = Vec<Quest>;

    fn validate_report(&self) -> ValidationReport {
        self.validation_report()
    }

    fn emit(&self) -> Vec<Quest> {
        self.quests.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quest_with_objectives(quests: &mut QuestGenerator) -> (QuestId, ObjectiveId, ObjectiveId) {
        let q = quests
            .create_quest("Q", "test quest", QuestKind::Main, 3, vec![])
            .id;
        let required = quests
            .add_objective(q, "Reach the gate", ObjectiveKind::Reach, "gate", 1, None, false)
            .unwrap()
            .id;
        let optional = quests
            .add_objective(q, "Pick herbs", ObjectiveKind::Collect, "herb", 5, None, true)
            .unwrap()
            .id;
        (q, required, optional)
    }

    #[test]
    fn new_quests_start_locked() {
        let mut quests = QuestGenerator::new();
        let quest = quests.create_quest("A", "", QuestKind::Side, 1, vec![]);
        assert_eq!(quest.state, QuestState::Locked);
        assert!(quest.objectives.is_empty());
    }

    #[test]
    fn optional_objectives_do_not_complete_quest() {
        let mut quests = QuestGenerator::new();
        let (q, required, optional) = quest_with_objectives(&mut quests);

        assert!(quests.complete_objective(q, optional));
        assert_ne!(quests.quest(q).unwrap().state, QuestState::Completed);

        assert!(quests.complete_objective(q, required));
        assert_eq!(quests.quest(q).unwrap().state, QuestState::Completed);
    }

    #[test]
    fn required_objectives_complete_in_any_order() {
        let mut quests = QuestGenerator::new();
        let q = quests.create_quest("Q", "", QuestKind::Side, 1, vec![]).id;
        let ids: Vec<ObjectiveId> = (0..3)
            .map(|i| {
                quests
                    .add_objective(q, "", ObjectiveKind::Kill, format!("wolf {}", i), 1, None, false)
                    .unwrap()
                    .id
            })
            .collect();
        for id in ids.iter().rev() {
            assert_ne!(quests.quest(q).unwrap().state, QuestState::Completed);
            quests.complete_objective(q, *id);
        }
        assert_eq!(quests.quest(q).unwrap().state, QuestState::Completed);
        assert_eq!(quests.quest(q).unwrap().required_progress(), (3, 3));
    }

    #[test]
    fn only_optional_objectives_never_auto_complete() {
        let mut quests = QuestGenerator::new();
        let q = quests.create_quest("Q", "", QuestKind::Hidden, 1, vec![]).id;
        let o = quests
            .add_objective(q, "", ObjectiveKind::Interact, "lever", 1, None, true)
            .unwrap()
            .id;
        assert!(quests.complete_objective(q, o));
        assert_eq!(quests.quest(q).unwrap().state, QuestState::Locked);
    }

    #[test]
    fn missing_lookups_return_sentinels_and_mutate_nothing() {
        let mut quests = QuestGenerator::new();
        let (q, _, _) = quest_with_objectives(&mut quests);
        let before = quests.quests().to_vec();
        let ghost = QuestId::new();

        assert!(quests.add_requirement(ghost, RequirementKind::Level, "5", 5).is_none());
        assert!(quests
            .add_objective(ghost, "", ObjectiveKind::Kill, "x", 1, None, false)
            .is_none());
        assert!(quests.add_reward(ghost, RewardKind::Currency, "gold", 10).is_none());
        assert!(!quests.update_state(ghost, QuestState::Active));
        assert!(!quests.complete_objective(ghost, ObjectiveId::new()));
        assert!(!quests.complete_objective(q, ObjectiveId::new()));
        assert_eq!(quests.quests(), before.as_slice());
    }

    #[test]
    fn update_state_is_unconstrained() {
        let mut quests = QuestGenerator::new();
        let q = quests.create_quest("Q", "", QuestKind::Main, 1, vec![]).id;
        assert!(quests.update_state(q, QuestState::Completed));
        assert!(quests.update_state(q, QuestState::Locked));
        assert_eq!(quests.quest(q).unwrap().state, QuestState::Locked);
    }

    #[test]
    fn strict_transition_follows_table() {
        let mut quests = QuestGenerator::new();
        let q = quests.create_quest("Q", "", QuestKind::Main, 1, vec![]).id;
        assert_eq!(
            quests.transition(q, QuestState::Active),
            Err(TransitionError::NotAllowed {
                from: QuestState::Locked,
                to: QuestState::Active
            })
        );
        assert!(quests.transition(q, QuestState::Available).is_ok());
        assert!(quests.transition(q, QuestState::Active).is_ok());
        assert!(quests.transition(q, QuestState::Failed).is_ok());
        let ghost = QuestId::new();
        assert_eq!(
            quests.transition(ghost, QuestState::Active),
            Err(TransitionError::QuestNotFound(ghost))
        );
    }

    #[test]
    fn filters_preserve_insertion_order() {
        let mut quests = QuestGenerator::new();
        let a = quests.create_quest("A", "", QuestKind::Side, 1, vec![]).id;
        let b = quests.create_quest("B", "", QuestKind::Main, 1, vec![]).id;
        let c = quests.create_quest("C", "", QuestKind::Side, 1, vec![]).id;
        quests.update_state(c, QuestState::Available);
        quests.update_state(a, QuestState::Available);

        let available: Vec<QuestId> = quests.available_quests().iter().map(|q| q.id).collect();
        assert_eq!(available, vec![a, c]);
        let sides: Vec<QuestId> = quests
            .quests_by_kind(QuestKind::Side)
            .iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(sides, vec![a, c]);
        assert_eq!(quests.quests_in_state(QuestState::Locked)[0].id, b);
    }

    #[test]
    fn quest_chain_links_linearly() {
        let mut quests = QuestGenerator::new();
        let hero = ElementId::new();
        let main = quests
            .create_quest("Dragon", "", QuestKind::Main, 5, vec![hero])
            .id;
        let chain = quests.generate_quest_chain(main, 3, 4).unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(quests.quests().len(), 4);

        let mut previous = main;
        for id in &chain {
            let quest = quests.quest(*id).unwrap();
            assert_eq!(quest.kind, QuestKind::Side);
            assert_eq!(quest.state, QuestState::Locked);
            assert_eq!(quest.difficulty, 4);
            assert_eq!(quest.linked_story_elements, vec![hero]);
            assert_eq!(quest.requirements.len(), 1);
            assert_eq!(quest.requirements[0].kind, RequirementKind::Quest);
            assert_eq!(quest.requirements[0].target, previous.to_string());
            previous = *id;
        }
        assert!(quests.validation_report().is_valid());
        assert!(quests.generate_quest_chain(QuestId::new(), 2, 1).is_none());
        assert_eq!(quests.generate_quest_chain(main, 0, 1), Some(vec![]));
    }

    #[test]
    fn malformed_records_fail_validation() {
        let mut quests = QuestGenerator::new();
        let q = quests.create_quest("Q", "", QuestKind::Side, 1, vec![]).id;
        let req = quests
            .add_requirement(q, RequirementKind::Quest, q.to_string(), -1)
            .unwrap()
            .id;
        let obj = quests
            .add_objective(q, "", ObjectiveKind::Collect, "", 2, None, false)
            .unwrap()
            .id;
        let reward = quests
            .add_reward(q, RewardKind::Item, "sword", -3)
            .unwrap()
            .id;

        let quest = quests.quest(q).unwrap();
        let report = quests.quest_report(quest);
        assert!(!quests.validate_quest(quest));
        assert!(report.has(Subject::Requirement(req), &IssueKind::NegativeAmount(-1)));
        assert!(report.has(Subject::Requirement(req), &IssueKind::SelfRequirement));
        assert!(report.has(Subject::Objective(obj), &IssueKind::EmptyTarget));
        assert!(report.has(Subject::Reward(reward), &IssueKind::NegativeAmount(-3)));
    }

    #[test]
    fn well_formed_quest_validates() {
        let mut quests = QuestGenerator::new();
        let (q, _, _) = quest_with_objectives(&mut quests);
        quests.add_reward(q, RewardKind::Experience, "xp", 100);
        quests.add_requirement(q, RequirementKind::Level, "player", 3);
        assert!(quests.validate_quest(quests.quest(q).unwrap()));
    }

    #[test]
    fn unknown_quest_requirement_warns() {
        let mut quests = QuestGenerator::new();
        let (q, _, _) = quest_with_objectives(&mut quests);
        let req = quests
            .add_requirement(q, RequirementKind::Quest, "prologue", 1)
            .unwrap()
            .id;
        let report = quests.validation_report();
        assert!(report.is_valid());
        assert!(report.has(
            Subject::Requirement(req),
            &IssueKind::UnknownQuest("prologue".to_string())
        ));
    }
}
