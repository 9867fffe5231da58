/// Model integration tests — the three generators composed by hand.

use narrative_graph::core::level::LevelDesigner;
use narrative_graph::core::pipeline::session_report;
use narrative_graph::core::quest::{QuestGenerator, TransitionError};
use narrative_graph::core::story::StoryGenerator;
use narrative_graph::core::validation::{ContentGenerator, IssueKind, Subject};
use narrative_graph::schema::ids::{ObjectiveId, PoiId};
use narrative_graph::schema::level::{CellKind, ConnectionKind, PoiKind, Position};
use narrative_graph::schema::quest::{ObjectiveKind, QuestKind, QuestState, RewardKind};
use narrative_graph::schema::story::ElementKind;
use narrative_graph::schema::value::{Properties, Value};

/// A 7×3 level split by a wall at x = 3, entry on the left.
fn walled_level() -> (LevelDesigner, PoiId, PoiId) {
    let mut level = LevelDesigner::new(7, 3, "Split", "A wall runs down the middle");
    for y in 0..3 {
        level.set_obstacle(3, y, Properties::new());
    }
    level.set_entry(Position::new(0, 1));
    let camp = level
        .add_point_of_interest("Camp", PoiKind::Story, Position::new(1, 1), vec![], vec![])
        .id;
    let vault = level
        .add_point_of_interest("Vault", PoiKind::Challenge, Position::new(5, 1), vec![], vec![])
        .id;
    (level, camp, vault)
}

#[test]
fn hand_built_session_validates() {
    let mut story = StoryGenerator::new();
    story.set_basics("The Vault", "Something waits behind the wall");
    let thief = story
        .add_element(
            ElementKind::Character,
            "Thief",
            "Quick hands",
            Properties::from([("guild".to_string(), Value::from("shadows"))]),
        )
        .id;
    let heist = story
        .add_plot_point("Heist", "Break in", vec![], vec!["vault_open".to_string()])
        .id;
    story.add_timeline_event(heist, 10, vec![]);

    let (mut level, camp, vault) = walled_level();
    level.add_connection(camp, vault, ConnectionKind::Door, Properties::new());

    let mut quests = QuestGenerator::new();
    let quest = quests
        .create_quest("Crack the vault", "", QuestKind::Main, 2, vec![thief])
        .id;
    quests.add_objective(quest, "Reach the vault", ObjectiveKind::Reach, "vault", 1, Some(vault), false);
    quests.add_reward(quest, RewardKind::Currency, "gold", 500);

    let report = session_report(&story, &level, &quests);
    assert!(report.is_valid(), "unexpected issues: {:?}", report.issues);
    assert!(story.validate());
    assert!(level.validate());
    assert!(quests.validate());
}

#[test]
fn wall_cuts_off_poi_until_connected() {
    let (mut level, camp, vault) = walled_level();
    assert_eq!(level.layout().cell(3, 1).unwrap().kind, CellKind::Obstacle);
    assert!(level
        .validation_report()
        .has(Subject::Poi(vault), &IssueKind::Unreachable));

    // A portal leading out of the vault does not help.
    level.add_connection(vault, camp, ConnectionKind::Portal, Properties::new());
    assert!(!level.reachable_pois().contains(&vault));

    level.add_connection(camp, vault, ConnectionKind::Portal, Properties::new());
    assert!(level.reachable_pois().contains(&vault));
    assert!(level.validate_layout());
}

#[test]
fn objectives_complete_in_any_order() {
    let mut quests = QuestGenerator::new();
    let quest = quests.create_quest("Errands", "", QuestKind::Side, 1, vec![]).id;
    let ids: Vec<ObjectiveId> = (0..3)
        .map(|i| {
            quests
                .add_objective(quest, format!("Errand {}", i), ObjectiveKind::Collect, "herb", 1, None, false)
                .unwrap()
                .id
        })
        .collect();
    let bonus = quests
        .add_objective(quest, "Bonus", ObjectiveKind::Kill, "rat", 5, None, true)
        .unwrap()
        .id;

    assert!(quests.complete_objective(quest, bonus));
    for id in [ids[2], ids[0]] {
        assert!(quests.complete_objective(quest, id));
        assert_ne!(quests.quest(quest).unwrap().state, QuestState::Completed);
    }
    assert!(quests.complete_objective(quest, ids[1]));
    assert_eq!(quests.quest(quest).unwrap().state, QuestState::Completed);
}

#[test]
fn lifecycle_rejects_skipping_states() {
    let mut quests = QuestGenerator::new();
    let quest = quests.create_quest("Gate", "", QuestKind::Main, 1, vec![]).id;

    assert_eq!(
        quests.transition(quest, QuestState::Completed),
        Err(TransitionError::NotAllowed {
            from: QuestState::Locked,
            to: QuestState::Completed
        })
    );
    assert_eq!(quests.transition(quest, QuestState::Available), Ok(()));
    assert_eq!(quests.transition(quest, QuestState::Active), Ok(()));
    assert_eq!(quests.transition(quest, QuestState::Failed), Ok(()));
    assert_eq!(quests.transition(quest, QuestState::Available), Ok(()));

    // The unchecked setter still goes anywhere.
    assert!(quests.update_state(quest, QuestState::Completed));
    assert_eq!(quests.quest(quest).unwrap().state, QuestState::Completed);
}

#[test]
fn emitted_artifacts_are_detached_copies() {
    let (mut level, _, _) = walled_level();
    let before = level.emit();
    level.set_transition(6, 1, Properties::new());
    assert_eq!(before.cell(6, 1).unwrap().kind, CellKind::Walkable);
    assert_eq!(level.layout().cell(6, 1).unwrap().kind, CellKind::Transition);
}
