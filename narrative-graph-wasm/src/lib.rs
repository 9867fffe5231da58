//! WASM bindings for narrative-graph — powers the interactive web demo.

use wasm_bindgen::prelude::*;

use narrative_graph::core::config::SessionConfig;
use narrative_graph::core::pipeline::{NarrativeGenerator, SessionSnapshot};
use narrative_graph::schema::ids::{ObjectiveId, QuestId};
use narrative_graph::schema::quest::QuestState;

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct QuestInfo {
    id: String,
    title: String,
    kind: String,
    state: String,
    done: usize,
    total: usize,
    objectives: Vec<ObjectiveInfo>,
}

#[derive(serde::Serialize)]
struct ObjectiveInfo {
    id: String,
    description: String,
    optional: bool,
    completed: bool,
    x: Option<i32>,
    y: Option<i32>,
}

fn parse_state(s: &str) -> Option<QuestState> {
    match s.to_lowercase().as_str() {
        "locked" => Some(QuestState::Locked),
        "available" => Some(QuestState::Available),
        "active" => Some(QuestState::Active),
        "completed" => Some(QuestState::Completed),
        "failed" => Some(QuestState::Failed),
        _ => None,
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// One generation session held on the JS side.
#[wasm_bindgen]
pub struct SessionDemo {
    generator: NarrativeGenerator,
}

#[wasm_bindgen]
impl SessionDemo {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64, width: usize, height: usize) -> Result<SessionDemo, JsError> {
        let generator = NarrativeGenerator::builder()
            .with_config(SessionConfig {
                width,
                height,
                seed,
                ..SessionConfig::default()
            })
            .build()
            .map_err(|e| JsError::new(&format!("Session build error: {e}")))?;
        Ok(SessionDemo { generator })
    }

    /// Build a story-driven level; returns the main quest id.
    pub fn generate(&mut self, title: &str, synopsis: &str, difficulty: i32) -> Result<String, JsError> {
        self.generator
            .generate_story_driven_level(title, synopsis, difficulty)
            .map(|id| id.to_string())
            .ok_or_else(|| JsError::new("Generation stopped before the main quest was ready"))
    }

    pub fn map(&self) -> String {
        self.generator.level().render_ascii()
    }

    pub fn quests(&self) -> Result<String, JsError> {
        let level = self.generator.level();
        let info: Vec<QuestInfo> = self
            .generator
            .all_quests()
            .iter()
            .map(|q| {
                let (done, total) = q.required_progress();
                QuestInfo {
                    id: q.id.to_string(),
                    title: q.title.clone(),
                    kind: format!("{:?}", q.kind),
                    state: q.state.name().to_string(),
                    done,
                    total,
                    objectives: q
                        .objectives
                        .iter()
                        .map(|o| {
                            let at = o.location.and_then(|id| level.poi(id)).map(|p| p.position);
                            ObjectiveInfo {
                                id: o.id.to_string(),
                                description: o.description.clone(),
                                optional: o.optional,
                                completed: o.completed,
                                x: at.map(|p| p.x),
                                y: at.map(|p| p.y),
                            }
                        })
                        .collect(),
                }
            })
            .collect();
        to_json(&info)
    }

    /// Apply a lifecycle transition, e.g. `"active"`.
    pub fn transition(&mut self, quest_id: &str, state: &str) -> Result<(), JsError> {
        let id = QuestId::parse(quest_id).ok_or_else(|| JsError::new("Invalid quest id"))?;
        let state = parse_state(state).ok_or_else(|| JsError::new(&format!("Unknown state: {state}")))?;
        self.generator
            .quest_generator_mut()
            .transition(id, state)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn complete_objective(&mut self, quest_id: &str, objective_id: &str) -> bool {
        match (QuestId::parse(quest_id), ObjectiveId::parse(objective_id)) {
            (Some(q), Some(o)) => self.generator.quest_generator_mut().complete_objective(q, o),
            _ => false,
        }
    }

    pub fn snapshot(&self) -> Result<String, JsError> {
        to_json(&self.generator.snapshot())
    }

    pub fn report(&self) -> Result<String, JsError> {
        to_json(&self.generator.validation_report())
    }
}

/// Generate a whole session in one call and return its snapshot as JSON.
#[wasm_bindgen]
pub fn generate_session(
    seed: u64,
    width: usize,
    height: usize,
    title: &str,
    difficulty: i32,
) -> Result<String, JsError> {
    let mut demo = SessionDemo::new(seed, width, height)?;
    demo.generate(title, "", difficulty)?;
    demo.snapshot()
}

/// Validate a snapshot produced by `generate_session` (or edited by hand) and
/// return the report as JSON.
#[wasm_bindgen]
pub fn validate_session(snapshot_json: &str) -> Result<String, JsError> {
    let snapshot: SessionSnapshot = serde_json::from_str(snapshot_json)
        .map_err(|e| JsError::new(&format!("Invalid snapshot JSON: {e}")))?;
    to_json(&snapshot.validation_report())
}
