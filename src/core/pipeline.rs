/// The narrative orchestrator: story → layout → quests for one generation session.
///
/// Composes the three models and cross-checks their references. All the
/// invariant-preserving logic lives in the models themselves.
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::config::{ConfigError, SessionConfig};
use crate::core::level::LevelDesigner;
use crate::core::quest::QuestGenerator;
use crate::core::story::StoryGenerator;
use crate::core::text::{PlaceholderText, TextPurpose, TextRequest, TextSource};
use crate::core::validation::{ContentGenerator, IssueKind, Subject, ValidationReport};
use crate::schema::ids::{ElementId, PoiId, QuestId};
use crate::schema::level::{ConnectionKind, LevelLayout, PoiKind, Position};
use crate::schema::quest::{ObjectiveKind, Quest, QuestKind, QuestState, RewardKind};
use crate::schema::story::{ElementKind, StoryStructure, TimelineEvent};
use crate::schema::value::{Properties, Value};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),
    #[error("RON deserialization error: {0}")]
    RonDeserialize(#[from] ron::error::SpannedError),
}

/// An owned point-in-time copy of a session, safe to keep while generation
/// continues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub story: StoryStructure,
    pub level: LevelLayout,
    pub quests: Vec<Quest>,
}

impl SessionSnapshot {
    pub fn to_ron(&self) -> Result<String, SessionError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    pub fn from_ron(input: &str) -> Result<SessionSnapshot, SessionError> {
        Ok(ron::from_str(input)?)
    }

    pub fn load_from_ron(path: &Path) -> Result<SessionSnapshot, SessionError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    pub fn save_to_ron(&self, path: &Path) -> Result<(), SessionError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Full session report for a snapshot, e.g. one loaded from disk.
    pub fn validation_report(&self) -> ValidationReport {
        session_report(
            &StoryGenerator::from_story(self.story.clone()),
            &LevelDesigner::from_layout(self.level.clone()),
            &QuestGenerator::from_quests(self.quests.clone()),
        )
    }
}

/// One generation session: a story, a level and the quests tying them together.
///
/// Not meant to be shared between threads; callers serialize access.
pub struct NarrativeGenerator {
    story: StoryGenerator,
    level: LevelDesigner,
    quests: QuestGenerator,
    config: SessionConfig,
    text: Box<dyn TextSource>,
    rng: StdRng,
}

/// Builder for constructing a `NarrativeGenerator`.
pub struct NarrativeGeneratorBuilder {
    config_path: Option<String>,
    seed: Option<u64>,
    dimensions: Option<(usize, usize)>,
    /// Directly provided config (for testing without files).
    config: Option<SessionConfig>,
    text: Option<Box<dyn TextSource>>,
}

impl NarrativeGenerator {
    pub fn builder() -> NarrativeGeneratorBuilder {
        NarrativeGeneratorBuilder {
            config_path: None,
            seed: None,
            dimensions: None,
            config: None,
            text: None,
        }
    }

    /// Build a complete story-driven level and return the main quest.
    ///
    /// Every call discards the previous story, level and quests first. Any
    /// failed delegate lookup ends generation with `None`; whatever was built
    /// up to that point stays in the session.
    pub fn generate_story_driven_level(
        &mut self,
        title: &str,
        synopsis: &str,
        difficulty: i32,
    ) -> Option<QuestId> {
        info!(title, difficulty, seed = self.config.seed, "generating story-driven level");
        self.story = StoryGenerator::new();
        self.level = LevelDesigner::new(self.config.width, self.config.height, "", "");
        self.quests = QuestGenerator::new();
        self.story.set_basics(title, synopsis);

        let protagonist = self.add_element(ElementKind::Character, "protagonist");
        let antagonist = self.add_element(ElementKind::Character, "antagonist");
        let hub = self.add_element(ElementKind::Location, "main_hub");

        self.build_plot();
        let (hub_poi, lair_poi, shop_poi) = self.build_layout(hub, antagonist);

        let main_title = self.say(TextPurpose::Title, "main_quest");
        let main_description = self.say(TextPurpose::Description, "main_quest");
        let find_antagonist = self.say(TextPurpose::Description, "find_antagonist");
        let visit_shop = self.say(TextPurpose::Description, "visit_shop");

        let main = self
            .quests
            .create_quest(
                main_title,
                main_description,
                QuestKind::Main,
                difficulty,
                vec![protagonist, antagonist],
            )
            .id;
        self.quests.add_objective(
            main,
            find_antagonist,
            ObjectiveKind::Reach,
            antagonist.to_string(),
            1,
            Some(lair_poi),
            false,
        )?;
        self.quests.add_objective(
            main,
            visit_shop,
            ObjectiveKind::Interact,
            shop_poi.to_string(),
            1,
            Some(shop_poi),
            true,
        )?;
        self.quests.add_reward(
            main,
            RewardKind::Experience,
            "experience",
            100 * i64::from(difficulty.max(1)),
        )?;

        let side_difficulty = difficulty.saturating_sub(1).max(1);
        let chain = self
            .quests
            .generate_quest_chain(main, self.config.side_quests, side_difficulty)?;
        for (i, quest_id) in chain.iter().enumerate() {
            let step = i as i64 + 1;
            self.quests.add_objective(
                *quest_id,
                format!("Defend the hub, wave {}", step),
                ObjectiveKind::Defend,
                hub.to_string(),
                step,
                Some(hub_poi),
                false,
            )?;
            self.quests
                .add_reward(*quest_id, RewardKind::Currency, "gold", 25 * step)?;
        }

        if !self.quests.update_state(main, QuestState::Available) {
            return None;
        }
        info!(quest = %main, side_quests = chain.len(), "session generated");
        Some(main)
    }

    fn say(&mut self, purpose: TextPurpose, subject: &str) -> String {
        self.text.text(&TextRequest::new(purpose, subject))
    }

    fn add_element(&mut self, kind: ElementKind, subject: &str) -> ElementId {
        let name = self.say(TextPurpose::Name, subject);
        let description = self.say(TextPurpose::Description, subject);
        let properties = Properties::from([("role".to_string(), Value::from(subject))]);
        self.story
            .add_element(kind, name, description, properties)
            .id
    }

    /// Three chained beats on the main timeline plus a rematch branch.
    fn build_plot(&mut self) {
        let beats = [
            ("inciting_incident", vec![], vec!["hero_departs".to_string()]),
            (
                "confrontation",
                vec!["hero_departs".to_string()],
                vec!["villain_weakened".to_string()],
            ),
            ("resolution", vec!["villain_weakened".to_string()], vec![]),
        ];

        let mut previous = None;
        let mut confrontation = None;
        for (i, (subject, requirements, consequences)) in beats.into_iter().enumerate() {
            let title = self.say(TextPurpose::Title, subject);
            let description = self.say(TextPurpose::Description, subject);
            let plot_point = self
                .story
                .add_plot_point(title, description, requirements, consequences)
                .id;
            let event = self
                .story
                .add_timeline_event(plot_point, i as i64 * 100, previous.into_iter().collect())
                .id;
            if subject == "confrontation" {
                confrontation = Some((plot_point, event));
            }
            previous = Some(event);
        }

        if let Some((plot_point, event)) = confrontation {
            let rematch = TimelineEvent::new(plot_point, 250, vec![event]);
            self.story
                .add_timeline_branch("protagonist_defeated", vec![rematch]);
        }
    }

    /// Rebuild the level wholesale until it validates. The final attempt is
    /// obstacle-free.
    fn build_layout(&mut self, hub: ElementId, antagonist: ElementId) -> (PoiId, PoiId, PoiId) {
        let (width, height) = (self.config.width, self.config.height);
        let (w, h) = (width as i32, height as i32);
        let entry = Position::new(0, h / 2);
        let hub_pos = Position::new(w / 2, h / 2);
        let lair_pos = Position::new(w - 1, h - 1);
        let shop_pos = Position::new(w / 4, h / 4);
        let protected = [entry, hub_pos, lair_pos, shop_pos];

        let hub_name = self
            .story
            .element(hub)
            .map(|e| e.name.clone())
            .unwrap_or_default();
        let lair_name = self.say(TextPurpose::Name, "lair");
        let shop_name = self.say(TextPurpose::Name, "shop");
        let level_name = self.story.story().title.clone();
        let level_description = self.story.story().synopsis.clone();

        let attempts = self.config.layout_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let last = attempt >= attempts;
            let density = if last { 0.0 } else { self.config.obstacle_density };

            let mut designer =
                LevelDesigner::new(width, height, level_name.clone(), level_description.clone());
            designer.set_transition(
                entry.x,
                entry.y,
                Properties::from([("leads_to".to_string(), Value::from("world_map"))]),
            );
            designer.set_entry(entry);
            designer.scatter_obstacles(&mut self.rng, density, &protected);

            let hub_poi = designer
                .add_point_of_interest(hub_name.clone(), PoiKind::Story, hub_pos, vec![hub], vec![])
                .id;
            let lair_poi = designer
                .add_point_of_interest(
                    lair_name.clone(),
                    PoiKind::Challenge,
                    lair_pos,
                    vec![antagonist],
                    vec![],
                )
                .id;
            let shop_poi = designer
                .add_point_of_interest(shop_name.clone(), PoiKind::Shop, shop_pos, vec![], vec![])
                .id;
            designer.add_connection(hub_poi, shop_poi, ConnectionKind::Path, Properties::new());
            designer.add_connection(
                lair_poi,
                hub_poi,
                ConnectionKind::Portal,
                Properties::from([("label".to_string(), Value::from("exit"))]),
            );

            if designer.validate_layout() || last {
                if !last {
                    info!(attempt, "layout accepted");
                } else {
                    warn!(attempt, "keeping final layout attempt");
                }
                self.level = designer;
                return (hub_poi, lair_poi, shop_poi);
            }
        }
    }

    pub fn story(&self) -> &StoryStructure {
        self.story.story()
    }

    pub fn level(&self) -> &LevelLayout {
        self.level.layout()
    }

    /// Quests currently available to the player.
    pub fn quests(&self) -> Vec<&Quest> {
        self.quests.available_quests()
    }

    pub fn all_quests(&self) -> &[Quest] {
        self.quests.quests()
    }

    pub fn story_generator(&self) -> &StoryGenerator {
        &self.story
    }

    pub fn story_generator_mut(&mut self) -> &mut StoryGenerator {
        &mut self.story
    }

    pub fn level_designer(&self) -> &LevelDesigner {
        &self.level
    }

    pub fn level_designer_mut(&mut self) -> &mut LevelDesigner {
        &mut self.level
    }

    pub fn quest_generator(&self) -> &QuestGenerator {
        &self.quests
    }

    pub fn quest_generator_mut(&mut self) -> &mut QuestGenerator {
        &mut self.quests
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            story: self.story.emit(),
            level: self.level.emit(),
            quests: self.quests.emit(),
        }
    }

    /// Every model's report plus the cross-model reference checks.
    pub fn validation_report(&self) -> ValidationReport {
        session_report(&self.story, &self.level, &self.quests)
    }

    pub fn validate(&self) -> bool {
        self.validation_report().is_valid()
    }

    /// Alternative layouts for the current level, as many as configured.
    pub fn layout_variations(&mut self) -> Vec<LevelLayout> {
        self.level.generate_variations(
            self.config.variations,
            &mut self.rng,
            self.config.obstacle_density,
            self.config.layout_attempts,
        )
    }
}

impl ContentGenerator for NarrativeGenerator {
    type Artifact = SessionSnapshot;

    fn validate_report(&self) -> ValidationReport {
        self.validation_report()
    }

    fn emit(&self) -> SessionSnapshot {
        self.snapshot()
    }
}

impl NarrativeGeneratorBuilder {
    /// Load the session config from a RON file.
    pub fn config_path(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    /// Provide the config directly (for testing without files).
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn dimensions(mut self, width: usize, height: usize) -> Self {
        self.dimensions = Some((width, height));
        self
    }

    pub fn with_text_source(mut self, source: Box<dyn TextSource>) -> Self {
        self.text = Some(source);
        self
    }

    pub fn build(self) -> Result<NarrativeGenerator, SessionError> {
        let mut config = match (self.config, self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => SessionConfig::load_from_ron(Path::new(&path))?,
            (None, None) => SessionConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some((width, height)) = self.dimensions {
            config.width = width;
            config.height = height;
        }
        config.validate()?;

        Ok(NarrativeGenerator {
            story: StoryGenerator::new(),
            level: LevelDesigner::new(config.width, config.height, "", ""),
            quests: QuestGenerator::new(),
            rng: StdRng::seed_from_u64(config.seed),
            text: self.text.unwrap_or_else(|| Box::new(PlaceholderText)),
            config,
        })
    }
}

/// Combine the per-model reports with checks that span models.
pub fn session_report(
    story: &StoryGenerator,
    level: &LevelDesigner,
    quests: &QuestGenerator,
) -> ValidationReport {
    let mut report = story.validation_report();
    report.merge(level.validation_report());
    report.merge(quests.validation_report());

    let elements: FxHashSet<ElementId> = story.story().elements.iter().map(|e| e.id).collect();
    let pois: FxHashSet<PoiId> = level
        .layout()
        .points_of_interest
        .iter()
        .map(|p| p.id)
        .collect();

    for poi in &level.layout().points_of_interest {
        for element in &poi.story_elements {
            if !elements.contains(element) {
                report.error(Subject::Poi(poi.id), IssueKind::UnknownElement(*element));
            }
        }
    }

    for quest in quests.quests() {
        for element in &quest.linked_story_elements {
            if !elements.contains(element) {
                report.error(Subject::Quest(quest.id), IssueKind::UnknownElement(*element));
            }
        }
        for objective in &quest.objectives {
            if let Some(location) = objective.location {
                if !pois.contains(&location) {
                    report.error(Subject::Objective(objective.id), IssueKind::UnknownPoi(location));
                }
            }
        }
    }

    report
}
