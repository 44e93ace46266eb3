use crate::core::persona::Persona;
use crate::core::similarity;
use crate::db::store::{PostEntry, PostStore, INTRODUCTION_TOPIC};
use crate::error::Error;
use anyhow::Result;
use chrono::Utc;
use lazy_static::lazy_static;
use log::{info, warn};
use rig::{
    agent::Agent,
    completion::Chat,
    providers::anthropic::{completion::CompletionModel as AnthropicCompletionModel, ClientBuilder},
};
use std::env;

pub const MAX_POST_LENGTH: usize = 280;
const MAX_ATTEMPTS: usize = 3;

lazy_static! {
    /// Candidates scoring at or above this against any stored post are
    /// rejected as near-duplicates.
    pub static ref SIMILARITY_THRESHOLD: f64 = {
        env::var("SIMILARITY_THRESHOLD")
            .ok()
            .and_then(|val| val.parse::<f64>().ok())
            .unwrap_or(0.9)
    };
}

/// Curated game references per topic, spliced into regular-mode prompts
/// so the persona name-drops real titles.
pub const GAME_REFERENCES: &[(&str, &[&str])] = &[
    ("indie games", &["Stardew Valley", "Hollow Knight", "Undertale", "Hades", "Celeste"]),
    ("game development", &["Unity", "Unreal Engine", "Godot"]),
    ("gaming culture", &["Minecraft", "Fortnite", "Among Us", "The Legend of Zelda", "Dark Souls"]),
    ("open world", &["The Witcher 3", "Red Dead Redemption 2", "Breath of the Wild", "Skyrim", "Elden Ring"]),
    ("sandbox", &["Minecraft", "Terraria", "No Man's Sky", "Space Engineers", "Garry's Mod"]),
    ("action adventure", &["God of War", "Horizon Zero Dawn", "Spider-Man", "Tomb Raider", "Uncharted", "God of War: Ragnarok"]),
    ("narrative games", &["Life is Strange", "The Walking Dead", "Detroit: Become Human", "Firewatch", "What Remains of Edith Finch"]),
    ("survival", &["Valheim", "The Forest", "Subnautica", "Don't Starve", "Rust"]),
    ("roguelike", &["Hades", "Dead Cells", "Enter the Gungeon", "Risk of Rain 2", "Slay the Spire"]),
    ("puzzle platformer", &["Portal", "Braid", "Inside", "Limbo", "Fez"]),
    ("simulation", &["Rimworld", "Cities: Skylines", "Planet Coaster", "Two Point Hospital", "Factorio"]),
    ("retro", &["Shovel Knight", "Hyper Light Drifter", "CrossCode", "Axiom Verge", "Octopath Traveler"]),
    ("farming sim", &["Stardew Valley", "My Time at Portia", "Story of Seasons", "Farm Together", "Sun Haven"]),
    ("time loop", &["Outer Wilds", "Deathloop", "12 Minutes", "Loop Hero", "Minit"]),
    ("social deduction", &["Among Us", "Project Winter", "Town of Salem", "Secret Neighbor", "Goose Goose Duck"]),
    ("soulslike", &["Dark Souls", "Bloodborne", "Nioh", "Mortal Shell", "Salt and Sanctuary"]),
    ("post apocalyptic", &["Fallout", "Metro Exodus", "The Last of Us", "Days Gone", "Mad Max"]),
    ("cooking", &["Overcooked", "Cooking Simulator", "Chef Life", "Cooking Mama", "Battle Chef Brigade"]),
    ("walking sim", &["Gone Home", "Dear Esther", "The Stanley Parable", "Everybody's Gone to the Rapture", "The Vanishing of Ethan Carter"]),
    ("cyberpunk", &["Cyberpunk 2077", "Ghostrunner", "The Ascent", "Cloudpunk", "Observer"]),
    ("space sandbox", &["Kerbal Space Program", "Elite Dangerous", "Star Citizen", "Astroneer", "Space Engineers"]),
    ("visual novel", &["Doki Doki Literature Club", "VA-11 Hall-A", "Phoenix Wright", "Steins;Gate", "Zero Escape"]),
    ("party games", &["Jackbox Party Pack", "Fall Guys", "Ultimate Chicken Horse", "Moving Out", "Overcooked"]),
    ("episodic", &["Life is Strange", "The Wolf Among Us", "Tales from the Borderlands", "Kentucky Route Zero", "Batman: The Telltale Series"]),
    ("physics sandbox", &["Totally Accurate Battle Simulator", "Human: Fall Flat", "Gang Beasts", "Goat Simulator", "BeamNG.drive"]),
    ("point and click", &["Monkey Island", "Grim Fandango", "Day of the Tentacle", "Sam & Max", "Thimbleweed Park"]),
];

pub fn topics() -> Vec<&'static str> {
    GAME_REFERENCES.iter().map(|(topic, _)| *topic).collect()
}

fn games_for(topic: Option<&str>) -> &'static [&'static str] {
    topic
        .and_then(|topic| {
            GAME_REFERENCES
                .iter()
                .find(|(name, _)| *name == topic)
                .map(|(_, games)| *games)
        })
        .unwrap_or(&[])
}

/// Anything able to turn a prompt into one text candidate.
pub trait TextModel {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Production model: the rig Anthropic agent.
pub struct RigModel {
    agent: Agent<AnthropicCompletionModel>,
}

impl RigModel {
    pub fn new(anthropic_api_key: &str) -> Self {
        let anthropic = ClientBuilder::new(anthropic_api_key).build();
        Self {
            agent: anthropic
                .agent("claude-3-5-sonnet-20241022")
                .max_tokens(1024)
                .temperature(1.0)
                .build(),
        }
    }
}

impl TextModel for RigModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.agent
            .chat(prompt, vec![])
            .await
            .map_err(anyhow::Error::new)
    }
}

pub struct Generator<M> {
    model: M,
    persona: Persona,
    store: PostStore,
}

impl<M: TextModel> Generator<M> {
    pub fn new(model: M, persona: Persona, store: PostStore) -> Self {
        Self {
            model,
            persona,
            store,
        }
    }

    /// Generate and persist one post. The very first accepted post is an
    /// introduction; every later call generates in regular mode, whatever
    /// the topic/phase arguments say.
    pub async fn generate(
        &mut self,
        topic: Option<&str>,
        phase: Option<&str>,
    ) -> Result<String, Error> {
        if !self.store.has_introduction() {
            return self.generate_introduction().await;
        }
        self.generate_regular(topic, phase).await
    }

    async fn generate_introduction(&mut self) -> Result<String, Error> {
        info!("[GENERATOR] Generating introduction post...");
        let prompt = self.introduction_prompt();
        let text = self
            .model
            .complete(&prompt)
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;
        let text = truncate(text.trim(), MAX_POST_LENGTH);

        self.store.append(PostEntry {
            text: text.clone(),
            timestamp: Utc::now(),
            topic: Some(INTRODUCTION_TOPIC.to_string()),
            phase: None,
        })?;
        info!("[GENERATOR] Introduction post generated");
        Ok(text)
    }

    async fn generate_regular(
        &mut self,
        topic: Option<&str>,
        phase: Option<&str>,
    ) -> Result<String, Error> {
        info!(
            "[GENERATOR] Generating post for topic: {:?}, phase: {:?}",
            topic, phase
        );
        let base_prompt = self.post_prompt(topic, phase);
        let mut rejected: Vec<String> = Vec::new();

        for attempt in 1..=MAX_ATTEMPTS {
            info!("[GENERATOR] Attempt {} of {}", attempt, MAX_ATTEMPTS);

            // Rejected drafts go back into the prompt as negative examples
            // so a retry is not a verbatim resubmission.
            let prompt = if rejected.is_empty() {
                base_prompt.clone()
            } else {
                format!(
                    "{base_prompt}\nThese earlier drafts were rejected for reading too much like your past posts. Take a noticeably different angle from all of them:\n{}\n",
                    rejected.join("\n")
                )
            };

            let candidate = self
                .model
                .complete(&prompt)
                .await
                .map_err(|e| Error::Generation(e.to_string()))?;
            let candidate = truncate(candidate.trim(), MAX_POST_LENGTH);

            let score = similarity::max_similarity(&candidate, &self.store.texts());
            if score < *SIMILARITY_THRESHOLD {
                self.store.append(PostEntry {
                    text: candidate.clone(),
                    timestamp: Utc::now(),
                    topic: topic.map(str::to_string),
                    phase: phase.map(str::to_string),
                })?;
                info!("[GENERATOR] Generated post:\n{}", candidate);
                return Ok(candidate);
            }

            warn!(
                "[GENERATOR] Candidate scored {:.3} against existing posts, retrying...",
                score
            );
            rejected.push(candidate);
        }

        Err(Error::Exhausted(MAX_ATTEMPTS))
    }

    fn introduction_prompt(&self) -> String {
        format!(
            "Write a friendly introduction post as {name}. This is the first post ever, so introduce yourself based on this description: {description}\n\
             Make it warm, approachable, and excited to join the community. Keep it under {max} characters.\n\
             Write in first person and make it feel genuine and personal.",
            name = self.persona.name,
            description = self.persona.description,
            max = MAX_POST_LENGTH
        )
    }

    fn post_prompt(&self, topic: Option<&str>, phase: Option<&str>) -> String {
        let games = games_for(topic);
        let examples = self.persona.phase_examples(phase);

        let mut prompt = format!(
            "You are {name}, {description}.\n\
             Write a casual, personal post as if you're sharing your genuine thoughts and experiences.\n\
             Make it sound natural and conversational, like a real person talking to their friends.\n\
             Avoid sounding promotional or bot-like. Include real emotions, reactions, and relatable experiences.\n\
             Keep it under {max} characters.\n\
             Important: Write in first person, use natural language, and maybe even include some self-deprecating humor or personal anecdotes.\n",
            name = self.persona.name,
            description = self.persona.description,
            max = MAX_POST_LENGTH
        );

        if !games.is_empty() {
            prompt.push_str(&format!(
                "If mentioning games, reference these specific ones: {}.\n",
                games.join(", ")
            ));
        }

        if !examples.is_empty() {
            prompt.push_str("Here are some example posts for tone (but be original):\n");
            prompt.push_str(&examples.join("\n"));
            prompt.push('\n');
        }

        prompt
    }
}

/// Hard character cut; not word-boundary aware.
pub fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
