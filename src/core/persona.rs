use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};

/// A persona definition loaded from `characters/<name>.json`. Read-only
/// after load; it sets the tone of every generated post.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub name: String,
    pub description: String,

    /// Story phase name mapped to example posts written in that phase's tone.
    #[serde(default)]
    pub story_arc: HashMap<String, PhaseArc>,

    /// Flat example list used when no phase is selected.
    #[serde(default)]
    pub example_posts: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseArc {
    #[serde(default)]
    pub examples: Vec<String>,
}

impl Persona {
    pub fn load(persona_name: &str) -> Result<Self> {
        let path = Path::new("characters").join(format!("{}.json", persona_name));
        let contents = fs::read_to_string(&path)?;
        let persona = serde_json::from_str::<Persona>(&contents)?;
        Ok(persona)
    }

    /// Tone examples for a phase. No phase selects the flat example list;
    /// an unknown phase yields no examples.
    pub fn phase_examples(&self, phase: Option<&str>) -> &[String] {
        match phase {
            None => &self.example_posts,
            Some(phase) => self
                .story_arc
                .get(phase)
                .map(|arc| arc.examples.as_slice())
                .unwrap_or(&[]),
        }
    }

    /// Phase names, sorted so callers picking at random stay deterministic
    /// under a seeded rng.
    pub fn phases(&self) -> Vec<&str> {
        let mut phases: Vec<&str> = self.story_arc.keys().map(String::as_str).collect();
        phases.sort_unstable();
        phases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona() -> Persona {
        serde_json::from_str(
            r#"{
                "name": "Riley",
                "description": "a gamer",
                "storyArc": {
                    "phase_2": { "examples": ["phase two example"] }
                },
                "examplePosts": ["flat example"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn phase_examples_fall_back_to_flat_list() {
        let persona = persona();
        assert_eq!(persona.phase_examples(None), ["flat example"]);
        assert_eq!(persona.phase_examples(Some("phase_2")), ["phase two example"]);
        assert!(persona.phase_examples(Some("phase_9")).is_empty());
    }

    #[test]
    fn missing_arc_fields_default_to_empty() {
        let persona: Persona =
            serde_json::from_str(r#"{"name": "Riley", "description": "a gamer"}"#).unwrap();
        assert!(persona.story_arc.is_empty());
        assert!(persona.example_posts.is_empty());
    }
}
