use std::collections::BTreeMap;

use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

use super::ModelName;
use super::OutputMode;

pub const MIN_BATCH_SIZE: usize = 1;
pub const MAX_BATCH_SIZE: usize = 9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Fanout {
    /// One model, run `batch_size` times.
    Batch,
    /// Every enabled model, run once each.
    Versus,
}

impl Fanout {
    pub fn parse(text: &str) -> Option<Fanout> {
        return Fanout::iter().find(|e| return e.to_string() == text);
    }
}

/// What the user typed for one round.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Submission {
    pub prompt: String,
    pub clone_url: Option<String>,
}

impl Submission {
    pub fn new(prompt: &str) -> Submission {
        return Submission {
            prompt: prompt.to_string(),
            clone_url: None,
        };
    }

    pub fn with_clone_url(prompt: &str, clone_url: &str) -> Submission {
        return Submission {
            prompt: prompt.to_string(),
            clone_url: Some(clone_url.to_string()),
        };
    }
}

/// Playground controls that shape every submitted round. The batch model and
/// the versus selection are independent of each other, switching `fanout`
/// keeps both as they were.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaygroundSettings {
    pub output_mode: OutputMode,
    pub fanout: Fanout,
    pub batch_size: usize,
    pub batch_model: ModelName,
    pub versus_models: BTreeMap<ModelName, bool>,
    pub temperature: f32,
    pub use_retrieval: bool,
}

impl Default for PlaygroundSettings {
    fn default() -> PlaygroundSettings {
        return PlaygroundSettings {
            output_mode: OutputMode::default(),
            fanout: Fanout::Batch,
            batch_size: 3,
            batch_model: ModelName::FlashThinking,
            versus_models: ModelName::iter()
                .map(|model| return (model, true))
                .collect(),
            temperature: 0.9,
            use_retrieval: false,
        };
    }
}

impl PlaygroundSettings {
    pub fn set_versus_model(&mut self, model: ModelName, active: bool) {
        self.versus_models.insert(model, active);
    }

    /// Enables exactly the given models for versus rounds.
    pub fn set_versus_models(&mut self, models: &[ModelName]) {
        for model in ModelName::iter() {
            self.set_versus_model(model, models.contains(&model));
        }
    }

    pub fn enabled_versus_models(&self) -> Vec<ModelName> {
        return self
            .versus_models
            .iter()
            .filter(|(_, active)| return **active)
            .map(|(model, _)| return *model)
            .collect();
    }
}
