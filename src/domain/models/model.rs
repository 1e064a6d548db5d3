use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModelDescriptor {
    pub name: &'static str,
    pub version: &'static str,
    /// Identifier the backend knows the model by.
    pub backend_model_id: &'static str,
    pub thinking_capable: bool,
    pub thinking: bool,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumVariantNames,
    strum::Display,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ModelName {
    FlashThinking,
    Flash,
}

impl ModelName {
    pub fn parse(text: &str) -> Option<ModelName> {
        return ModelName::iter().find(|e| return e.to_string() == text.trim());
    }

    /// Parses a comma separated list, such as `flash,flash-thinking`. Unknown
    /// names are returned as the error.
    pub fn parse_list(text: &str) -> Result<Vec<ModelName>, String> {
        let mut models = vec![];
        for name in text.split(',') {
            if name.trim().is_empty() {
                continue;
            }

            match ModelName::parse(name) {
                Some(model) => {
                    if !models.contains(&model) {
                        models.push(model);
                    }
                }
                None => return Err(name.trim().to_string()),
            }
        }

        return Ok(models);
    }

    pub fn descriptor(&self) -> ModelDescriptor {
        match self {
            ModelName::FlashThinking => {
                return ModelDescriptor {
                    name: "Flash",
                    version: "2.5",
                    backend_model_id: "gemini-2.5-flash",
                    thinking_capable: true,
                    thinking: true,
                };
            }
            ModelName::Flash => {
                return ModelDescriptor {
                    name: "Flash (thinking off)",
                    version: "2.5",
                    backend_model_id: "gemini-2.5-flash",
                    thinking_capable: true,
                    thinking: false,
                };
            }
        }
    }
}
