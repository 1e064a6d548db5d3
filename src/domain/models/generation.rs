use super::GroundingChunk;
use super::ModelDescriptor;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromptPart {
    Text(String),
    InlineImage { mime_type: String, data: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Prompt {
    Text(String),
    /// Ordered parts, such as an exported frame followed by the instruction.
    Parts(Vec<PromptPart>),
}

impl Prompt {
    pub fn parts(&self) -> Vec<PromptPart> {
        match self {
            Prompt::Text(text) => return vec![PromptPart::Text(text.to_string())],
            Prompt::Parts(parts) => return parts.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub backend_model_id: String,
    pub system_instruction: Option<String>,
    pub prompt: Prompt,
    pub temperature: f32,
    pub thinking_enabled: bool,
    pub thinking_capable: bool,
    pub use_retrieval: bool,
}

impl GenerationRequest {
    pub fn new(
        model: &ModelDescriptor,
        system_instruction: &str,
        prompt: Prompt,
        temperature: f32,
    ) -> GenerationRequest {
        let mut instruction = None;
        if !system_instruction.is_empty() {
            instruction = Some(system_instruction.to_string());
        }

        return GenerationRequest {
            backend_model_id: model.backend_model_id.to_string(),
            system_instruction: instruction,
            prompt,
            temperature,
            thinking_enabled: model.thinking,
            thinking_capable: model.thinking_capable,
            use_retrieval: false,
        };
    }

    /// Thinking capable models default to thinking, so running one without it
    /// has to be asked for. Models without thinking never get the flag.
    pub fn disables_thinking(&self) -> bool {
        return self.thinking_capable && !self.thinking_enabled;
    }
}

/// Raw reply of a backend. `text` is absent when the backend answered without
/// any textual candidate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationResponse {
    pub text: Option<String>,
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
}
