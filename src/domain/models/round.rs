#[cfg(test)]
#[path = "round_test.rs"]
mod tests;

use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

use super::ErrorDetails;
use super::ModelName;
use super::OutputMode;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    pub uri: String,
    pub title: String,
}

/// Terminal result written back into an output once its generation settles.
#[derive(Clone, Debug, PartialEq)]
pub enum Settlement {
    Succeeded {
        text: String,
        grounding_chunks: Option<Vec<GroundingChunk>>,
    },
    Failed {
        message: String,
        details: ErrorDetails,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub id: String,
    pub model: ModelName,
    pub output_mode: OutputMode,
    pub is_batch: bool,
    pub start_time: DateTime<Utc>,
    pub total_time: Option<Duration>,
    pub is_busy: bool,
    pub output_data: Option<String>,
    pub got_error: bool,
    pub error_details: Option<ErrorDetails>,
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
}

impl Output {
    pub fn pending(model: ModelName, output_mode: OutputMode, is_batch: bool) -> Output {
        return Output {
            id: Uuid::new_v4().to_string(),
            model,
            output_mode,
            is_batch,
            start_time: Utc::now(),
            total_time: None,
            is_busy: true,
            output_data: None,
            got_error: false,
            error_details: None,
            grounding_chunks: None,
        };
    }

    /// Applies the one terminal transition of an output. Returns false, and
    /// leaves the output untouched, when it has already settled.
    pub fn settle(&mut self, settlement: Settlement) -> bool {
        if !self.is_busy {
            return false;
        }

        match settlement {
            Settlement::Succeeded {
                text,
                grounding_chunks,
            } => {
                self.output_data = Some(text);
                self.grounding_chunks = grounding_chunks;
            }
            Settlement::Failed { message, details } => {
                self.got_error = true;
                self.output_data = Some(message);
                self.error_details = Some(details);
            }
        }

        self.is_busy = false;
        self.total_time = Some(
            (Utc::now() - self.start_time)
                .to_std()
                .unwrap_or_default(),
        );

        return true;
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: String,
    pub prompt: String,
    pub system_instruction: String,
    pub output_mode: OutputMode,
    pub created_at: DateTime<Utc>,
    pub outputs: Vec<Output>,
}

impl Round {
    pub fn new(prompt: String, output_mode: OutputMode, outputs: Vec<Output>) -> Round {
        return Round {
            id: Uuid::new_v4().to_string(),
            prompt,
            system_instruction: output_mode.system_instruction(),
            output_mode,
            created_at: Utc::now(),
            outputs,
        };
    }

    /// A batch round runs the same model `size` times.
    pub fn batch(prompt: String, output_mode: OutputMode, model: ModelName, size: usize) -> Round {
        let outputs = (0..size)
            .map(|_| return Output::pending(model, output_mode, true))
            .collect();

        return Round::new(prompt, output_mode, outputs);
    }

    /// A versus round runs each model once, in the given order.
    pub fn versus(prompt: String, output_mode: OutputMode, models: &[ModelName]) -> Round {
        let outputs = models
            .iter()
            .map(|model| return Output::pending(*model, output_mode, false))
            .collect();

        return Round::new(prompt, output_mode, outputs);
    }

    pub fn output(&self, output_id: &str) -> Option<&Output> {
        return self.outputs.iter().find(|e| return e.id == output_id);
    }

    pub fn output_mut(&mut self, output_id: &str) -> Option<&mut Output> {
        return self.outputs.iter_mut().find(|e| return e.id == output_id);
    }

    pub fn is_settled(&self) -> bool {
        return self.outputs.iter().all(|e| return !e.is_busy);
    }
}
