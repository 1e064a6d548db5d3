#[cfg(test)]
#[path = "edit_session_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;

use super::strip_code_fences;
use super::FeedStore;
use super::RateLimitedInvoker;
use super::RetryingGenerationClient;
use crate::domain::models::ClassifiedError;
use crate::domain::models::EditOutcome;
use crate::domain::models::EditSession;
use crate::domain::models::GenerationError;
use crate::domain::models::GenerationRequest;
use crate::domain::models::ModelName;
use crate::domain::models::Prompt;

const EDIT_MODEL: ModelName = ModelName::Flash;

const EDIT_INSTRUCTION: &str = "You are an elite frontend developer AI assistant. Your task is to modify a self-contained HTML file based on user instructions. The user will provide the current code and a command. You must apply the change and return only the complete, updated, raw HTML code. Do not add any explanations or markdown formatting around the code.";

fn edit_prompt(code: &str, instruction: &str) -> String {
    return format!("I need to modify the following HTML code.\n\nCURRENT CODE:\n```html\n{code}\n```\n\nMODIFICATION INSTRUCTION:\n{instruction}\n\nReturn the full HTML file with the modification.");
}

/// Holds the single live edit session. Opening a session replaces whatever
/// session was open before.
#[derive(Clone)]
pub struct EditSessionService {
    feed: FeedStore,
    invoker: RateLimitedInvoker,
    client: Arc<RetryingGenerationClient>,
    session: Arc<Mutex<Option<EditSession>>>,
}

impl EditSessionService {
    pub fn new(
        feed: FeedStore,
        invoker: RateLimitedInvoker,
        client: Arc<RetryingGenerationClient>,
    ) -> EditSessionService {
        return EditSessionService {
            feed,
            invoker,
            client,
            session: Arc::new(Mutex::new(None)),
        };
    }

    /// Copies the output's content into a new session. Returns `None`, and
    /// keeps the current session, when the output does not exist.
    pub async fn start_editing(&self, round_id: &str, output_id: &str) -> Result<Option<EditSession>> {
        let output = match self.feed.output(round_id, output_id).await? {
            Some(output) => output,
            None => return Ok(None),
        };

        let session = EditSession::new(
            round_id,
            output_id,
            output.output_data.as_deref().unwrap_or_default(),
        );
        *self.session.lock().await = Some(session.clone());

        return Ok(Some(session));
    }

    /// Returns false when no session is open.
    pub async fn update_code(&self, code: &str) -> bool {
        if let Some(session) = self.session.lock().await.as_mut() {
            session.code = code.to_string();
            return true;
        }

        return false;
    }

    /// Asks the edit model to apply `instruction` to the working copy. The
    /// working copy is only replaced on success, and only if the session that
    /// asked is still the open one.
    pub async fn apply_instruction(&self, instruction: &str, temperature: f32) -> EditOutcome {
        let (session_id, code) = {
            let mut guard = self.session.lock().await;
            let session = match guard.as_mut() {
                Some(session) => session,
                None => return EditOutcome::Skipped,
            };
            if session.code.is_empty() || instruction.trim().is_empty() {
                return EditOutcome::Skipped;
            }

            session.is_editing_busy = true;
            (session.id.clone(), session.code.clone())
        };

        let request = GenerationRequest::new(
            &EDIT_MODEL.descriptor(),
            EDIT_INSTRUCTION,
            Prompt::Text(edit_prompt(&code, instruction)),
            temperature,
        );
        let client = self.client.clone();
        let res = self
            .invoker
            .schedule(move || return async move { return client.generate(request).await })
            .await
            .unwrap_or_else(|err| {
                return Err(ClassifiedError::new(
                    &GenerationError::Unknown(err.to_string()),
                    0,
                ));
            });

        let mut guard = self.session.lock().await;
        let session = match guard.as_mut() {
            Some(session) if session.id == session_id => session,
            _ => {
                tracing::debug!(
                    session_id = session_id.as_str(),
                    "Edit session closed before the instruction finished"
                );
                return EditOutcome::Superseded;
            }
        };
        session.is_editing_busy = false;

        match res {
            Ok(generation) => {
                session.code = strip_code_fences(&generation.text);
                return EditOutcome::Applied;
            }
            Err(err) => {
                tracing::warn!(
                    session_id = session_id.as_str(),
                    output_id = session.output_id.as_str(),
                    kind = %err.kind(),
                    error = %err,
                    "AI edit failed, keeping the working copy"
                );
                return EditOutcome::Unchanged(err);
            }
        }
    }

    /// Writes the working copy back into the feed and closes the session.
    /// Returns whether anything was written; the output may be gone by now.
    pub async fn save_and_close(&self) -> Result<bool> {
        let session = match self.session.lock().await.take() {
            Some(session) => session,
            None => return Ok(false),
        };

        return self
            .feed
            .set_output_data(&session.round_id, &session.output_id, &session.code)
            .await;
    }

    /// Closes the session without writing anything. Returns whether a session
    /// was open.
    pub async fn discard_and_close(&self) -> bool {
        return self.session.lock().await.take().is_some();
    }
}
