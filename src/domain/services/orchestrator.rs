#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use futures::future;
use tokio::task::JoinHandle;

use super::is_valid_clone_url;
use super::round_prompt;
use super::strip_code_fences;
use super::FeedStore;
use super::RateLimitedInvoker;
use super::RetryingGenerationClient;
use super::SourceAcquisition;
use crate::domain::models::AcquisitionError;
use crate::domain::models::ErrorKind;
use crate::domain::models::Fanout;
use crate::domain::models::GenerationRequest;
use crate::domain::models::ModelDescriptor;
use crate::domain::models::OutputMode;
use crate::domain::models::PlaygroundSettings;
use crate::domain::models::Prompt;
use crate::domain::models::Round;
use crate::domain::models::Settlement;
use crate::domain::models::Submission;
use crate::domain::models::ValidationError;
use crate::domain::models::MAX_BATCH_SIZE;
use crate::domain::models::MIN_BATCH_SIZE;

/// A round that made it into the feed. `settled` finishes once every output
/// of the round has been written back, dropping it does not stop anything.
pub struct Dispatched {
    pub round_id: String,
    pub settled: JoinHandle<()>,
}

/// Checks a submission against the current settings before anything is
/// created.
pub fn validate(
    submission: &Submission,
    settings: &PlaygroundSettings,
) -> Result<(), ValidationError> {
    let mode = settings.output_mode;
    if submission.prompt.trim().is_empty() {
        return Err(ValidationError::EmptyPrompt(mode));
    }

    if mode == OutputMode::Clone {
        let url = submission.clone_url.as_deref().unwrap_or_default().trim();
        if url.is_empty() {
            return Err(ValidationError::MissingCloneUrl);
        }
        if !is_valid_clone_url(url) {
            return Err(ValidationError::InvalidCloneUrl);
        }
    }

    if settings.fanout == Fanout::Batch
        && !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&settings.batch_size)
    {
        return Err(ValidationError::BatchSize {
            size: settings.batch_size,
            max: MAX_BATCH_SIZE,
        });
    }

    if !(0.0..=1.0).contains(&settings.temperature) {
        return Err(ValidationError::Temperature(settings.temperature));
    }

    return Ok(());
}

fn acquisition_message(err: &AcquisitionError, url: &str) -> String {
    if let AcquisitionError::PageFetchFailed(_) = err {
        return format!("Failed to fetch URL: {url}\n\nError: {err}");
    }

    return format!("Failed to process Figma link.\n\nError: {err}");
}

/// Turns a submission into a round of pending outputs and drives each of
/// them to a terminal state.
#[derive(Clone)]
pub struct RoundOrchestrator {
    feed: FeedStore,
    invoker: RateLimitedInvoker,
    client: Arc<RetryingGenerationClient>,
    sources: SourceAcquisition,
}

impl RoundOrchestrator {
    pub fn new(
        feed: FeedStore,
        invoker: RateLimitedInvoker,
        client: Arc<RetryingGenerationClient>,
        sources: SourceAcquisition,
    ) -> RoundOrchestrator {
        return RoundOrchestrator {
            feed,
            invoker,
            client,
            sources,
        };
    }

    pub fn feed(&self) -> &FeedStore {
        return &self.feed;
    }

    /// Validates the submission, publishes its round and starts generation in
    /// the background. Returns `None` when there is nothing to run, such as a
    /// versus round without any enabled model.
    pub async fn submit(
        &self,
        submission: &Submission,
        settings: &PlaygroundSettings,
    ) -> Result<Option<Dispatched>> {
        validate(submission, settings)?;

        let prompt = submission.prompt.trim().to_string();
        let clone_url = submission
            .clone_url
            .as_deref()
            .map(|e| return e.trim().to_string())
            .filter(|e| return !e.is_empty() && settings.output_mode == OutputMode::Clone);
        let round_text = round_prompt(&prompt, clone_url.as_deref());

        let round = match settings.fanout {
            Fanout::Batch => Round::batch(
                round_text,
                settings.output_mode,
                settings.batch_model,
                settings.batch_size,
            ),
            Fanout::Versus => {
                let models = settings.enabled_versus_models();
                if models.is_empty() {
                    tracing::debug!("No versus models enabled, nothing to run");
                    return Ok(None);
                }
                Round::versus(round_text, settings.output_mode, &models)
            }
        };

        let round_id = round.id.clone();
        tracing::debug!(
            round_id = round_id.as_str(),
            mode = %settings.output_mode,
            fanout = %settings.fanout,
            outputs = round.outputs.len(),
            "Submitting round"
        );
        self.feed.prepend(round.clone()).await?;

        let orchestrator = self.clone();
        let temperature = settings.temperature;
        let use_retrieval = settings.use_retrieval;
        let settled = tokio::spawn(async move {
            orchestrator
                .drive(round, prompt, clone_url, temperature, use_retrieval)
                .await;
        });

        return Ok(Some(Dispatched { round_id, settled }));
    }

    async fn drive(
        &self,
        round: Round,
        prompt: String,
        clone_url: Option<String>,
        temperature: f32,
        use_retrieval: bool,
    ) {
        let payload = match self
            .sources
            .resolve(round.output_mode, &prompt, clone_url.as_deref())
            .await
        {
            Ok(payload) => payload,
            Err(err) => {
                let url = clone_url.unwrap_or_default();
                tracing::warn!(
                    round_id = round.id.as_str(),
                    error = %err,
                    "Source acquisition failed, failing round"
                );
                let message = acquisition_message(&err, &url);
                if let Err(err) = self
                    .feed
                    .fail_round(&round.id, &message, &err.kind().details())
                    .await
                {
                    tracing::error!(error = %err, "Failed to write round failure");
                }
                return;
            }
        };

        let settlements = round
            .outputs
            .iter()
            .map(|output| {
                return self.generate_output(
                    &round,
                    &output.id,
                    output.model.descriptor(),
                    payload.clone(),
                    temperature,
                    use_retrieval,
                );
            })
            .collect::<Vec<_>>();

        future::join_all(settlements).await;
    }

    fn generate_output(
        &self,
        round: &Round,
        output_id: &str,
        model: ModelDescriptor,
        payload: Prompt,
        temperature: f32,
        use_retrieval: bool,
    ) -> impl Future<Output = ()> {
        let mut request =
            GenerationRequest::new(&model, &round.system_instruction, payload, temperature);
        request.use_retrieval = use_retrieval;

        let client = self.client.clone();
        let scheduled = self
            .invoker
            .schedule(move || return async move { return client.generate(request).await });

        let feed = self.feed.clone();
        let round_id = round.id.clone();
        let output_id = output_id.to_string();

        return async move {
            let settlement = match scheduled.await {
                Ok(Ok(generation)) => Settlement::Succeeded {
                    text: strip_code_fences(&generation.text),
                    grounding_chunks: generation.grounding_chunks,
                },
                Ok(Err(err)) => Settlement::Failed {
                    message: err.message,
                    details: err.details,
                },
                Err(err) => Settlement::Failed {
                    message: err.to_string(),
                    details: ErrorKind::Unknown.details(),
                },
            };

            match feed.settle(&round_id, &output_id, settlement).await {
                Ok(true) => {
                    tracing::debug!(
                        round_id = round_id.as_str(),
                        output_id = output_id.as_str(),
                        "Output settled"
                    );
                }
                Ok(false) => {
                    tracing::debug!(
                        round_id = round_id.as_str(),
                        output_id = output_id.as_str(),
                        "Output is gone, result dropped"
                    );
                }
                Err(err) => tracing::error!(error = %err, "Failed to write output"),
            }
        };
    }
}
