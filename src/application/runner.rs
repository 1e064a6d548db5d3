#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;

use std::path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use tokio::fs;
use tokio::sync::mpsc;
use yansi::Paint;

use super::report;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendName;
use crate::domain::models::EditOutcome;
use crate::domain::models::Event;
use crate::domain::models::PlaygroundSettings;
use crate::domain::models::Round;
use crate::domain::models::Submission;
use crate::domain::models::ValidationError;
use crate::domain::services::EditSessionService;
use crate::domain::services::FeedStore;
use crate::domain::services::RateLimitedInvoker;
use crate::domain::services::RetryPolicy;
use crate::domain::services::RetryingGenerationClient;
use crate::domain::services::RoundOrchestrator;
use crate::domain::services::SourceAcquisition;
use crate::infrastructure::backends::BackendManager;
use crate::infrastructure::fetchers::figma::FigmaFrameExporter;
use crate::infrastructure::fetchers::proxy::ProxyPageFetcher;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    pub prompt: String,
    pub clone_url: Option<String>,
    /// Instruction applied to every successful output once the round settles.
    pub refine: Option<String>,
    pub json: bool,
}

/// Wires the generation pipeline together for a single process.
pub struct Playground {
    orchestrator: RoundOrchestrator,
    edits: EditSessionService,
    invoker: RateLimitedInvoker,
    events: mpsc::UnboundedReceiver<Event>,
    quiet: bool,
}

impl Playground {
    pub fn new(
        backend: BackendBox,
        sources: SourceAcquisition,
        policy: RetryPolicy,
        concurrency: usize,
    ) -> Playground {
        let (event_tx, events) = mpsc::unbounded_channel::<Event>();
        let feed = FeedStore::start(Some(event_tx));
        let invoker = RateLimitedInvoker::new(concurrency);
        tracing::debug!(
            concurrency = invoker.limit(),
            max_attempts = policy.max_attempts,
            "playground"
        );
        let client = Arc::new(RetryingGenerationClient::new(backend, policy));

        return Playground {
            orchestrator: RoundOrchestrator::new(
                feed.clone(),
                invoker.clone(),
                client.clone(),
                sources,
            ),
            edits: EditSessionService::new(feed, invoker.clone(), client),
            invoker,
            events,
            quiet: false,
        };
    }

    fn feed(&self) -> &FeedStore {
        return self.orchestrator.feed();
    }

    fn print_event(&self, round: &Round, event: Event) {
        if self.quiet {
            return;
        }

        if let Event::OutputSettled(round_id, output) = event {
            if round_id != round.id {
                return;
            }
            let summary = report::settlement(round, &output);
            if output.got_error {
                println!("{} {summary}", Paint::red("✗"));
            } else {
                println!("{} {summary}", Paint::green("✓"));
            }
        }
    }

    /// Submits one round, reports outputs as they settle and returns the
    /// settled round. Returns `None` when the round had nothing to run.
    pub async fn generate(
        &mut self,
        options: &GenerateOptions,
        settings: &PlaygroundSettings,
    ) -> Result<Option<Round>> {
        self.quiet = options.json;

        let submission = match &options.clone_url {
            Some(clone_url) => Submission::with_clone_url(&options.prompt, clone_url),
            None => Submission::new(&options.prompt),
        };

        let dispatched = match self.orchestrator.submit(&submission, settings).await? {
            Some(dispatched) => dispatched,
            None => return Ok(None),
        };

        let round = match self.feed().round(&dispatched.round_id).await? {
            Some(round) => round,
            None => bail!(format!("Round {} was removed before it ran", dispatched.round_id)),
        };
        if !self.quiet {
            println!(
                "Generating {} output(s) for round {}",
                round.outputs.len(),
                round.id
            );
        }

        let mut settled = dispatched.settled;
        loop {
            tokio::select! {
                Some(event) = self.events.recv() => self.print_event(&round, event),
                res = &mut settled => {
                    res?;
                    break;
                }
            }
        }
        while let Ok(event) = self.events.try_recv() {
            self.print_event(&round, event);
        }

        if let Some(instruction) = &options.refine {
            self.refine(&round, instruction, settings.temperature).await?;
        }

        let settled = self.feed().round(&round.id).await?;
        if let Some(settled) = &settled {
            if !settled.is_settled() {
                tracing::warn!(
                    round_id = %settled.id,
                    in_flight = self.invoker.in_flight(),
                    "round still has busy outputs"
                );
            }
        }

        return Ok(settled);
    }

    async fn refine(&self, round: &Round, instruction: &str, temperature: f32) -> Result<()> {
        let settled = match self.feed().round(&round.id).await? {
            Some(settled) => settled,
            None => return Ok(()),
        };

        for output in settled.outputs.iter().filter(|e| return !e.got_error) {
            let title = round.output_mode.title(report::position(round, &output.id));
            if self.edits.start_editing(&round.id, &output.id).await?.is_none() {
                continue;
            }

            match self.edits.apply_instruction(instruction, temperature).await {
                EditOutcome::Applied => {
                    self.edits.save_and_close().await?;
                    if !self.quiet {
                        println!("{} Refined {title}", Paint::green("✓"));
                    }
                }
                EditOutcome::Unchanged(err) => {
                    self.edits.discard_and_close().await;
                    if !self.quiet {
                        println!(
                            "{} Could not refine {title}: {}",
                            Paint::yellow("!"),
                            err.details.title
                        );
                    }
                }
                EditOutcome::Skipped | EditOutcome::Superseded => {
                    self.edits.discard_and_close().await;
                }
            }
        }

        return Ok(());
    }
}

/// Writes every successful output of the round into `dir`.
pub async fn write_outputs(round: &Round, dir: &path::Path) -> Result<Vec<path::PathBuf>> {
    if !dir.exists() {
        fs::create_dir_all(dir).await?;
    }

    let mut written = vec![];
    for (idx, output) in round.outputs.iter().enumerate() {
        if output.got_error {
            continue;
        }
        if let Some(data) = &output.output_data {
            let file_path = dir.join(report::file_name(round, idx + 1));
            fs::write(&file_path, data).await?;
            written.push(file_path);
        }
    }

    return Ok(written);
}

fn retry_policy() -> Result<RetryPolicy> {
    return Ok(RetryPolicy {
        max_attempts: Config::get_number(ConfigKey::MaxAttempts)?,
        attempt_timeout: Duration::from_millis(Config::get_number(ConfigKey::AttemptTimeout)?),
        base_delay: Duration::from_millis(Config::get_number(ConfigKey::RetryBaseDelay)?),
        ..RetryPolicy::default()
    });
}

/// Runs a generation from loaded config. Returns false when nothing was
/// generated successfully.
pub async fn run(options: GenerateOptions) -> Result<bool> {
    let settings = Config::playground_settings()?;
    let backend_name = match BackendName::parse(Config::get(ConfigKey::Backend)) {
        Some(backend_name) => backend_name,
        None => bail!(format!("Unknown backend {}", Config::get(ConfigKey::Backend))),
    };

    let backend = BackendManager::get(backend_name)?;
    if let Err(err) = backend.health_check().await {
        eprintln!(
            "{}",
            Paint::yellow(format!(
                "Warning: {backend_name} health check failed, generation will likely fail. {err}"
            ))
        );
    }

    let sources = SourceAcquisition::new(
        Arc::new(ProxyPageFetcher::default()),
        Arc::new(FigmaFrameExporter::default()),
    );
    let mut playground = Playground::new(
        backend,
        sources,
        retry_policy()?,
        Config::get_number(ConfigKey::Concurrency)?,
    );

    let round = match playground.generate(&options, &settings).await {
        Ok(Some(round)) => round,
        Ok(None) => {
            println!("No versus models are enabled, there is nothing to generate.");
            return Ok(false);
        }
        Err(err) => {
            if let Some(validation_err) = err.downcast_ref::<ValidationError>() {
                eprintln!("{}", Paint::red(validation_err.to_string()));
                return Ok(false);
            }
            return Err(err);
        }
    };

    let output_dir = path::PathBuf::from(Config::get(ConfigKey::OutputDir));
    let written = write_outputs(&round, &output_dir).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&round)?);
    } else {
        for file_path in &written {
            println!("Wrote {}", file_path.to_string_lossy());
        }
    }

    return Ok(!written.is_empty());
}
