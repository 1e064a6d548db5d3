use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use super::EditSessionService;
use crate::domain::models::EditOutcome;
use crate::domain::models::EditSession;
use crate::domain::models::ErrorKind;
use crate::domain::models::GenerationError;
use crate::domain::models::ModelName;
use crate::domain::models::OutputMode;
use crate::domain::models::Prompt;
use crate::domain::models::Round;
use crate::domain::models::Settlement;
use crate::domain::services::fakes::FakeBackend;
use crate::domain::services::fakes::Recorder;
use crate::domain::services::fakes::Reply;
use crate::domain::services::FeedStore;
use crate::domain::services::RateLimitedInvoker;
use crate::domain::services::RetryPolicy;
use crate::domain::services::RetryingGenerationClient;

impl EditSessionService {
    async fn current(&self) -> Option<EditSession> {
        return self.session.lock().await.clone();
    }
}

struct Harness {
    service: EditSessionService,
    feed: FeedStore,
    recorder: Recorder,
    round: Round,
}

async fn harness(reply: Reply) -> Result<Harness> {
    let (backend, recorder) = FakeBackend::always(reply);
    let policy = RetryPolicy {
        max_attempts: 2,
        attempt_timeout: Duration::from_millis(50),
        base_delay: Duration::from_millis(1),
        max_jitter: Duration::ZERO,
    };
    let feed = FeedStore::start(None);
    let service = EditSessionService::new(
        feed.clone(),
        RateLimitedInvoker::new(2),
        Arc::new(RetryingGenerationClient::new(Box::new(backend), policy)),
    );

    let round = Round::batch("a card".to_string(), OutputMode::Html, ModelName::FlashThinking, 2);
    feed.prepend(round.clone()).await?;
    for output in &round.outputs {
        let settlement = Settlement::Succeeded {
            text: format!("<div>{}</div>", output.id),
            grounding_chunks: None,
        };
        feed.settle(&round.id, &output.id, settlement).await?;
    }

    return Ok(Harness {
        service,
        feed,
        recorder,
        round,
    });
}

#[tokio::test]
async fn it_copies_output_into_a_session() -> Result<()> {
    let harness = harness(Reply::text("unused")).await?;
    let output = &harness.round.outputs[0];

    let session = harness
        .service
        .start_editing(&harness.round.id, &output.id)
        .await?
        .unwrap();

    assert_eq!(session.code, format!("<div>{}</div>", output.id));
    assert!(!session.is_editing_busy);
    assert_eq!(harness.service.current().await, Some(session));

    return Ok(());
}

#[tokio::test]
async fn it_ignores_missing_outputs() -> Result<()> {
    let harness = harness(Reply::text("unused")).await?;

    assert!(harness
        .service
        .start_editing(&harness.round.id, "missing")
        .await?
        .is_none());
    assert!(harness.service.current().await.is_none());
    assert!(!harness.service.update_code("<p></p>").await);

    return Ok(());
}

#[tokio::test]
async fn it_replaces_the_open_session() -> Result<()> {
    let harness = harness(Reply::text("unused")).await?;
    let round_id = &harness.round.id;

    harness
        .service
        .start_editing(round_id, &harness.round.outputs[0].id)
        .await?;
    harness
        .service
        .start_editing(round_id, &harness.round.outputs[1].id)
        .await?;

    let session = harness.service.current().await.unwrap();
    assert_eq!(session.output_id, harness.round.outputs[1].id);

    return Ok(());
}

#[tokio::test]
async fn it_saves_edits_back_into_the_feed() -> Result<()> {
    let harness = harness(Reply::text("unused")).await?;
    let output = &harness.round.outputs[1];

    harness
        .service
        .start_editing(&harness.round.id, &output.id)
        .await?;
    assert!(harness.service.update_code("<main>edited</main>").await);
    assert!(harness.service.save_and_close().await?);
    assert!(harness.service.current().await.is_none());

    let reopened = harness
        .service
        .start_editing(&harness.round.id, &output.id)
        .await?
        .unwrap();
    assert_eq!(reopened.code, "<main>edited</main>");

    let sibling = harness
        .feed
        .output(&harness.round.id, &harness.round.outputs[0].id)
        .await?
        .unwrap();
    assert_eq!(
        sibling.output_data,
        Some(format!("<div>{}</div>", harness.round.outputs[0].id))
    );

    return Ok(());
}

#[tokio::test]
async fn it_discards_edits() -> Result<()> {
    let harness = harness(Reply::text("unused")).await?;
    let output = &harness.round.outputs[0];

    harness
        .service
        .start_editing(&harness.round.id, &output.id)
        .await?;
    harness.service.update_code("<p>throwaway</p>").await;

    assert!(harness.service.discard_and_close().await);
    assert!(!harness.service.discard_and_close().await);

    let stored = harness.feed.output(&harness.round.id, &output.id).await?.unwrap();
    assert_eq!(stored.output_data, Some(format!("<div>{}</div>", output.id)));

    return Ok(());
}

#[tokio::test]
async fn it_tolerates_saving_into_a_removed_round() -> Result<()> {
    let harness = harness(Reply::text("unused")).await?;

    harness
        .service
        .start_editing(&harness.round.id, &harness.round.outputs[0].id)
        .await?;
    harness.feed.remove(&harness.round.id).await?;

    assert!(!harness.service.save_and_close().await?);
    assert!(harness.service.current().await.is_none());
    assert!(!harness.service.save_and_close().await?);

    return Ok(());
}

#[tokio::test]
async fn it_applies_instructions_with_the_edit_model() -> Result<()> {
    let harness = harness(Reply::text("```html\n<div class=\"dark\"></div>\n```")).await?;

    harness
        .service
        .start_editing(&harness.round.id, &harness.round.outputs[0].id)
        .await?;
    let outcome = harness
        .service
        .apply_instruction("make it dark", 0.9)
        .await;

    assert_eq!(outcome, EditOutcome::Applied);
    let session = harness.service.current().await.unwrap();
    assert_eq!(session.code, "<div class=\"dark\"></div>");
    assert!(!session.is_editing_busy);

    let request = &harness.recorder.requests()[0];
    assert!(request.disables_thinking());
    assert!(request
        .system_instruction
        .as_ref()
        .unwrap()
        .starts_with("You are an elite frontend developer AI assistant."));
    match &request.prompt {
        Prompt::Text(text) => {
            assert!(text.contains("MODIFICATION INSTRUCTION:\nmake it dark"));
        }
        other => panic!("Unexpected prompt {other:?}"),
    }

    return Ok(());
}

#[tokio::test]
async fn it_keeps_the_working_copy_when_an_instruction_fails() -> Result<()> {
    let harness = harness(Reply::Fail(GenerationError::Safety("SAFETY".to_string()))).await?;
    let output = &harness.round.outputs[0];

    harness
        .service
        .start_editing(&harness.round.id, &output.id)
        .await?;
    let outcome = harness
        .service
        .apply_instruction("make it dark", 0.9)
        .await;

    match outcome {
        EditOutcome::Unchanged(err) => assert_eq!(err.kind(), ErrorKind::Safety),
        other => panic!("Unexpected outcome {other:?}"),
    }
    let session = harness.service.current().await.unwrap();
    assert_eq!(session.code, format!("<div>{}</div>", output.id));
    assert!(!session.is_editing_busy);

    return Ok(());
}

#[tokio::test]
async fn it_skips_empty_instructions() -> Result<()> {
    let harness = harness(Reply::text("unused")).await?;

    assert_eq!(
        harness.service.apply_instruction("make it dark", 0.9).await,
        EditOutcome::Skipped
    );

    harness
        .service
        .start_editing(&harness.round.id, &harness.round.outputs[0].id)
        .await?;
    assert_eq!(
        harness.service.apply_instruction("  ", 0.9).await,
        EditOutcome::Skipped
    );
    harness.service.update_code("").await;
    assert_eq!(
        harness.service.apply_instruction("make it dark", 0.9).await,
        EditOutcome::Skipped
    );
    assert_eq!(harness.recorder.calls(), 0);

    return Ok(());
}

#[tokio::test]
async fn it_drops_results_for_closed_sessions() -> Result<()> {
    let harness = harness(Reply::Delayed(
        Duration::from_millis(20),
        "<p>late</p>".to_string(),
    ))
    .await?;

    harness
        .service
        .start_editing(&harness.round.id, &harness.round.outputs[0].id)
        .await?;

    let service = harness.service.clone();
    let pending = tokio::spawn(async move {
        return service.apply_instruction("make it dark", 0.9).await;
    });
    tokio::time::sleep(Duration::from_millis(5)).await;
    harness
        .service
        .start_editing(&harness.round.id, &harness.round.outputs[1].id)
        .await?;

    assert_eq!(pending.await?, EditOutcome::Superseded);
    let session = harness.service.current().await.unwrap();
    assert_eq!(
        session.code,
        format!("<div>{}</div>", harness.round.outputs[1].id)
    );

    return Ok(());
}
