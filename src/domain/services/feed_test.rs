use anyhow::Result;
use tokio::sync::mpsc;

use super::FeedStore;
use crate::domain::models::ErrorKind;
use crate::domain::models::Event;
use crate::domain::models::ModelName;
use crate::domain::models::OutputMode;
use crate::domain::models::Round;
use crate::domain::models::Settlement;

fn round(prompt: &str, size: usize) -> Round {
    return Round::batch(prompt.to_string(), OutputMode::Html, ModelName::Flash, size);
}

fn succeeded(text: &str) -> Settlement {
    return Settlement::Succeeded {
        text: text.to_string(),
        grounding_chunks: None,
    };
}

#[tokio::test]
async fn it_prepends_newest_first() -> Result<()> {
    let feed = FeedStore::start(None);
    let first = round("first", 1);
    let second = round("second", 1);

    feed.prepend(first.clone()).await?;
    feed.prepend(second.clone()).await?;

    let ids = feed
        .snapshot()
        .await?
        .iter()
        .map(|e| return e.id.clone())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![second.id, first.id]);

    return Ok(());
}

#[tokio::test]
async fn it_settles_outputs_by_id() -> Result<()> {
    let feed = FeedStore::start(None);
    let first = round("first", 2);
    let second = round("second", 1);
    feed.prepend(first.clone()).await?;
    feed.prepend(second.clone()).await?;

    let target = &first.outputs[1];
    assert!(feed.settle(&first.id, &target.id, succeeded("<p></p>")).await?);

    let stored = feed.round(&first.id).await?.unwrap();
    assert!(stored.outputs[0].is_busy);
    assert!(!stored.outputs[1].is_busy);
    assert_eq!(stored.outputs[1].output_data, Some("<p></p>".to_string()));
    assert!(feed.round(&second.id).await?.unwrap().outputs[0].is_busy);

    return Ok(());
}

#[tokio::test]
async fn it_ignores_settlements_of_removed_rounds() -> Result<()> {
    let feed = FeedStore::start(None);
    let pending = round("pending", 2);
    feed.prepend(pending.clone()).await?;

    assert!(feed.remove(&pending.id).await?);
    assert!(!feed.remove(&pending.id).await?);

    let applied = feed
        .settle(&pending.id, &pending.outputs[0].id, succeeded("late"))
        .await?;
    assert!(!applied);
    assert!(feed.snapshot().await?.is_empty());

    return Ok(());
}

#[tokio::test]
async fn it_ignores_unknown_outputs() -> Result<()> {
    let feed = FeedStore::start(None);
    let pending = round("pending", 1);
    feed.prepend(pending.clone()).await?;

    assert!(!feed.settle(&pending.id, "missing", succeeded("x")).await?);
    assert!(!feed.set_output_data(&pending.id, "missing", "x").await?);
    assert!(feed.output(&pending.id, "missing").await?.is_none());

    return Ok(());
}

#[tokio::test]
async fn it_settles_each_output_once() -> Result<()> {
    let feed = FeedStore::start(None);
    let pending = round("pending", 1);
    let output_id = pending.outputs[0].id.clone();
    feed.prepend(pending.clone()).await?;

    assert!(feed.settle(&pending.id, &output_id, succeeded("first")).await?);
    assert!(!feed.settle(&pending.id, &output_id, succeeded("second")).await?);

    let output = feed.output(&pending.id, &output_id).await?.unwrap();
    assert_eq!(output.output_data, Some("first".to_string()));

    return Ok(());
}

#[tokio::test]
async fn it_fails_whole_rounds() -> Result<()> {
    let feed = FeedStore::start(None);
    let pending = round("pending", 3);
    feed.prepend(pending.clone()).await?;
    feed.settle(&pending.id, &pending.outputs[0].id, succeeded("done"))
        .await?;

    let failed = feed
        .fail_round(
            &pending.id,
            "Failed to fetch URL",
            &ErrorKind::PageFetchFailed.details(),
        )
        .await?;
    assert_eq!(failed, 2);

    let stored = feed.round(&pending.id).await?.unwrap();
    assert!(stored.is_settled());
    assert!(!stored.outputs[0].got_error);
    assert!(stored.outputs[1].got_error);
    assert_eq!(
        stored.outputs[2].error_details.as_ref().unwrap().kind,
        ErrorKind::PageFetchFailed
    );

    assert_eq!(
        feed.fail_round("missing", "x", &ErrorKind::Unknown.details())
            .await?,
        0
    );

    return Ok(());
}

#[tokio::test]
async fn it_overwrites_output_data() -> Result<()> {
    let feed = FeedStore::start(None);
    let pending = round("pending", 1);
    let output_id = pending.outputs[0].id.clone();
    feed.prepend(pending.clone()).await?;
    feed.settle(&pending.id, &output_id, succeeded("<p>old</p>"))
        .await?;

    assert!(feed.set_output_data(&pending.id, &output_id, "<p>new</p>").await?);

    let output = feed.output(&pending.id, &output_id).await?.unwrap();
    assert_eq!(output.output_data, Some("<p>new</p>".to_string()));

    return Ok(());
}

#[tokio::test]
async fn it_resets() -> Result<()> {
    let feed = FeedStore::start(None);
    feed.prepend(round("a", 1)).await?;
    feed.prepend(round("b", 1)).await?;

    feed.reset().await?;

    assert!(feed.snapshot().await?.is_empty());

    return Ok(());
}

#[tokio::test]
async fn it_publishes_events() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let feed = FeedStore::start(Some(tx));
    let pending = round("pending", 1);
    let output_id = pending.outputs[0].id.clone();

    feed.prepend(pending.clone()).await?;
    feed.settle(&pending.id, &output_id, succeeded("ok")).await?;
    feed.settle(&pending.id, &output_id, succeeded("again")).await?;
    feed.set_output_data(&pending.id, &output_id, "edited").await?;
    feed.remove(&pending.id).await?;
    feed.reset().await?;

    assert!(matches!(rx.recv().await, Some(Event::RoundAdded(id)) if id == pending.id));
    match rx.recv().await {
        Some(Event::OutputSettled(round_id, output)) => {
            assert_eq!(round_id, pending.id);
            assert_eq!(output.output_data, Some("ok".to_string()));
        }
        other => panic!("Unexpected event {other:?}"),
    }
    assert!(matches!(rx.recv().await, Some(Event::OutputEdited(_, output)) if output.output_data == Some("edited".to_string())));
    assert!(matches!(rx.recv().await, Some(Event::RoundRemoved(id)) if id == pending.id));
    assert!(matches!(rx.recv().await, Some(Event::FeedReset())));

    return Ok(());
}

#[tokio::test]
async fn it_serializes_concurrent_settlements() -> Result<()> {
    let feed = FeedStore::start(None);
    let pending = round("pending", 9);
    feed.prepend(pending.clone()).await?;

    let mut handles = vec![];
    for output in pending.outputs.clone() {
        let feed = feed.clone();
        let round_id = pending.id.clone();
        handles.push(tokio::spawn(async move {
            return feed
                .settle(&round_id, &output.id, succeeded(&output.id))
                .await;
        }));
    }
    for handle in handles {
        assert!(handle.await??);
    }

    let stored = feed.round(&pending.id).await?.unwrap();
    assert!(stored.is_settled());
    for output in stored.outputs {
        assert_eq!(output.output_data, Some(output.id.clone()));
    }

    return Ok(());
}
