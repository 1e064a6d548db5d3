use super::Output;

/// Feed changes published to whoever is rendering the feed.
#[derive(Clone, Debug)]
pub enum Event {
    RoundAdded(String),
    OutputSettled(String, Output),
    OutputEdited(String, Output),
    RoundRemoved(String),
    FeedReset(),
}
