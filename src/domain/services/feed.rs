#[cfg(test)]
#[path = "feed_test.rs"]
mod tests;

use anyhow::anyhow;
use anyhow::Result;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

use crate::domain::models::ErrorDetails;
use crate::domain::models::Event;
use crate::domain::models::Output;
use crate::domain::models::Round;
use crate::domain::models::Settlement;

enum Command {
    Prepend(Round, oneshot::Sender<()>),
    Remove(String, oneshot::Sender<bool>),
    Reset(oneshot::Sender<()>),
    Settle {
        round_id: String,
        output_id: String,
        settlement: Settlement,
        reply: oneshot::Sender<bool>,
    },
    SetOutputData {
        round_id: String,
        output_id: String,
        data: String,
        reply: oneshot::Sender<bool>,
    },
    Snapshot(oneshot::Sender<Vec<Round>>),
    GetRound(String, oneshot::Sender<Option<Round>>),
    GetOutput {
        round_id: String,
        output_id: String,
        reply: oneshot::Sender<Option<Output>>,
    },
}

/// Newest first list of rounds. All access goes through a single task, so
/// concurrent settlements and removals are applied one at a time. Writes that
/// target a round or output that is gone are dropped.
#[derive(Clone)]
pub struct FeedStore {
    commands: mpsc::UnboundedSender<Command>,
}

struct Feed {
    rounds: Vec<Round>,
    events: Option<mpsc::UnboundedSender<Event>>,
}

impl Feed {
    fn publish(&self, event: Event) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    fn output_mut(&mut self, round_id: &str, output_id: &str) -> Option<&mut Output> {
        return self
            .rounds
            .iter_mut()
            .find(|e| return e.id == round_id)?
            .output_mut(output_id);
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Prepend(round, reply) => {
                let round_id = round.id.clone();
                self.rounds.insert(0, round);
                self.publish(Event::RoundAdded(round_id));
                let _ = reply.send(());
            }
            Command::Remove(round_id, reply) => {
                let count = self.rounds.len();
                self.rounds.retain(|e| return e.id != round_id);
                let removed = self.rounds.len() != count;
                if removed {
                    self.publish(Event::RoundRemoved(round_id));
                }
                let _ = reply.send(removed);
            }
            Command::Reset(reply) => {
                self.rounds.clear();
                self.publish(Event::FeedReset());
                let _ = reply.send(());
            }
            Command::Settle {
                round_id,
                output_id,
                settlement,
                reply,
            } => {
                let mut settled = None;
                if let Some(output) = self.output_mut(&round_id, &output_id) {
                    if output.settle(settlement) {
                        settled = Some(output.clone());
                    }
                }

                let applied = settled.is_some();
                if let Some(output) = settled {
                    self.publish(Event::OutputSettled(round_id, output));
                } else {
                    tracing::debug!(
                        round_id = round_id.as_str(),
                        output_id = output_id.as_str(),
                        "Dropped settlement for a missing or settled output"
                    );
                }
                let _ = reply.send(applied);
            }
            Command::SetOutputData {
                round_id,
                output_id,
                data,
                reply,
            } => {
                let mut edited = None;
                if let Some(output) = self.output_mut(&round_id, &output_id) {
                    output.output_data = Some(data);
                    edited = Some(output.clone());
                }

                let applied = edited.is_some();
                if let Some(output) = edited {
                    self.publish(Event::OutputEdited(round_id, output));
                }
                let _ = reply.send(applied);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.rounds.clone());
            }
            Command::GetRound(round_id, reply) => {
                let round = self.rounds.iter().find(|e| return e.id == round_id);
                let _ = reply.send(round.cloned());
            }
            Command::GetOutput {
                round_id,
                output_id,
                reply,
            } => {
                let output = self.output_mut(&round_id, &output_id).map(|e| return e.clone());
                let _ = reply.send(output);
            }
        }
    }
}

async fn run(mut feed: Feed, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.recv().await {
        feed.handle(command);
    }
}

impl FeedStore {
    /// Spawns the store onto the current runtime. Every change is published
    /// to `events` when given.
    pub fn start(events: Option<mpsc::UnboundedSender<Event>>) -> FeedStore {
        let (commands, rx) = mpsc::unbounded_channel::<Command>();
        let feed = Feed {
            rounds: vec![],
            events,
        };

        tokio::spawn(run(feed, rx));

        return FeedStore { commands };
    }

    async fn request<T>(&self, command: Command, rx: oneshot::Receiver<T>) -> Result<T> {
        self.commands
            .send(command)
            .map_err(|_| return anyhow!("Feed store is no longer running"))?;

        return rx
            .await
            .map_err(|_| return anyhow!("Feed store dropped the request"));
    }

    pub async fn prepend(&self, round: Round) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        return self.request(Command::Prepend(round, tx), rx).await;
    }

    /// Returns whether a round was removed.
    pub async fn remove(&self, round_id: &str) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        return self
            .request(Command::Remove(round_id.to_string(), tx), rx)
            .await;
    }

    pub async fn reset(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        return self.request(Command::Reset(tx), rx).await;
    }

    /// Writes the terminal state of an output. Returns false when the output
    /// no longer exists or has already settled.
    pub async fn settle(
        &self,
        round_id: &str,
        output_id: &str,
        settlement: Settlement,
    ) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        let command = Command::Settle {
            round_id: round_id.to_string(),
            output_id: output_id.to_string(),
            settlement,
            reply: tx,
        };

        return self.request(command, rx).await;
    }

    /// Fails every output of a round that is still pending, returning how
    /// many were failed.
    pub async fn fail_round(
        &self,
        round_id: &str,
        message: &str,
        details: &ErrorDetails,
    ) -> Result<usize> {
        let round = match self.round(round_id).await? {
            Some(round) => round,
            None => return Ok(0),
        };

        let mut failed = 0;
        for output in round.outputs {
            let settlement = Settlement::Failed {
                message: message.to_string(),
                details: details.clone(),
            };
            if self.settle(round_id, &output.id, settlement).await? {
                failed += 1;
            }
        }

        return Ok(failed);
    }

    /// Overwrites the content of an output, as done when saving a live edit.
    pub async fn set_output_data(&self, round_id: &str, output_id: &str, data: &str) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        let command = Command::SetOutputData {
            round_id: round_id.to_string(),
            output_id: output_id.to_string(),
            data: data.to_string(),
            reply: tx,
        };

        return self.request(command, rx).await;
    }

    pub async fn snapshot(&self) -> Result<Vec<Round>> {
        let (tx, rx) = oneshot::channel();
        return self.request(Command::Snapshot(tx), rx).await;
    }

    pub async fn round(&self, round_id: &str) -> Result<Option<Round>> {
        let (tx, rx) = oneshot::channel();
        return self
            .request(Command::GetRound(round_id.to_string(), tx), rx)
            .await;
    }

    pub async fn output(&self, round_id: &str, output_id: &str) -> Result<Option<Output>> {
        let (tx, rx) = oneshot::channel();
        let command = Command::GetOutput {
            round_id: round_id.to_string(),
            output_id: output_id.to_string(),
            reply: tx,
        };

        return self.request(command, rx).await;
    }
}
