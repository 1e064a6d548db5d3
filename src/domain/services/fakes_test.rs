use std::collections::VecDeque;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time;

use crate::domain::models::AcquisitionError;
use crate::domain::models::Backend;
use crate::domain::models::BackendName;
use crate::domain::models::FrameExporter;
use crate::domain::models::GenerationError;
use crate::domain::models::GenerationRequest;
use crate::domain::models::GenerationResponse;
use crate::domain::models::GroundingChunk;
use crate::domain::models::PageFetcher;

#[derive(Clone, Debug)]
pub enum Reply {
    Text(String),
    Grounded(String, Vec<GroundingChunk>),
    Empty,
    Fail(GenerationError),
    /// Never answers within any sane attempt timeout.
    Hang,
    Delayed(Duration, String),
}

impl Reply {
    pub fn text(text: &str) -> Reply {
        return Reply::Text(text.to_string());
    }
}

/// Shared view into what a fake saw after it was boxed away.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<AtomicU32>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl Recorder {
    pub fn calls(&self) -> u32 {
        return self.calls.load(Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        return self.requests.lock().unwrap().clone();
    }
}

pub struct FakeBackend {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    recorder: Recorder,
}

impl FakeBackend {
    pub fn always(reply: Reply) -> (FakeBackend, Recorder) {
        return FakeBackend::script(vec![], reply);
    }

    /// Answers with `replies` in order, then with `fallback` forever.
    pub fn script(replies: Vec<Reply>, fallback: Reply) -> (FakeBackend, Recorder) {
        let recorder = Recorder::default();
        let backend = FakeBackend {
            replies: Mutex::new(replies.into()),
            fallback,
            recorder: recorder.clone(),
        };

        return (backend, recorder);
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn name(&self) -> BackendName {
        return BackendName::Gemini;
    }

    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        self.recorder.calls.fetch_add(1, Ordering::SeqCst);
        self.recorder.requests.lock().unwrap().push(request.clone());

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| return self.fallback.clone());

        match reply {
            Reply::Text(text) => {
                return Ok(GenerationResponse {
                    text: Some(text),
                    grounding_chunks: None,
                });
            }
            Reply::Grounded(text, chunks) => {
                return Ok(GenerationResponse {
                    text: Some(text),
                    grounding_chunks: Some(chunks),
                });
            }
            Reply::Empty => return Ok(GenerationResponse::default()),
            Reply::Fail(err) => return Err(err),
            Reply::Hang => {
                time::sleep(Duration::from_secs(3600)).await;
                return Ok(GenerationResponse::default());
            }
            Reply::Delayed(delay, text) => {
                time::sleep(delay).await;
                return Ok(GenerationResponse {
                    text: Some(text),
                    grounding_chunks: None,
                });
            }
        }
    }
}

pub struct FakePageFetcher {
    pub result: Result<String, AcquisitionError>,
    pub calls: Arc<AtomicU32>,
}

impl FakePageFetcher {
    pub fn returning(result: Result<String, AcquisitionError>) -> FakePageFetcher {
        return FakePageFetcher {
            result,
            calls: Arc::new(AtomicU32::new(0)),
        };
    }
}

#[async_trait]
impl PageFetcher for FakePageFetcher {
    async fn fetch_page(&self, _url: &str) -> Result<String, AcquisitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        return self.result.clone();
    }
}

pub struct FakeFrameExporter {
    pub result: Result<String, AcquisitionError>,
    pub requested: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeFrameExporter {
    pub fn returning(result: Result<String, AcquisitionError>) -> FakeFrameExporter {
        return FakeFrameExporter {
            result,
            requested: Arc::new(Mutex::new(vec![])),
        };
    }
}

#[async_trait]
impl FrameExporter for FakeFrameExporter {
    async fn export_frame(
        &self,
        file_key: &str,
        node_id: &str,
    ) -> Result<String, AcquisitionError> {
        self.requested
            .lock()
            .unwrap()
            .push((file_key.to_string(), node_id.to_string()));
        return self.result.clone();
    }
}
