//! Test doubles shared by the coordinator and trigger tests.

use crate::error::{RemixError, Result};
use crate::image::{DataUrl, GenerationRequest, GenerationResult, ImageGenerator};
use crate::input::{Base64FileDecoder, FileDecoder, ImageFile};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Notify, Semaphore};

pub const PNG_BYTES: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

/// An in-memory PNG file named `name`.
pub fn png_file(name: &str) -> ImageFile {
    ImageFile::from_bytes(name, Some("image/png".into()), PNG_BYTES.to_vec())
}

/// Decodes normally and records which files it was asked for.
#[derive(Default)]
pub struct RecordingDecoder {
    decoded: Mutex<Vec<String>>,
}

impl RecordingDecoder {
    pub fn decoded(&self) -> Vec<String> {
        self.decoded.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileDecoder for RecordingDecoder {
    async fn decode(&self, file: &ImageFile) -> Result<DataUrl> {
        self.decoded.lock().unwrap().push(file.name.clone());
        Base64FileDecoder.decode(file).await
    }
}

/// Holds each decode until the test releases that file by name.
#[derive(Default)]
pub struct GatedDecoder {
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl GatedDecoder {
    fn gate(&self, name: &str) -> Arc<Notify> {
        self.gates
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    pub fn release(&self, name: &str) {
        self.gate(name).notify_one();
    }
}

#[async_trait]
impl FileDecoder for GatedDecoder {
    async fn decode(&self, file: &ImageFile) -> Result<DataUrl> {
        let gate = self.gate(&file.name);
        gate.notified().await;
        Base64FileDecoder.decode(file).await
    }
}

/// What [`MockGenerator`] answers with.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Url(String),
    NoUrl,
    Error,
}

/// Records every request; optionally holds each call until released.
pub struct MockGenerator {
    response: MockResponse,
    calls: watch::Sender<usize>,
    requests: Mutex<Vec<GenerationRequest>>,
    gate: Option<Semaphore>,
}

impl MockGenerator {
    pub fn new(response: MockResponse) -> Self {
        let (calls, _) = watch::channel(0);
        Self {
            response,
            calls,
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Each call waits for one [`MockGenerator::release`].
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.borrow()
    }

    /// Waits until at least `n` calls have started.
    pub async fn wait_calls(&self, n: usize) {
        let mut rx = self.calls.subscribe();
        rx.wait_for(|c| *c >= n).await.unwrap();
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ImageGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        self.requests.lock().unwrap().push(request.clone());
        self.calls.send_modify(|c| *c += 1);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        match &self.response {
            MockResponse::Url(url) => Ok(GenerationResult::with_url(url.clone())),
            MockResponse::NoUrl => Ok(GenerationResult::default()),
            MockResponse::Error => Err(RemixError::Api {
                status: 503,
                message: "unavailable".into(),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
