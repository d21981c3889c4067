//! Generation request trigger.
//!
//! Idle -> Pending -> Idle around a single call to the image generator.

use crate::error::RemixError;
use crate::image::{AspectRatio, GenerationRequest, ImageGenerator, InputImageSource};
use crate::input::{fetch_data_url, InputCoordinator};
use std::sync::Arc;
use tokio::sync::watch;

/// A transient message for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Triggered without an input image.
    NoImage,
    /// Triggered with a blank prompt.
    NoPrompt,
    /// The service answered without a result URL.
    GenerationFailed,
    /// The call to the service failed.
    GenerationError,
}

impl Notice {
    /// The text shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoImage => "Please upload, paste an image, or provide an image URL first.",
            Self::NoPrompt => "Please enter a prompt.",
            Self::GenerationFailed => "Failed to generate image. No URL returned.",
            Self::GenerationError => {
                "An error occurred during image generation. Please try again."
            }
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Observable state of the trigger and the result region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerView {
    /// A generation is in flight.
    pub pending: bool,
    /// URL of the displayed result.
    pub result_url: Option<String>,
    /// Latest notice, replaced on the next trigger.
    pub notice: Option<Notice>,
}

impl TriggerView {
    /// Whether the generate control accepts input.
    pub fn enabled(&self) -> bool {
        !self.pending
    }

    /// Whether the busy indicator is shown.
    pub fn busy(&self) -> bool {
        self.pending
    }

    /// The result to display, hidden while pending.
    pub fn visible_result(&self) -> Option<&str> {
        if self.pending {
            None
        } else {
            self.result_url.as_deref()
        }
    }
}

/// How a trigger attempt ended.
#[derive(Debug)]
pub enum TriggerOutcome {
    /// The generated image is available at `url`.
    Generated {
        /// Result URL.
        url: String,
    },
    /// A precondition failed; the generator was not called.
    Blocked(Notice),
    /// The service answered without a result URL.
    SoftFailure,
    /// The call itself failed.
    HardFailure(RemixError),
    /// A generation was already in flight; nothing happened.
    Busy,
}

impl TriggerOutcome {
    /// The notice shown for this outcome, if any.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Blocked(notice) => Some(*notice),
            Self::SoftFailure => Some(Notice::GenerationFailed),
            Self::HardFailure(_) => Some(Notice::GenerationError),
            Self::Generated { .. } | Self::Busy => None,
        }
    }
}

/// Returns the trigger to Idle when dropped, whichever way the call ended.
struct PendingGuard<'a> {
    view: &'a watch::Sender<TriggerView>,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.view.send_modify(|v| v.pending = false);
    }
}

/// Packages the current input with a prompt and calls the generator, at
/// most one call at a time.
///
/// Cloning yields another handle to the same trigger.
#[derive(Clone)]
pub struct GenerationTrigger {
    generator: Arc<dyn ImageGenerator>,
    inputs: InputCoordinator,
    view: Arc<watch::Sender<TriggerView>>,
    aspect_ratio: Option<AspectRatio>,
    inline_client: Option<reqwest::Client>,
}

impl GenerationTrigger {
    /// Creates an idle trigger reading from `inputs`.
    pub fn new(generator: Arc<dyn ImageGenerator>, inputs: InputCoordinator) -> Self {
        let (view, _) = watch::channel(TriggerView::default());
        Self {
            generator,
            inputs,
            view: Arc::new(view),
            aspect_ratio: None,
            inline_client: None,
        }
    }

    /// Requests a fixed aspect ratio for every generation.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    /// Fetches URL sources and sends them as inline data instead of passing
    /// the URL through.
    pub fn with_url_inlining(mut self, client: reqwest::Client) -> Self {
        self.inline_client = Some(client);
        self
    }

    /// The coordinator this trigger reads from.
    pub fn inputs(&self) -> &InputCoordinator {
        &self.inputs
    }

    /// A copy of the current view.
    pub fn view(&self) -> TriggerView {
        self.view.borrow().clone()
    }

    /// Receives a notification on every view change.
    pub fn subscribe(&self) -> watch::Receiver<TriggerView> {
        self.view.subscribe()
    }

    /// Returns true while a generation is in flight.
    pub fn is_pending(&self) -> bool {
        self.view.borrow().pending
    }

    /// Runs one generation with `prompt` and the current input image.
    pub async fn trigger(&self, prompt: &str) -> TriggerOutcome {
        if self.is_pending() {
            return TriggerOutcome::Busy;
        }

        let Some(source) = self.inputs.current() else {
            return self.block(Notice::NoImage);
        };
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return self.block(Notice::NoPrompt);
        }

        let entered = self.view.send_if_modified(|v| {
            if v.pending {
                return false;
            }
            v.pending = true;
            v.result_url = None;
            v.notice = None;
            true
        });
        if !entered {
            return TriggerOutcome::Busy;
        }
        let _guard = PendingGuard { view: &self.view };

        tracing::info!(
            generator = self.generator.name(),
            source = %source.describe(),
            "starting generation"
        );

        let outcome = match self.run(prompt, source).await {
            Ok(Some(url)) => {
                tracing::info!(%url, "generation complete");
                TriggerOutcome::Generated { url }
            }
            Ok(None) => {
                tracing::warn!("generation returned no image URL");
                TriggerOutcome::SoftFailure
            }
            Err(e) => {
                tracing::warn!("error generating image: {e}");
                TriggerOutcome::HardFailure(e)
            }
        };

        self.view.send_modify(|v| {
            if let TriggerOutcome::Generated { url } = &outcome {
                v.result_url = Some(url.clone());
            }
            v.notice = outcome.notice();
        });

        outcome
    }

    async fn run(
        &self,
        prompt: &str,
        source: InputImageSource,
    ) -> Result<Option<String>, RemixError> {
        let source = match (&self.inline_client, source) {
            (Some(client), InputImageSource::Url(url)) => {
                InputImageSource::Inline(fetch_data_url(client, &url).await?)
            }
            (_, source) => source,
        };

        let mut request = GenerationRequest::new(prompt, &source);
        if let Some(ratio) = self.aspect_ratio {
            request = request.with_aspect_ratio(ratio);
        }

        let result = self.generator.generate(&request).await?;
        Ok(result.usable_url().map(str::to_string))
    }

    fn block(&self, notice: Notice) -> TriggerOutcome {
        tracing::debug!(%notice, "generation blocked");
        self.view.send_modify(|v| v.notice = Some(notice));
        TriggerOutcome::Blocked(notice)
    }
}
