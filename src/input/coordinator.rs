//! Input source coordinator.
//!
//! Tracks the one active input image and keeps the four input channels
//! (file picker, URL field, drag-and-drop, clipboard paste) mutually
//! exclusive. Each `set_from_*` call runs its synchronous part immediately;
//! operations that need a file decode hand back a future that applies the
//! decoded value when it resolves.

use crate::image::{is_remote_url, DataUrl, InputImageSource};
use crate::input::file::{Base64FileDecoder, FileDecoder, ImageFile};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// One of the four ways an image can enter the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// File picker selection.
    FilePicker,
    /// URL text field (typed or pasted).
    UrlField,
    /// Drag-and-drop onto the upload area.
    Drop,
    /// Clipboard image paste.
    Paste,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FilePicker => write!(f, "file"),
            Self::UrlField => write!(f, "url"),
            Self::Drop => write!(f, "drop"),
            Self::Paste => write!(f, "paste"),
        }
    }
}

/// What to do with a decode that finishes after a newer input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    /// The last decode to complete wins, even if a newer event arrived while
    /// it was in flight.
    #[default]
    LastCompletionWins,
    /// Completions are tagged with the event that started them and dropped
    /// if any other event has happened since.
    RejectStale,
}

/// Observable state of the coordinator and its channels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    /// The active input image.
    pub current: Option<InputImageSource>,
    /// Channel that wrote `current`.
    pub source_channel: Option<Channel>,
    /// Name shown by the file picker.
    pub file_selection: Option<String>,
    /// Text shown by the URL field.
    pub url_field: String,
    epoch: u64,
}

impl InputSnapshot {
    /// Whether the input preview should be shown.
    pub fn preview_visible(&self) -> bool {
        self.current.is_some()
    }

    /// Number of input events seen so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    fn clear_all(&mut self) {
        self.current = None;
        self.source_channel = None;
        self.file_selection = None;
        self.url_field.clear();
    }

    fn clear_source(&mut self) {
        self.current = None;
        self.source_channel = None;
    }
}

/// One entry of a clipboard paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem {
    /// MIME type the clipboard reports for the entry.
    pub mime_type: String,
    /// The entry as a file, when the clipboard can provide one.
    pub file: Option<ImageFile>,
}

impl ClipboardItem {
    /// An entry the clipboard reports as `mime_type`, backed by `file`.
    ///
    /// The file's own MIME type is left alone, so an untyped file is still
    /// sniffed when decoded.
    pub fn image(mime_type: impl Into<String>, file: ImageFile) -> Self {
        Self {
            mime_type: mime_type.into(),
            file: Some(file),
        }
    }

    /// A non-file entry of the given type.
    pub fn other(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            file: None,
        }
    }

    fn is_image(&self) -> bool {
        self.mime_type.contains("image")
    }
}

/// Builder for [`InputCoordinator`].
#[derive(Clone, Default)]
pub struct InputCoordinatorBuilder {
    decoder: Option<Arc<dyn FileDecoder>>,
    stale_policy: StalePolicy,
}

impl InputCoordinatorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the file decoder. Defaults to [`Base64FileDecoder`].
    pub fn decoder(mut self, decoder: Arc<dyn FileDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Sets how late decode completions are treated.
    pub fn stale_policy(mut self, policy: StalePolicy) -> Self {
        self.stale_policy = policy;
        self
    }

    /// Builds the coordinator with empty state.
    pub fn build(self) -> InputCoordinator {
        let (state, _) = watch::channel(InputSnapshot::default());
        InputCoordinator {
            inner: Arc::new(Inner {
                state,
                decoder: self
                    .decoder
                    .unwrap_or_else(|| Arc::new(Base64FileDecoder)),
                stale_policy: self.stale_policy,
            }),
        }
    }
}

struct Inner {
    state: watch::Sender<InputSnapshot>,
    decoder: Arc<dyn FileDecoder>,
    stale_policy: StalePolicy,
}

/// Owns the active input image and enforces one writer at a time.
///
/// Cloning yields another handle to the same state.
#[derive(Clone)]
pub struct InputCoordinator {
    inner: Arc<Inner>,
}

impl Default for InputCoordinator {
    fn default() -> Self {
        InputCoordinatorBuilder::new().build()
    }
}

impl InputCoordinator {
    /// Creates a new [`InputCoordinatorBuilder`].
    pub fn builder() -> InputCoordinatorBuilder {
        InputCoordinatorBuilder::new()
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> InputSnapshot {
        self.inner.state.borrow().clone()
    }

    /// The active input image, if any.
    pub fn current(&self) -> Option<InputImageSource> {
        self.inner.state.borrow().current.clone()
    }

    /// Receives a notification on every state change.
    pub fn subscribe(&self) -> watch::Receiver<InputSnapshot> {
        self.inner.state.subscribe()
    }

    /// Clears every channel and the active image.
    pub fn reset(&self) {
        self.begin_event(InputSnapshot::clear_all);
        tracing::debug!("input reset");
    }

    /// Handles a URL field edit. Returns true if the text became the source.
    pub fn set_from_url(&self, text: &str) -> bool {
        let url = text.trim();
        let accepted = !url.is_empty() && is_remote_url(url);

        self.begin_event(|s| {
            if accepted {
                s.clear_all();
                s.url_field = url.to_string();
                s.current = Some(InputImageSource::Url(url.to_string()));
                s.source_channel = Some(Channel::UrlField);
            } else {
                // Keep the typed text so the user can finish editing it.
                s.clear_source();
                s.url_field = text.to_string();
            }
        });

        if accepted {
            tracing::debug!(%url, "input set from URL field");
        } else if !url.is_empty() {
            tracing::debug!(text = %url, "URL field holds no usable URL");
        }
        accepted
    }

    /// Handles a file picker change.
    ///
    /// `None` means the picker was dismissed: that resets the coordinator
    /// only when nothing is active. The returned future decodes the file and
    /// resolves to true if the decoded image was applied.
    pub fn set_from_file(
        &self,
        file: Option<ImageFile>,
    ) -> impl Future<Output = bool> + Send + 'static {
        let pending = match file {
            Some(file) => {
                let epoch = self.begin_event(|_| {});
                Some((epoch, file))
            }
            None => {
                self.inner.state.send_if_modified(|s| {
                    if s.current.is_some() {
                        return false;
                    }
                    s.epoch += 1;
                    s.clear_all();
                    true
                });
                None
            }
        };

        let this = self.clone();
        async move {
            match pending {
                Some((epoch, file)) => {
                    this.decode_and_apply(epoch, Channel::FilePicker, file)
                        .await
                }
                None => false,
            }
        }
    }

    /// Handles a drop onto the upload area.
    ///
    /// Every channel is cleared immediately, whatever was dropped. Only the
    /// first file is considered, and only if it is typed `image/*`.
    pub fn set_from_drop(
        &self,
        files: Vec<ImageFile>,
    ) -> impl Future<Output = bool> + Send + 'static {
        let epoch = self.begin_event(InputSnapshot::clear_all);

        let file = files.into_iter().next().filter(|f| {
            let ok = f.is_image();
            if !ok {
                tracing::debug!(name = %f.name, mime = ?f.mime_type, "ignoring non-image drop");
            }
            ok
        });

        let this = self.clone();
        async move {
            match file {
                Some(file) => this.decode_and_apply(epoch, Channel::Drop, file).await,
                None => false,
            }
        }
    }

    /// Handles a clipboard paste.
    ///
    /// Every channel is cleared immediately. The first image entry with a
    /// file is decoded and the rest are ignored. Without one, clipboard text
    /// starting with `http://` or `https://` is written to the URL field and
    /// becomes the source.
    pub fn set_from_paste(
        &self,
        items: Vec<ClipboardItem>,
        text: Option<String>,
    ) -> impl Future<Output = bool> + Send + 'static {
        let epoch = self.begin_event(InputSnapshot::clear_all);

        let image = items
            .into_iter()
            .filter(ClipboardItem::is_image)
            .find_map(|item| item.file);

        let mut accepted_url = false;
        if image.is_none() {
            if let Some(text) = text.filter(|t| is_remote_url(t)) {
                self.inner.state.send_modify(|s| {
                    s.url_field = text.clone();
                    s.current = Some(InputImageSource::Url(text.clone()));
                    s.source_channel = Some(Channel::UrlField);
                });
                tracing::debug!(url = %text, "input set from pasted URL");
                accepted_url = true;
            } else {
                tracing::debug!("paste held neither an image nor a URL");
            }
        }

        let this = self.clone();
        async move {
            match image {
                Some(file) => this.decode_and_apply(epoch, Channel::Paste, file).await,
                None => accepted_url,
            }
        }
    }

    /// Records a new input event and returns its epoch.
    fn begin_event(&self, apply: impl FnOnce(&mut InputSnapshot)) -> u64 {
        let mut epoch = 0;
        self.inner.state.send_modify(|s| {
            s.epoch += 1;
            apply(s);
            epoch = s.epoch;
        });
        epoch
    }

    async fn decode_and_apply(&self, epoch: u64, channel: Channel, file: ImageFile) -> bool {
        match self.inner.decoder.decode(&file).await {
            Ok(data) => self.apply_decoded(epoch, channel, &file.name, data),
            Err(e) => {
                tracing::warn!(name = %file.name, %channel, "failed to read input image: {e}");
                false
            }
        }
    }

    fn apply_decoded(&self, epoch: u64, channel: Channel, name: &str, data: DataUrl) -> bool {
        let policy = self.inner.stale_policy;
        let applied = self.inner.state.send_if_modified(|s| {
            if policy == StalePolicy::RejectStale && s.epoch != epoch {
                return false;
            }
            s.clear_all();
            if channel == Channel::FilePicker {
                s.file_selection = Some(name.to_string());
            }
            s.current = Some(InputImageSource::Inline(data));
            s.source_channel = Some(channel);
            true
        });

        if applied {
            tracing::debug!(%name, %channel, "input set from decoded image");
        } else {
            tracing::debug!(%name, %channel, epoch, "discarding stale decode");
        }
        applied
    }
}
