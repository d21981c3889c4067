#![warn(missing_docs)]
//! remixviz - remix a reference image with a text prompt.
//!
//! An [`InputCoordinator`] keeps one input image at a time, fed from a file
//! picker, a URL field, drag-and-drop or a clipboard paste. A
//! [`GenerationTrigger`] captures that image, pairs it with a prompt and
//! calls an [`ImageGenerator`], allowing one call in flight.
//!
//! # Quick Start
//!
//! ```no_run
//! use remixviz::{GenerationTrigger, HttpImageGenerator, InputCoordinator, TriggerOutcome};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> remixviz::Result<()> {
//!     let generator = HttpImageGenerator::builder()
//!         .endpoint("https://example.com/api/image-gen")
//!         .build()?;
//!     let inputs = InputCoordinator::default();
//!     let trigger = GenerationTrigger::new(Arc::new(generator), inputs.clone());
//!
//!     inputs.set_from_url("https://example.com/cat.png");
//!     if let TriggerOutcome::Generated { url } = trigger.trigger("Give the cat a hat").await {
//!         println!("{url}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `remixviz` binary and its interactive session.

mod error;
pub mod image;
pub mod input;
pub mod trigger;

#[cfg(feature = "cli")]
#[doc(hidden)]
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export error types at crate root
pub use error::{RemixError, Result};

pub use image::providers::{HttpImageGenerator, HttpImageGeneratorBuilder};
pub use image::{
    AspectRatio, DataUrl, GenerationRequest, GenerationResult, ImageFormat, ImageGenerator,
    ImageInput, InputImageSource,
};
pub use input::{
    Channel, ClipboardItem, FileDecoder, ImageFile, InputCoordinator, InputSnapshot, StalePolicy,
};
pub use trigger::{GenerationTrigger, Notice, TriggerOutcome, TriggerView};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{RemixError, Result};
    pub use crate::image::{GenerationRequest, GenerationResult, ImageGenerator, InputImageSource};
    pub use crate::input::{ClipboardItem, ImageFile, InputCoordinator};
    pub use crate::trigger::{GenerationTrigger, TriggerOutcome};
}
