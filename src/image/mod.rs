//! Image types and the generator capability.

mod provider;
pub mod providers;
mod types;

pub use provider::ImageGenerator;
pub use types::{
    is_remote_url, AspectRatio, DataUrl, GenerationRequest, GenerationResult, ImageFormat,
    ImageInput, InputImageSource,
};
