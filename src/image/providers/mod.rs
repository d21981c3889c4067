//! Image generation services.

mod http;

pub use http::{HttpImageGenerator, HttpImageGeneratorBuilder, API_KEY_ENV, ENDPOINT_ENV};
