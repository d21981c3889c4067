//! Core types for image remixing.

use crate::error::{RemixError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Image formats we can recognise in input files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        None
    }
}

/// Aspect ratios the generation service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 square aspect ratio.
    #[serde(rename = "1:1")]
    Square,
    /// 16:9 landscape (widescreen) aspect ratio.
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 portrait (tall) aspect ratio.
    #[serde(rename = "9:16")]
    Portrait,
    /// 4:3 standard landscape aspect ratio.
    #[serde(rename = "4:3")]
    Standard,
    /// 3:4 standard portrait aspect ratio.
    #[serde(rename = "3:4")]
    StandardPortrait,
}

impl AspectRatio {
    /// Returns the aspect ratio as a string (e.g., "16:9").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Standard => "4:3",
            Self::StandardPortrait => "3:4",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A self-contained `data:<mime>;base64,<payload>` encoding of image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    encoded: String,
}

impl DataUrl {
    /// Encodes raw bytes under the given MIME type.
    pub fn from_bytes(mime_type: &str, data: &[u8]) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(data);
        Self {
            encoded: format!("data:{};base64,{}", mime_type, payload),
        }
    }

    /// Wraps an existing `data:` URL. Only base64 payloads are accepted; the
    /// payload itself is checked by [`DataUrl::decode`].
    pub fn parse(input: &str) -> Result<Self> {
        let rest = input
            .strip_prefix("data:")
            .ok_or_else(|| RemixError::Decode("missing data: prefix".into()))?;
        if !rest.contains(";base64,") {
            return Err(RemixError::Decode("data URL is not base64-encoded".into()));
        }
        Ok(Self {
            encoded: input.to_string(),
        })
    }

    /// The declared MIME type.
    pub fn mime_type(&self) -> &str {
        self.encoded["data:".len()..]
            .split_once(';')
            .map(|(mime, _)| mime)
            .unwrap_or_default()
    }

    /// Decodes the payload back into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let payload = self
            .encoded
            .split_once(";base64,")
            .map(|(_, payload)| payload)
            .unwrap_or_default();
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| RemixError::Decode(e.to_string()))
    }

    /// The full encoded string.
    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl std::fmt::Display for DataUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encoded)
    }
}

/// The single active input image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputImageSource {
    /// A remote `http://` or `https://` URL, passed through as typed.
    Url(String),
    /// Inline image data decoded from a file, drop or paste.
    Inline(DataUrl),
}

impl InputImageSource {
    /// The value sent to the generator as `image_inputs[].url`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Inline(data) => data.as_str(),
        }
    }

    /// Returns true for inline data.
    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }

    /// Short description for logs and status lines; never prints the payload.
    pub fn describe(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Inline(data) => format!(
                "inline {} ({} chars)",
                data.mime_type(),
                data.as_str().len()
            ),
        }
    }
}

/// Returns true if `text` carries an `http://` or `https://` prefix.
pub fn is_remote_url(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://")
}

/// One reference image in a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInput {
    /// Remote URL or inline data URL.
    pub url: String,
}

/// A request to remix an image with a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The text prompt describing the desired result.
    pub prompt: String,
    /// Reference images; always exactly one when built by the trigger.
    pub image_inputs: Vec<ImageInput>,
    /// Optional output aspect ratio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
}

impl GenerationRequest {
    /// Creates a request from a prompt and the captured input source.
    pub fn new(prompt: impl Into<String>, source: &InputImageSource) -> Self {
        Self {
            prompt: prompt.into(),
            image_inputs: vec![ImageInput {
                url: source.as_str().to_string(),
            }],
            aspect_ratio: None,
        }
    }

    /// Sets the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }
}

/// A success-shaped response from the generation service.
///
/// A response without a `url` is a soft failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// URL of the generated image.
    #[serde(default)]
    pub url: Option<String>,
}

impl GenerationResult {
    /// A result pointing at `url`.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
        }
    }

    /// Returns the URL if it is present and non-blank.
    pub fn usable_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.trim().is_empty())
    }
}
