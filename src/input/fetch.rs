//! Fetches a remote image and inlines it as a data URL.

use crate::error::{RemixError, Result};
use crate::image::{DataUrl, ImageFormat};

/// Downloads `url` and encodes the body as a data URL.
///
/// The `Content-Type` header is used when it names an image; otherwise the
/// type is sniffed from the body.
pub async fn fetch_data_url(client: &reqwest::Client, url: &str) -> Result<DataUrl> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(RemixError::Api {
            status: status.as_u16(),
            message: format!("Failed to fetch {}", url),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or_default().trim().to_string())
        .filter(|v| v.starts_with("image/"));

    let data = response.bytes().await?;
    let mime = content_type
        .or_else(|| ImageFormat::from_magic_bytes(&data).map(|f| f.mime_type().to_string()))
        .unwrap_or_else(|| "application/octet-stream".to_string());

    tracing::debug!(%url, %mime, size = data.len(), "inlined remote image");

    Ok(DataUrl::from_bytes(&mime, &data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG_BYTES: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[tokio::test]
    async fn test_fetch_uses_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cat.jpg"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(b"jpegish".to_vec(), "image/jpeg"),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let data = fetch_data_url(&client, &format!("{}/cat.jpg", server.uri()))
            .await
            .unwrap();
        assert_eq!(data.mime_type(), "image/jpeg");
        assert_eq!(data.decode().unwrap(), b"jpegish");
    }

    #[tokio::test]
    async fn test_fetch_sniffs_when_untyped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_BYTES.to_vec()))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let data = fetch_data_url(&client, &format!("{}/x", server.uri()))
            .await
            .unwrap();
        assert_eq!(data.mime_type(), "image/png");
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = fetch_data_url(&client, &format!("{}/missing.png", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, RemixError::Api { status: 404, .. }));
    }
}
