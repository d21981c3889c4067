//! JSON-over-HTTP image generation service.

use crate::error::{parse_retry_after, sanitize_error_message, RemixError, Result};
use crate::image::provider::ImageGenerator;
use crate::image::types::{DataUrl, GenerationRequest, GenerationResult};
use async_trait::async_trait;
use std::time::Instant;

/// Environment variable holding the generation endpoint.
pub const ENDPOINT_ENV: &str = "REMIXVIZ_ENDPOINT";
/// Environment variable holding the (optional) API key.
pub const API_KEY_ENV: &str = "REMIXVIZ_API_KEY";

/// Builder for [`HttpImageGenerator`].
#[derive(Debug, Clone, Default)]
pub struct HttpImageGeneratorBuilder {
    endpoint: Option<String>,
    api_key: Option<String>,
    client: Option<reqwest::Client>,
}

impl HttpImageGeneratorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the endpoint URL. Falls back to `REMIXVIZ_ENDPOINT`.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the API key. Falls back to `REMIXVIZ_API_KEY`; unauthenticated
    /// if neither is set.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Reuses an existing HTTP client.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the generator, resolving endpoint and credentials.
    pub fn build(self) -> Result<HttpImageGenerator> {
        let endpoint = self
            .endpoint
            .or_else(|| std::env::var(ENDPOINT_ENV).ok())
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                RemixError::InvalidRequest(format!(
                    "{ENDPOINT_ENV} not set and no endpoint provided"
                ))
            })?;

        let api_key = self
            .api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.is_empty());

        Ok(HttpImageGenerator {
            client: self.client.unwrap_or_default(),
            endpoint,
            api_key,
        })
    }
}

/// Image generator that POSTs `{ prompt, image_inputs }` to an HTTP endpoint
/// and reads back `{ url }`.
pub struct HttpImageGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpImageGenerator {
    /// Creates a new [`HttpImageGeneratorBuilder`].
    pub fn builder() -> HttpImageGeneratorBuilder {
        HttpImageGeneratorBuilder::new()
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The underlying HTTP client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {}", key)),
            None => builder,
        }
    }

    fn parse_error(
        &self,
        status: u16,
        text: &str,
        headers: &reqwest::header::HeaderMap,
    ) -> RemixError {
        let text = sanitize_error_message(text);
        match status {
            401 | 403 => RemixError::Auth(text),
            400 | 422 => RemixError::InvalidRequest(text),
            429 => {
                let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
                RemixError::RateLimited { retry_after }
            }
            _ => RemixError::Api {
                status,
                message: text,
            },
        }
    }

    /// Downloads a generated image. Inline `data:` results are decoded in
    /// place.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        if url.starts_with("data:") {
            return DataUrl::parse(url)?.decode();
        }

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(RemixError::Api {
                status: response.status().as_u16(),
                message: "Failed to download image".into(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let start = Instant::now();

        let response = self
            .authorize(self.client.post(&self.endpoint))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text, &headers));
        }

        let text = response.text().await?;
        let result: GenerationResult = serde_json::from_str(&text).map_err(|e| {
            RemixError::UnexpectedResponse(format!(
                "{e}: {}",
                sanitize_error_message(&text)
            ))
        })?;

        tracing::debug!(
            endpoint = %self.endpoint,
            duration_ms = start.elapsed().as_millis() as u64,
            has_url = result.usable_url().is_some(),
            "generation service responded"
        );

        Ok(result)
    }

    fn name(&self) -> &str {
        "HTTP generation service"
    }

    async fn health_check(&self) -> Result<()> {
        let response = self.authorize(self.client.get(&self.endpoint)).send().await?;

        match response.status().as_u16() {
            401 | 403 => Err(RemixError::Auth("Invalid API key".into())),
            s if s >= 500 => Err(RemixError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::types::InputImageSource;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> GenerationRequest {
        GenerationRequest::new(
            "add a hat",
            &InputImageSource::Url("https://example.com/cat.png".into()),
        )
    }

    async fn generator(server: &MockServer) -> HttpImageGenerator {
        HttpImageGenerator::builder()
            .endpoint(format!("{}/generate", server.uri()))
            .api_key("test-key")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_with_explicit_endpoint() {
        let generator = HttpImageGenerator::builder()
            .endpoint("http://localhost:9/generate")
            .build()
            .unwrap();
        assert_eq!(generator.endpoint(), "http://localhost:9/generate");
    }

    #[test]
    fn test_builder_rejects_blank_endpoint() {
        let result = HttpImageGenerator::builder().endpoint("  ").build();
        assert!(matches!(result, Err(RemixError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_json(serde_json::json!({
                "prompt": "add a hat",
                "image_inputs": [{ "url": "https://example.com/cat.png" }]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "url": "https://cdn.example.com/out.png" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = generator(&server).await.generate(&request()).await.unwrap();
        assert_eq!(result.usable_url(), Some("https://cdn.example.com/out.png"));
    }

    #[tokio::test]
    async fn test_generate_missing_url_is_soft_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let result = generator(&server).await.generate(&request()).await.unwrap();
        assert!(result.usable_url().is_none());
    }

    #[tokio::test]
    async fn test_generate_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let err = generator(&server)
            .await
            .generate(&request())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RemixError::RateLimited {
                retry_after: Some(d)
            } if d.as_secs() == 7
        ));
    }

    #[tokio::test]
    async fn test_generate_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = generator(&server)
            .await
            .generate(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, RemixError::Auth(msg) if msg == "bad key"));
    }

    #[tokio::test]
    async fn test_generate_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = generator(&server)
            .await
            .generate(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, RemixError::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn test_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/out.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .mount(&server)
            .await;

        let data = generator(&server)
            .await
            .download(&format!("{}/out.png", server.uri()))
            .await
            .unwrap();
        assert_eq!(data, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_download_inline_result() {
        let server = MockServer::start().await;
        let gen = generator(&server).await;

        let data = gen.download("data:image/png;base64,AQID").await.unwrap();
        assert_eq!(data, vec![1, 2, 3]);

        let err = gen.download("data:image/png,raw").await.unwrap_err();
        assert!(matches!(err, RemixError::Decode(_)));
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        assert!(generator(&server).await.health_check().await.is_ok());

        server.reset().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        assert!(matches!(
            generator(&server).await.health_check().await,
            Err(RemixError::Auth(_))
        ));

        server.reset().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        assert!(matches!(
            generator(&server).await.health_check().await,
            Err(RemixError::Api { status: 503, .. })
        ));
    }
}
