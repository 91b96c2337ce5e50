//! HTTP backend abstraction for the synthesis service.
//!
//! The production backend uses reqwest; tests swap in a fake backend with
//! canned responses so no test touches the network.

use crate::error::{ClientError, ClientResult};
use crate::models::ClientSettings;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

// ============================================================================
// HTTP Backend Trait
// ============================================================================

/// Trait for HTTP backends that exchange JSON with the synthesis service.
///
/// This is an implementation detail - external code should use the
/// `SynthesisClientPort` trait.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// `GET` a URL and deserialize the JSON response.
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> ClientResult<T>;

    /// `POST` a JSON body and deserialize the JSON response.
    async fn post_json<B: Serialize + Sync, T: DeserializeOwned + Send>(
        &self,
        url: &Url,
        body: &B,
    ) -> ClientResult<T>;
}

// ============================================================================
// Reqwest Backend
// ============================================================================

/// Production HTTP backend using reqwest.
///
/// Every call is exactly one request. A non-2xx status becomes
/// [`ClientError::ApiRequestFailed`]; the engine decides what happens next.
pub struct ReqwestBackend {
    client: reqwest::Client,
    auth_token: Option<String>,
}

impl ReqwestBackend {
    /// Create a new reqwest backend with the given settings.
    pub fn new(settings: &ClientSettings) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            auth_token: settings.token.clone(),
        })
    }

    /// Build a request with optional authentication.
    fn build_request(&self, url: &Url, body: Option<&serde_json::Value>) -> reqwest::RequestBuilder {
        let mut request = match body {
            Some(body) => self.client.post(url.as_str()).json(body),
            None => self.client.get(url.as_str()),
        };
        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn send(
        &self,
        url: &Url,
        body: Option<&serde_json::Value>,
    ) -> ClientResult<reqwest::Response> {
        let response = self.build_request(url, body).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%url, status = status.as_u16(), "Synthesis request rejected");
            return Err(ClientError::ApiRequestFailed {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> ClientResult<T> {
        let response = self.send(url, None).await?;
        let data: T = response.json().await?;
        Ok(data)
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned + Send>(
        &self,
        url: &Url,
        body: &B,
    ) -> ClientResult<T> {
        let body = serde_json::to_value(body)?;
        let response = self.send(url, Some(&body)).await?;
        let data: T = response.json().await?;
        Ok(data)
    }
}

// ============================================================================
// Fake Backend for Testing
// ============================================================================


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SynthesisClientConfig;

    fn settings(config: &SynthesisClientConfig) -> ClientSettings {
        ClientSettings::from_config(config).unwrap()
    }

    #[test]
    fn test_reqwest_backend_creation() {
        let backend = ReqwestBackend::new(&settings(&SynthesisClientConfig::new())).unwrap();
        assert!(backend.auth_token.is_none());
    }

    #[test]
    fn test_reqwest_backend_with_token() {
        let config = SynthesisClientConfig::new().with_token("test_token");
        let backend = ReqwestBackend::new(&settings(&config)).unwrap();
        assert_eq!(backend.auth_token, Some("test_token".to_string()));
    }

    #[test]
    fn test_build_request_method_follows_body() {
        let backend = ReqwestBackend::new(&settings(&SynthesisClientConfig::new())).unwrap();
        let url = Url::parse("http://localhost:8000/api/tts/start-stream").unwrap();

        let get = backend.build_request(&url, None).build().unwrap();
        assert_eq!(get.method(), reqwest::Method::GET);

        let body = serde_json::json!({"text": "hi"});
        let post = backend.build_request(&url, Some(&body)).build().unwrap();
        assert_eq!(post.method(), reqwest::Method::POST);
    }

    #[test]
    fn test_build_request_sends_bearer_token() {
        let config = SynthesisClientConfig::new().with_token("secret");
        let backend = ReqwestBackend::new(&settings(&config)).unwrap();
        let url = Url::parse("http://localhost:8000/api/tts/job/1").unwrap();

        let request = backend.build_request(&url, None).build().unwrap();
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer secret"
        );
    }

    mod single_attempt_tests {
        use super::*;
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        /// Serve `503` to every connection and count how many arrive.
        async fn unavailable_server() -> (Url, Arc<AtomicUsize>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let hits = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&hits);

            tokio::spawn(async move {
                while let Ok((mut socket, _)) = listener.accept().await {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket
                        .write_all(
                            b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                        )
                        .await;
                    let _ = socket.shutdown().await;
                }
            });

            let url = Url::parse(&format!("http://{addr}/api/tts/start-stream")).unwrap();
            (url, hits)
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
        async fn test_start_stream_post_is_sent_once_on_server_error() {
            let (url, hits) = unavailable_server().await;
            let backend = ReqwestBackend::new(&settings(&SynthesisClientConfig::new())).unwrap();

            let result: ClientResult<serde_json::Value> =
                backend.post_json(&url, &serde_json::json!({"text": "hi"})).await;

            assert!(matches!(
                result,
                Err(ClientError::ApiRequestFailed { status: 503, .. })
            ));
            assert_eq!(hits.load(Ordering::SeqCst), 1);
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
        async fn test_poll_get_is_sent_once_on_server_error() {
            let (url, hits) = unavailable_server().await;
            let backend = ReqwestBackend::new(&settings(&SynthesisClientConfig::new())).unwrap();

            let result: ClientResult<serde_json::Value> = backend.get_json(&url).await;

            assert!(result.is_err());
            assert_eq!(hits.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_unreachable_host_fails_without_retrying() {
            let backend = ReqwestBackend::new(&settings(&SynthesisClientConfig::new())).unwrap();
            let url = Url::parse("http://127.0.0.1:1/api/tts/job/1").unwrap();

            let result: ClientResult<serde_json::Value> = backend.get_json(&url).await;
            assert!(matches!(result, Err(ClientError::Network(_))));
        }
    }

    mod fake_backend_tests {
        use super::super::testing::*;
        use super::*;
        use serde_json::json;

        #[tokio::test]
        async fn test_fake_backend_returns_canned_response() {
            let backend = FakeBackend::new()
                .with_response("job/7", CannedResponse::ok(json!({"status": "pending"})));

            let url = Url::parse("https://example.com/api/job/7").unwrap();
            let result: serde_json::Value = backend.get_json(&url).await.unwrap();

            assert_eq!(result["status"], "pending");
            assert!(backend.requests()[0].body.is_none());
        }

        #[tokio::test]
        async fn test_fake_backend_returns_404_for_unknown_url() {
            let backend = FakeBackend::new();
            let url = Url::parse("https://example.com/unknown").unwrap();

            let result: ClientResult<serde_json::Value> = backend.get_json(&url).await;
            assert!(matches!(
                result,
                Err(ClientError::ApiRequestFailed { status: 404, .. })
            ));
        }

        #[tokio::test]
        async fn test_fake_backend_records_posted_body() {
            let backend = FakeBackend::new()
                .with_response("start-stream", CannedResponse::ok(json!({"cached": false})));
            let url = Url::parse("https://example.com/start-stream").unwrap();

            let _: serde_json::Value = backend
                .post_json(&url, &json!({"text": "hello"}))
                .await
                .unwrap();

            let requests = backend.requests();
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0].body, Some(json!({"text": "hello"})));
        }
    }
}
