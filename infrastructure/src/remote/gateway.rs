//! HTTP implementation of the [`InferenceGateway`] port.

use super::error::{RemoteError, Result};
use super::sse;
use async_trait::async_trait;
use distill_application::{GatewayError, GenerationJob, HealthStatus, InferenceGateway, PushChannel};
use distill_domain::ClientId;
use reqwest::header::{ACCEPT, HeaderValue};
use std::time::Duration;
use tracing::debug;

const EVENT_STREAM: &str = "text/event-stream";

/// Service address split the way the service mounts its routes: the
/// health check lives at the root, everything else under the API prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoints {
    base_url: String,
    api_prefix: String,
}

impl ServiceEndpoints {
    pub fn new(base_url: &str, api_prefix: &str) -> Self {
        let prefix = api_prefix.trim().trim_matches('/');
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            api_prefix: if prefix.is_empty() {
                String::new()
            } else {
                format!("/{prefix}")
            },
        }
    }

    pub fn stream_url(&self, client_id: &ClientId) -> String {
        format!("{}{}/stream/{}", self.base_url, self.api_prefix, client_id)
    }

    pub fn generate_url(&self) -> String {
        format!("{}{}/generate", self.base_url, self.api_prefix)
    }

    pub fn health_url(&self) -> String {
        format!("{}/", self.base_url)
    }
}

/// Inference gateway over `reqwest`.
///
/// Only the connect phase is bounded by the client; a stream may stay open
/// for as long as the service keeps generating.
pub struct HttpInferenceGateway {
    http: reqwest::Client,
    endpoints: ServiceEndpoints,
}

impl HttpInferenceGateway {
    pub fn new(endpoints: ServiceEndpoints, connect_timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder.build().map_err(RemoteError::ClientBuild)?;
        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &ServiceEndpoints {
        &self.endpoints
    }

    async fn open(&self, client_id: &ClientId) -> Result<PushChannel> {
        let url = self.endpoints.stream_url(client_id);
        debug!("Opening event stream {}", url);

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, HeaderValue::from_static(EVENT_STREAM))
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(&e))?;

        if !response.status().is_success() {
            return Err(RemoteError::from_response(response).await);
        }

        Ok(sse::push_channel(response.bytes_stream()))
    }

    async fn submit(&self, job: &GenerationJob) -> Result<()> {
        let url = self.endpoints.generate_url();
        debug!("Submitting job {} to {}", job.client_id, url);

        let response = self
            .http
            .post(&url)
            .json(job)
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(&e))?;

        if !response.status().is_success() {
            return Err(RemoteError::from_response(response).await);
        }
        Ok(())
    }

    async fn health(&self) -> Result<HealthStatus> {
        let response = self
            .http
            .get(self.endpoints.health_url())
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(&e))?;

        if !response.status().is_success() {
            return Err(RemoteError::from_response(response).await);
        }
        response
            .json::<HealthStatus>()
            .await
            .map_err(|e| RemoteError::from_reqwest(&e))
    }
}

#[async_trait]
impl InferenceGateway for HttpInferenceGateway {
    async fn open_stream(&self, client_id: &ClientId) -> std::result::Result<PushChannel, GatewayError> {
        self.open(client_id).await.map_err(GatewayError::from)
    }

    async fn submit_job(&self, job: &GenerationJob) -> std::result::Result<(), GatewayError> {
        self.submit(job).await.map_err(GatewayError::from)
    }

    async fn health_check(&self) -> std::result::Result<HealthStatus, GatewayError> {
        self.health().await.map_err(GatewayError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use distill_application::ChannelEvent;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accept one connection, capture the request, reply with `response`.
    async fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{addr}"), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    fn http_response(status: &str, content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn gateway(base_url: &str) -> HttpInferenceGateway {
        HttpInferenceGateway::new(
            ServiceEndpoints::new(base_url, "/api/v1"),
            Some(Duration::from_secs(5)),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_urls() {
        let endpoints = ServiceEndpoints::new("http://localhost:8000/", "api/v1/");
        let client_id = ClientId::new("abc-123");

        assert_eq!(
            endpoints.stream_url(&client_id),
            "http://localhost:8000/api/v1/stream/abc-123"
        );
        assert_eq!(endpoints.generate_url(), "http://localhost:8000/api/v1/generate");
        assert_eq!(endpoints.health_url(), "http://localhost:8000/");
    }

    #[test]
    fn test_empty_prefix() {
        let endpoints = ServiceEndpoints::new("http://svc", "");
        assert_eq!(endpoints.generate_url(), "http://svc/generate");
    }

    #[tokio::test]
    async fn test_submit_job_posts_wire_body() {
        let (base, server) =
            serve_once(http_response("200 OK", "application/json", r#"{"status":"ok"}"#)).await;

        let job = GenerationJob::new("hello", "C1", ClientId::new("c-1"));
        gateway(&base).submit_job(&job).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/v1/generate "));
        let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"prompt": "hello", "context": "C1", "client_id": "c-1"})
        );
    }

    #[tokio::test]
    async fn test_submit_job_rejects_non_success() {
        let (base, _server) = serve_once(http_response(
            "422 Unprocessable Entity",
            "application/json",
            r#"{"detail":"missing prompt"}"#,
        ))
        .await;

        let job = GenerationJob::new("", "C1", ClientId::new("c-1"));
        let err = gateway(&base).submit_job(&job).await.unwrap_err();

        assert_eq!(
            err,
            GatewayError::HttpStatus {
                status: 422,
                body: r#"{"detail":"missing prompt"}"#.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_open_stream_reads_events() {
        let body = "data: {\"token\": \"Hi\"}\n\ndata: {\"event\": \"end\"}\n\n";
        let (base, server) = serve_once(http_response("200 OK", EVENT_STREAM, body)).await;

        let mut channel = gateway(&base)
            .open_stream(&ClientId::new("c-9"))
            .await
            .unwrap();

        assert_eq!(
            channel.next_event().await,
            Some(ChannelEvent::Data(r#"{"token": "Hi"}"#.to_string()))
        );
        assert_eq!(
            channel.next_event().await,
            Some(ChannelEvent::Data(r#"{"event": "end"}"#.to_string()))
        );
        assert_eq!(channel.next_event().await, None);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/v1/stream/c-9 "));
        assert!(request.to_ascii_lowercase().contains("accept: text/event-stream"));
    }

    #[tokio::test]
    async fn test_open_stream_not_found() {
        let (base, _server) =
            serve_once(http_response("404 Not Found", "text/plain", "no route")).await;

        let err = gateway(&base)
            .open_stream(&ClientId::new("c-9"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_health_check() {
        let (base, server) = serve_once(http_response(
            "200 OK",
            "application/json",
            r#"{"status":"healthy"}"#,
        ))
        .await;

        let status = gateway(&base).health_check().await.unwrap();
        assert!(status.is_healthy());
        assert!(server.await.unwrap().starts_with("GET / "));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = gateway(&base).health_check().await.unwrap_err();
        assert!(matches!(err, GatewayError::ConnectionError(_)));
    }
}
