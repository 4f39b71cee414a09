//! Pipeline API endpoints

use async_trait::async_trait;
use pipesync_core::PipelineId;
use pipesync_core::payload::Payload;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::PipelineClient;
use crate::error::{ClientError, Result};

/// Operations the reconciliation needs from the remote pipeline resource
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Fetch a pipeline; `None` when the remote answers 404
    async fn get(&self, id: &PipelineId) -> Result<Option<JsonValue>>;

    /// Create a pipeline; only 201 counts as success
    async fn create(&self, payload: Payload) -> Result<()>;

    /// Replace an existing pipeline; only 200 counts as success
    async fn update(&self, payload: Payload, id: &PipelineId) -> Result<()>;
}

#[async_trait]
impl PipelineApi for PipelineClient {
    async fn get(&self, id: &PipelineId) -> Result<Option<JsonValue>> {
        let url = self.pipeline_url(Some(id.as_str()));
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = Self::error_body(response).await;
            return Err(ClientError::RemoteUnexpected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    async fn create(&self, payload: Payload) -> Result<()> {
        let url = self.pipeline_url(None);
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .multipart(into_form(payload))
            .send()
            .await?;

        self.expect_status(response, StatusCode::CREATED, "Creating")
            .await
    }

    async fn update(&self, payload: Payload, id: &PipelineId) -> Result<()> {
        let url = self.pipeline_url(Some(id.as_str()));
        debug!("PUT {}", url);
        let response = self
            .client
            .put(&url)
            .multipart(into_form(payload))
            .send()
            .await?;

        self.expect_status(response, StatusCode::OK, "Updating")
            .await
    }
}

impl PipelineClient {
    /// Accept exactly `expected`; anything else is a rejection
    ///
    /// A warning is logged before the error is returned.
    async fn expect_status(
        &self,
        response: reqwest::Response,
        expected: StatusCode,
        operation: &'static str,
    ) -> Result<()> {
        let status = response.status();
        if status == expected {
            return Ok(());
        }

        warn!(
            "{} call returned non {} response: {}",
            operation,
            expected.as_u16(),
            status.as_u16()
        );

        let body = Self::error_body(response).await;
        Err(ClientError::RemoteRejected {
            operation,
            status: status.as_u16(),
            body,
        })
    }
}

/// Turn payload parts into a multipart form, keeping their order
fn into_form(payload: Payload) -> Form {
    payload.parts.into_iter().fold(Form::new(), |form, part| {
        form.part(part.name, Part::bytes(part.bytes).file_name(part.file_name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipesync_core::payload::Part as PayloadPart;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Answer a single request with a fixed status and body
    ///
    /// Returns the base URL to point a client at and a handle yielding the
    /// raw request that was received.
    async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {} Fixture\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });

        (format!("http://{}", addr), handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if request_complete(&buf) {
                break;
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn request_complete(buf: &[u8]) -> bool {
        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
        let body = &buf[head_end + 4..];

        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok());

        match content_length {
            Some(len) => body.len() >= len,
            None if head.contains("transfer-encoding: chunked") => body.ends_with(b"0\r\n\r\n"),
            None => true,
        }
    }

    fn id() -> PipelineId {
        PipelineId::parse("Org/Repo").unwrap()
    }

    fn payload() -> Payload {
        Payload {
            parts: vec![PayloadPart {
                name: "pipeline".to_string(),
                file_name: "pipeline.yaml".to_string(),
                bytes: b"id: Org-Repo\n".to_vec(),
            }],
        }
    }

    #[test]
    fn test_into_form_has_boundary() {
        let payload = Payload {
            parts: vec![
                PayloadPart {
                    name: "pipeline".to_string(),
                    file_name: "pipeline.yaml".to_string(),
                    bytes: b"id: p\n".to_vec(),
                },
                PayloadPart {
                    name: "s.js".to_string(),
                    file_name: "s.js".to_string(),
                    bytes: b"function handleRequest() {}".to_vec(),
                },
            ],
        };

        let form = into_form(payload);
        assert!(!form.boundary().is_empty());
    }

    #[tokio::test]
    async fn test_get_unreachable_host_is_request_error() {
        let client = PipelineClient::with_timeout(
            "http://127.0.0.1:9",
            std::time::Duration::from_millis(500),
        )
        .unwrap();

        let err = client.get(&id()).await.unwrap_err();
        assert!(matches!(err, ClientError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn test_get_not_found_is_absent() {
        let (url, server) = serve_once(404, "").await;
        let client = PipelineClient::new(url);

        let found = client.get(&id()).await.unwrap();

        assert!(found.is_none());
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /_pipeline/Org-Repo HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_get_existing_returns_document() {
        let (url, server) = serve_once(200, r#"{"id":"Org-Repo"}"#).await;
        let client = PipelineClient::new(url);

        let found = client.get(&id()).await.unwrap().unwrap();

        assert_eq!(found["id"], "Org-Repo");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_get_server_error_is_unexpected() {
        let (url, server) = serve_once(500, "oops").await;
        let client = PipelineClient::new(url);

        let err = client.get(&id()).await.unwrap_err();

        match err {
            ClientError::RemoteUnexpected { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_create_accepts_created() {
        let (url, server) = serve_once(201, "").await;
        let client = PipelineClient::new(url);

        client.create(payload()).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /_pipeline HTTP/1.1"));
        assert!(request.contains(r#"name="pipeline""#));
        assert!(request.contains("id: Org-Repo"));
    }

    #[tokio::test]
    async fn test_create_rejects_plain_ok() {
        let (url, server) = serve_once(200, "").await;
        let client = PipelineClient::new(url);

        let err = client.create(payload()).await.unwrap_err();

        match err {
            ClientError::RemoteRejected {
                operation, status, ..
            } => {
                assert_eq!(operation, "Creating");
                assert_eq!(status, 200);
            }
            other => panic!("unexpected error: {other}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_update_accepts_ok() {
        let (url, server) = serve_once(200, "").await;
        let client = PipelineClient::new(url);

        client.update(payload(), &id()).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("PUT /_pipeline/Org-Repo HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_update_rejects_created() {
        let (url, server) = serve_once(201, "").await;
        let client = PipelineClient::new(url);

        let err = client.update(payload(), &id()).await.unwrap_err();

        match err {
            ClientError::RemoteRejected {
                operation, status, ..
            } => {
                assert_eq!(operation, "Updating");
                assert_eq!(status, 201);
            }
            other => panic!("unexpected error: {other}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_rejection_keeps_plain_text_body() {
        let (url, server) = serve_once(400, "not json at all").await;
        let client = PipelineClient::new(url);

        let err = client.update(payload(), &id()).await.unwrap_err();

        match err {
            ClientError::RemoteRejected { status, body, .. } => {
                assert_eq!(status, 400);
                assert_eq!(body, "not json at all");
            }
            other => panic!("unexpected error: {other}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_rejection_compacts_json_body() {
        let (url, server) = serve_once(400, "{ \"error\": \"bad stage\" }").await;
        let client = PipelineClient::new(url);

        let err = client.create(payload()).await.unwrap_err();

        match err {
            ClientError::RemoteRejected { body, .. } => {
                assert_eq!(body, r#"{"error":"bad stage"}"#);
            }
            other => panic!("unexpected error: {other}"),
        }
        server.await.unwrap();
    }
}
