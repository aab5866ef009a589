#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trustvote_interface::services::storage::{ContentStorage, PhotoFile};
use trustvote_interface::ContentId;

/// Runtime configuration for the Pinata storage service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PinataConfig {
    /// The JWT used to authenticate uploads.
    pub pinata_jwt: String,
    /// The file upload endpoint.
    #[serde(default = "default_upload_url")]
    pub upload_url: String,
    /// The gateway used to turn content addresses into URLs.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    /// The timeout for an upload request, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_upload_url() -> String {
    "https://uploads.pinata.cloud/v3/files".into()
}

fn default_gateway_url() -> String {
    "https://gateway.pinata.cloud".into()
}

const fn default_timeout_seconds() -> u64 {
    60
}

/// Errors returned by [`PinataService`].
#[derive(Debug, Error)]
pub enum PinataError {
    /// The request could not be sent or its response could not be read.
    #[error("pinata request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Pinata answered with a non-success status.
    #[error("pinata returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },
    /// The upload succeeded but no content address came back.
    #[error("pinata returned an empty content address for {0}")]
    MissingCid(String),
    /// An empty content address cannot be resolved.
    #[error("cannot resolve an empty content address")]
    EmptyCid,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: UploadedFile,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    cid: String,
}

/// Uploads photos to Pinata and resolves them through a gateway.
#[derive(Debug, Clone)]
pub struct PinataService {
    client: reqwest::Client,
    jwt: String,
    upload_url: String,
    gateway_url: String,
}

impl PinataService {
    /// Creates a new service from `config`.
    pub fn new(config: PinataConfig) -> Result<Self, PinataError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a new service around an existing HTTP client.
    pub fn with_client(client: reqwest::Client, config: PinataConfig) -> Self {
        Self {
            client,
            jwt: config.pinata_jwt,
            upload_url: config.upload_url,
            gateway_url: normalize_gateway(&config.gateway_url),
        }
    }
}

/// Accepts both bare gateway domains and full URLs.
fn normalize_gateway(gateway: &str) -> String {
    let gateway = gateway.trim_end_matches('/');
    if gateway.starts_with("http://") || gateway.starts_with("https://") {
        gateway.to_string()
    } else {
        format!("https://{gateway}")
    }
}

#[async_trait]
impl ContentStorage for PinataService {
    type Error = PinataError;

    async fn upload(&self, file: &PhotoFile) -> Result<ContentId, Self::Error> {
        let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().text("network", "public").part("file", part);

        let response = self
            .client
            .post(&self.upload_url)
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(error) => {
                    tracing::warn!(%status, %error, "Failed to read pinata error body");
                    String::new()
                }
            };
            return Err(PinataError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let uploaded: UploadResponse = response.json().await?;
        if uploaded.data.cid.is_empty() {
            return Err(PinataError::MissingCid(file.file_name.clone()));
        }
        tracing::debug!(cid = %uploaded.data.cid, file = %file.file_name, "Uploaded photo");
        Ok(ContentId(uploaded.data.cid))
    }

    async fn resolve_url(&self, cid: &ContentId) -> Result<String, Self::Error> {
        if cid.is_empty() {
            return Err(PinataError::EmptyCid);
        }
        Ok(format!("{}/ipfs/{}", self.gateway_url, cid))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use super::*;

    async fn setup_service() -> (MockServer, PinataService) {
        let mock_server = MockServer::start().await;
        let config = PinataConfig {
            pinata_jwt: "PINATA_JWT".to_string(),
            upload_url: format!("{}/v3/files", mock_server.uri()),
            gateway_url: "example.mypinata.cloud/".to_string(),
            timeout_seconds: 5,
        };
        let service = PinataService::new(config).unwrap();
        (mock_server, service)
    }

    #[test]
    fn config_defaults() {
        let config: PinataConfig = toml::from_str(r#"pinata_jwt = "abc""#).unwrap();
        assert_eq!(config.upload_url, default_upload_url());
        assert_eq!(config.gateway_url, "https://gateway.pinata.cloud");
        assert_eq!(config.timeout_seconds, 60);
    }

    #[tokio::test]
    async fn upload_sends_multipart_with_jwt() {
        let (mock_server, service) = setup_service().await;

        Mock::given(method("POST"))
            .and(path("/v3/files"))
            .and(bearer_token("PINATA_JWT"))
            .respond_with(|req: &Request| {
                let body = String::from_utf8_lossy(&req.body);
                assert!(body.contains("name=\"network\""));
                assert!(body.contains("filename=\"ada.png\""));
                ResponseTemplate::new(200).set_body_json(json!({
                    "data": {
                        "id": "0195f8d4",
                        "name": "ada.png",
                        "cid": "bafkreiada",
                        "size": 3
                    }
                }))
            })
            .expect(1)
            .mount(&mock_server)
            .await;

        let file = PhotoFile::new("ada.png", vec![1, 2, 3]).with_content_type("image/png");
        let cid = service.upload(&file).await.unwrap();
        assert_eq!(cid, ContentId("bafkreiada".to_string()));
    }

    #[tokio::test]
    async fn upload_surfaces_error_status() {
        let (mock_server, service) = setup_service().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&mock_server)
            .await;

        let err = service
            .upload(&PhotoFile::new("ada.png", vec![1]))
            .await
            .unwrap_err();
        match err {
            PinataError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "unauthorized");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn upload_rejects_empty_cid() {
        let (mock_server, service) = setup_service().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"cid": ""}})))
            .mount(&mock_server)
            .await;

        let err = service
            .upload(&PhotoFile::new("ada.png", vec![1]))
            .await
            .unwrap_err();
        assert!(matches!(err, PinataError::MissingCid(name) if name == "ada.png"));
    }

    #[tokio::test]
    async fn resolves_through_gateway() {
        let (_mock_server, service) = setup_service().await;
        let url = service
            .resolve_url(&ContentId("bafkreiada".to_string()))
            .await
            .unwrap();
        assert_eq!(url, "https://example.mypinata.cloud/ipfs/bafkreiada");
        assert!(matches!(
            service.resolve_url(&ContentId(String::new())).await,
            Err(PinataError::EmptyCid)
        ));
    }

    #[tokio::test]
    async fn truncated_error_body_still_reports_status() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            // Read the whole request so the client sees the response, not a reset.
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                request.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&request).to_lowercase();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let body_len = text[..head_end]
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|len| len.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + body_len {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            socket
                .write_all(b"HTTP/1.1 502 Bad Gateway\r\nContent-Length: 100\r\n\r\npartial")
                .await
                .unwrap();
        });

        let config = PinataConfig {
            pinata_jwt: "PINATA_JWT".to_string(),
            upload_url: format!("http://{addr}/v3/files"),
            gateway_url: default_gateway_url(),
            timeout_seconds: 5,
        };
        let service = PinataService::new(config).unwrap();
        let err = service
            .upload(&PhotoFile::new("ada.png", vec![1]))
            .await
            .unwrap_err();
        server.await.unwrap();
        match err {
            PinataError::Status { status, body } => {
                assert_eq!(status, 502);
                assert!(body.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
