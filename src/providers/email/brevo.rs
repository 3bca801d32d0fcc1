//! Brevo transactional email API provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::traits::{MailTransport, OutgoingEmail, ProviderError, Result, SendReceipt};
use crate::config::{ApiKey, DEFAULT_API_URL};

/// Brevo send request format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoRequest<'a> {
    sender: BrevoContact<'a>,
    to: Vec<BrevoContact<'a>>,
    subject: &'a str,
    html_content: &'a str,
    text_content: &'a str,
}

#[derive(Debug, Serialize)]
struct BrevoContact<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    email: &'a str,
}

impl<'a> From<&'a OutgoingEmail> for BrevoRequest<'a> {
    fn from(email: &'a OutgoingEmail) -> Self {
        Self {
            sender: BrevoContact {
                name: Some(email.sender_name.as_str()),
                email: &email.from,
            },
            to: vec![BrevoContact {
                name: None,
                email: email.to.as_str(),
            }],
            subject: &email.subject,
            html_content: &email.body_html,
            text_content: &email.body_text,
        }
    }
}

/// Brevo success response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrevoResponse {
    message_id: Option<String>,
}

/// Brevo error response.
#[derive(Debug, Deserialize)]
struct BrevoError {
    code: Option<String>,
    message: Option<String>,
}

/// Provider for Brevo's `POST /v3/smtp/email` endpoint.
pub struct BrevoProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<ApiKey>,
}

impl BrevoProvider {
    /// Creates a provider against the public Brevo endpoint.
    pub fn new(api_key: Option<ApiKey>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: DEFAULT_API_URL.to_string(),
            api_key,
        }
    }

    /// Overrides the endpoint URL.
    pub fn with_endpoint(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Rebuilds the HTTP client with a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::InvalidRequest(format!("http client: {}", e)))?;
        Ok(self)
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ProviderError::Authentication("Brevo API key not configured".into()))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "api-key",
            HeaderValue::from_str(key.expose())
                .map_err(|_| ProviderError::InvalidRequest("API key is not a valid header".into()))?,
        );
        Ok(headers)
    }

    async fn handle_error(&self, response: reqwest::Response) -> ProviderError {
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response.text().await.unwrap_or_default();

        let message = match serde_json::from_str::<BrevoError>(&body) {
            Ok(BrevoError {
                code: Some(code),
                message: Some(message),
            }) => format!("{}: {}", code, message),
            Ok(BrevoError {
                message: Some(message),
                ..
            }) => message,
            _ if body.is_empty() => format!("HTTP {}", status),
            _ => body,
        };

        match status {
            401 | 403 => ProviderError::Authentication(message),
            429 => ProviderError::RateLimited {
                retry_after_secs: retry_after,
            },
            _ => ProviderError::Provider { status, message },
        }
    }
}

#[async_trait]
impl MailTransport for BrevoProvider {
    fn name(&self) -> &str {
        "brevo"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<SendReceipt> {
        let headers = self.build_headers()?;
        let body = BrevoRequest::from(email);

        let response = self
            .client
            .post(&self.api_url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.handle_error(response).await);
        }

        // Brevo answers 201 with {"messageId": ...}; an unreadable body is
        // still an accepted message.
        let parsed: BrevoResponse = response.json().await.unwrap_or_default();
        tracing::debug!(recipient = %email.to, message_id = ?parsed.message_id, "Email accepted by Brevo");

        Ok(SendReceipt {
            message_id: parsed.message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use crate::domain::{Address, MessageDraft};

    fn outgoing() -> OutgoingEmail {
        let draft = MessageDraft::new("Hi\nthere");
        OutgoingEmail {
            sender_name: "Smart Send".to_string(),
            from: "me@example.com".to_string(),
            to: Address::parse("you@example.com").unwrap(),
            subject: "Message from Smart Send".to_string(),
            body_text: draft.text_content().to_string(),
            body_html: draft.html_content(),
        }
    }

    #[test]
    fn request_serialization() {
        let email = outgoing();
        let json = serde_json::to_value(BrevoRequest::from(&email)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "sender": {"name": "Smart Send", "email": "me@example.com"},
                "to": [{"email": "you@example.com"}],
                "subject": "Message from Smart Send",
                "htmlContent": "<p>Hi<br>there</p>",
                "textContent": "Hi\nthere"
            })
        );
    }

    #[test]
    fn response_parsing() {
        let parsed: BrevoResponse =
            serde_json::from_str(r#"{"messageId": "<abc@smtp-relay.mailin.fr>"}"#).unwrap();
        assert_eq!(
            parsed.message_id,
            Some("<abc@smtp-relay.mailin.fr>".to_string())
        );
    }

    #[test]
    fn headers_carry_api_key() {
        let provider = BrevoProvider::new(ApiKey::new("xkeysib-123"));
        let headers = provider.build_headers().unwrap();
        assert_eq!(headers.get("api-key").unwrap(), "xkeysib-123");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn unconfigured_provider() {
        let provider = BrevoProvider::new(None);
        assert!(!provider.is_configured());
        assert!(matches!(
            provider.build_headers(),
            Err(ProviderError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn send_without_key_fails_before_network() {
        let provider = BrevoProvider::new(None).with_endpoint("http://127.0.0.1:9/unused");
        let result = provider.send(&outgoing()).await;
        assert!(matches!(result, Err(ProviderError::Authentication(_))));
    }

    /// One-shot HTTP server on a loopback port. Answers the first request
    /// with the given status line, extra headers and body, and hands back
    /// the raw request it received.
    async fn stub(
        status: &'static str,
        extra_headers: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/v3/smtp/email", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(stream);

            let mut request = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).await.unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                let done = line == "\r\n" || line.is_empty();
                request.push_str(&line);
                if done {
                    break;
                }
            }
            let mut payload = vec![0; content_length];
            reader.read_exact(&mut payload).await.unwrap();
            request.push_str(&String::from_utf8_lossy(&payload));

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n{}\r\n{}",
                status,
                body.len(),
                extra_headers,
                body
            );
            let stream = reader.get_mut();
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.flush().await.unwrap();
            request
        });

        (url, handle)
    }

    fn provider(url: &str) -> BrevoProvider {
        BrevoProvider::new(ApiKey::new("xkeysib-test"))
            .with_endpoint(url)
            .with_timeout(Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn accepted_message_returns_receipt() {
        let (url, server) = stub("201 Created", "", r#"{"messageId":"<abc@smtp-relay>"}"#).await;

        let receipt = provider(&url).send(&outgoing()).await.unwrap();
        assert_eq!(receipt.message_id, Some("<abc@smtp-relay>".to_string()));

        let request = server.await.unwrap();
        let lowered = request.to_ascii_lowercase();
        assert!(lowered.starts_with("post /v3/smtp/email http/1.1"));
        assert!(lowered.contains("api-key: xkeysib-test"));
        assert!(request.contains(r#""to":[{"email":"you@example.com"}]"#));
    }

    #[tokio::test]
    async fn bad_request_carries_code_and_message() {
        let (url, server) = stub(
            "400 Bad Request",
            "",
            r#"{"code":"invalid_parameter","message":"email is not valid"}"#,
        )
        .await;

        let err = provider(&url).send(&outgoing()).await.unwrap_err();
        match err {
            ProviderError::Provider { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "invalid_parameter: email is not valid");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unauthorized_is_authentication_error() {
        let (url, server) = stub(
            "401 Unauthorized",
            "",
            r#"{"code":"unauthorized","message":"Key not found"}"#,
        )
        .await;

        let err = provider(&url).send(&outgoing()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Authentication(ref m) if m == "unauthorized: Key not found"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn too_many_requests_reads_retry_after() {
        let (url, server) = stub("429 Too Many Requests", "retry-after: 7\r\n", "{}").await;

        let err = provider(&url).send(&outgoing()).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::RateLimited {
                retry_after_secs: Some(7)
            }
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/v3/smtp/email", listener.local_addr().unwrap());
        drop(listener);

        let err = provider(&url).send(&outgoing()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Connection(_)));
    }

    #[test]
    fn builder_methods() {
        let provider = provider("http://localhost:8080/v3/smtp/email");
        assert_eq!(provider.api_url, "http://localhost:8080/v3/smtp/email");
        assert_eq!(provider.name(), "brevo");
        assert!(provider.is_configured());
    }
}
