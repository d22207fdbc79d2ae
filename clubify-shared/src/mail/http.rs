/// HTTP mail relay
///
/// Posts each [`OutgoingEmail`] as JSON to the configured endpoint, with
/// `Authorization: Bearer <api key>` when a key is set. Any 2xx response
/// counts as accepted.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::{MailError, Mailer, OutgoingEmail};

/// Longest relay error body kept for logs
const MAX_ERROR_BODY: usize = 512;

pub struct HttpMailer {
    client: Client,
    url: reqwest::Url,
    api_key: Option<String>,
}

impl HttpMailer {
    pub fn new(url: &str, api_key: Option<String>, timeout_seconds: u64) -> Result<Self, MailError> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| MailError::Config(format!("invalid relay url '{url}': {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| MailError::Config(e.to_string()))?;

        Ok(Self {
            client,
            url,
            api_key: api_key.filter(|key| !key.is_empty()),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let mut request = self.client.post(self.url.clone()).json(email);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), subject = %email.subject, "Relay accepted e-mail");
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        truncate_on_char_boundary(&mut body, MAX_ERROR_BODY);

        warn!(status = status.as_u16(), body = %body, "Relay rejected e-mail");
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Shortens `body` to at most `max` bytes without splitting a character
fn truncate_on_char_boundary(body: &mut String, max: usize) {
    if body.len() <= max {
        return;
    }

    let mut cut = max;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    body.truncate(cut);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::{compose, Sender};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    fn email() -> OutgoingEmail {
        compose(
            &Sender {
                name: "Sam".to_string(),
                email: "sam@example.com".to_string(),
            },
            "lead@example.com",
            "Hi",
            "Hello",
            "noreply@clubify.app",
        )
    }

    /// True once the headers and `Content-Length` bytes of body have arrived
    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(end) = text.find("\r\n\r\n") else {
            return false;
        };

        let length = text[..end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        raw.len() >= end + 4 + length
    }

    /// Local relay answering a single request; the handle yields the raw request
    async fn relay(status: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/send", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&request) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request).into_owned()
        });

        (url, handle)
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let result = HttpMailer::new("not a url", None, 5);
        assert!(matches!(result, Err(MailError::Config(_))));
    }

    #[test]
    fn test_empty_api_key_is_dropped() {
        let mailer = HttpMailer::new("https://relay.example.com/send", Some(String::new()), 5).unwrap();
        assert!(mailer.api_key.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_transport_error() {
        let mailer = HttpMailer::new("http://127.0.0.1:1/send", None, 2).unwrap();

        let result = mailer.send(&email()).await;
        assert!(matches!(result, Err(MailError::Transport(_))));
    }

    #[tokio::test]
    async fn test_accepted_with_bearer_key() {
        let (url, handle) = relay("202 Accepted", String::new()).await;
        let mailer = HttpMailer::new(&url, Some("relay-key".to_string()), 5).unwrap();

        mailer.send(&email()).await.unwrap();

        let request = handle.await.unwrap();
        assert!(request.starts_with("POST /send HTTP/1.1"));
        assert!(request
            .to_lowercase()
            .contains("authorization: bearer relay-key"));
        assert!(request.contains(r#""replyTo":{"name":"Sam","email":"sam@example.com"}"#));
        assert!(request.contains(r#""subject":"Hi""#));
    }

    #[tokio::test]
    async fn test_error_status_is_rejected() {
        let (url, handle) = relay("500 Internal Server Error", "relay exploded".to_string()).await;
        let mailer = HttpMailer::new(&url, None, 5).unwrap();

        let result = mailer.send(&email()).await;
        match result {
            Err(MailError::Rejected { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "relay exploded");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }

        let request = handle.await.unwrap();
        assert!(!request.to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_long_error_body_is_cut() {
        let (url, handle) = relay("400 Bad Request", "€".repeat(300)).await;
        let mailer = HttpMailer::new(&url, None, 5).unwrap();

        let Err(MailError::Rejected { body, .. }) = mailer.send(&email()).await else {
            panic!("expected Rejected");
        };
        assert!(body.len() <= MAX_ERROR_BODY);
        assert!(body.chars().all(|c| c == '€'));
        handle.await.unwrap();
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        // 3-byte characters: 512 falls inside one, so the cut moves back to 510
        let mut body = "€".repeat(200);
        truncate_on_char_boundary(&mut body, 512);
        assert_eq!(body.len(), 510);

        let mut short = "ok".to_string();
        truncate_on_char_boundary(&mut short, 512);
        assert_eq!(short, "ok");
    }
}
