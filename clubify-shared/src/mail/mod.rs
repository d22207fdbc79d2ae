/// Outgoing e-mail
///
/// Members can e-mail leads and board members through the API. The message
/// goes out from "<sender> via Clubify" with `Reply-To` set to the sender,
/// so replies reach the sender directly.
///
/// Delivery is behind the [`Mailer`] trait:
///
/// - [`http::HttpMailer`]: posts JSON to an HTTP mail relay
/// - [`log::LogMailer`]: logs the message and delivers nothing (development)
///
/// # Example
///
/// ```no_run
/// use clubify_shared::mail::{compose, from_settings, MailSettings, Sender};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = from_settings(&MailSettings::default())?;
///
/// let email = compose(
///     &Sender { name: "Sam".into(), email: "sam@example.com".into() },
///     "lead@example.com",
///     "Budget",
///     "Can we talk about the budget?",
///     "noreply@clubify.app",
/// );
/// mailer.send(&email).await?;
/// # Ok(())
/// # }
/// ```

pub mod http;
pub mod log;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Product name appended to the sender's display name
pub const APP_NAME: &str = "Clubify";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail relay is misconfigured: {0}")]
    Config(String),

    #[error("Mail relay unreachable: {0}")]
    Transport(String),

    #[error("Mail relay rejected the message with status {status}")]
    Rejected { status: u16, body: String },
}

/// Name and address pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
}

/// The user on whose behalf a message is sent
#[derive(Debug, Clone)]
pub struct Sender {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingEmail {
    pub from: Address,
    pub to: Vec<Address>,
    pub reply_to: Address,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Relay settings, usually from the API configuration
#[derive(Debug, Clone)]
pub struct MailSettings {
    /// Relay endpoint; `None` selects the logging mailer
    pub relay_url: Option<String>,

    pub api_key: Option<String>,

    /// Envelope sender address
    pub from_address: String,

    pub timeout_seconds: u64,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            relay_url: None,
            api_key: None,
            from_address: "noreply@clubify.app".to_string(),
            timeout_seconds: 10,
        }
    }
}

/// Builds the mailer the settings describe
pub fn from_settings(settings: &MailSettings) -> Result<Arc<dyn Mailer>, MailError> {
    match settings.relay_url.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) => Ok(Arc::new(http::HttpMailer::new(
            url,
            settings.api_key.clone(),
            settings.timeout_seconds,
        )?)),
        None => Ok(Arc::new(log::LogMailer)),
    }
}

/// Escapes text for inclusion in HTML
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Builds the message a user sends to a lead or board member
pub fn compose(
    sender: &Sender,
    recipient_email: &str,
    subject: &str,
    message: &str,
    from_address: &str,
) -> OutgoingEmail {
    let name = escape_html(&sender.name);
    let email = escape_html(&sender.email);
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #e0e0e0; border-radius: 8px;">
  <div style="background-color: #4F46E5; color: white; padding: 20px; border-radius: 8px 8px 0 0;">
    <h2 style="margin: 0;">New Message from {APP_NAME}</h2>
  </div>
  <div style="padding: 20px; background-color: #f9fafb;">
    <p style="font-size: 14px; color: #6b7280;"><strong>From:</strong> {name} ({email})</p>
    <p style="font-size: 14px; color: #6b7280;"><strong>Subject:</strong> {subject}</p>
    <div style="background-color: white; padding: 20px; border-radius: 8px; border-left: 4px solid #4F46E5;">
      <p style="font-size: 16px; line-height: 1.6; color: #1f2937; white-space: pre-wrap;">{message}</p>
    </div>
  </div>
  <div style="padding: 20px; background-color: #f3f4f6; text-align: center; border-radius: 0 0 8px 8px;">
    <p style="color: #6b7280; font-size: 12px; margin: 0;">This message was sent via {APP_NAME}<br>Reply directly to this email to respond to {name}</p>
  </div>
</div>"#,
        subject = escape_html(subject),
        message = escape_html(message),
    );

    OutgoingEmail {
        from: Address {
            name: Some(format!("{} via {APP_NAME}", sender.name)),
            email: from_address.to_string(),
        },
        to: vec![Address {
            name: None,
            email: recipient_email.to_string(),
        }],
        reply_to: Address {
            name: Some(sender.name.clone()),
            email: sender.email.clone(),
        },
        subject: subject.to_string(),
        text: message.to_string(),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> Sender {
        Sender {
            name: "Sam <Member>".to_string(),
            email: "sam@example.com".to_string(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_compose_headers() {
        let email = compose(&sender(), "lead@example.com", "Hi", "Hello", "noreply@clubify.app");

        assert_eq!(email.from.name.as_deref(), Some("Sam <Member> via Clubify"));
        assert_eq!(email.from.email, "noreply@clubify.app");
        assert_eq!(email.reply_to.email, "sam@example.com");
        assert_eq!(email.to.len(), 1);
        assert_eq!(email.to[0].email, "lead@example.com");
        assert_eq!(email.text, "Hello");
    }

    #[test]
    fn test_compose_escapes_user_text_in_html() {
        let email = compose(
            &sender(),
            "lead@example.com",
            "<script>",
            "1 < 2 & 3 > 2",
            "noreply@clubify.app",
        );

        assert!(email.html.contains("1 &lt; 2 &amp; 3 &gt; 2"));
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(email.html.contains("Sam &lt;Member&gt;"));
        assert!(!email.html.contains("<script>"));

        // The plain-text part is sent verbatim
        assert_eq!(email.text, "1 < 2 & 3 > 2");
    }

    #[test]
    fn test_wire_format() {
        let email = compose(&sender(), "lead@example.com", "Hi", "Hello", "noreply@clubify.app");
        let json = serde_json::to_value(&email).unwrap();

        assert_eq!(json["replyTo"]["email"], "sam@example.com");
        assert!(json["to"][0].get("name").is_none());
    }

    #[test]
    fn test_from_settings_without_relay_logs() {
        let mailer = from_settings(&MailSettings::default()).unwrap();
        assert_eq!(mailer.name(), "log");

        let blank = MailSettings {
            relay_url: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(from_settings(&blank).unwrap().name(), "log");
    }

    #[test]
    fn test_from_settings_with_relay() {
        let settings = MailSettings {
            relay_url: Some("https://relay.example.com/send".to_string()),
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        assert_eq!(from_settings(&settings).unwrap().name(), "http");
    }
}
