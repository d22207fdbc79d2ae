/// Development mailer: logs instead of delivering

use async_trait::async_trait;
use tracing::info;

use super::{MailError, Mailer, OutgoingEmail};

pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let recipients: Vec<&str> = email.to.iter().map(|to| to.email.as_str()).collect();

        info!(
            to = ?recipients,
            reply_to = %email.reply_to.email,
            subject = %email.subject,
            "No mail relay configured; e-mail logged, not delivered"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::{compose, Sender};

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let email = compose(
            &Sender {
                name: "Sam".to_string(),
                email: "sam@example.com".to_string(),
            },
            "lead@example.com",
            "Hi",
            "Hello",
            "noreply@clubify.app",
        );

        assert!(LogMailer.send(&email).await.is_ok());
    }
}
