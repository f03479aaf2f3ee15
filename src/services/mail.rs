//! Outbound mail capability.
//!
//! Delivery is an opaque capability: callers hand over a [`MailMessage`] and
//! the configured [`Mailer`] decides what to do with it.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Error)]
#[error("Mail delivery failed: {0}")]
pub struct MailError(pub String);

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// Writes each message as a tracing event instead of delivering it
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        tracing::info!(to = %message.to, subject = %message.subject, "Outbound mail queued");
        Ok(())
    }
}

/// Keeps sent messages in memory
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl MemoryMailer {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        self.sent
            .lock()
            .map_err(|_| MailError("mailbox poisoned".to_string()))?
            .push(message);
        Ok(())
    }
}

/// Welcome message for a teacher account created by an institute
pub fn teacher_welcome(email: &str, plain_password: &str, institute_number: i64) -> MailMessage {
    MailMessage {
        to: email.to_string(),
        subject: "Welcome to EduFlow".to_string(),
        text: format!(
            "You've been registered as a teacher.\n\nEmail: {}\nPassword: {}\nInstitute Number: {}\n\nPlease change your password after first login.",
            email, plain_password, institute_number
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_mailer_records_messages() {
        let mailer = MemoryMailer::default();
        mailer.send(teacher_welcome("t@school.test", "pw123", 42)).await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "t@school.test");
        assert!(sent[0].text.contains("Password: pw123"));
        assert!(sent[0].text.contains("Institute Number: 42"));
    }

    #[tokio::test]
    async fn log_mailer_accepts_everything() {
        assert!(LogMailer.send(teacher_welcome("a@b.c", "x", 1)).await.is_ok());
    }
}
