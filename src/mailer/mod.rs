//! # Transactional Email
//!
//! Email delivery for account flows: the welcome mail on signup, the
//! password-reset token mail and the changed-password notification.
//!
//! Services depend on the [`EmailSender`] trait, so tests swap in
//! [`MockMailer`] and assert on what would have been sent.

pub mod errors;

use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::RESET_TOKEN_TTL_MINUTES;

pub use errors::{MailError, MailResult};

/// Mailer configuration
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// SMTP server host
    pub smtp_host: String,

    /// SMTP server port
    pub smtp_port: u16,

    /// SMTP username
    pub smtp_user: String,

    /// SMTP password (should come from secrets)
    pub smtp_password: String,

    /// From email address
    pub from_email: String,

    /// From name
    pub from_name: String,

    /// Base URL for links
    pub base_url: String,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_user: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@tourbase.local".to_string(),
            from_name: "Tourbase".to_string(),
            base_url: "http://localhost:3000".to_string(),
        }
    }
}

/// Outgoing email types
#[derive(Debug, Clone)]
pub enum OutgoingEmail {
    /// Welcome mail after signup
    Welcome { user_email: String, user_name: String },

    /// Password reset token
    PasswordReset { token: String, user_email: String },

    /// Password changed notification
    PasswordChanged { user_email: String },
}

impl OutgoingEmail {
    /// Recipient address
    pub fn recipient(&self) -> &str {
        match self {
            Self::Welcome { user_email, .. } => user_email,
            Self::PasswordReset { user_email, .. } => user_email,
            Self::PasswordChanged { user_email } => user_email,
        }
    }
}

/// Email sender trait for abstraction
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send an email
    async fn send(&self, email: OutgoingEmail) -> MailResult<()>;
}

/// Mock sender for testing
#[derive(Debug, Default)]
pub struct MockMailer {
    /// Sent emails (for testing)
    pub sent: std::sync::RwLock<Vec<OutgoingEmail>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sent emails
    pub fn sent_count(&self) -> usize {
        self.sent.read().unwrap().len()
    }

    /// Last sent email, if any
    pub fn last_sent(&self) -> Option<OutgoingEmail> {
        self.sent.read().unwrap().last().cloned()
    }

    /// Clear sent emails
    pub fn clear(&self) {
        self.sent.write().unwrap().clear();
    }
}

#[async_trait]
impl EmailSender for MockMailer {
    async fn send(&self, email: OutgoingEmail) -> MailResult<()> {
        self.sent.write().unwrap().push(email);
        Ok(())
    }
}

/// SMTP sender
pub struct SmtpMailer {
    config: MailerConfig,
}

impl SmtpMailer {
    pub fn new(config: MailerConfig) -> Self {
        Self { config }
    }

    fn render(&self, email: &OutgoingEmail) -> (String, String, String) {
        match email {
            OutgoingEmail::Welcome {
                user_email,
                user_name,
            } => {
                let subject = "Welcome to Tourbase!".to_string();
                let link = format!("{}/me", self.config.base_url);
                let body = format!(
                    "Hi {},\n\n\
                    Welcome aboard! Your account is ready.\n\n\
                    You can review your profile here:\n\n\
                    {}\n\n\
                    Thanks,\n\
                    The Tourbase Team",
                    user_name, link
                );
                (user_email.clone(), subject, body)
            }
            OutgoingEmail::PasswordReset { token, user_email } => {
                let subject = format!(
                    "Your password reset token (valid for {} minutes)",
                    RESET_TOKEN_TTL_MINUTES
                );
                let link = format!("{}/reset-password?token={}", self.config.base_url, token);
                let body = format!(
                    "Hello,\n\n\
                    You requested a password reset. Submit a new password here:\n\n\
                    {}\n\n\
                    This link will expire in {} minutes.\n\n\
                    If you didn't request this, you can ignore this email.\n\n\
                    Thanks,\n\
                    The Tourbase Team",
                    link, RESET_TOKEN_TTL_MINUTES
                );
                (user_email.clone(), subject, body)
            }
            OutgoingEmail::PasswordChanged { user_email } => {
                let subject = "Your password was changed".to_string();
                let body = "Hello,\n\n\
                    Your password was successfully changed.\n\n\
                    If you didn't make this change, please contact support immediately.\n\n\
                    Thanks,\n\
                    The Tourbase Team"
                    .to_string();
                (user_email.clone(), subject, body)
            }
        }
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> MailResult<()> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let (to, subject, body) = self.render(&email);

        let message = Message::builder()
            .from(
                format!("{} <{}>", self.config.from_name, self.config.from_email)
                    .parse()
                    .map_err(|e| MailError::InvalidAddress(format!("from: {}", e)))?,
            )
            .to(to
                .parse()
                .map_err(|e| MailError::InvalidAddress(format!("to: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| MailError::BuildFailed(e.to_string()))?;

        let transport = if self.config.smtp_user.is_empty() {
            // No authentication (for local development SMTP servers)
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                self.config.smtp_user.clone(),
                self.config.smtp_password.clone(),
            );

            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
                .map_err(|e| MailError::TransportFailed(e.to_string()))?
                .credentials(creds)
                .port(self.config.smtp_port)
                .build()
        };

        transport
            .send(message)
            .await
            .map_err(|e| MailError::TransportFailed(e.to_string()))?;

        Ok(())
    }
}

/// Create a boxed sender based on config
pub fn create_mailer(config: Option<MailerConfig>) -> Arc<dyn EmailSender> {
    match config {
        Some(cfg) => Arc::new(SmtpMailer::new(cfg)),
        None => Arc::new(MockMailer::new()),
    }
}
