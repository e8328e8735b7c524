//! Delivery of emailed one-time codes.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::{AuthError, Result};

/// Sends a one-time code to an account. Injected so tests can capture the
/// code instead of talking to an SMTP relay.
#[async_trait]
pub trait CodeDelivery: Send + Sync {
    async fn send_code(&self, to: &str, code: &str) -> Result<()>;
}

/// Production delivery over SMTP.
///
/// When no SMTP host is configured the transport is absent and sends are
/// dropped with a warning; the code itself is never logged.
pub struct SmtpCodeDelivery {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: lettre::message::Mailbox,
}

impl SmtpCodeDelivery {
    pub fn from_config(config: &Config) -> Result<Self> {
        let from = config
            .smtp_from
            .as_deref()
            .unwrap_or("Quill <no-reply@quill.app>")
            .parse()
            .map_err(|e| AuthError::Internal(format!("invalid smtp_from address: {e}")))?;

        let transport = if config.smtp_host.is_empty() {
            None
        } else {
            let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
                .map_err(|e| AuthError::Internal(format!("smtp relay setup failed: {e}")))?
                .port(config.smtp_port);
            if let (Some(username), Some(password)) =
                (config.smtp_username.clone(), config.smtp_password.clone())
            {
                builder = builder.credentials(Credentials::new(username, password));
            }
            Some(builder.build())
        };

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl CodeDelivery for SmtpCodeDelivery {
    async fn send_code(&self, to: &str, code: &str) -> Result<()> {
        let Some(transport) = &self.transport else {
            tracing::warn!(recipient = %to, "smtp not configured; verification code dropped");
            return Ok(());
        };

        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .map_err(|e| AuthError::Internal(format!("invalid recipient address: {e}")))?)
            .subject("Your Quill verification code")
            .header(ContentType::TEXT_PLAIN)
            .body(format!(
                "Your Quill verification code is {code}. It expires in 10 minutes."
            ))
            .map_err(|e| AuthError::Internal(format!("failed to build email: {e}")))?;

        transport
            .send(message)
            .await
            .map_err(|e| AuthError::Internal(format!("failed to send email: {e}")))?;

        tracing::info!(recipient = %to, "verification code sent");
        Ok(())
    }
}

/// Test delivery that records every code it was asked to send.
#[derive(Default)]
pub struct MemoryCodeDelivery {
    sent: Mutex<Vec<(String, String)>>,
}

impl MemoryCodeDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent code sent to `email`, if any.
    pub async fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl CodeDelivery for MemoryCodeDelivery {
    async fn send_code(&self, to: &str, code: &str) -> Result<()> {
        self.sent
            .lock()
            .await
            .push((to.to_string(), code.to_string()));
        Ok(())
    }
}
