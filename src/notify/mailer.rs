use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use thiserror::Error;
use tracing::warn;

use crate::config::MailConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP transport not configured")]
    NotConfigured,
    #[error("Invalid mail address: {0}")]
    Address(String),
    #[error("Failed to build mail message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP send failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// 发信的最小接口，Notifier 只认这个 trait
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError>;
}

struct Smtp {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

/// SMTP mailer over STARTTLS. An empty host builds a disabled mailer whose
/// sends fail with [`MailError::NotConfigured`]; the dispatcher logs those
/// per receiver and still records history.
pub struct SmtpMailer {
    smtp: Option<Smtp>,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        if !config.is_configured() {
            warn!("⚠️ SMTP host not configured, notification mails will be skipped");
            return Ok(Self { smtp: None });
        }

        let from = config
            .sender()
            .parse::<Mailbox>()
            .map_err(|e| MailError::Address(format!("sender {}: {}", config.sender(), e)))?;

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?.port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            smtp: Some(Smtp {
                transport: builder.build(),
                from,
            }),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.smtp.is_some()
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        let smtp = self.smtp.as_ref().ok_or(MailError::NotConfigured)?;

        let to = to
            .parse::<Mailbox>()
            .map_err(|e| MailError::Address(format!("recipient {}: {}", to, e)))?;

        let message = Message::builder()
            .from(smtp.from.clone())
            .to(to)
            .subject(subject)
            .header(header::ContentType::TEXT_HTML)
            .body(html_body.to_string())?;

        smtp.transport.send(message).await?;
        Ok(())
    }
}
