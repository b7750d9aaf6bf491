//! SMTP notification sender built on lettre's async tokio transport.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::provider::{MailTemplate, NotificationSender};
use crate::config::SmtpConfig;
use crate::error::{AppError, AppResult};

pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSender {
    /// Build a STARTTLS relay transport; credentials are only attached when a
    /// username is configured.
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let from: Mailbox = config.sender.parse().map_err(|e| AppError::Configuration {
            key: "notifications.smtp.sender".to_string(),
            source: anyhow::Error::msg(format!("{}", e)),
        })?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Configuration {
                key: "notifications.smtp.host".to_string(),
                source: anyhow::Error::from(e),
            })?
            .port(config.port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn failure(source: anyhow::Error) -> AppError {
        AppError::Notification {
            provider: "smtp".to_string(),
            source,
        }
    }
}

#[async_trait]
impl NotificationSender for SmtpSender {
    async fn send(&self, recipient: &str, template: &MailTemplate) -> AppResult<()> {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| Self::failure(anyhow::Error::msg(format!("invalid recipient: {}", e))))?;
        let mail = template.render();

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| Self::failure(anyhow::Error::from(e)))?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| Self::failure(anyhow::Error::from(e)))
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
