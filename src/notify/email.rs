// src/notify/email.rs

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use super::{Notifier, NotifyError, render_html, render_text};
use crate::config::EmailConfig;
use crate::core::report::AlertBatch;

/// Sends the alert through an authenticated relay using STARTTLS.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
    subject: String,
}

impl SmtpNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self, NotifyError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
            .port(config.port)
            .credentials(Credentials::new(config.username.clone(), config.password.clone()))
            .build();

        Ok(Self {
            transport,
            from: parse_mailbox(&config.from_addr)?,
            to: config.to_addrs.iter().map(|a| parse_mailbox(a)).collect::<Result<_, _>>()?,
            subject: config.subject.clone(),
        })
    }

    fn build_message(&self, batch: &AlertBatch) -> Result<Message, NotifyError> {
        let mut builder = Message::builder().from(self.from.clone()).subject(self.subject.clone());
        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }
        let message =
            builder.multipart(MultiPart::alternative_plain_html(render_text(batch), render_html(batch)))?;
        Ok(message)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, batch: &AlertBatch) -> Result<(), NotifyError> {
        let recipients: Vec<String> = self.to.iter().map(ToString::to_string).collect();
        info!(to = ?recipients, hosts = batch.len(), "Sending email with results.");

        let message = self.build_message(batch)?;
        self.transport.send(message).await?;
        info!("Alert email sent.");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse()
        .map_err(|source| NotifyError::Address { address: address.to_string(), source })
}
