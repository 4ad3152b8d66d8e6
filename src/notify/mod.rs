// src/notify/mod.rs

//! Alert delivery. The run hands a non-empty [`AlertBatch`] to a [`Notifier`];
//! the notifier decides how the message leaves the process.

pub mod email;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::report::AlertBatch;

pub use email::SmtpNotifier;

const BODY_HEADING: &str = "List of the expired certificates / certificates needs to be renewed<br>";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid mail address `{address}`: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("could not build alert message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("mail relay rejected the alert: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, batch: &AlertBatch) -> Result<(), NotifyError>;
}

/// Renders the HTML body: one line per host, soonest expiry first.
pub fn render_html(batch: &AlertBatch) -> String {
    let mut html = String::from(BODY_HEADING);
    for entry in batch.sorted() {
        if entry.is_sentinel() {
            html.push_str(&format!("<br> {} already expired<br>", entry.hostname));
        } else {
            html.push_str(&format!(
                "<br> {} days left for certificate at url: {}<br>",
                entry.days_remaining, entry.hostname
            ));
        }
    }
    html
}

/// Plain-text alternative of [`render_html`].
pub fn render_text(batch: &AlertBatch) -> String {
    let mut text = String::from("List of the expired certificates / certificates needs to be renewed\n\n");
    for entry in batch.sorted() {
        if entry.is_sentinel() {
            text.push_str(&format!("{} already expired\n", entry.hostname));
        } else {
            text.push_str(&format!(
                "{} days left for certificate at url: {}\n",
                entry.days_remaining, entry.hostname
            ));
        }
    }
    text
}

/// Logs the rendered alert instead of sending it.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, batch: &AlertBatch) -> Result<(), NotifyError> {
        warn!(hosts = batch.len(), "No mail relay in use; logging alert instead.");
        for line in render_text(batch).lines().filter(|l| !l.is_empty()) {
            info!("{line}");
        }
        Ok(())
    }
}
