//! Turns a completed session into an emailed expense report.
//!
//! The exporter stages receipt images and the rendered report text as temporary files, hands
//! them to the delivery collaborator, deletes the staged files, and on confirmed delivery
//! transitions the session to submitted. Any staging or delivery failure leaves the session
//! active and current, so the caller can simply retry.

pub(crate) mod report;

use crate::delivery::{Delivery, DeliveryStatus, Message};
use crate::model::Session;
use crate::repository::SessionRepository;
use crate::{utils, Result};
use anyhow::{bail, Context};
use std::path::PathBuf;
use tracing::{debug, warn};
use url::Url;

/// Stages files and drives the delivery of one expense report.
pub(crate) struct Exporter {
    staging: PathBuf,
    delivery: Box<dyn Delivery>,
}

/// The temporary files created for one submission. The report text is the last entry of
/// `attachments` and is also kept separately for the file-sharing fallback.
struct Staged {
    attachments: Vec<PathBuf>,
    summary: PathBuf,
}

impl Exporter {
    pub(crate) fn new(staging: impl Into<PathBuf>, delivery: Box<dyn Delivery>) -> Self {
        Self {
            staging: staging.into(),
            delivery,
        }
    }

    /// Submits the current session as an emailed report to `recipient`.
    ///
    /// Fails with "No receipts to submit" when there is no current session or it has no
    /// receipts; nothing is staged in that case. Staged files are deleted after any delivery
    /// attempt, including an explicit cancellation. Only on success does the session transition
    /// to submitted and stop being current.
    pub(crate) async fn submit(
        &mut self,
        repository: &mut SessionRepository,
        recipient: &str,
    ) -> Result<()> {
        let session = match repository.current() {
            Some(session) if !session.receipts().is_empty() => session.clone(),
            _ => bail!("No receipts to submit"),
        };

        let body = report::body(&session);
        let subject = report::subject(&session);

        let staged = self.stage(&session, &body).await?;
        let delivered = self.deliver(recipient, &subject, &body, &staged).await;
        self.clean_up(&staged).await;
        delivered?;

        repository.end_session().await;
        debug!("Session {} submitted to {recipient}", session.id());
        Ok(())
    }

    /// Copies each receipt image into the staging directory and writes the report text file.
    /// A receipt whose image cannot be copied is excluded from the attachments; a failure to
    /// write the report text aborts the submission.
    async fn stage(&self, session: &Session, body: &str) -> Result<Staged> {
        let mut attachments = Vec::new();
        for (index, receipt) in session.receipts().iter().enumerate() {
            let Some(image) = receipt.image_ref() else {
                continue;
            };
            let file_name = format!(
                "temp_receipt_{}_{}.jpg",
                index + 1,
                sanitize(receipt.description())
            );
            let path = self.staging.join(file_name);
            match utils::copy(image, &path).await {
                Ok(_) => attachments.push(path),
                Err(e) => {
                    warn!(
                        "Failed to prepare attachment for receipt {}: {e:#}",
                        index + 1
                    );
                }
            }
        }

        let summary = self
            .staging
            .join(format!("expense_report_{}.txt", session.id()));
        utils::write(&summary, body)
            .await
            .context("Unable to write the expense report text file")?;
        attachments.push(summary.clone());

        Ok(Staged {
            attachments,
            summary,
        })
    }

    /// Attempts delivery: the native mail composer when available, otherwise sharing the report
    /// text file, otherwise a `mailto:` link.
    async fn deliver(
        &mut self,
        recipient: &str,
        subject: &str,
        body: &str,
        staged: &Staged,
    ) -> Result<()> {
        if self.delivery.mail_available().await {
            let message = Message {
                recipients: vec![recipient.to_string()],
                subject: subject.to_string(),
                body: body.to_string(),
                attachments: staged.attachments.clone(),
            };
            return match self.delivery.compose(&message).await? {
                DeliveryStatus::Cancelled => bail!("Email was cancelled"),
                DeliveryStatus::Sent | DeliveryStatus::Other => Ok(()),
            };
        }

        if !staged.attachments.is_empty() {
            return self
                .delivery
                .share(&staged.summary, "text/plain", "Share Expense Report")
                .await;
        }

        let url = mailto_link(recipient, subject, body)?;
        if !self.delivery.can_open(&url).await {
            bail!("Unable to open email client");
        }
        self.delivery.open_url(&url).await
    }

    /// Deletes every staged file. Deletion failures are logged, never surfaced.
    async fn clean_up(&self, staged: &Staged) {
        for path in &staged.attachments {
            if let Err(e) = utils::remove(path).await {
                warn!("Failed to clean up temporary file {}: {e:#}", path.display());
            }
        }
    }
}

/// Replaces every character that is not an ASCII letter or digit with `_`.
fn sanitize(description: &str) -> String {
    description
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Builds a `mailto:` link with the subject and body percent-encoded.
fn mailto_link(recipient: &str, subject: &str, body: &str) -> Result<Url> {
    let raw = format!(
        "mailto:{recipient}?subject={}&body={}",
        encode_component(subject),
        encode_component(body)
    );
    Url::parse(&raw).context("Unable to build the mailto link")
}

/// Percent-encodes a query component, with spaces as `%20` rather than `+`.
fn encode_component(component: &str) -> String {
    url::form_urlencoded::byte_serialize(component.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
