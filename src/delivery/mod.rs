//! The delivery collaborator: the channel through which a composed expense report leaves the
//! machine. Either a native mail composer, a file-sharing handoff, or a `mailto:` link.

mod system;
mod test_delivery;

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

pub(crate) use test_delivery::TestDelivery;

/// The environment variable that switches the app into test mode.
pub(crate) const IN_TEST_MODE_VAR: &str = "RECEIPTS_IN_TEST_MODE";

/// A composed email message with file attachments.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct Message {
    pub(crate) recipients: Vec<String>,
    pub(crate) subject: String,
    pub(crate) body: String,
    pub(crate) attachments: Vec<PathBuf>,
}

/// The outcome reported by a mail composer. Anything other than `Cancelled` counts as a
/// completed delivery attempt.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum DeliveryStatus {
    #[default]
    Sent,
    Cancelled,
    Other,
}

serde_plain::derive_display_from_serialize!(DeliveryStatus);
serde_plain::derive_fromstr_from_deserialize!(DeliveryStatus);

/// The external mechanisms that can carry a finished report. Implementations are dynamically
/// dispatched so the whole submission flow can run against an in-memory double.
#[async_trait::async_trait]
pub(crate) trait Delivery: Send {
    /// Whether a native mail composer can be invoked on this platform.
    async fn mail_available(&self) -> bool;

    /// Composes and hands off a message with attachments via the native mail composer.
    async fn compose(&mut self, message: &Message) -> Result<DeliveryStatus>;

    /// Hands a file to the platform's generic sharing mechanism.
    async fn share(&mut self, path: &Path, mime_type: &str, title: &str) -> Result<()>;

    /// Whether the platform can handle the given URL's scheme.
    async fn can_open(&self, url: &Url) -> bool;

    /// Opens the URL with the platform's handler.
    async fn open_url(&mut self, url: &Url) -> Result<()>;
}

/// Which `Delivery` implementation to use.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Mode {
    /// Deliver through the operating system.
    System,
    /// Record deliveries in memory instead of invoking anything external.
    Test,
}

impl Mode {
    /// When `RECEIPTS_IN_TEST_MODE` is set and non-zero in length, the mode is `Test`,
    /// otherwise it is `System`.
    pub fn from_env() -> Self {
        match std::env::var(IN_TEST_MODE_VAR) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::System,
        }
    }
}

/// Creates the `Delivery` implementation for the given mode.
pub(crate) fn delivery(mode: Mode) -> Box<dyn Delivery> {
    match mode {
        Mode::System => Box::new(system::SystemDelivery),
        Mode::Test => Box::<TestDelivery>::default(),
    }
}
