//! Implements the very simple `Delivery` trait using in-memory recording for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the
//! whole app, top-to-bottom, without a mail client installed.

use crate::delivery::{Delivery, DeliveryStatus, Message};
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use url::Url;

/// A file that was handed to the sharing mechanism.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct SharedFile {
    pub(crate) path: PathBuf,
    pub(crate) mime_type: String,
    pub(crate) title: String,
}

/// The configurable answers and the recorded activity behind a `TestDelivery`.
#[derive(Debug, Clone)]
pub(crate) struct TestDeliveryState {
    pub(crate) mail_available: bool,
    pub(crate) compose_status: DeliveryStatus,
    pub(crate) can_open: bool,
    pub(crate) composed: Vec<Message>,
    pub(crate) shared: Vec<SharedFile>,
    pub(crate) opened: Vec<Url>,
}

impl Default for TestDeliveryState {
    fn default() -> Self {
        Self {
            mail_available: true,
            compose_status: DeliveryStatus::Sent,
            can_open: true,
            composed: Vec::new(),
            shared: Vec::new(),
            opened: Vec::new(),
        }
    }
}

/// An implementation of the `Delivery` trait that does not invoke anything external. It records
/// every composed message, shared file and opened link, and answers availability questions from
/// its configurable state. Cloning a `TestDelivery` shares its state, so a test can hold one
/// clone and hand the other to the code under test.
#[derive(Debug, Clone, Default)]
pub(crate) struct TestDelivery {
    state: Arc<Mutex<TestDeliveryState>>,
}

impl TestDelivery {
    /// Creates a recorder whose mail composer reports the given availability and outcome.
    pub(crate) fn with_mail(mail_available: bool, compose_status: DeliveryStatus) -> Self {
        Self {
            state: Arc::new(Mutex::new(TestDeliveryState {
                mail_available,
                compose_status,
                ..TestDeliveryState::default()
            })),
        }
    }

    /// The messages handed to the mail composer, in order.
    pub(crate) fn composed(&self) -> Vec<Message> {
        self.state.lock().unwrap().composed.clone()
    }

    /// The files handed to the sharing mechanism, in order.
    pub(crate) fn shared(&self) -> Vec<SharedFile> {
        self.state.lock().unwrap().shared.clone()
    }

    /// The URLs handed to the platform opener, in order.
    pub(crate) fn opened(&self) -> Vec<Url> {
        self.state.lock().unwrap().opened.clone()
    }
}

#[async_trait::async_trait]
impl Delivery for TestDelivery {
    async fn mail_available(&self) -> bool {
        self.state.lock().unwrap().mail_available
    }

    async fn compose(&mut self, message: &Message) -> Result<DeliveryStatus> {
        let mut state = self.state.lock().unwrap();
        state.composed.push(message.clone());
        Ok(state.compose_status)
    }

    async fn share(&mut self, path: &Path, mime_type: &str, title: &str) -> Result<()> {
        self.state.lock().unwrap().shared.push(SharedFile {
            path: path.to_path_buf(),
            mime_type: mime_type.to_string(),
            title: title.to_string(),
        });
        Ok(())
    }

    async fn can_open(&self, _url: &Url) -> bool {
        self.state.lock().unwrap().can_open
    }

    async fn open_url(&mut self, url: &Url) -> Result<()> {
        self.state.lock().unwrap().opened.push(url.clone());
        Ok(())
    }
}
