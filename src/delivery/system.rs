//! Implements the `Delivery` trait using the operating system's opener utility.

use crate::delivery::{Delivery, DeliveryStatus, Message};
use crate::Result;
use anyhow::{bail, Context};
use std::ffi::OsStr;
use std::path::Path;
use tokio::process::Command;
use url::Url;

/// Implements `Delivery` for a desktop environment. There is no native mail composer to drive,
/// so `mail_available` reports false and the submission flow uses the fallbacks: sharing a file
/// or opening a `mailto:` link, both of which go through the platform's opener utility
/// (`xdg-open`, `open`, or `cmd /C start`).
pub(super) struct SystemDelivery;

#[async_trait::async_trait]
impl Delivery for SystemDelivery {
    async fn mail_available(&self) -> bool {
        false
    }

    async fn compose(&mut self, _message: &Message) -> Result<DeliveryStatus> {
        bail!("No native mail composer is available on this platform");
    }

    async fn share(&mut self, path: &Path, _mime_type: &str, _title: &str) -> Result<()> {
        open_with_system_handler(path.as_os_str()).await
    }

    async fn can_open(&self, url: &Url) -> bool {
        url.scheme() == "mailto"
    }

    async fn open_url(&mut self, url: &Url) -> Result<()> {
        open_with_system_handler(OsStr::new(url.as_str())).await
    }
}

/// Hands `target` (a file path or a URL) to the platform's opener utility.
async fn open_with_system_handler(target: &OsStr) -> Result<()> {
    let (program, args) = opener();
    let status = Command::new(program)
        .args(args)
        .arg(target)
        .status()
        .await
        .with_context(|| format!("Failed to execute {program}"))?;
    if !status.success() {
        bail!("{program} failed with exit code: {:?}", status.code());
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn opener() -> (&'static str, &'static [&'static str]) {
    ("open", &[])
}

#[cfg(target_os = "windows")]
fn opener() -> (&'static str, &'static [&'static str]) {
    // An empty first argument is the window title slot of `start`.
    ("cmd", &["/C", "start", ""])
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener() -> (&'static str, &'static [&'static str]) {
    ("xdg-open", &[])
}
