//! The `Session` aggregate: a bounded sequence of receipt captures from start to submission.

use crate::model::{next_id, Receipt, ReceiptPatch};
use chrono::{Local, NaiveDate, TimeZone};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a session. The only transition is `Active` to `Submitted`.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    Submitted,
}

serde_plain::derive_display_from_serialize!(SessionStatus);
serde_plain::derive_fromstr_from_deserialize!(SessionStatus);

/// Office location of a session's submitter. Suffixed onto accounting codes.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Location {
    #[default]
    GR,
    OK,
    MA,
}

serde_plain::derive_display_from_serialize!(Location);
serde_plain::derive_fromstr_from_deserialize!(Location);

/// Optional information about the submitter, captured at session start.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SessionUserInfo {
    first_name: String,
    last_name: String,
    location: Location,

    /// Derived display label, not a unique identifier.
    session_id: String,
}

impl SessionUserInfo {
    /// Builds user info with a label derived from today's date.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        location: Location,
    ) -> Self {
        Self::new_for_date(first_name, last_name, location, Local::now().date_naive())
    }

    /// The label is the uppercased first and last initials followed by the zero-padded month and
    /// day and the 4-digit year, e.g. `JD01312024`.
    pub(crate) fn new_for_date(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        location: Location,
        date: NaiveDate,
    ) -> Self {
        let first_name = first_name.into().trim().to_string();
        let last_name = last_name.into().trim().to_string();
        let first_initial: String = first_name.chars().take(1).flat_map(char::to_uppercase).collect();
        let last_initial: String = last_name.chars().take(1).flat_map(char::to_uppercase).collect();
        let session_id = format!("{first_initial}{last_initial}{}", date.format("%m%d%Y"));
        Self {
            first_name,
            last_name,
            location,
            session_id,
        }
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// The derived display label.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// One bounded sequence of receipt captures. At most one session is active at a time; it is the
/// only session whose receipts can change.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Session {
    id: String,
    receipts: Vec<Receipt>,
    created_at_millis: i64,
    status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_info: Option<SessionUserInfo>,
}

impl Session {
    /// Creates an active session with a fresh time-based id and no receipts.
    pub(crate) fn new(user_info: Option<SessionUserInfo>) -> Self {
        Self {
            id: next_id(),
            receipts: Vec::new(),
            created_at_millis: Local::now().timestamp_millis(),
            status: SessionStatus::Active,
            user_info,
        }
    }

    /// Creates an active session with fixed values so that assertions can be deterministic.
    #[cfg(test)]
    pub(crate) fn for_test(
        id: impl Into<String>,
        created_at_millis: i64,
        user_info: Option<SessionUserInfo>,
    ) -> Self {
        Self {
            id: id.into(),
            receipts: Vec::new(),
            created_at_millis,
            status: SessionStatus::Active,
            user_info,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn created_at_millis(&self) -> i64 {
        self.created_at_millis
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn user_info(&self) -> Option<&SessionUserInfo> {
        self.user_info.as_ref()
    }

    /// The submitter location, when user info was captured at session start.
    pub fn location(&self) -> Option<Location> {
        self.user_info.as_ref().map(|info| info.location())
    }

    pub(crate) fn set_submitted(&mut self) {
        self.status = SessionStatus::Submitted;
    }

    pub(crate) fn push_receipt(&mut self, receipt: Receipt) {
        self.receipts.push(receipt);
    }

    /// Returns false when no receipt has the given id; the list is untouched in that case.
    pub(crate) fn patch_receipt(&mut self, receipt_id: &str, patch: ReceiptPatch) -> bool {
        match self.receipts.iter_mut().find(|r| r.id() == receipt_id) {
            Some(receipt) => {
                receipt.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Returns false when no receipt has the given id.
    pub(crate) fn remove_receipt(&mut self, receipt_id: &str) -> bool {
        let before = self.receipts.len();
        self.receipts.retain(|r| r.id() != receipt_id);
        self.receipts.len() != before
    }

    /// Sum of receipt costs. Costs that do not parse as decimals count as zero.
    pub fn total(&self) -> Decimal {
        self.receipts.iter().map(|r| r.cost().value()).sum()
    }

    /// The session creation date, formatted like `1/31/2024`.
    pub fn created_date_display(&self) -> String {
        Local
            .timestamp_millis_opt(self.created_at_millis)
            .single()
            .map(|d| d.format("%-m/%-d/%Y").to_string())
            .unwrap_or_default()
    }
}
