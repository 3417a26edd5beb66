//! The `Receipt` type and helpers for normalizing receipt form input.

use crate::model::Cost;
use crate::Result;
use anyhow::bail;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One expense line item captured during a session.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Receipt {
    /// Unique within the owning session's receipt list.
    id: String,

    /// Opaque reference to the captured photo. The core never reads image bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_ref: Option<PathBuf>,

    /// Expense date in `MM/DD/YYYY` form.
    date: String,

    description: String,

    purpose: String,

    /// Display name of the category chosen from the catalog.
    category: String,

    /// Ledger code derived from the category and the session location.
    accounting_code: String,

    /// The cost exactly as entered.
    cost: Cost,

    captured_at_millis: i64,
}

impl Receipt {
    /// Creates a receipt with a fresh identifier and the current capture time.
    pub fn new(
        image_ref: Option<PathBuf>,
        date: String,
        description: String,
        purpose: String,
        category: String,
        accounting_code: String,
        cost: Cost,
    ) -> Self {
        Self {
            id: super::next_id(),
            image_ref,
            date,
            description,
            purpose,
            category,
            accounting_code,
            cost,
            captured_at_millis: Local::now().timestamp_millis(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn image_ref(&self) -> Option<&Path> {
        self.image_ref.as_deref()
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn accounting_code(&self) -> &str {
        &self.accounting_code
    }

    pub fn cost(&self) -> &Cost {
        &self.cost
    }

    pub fn captured_at_millis(&self) -> i64 {
        self.captured_at_millis
    }

    /// Overwrites the fields that the patch supplies; everything else keeps its current value.
    pub(crate) fn apply(&mut self, patch: ReceiptPatch) {
        if let Some(image_ref) = patch.image_ref {
            self.image_ref = Some(image_ref);
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(purpose) = patch.purpose {
            self.purpose = purpose;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(accounting_code) = patch.accounting_code {
            self.accounting_code = accounting_code;
        }
        if let Some(cost) = patch.cost {
            self.cost = cost;
        }
    }
}

/// A partial update to a receipt. Fields left as `None` keep their current values.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ReceiptPatch {
    pub(crate) image_ref: Option<PathBuf>,
    pub(crate) date: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) purpose: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) accounting_code: Option<String>,
    pub(crate) cost: Option<Cost>,
}

impl ReceiptPatch {
    pub(crate) fn is_empty(&self) -> bool {
        self == &ReceiptPatch::default()
    }
}

/// Reduces date input to its digits and requires exactly eight of them (MMDDYYYY), returning the
/// stored `MM/DD/YYYY` form.
pub(crate) fn clean_date_input(input: &str) -> Result<String> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 8 {
        bail!("The date must be 8 digits in MMDDYYYY format, got '{input}'");
    }
    Ok(format!(
        "{}/{}/{}",
        &digits[0..2],
        &digits[2..4],
        &digits[4..8]
    ))
}

/// Today's date in the 8-digit MMDDYYYY input form.
pub(crate) fn today_date_input() -> String {
    Local::now().format("%m%d%Y").to_string()
}
