//! Deterministic plain-text rendering of a session as an expense report.

use crate::model::Session;

/// Renders the report body. The output depends only on the session's content, so regenerating
/// the report for a retry produces identical text.
pub(crate) fn body(session: &Session) -> String {
    let mut body = String::new();
    body.push_str(&format!("Expense Report - Session {}\n", session.id()));
    body.push_str(&format!("Date: {}\n", session.created_date_display()));
    body.push_str(&format!("Total Receipts: {}\n", session.receipts().len()));
    body.push_str(&format!("Total Amount: {}\n\n", total_display(session)));

    if let Some(info) = session.user_info() {
        body.push_str(&format!(
            "Submitted by: {} {}\n",
            info.first_name(),
            info.last_name()
        ));
        body.push_str(&format!("Location: {}\n", info.location()));
        body.push_str(&format!("Session ID: {}\n\n", info.session_id()));
    }

    body.push_str("Receipt Details:\n");
    body.push_str("================\n\n");

    for (index, receipt) in session.receipts().iter().enumerate() {
        body.push_str(&format!("Receipt {}:\n", index + 1));
        body.push_str(&format!("Date: {}\n", receipt.date()));
        body.push_str(&format!("Description: {}\n", receipt.description()));
        body.push_str(&format!("Purpose: {}\n", receipt.purpose()));
        body.push_str(&format!("Category: {}\n", receipt.category()));
        body.push_str(&format!("GL Code: {}\n", receipt.accounting_code()));
        body.push_str(&format!("Cost: {}\n", receipt.cost()));
        body.push_str("---\n\n");
    }

    body
}

/// Renders the email subject line: the creation date and the session total.
pub(crate) fn subject(session: &Session) -> String {
    format!(
        "Expense Report - {} - {}",
        session.created_date_display(),
        total_display(session)
    )
}

/// The session total with exactly two decimal places.
pub(crate) fn total_display(session: &Session) -> String {
    format!("{:.2}", session.total().round_dp(2))
}
