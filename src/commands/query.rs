//! Read-only commands for inspecting session state.
//!
//! This module provides:
//! - `show`: the current session with receipts and running total
//! - `history`: submitted sessions
//! - `categories`: the static category catalog

use crate::commands::Out;
use crate::export::report;
use crate::model::{self, Category, Receipt, Session, SessionStatus};
use crate::repository::SessionRepository;
use crate::{Config, Result};
use serde::Serialize;

/// A read-only view of one session with its receipts.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: String,
    pub created: String,
    pub status: SessionStatus,
    pub session_label: Option<String>,
    pub total: String,
    pub receipts: Vec<Receipt>,
}

impl SessionView {
    fn from_session(session: &Session) -> Self {
        Self {
            id: session.id().to_string(),
            created: session.created_date_display(),
            status: session.status(),
            session_label: session
                .user_info()
                .map(|info| info.session_id().to_string()),
            total: report::total_display(session),
            receipts: session.receipts().to_vec(),
        }
    }
}

/// One line of the submitted-session history.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub created: String,
    pub session_label: Option<String>,
    pub receipt_count: usize,
    pub total: String,
}

impl SessionSummary {
    fn from_session(session: &Session) -> Self {
        Self {
            id: session.id().to_string(),
            created: session.created_date_display(),
            session_label: session
                .user_info()
                .map(|info| info.session_id().to_string()),
            receipt_count: session.receipts().len(),
            total: report::total_display(session),
        }
    }
}

/// Shows the current session, its receipts and its running total.
pub async fn show(config: Config) -> Result<Out<SessionView>> {
    let repository = SessionRepository::load(config.store().clone()).await;
    let Some(session) = repository.current() else {
        return Ok("There is no active session".into());
    };
    let view = SessionView::from_session(session);
    let message = format!(
        "Session {}: {} receipts totaling {}",
        view.id,
        view.receipts.len(),
        view.total
    );
    Ok(Out::new(message, view))
}

/// Lists submitted sessions, newest last.
pub async fn history(config: Config) -> Result<Out<Vec<SessionSummary>>> {
    let repository = SessionRepository::load(config.store().clone()).await;
    let submitted: Vec<SessionSummary> = repository
        .sessions()
        .iter()
        .filter(|s| s.status() == SessionStatus::Submitted)
        .map(SessionSummary::from_session)
        .collect();
    let message = match submitted.len() {
        0 => "No submitted sessions".to_string(),
        n => format!("{n} submitted sessions"),
    };
    Ok(Out::new(message, submitted))
}

/// Lists the expense categories and their accounting codes.
pub async fn categories() -> Result<Out<Vec<Category>>> {
    let catalog: Vec<Category> = model::catalog().to_vec();
    let listing = catalog
        .iter()
        .map(|c| format!("{} ({})", c.name(), c.accounting_code()))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(Out::new(
        format!("{} categories: {listing}", catalog.len()),
        catalog,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{AddArgs, StartArgs};
    use crate::commands::{add, end, start};
    use crate::model::Location;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_show_without_session() {
        let env = TestEnv::new().await;
        let out = show(env.config()).await.unwrap();
        assert_eq!(out.message(), "There is no active session");
        assert!(out.structure().is_none());
    }

    #[tokio::test]
    async fn test_show_current_session() {
        let env = TestEnv::new().await;
        let start_args = StartArgs::new(
            Some("Jane".to_string()),
            Some("Doe".to_string()),
            Location::GR,
        );
        start(env.config(), start_args).await.unwrap();
        let args = AddArgs::new("Fuel stop", "Gasoline", "10.00", None, None, None);
        add(env.config(), args).await.unwrap();

        let out = show(env.config()).await.unwrap();
        let view = out.structure().unwrap();

        assert_eq!(view.status, SessionStatus::Active);
        assert_eq!(view.receipts.len(), 1);
        assert_eq!(view.total, "10.00");
        assert!(view.session_label.as_deref().unwrap().starts_with("JD"));
    }

    #[tokio::test]
    async fn test_history_lists_only_submitted_sessions() {
        let env = TestEnv::new().await;
        start(env.config(), StartArgs::new(None, None, Location::GR))
            .await
            .unwrap();
        let args = AddArgs::new("Fuel stop", "Gasoline", "10.00", None, None, None);
        add(env.config(), args).await.unwrap();
        end(env.config()).await.unwrap();
        start(env.config(), StartArgs::new(None, None, Location::GR))
            .await
            .unwrap();

        let out = history(env.config()).await.unwrap();
        let summaries = out.structure().unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].receipt_count, 1);
        assert_eq!(summaries[0].total, "10.00");
    }

    #[tokio::test]
    async fn test_categories_lists_the_catalog() {
        let out = categories().await.unwrap();
        assert_eq!(out.structure().unwrap().len(), 12);
        assert!(out.message().contains("Gasoline (6190-01)"));
    }
}
