use crate::args::SubmitArgs;
use crate::commands::Out;
use crate::delivery::{self, Mode};
use crate::export::Exporter;
use crate::repository::{MutateOutcome, SessionRepository};
use crate::{Config, Result};
use anyhow::bail;

/// Longest accepted recipient email address, in characters.
const MAX_RECIPIENT_CHARS: usize = 100;

/// Emails the current session as an expense report with receipt images attached, then marks the
/// session submitted. The recipient comes from `--to` or from the config's default.
pub async fn submit(config: Config, mode: Mode, args: SubmitArgs) -> Result<Out<()>> {
    let recipient = args
        .to()
        .or_else(|| config.default_recipient())
        .unwrap_or_default()
        .trim()
        .to_string();
    if recipient.is_empty() {
        bail!("No recipient email address. Pass --to or set default_recipient in config.json");
    }
    if recipient.chars().count() > MAX_RECIPIENT_CHARS {
        bail!("The recipient email address exceeds {MAX_RECIPIENT_CHARS} characters");
    }

    let mut repository = SessionRepository::load(config.store().clone()).await;
    let mut exporter = Exporter::new(config.staging(), delivery::delivery(mode));
    exporter.submit(&mut repository, &recipient).await?;

    Ok(format!("Expense report submitted to {recipient}").into())
}

/// Marks the current session submitted without emailing a report.
pub async fn end(config: Config) -> Result<Out<()>> {
    let mut repository = SessionRepository::load(config.store().clone()).await;
    let Some(id) = repository.current().map(|s| s.id().to_string()) else {
        bail!("There is no active session");
    };
    match repository.end_session().await {
        MutateOutcome::Applied => Ok(format!("Session {id} marked submitted").into()),
        _ => bail!("There is no active session"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{AddArgs, StartArgs};
    use crate::commands::{add, start};
    use crate::model::{Location, SessionStatus};
    use crate::test::TestEnv;

    async fn session_with_receipt(env: &TestEnv) {
        start(env.config(), StartArgs::new(None, None, Location::GR))
            .await
            .unwrap();
        let args = AddArgs::new("Fuel stop", "Gasoline", "10.00", None, None, None);
        add(env.config(), args).await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_in_test_mode() {
        let env = TestEnv::new().await;
        session_with_receipt(&env).await;

        let args = SubmitArgs::new(Some("expenses@example.com".to_string()));
        let out = submit(env.config(), Mode::Test, args).await.unwrap();

        assert!(out.message().contains("expenses@example.com"));
        let repository = SessionRepository::load(env.config().store().clone()).await;
        assert!(repository.current().is_none());
        assert_eq!(repository.sessions()[0].status(), SessionStatus::Submitted);
    }

    #[tokio::test]
    async fn test_submit_without_recipient_fails() {
        let env = TestEnv::new().await;
        session_with_receipt(&env).await;

        let result = submit(env.config(), Mode::Test, SubmitArgs::new(None)).await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("No recipient email address"));
    }

    #[tokio::test]
    async fn test_submit_rejects_oversized_recipient() {
        let env = TestEnv::new().await;
        session_with_receipt(&env).await;

        let recipient = format!("{}@example.com", "a".repeat(MAX_RECIPIENT_CHARS));
        let result = submit(env.config(), Mode::Test, SubmitArgs::new(Some(recipient))).await;
        assert!(result.unwrap_err().to_string().contains("exceeds"));
    }

    #[tokio::test]
    async fn test_submit_with_empty_session_fails() {
        let env = TestEnv::new().await;
        start(env.config(), StartArgs::new(None, None, Location::GR))
            .await
            .unwrap();

        let args = SubmitArgs::new(Some("a@example.com".to_string()));
        let result = submit(env.config(), Mode::Test, args).await;
        assert_eq!(result.unwrap_err().to_string(), "No receipts to submit");

        // The session is untouched and still current.
        let repository = SessionRepository::load(env.config().store().clone()).await;
        assert_eq!(
            repository.current().unwrap().status(),
            SessionStatus::Active
        );
    }

    #[tokio::test]
    async fn test_end_without_session_fails() {
        let env = TestEnv::new().await;
        assert!(end(env.config()).await.is_err());
    }

    #[tokio::test]
    async fn test_end_marks_submitted() {
        let env = TestEnv::new().await;
        session_with_receipt(&env).await;

        end(env.config()).await.unwrap();

        let repository = SessionRepository::load(env.config().store().clone()).await;
        assert!(repository.current().is_none());
        assert_eq!(repository.sessions()[0].status(), SessionStatus::Submitted);
    }
}
