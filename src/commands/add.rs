use crate::args::AddArgs;
use crate::commands::Out;
use crate::model::{self, clean_date_input, today_date_input, Cost, Receipt, Session};
use crate::repository::{MutateOutcome, SessionRepository};
use crate::{utils, Config, Result};
use anyhow::{bail, Context};

/// Adds a receipt to the current session.
///
/// The category must exist in the catalog; the receipt's accounting code is derived from it and
/// the session's location. The date defaults to today when omitted.
pub async fn add(config: Config, args: AddArgs) -> Result<Out<Receipt>> {
    let mut repository = SessionRepository::load(config.store().clone()).await;
    if repository.current().is_none() {
        bail!("There is no active session. Start one with 'receipts start'");
    }

    let description = args.description().trim().to_string();
    if description.is_empty() {
        bail!("A description is required");
    }

    let category = model::find_by_name(args.category()).with_context(|| {
        format!(
            "Unknown category '{}'. Run 'receipts categories' to list them",
            args.category()
        )
    })?;
    let accounting_code = category.code_for(repository.current().and_then(Session::location));

    let date = match args.date() {
        Some(date) => clean_date_input(date)?,
        None => clean_date_input(&today_date_input())?,
    };
    let cost: Cost = args.cost().parse()?;
    let image_ref = match args.image() {
        Some(path) => Some(
            utils::canonicalize(path)
                .await
                .context("Unable to find the receipt image")?,
        ),
        None => None,
    };

    let receipt = Receipt::new(
        image_ref,
        date,
        description,
        args.purpose().unwrap_or_default().trim().to_string(),
        category.name().to_string(),
        accounting_code,
        cost,
    );

    match repository.add_receipt(receipt.clone()).await {
        MutateOutcome::Applied => Ok(Out::new(
            format!("Added receipt {} ({})", receipt.id(), receipt.cost()),
            receipt,
        )),
        _ => bail!("There is no active session. Start one with 'receipts start'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::StartArgs;
    use crate::commands::start;
    use crate::model::Location;
    use crate::test::TestEnv;

    fn add_args(category: &str, cost: &str) -> AddArgs {
        AddArgs::new("Fuel stop", category, cost, None, None, None)
    }

    #[tokio::test]
    async fn test_add_without_session_fails() {
        let env = TestEnv::new().await;
        let result = add(env.config(), add_args("Gasoline", "10.00")).await;
        assert!(result.unwrap_err().to_string().contains("no active session"));
    }

    #[tokio::test]
    async fn test_add_derives_code_from_session_location() {
        let env = TestEnv::new().await;
        let start_args = StartArgs::new(
            Some("Jane".to_string()),
            Some("Doe".to_string()),
            Location::OK,
        );
        start(env.config(), start_args).await.unwrap();

        let out = add(env.config(), add_args("Gasoline", "10.00")).await.unwrap();

        let receipt = out.structure().unwrap();
        assert_eq!(receipt.category(), "Gasoline");
        assert_eq!(receipt.accounting_code(), "6190-01-OK");
        assert_eq!(receipt.cost().as_str(), "10.00");
    }

    #[tokio::test]
    async fn test_add_without_location_uses_base_code() {
        let env = TestEnv::new().await;
        start(env.config(), StartArgs::new(None, None, Location::GR))
            .await
            .unwrap();

        let out = add(env.config(), add_args("Parking", "5.00")).await.unwrap();
        assert_eq!(out.structure().unwrap().accounting_code(), "6160-01");
    }

    #[tokio::test]
    async fn test_add_rejects_unknown_category() {
        let env = TestEnv::new().await;
        start(env.config(), StartArgs::new(None, None, Location::GR))
            .await
            .unwrap();

        let result = add(env.config(), add_args("Not A Category", "5.00")).await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown category"));
    }

    #[tokio::test]
    async fn test_add_accepts_explicit_date() {
        let env = TestEnv::new().await;
        start(env.config(), StartArgs::new(None, None, Location::GR))
            .await
            .unwrap();

        let args = AddArgs::new(
            "Fuel stop",
            "Gasoline",
            "10.00",
            None,
            Some("01-31-2024".to_string()),
            Some("client visit".to_string()),
        );
        let out = add(env.config(), args).await.unwrap();

        let receipt = out.structure().unwrap();
        assert_eq!(receipt.date(), "01/31/2024");
        assert_eq!(receipt.purpose(), "client visit");
    }

    #[tokio::test]
    async fn test_add_rejects_missing_image() {
        let env = TestEnv::new().await;
        start(env.config(), StartArgs::new(None, None, Location::GR))
            .await
            .unwrap();

        let args = AddArgs::new(
            "Fuel stop",
            "Gasoline",
            "10.00",
            Some(env.config().root().join("no-such-photo.jpg")),
            None,
            None,
        );
        assert!(add(env.config(), args).await.is_err());
    }

    #[tokio::test]
    async fn test_add_persists_receipt() {
        let env = TestEnv::new().await;
        start(env.config(), StartArgs::new(None, None, Location::GR))
            .await
            .unwrap();
        add(env.config(), add_args("Gasoline", "10.00")).await.unwrap();

        let repository = SessionRepository::load(env.config().store().clone()).await;
        assert_eq!(repository.current().unwrap().receipts().len(), 1);
    }
}
