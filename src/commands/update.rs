use crate::args::UpdateArgs;
use crate::commands::Out;
use crate::model::{self, clean_date_input, Receipt, ReceiptPatch, Session};
use crate::repository::{MutateOutcome, SessionRepository};
use crate::{utils, Config, Result};
use anyhow::{bail, Context};

/// Changes fields of a receipt in the current session. Fields that are not passed keep their
/// current values. A category change re-derives the accounting code.
pub async fn update(config: Config, args: UpdateArgs) -> Result<Out<Receipt>> {
    let mut repository = SessionRepository::load(config.store().clone()).await;
    let location = repository.current().and_then(Session::location);

    let mut patch = ReceiptPatch::default();
    if let Some(image) = args.image() {
        patch.image_ref = Some(
            utils::canonicalize(image)
                .await
                .context("Unable to find the receipt image")?,
        );
    }
    if let Some(date) = args.date() {
        patch.date = Some(clean_date_input(date)?);
    }
    if let Some(description) = args.description() {
        patch.description = Some(description.trim().to_string());
    }
    if let Some(purpose) = args.purpose() {
        patch.purpose = Some(purpose.trim().to_string());
    }
    if let Some(name) = args.category() {
        let category = model::find_by_name(name).with_context(|| {
            format!("Unknown category '{name}'. Run 'receipts categories' to list them")
        })?;
        patch.category = Some(category.name().to_string());
        patch.accounting_code = Some(category.code_for(location));
    }
    if let Some(cost) = args.cost() {
        patch.cost = Some(cost.parse()?);
    }
    if patch.is_empty() {
        bail!("Nothing to update; pass at least one field");
    }

    match repository.update_receipt(args.receipt_id(), patch).await {
        MutateOutcome::Applied => {
            let receipt = repository
                .current()
                .and_then(|s| s.receipts().iter().find(|r| r.id() == args.receipt_id()))
                .cloned()
                .context("The updated receipt could not be read back")?;
            Ok(Out::new(format!("Updated receipt {}", receipt.id()), receipt))
        }
        MutateOutcome::NoActiveSession => {
            bail!("There is no active session. Start one with 'receipts start'")
        }
        MutateOutcome::NotFound => bail!(
            "No receipt with id '{}' in the active session",
            args.receipt_id()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{AddArgs, StartArgs};
    use crate::commands::{add, start};
    use crate::model::Location;
    use crate::test::TestEnv;

    async fn session_with_receipt(env: &TestEnv) -> String {
        let start_args = StartArgs::new(
            Some("Jane".to_string()),
            Some("Doe".to_string()),
            Location::GR,
        );
        start(env.config(), start_args).await.unwrap();
        let args = AddArgs::new("Fuel stop", "Gasoline", "10.00", None, None, None);
        let out = add(env.config(), args).await.unwrap();
        out.structure().unwrap().id().to_string()
    }

    #[tokio::test]
    async fn test_update_merges_only_supplied_fields() {
        let env = TestEnv::new().await;
        let receipt_id = session_with_receipt(&env).await;

        let args = UpdateArgs::new(&receipt_id).with_cost("20.00");
        let out = update(env.config(), args).await.unwrap();

        let receipt = out.structure().unwrap();
        assert_eq!(receipt.cost().as_str(), "20.00");
        assert_eq!(receipt.description(), "Fuel stop");
        assert_eq!(receipt.category(), "Gasoline");
    }

    #[tokio::test]
    async fn test_update_category_rederives_code() {
        let env = TestEnv::new().await;
        let receipt_id = session_with_receipt(&env).await;

        let args = UpdateArgs::new(&receipt_id).with_category("Parking");
        let out = update(env.config(), args).await.unwrap();

        let receipt = out.structure().unwrap();
        assert_eq!(receipt.category(), "Parking");
        assert_eq!(receipt.accounting_code(), "6160-01-GR");
    }

    #[tokio::test]
    async fn test_update_unknown_receipt_fails() {
        let env = TestEnv::new().await;
        session_with_receipt(&env).await;

        let args = UpdateArgs::new("no-such-id").with_cost("20.00");
        let result = update(env.config(), args).await;
        assert!(result.unwrap_err().to_string().contains("No receipt"));
    }

    #[tokio::test]
    async fn test_update_with_no_fields_fails() {
        let env = TestEnv::new().await;
        let receipt_id = session_with_receipt(&env).await;

        let result = update(env.config(), UpdateArgs::new(&receipt_id)).await;
        assert!(result.unwrap_err().to_string().contains("Nothing to update"));
    }

    #[tokio::test]
    async fn test_update_without_session_fails() {
        let env = TestEnv::new().await;
        let args = UpdateArgs::new("123").with_cost("20.00");
        let result = update(env.config(), args).await;
        assert!(result.unwrap_err().to_string().contains("no active session"));
    }
}
