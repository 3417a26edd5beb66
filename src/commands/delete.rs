use crate::args::DeleteArgs;
use crate::commands::Out;
use crate::repository::{MutateOutcome, SessionRepository};
use crate::{Config, Result};
use anyhow::bail;

/// Removes a receipt from the current session. Deleting an id that does not exist is reported,
/// not treated as an error.
pub async fn delete(config: Config, args: DeleteArgs) -> Result<Out<()>> {
    let mut repository = SessionRepository::load(config.store().clone()).await;
    match repository.delete_receipt(args.receipt_id()).await {
        MutateOutcome::Applied => Ok(format!("Deleted receipt {}", args.receipt_id()).into()),
        MutateOutcome::NotFound => Ok(format!(
            "No receipt with id '{}'; nothing was deleted",
            args.receipt_id()
        )
        .into()),
        MutateOutcome::NoActiveSession => {
            bail!("There is no active session. Start one with 'receipts start'")
        }
    }
}
