use crate::args::StartArgs;
use crate::commands::Out;
use crate::model::{Session, SessionUserInfo};
use crate::repository::SessionRepository;
use crate::{Config, Result};
use anyhow::bail;

/// Starts a new capture session and makes it the current session.
///
/// Submitter info is attached when both names are given; with neither, the session is
/// anonymous. An existing active session stays in the collection but stops being current.
pub async fn start(config: Config, args: StartArgs) -> Result<Out<Session>> {
    let user_info = match (args.first_name(), args.last_name()) {
        (Some(first), Some(last)) => {
            if first.trim().is_empty() || last.trim().is_empty() {
                bail!("First and last name must not be blank");
            }
            Some(SessionUserInfo::new(first, last, args.location()))
        }
        (None, None) => None,
        _ => bail!("Provide both --first-name and --last-name, or neither"),
    };

    let mut repository = SessionRepository::load(config.store().clone()).await;
    let session = repository.start_session(user_info).await;

    let message = match session.user_info() {
        Some(info) => format!("Started session {} ({})", session.id(), info.session_id()),
        None => format!("Started session {}", session.id()),
    };
    Ok(Out::new(message, session))
}
