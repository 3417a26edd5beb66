//! Owns the session collection and the designation of the single current session.
//!
//! All session state persists as one JSON blob under a fixed key in the key-value store. The
//! repository writes through on every mutation: in-memory state reflects the mutation
//! immediately and durability follows best-effort through the store's silent boundary.

use crate::model::{Receipt, ReceiptPatch, Session, SessionStatus, SessionUserInfo};
use crate::store::Store;
use crate::Result;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// The store key under which the whole session collection is kept.
const SESSIONS_KEY: &str = "sessions";

/// Hard cap on the persisted session list.
const MAX_SESSIONS: usize = 1000;

/// Version tag written into the persisted envelope.
const SESSIONS_SCHEMA_VERSION: u8 = 1;

/// The persisted form of the session collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
struct SessionsFile {
    schema_version: u8,
    sessions: Vec<Session>,
}

/// Outcome of a repository mutation. The command layer decides which of these surface to the
/// user and which degrade to a message.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum MutateOutcome {
    /// The mutation was applied and written through.
    Applied,
    /// There is no active session to mutate.
    NoActiveSession,
    /// No receipt with the given id exists in the active session.
    NotFound,
}

/// The session collection and its current active session. Constructed once per process via
/// `load` and passed to whoever mutates session state.
pub(crate) struct SessionRepository {
    store: Store,
    current: Option<Session>,
    sessions: Vec<Session>,
}

impl SessionRepository {
    /// Loads the persisted collection and selects the current session. A missing or unreadable
    /// blob leaves the repository empty; this constructor never fails.
    pub(crate) async fn load(store: Store) -> Self {
        let mut repository = Self {
            store,
            current: None,
            sessions: Vec::new(),
        };
        if let Some(raw) = repository.store.get(SESSIONS_KEY).await {
            match parse_sessions(&raw) {
                Ok(sessions) => {
                    repository.sessions = sessions;
                    repository.current = repository
                        .sessions
                        .iter()
                        .find(|s| s.status() == SessionStatus::Active)
                        .cloned();
                    repository.check_single_active();
                }
                Err(e) => error!("Error loading sessions: {e:#}"),
            }
        }
        repository
    }

    pub(crate) fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub(crate) fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Starts a new active session and makes it current. Always succeeds; an existing active
    /// session stays in the collection with its prior status and simply stops being current.
    pub(crate) async fn start_session(&mut self, user_info: Option<SessionUserInfo>) -> Session {
        if let Some(current) = &self.current {
            warn!(
                "Session '{}' is still active and is no longer the current session",
                current.id()
            );
        }
        let session = Session::new(user_info);
        self.current = Some(session.clone());
        let mut updated = self.sessions.clone();
        updated.push(session.clone());
        self.save_sessions(updated).await;
        session
    }

    /// Appends a receipt to the current session, preserving the order of earlier receipts.
    pub(crate) async fn add_receipt(&mut self, receipt: Receipt) -> MutateOutcome {
        let Some(mut current) = self.current.clone() else {
            return MutateOutcome::NoActiveSession;
        };
        current.push_receipt(receipt);
        self.current = Some(current.clone());
        self.replace_and_save(current).await;
        MutateOutcome::Applied
    }

    /// Shallow-merges the patch over the receipt with the given id. Fields the patch does not
    /// supply keep their current values.
    pub(crate) async fn update_receipt(
        &mut self,
        receipt_id: &str,
        patch: ReceiptPatch,
    ) -> MutateOutcome {
        let Some(mut current) = self.current.clone() else {
            return MutateOutcome::NoActiveSession;
        };
        if !current.patch_receipt(receipt_id, patch) {
            return MutateOutcome::NotFound;
        }
        self.current = Some(current.clone());
        self.replace_and_save(current).await;
        MutateOutcome::Applied
    }

    /// Removes the receipt with the given id. Removing an unknown id changes nothing.
    pub(crate) async fn delete_receipt(&mut self, receipt_id: &str) -> MutateOutcome {
        let Some(mut current) = self.current.clone() else {
            return MutateOutcome::NoActiveSession;
        };
        if !current.remove_receipt(receipt_id) {
            return MutateOutcome::NotFound;
        }
        self.current = Some(current.clone());
        self.replace_and_save(current).await;
        MutateOutcome::Applied
    }

    /// Marks the current session submitted, persists it, and clears the current designation.
    /// This is the only transition into the submitted status.
    pub(crate) async fn end_session(&mut self) -> MutateOutcome {
        let Some(mut current) = self.current.clone() else {
            return MutateOutcome::NoActiveSession;
        };
        current.set_submitted();
        self.replace_and_save(current).await;
        self.current = None;
        MutateOutcome::Applied
    }

    /// Swaps `updated` in for the collection entry with the same id and writes through.
    async fn replace_and_save(&mut self, updated: Session) {
        let updated_sessions: Vec<Session> = self
            .sessions
            .iter()
            .map(|s| {
                if s.id() == updated.id() {
                    updated.clone()
                } else {
                    s.clone()
                }
            })
            .collect();
        self.save_sessions(updated_sessions).await;
    }

    /// Writes the full collection through the store. Collections longer than the cap are
    /// rejected outright; entries with empty ids are dropped. The in-memory list takes the
    /// sanitized form whether or not the write succeeds.
    pub(crate) async fn save_sessions(&mut self, updated: Vec<Session>) {
        if updated.len() > MAX_SESSIONS {
            warn!(
                "Refusing to save {} sessions, the limit is {MAX_SESSIONS}",
                updated.len()
            );
            return;
        }
        let sanitized: Vec<Session> = updated
            .into_iter()
            .filter(|s| !s.id().is_empty())
            .collect();
        let file = SessionsFile {
            schema_version: SESSIONS_SCHEMA_VERSION,
            sessions: sanitized,
        };
        match serde_json::to_string(&file) {
            Ok(json) => {
                self.store.set(SESSIONS_KEY, &json).await;
                self.sessions = file.sessions;
                self.check_single_active();
            }
            Err(e) => error!("Error saving sessions: {e:#}"),
        }
    }

    /// Defensive invariant check: at most one session in the collection should be active.
    fn check_single_active(&self) {
        let active = self
            .sessions
            .iter()
            .filter(|s| s.status() == SessionStatus::Active)
            .count();
        if active > 1 {
            warn!("Found {active} active sessions, there should be at most one");
        }
    }
}

/// Parses the persisted blob. Accepts the versioned envelope, or a bare session array written
/// before the envelope existed.
fn parse_sessions(raw: &str) -> Result<Vec<Session>> {
    if let Ok(file) = serde_json::from_str::<SessionsFile>(raw) {
        if file.schema_version > SESSIONS_SCHEMA_VERSION {
            bail!(
                "The stored session data is schema version {}, this build reads up to version {}",
                file.schema_version,
                SESSIONS_SCHEMA_VERSION
            );
        }
        return Ok(file.sessions);
    }
    let sessions: Vec<Session> = serde_json::from_str(raw)
        .context("The stored session data is neither a versioned envelope nor a session array")?;
    debug!("Loaded session data that predates the schema version tag");
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cost, Location};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tempfile::TempDir;

    async fn open_repository() -> (TempDir, SessionRepository) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("test.sqlite")).await.unwrap();
        let repository = SessionRepository::load(store).await;
        (dir, repository)
    }

    fn receipt(description: &str, cost: &str) -> Receipt {
        Receipt::new(
            None,
            "01/31/2024".to_string(),
            description.to_string(),
            String::new(),
            "Parking".to_string(),
            "6160-01".to_string(),
            Cost::from_str(cost).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_load_from_empty_store() {
        let (_dir, repository) = open_repository().await;
        assert!(repository.current().is_none());
        assert!(repository.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_start_session_becomes_current_and_is_appended() {
        let (_dir, mut repository) = open_repository().await;
        let first = repository.start_session(None).await;
        let second = repository
            .start_session(Some(SessionUserInfo::new("Jane", "Doe", Location::GR)))
            .await;

        assert_eq!(repository.current().unwrap().id(), second.id());
        assert_eq!(repository.sessions().len(), 2);
        assert_eq!(repository.sessions()[0].id(), first.id());
        // The orphaned session keeps its prior status.
        assert_eq!(repository.sessions()[0].status(), SessionStatus::Active);
        assert_eq!(second.status(), SessionStatus::Active);
    }

    #[tokio::test]
    async fn test_add_receipt_without_session() {
        let (_dir, mut repository) = open_repository().await;
        let outcome = repository.add_receipt(receipt("Lunch", "10.00")).await;
        assert_eq!(outcome, MutateOutcome::NoActiveSession);
    }

    #[tokio::test]
    async fn test_add_receipt_appends_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.sqlite");
        {
            let store = Store::open(&path).await.unwrap();
            let mut repository = SessionRepository::load(store).await;
            repository.start_session(None).await;
            repository.add_receipt(receipt("Coffee", "4.50")).await;
            repository.add_receipt(receipt("Lunch", "10.00")).await;
            let receipts = repository.current().unwrap().receipts();
            assert_eq!(receipts.len(), 2);
            assert_eq!(receipts[0].description(), "Coffee");
            assert_eq!(receipts[1].description(), "Lunch");
        }

        // A fresh repository over the same store sees the written-through state.
        let store = Store::open(&path).await.unwrap();
        let repository = SessionRepository::load(store).await;
        let current = repository.current().unwrap();
        assert_eq!(current.receipts().len(), 2);
        assert_eq!(current.total(), Decimal::from_str("14.50").unwrap());
    }

    #[tokio::test]
    async fn test_update_receipt_merges_fields() {
        let (_dir, mut repository) = open_repository().await;
        repository.start_session(None).await;
        repository.add_receipt(receipt("A", "10.00")).await;
        let id = repository.current().unwrap().receipts()[0].id().to_string();

        let patch = ReceiptPatch {
            cost: Some(Cost::from_str("20.00").unwrap()),
            ..ReceiptPatch::default()
        };
        let outcome = repository.update_receipt(&id, patch).await;

        assert_eq!(outcome, MutateOutcome::Applied);
        let updated = &repository.current().unwrap().receipts()[0];
        assert_eq!(updated.cost().as_str(), "20.00");
        assert_eq!(updated.description(), "A");
    }

    #[tokio::test]
    async fn test_update_unknown_receipt_leaves_session_untouched() {
        let (_dir, mut repository) = open_repository().await;
        repository.start_session(None).await;
        repository.add_receipt(receipt("A", "10.00")).await;
        let before = repository.current().unwrap().clone();

        let patch = ReceiptPatch {
            description: Some("changed".to_string()),
            ..ReceiptPatch::default()
        };
        let outcome = repository.update_receipt("no-such-id", patch).await;

        assert_eq!(outcome, MutateOutcome::NotFound);
        assert_eq!(repository.current().unwrap(), &before);
    }

    #[tokio::test]
    async fn test_delete_receipt() {
        let (_dir, mut repository) = open_repository().await;
        repository.start_session(None).await;
        repository.add_receipt(receipt("A", "10.00")).await;
        repository.add_receipt(receipt("B", "5.00")).await;
        let id = repository.current().unwrap().receipts()[0].id().to_string();

        let outcome = repository.delete_receipt(&id).await;

        assert_eq!(outcome, MutateOutcome::Applied);
        let receipts = repository.current().unwrap().receipts();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].description(), "B");
    }

    #[tokio::test]
    async fn test_delete_unknown_receipt_is_idempotent() {
        let (_dir, mut repository) = open_repository().await;
        repository.start_session(None).await;
        repository.add_receipt(receipt("A", "10.00")).await;
        let before = repository.current().unwrap().clone();

        let outcome = repository.delete_receipt("no-such-id").await;

        assert_eq!(outcome, MutateOutcome::NotFound);
        assert_eq!(repository.current().unwrap(), &before);
    }

    #[tokio::test]
    async fn test_end_session_transitions_and_clears_current() {
        let (_dir, mut repository) = open_repository().await;
        repository.start_session(None).await;
        repository.add_receipt(receipt("A", "10.00")).await;
        let session_id = repository.current().unwrap().id().to_string();

        let outcome = repository.end_session().await;

        assert_eq!(outcome, MutateOutcome::Applied);
        assert!(repository.current().is_none());
        let stored = repository
            .sessions()
            .iter()
            .find(|s| s.id() == session_id)
            .unwrap();
        assert_eq!(stored.status(), SessionStatus::Submitted);
        // Receipts are unchanged by the transition.
        assert_eq!(stored.receipts().len(), 1);
    }

    #[tokio::test]
    async fn test_end_session_without_session() {
        let (_dir, mut repository) = open_repository().await;
        assert_eq!(repository.end_session().await, MutateOutcome::NoActiveSession);
    }

    #[tokio::test]
    async fn test_save_rejects_oversized_collection() {
        let (_dir, mut repository) = open_repository().await;
        repository.start_session(None).await;
        let before = repository.sessions().to_vec();

        let oversized: Vec<Session> = (0..=MAX_SESSIONS)
            .map(|n| Session::for_test(n.to_string(), 1_700_000_000_000, None))
            .collect();
        repository.save_sessions(oversized).await;

        assert_eq!(repository.sessions(), before.as_slice());
    }

    #[tokio::test]
    async fn test_save_drops_entries_with_empty_ids() {
        let (_dir, mut repository) = open_repository().await;
        let sessions = vec![
            Session::for_test("", 1_700_000_000_000, None),
            Session::for_test("123", 1_700_000_000_000, None),
        ];
        repository.save_sessions(sessions).await;
        assert_eq!(repository.sessions().len(), 1);
        assert_eq!(repository.sessions()[0].id(), "123");
    }

    #[tokio::test]
    async fn test_load_accepts_legacy_bare_array() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("test.sqlite")).await.unwrap();
        let raw = r#"[{
            "id": "1700000000000",
            "receipts": [],
            "created_at_millis": 1700000000000,
            "status": "active"
        }]"#;
        store.set(SESSIONS_KEY, raw).await;

        let repository = SessionRepository::load(store).await;

        assert_eq!(repository.sessions().len(), 1);
        assert_eq!(repository.current().unwrap().id(), "1700000000000");
    }

    #[tokio::test]
    async fn test_load_rejects_newer_schema_version() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("test.sqlite")).await.unwrap();
        let raw = r#"{"schema_version": 99, "sessions": []}"#;
        store.set(SESSIONS_KEY, raw).await;

        let repository = SessionRepository::load(store).await;

        assert!(repository.sessions().is_empty());
        assert!(repository.current().is_none());
    }

    #[tokio::test]
    async fn test_load_survives_corrupt_data() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("test.sqlite")).await.unwrap();
        store.set(SESSIONS_KEY, "this is not json").await;

        let repository = SessionRepository::load(store).await;

        assert!(repository.sessions().is_empty());
        assert!(repository.current().is_none());
    }

    #[tokio::test]
    async fn test_load_selects_first_active_session() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("test.sqlite")).await.unwrap();
        let raw = r#"{"schema_version": 1, "sessions": [
            {"id": "1", "receipts": [], "created_at_millis": 1, "status": "submitted"},
            {"id": "2", "receipts": [], "created_at_millis": 2, "status": "active"},
            {"id": "3", "receipts": [], "created_at_millis": 3, "status": "active"}
        ]}"#;
        store.set(SESSIONS_KEY, raw).await;

        let repository = SessionRepository::load(store).await;

        assert_eq!(repository.current().unwrap().id(), "2");
    }

    #[tokio::test]
    async fn test_writes_carry_schema_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.sqlite");
        let store = Store::open(&path).await.unwrap();
        let mut repository = SessionRepository::load(store.clone()).await;
        repository.start_session(None).await;

        let raw = store.get(SESSIONS_KEY).await.unwrap();
        let file: SessionsFile = serde_json::from_str(&raw).unwrap();
        assert_eq!(file.schema_version, SESSIONS_SCHEMA_VERSION);
        assert_eq!(file.sessions.len(), 1);
    }
}
