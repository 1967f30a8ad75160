//! The [`RecordStore`] trait and its two implementations.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::types::{FormatRecord, User, user_id};
use crate::RecordError;

/// Persistent win/loss bookkeeping keyed by account and format.
///
/// Lookups create missing entries, so callers never have to distinguish
/// "new account" from "known account".
///
/// `record_win` and `record_loss` have default bodies that update the
/// record in place and save it; stores only implement the four primitives.
pub trait RecordStore: Send + Sync + 'static {
    /// Returns the account named `username`, creating it if needed.
    fn get_or_create_user(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<User, RecordError>> + Send;

    /// Overwrites the stored account (e.g. to change its ban status).
    fn save_user(&self, user: &User) -> impl Future<Output = Result<(), RecordError>> + Send;

    /// Returns `user`'s record in `format`, creating it if needed.
    fn get_or_create_format_record(
        &self,
        user: &User,
        format: &str,
    ) -> impl Future<Output = Result<FormatRecord, RecordError>> + Send;

    /// Overwrites the stored record.
    fn save_format_record(
        &self,
        record: &FormatRecord,
    ) -> impl Future<Output = Result<(), RecordError>> + Send;

    /// Counts a win, saves, and returns the new streak.
    fn record_win(
        &self,
        record: &mut FormatRecord,
    ) -> impl Future<Output = Result<u32, RecordError>> + Send {
        async move {
            let streak = record.record_win();
            self.save_format_record(record).await?;
            Ok(streak)
        }
    }

    /// Counts a loss, saves, and returns the new streak (always zero).
    fn record_loss(
        &self,
        record: &mut FormatRecord,
    ) -> impl Future<Output = Result<u32, RecordError>> + Send {
        async move {
            let streak = record.record_loss();
            self.save_format_record(record).await?;
            Ok(streak)
        }
    }
}

// ---------------------------------------------------------------------------
// Table — the data both stores hold
// ---------------------------------------------------------------------------

/// Accounts by id, and each account's records by format.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Table {
    users: BTreeMap<String, User>,
    records: BTreeMap<String, BTreeMap<String, FormatRecord>>,
}

impl Table {
    /// Returns the account and whether it was just created.
    fn user(&mut self, username: &str) -> (User, bool) {
        let id = user_id(username);
        if let Some(user) = self.users.get(&id) {
            return (user.clone(), false);
        }
        let user = User::new(username);
        self.users.insert(id, user.clone());
        (user, true)
    }

    fn put_user(&mut self, user: &User) {
        self.users.insert(user.id(), user.clone());
    }

    /// Returns the record and whether it was just created.
    fn record(&mut self, user: &User, format: &str) -> (FormatRecord, bool) {
        let formats = self.records.entry(user.id()).or_default();
        if let Some(record) = formats.get(format) {
            return (record.clone(), false);
        }
        let record = FormatRecord::new(user.username.clone(), format);
        formats.insert(format.to_string(), record.clone());
        (record, true)
    }

    fn put_record(&mut self, record: &FormatRecord) {
        self.records
            .entry(user_id(&record.username))
            .or_default()
            .insert(record.format.clone(), record.clone());
    }
}

// ---------------------------------------------------------------------------
// MemoryRecordStore
// ---------------------------------------------------------------------------

/// Keeps records for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    table: Mutex<Table>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryRecordStore {
    async fn get_or_create_user(&self, username: &str) -> Result<User, RecordError> {
        Ok(self.table.lock().await.user(username).0)
    }

    async fn save_user(&self, user: &User) -> Result<(), RecordError> {
        self.table.lock().await.put_user(user);
        Ok(())
    }

    async fn get_or_create_format_record(
        &self,
        user: &User,
        format: &str,
    ) -> Result<FormatRecord, RecordError> {
        Ok(self.table.lock().await.record(user, format).0)
    }

    async fn save_format_record(&self, record: &FormatRecord) -> Result<(), RecordError> {
        self.table.lock().await.put_record(record);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonRecordStore
// ---------------------------------------------------------------------------

/// Keeps records in a JSON file, rewritten after every change.
#[derive(Debug)]
pub struct JsonRecordStore {
    path: PathBuf,
    table: Mutex<Table>,
}

impl JsonRecordStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref().to_path_buf();
        let table = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Table::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Table::default(),
            Err(source) => return Err(RecordError::Io { path, source }),
        };

        tracing::info!(
            path = %path.display(),
            users = table.users.len(),
            "opened record store"
        );
        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, table: &Table) -> Result<(), RecordError> {
        let bytes = serde_json::to_vec_pretty(table)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|source| RecordError::Io {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!(path = %self.path.display(), "records saved");
        Ok(())
    }
}

impl RecordStore for JsonRecordStore {
    async fn get_or_create_user(&self, username: &str) -> Result<User, RecordError> {
        let mut table = self.table.lock().await;
        let (user, created) = table.user(username);
        if created {
            self.persist(&table).await?;
        }
        Ok(user)
    }

    async fn save_user(&self, user: &User) -> Result<(), RecordError> {
        let mut table = self.table.lock().await;
        table.put_user(user);
        self.persist(&table).await
    }

    async fn get_or_create_format_record(
        &self,
        user: &User,
        format: &str,
    ) -> Result<FormatRecord, RecordError> {
        let mut table = self.table.lock().await;
        let (record, created) = table.record(user, format);
        if created {
            self.persist(&table).await?;
        }
        Ok(record)
    }

    async fn save_format_record(&self, record: &FormatRecord) -> Result<(), RecordError> {
        let mut table = self.table.lock().await;
        table.put_record(record);
        self.persist(&table).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_user_matches_by_id() {
        let store = MemoryRecordStore::new();

        let first = store.get_or_create_user("Ash Ketchum").await.unwrap();
        let again = store.get_or_create_user("ashketchum").await.unwrap();

        assert_eq!(first, again);
        assert_eq!(again.username, "Ash Ketchum");
        assert!(!again.banned);
    }

    #[tokio::test]
    async fn test_save_user_persists_ban() {
        let store = MemoryRecordStore::new();
        let mut user = store.get_or_create_user("griefer").await.unwrap();
        user.banned = true;

        store.save_user(&user).await.unwrap();

        assert!(store.get_or_create_user("Griefer").await.unwrap().banned);
    }

    #[tokio::test]
    async fn test_records_are_per_format() {
        let store = MemoryRecordStore::new();
        let user = store.get_or_create_user("ash").await.unwrap();

        let mut ou = store.get_or_create_format_record(&user, "gen9ou").await.unwrap();
        store.record_win(&mut ou).await.unwrap();

        let uu = store.get_or_create_format_record(&user, "gen9uu").await.unwrap();
        assert_eq!(uu.wins, 0);
        let ou = store.get_or_create_format_record(&user, "gen9ou").await.unwrap();
        assert_eq!(ou.wins, 1);
    }

    #[tokio::test]
    async fn test_record_win_then_loss_through_store() {
        let store = MemoryRecordStore::new();
        let user = store.get_or_create_user("ash").await.unwrap();
        let mut record = store.get_or_create_format_record(&user, "gen9ou").await.unwrap();

        assert_eq!(store.record_win(&mut record).await.unwrap(), 1);
        assert_eq!(store.record_win(&mut record).await.unwrap(), 2);
        assert_eq!(store.record_loss(&mut record).await.unwrap(), 0);

        let stored = store.get_or_create_format_record(&user, "gen9ou").await.unwrap();
        assert_eq!(stored.wins, 2);
        assert_eq!(stored.losses, 1);
        assert_eq!(stored.win_streak, 0);
        assert_eq!(stored.max_win_streak, 2);
    }
}
