//! redb-based storage for card commit history
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `cards` | `card_id` | `Card` | Latest committed state |
//! | `commits` | `(card_id, sequence)` | `Commit` | Commit history (append-only) |
//! | `sequence_counter` | `"seq"` | `u64` | Global commit sequence |
//!
//! Values are JSON. A commit and the card state it produced are written in
//! the same transaction.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::{Card, CardData, Commit};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// key = card_id, value = JSON-serialized Card
const CARDS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("cards");

/// key = (card_id, sequence), value = JSON-serialized Commit
const COMMITS_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("commits");

const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const SEQUENCE_KEY: &str = "seq";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    pub cards: u64,
    pub commits: u64,
    pub sequence: u64,
}

/// Card commit storage backed by redb
#[derive(Clone)]
pub struct CommitStorage {
    db: Arc<Database>,
}

impl CommitStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CARDS_TABLE)?;
            let _ = write_txn.open_table(COMMITS_TABLE)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(SEQUENCE_KEY)?.is_none() {
                seq_table.insert(SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequence ==========

    /// Increment and return the sequence number
    pub fn increment_sequence(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let current = table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(SEQUENCE_KEY, next)?;
        Ok(next)
    }

    pub fn get_current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    // ========== Cards ==========

    pub fn store_card(&self, txn: &WriteTransaction, card: &Card) -> StorageResult<()> {
        let mut table = txn.open_table(CARDS_TABLE)?;
        let value = serde_json::to_vec(card)?;
        table.insert(card.id.as_str(), value.as_slice())?;
        Ok(())
    }

    pub fn get_card(&self, card_id: &str) -> StorageResult<Option<Card>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CARDS_TABLE)?;

        match table.get(card_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Latest state of a card (within transaction)
    pub fn get_card_txn(
        &self,
        txn: &WriteTransaction,
        card_id: &str,
    ) -> StorageResult<Option<Card>> {
        let table = txn.open_table(CARDS_TABLE)?;

        match table.get(card_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_card_ids(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CARDS_TABLE)?;

        let mut ids = Vec::new();
        for result in table.iter()? {
            let (key, _value) = result?;
            ids.push(key.value().to_string());
        }
        Ok(ids)
    }

    pub fn get_all_cards(&self) -> StorageResult<Vec<Card>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CARDS_TABLE)?;

        let mut cards = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            cards.push(serde_json::from_slice(value.value())?);
        }
        Ok(cards)
    }

    // ========== Commits ==========

    pub fn store_commit(
        &self,
        txn: &WriteTransaction,
        sequence: u64,
        commit: &Commit,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(COMMITS_TABLE)?;
        let key = (commit.card_id.as_str(), sequence);
        let value = serde_json::to_vec(commit)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Per-card sequence of the card's latest commit (within transaction),
    /// 0 when the card has none
    pub fn last_commit_sequence_txn(
        &self,
        txn: &WriteTransaction,
        card_id: &str,
    ) -> StorageResult<u64> {
        let table = txn.open_table(COMMITS_TABLE)?;
        let last = table.range((card_id, 0u64)..=(card_id, u64::MAX))?.next_back();
        match last {
            Some(entry) => {
                let (_key, value) = entry?;
                let commit: Commit = serde_json::from_slice(value.value())?;
                Ok(commit.sequence)
            }
            None => Ok(0),
        }
    }

    /// Commits of one card in sequence order
    pub fn get_commits(&self, card_id: &str) -> StorageResult<Vec<Commit>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COMMITS_TABLE)?;

        let mut commits = Vec::new();
        for result in table.range((card_id, 0u64)..=(card_id, u64::MAX))? {
            let (_key, value) = result?;
            commits.push(serde_json::from_slice(value.value())?);
        }
        Ok(commits)
    }

    /// Card state with its full history, `None` when the card was never
    /// committed
    pub fn get_card_data(&self, card_id: &str) -> StorageResult<Option<CardData>> {
        let Some(card) = self.get_card(card_id)? else {
            return Ok(None);
        };
        Ok(Some(CardData {
            card,
            commits: self.get_commits(card_id)?,
        }))
    }

    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;
        let cards = read_txn.open_table(CARDS_TABLE)?.len()?;
        let commits = read_txn.open_table(COMMITS_TABLE)?.len()?;
        drop(read_txn);

        Ok(StorageStats {
            cards,
            commits,
            sequence: self.get_current_sequence()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Action;

    fn create_test_commit(card: &Card, id: &str) -> Commit {
        Commit {
            id: id.to_string(),
            time: 1,
            card_id: card.id.clone(),
            sequence: 1,
            terminal_id: "t1".to_string(),
            user: "alice".to_string(),
            state: card.clone(),
            actions: vec![Action::new(card.id.clone(), "CLOSE_CARD", serde_json::json!({}))],
        }
    }

    #[test]
    fn test_sequence_increment() {
        let storage = CommitStorage::open_in_memory().unwrap();
        assert_eq!(storage.get_current_sequence().unwrap(), 0);

        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.increment_sequence(&txn).unwrap(), 1);
        assert_eq!(storage.increment_sequence(&txn).unwrap(), 2);
        txn.commit().unwrap();

        assert_eq!(storage.get_current_sequence().unwrap(), 2);
    }

    #[test]
    fn test_commits_are_scoped_and_ordered() {
        let storage = CommitStorage::open_in_memory().unwrap();
        let a = Card::new("a", 0);
        let ab = Card::new("ab", 0);

        let txn = storage.begin_write().unwrap();
        storage.store_commit(&txn, 2, &create_test_commit(&a, "c2")).unwrap();
        storage.store_commit(&txn, 1, &create_test_commit(&a, "c1")).unwrap();
        storage.store_commit(&txn, 3, &create_test_commit(&ab, "c3")).unwrap();
        txn.commit().unwrap();

        let commits = storage.get_commits("a").unwrap();
        let ids: Vec<&str> = commits.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert_eq!(storage.get_commits("ab").unwrap().len(), 1);
        assert!(storage.get_commits("zzz").unwrap().is_empty());
    }

    #[test]
    fn test_last_commit_sequence() {
        let storage = CommitStorage::open_in_memory().unwrap();
        let a = Card::new("a", 0);
        let mut second = create_test_commit(&a, "c2");
        second.sequence = 2;

        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.last_commit_sequence_txn(&txn, "a").unwrap(), 0);
        storage.store_commit(&txn, 4, &create_test_commit(&a, "c1")).unwrap();
        storage.store_commit(&txn, 9, &second).unwrap();
        storage.store_commit(&txn, 10, &create_test_commit(&Card::new("b", 0), "c3")).unwrap();
        assert_eq!(storage.last_commit_sequence_txn(&txn, "a").unwrap(), 2);
        assert_eq!(storage.last_commit_sequence_txn(&txn, "b").unwrap(), 1);
        txn.commit().unwrap();
    }

    #[test]
    fn test_card_data() {
        let storage = CommitStorage::open_in_memory().unwrap();
        assert!(storage.get_card_data("a").unwrap().is_none());

        let card = Card::new("a", 5);
        let txn = storage.begin_write().unwrap();
        storage.store_card(&txn, &card).unwrap();
        storage.store_commit(&txn, 1, &create_test_commit(&card, "c1")).unwrap();
        txn.commit().unwrap();

        let data = storage.get_card_data("a").unwrap().unwrap();
        assert_eq!(data.card, card);
        assert_eq!(data.commits.len(), 1);
        assert_eq!(storage.get_card_ids().unwrap(), vec!["a".to_string()]);

        let stats = storage.get_stats().unwrap();
        assert_eq!(stats.cards, 1);
        assert_eq!(stats.commits, 1);
    }
}
