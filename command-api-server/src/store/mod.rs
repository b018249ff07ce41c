//! Persistence of [`Command`] records.
//!
//! A [`RecordStore`] stages mutations until [`RecordStore::commit`] applies them all at once.
//! Reads only ever see committed state.

use std::sync::PoisonError;

use command_api::api::{Command, CommandFields, CommandId, StoreKind};
use thiserror::Error;

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("command {0} is not stored")]
    Missing(CommandId),

    #[error("store lock poisoned: {0}")]
    Poisoned(String),

    #[error("commit did not insert the staged command")]
    NothingInserted,
}

impl<T> From<PoisonError<T>> for StoreError {
    fn from(err: PoisonError<T>) -> Self {
        Self::Poisoned(err.to_string())
    }
}

/// A single staged mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Add(CommandFields),
    Update(Command),
    Remove(CommandId),
}

/// Mutations waiting for the next commit, in staging order.
#[derive(Debug, Default)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

/// What a successful commit did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Committed {
    /// Newly stored commands with their assigned ids, in staging order.
    pub inserted: Vec<Command>,
    pub updated: usize,
    pub removed: usize,
}

/// Storage for commands keyed by [`CommandId`].
///
/// Implementors provide the committed reads and an all-or-nothing [`RecordStore::apply`].
/// Staging and committing are shared.
pub trait RecordStore: Send {
    fn kind(&self) -> StoreKind;

    /// All committed commands, ordered by id.
    fn find_all(&self) -> Result<Vec<Command>, StoreError>;

    fn find_by_id(&self, id: CommandId) -> Result<Option<Command>, StoreError>;

    fn pending(&mut self) -> &mut ChangeSet;

    /// Applies every change or none of them.
    ///
    /// Ids for added commands are assigned here, strictly increasing and never reused.
    fn apply(&mut self, changes: ChangeSet) -> Result<Committed, StoreError>;

    /// Stages a new command, the id is assigned on commit.
    fn add(&mut self, fields: CommandFields) {
        self.pending().push(Change::Add(fields));
    }

    /// Stages overwriting the stored command with the same id.
    fn update(&mut self, command: Command) {
        self.pending().push(Change::Update(command));
    }

    fn remove(&mut self, id: CommandId) {
        self.pending().push(Change::Remove(id));
    }

    /// Applies the staged changes.
    ///
    /// The staged changes are consumed even if applying them fails.
    fn commit(&mut self) -> Result<Committed, StoreError> {
        let changes = std::mem::take(self.pending());
        if changes.is_empty() {
            return Ok(Committed::default());
        }
        log::trace!(changes = changes.len(); "committing");
        self.apply(changes)
    }
}
