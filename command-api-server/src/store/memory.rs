use std::collections::{BTreeMap, BTreeSet};

use command_api::api::{Command, CommandId, StoreKind};

use super::{Change, ChangeSet, Committed, RecordStore, StoreError};

/// Keeps the commands in process memory, lost on shutdown.
#[derive(Debug)]
pub struct MemoryStore {
    records: BTreeMap<CommandId, Command>,
    next_id: i64,
    pending: ChangeSet,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 1,
            pending: ChangeSet::default(),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails on the first update or removal whose target would not exist at that point,
    /// before anything is mutated.
    fn check(&self, changes: &[Change]) -> Result<(), StoreError> {
        let mut next_id = self.next_id;
        let mut added = BTreeSet::new();
        let mut removed = BTreeSet::new();
        let exists = |id: &CommandId, added: &BTreeSet<CommandId>, removed: &BTreeSet<CommandId>| {
            (self.records.contains_key(id) || added.contains(id)) && !removed.contains(id)
        };

        for change in changes {
            match change {
                Change::Add(_) => {
                    added.insert(CommandId::new(next_id));
                    next_id += 1;
                }
                Change::Update(command) => {
                    let id = command.id();
                    if !exists(&id, &added, &removed) {
                        return Err(StoreError::Missing(id));
                    }
                }
                Change::Remove(id) => {
                    if !exists(id, &added, &removed) {
                        return Err(StoreError::Missing(*id));
                    }
                    removed.insert(*id);
                }
            }
        }
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Memory
    }

    fn find_all(&self) -> Result<Vec<Command>, StoreError> {
        Ok(self.records.values().cloned().collect())
    }

    fn find_by_id(&self, id: CommandId) -> Result<Option<Command>, StoreError> {
        Ok(self.records.get(&id).cloned())
    }

    fn pending(&mut self) -> &mut ChangeSet {
        &mut self.pending
    }

    fn apply(&mut self, changes: ChangeSet) -> Result<Committed, StoreError> {
        let changes: Vec<Change> = changes.into_iter().collect();
        self.check(&changes)?;

        let mut committed = Committed::default();
        for change in changes {
            match change {
                Change::Add(fields) => {
                    let command = Command::new(CommandId::new(self.next_id), fields);
                    self.next_id += 1;
                    self.records.insert(command.id(), command.clone());
                    committed.inserted.push(command);
                }
                Change::Update(command) => {
                    self.records.insert(command.id(), command);
                    committed.updated += 1;
                }
                Change::Remove(id) => {
                    self.records.remove(&id);
                    committed.removed += 1;
                }
            }
        }
        Ok(committed)
    }
}
