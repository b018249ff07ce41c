use std::path::Path;

use command_api::api::{Command, CommandFields, CommandId, StoreKind};
use rusqlite::{params, Connection, OptionalExtension};

use super::{Change, ChangeSet, Committed, RecordStore, StoreError};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS commands (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  how_to TEXT NOT NULL,
  platform TEXT NOT NULL,
  command_line TEXT NOT NULL
);
";

/// Keeps the commands in a single SQLite table.
///
/// Every commit runs in its own transaction.
pub struct SqliteStore {
    conn: Connection,
    pending: ChangeSet,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Self::with_schema(conn)
    }

    /// A private database that lives as long as the store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_schema(Connection::open_in_memory()?)
    }

    fn with_schema(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            pending: ChangeSet::default(),
        })
    }
}

impl RecordStore for SqliteStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Sqlite
    }

    fn find_all(&self) -> Result<Vec<Command>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, how_to, platform, command_line FROM commands ORDER BY id ASC")?;
        let commands = stmt
            .query_map([], parse_command_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(commands)
    }

    fn find_by_id(&self, id: CommandId) -> Result<Option<Command>, StoreError> {
        let command = self
            .conn
            .query_row(
                "SELECT id, how_to, platform, command_line FROM commands WHERE id = ?1",
                params![id.get()],
                parse_command_row,
            )
            .optional()?;
        Ok(command)
    }

    fn pending(&mut self) -> &mut ChangeSet {
        &mut self.pending
    }

    fn apply(&mut self, changes: ChangeSet) -> Result<Committed, StoreError> {
        // Dropping the transaction on an early return rolls it back.
        let tx = self.conn.transaction()?;
        let mut committed = Committed::default();

        for change in changes {
            match change {
                Change::Add(fields) => {
                    tx.execute(
                        "INSERT INTO commands(how_to, platform, command_line) VALUES (?1, ?2, ?3)",
                        params![fields.how_to, fields.platform, fields.command_line],
                    )?;
                    let id = CommandId::new(tx.last_insert_rowid());
                    committed.inserted.push(Command::new(id, fields));
                }
                Change::Update(command) => {
                    let id = command.id();
                    let fields = command.fields();
                    let changed = tx.execute(
                        "UPDATE commands SET how_to = ?1, platform = ?2, command_line = ?3
                         WHERE id = ?4",
                        params![fields.how_to, fields.platform, fields.command_line, id.get()],
                    )?;
                    if changed == 0 {
                        return Err(StoreError::Missing(id));
                    }
                    committed.updated += 1;
                }
                Change::Remove(id) => {
                    let changed =
                        tx.execute("DELETE FROM commands WHERE id = ?1", params![id.get()])?;
                    if changed == 0 {
                        return Err(StoreError::Missing(id));
                    }
                    committed.removed += 1;
                }
            }
        }

        tx.commit()?;
        Ok(committed)
    }
}

fn parse_command_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Command> {
    Ok(Command::new(
        CommandId::new(row.get(0)?),
        CommandFields {
            how_to: row.get(1)?,
            platform: row.get(2)?,
            command_line: row.get(3)?,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{CommandsController, Outcome};
    use command_api::api::CommandBody;

    fn fields(how_to: &str) -> CommandFields {
        CommandFields {
            how_to: how_to.to_owned(),
            platform: String::from("Some Platform"),
            command_line: String::from("Some Command"),
        }
    }

    #[test]
    fn empty_store_lists_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.find_all().unwrap().is_empty());
        assert_eq!(store.find_by_id(CommandId::new(1)).unwrap(), None);
    }

    #[test]
    fn commit_assigns_ids_and_keeps_fields() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.add(fields("first"));
        store.add(fields("second"));
        assert!(store.find_all().unwrap().is_empty());

        let committed = store.commit().unwrap();
        assert_eq!(committed.inserted.len(), 2);
        assert!(committed.inserted[0].id() < committed.inserted[1].id());

        let stored = store.find_by_id(committed.inserted[1].id()).unwrap();
        assert_eq!(stored.as_ref(), Some(&committed.inserted[1]));
        assert_eq!(store.find_all().unwrap(), committed.inserted);
    }

    #[test]
    fn failed_commit_rolls_back() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.add(fields("kept"));
        store.commit().unwrap();

        store.add(fields("lost"));
        store.update(Command::new(CommandId::new(404), fields("ghost")));
        let err = store.commit().unwrap_err();
        assert!(matches!(err, StoreError::Missing(id) if id == CommandId::new(404)));

        let all = store.find_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].fields().how_to, "kept");
    }

    #[test]
    fn remove_deletes_row() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.add(fields("a"));
        store.add(fields("b"));
        let inserted = store.commit().unwrap().inserted;

        store.remove(inserted[0].id());
        assert_eq!(store.commit().unwrap().removed, 1);
        assert_eq!(store.find_all().unwrap(), vec![inserted[1].clone()]);
    }

    #[test]
    fn update_overwrites_only_the_target() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.add(fields("a"));
        store.add(fields("b"));
        let inserted = store.commit().unwrap().inserted;

        let mut changed = inserted[0].clone();
        *changed.fields_mut() = CommandFields {
            how_to: String::from("Updated"),
            platform: String::from("Other Platform"),
            command_line: String::from("Other Command"),
        };
        store.update(changed.clone());
        assert_eq!(store.commit().unwrap().updated, 1);

        assert_eq!(store.find_by_id(changed.id()).unwrap(), Some(changed));
        assert_eq!(
            store.find_by_id(inserted[1].id()).unwrap(),
            Some(inserted[1].clone())
        );
    }

    #[test]
    fn controller_update_then_delete() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.add(fields("a"));
        store.add(fields("b"));
        let inserted = store.commit().unwrap().inserted;
        let (a, b) = (inserted[0].id(), inserted[1].id());

        let mut controller = CommandsController::new(&mut store);
        let update = CommandBody {
            id: Some(a),
            fields: fields("Updated"),
        };
        assert_eq!(controller.update(a, update).unwrap(), Outcome::NoContent);

        let Outcome::Ok(updated) = controller.get(a).unwrap() else {
            panic!("updated command vanished");
        };
        assert_eq!(updated.fields().how_to, "Updated");
        assert_eq!(controller.get(b).unwrap(), Outcome::Ok(inserted[1].clone()));

        assert_eq!(controller.delete(a).unwrap(), Outcome::Deleted);
        assert_eq!(controller.list().unwrap(), vec![inserted[1].clone()]);
    }

    #[test]
    fn file_database_survives_reopen() {
        // The directory takes the WAL sidecar files with it on drop.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.sqlite3");
        let id = {
            let mut store = SqliteStore::open(&path).unwrap();
            store.add(fields("persisted"));
            store.commit().unwrap().inserted[0].id()
        };

        let store = SqliteStore::open(&path).unwrap();
        let command = store.find_by_id(id).unwrap().expect("row was committed");
        assert_eq!(command.fields().how_to, "persisted");
    }
}
