//! The resource controller for `/api/commands`.
//!
//! Every operation performs at most one store mutation followed by one commit.

use command_api::api::{Command, CommandBody, CommandId};

use crate::store::{RecordStore, StoreError};

/// Base path of the command resource.
pub const COMMANDS_PATH: &str = "/api/commands";

/// Transport independent result of a controller operation.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    Ok(T),
    /// A new resource exists at `location`.
    Created { location: String, value: T },
    /// Success after a mutation, nothing to return.
    NoContent,
    /// The resource was removed, nothing to return.
    Deleted,
    NotFound,
    BadRequest(String),
}

/// Where a command can be fetched again.
pub fn location(id: CommandId) -> String {
    format!("{COMMANDS_PATH}/{id}")
}

pub struct CommandsController<'s> {
    store: &'s mut dyn RecordStore,
}

impl<'s> CommandsController<'s> {
    pub fn new(store: &'s mut dyn RecordStore) -> Self {
        Self { store }
    }

    pub fn list(&self) -> Result<Vec<Command>, StoreError> {
        self.store.find_all()
    }

    pub fn get(&self, id: CommandId) -> Result<Outcome<Command>, StoreError> {
        Ok(match self.store.find_by_id(id)? {
            Some(command) => Outcome::Ok(command),
            None => Outcome::NotFound,
        })
    }

    /// Stores the body fields under a fresh id, the body id is ignored.
    pub fn create(&mut self, body: CommandBody) -> Result<Outcome<Command>, StoreError> {
        if let Some(ignored) = body.id {
            log::debug!(ignored:display; "ignoring client supplied id");
        }
        self.store.add(body.fields);
        let command = self
            .store
            .commit()?
            .inserted
            .into_iter()
            .next()
            .ok_or(StoreError::NothingInserted)?;

        let id = command.id();
        log::info!(id:display; "created command");
        Ok(Outcome::Created {
            location: location(id),
            value: command,
        })
    }

    /// Overwrites the stored fields of `id`.
    ///
    /// The body has to carry the same id. An unknown id is reported as not found.
    pub fn update(&mut self, id: CommandId, body: CommandBody) -> Result<Outcome<()>, StoreError> {
        if body.id != Some(id) {
            let reason = match body.id {
                Some(body_id) => format!("path id {id} does not match body id {body_id}"),
                None => format!("body is missing id {id}"),
            };
            log::debug!(id:display; "rejecting update: {reason}");
            return Ok(Outcome::BadRequest(reason));
        }

        let Some(mut command) = self.store.find_by_id(id)? else {
            return Ok(Outcome::NotFound);
        };
        *command.fields_mut() = body.fields;
        self.store.update(command);
        let committed = self.store.commit()?;

        log::info!(id:display, updated = committed.updated; "updated command");
        Ok(Outcome::NoContent)
    }

    pub fn delete(&mut self, id: CommandId) -> Result<Outcome<()>, StoreError> {
        if self.store.find_by_id(id)?.is_none() {
            return Ok(Outcome::NotFound);
        }
        self.store.remove(id);
        let committed = self.store.commit()?;

        log::info!(id:display, removed = committed.removed; "deleted command");
        Ok(Outcome::Deleted)
    }
}
