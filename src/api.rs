use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Version of this api contract, reported by `/api/info`.
pub const VERSION: &str = "1.0.0";

/// Identifier of a stored [`Command`].
///
/// Assigned by the store when a command is created and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(i64);

impl CommandId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CommandId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// The mutable part of a [`Command`].
///
/// None of the fields are required to be non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandFields {
    /// Free text describing what the command does.
    pub how_to: String,
    /// The platform the command applies to.
    pub platform: String,
    /// The literal command to run.
    pub command_line: String,
}

/// A stored command.
///
/// # Serialized Example
/// ```
/// # let ser = r#"
/// {
///     "id": 7,
///     "howTo": "Run unit tests",
///     "platform": "cargo",
///     "commandLine": "cargo test"
/// }
/// # "#;
/// # let deser: command_api::api::Command
/// #    = serde_json::from_str(ser).expect("failed parsing");
/// # assert_eq!(deser.id().get(), 7);
/// # assert_eq!(deser.fields().command_line, "cargo test");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    id: CommandId,
    #[serde(flatten)]
    fields: CommandFields,
}

impl Command {
    /// Pairs fields with the id a store assigned to them.
    pub fn new(id: CommandId, fields: CommandFields) -> Self {
        Self { id, fields }
    }

    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn fields(&self) -> &CommandFields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut CommandFields {
        &mut self.fields
    }
}

/// Request body for `POST /api/commands` and `PUT /api/commands/{id}`.
///
/// The `id` is ignored on creation. On update it has to equal the path id,
/// a missing `id` counts as a mismatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CommandId>,
    #[serde(flatten)]
    pub fields: CommandFields,
}

/// Describes the json response format for `/api/info`.
#[derive(Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    /// Equal to [`VERSION`] of the server.
    pub api_version: String,
    /// Which kind of record store backs the server.
    pub store: StoreKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreKind {
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "sqlite")]
    Sqlite,
}

/// Body of every failure response that carries one.
///
/// # Serialized Example
/// ```
/// # let ser = r#"
/// {
///     "code": "id_mismatch",
///     "message": "path id 3 does not match body id 4"
/// }
/// # "#;
/// # let deser: command_api::api::ErrorResponse
/// #    = serde_json::from_str(ser).expect("failed parsing");
/// # assert_eq!(deser.code, "id_mismatch");
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable, machine readable classification.
    pub code: String,
    pub message: String,
}
