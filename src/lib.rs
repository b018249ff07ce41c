//! This crate serves purely as an rest api abstraction for a store of command line how-tos.
//! Additionally there is a canonical server implementation in the same repository.
//!
//! A [`Command`](api::Command) remembers how to do something on some platform:
//! a free text description, the platform it applies to and the literal command line.
//!
//! ## Usage
//! For the complete usage, see the serde structs in [`api`].
//! * `GET /api/commands` returns every stored [`api::Command`].
//! * `GET /api/commands/{id}` returns a single [`api::Command`] or `404`.
//! * `POST /api/commands` stores a new [`api::CommandBody`], ignoring its `id`.
//!   Responds `201` with a `Location` header and the stored command.
//! * `PUT /api/commands/{id}` overwrites the command, the body `id` has to match the path.
//!   Responds `204`, `400` on an id mismatch or `404` if there is no such command.
//! * `DELETE /api/commands/{id}` removes the command, `404` if there is none.
//! * `GET /api/info` returns an informative [`api::InfoResponse`] object.
//!
//! Failures that carry a body use [`api::ErrorResponse`].
//!
//! ## Security
//! The api does not include any security measures.
//! Make sure it is only reachable from trusted hosts.

pub mod api;
