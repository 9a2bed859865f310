//! Local persistence layer for the note collection.
//!
//! # Responsibility
//! - Define the use-case oriented local store contract.
//! - Isolate SQLite details from collection/sync orchestration.
//!
//! # Invariants
//! - One store instance is scoped to exactly one signed-in identity.
//! - Every operation is atomic per call; no partial note writes are
//!   observable.

pub mod note_store;
