//! Domain model for the note collection.
//!
//! # Responsibility
//! - Define the canonical `Note` record and its attachment descriptors.
//! - Enforce entity-level invariants before anything is persisted.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId` that is never reused.
//! - A note with an empty title is rejected before any persistence.

pub mod note;
