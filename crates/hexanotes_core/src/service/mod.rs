//! Collection-level use-case orchestration.
//!
//! # Responsibility
//! - Own the in-memory note set for the active session.
//! - Keep UI layers decoupled from storage details.

pub mod collection;
