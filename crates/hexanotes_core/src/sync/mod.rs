//! Local/remote synchronization scheduling.
//!
//! # Responsibility
//! - Decide when the in-memory collection and the remote mirror exchange
//!   data (debounced push, session-start pull).
//! - Keep remote failures from propagating into user-facing operations.
//!
//! # Invariants
//! - Push failure never discards or corrupts local state.
//! - Pull failure (including malformed remote content) never discards
//!   existing local state.

pub mod coordinator;
pub mod debounce;
