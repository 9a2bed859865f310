//! Remote mirror adapters.
//!
//! # Responsibility
//! - Translate whole-collection and per-row synchronization intents into
//!   calls against opaque remote storage capabilities.
//! - Classify remote failures so the sync layer can react per policy.
//!
//! # Invariants
//! - Authentication failures are surfaced distinctly (`AuthExpired`) so
//!   callers force re-authentication instead of retrying.
//! - All other remote failures are non-fatal; the local collection stays
//!   usable offline.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod object_mirror;
pub mod row_mirror;

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Remote failure taxonomy shared by both mirror modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Expired or missing credential; caller must re-authenticate.
    AuthExpired,
    /// Network or service failure; non-fatal, local state remains the
    /// fallback of record.
    Unavailable(String),
    /// Remote content exists but does not decode to a note collection.
    CorruptSnapshot(String),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthExpired => write!(f, "remote credential expired"),
            Self::Unavailable(message) => write!(f, "remote unavailable: {message}"),
            Self::CorruptSnapshot(message) => write!(f, "corrupt remote snapshot: {message}"),
        }
    }
}

impl Error for RemoteError {}
