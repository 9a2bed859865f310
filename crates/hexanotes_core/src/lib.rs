//! Local-first note synchronization engine for HexaNotes.
//!
//! The engine owns the in-memory note collection, persists it to a local
//! per-identity SQLite store, and reconciles it with a remote mirror:
//! either one whole-collection JSON snapshot in a file-storage container
//! (object-mirror mode) or one table row per note (row-mirror mode).
//! Authentication popups, the remote HTTP APIs and all rendering live
//! outside this crate and are injected as capabilities.

pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod remote;
pub mod service;
pub mod store;
pub mod sync;

pub use identity::{AccessToken, AuthError, Identity, IdentityProvider};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{
    default_color, normalize_tags, Attachment, Note, NoteDraft, NoteId, NoteValidationError,
    COLOR_PALETTE,
};
pub use remote::object_mirror::{
    ContainerHandle, ContainerLookup, ObjectHandle, ObjectLookup, ObjectMirror, ObjectStorage,
    SnapshotPull, LEGACY_CONTAINER, LEGACY_SNAPSHOT, PRIMARY_CONTAINER, PRIMARY_SNAPSHOT,
};
pub use remote::row_mirror::{NoteRow, RowMirror, RowTable};
pub use remote::{RemoteError, RemoteResult};
pub use service::collection::{CollectionError, NoteCollection, NoteFilter};
pub use store::note_store::{LocalNoteStore, SqliteNoteStore, StoreError, StoreResult};
pub use sync::coordinator::{PullOutcome, SyncCoordinator, SyncNotice, SyncOptions, SyncState};
pub use sync::debounce::{Clock, DebounceTimer, SystemClock};

/// Returns the engine crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
