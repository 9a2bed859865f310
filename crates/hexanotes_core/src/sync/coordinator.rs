//! Sync coordinator: when local and remote state exchange data.
//!
//! # Responsibility
//! - Coalesce rapid mutations into one debounced snapshot push.
//! - Run the session-start pull with legacy fallback and local-wins
//!   recovery on corrupt remote content.
//! - Drive best-effort remote attachment cleanup after note deletion.
//!
//! # Invariants
//! - No second push starts while one is in flight; a mutation arriving
//!   mid-push schedules exactly one follow-up push.
//! - Remote failures surface as notices, never as errors out of
//!   user-facing collection operations.
//! - Neither push nor pull failure ever discards local state.

use crate::identity::IdentityProvider;
use crate::model::note::{Note, NoteId};
use crate::remote::object_mirror::{ObjectMirror, ObjectStorage, SnapshotPull};
use crate::remote::RemoteError;
use crate::service::collection::NoteCollection;
use crate::store::note_store::LocalNoteStore;
use crate::sync::debounce::{Clock, DebounceTimer};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Per-session coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    PendingPush,
    Pushing,
    Pulling,
}

/// Result of a session-start pull. Never an error: remote failures are
/// caught here and surfaced as notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// Remote snapshot won; collection replaced with this many notes.
    Replaced(usize),
    /// No backup at the primary or legacy location (first-ever use).
    FirstUse,
    /// Local state kept (remote unavailable, corrupt, or persist failed).
    KeptLocal,
    /// Credential expired; caller must re-run the external auth flow.
    AuthRequired,
}

/// Non-blocking notices surfaced to the embedder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncNotice {
    /// Re-authentication is required before remote sync can resume.
    AuthRequired,
    /// A snapshot push failed; local state is unaffected.
    PushFailed(String),
    /// A pull failed or its result could not be persisted locally.
    PullFailed(String),
    /// Remote snapshot was undecodable; local state won. `healed` reports
    /// whether the local snapshot was re-pushed over the corrupt copy.
    RemoteCorrupt { healed: bool },
    /// Some remote attachments of a deleted note could not be removed.
    AttachmentsLeftBehind { note_id: NoteId, failed: usize },
}

/// Tunables for the coordinator.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Quiet period between the last mutation and the push.
    pub debounce: Duration,
    /// Re-push the local snapshot after a corrupt pull to heal the remote
    /// copy.
    pub heal_on_corrupt: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1500),
            heal_on_corrupt: true,
        }
    }
}

/// Debounced push / pull scheduler over one object mirror.
pub struct SyncCoordinator<S: ObjectStorage, C: Clock> {
    mirror: ObjectMirror<S>,
    identity: Arc<dyn IdentityProvider>,
    clock: C,
    timer: DebounceTimer,
    state: SyncState,
    follow_up: bool,
    heal_on_corrupt: bool,
    notices: Vec<SyncNotice>,
}

impl<S: ObjectStorage, C: Clock> SyncCoordinator<S, C> {
    pub fn new(
        storage: S,
        identity: Arc<dyn IdentityProvider>,
        clock: C,
        options: SyncOptions,
    ) -> Self {
        Self {
            mirror: ObjectMirror::new(storage),
            identity,
            clock,
            timer: DebounceTimer::new(options.debounce),
            state: SyncState::Idle,
            follow_up: false,
            heal_on_corrupt: options.heal_on_corrupt,
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Records one collection mutation.
    ///
    /// Rapid repeated mutations re-arm the debounce timer instead of firing
    /// one push per mutation. A mutation arriving mid-push marks exactly
    /// one follow-up push.
    pub fn note_mutated(&mut self) {
        match self.state {
            SyncState::Pushing => self.follow_up = true,
            SyncState::Idle | SyncState::PendingPush | SyncState::Pulling => {
                self.state = SyncState::PendingPush;
                self.timer.schedule(self.clock.now());
            }
        }
    }

    /// Returns whether a debounced push is armed and its quiet period has
    /// elapsed.
    pub fn push_due(&self) -> bool {
        self.state == SyncState::PendingPush && self.timer.is_due(self.clock.now())
    }

    /// Pushes the snapshot when the debounce deadline has passed.
    ///
    /// Returns whether a remote write was performed.
    pub fn flush_if_due(&mut self, notes: &[Note]) -> bool {
        if !self.push_due() {
            return false;
        }
        self.push_now(notes)
    }

    /// Pushes the snapshot immediately, bypassing the debounce deadline.
    ///
    /// A push already in flight is never doubled; the call degrades to a
    /// follow-up marker. Push failure leaves local state untouched and is
    /// surfaced as a notice.
    pub fn push_now(&mut self, notes: &[Note]) -> bool {
        if self.state == SyncState::Pushing {
            self.follow_up = true;
            return false;
        }

        if self.identity.acquire_token().is_err() {
            warn!("event=sync_push module=sync status=warn reason=auth_expired");
            // Disarm until re-authentication: a still-armed deadline would
            // make every poll repeat this notice.
            self.timer.cancel_pending();
            self.state = SyncState::Idle;
            self.notices.push(SyncNotice::AuthRequired);
            return false;
        }

        self.timer.cancel_pending();
        self.state = SyncState::Pushing;
        info!(
            "event=sync_push module=sync status=start count={}",
            notes.len()
        );

        let result = self.mirror.write_snapshot(notes);
        self.state = SyncState::Idle;

        let pushed = result.is_ok();
        match result {
            Ok(()) => info!(
                "event=sync_push module=sync status=ok count={}",
                notes.len()
            ),
            Err(RemoteError::AuthExpired) => {
                warn!("event=sync_push module=sync status=warn reason=auth_expired");
                self.notices.push(SyncNotice::AuthRequired);
            }
            Err(err) => {
                warn!("event=sync_push module=sync status=warn error={err}");
                self.notices.push(SyncNotice::PushFailed(err.to_string()));
            }
        }

        if self.follow_up {
            self.follow_up = false;
            self.state = SyncState::PendingPush;
            self.timer.schedule(self.clock.now());
        }

        pushed
    }

    /// Session-start pull: primary location, then legacy, then silent
    /// give-up on first-ever use.
    ///
    /// On a decodable snapshot the collection is bulk-replaced (remote
    /// wins). On corrupt content local state wins and, when configured, the
    /// local snapshot is re-pushed to heal the remote copy.
    pub fn pull<L: LocalNoteStore>(&mut self, collection: &mut NoteCollection<L>) -> PullOutcome {
        self.state = SyncState::Pulling;
        let outcome = self.pull_inner(collection);
        self.state = SyncState::Idle;
        outcome
    }

    fn pull_inner<L: LocalNoteStore>(
        &mut self,
        collection: &mut NoteCollection<L>,
    ) -> PullOutcome {
        if self.identity.acquire_token().is_err() {
            warn!("event=sync_pull module=sync status=warn reason=auth_expired");
            self.notices.push(SyncNotice::AuthRequired);
            return PullOutcome::AuthRequired;
        }

        match self.mirror.pull_snapshot() {
            Ok(SnapshotPull::Notes(notes)) => match collection.replace_all(notes) {
                Ok(()) => {
                    info!(
                        "event=sync_pull module=sync status=ok count={}",
                        collection.len()
                    );
                    PullOutcome::Replaced(collection.len())
                }
                Err(err) => {
                    warn!("event=sync_pull module=sync status=warn error={err}");
                    self.notices.push(SyncNotice::PullFailed(err.to_string()));
                    PullOutcome::KeptLocal
                }
            },
            Ok(SnapshotPull::NoBackup) => {
                info!("event=sync_pull module=sync status=ok reason=no_backup");
                PullOutcome::FirstUse
            }
            Err(RemoteError::AuthExpired) => {
                warn!("event=sync_pull module=sync status=warn reason=auth_expired");
                self.notices.push(SyncNotice::AuthRequired);
                PullOutcome::AuthRequired
            }
            Err(err @ RemoteError::CorruptSnapshot(_)) => {
                warn!("event=sync_pull module=sync status=warn error={err}");
                let healed =
                    self.heal_on_corrupt && self.mirror.write_snapshot(collection.notes()).is_ok();
                self.notices.push(SyncNotice::RemoteCorrupt { healed });
                PullOutcome::KeptLocal
            }
            Err(err) => {
                warn!("event=sync_pull module=sync status=warn error={err}");
                self.notices.push(SyncNotice::PullFailed(err.to_string()));
                PullOutcome::KeptLocal
            }
        }
    }

    /// Best-effort remote cleanup of a deleted note's attachments.
    ///
    /// Individual failures never abort the deletion; they are counted and
    /// surfaced as one notice.
    pub fn cleanup_attachments(&mut self, removed: &Note) {
        let failed = self.mirror.delete_attachments(removed);
        if failed > 0 {
            self.notices.push(SyncNotice::AttachmentsLeftBehind {
                note_id: removed.id,
                failed,
            });
        }
    }

    /// Drains accumulated non-blocking notices.
    pub fn take_notices(&mut self) -> Vec<SyncNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Direct access to the underlying mirror, for attachment uploads.
    pub fn mirror(&self) -> &ObjectMirror<S> {
        &self.mirror
    }
}
