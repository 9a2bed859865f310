//! Note collection manager.
//!
//! # Responsibility
//! - Act as the single in-memory authority for the active note set.
//! - Apply every mutation to the local store before the in-memory copy, so
//!   a failed persist leaves the session state untouched.
//!
//! # Invariants
//! - `id` is unique within the collection at all times.
//! - A note with an empty title never reaches the store.
//! - `replace_all` is last-writer-wins: the remote snapshot fully replaces
//!   local state, identity of note objects is not preserved.

use crate::model::note::{Note, NoteDraft, NoteId, NoteValidationError};
use crate::store::note_store::{LocalNoteStore, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error surface of collection mutations.
#[derive(Debug)]
pub enum CollectionError {
    /// Rejected before any persistence; user-correctable.
    Validation(NoteValidationError),
    /// Operation on an unknown note id; no state change.
    NotFound(NoteId),
    /// Local persistence failure.
    Store(StoreError),
}

impl Display for CollectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CollectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<NoteValidationError> for CollectionError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for CollectionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Read-only query filter for `NoteCollection::query`.
///
/// `text` is a case-insensitive substring match over title, content and the
/// joined tag list; `tag` restricts to notes carrying that exact tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub text: Option<String>,
    pub tag: Option<String>,
}

impl NoteFilter {
    /// Matches every note.
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Substring filter over title/content/tags.
    pub fn text(term: impl Into<String>) -> Self {
        Self {
            text: Some(term.into()),
            tag: None,
        }
    }

    fn matches(&self, note: &Note) -> bool {
        if let Some(term) = &self.text {
            let term = term.to_lowercase();
            let in_title = note.title.to_lowercase().contains(&term);
            let in_content = note.content.to_lowercase().contains(&term);
            let in_tags = note.tags.join(",").to_lowercase().contains(&term);
            if !(in_title || in_content || in_tags) {
                return false;
            }
        }

        if let Some(tag) = &self.tag {
            let tag = tag.trim().to_lowercase();
            // Stored tags are compared lowercased too: snapshots restored
            // from the remote may predate local tag normalization.
            if !note
                .tags
                .iter()
                .any(|candidate| candidate.trim().to_lowercase() == tag)
            {
                return false;
            }
        }

        true
    }
}

/// Single in-memory authority for the active note set.
///
/// Constructed with an injected local store; the session collection is
/// mutated only through these operations.
pub struct NoteCollection<S: LocalNoteStore> {
    store: S,
    notes: Vec<Note>,
}

impl<S: LocalNoteStore> NoteCollection<S> {
    /// Loads the session collection from the local store.
    pub fn load(store: S) -> Result<Self, CollectionError> {
        let notes = store.get_all()?;
        Ok(Self { store, notes })
    }

    /// Creates one note from draft fields and persists it.
    ///
    /// # Errors
    /// - `Validation` when the title is blank; collection unchanged.
    pub fn create(&mut self, draft: NoteDraft) -> Result<Note, CollectionError> {
        let note = Note::from_draft(draft)?;
        self.store.put(&note)?;
        self.notes.push(note.clone());
        info!(
            "event=note_create module=collection status=ok note_id={} count={}",
            note.id,
            self.notes.len()
        );
        Ok(note)
    }

    /// Replaces title/content/tags/color of one note and appends any newly
    /// supplied files; persists the result.
    ///
    /// # Errors
    /// - `NotFound` when the id is unknown; collection unchanged.
    /// - `Validation` when the new title is blank; collection unchanged.
    pub fn update(&mut self, id: NoteId, draft: NoteDraft) -> Result<Note, CollectionError> {
        let position = self.position(id).ok_or(CollectionError::NotFound(id))?;

        let mut updated = self.notes[position].clone();
        updated.apply_update(draft)?;
        self.store.put(&updated)?;
        self.notes[position] = updated.clone();
        Ok(updated)
    }

    /// Removes one note and persists the removal.
    ///
    /// Returns the removed note so the caller can drive best-effort remote
    /// attachment cleanup.
    ///
    /// # Errors
    /// - `NotFound` when the id is unknown (including repeated deletes).
    pub fn delete(&mut self, id: NoteId) -> Result<Note, CollectionError> {
        let position = self.position(id).ok_or(CollectionError::NotFound(id))?;
        self.store.remove(id)?;
        let removed = self.notes.remove(position);
        info!(
            "event=note_delete module=collection status=ok note_id={id} count={}",
            self.notes.len()
        );
        Ok(removed)
    }

    /// Wholesale replaces the collection from a remote snapshot.
    ///
    /// No merge with pre-existing local notes is attempted; the snapshot
    /// wins entirely. Records that violate entity invariants (blank title,
    /// duplicate id) are dropped with a warning rather than aborting the
    /// restore.
    pub fn replace_all(&mut self, notes: Vec<Note>) -> Result<(), CollectionError> {
        let mut accepted: Vec<Note> = Vec::with_capacity(notes.len());
        for note in notes {
            if note.validate().is_err() {
                warn!(
                    "event=replace_all module=collection status=warn reason=blank_title note_id={}",
                    note.id
                );
                continue;
            }
            if accepted.iter().any(|existing| existing.id == note.id) {
                warn!(
                    "event=replace_all module=collection status=warn reason=duplicate_id note_id={}",
                    note.id
                );
                continue;
            }
            accepted.push(note);
        }

        // One atomic swap: a persist failure must not leave the durable
        // copy half-replaced or emptied.
        self.store.replace_all(&accepted)?;

        info!(
            "event=replace_all module=collection status=ok count={}",
            accepted.len()
        );
        self.notes = accepted;
        Ok(())
    }

    /// Lazy, restartable iteration over notes matching the filter.
    ///
    /// Read-only; calling `query` again restarts the sequence. The filter
    /// is captured by value so only `self` constrains the borrowed items.
    pub fn query<'a>(&'a self, filter: &NoteFilter) -> impl Iterator<Item = &'a Note> + 'a {
        let filter = filter.clone();
        self.notes.iter().filter(move |note| filter.matches(note))
    }

    /// Returns the current session notes in insertion order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Returns one note by id.
    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    fn position(&self, id: NoteId) -> Option<usize> {
        self.notes.iter().position(|note| note.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::{CollectionError, NoteCollection, NoteFilter};
    use crate::model::note::{Note, NoteDraft};
    use crate::store::note_store::SqliteNoteStore;
    use uuid::Uuid;

    fn collection() -> NoteCollection<SqliteNoteStore> {
        let store = SqliteNoteStore::open_in_memory().expect("in-memory store");
        NoteCollection::load(store).expect("empty collection")
    }

    fn draft(title: &str, content: &str) -> NoteDraft {
        NoteDraft {
            title: title.to_string(),
            content: content.to_string(),
            ..NoteDraft::default()
        }
    }

    #[test]
    fn query_text_matches_title_content_and_tags() {
        let mut collection = collection();
        collection
            .create(NoteDraft {
                tags: vec!["groceries".to_string()],
                ..draft("Shopping", "milk, eggs")
            })
            .expect("create");
        collection.create(draft("Workout", "leg day")).expect("create");

        assert_eq!(collection.query(&NoteFilter::text("MILK")).count(), 1);
        assert_eq!(collection.query(&NoteFilter::text("shop")).count(), 1);
        assert_eq!(collection.query(&NoteFilter::text("grocer")).count(), 1);
        assert_eq!(collection.query(&NoteFilter::match_all()).count(), 2);
    }

    #[test]
    fn query_accepts_a_temporary_filter() {
        let mut collection = collection();
        collection.create(draft("one", "")).expect("create");

        let matched: Vec<_> = collection.query(&NoteFilter::match_all()).collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].title, "one");
    }

    #[test]
    fn restored_snapshot_tags_match_case_insensitively() {
        let mut collection = collection();
        let mut restored = Note::from_draft(draft("Meeting", "agenda")).expect("valid note");
        // Remote snapshots may carry tags that predate local normalization.
        restored.tags = vec!["Work".to_string()];
        collection.replace_all(vec![restored]).expect("replace");

        assert_eq!(collection.query(&NoteFilter::text("work")).count(), 1);

        let filter = NoteFilter {
            text: None,
            tag: Some("work".to_string()),
        };
        assert_eq!(collection.query(&filter).count(), 1);
    }

    #[test]
    fn query_is_restartable() {
        let mut collection = collection();
        collection.create(draft("one", "")).expect("create");
        collection.create(draft("two", "")).expect("create");

        let filter = NoteFilter::match_all();
        assert_eq!(collection.query(&filter).count(), 2);
        assert_eq!(collection.query(&filter).count(), 2);
    }

    #[test]
    fn update_on_unknown_id_is_not_found() {
        let mut collection = collection();
        let err = collection
            .update(Uuid::new_v4(), draft("x", "y"))
            .expect_err("unknown id must fail");
        assert!(matches!(err, CollectionError::NotFound(_)));
        assert!(collection.is_empty());
    }

    #[test]
    fn replace_all_drops_invalid_records() {
        let mut collection = collection();
        let keeper = Note::from_draft(draft("keeper", "body")).expect("valid note");
        let mut blank = keeper.clone();
        blank.id = Uuid::new_v4();
        blank.title = "   ".to_string();
        let duplicate = keeper.clone();

        collection
            .replace_all(vec![keeper.clone(), blank, duplicate])
            .expect("replace");
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.notes()[0].id, keeper.id);
    }
}
