//! Row-mirror adapter: one remote table row per note.
//!
//! # Responsibility
//! - Map per-note CRUD 1:1 onto rows of a remote table.
//! - Constrain every query to the owning identity.
//!
//! # Invariants
//! - All operations are filtered by `owner_id = current identity`.
//! - Listing is ordered by `created_at` descending.

use crate::model::note::{default_color, Note, NoteId};
use crate::remote::{RemoteError, RemoteResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire shape of one note row in the remote table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRow {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub owner_id: String,
    pub created_at: i64,
}

/// Capability contract against the remote table service.
///
/// Implementations wrap an already-authorized client; the core never sees
/// transport details.
pub trait RowTable {
    fn insert_row(&self, row: &NoteRow) -> RemoteResult<()>;
    fn update_row(&self, owner_id: &str, row: &NoteRow) -> RemoteResult<()>;
    fn delete_row(&self, owner_id: &str, id: &str) -> RemoteResult<()>;
    fn list_rows(&self, owner_id: &str) -> RemoteResult<Vec<NoteRow>>;
}

impl<T: RowTable + ?Sized> RowTable for &T {
    fn insert_row(&self, row: &NoteRow) -> RemoteResult<()> {
        (**self).insert_row(row)
    }

    fn update_row(&self, owner_id: &str, row: &NoteRow) -> RemoteResult<()> {
        (**self).update_row(owner_id, row)
    }

    fn delete_row(&self, owner_id: &str, id: &str) -> RemoteResult<()> {
        (**self).delete_row(owner_id, id)
    }

    fn list_rows(&self, owner_id: &str) -> RemoteResult<Vec<NoteRow>> {
        (**self).list_rows(owner_id)
    }
}

/// Per-row mirror over a `RowTable` capability, scoped to one owner.
pub struct RowMirror<T: RowTable> {
    table: T,
    owner_id: String,
}

impl<T: RowTable> RowMirror<T> {
    pub fn new(table: T, owner_id: impl Into<String>) -> Self {
        Self {
            table,
            owner_id: owner_id.into(),
        }
    }

    /// Inserts one note as a new row.
    pub fn create_note(&self, note: &Note) -> RemoteResult<()> {
        self.table.insert_row(&self.to_row(note))
    }

    /// Updates the row backing one note.
    pub fn update_note(&self, note: &Note) -> RemoteResult<()> {
        self.table.update_row(&self.owner_id, &self.to_row(note))
    }

    /// Deletes the row backing one note id.
    pub fn delete_note(&self, id: NoteId) -> RemoteResult<()> {
        self.table.delete_row(&self.owner_id, &id.to_string())
    }

    /// Fetches all notes of the owner, newest first.
    ///
    /// Row ordering is enforced here rather than trusted from the service.
    pub fn fetch_notes(&self) -> RemoteResult<Vec<Note>> {
        let mut rows = self.table.list_rows(&self.owner_id)?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.into_iter().map(row_to_note).collect()
    }

    fn to_row(&self, note: &Note) -> NoteRow {
        NoteRow {
            id: note.id.to_string(),
            title: note.title.clone(),
            content: note.content.clone(),
            tags: note.tags.clone(),
            owner_id: self.owner_id.clone(),
            created_at: note.created_at,
        }
    }
}

/// The table schema carries no color or attachments; rows map back to notes
/// with the default color and no files.
fn row_to_note(row: NoteRow) -> RemoteResult<Note> {
    let id = Uuid::parse_str(&row.id)
        .map_err(|_| RemoteError::CorruptSnapshot(format!("invalid row id `{}`", row.id)))?;

    Ok(Note {
        id,
        title: row.title,
        content: row.content,
        tags: row.tags,
        color: default_color(),
        files: Vec::new(),
        created_at: row.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::{NoteRow, RowMirror, RowTable};
    use crate::model::note::{Note, NoteDraft};
    use crate::remote::{RemoteError, RemoteResult};
    use std::cell::RefCell;

    #[derive(Default)]
    struct MemoryTable {
        rows: RefCell<Vec<NoteRow>>,
    }

    impl RowTable for MemoryTable {
        fn insert_row(&self, row: &NoteRow) -> RemoteResult<()> {
            self.rows.borrow_mut().push(row.clone());
            Ok(())
        }

        fn update_row(&self, owner_id: &str, row: &NoteRow) -> RemoteResult<()> {
            let mut rows = self.rows.borrow_mut();
            match rows
                .iter_mut()
                .find(|candidate| candidate.owner_id == owner_id && candidate.id == row.id)
            {
                Some(existing) => {
                    *existing = row.clone();
                    Ok(())
                }
                None => Err(RemoteError::Unavailable("row not found".to_string())),
            }
        }

        fn delete_row(&self, owner_id: &str, id: &str) -> RemoteResult<()> {
            self.rows
                .borrow_mut()
                .retain(|row| !(row.owner_id == owner_id && row.id == id));
            Ok(())
        }

        fn list_rows(&self, owner_id: &str) -> RemoteResult<Vec<NoteRow>> {
            Ok(self
                .rows
                .borrow()
                .iter()
                .filter(|row| row.owner_id == owner_id)
                .cloned()
                .collect())
        }
    }

    fn note(title: &str, created_at: i64) -> Note {
        let mut note = Note::from_draft(NoteDraft {
            title: title.to_string(),
            content: "body".to_string(),
            ..NoteDraft::default()
        })
        .expect("valid draft");
        note.created_at = created_at;
        note
    }

    #[test]
    fn fetch_is_owner_scoped_and_newest_first() {
        let table = MemoryTable::default();
        let mine = RowMirror::new(&table, "owner-a");
        let theirs = RowMirror::new(&table, "owner-b");

        mine.create_note(&note("old", 1_000)).expect("insert old");
        mine.create_note(&note("new", 2_000)).expect("insert new");
        theirs
            .create_note(&note("foreign", 3_000))
            .expect("insert foreign");

        let fetched = mine.fetch_notes().expect("fetch");
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].title, "new");
        assert_eq!(fetched[1].title, "old");
    }

    #[test]
    fn update_and_delete_map_to_row_crud() {
        let table = MemoryTable::default();
        let mirror = RowMirror::new(&table, "owner-a");

        let mut target = note("before", 1_000);
        mirror.create_note(&target).expect("insert");

        target.content = "after".to_string();
        mirror.update_note(&target).expect("update");
        let fetched = mirror.fetch_notes().expect("fetch");
        assert_eq!(fetched[0].content, "after");

        mirror.delete_note(target.id).expect("delete");
        assert!(mirror.fetch_notes().expect("fetch").is_empty());
    }
}
