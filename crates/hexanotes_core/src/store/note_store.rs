//! Local note store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide durable local persistence for the note collection.
//! - Namespace stored data per signed-in identity so account switches on
//!   the same device never leak or merge notes.
//!
//! # Invariants
//! - `open` fails with `NotAuthenticated` when no identity key is given.
//! - `remove` on an absent id is a no-op, not an error.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::{open_store, open_store_in_memory, DbError};
use crate::model::note::{Attachment, Note, NoteId};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use uuid::Uuid;

static IDENTITY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid identity key regex"));

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    tags,
    color,
    files,
    created_at
FROM notes";

pub type StoreResult<T> = Result<T, StoreError>;

/// Local store error for note persistence operations.
#[derive(Debug)]
pub enum StoreError {
    /// No signed-in identity available; the store cannot be namespaced.
    NotAuthenticated,
    /// Connection bootstrap or SQL failure.
    Db(DbError),
    /// Persisted state failed to decode back into a note.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "no signed-in identity for local store"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotAuthenticated | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Contract for durable local note persistence.
///
/// All operations are atomic per call.
pub trait LocalNoteStore {
    /// Returns the full stored note set; empty when none.
    fn get_all(&self) -> StoreResult<Vec<Note>>;
    /// Upserts one note by id.
    fn put(&self, note: &Note) -> StoreResult<()>;
    /// Deletes one note by id; no-op when absent.
    fn remove(&self, id: NoteId) -> StoreResult<()>;
    /// Atomically swaps the full stored note set for `notes`.
    ///
    /// All-or-nothing: on failure the previously stored notes survive.
    /// `notes` must carry unique ids.
    fn replace_all(&self, notes: &[Note]) -> StoreResult<()>;
    /// Wipes all stored notes. Used on explicit logout.
    fn clear(&self) -> StoreResult<()>;
}

/// SQLite-backed local note store.
pub struct SqliteNoteStore {
    conn: Connection,
}

impl SqliteNoteStore {
    /// Opens (or creates) the store for one identity inside `dir`.
    ///
    /// The database file name is derived from the identity key (for example
    /// the account email), so each account gets its own file.
    ///
    /// # Errors
    /// - `NotAuthenticated` when `identity_key` is blank.
    pub fn open(dir: impl AsRef<Path>, identity_key: &str) -> StoreResult<Self> {
        let path = store_path(dir.as_ref(), identity_key)?;
        let conn = open_store(path)?;
        Ok(Self { conn })
    }

    /// Opens an in-memory store. Used by tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = open_store_in_memory()?;
        Ok(Self { conn })
    }
}

impl LocalNoteStore for SqliteNoteStore {
    fn get_all(&self) -> StoreResult<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} ORDER BY created_at ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();

        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }

        Ok(notes)
    }

    fn put(&self, note: &Note) -> StoreResult<()> {
        upsert_note(&self.conn, note)
    }

    fn remove(&self, id: NoteId) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM notes WHERE id = ?1;", [id.to_string()])?;
        Ok(())
    }

    fn replace_all(&self, notes: &[Note]) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM notes;", [])?;
        for note in notes {
            // Plain INSERT: the table was just emptied, so a duplicate id
            // in the input is a caller bug and aborts the whole swap.
            insert_note(&tx, note)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        self.conn.execute("DELETE FROM notes;", [])?;
        Ok(())
    }
}

/// Derives the per-identity database path inside `dir`.
///
/// # Errors
/// - `NotAuthenticated` when the key is blank or reduces to nothing after
///   sanitization.
pub fn store_path(dir: &Path, identity_key: &str) -> StoreResult<PathBuf> {
    let normalized = identity_key.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return Err(StoreError::NotAuthenticated);
    }

    let slug = IDENTITY_KEY_RE.replace_all(&normalized, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        return Err(StoreError::NotAuthenticated);
    }

    Ok(dir.join(format!("notes-{slug}.db")))
}

fn upsert_note(conn: &Connection, note: &Note) -> StoreResult<()> {
    let tags = encode_json(&note.tags, "notes.tags")?;
    let files = encode_json(&note.files, "notes.files")?;

    conn.execute(
        "INSERT INTO notes (id, title, content, tags, color, files, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            content = excluded.content,
            tags = excluded.tags,
            color = excluded.color,
            files = excluded.files;",
        params![
            note.id.to_string(),
            note.title.as_str(),
            note.content.as_str(),
            tags,
            note.color.as_str(),
            files,
            note.created_at,
        ],
    )?;

    Ok(())
}

fn insert_note(conn: &Connection, note: &Note) -> StoreResult<()> {
    let tags = encode_json(&note.tags, "notes.tags")?;
    let files = encode_json(&note.files, "notes.files")?;

    conn.execute(
        "INSERT INTO notes (id, title, content, tags, color, files, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            note.id.to_string(),
            note.title.as_str(),
            note.content.as_str(),
            tags,
            note.color.as_str(),
            files,
            note.created_at,
        ],
    )?;

    Ok(())
}

fn parse_note_row(row: &Row<'_>) -> StoreResult<Note> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| StoreError::InvalidData(format!("invalid id value `{id_text}` in notes.id")))?;

    let tags_text: String = row.get("tags")?;
    let tags: Vec<String> = serde_json::from_str(&tags_text)
        .map_err(|err| StoreError::InvalidData(format!("invalid notes.tags payload: {err}")))?;

    let files_text: String = row.get("files")?;
    let files: Vec<Attachment> = serde_json::from_str(&files_text)
        .map_err(|err| StoreError::InvalidData(format!("invalid notes.files payload: {err}")))?;

    let note = Note {
        id,
        title: row.get("title")?,
        content: row.get("content")?,
        tags,
        color: row.get("color")?,
        files,
        created_at: row.get("created_at")?,
    };
    note.validate()
        .map_err(|err| StoreError::InvalidData(err.to_string()))?;
    Ok(note)
}

fn encode_json<T: serde::Serialize>(value: &T, column: &str) -> StoreResult<String> {
    serde_json::to_string(value)
        .map_err(|err| StoreError::InvalidData(format!("cannot encode {column}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::{store_path, StoreError};
    use std::path::Path;

    #[test]
    fn store_path_slugifies_identity_key() {
        let path = store_path(Path::new("/data"), "User.Name+tag@Example.com")
            .expect("identity key should slugify");
        assert_eq!(
            path,
            Path::new("/data/notes-user-name-tag-example-com.db")
        );
    }

    #[test]
    fn store_path_rejects_blank_identity() {
        let blank = store_path(Path::new("/data"), "   ");
        assert!(matches!(blank, Err(StoreError::NotAuthenticated)));

        let symbols = store_path(Path::new("/data"), "@@@");
        assert!(matches!(symbols, Err(StoreError::NotAuthenticated)));
    }
}
