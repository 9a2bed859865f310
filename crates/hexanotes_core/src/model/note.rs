//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record shared by the local store, the remote
//!   mirrors and the collection manager.
//! - Provide validated construction and full-replacement update semantics.
//!
//! # Invariants
//! - `id` is stable and unique within one collection at all times.
//! - `title` is never empty after trimming on any persisted note.
//! - `files` is append-only from the engine's point of view; only a full
//!   bulk replace from a remote snapshot may shrink it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for a note.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type NoteId = Uuid;

/// Fixed card color palette. The first entry is the default for new notes.
pub const COLOR_PALETTE: [&str; 6] = [
    "#fef08a", "#fecaca", "#bbf7d0", "#bfdbfe", "#e9d5ff", "#fdba74",
];

/// Returns the default note color (first palette entry).
pub fn default_color() -> String {
    COLOR_PALETTE[0].to_string()
}

/// Validation error raised before any persistence happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Title is empty or whitespace-only after trimming.
    EmptyTitle,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title must not be empty"),
        }
    }
}

impl Error for NoteValidationError {}

/// Descriptor for one uploaded attachment.
///
/// The binary payload itself lives in remote storage; the engine only keeps
/// the name, mime type and a stable retrieval URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "remoteUrl")]
    pub remote_url: String,
}

/// Canonical note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Stable unique id, assigned at creation.
    pub id: NoteId,
    /// Non-empty display title.
    pub title: String,
    /// Free-form body text. May be empty, may contain URLs.
    pub content: String,
    /// Normalized tag labels (lowercase, deduplicated, sorted).
    #[serde(default)]
    pub tags: Vec<String>,
    /// Raw color value; defaults to the first palette entry.
    #[serde(default = "default_color")]
    pub color: String,
    /// Ordered attachment descriptors; append-only outside bulk replace.
    #[serde(default)]
    pub files: Vec<Attachment>,
    /// Creation timestamp in epoch milliseconds.
    #[serde(default)]
    pub created_at: i64,
}

/// Input fields for create/update operations.
///
/// Title/content/tags/color always fully replace the previous values on
/// update; `files` holds only newly uploaded attachments to append.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub color: Option<String>,
    pub files: Vec<Attachment>,
}

impl Note {
    /// Builds a new note from draft fields with a fresh unique id.
    ///
    /// # Errors
    /// - `EmptyTitle` when the title is blank after trimming.
    pub fn from_draft(draft: NoteDraft) -> Result<Self, NoteValidationError> {
        let title = normalize_title(&draft.title)?;
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            content: draft.content,
            tags: normalize_tags(&draft.tags),
            color: effective_color(draft.color),
            files: draft.files,
            created_at: now_epoch_ms(),
        })
    }

    /// Applies draft fields to this note in place.
    ///
    /// Title, content, tags and color are fully replaced; draft files are
    /// appended after the existing attachments, never replacing them.
    pub fn apply_update(&mut self, draft: NoteDraft) -> Result<(), NoteValidationError> {
        let title = normalize_title(&draft.title)?;
        self.title = title;
        self.content = draft.content;
        self.tags = normalize_tags(&draft.tags);
        self.color = effective_color(draft.color);
        self.files.extend(draft.files);
        Ok(())
    }

    /// Checks entity invariants on an already-built note.
    ///
    /// Used on read/bulk-replace paths where records arrive from storage
    /// rather than through `from_draft`.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.title.trim().is_empty() {
            return Err(NoteValidationError::EmptyTitle);
        }
        Ok(())
    }
}

/// Trims the title and rejects blank values.
pub fn normalize_title(title: &str) -> Result<String, NoteValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(NoteValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Normalizes tag labels: trim, lowercase, drop empties, dedupe, sort.
///
/// Storage order is irrelevant for tags, so the display order is derived
/// fresh from the normalized set on every write.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn effective_color(color: Option<String>) -> String {
    color
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(default_color)
}

/// Current wall clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
