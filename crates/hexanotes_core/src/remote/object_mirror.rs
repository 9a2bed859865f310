//! Object-mirror adapter: the whole collection as one remote JSON object.
//!
//! # Responsibility
//! - Maintain one snapshot object inside one named container in a remote
//!   file-storage service, scoped to the authenticated identity's space.
//! - Check the legacy container/object pair on read for compatibility with
//!   snapshots written by earlier versions.
//! - Upload and best-effort delete binary attachments.
//!
//! # Invariants
//! - `find_object` absence is a tagged result, never an error.
//! - A snapshot that does not decode to an array is `CorruptSnapshot`; the
//!   caller decides the fallback.
//! - `ensure_container` is find-then-create; the duplicate-creation race
//!   between two concurrent sessions is accepted (last writer wins).

use crate::model::note::{Attachment, Note};
use crate::remote::{RemoteError, RemoteResult};
use log::{info, warn};

/// Container holding the current snapshot object.
pub const PRIMARY_CONTAINER: &str = "HexaNotes";
/// Name of the current snapshot object.
pub const PRIMARY_SNAPSHOT: &str = "notes.json";
/// Container used by earlier releases; checked as read fallback.
pub const LEGACY_CONTAINER: &str = "NotesAppBackup";
/// Snapshot object name used by earlier releases.
pub const LEGACY_SNAPSHOT: &str = "notes_backup.json";

/// Handle to a remote container (directory-equivalent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    pub id: String,
    pub name: String,
}

/// Handle to a remote object inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHandle {
    pub id: String,
    pub name: String,
}

/// Tagged container lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerLookup {
    Found(ContainerHandle),
    NotFound,
}

/// Tagged object lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectLookup {
    Found(ObjectHandle),
    NotFound,
}

/// Outcome of a snapshot pull across primary and legacy locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotPull {
    /// Decoded note collection, from whichever location was found first.
    Notes(Vec<Note>),
    /// Neither location holds a snapshot (first-ever use).
    NoBackup,
}

/// Capability contract against the remote file-storage service.
///
/// Implementations wrap an already-authorized client; transport and
/// authentication details stay outside the core.
pub trait ObjectStorage {
    fn find_container(&self, name: &str) -> RemoteResult<ContainerLookup>;
    fn create_container(&self, name: &str) -> RemoteResult<ContainerHandle>;
    fn find_object(&self, container: &ContainerHandle, name: &str) -> RemoteResult<ObjectLookup>;
    fn create_object(
        &self,
        container: &ContainerHandle,
        name: &str,
        content: &str,
    ) -> RemoteResult<ObjectHandle>;
    fn overwrite_object(&self, object: &ObjectHandle, content: &str) -> RemoteResult<()>;
    fn read_object(&self, object: &ObjectHandle) -> RemoteResult<String>;
    /// Uploads a binary payload and returns a stable retrieval URL.
    fn upload_file(
        &self,
        container: &ContainerHandle,
        name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> RemoteResult<String>;
    fn delete_file(&self, url: &str) -> RemoteResult<()>;
}

/// Whole-collection mirror over an `ObjectStorage` capability.
pub struct ObjectMirror<S: ObjectStorage> {
    storage: S,
}

impl<S: ObjectStorage> ObjectMirror<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Returns a handle to the named container, creating it when absent.
    pub fn ensure_container(&self, name: &str) -> RemoteResult<ContainerHandle> {
        match self.storage.find_container(name)? {
            ContainerLookup::Found(handle) => Ok(handle),
            ContainerLookup::NotFound => self.storage.create_container(name),
        }
    }

    /// Writes the full collection as one JSON array to the primary location.
    ///
    /// Overwrites the snapshot object when it exists, creates it otherwise.
    pub fn write_snapshot(&self, notes: &[Note]) -> RemoteResult<()> {
        let container = self.ensure_container(PRIMARY_CONTAINER)?;
        let payload = encode_snapshot(notes)?;

        match self.storage.find_object(&container, PRIMARY_SNAPSHOT)? {
            ObjectLookup::Found(object) => self.storage.overwrite_object(&object, &payload)?,
            ObjectLookup::NotFound => {
                self.storage
                    .create_object(&container, PRIMARY_SNAPSHOT, &payload)?;
            }
        }

        info!(
            "event=snapshot_write module=remote status=ok container={PRIMARY_CONTAINER} count={}",
            notes.len()
        );
        Ok(())
    }

    /// Reads and decodes the snapshot at an explicit location.
    ///
    /// # Errors
    /// - `CorruptSnapshot` when the content does not decode to an array.
    pub fn read_snapshot(
        &self,
        container: &ContainerHandle,
        name: &str,
    ) -> RemoteResult<Option<Vec<Note>>> {
        match self.storage.find_object(container, name)? {
            ObjectLookup::Found(object) => {
                let raw = self.storage.read_object(&object)?;
                decode_snapshot(&raw).map(Some)
            }
            ObjectLookup::NotFound => Ok(None),
        }
    }

    /// Pulls the snapshot from the primary location, then the legacy one.
    ///
    /// A corrupt location does not stop the fallback chain; only when no
    /// location yields a decodable snapshot is the corruption reported.
    /// When neither location exists at all, `NoBackup` is returned so a
    /// first-ever session stays silent.
    pub fn pull_snapshot(&self) -> RemoteResult<SnapshotPull> {
        let mut corrupt: Option<RemoteError> = None;

        for (container_name, object_name) in [
            (PRIMARY_CONTAINER, PRIMARY_SNAPSHOT),
            (LEGACY_CONTAINER, LEGACY_SNAPSHOT),
        ] {
            let container = match self.storage.find_container(container_name)? {
                ContainerLookup::Found(handle) => handle,
                ContainerLookup::NotFound => continue,
            };

            match self.read_snapshot(&container, object_name) {
                Ok(Some(notes)) => {
                    info!(
                        "event=snapshot_pull module=remote status=ok container={container_name} count={}",
                        notes.len()
                    );
                    return Ok(SnapshotPull::Notes(notes));
                }
                Ok(None) => continue,
                Err(err @ RemoteError::CorruptSnapshot(_)) => {
                    warn!(
                        "event=snapshot_pull module=remote status=warn container={container_name} error={err}"
                    );
                    corrupt.get_or_insert(err);
                }
                Err(err) => return Err(err),
            }
        }

        match corrupt {
            Some(err) => Err(err),
            None => Ok(SnapshotPull::NoBackup),
        }
    }

    /// Uploads one attachment payload and returns its descriptor.
    pub fn upload_attachment(
        &self,
        name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> RemoteResult<Attachment> {
        let container = self.ensure_container(PRIMARY_CONTAINER)?;
        let remote_url = self.storage.upload_file(&container, name, mime_type, bytes)?;
        Ok(Attachment {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            remote_url,
        })
    }

    /// Best-effort deletion of all attachments belonging to one note.
    ///
    /// Individual failures are logged and counted, never fatal; note
    /// deletion proceeds regardless.
    pub fn delete_attachments(&self, note: &Note) -> usize {
        let mut failed = 0;
        for attachment in &note.files {
            if let Err(err) = self.storage.delete_file(&attachment.remote_url) {
                warn!(
                    "event=attachment_delete module=remote status=warn note_id={} name={} error={err}",
                    note.id, attachment.name
                );
                failed += 1;
            }
        }
        failed
    }
}

fn encode_snapshot(notes: &[Note]) -> RemoteResult<String> {
    serde_json::to_string(notes)
        .map_err(|err| RemoteError::CorruptSnapshot(format!("snapshot encode failed: {err}")))
}

fn decode_snapshot(raw: &str) -> RemoteResult<Vec<Note>> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|err| RemoteError::CorruptSnapshot(format!("snapshot is not JSON: {err}")))?;

    if !value.is_array() {
        return Err(RemoteError::CorruptSnapshot(
            "snapshot content is not an array".to_string(),
        ));
    }

    serde_json::from_value(value)
        .map_err(|err| RemoteError::CorruptSnapshot(format!("snapshot decode failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::{
        ContainerHandle, ContainerLookup, ObjectHandle, ObjectLookup, ObjectMirror, ObjectStorage,
        SnapshotPull, LEGACY_CONTAINER, LEGACY_SNAPSHOT, PRIMARY_CONTAINER, PRIMARY_SNAPSHOT,
    };
    use crate::model::note::{Note, NoteDraft};
    use crate::remote::{RemoteError, RemoteResult};
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    /// In-memory object storage used to exercise the mirror contract.
    #[derive(Default)]
    struct MemoryStorage {
        // (container, object) -> content
        objects: RefCell<BTreeMap<(String, String), String>>,
        containers: RefCell<Vec<String>>,
        deleted_urls: RefCell<Vec<String>>,
        fail_deletes_for: RefCell<Vec<String>>,
    }

    impl MemoryStorage {
        fn seed(&self, container: &str, object: &str, content: &str) {
            self.containers.borrow_mut().push(container.to_string());
            self.objects
                .borrow_mut()
                .insert((container.to_string(), object.to_string()), content.to_string());
        }
    }

    impl ObjectStorage for MemoryStorage {
        fn find_container(&self, name: &str) -> RemoteResult<ContainerLookup> {
            if self.containers.borrow().iter().any(|c| c == name) {
                Ok(ContainerLookup::Found(ContainerHandle {
                    id: format!("container-{name}"),
                    name: name.to_string(),
                }))
            } else {
                Ok(ContainerLookup::NotFound)
            }
        }

        fn create_container(&self, name: &str) -> RemoteResult<ContainerHandle> {
            self.containers.borrow_mut().push(name.to_string());
            Ok(ContainerHandle {
                id: format!("container-{name}"),
                name: name.to_string(),
            })
        }

        fn find_object(
            &self,
            container: &ContainerHandle,
            name: &str,
        ) -> RemoteResult<ObjectLookup> {
            let key = (container.name.clone(), name.to_string());
            if self.objects.borrow().contains_key(&key) {
                Ok(ObjectLookup::Found(ObjectHandle {
                    id: format!("{}/{}", container.name, name),
                    name: name.to_string(),
                }))
            } else {
                Ok(ObjectLookup::NotFound)
            }
        }

        fn create_object(
            &self,
            container: &ContainerHandle,
            name: &str,
            content: &str,
        ) -> RemoteResult<ObjectHandle> {
            self.objects
                .borrow_mut()
                .insert((container.name.clone(), name.to_string()), content.to_string());
            Ok(ObjectHandle {
                id: format!("{}/{}", container.name, name),
                name: name.to_string(),
            })
        }

        fn overwrite_object(&self, object: &ObjectHandle, content: &str) -> RemoteResult<()> {
            let (container, name) = object
                .id
                .split_once('/')
                .map(|(c, n)| (c.to_string(), n.to_string()))
                .unwrap_or_default();
            self.objects
                .borrow_mut()
                .insert((container, name), content.to_string());
            Ok(())
        }

        fn read_object(&self, object: &ObjectHandle) -> RemoteResult<String> {
            let (container, name) = object
                .id
                .split_once('/')
                .map(|(c, n)| (c.to_string(), n.to_string()))
                .unwrap_or_default();
            self.objects
                .borrow()
                .get(&(container, name))
                .cloned()
                .ok_or_else(|| RemoteError::Unavailable("object vanished".to_string()))
        }

        fn upload_file(
            &self,
            container: &ContainerHandle,
            name: &str,
            _mime_type: &str,
            _bytes: &[u8],
        ) -> RemoteResult<String> {
            Ok(format!("https://files.example/{}/{name}", container.name))
        }

        fn delete_file(&self, url: &str) -> RemoteResult<()> {
            if self.fail_deletes_for.borrow().iter().any(|u| u == url) {
                return Err(RemoteError::Unavailable("delete rejected".to_string()));
            }
            self.deleted_urls.borrow_mut().push(url.to_string());
            Ok(())
        }
    }

    fn note(title: &str) -> Note {
        Note::from_draft(NoteDraft {
            title: title.to_string(),
            content: "body".to_string(),
            ..NoteDraft::default()
        })
        .expect("valid draft")
    }

    #[test]
    fn write_snapshot_creates_then_overwrites() {
        let mirror = ObjectMirror::new(MemoryStorage::default());
        let first = vec![note("one")];
        mirror.write_snapshot(&first).expect("first write");

        let second = vec![note("one"), note("two")];
        mirror.write_snapshot(&second).expect("second write");

        let pulled = mirror.pull_snapshot().expect("pull after write");
        match pulled {
            SnapshotPull::Notes(notes) => assert_eq!(notes.len(), 2),
            SnapshotPull::NoBackup => panic!("snapshot should exist"),
        }
    }

    #[test]
    fn ensure_container_is_idempotent() {
        let mirror = ObjectMirror::new(MemoryStorage::default());
        let first = mirror
            .ensure_container(PRIMARY_CONTAINER)
            .expect("first ensure");
        let second = mirror
            .ensure_container(PRIMARY_CONTAINER)
            .expect("second ensure");
        assert_eq!(first, second);
    }

    #[test]
    fn pull_falls_back_to_legacy_location() {
        let storage = MemoryStorage::default();
        let legacy = serde_json::to_string(&vec![note("from legacy")]).expect("encode");
        storage.seed(LEGACY_CONTAINER, LEGACY_SNAPSHOT, &legacy);

        let mirror = ObjectMirror::new(storage);
        match mirror.pull_snapshot().expect("legacy pull") {
            SnapshotPull::Notes(notes) => {
                assert_eq!(notes.len(), 1);
                assert_eq!(notes[0].title, "from legacy");
            }
            SnapshotPull::NoBackup => panic!("legacy snapshot should be found"),
        }
    }

    #[test]
    fn pull_reports_no_backup_on_first_use() {
        let mirror = ObjectMirror::new(MemoryStorage::default());
        assert_eq!(
            mirror.pull_snapshot().expect("empty pull"),
            SnapshotPull::NoBackup
        );
    }

    #[test]
    fn corrupt_primary_still_tries_legacy() {
        let storage = MemoryStorage::default();
        storage.seed(PRIMARY_CONTAINER, PRIMARY_SNAPSHOT, "{\"not\":\"an array\"}");
        let legacy = serde_json::to_string(&vec![note("survivor")]).expect("encode");
        storage.seed(LEGACY_CONTAINER, LEGACY_SNAPSHOT, &legacy);

        let mirror = ObjectMirror::new(storage);
        match mirror.pull_snapshot().expect("legacy rescue") {
            SnapshotPull::Notes(notes) => assert_eq!(notes[0].title, "survivor"),
            SnapshotPull::NoBackup => panic!("legacy snapshot should rescue the pull"),
        }
    }

    #[test]
    fn corrupt_everywhere_signals_corrupt_snapshot() {
        let storage = MemoryStorage::default();
        storage.seed(PRIMARY_CONTAINER, PRIMARY_SNAPSHOT, "not json at all");

        let mirror = ObjectMirror::new(storage);
        let err = mirror.pull_snapshot().expect_err("corrupt pull must fail");
        assert!(matches!(err, RemoteError::CorruptSnapshot(_)));
    }

    #[test]
    fn delete_attachments_counts_individual_failures() {
        let storage = MemoryStorage::default();
        storage
            .fail_deletes_for
            .borrow_mut()
            .push("https://files.example/HexaNotes/b.png".to_string());

        let mirror = ObjectMirror::new(storage);
        let mut target = note("with files");
        for name in ["a.png", "b.png"] {
            let attachment = mirror
                .upload_attachment(name, "image/png", &[1, 2, 3])
                .expect("upload");
            target.files.push(attachment);
        }

        assert_eq!(mirror.delete_attachments(&target), 1);
    }
}
