//! The sync document store collaborator.
//!
//! Local state is a projection of a shared document. A store hands out the
//! latest snapshot, accepts new snapshots (last writer wins), and notifies
//! subscribers whenever a snapshot is saved so they can re-derive their
//! state. Merging concurrent edits is the store's business, not ours.

use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreResult;

/// A shared document that several sessions read and write.
pub trait DocumentStore<D> {
    /// The current document, or `None` if nothing was saved yet.
    fn load(&self) -> StoreResult<Option<D>>;

    /// Replace the document and notify subscribers.
    fn save(&self, doc: &D) -> StoreResult<()>;

    /// Receive every document saved from now on, by any handle.
    fn subscribe(&self) -> Receiver<D>;
}

fn notify<D: Clone>(subscribers: &mut Vec<Sender<D>>, doc: &D) {
    subscribers.retain(|tx| tx.send(doc.clone()).is_ok());
}

struct Shared<D> {
    doc: Option<D>,
    subscribers: Vec<Sender<D>>,
}

/// An in-process store. Cloned handles share one document, which makes it a
/// stand-in for several sessions attached to the same sync document.
pub struct MemoryStore<D> {
    shared: Arc<Mutex<Shared<D>>>,
}

impl<D> Clone for MemoryStore<D> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<D> Default for MemoryStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> MemoryStore<D> {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                doc: None,
                subscribers: Vec::new(),
            })),
        }
    }

    /// A store seeded with a document.
    pub fn with_document(doc: D) -> Self {
        let store = Self::new();
        store.lock().doc = Some(doc);
        store
    }

    fn lock(&self) -> MutexGuard<'_, Shared<D>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<D: Clone> DocumentStore<D> for MemoryStore<D> {
    fn load(&self) -> StoreResult<Option<D>> {
        Ok(self.lock().doc.clone())
    }

    fn save(&self, doc: &D) -> StoreResult<()> {
        let mut shared = self.lock();
        shared.doc = Some(doc.clone());
        notify(&mut shared.subscribers, doc);
        Ok(())
    }

    fn subscribe(&self) -> Receiver<D> {
        let (tx, rx) = mpsc::channel();
        self.lock().subscribers.push(tx);
        rx
    }
}

/// A store backed by a pretty-printed JSON file.
pub struct JsonFileStore<D> {
    path: PathBuf,
    subscribers: Mutex<Vec<Sender<D>>>,
    _doc: PhantomData<fn() -> D>,
}

impl<D> JsonFileStore<D> {
    /// A store reading and writing `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            subscribers: Mutex::new(Vec::new()),
            _doc: PhantomData,
        }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<D: Serialize + DeserializeOwned + Clone> DocumentStore<D> for JsonFileStore<D> {
    fn load(&self) -> StoreResult<Option<D>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, doc: &D) -> StoreResult<()> {
        let text = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        notify(&mut subscribers, doc);
        Ok(())
    }

    fn subscribe(&self) -> Receiver<D> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn memory_store_starts_empty() {
        let store: MemoryStore<Vec<u32>> = MemoryStore::new();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn memory_store_handles_share_document() {
        let alice: MemoryStore<Vec<u32>> = MemoryStore::with_document(vec![1]);
        let bob = alice.clone();
        let updates = bob.subscribe();

        alice.save(&vec![1, 2]).unwrap();
        assert_eq!(bob.load().unwrap(), Some(vec![1, 2]));
        assert_eq!(updates.try_recv().unwrap(), vec![1, 2]);
        assert!(updates.try_recv().is_err());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let store: MemoryStore<u8> = MemoryStore::new();
        drop(store.subscribe());
        let live = store.subscribe();
        store.save(&7).unwrap();
        assert_eq!(store.lock().subscribers.len(), 1);
        assert_eq!(live.recv().unwrap(), 7);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonFileStore<Vec<String>> = JsonFileStore::new(dir.path().join("doc.json"));
        assert_eq!(store.load().unwrap(), None);

        let updates = store.subscribe();
        store.save(&vec!["a".to_string()]).unwrap();
        assert_eq!(store.load().unwrap(), Some(vec!["a".to_string()]));
        assert_eq!(updates.try_recv().unwrap(), vec!["a".to_string()]);
        assert!(!dir.path().join("doc.tmp").exists());
    }

    #[test]
    fn file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, "{ not json").unwrap();
        let store: JsonFileStore<Vec<u8>> = JsonFileStore::new(path);
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
    }
}
