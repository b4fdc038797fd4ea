//! Access to published representation documents.
//!
//! The asset database is a collaborator, not something this crate owns; the
//! [`RepresentationStore`] trait is the slice of it the engine needs.
//! Documents are immutable once published, which is what makes [`DocCache`]
//! safe: a representation id always resolves to the same document, so lookups
//! are memoized for the life of a session and never invalidated. The one
//! exception is *latest-version* resolution, which moves as new versions are
//! published and therefore always goes back to the store.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity of one published representation document.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepresentationId(Arc<String>);

impl RepresentationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(Arc::new(id.into()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RepresentationId {
    fn fmt(&self, writer: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(writer, "{}", self.0)
    }
}

/// One published, versioned file-format variant of a subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepresentationDoc {
    pub id: RepresentationId,

    /// Format name, e.g. `cache` or `usd`. Loaders declare which of these
    /// they accept.
    pub name: String,

    pub asset: String,
    pub subset: String,
    pub version: u32,

    /// Arbitrary publish-time payload (file paths, frame ranges, ...).
    #[serde(default)]
    pub data: Value,
}

/// Version selector for [`RepresentationStore::locate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Number(u32),
    Latest,
}

pub trait RepresentationStore {
    /// Fetches a representation document by id, `None` when it does not
    /// exist. Missing documents are a normal outcome here; the engine decides
    /// at the call site whether that is fatal.
    fn find_one(&self, id: &RepresentationId) -> Option<RepresentationDoc>;

    /// Resolves `(asset, subset, version)` to a representation id.
    fn locate(&self, asset: &str, subset: &str, version: Version) -> Option<RepresentationId>;
}

/// Session-scoped memo over [`RepresentationStore::find_one`].
#[derive(Default)]
pub struct DocCache {
    docs: HashMap<RepresentationId, RepresentationDoc>,
}

impl DocCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_fetch(
        &mut self,
        store: &dyn RepresentationStore,
        id: &RepresentationId,
    ) -> Option<&RepresentationDoc> {
        if !self.docs.contains_key(id) {
            let doc = store.find_one(id)?;
            self.docs.insert(id.clone(), doc);
        }

        self.docs.get(id)
    }
}

/// In-memory store used by tests and small standalone pipelines.
#[derive(Debug, Default)]
pub struct MemStore {
    docs: HashMap<RepresentationId, RepresentationDoc>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, doc: RepresentationDoc) {
        self.docs.insert(doc.id.clone(), doc);
    }
}

impl RepresentationStore for MemStore {
    fn find_one(&self, id: &RepresentationId) -> Option<RepresentationDoc> {
        self.docs.get(id).cloned()
    }

    fn locate(&self, asset: &str, subset: &str, version: Version) -> Option<RepresentationId> {
        let mut matches: Vec<&RepresentationDoc> = self
            .docs
            .values()
            .filter(|doc| doc.asset == asset && doc.subset == subset)
            .collect();

        match version {
            Version::Number(number) => matches
                .into_iter()
                .find(|doc| doc.version == number)
                .map(|doc| doc.id.clone()),
            Version::Latest => {
                matches.sort_by_key(|doc| doc.version);
                matches.last().map(|doc| doc.id.clone())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::cell::Cell;

    fn doc(id: &str, subset: &str, version: u32) -> RepresentationDoc {
        RepresentationDoc {
            id: RepresentationId::new(id),
            name: "cache".to_owned(),
            asset: "room".to_owned(),
            subset: subset.to_owned(),
            version,
            data: Value::Null,
        }
    }

    #[test]
    fn locate_picks_exact_or_latest() {
        let mut store = MemStore::new();
        store.insert(doc("r1", "chair", 1));
        store.insert(doc("r2", "chair", 2));
        store.insert(doc("r3", "table", 1));

        assert_eq!(
            store.locate("room", "chair", Version::Number(1)),
            Some(RepresentationId::new("r1"))
        );
        assert_eq!(
            store.locate("room", "chair", Version::Latest),
            Some(RepresentationId::new("r2"))
        );
        assert_eq!(store.locate("room", "bench", Version::Latest), None);
    }

    struct CountingStore {
        inner: MemStore,
        calls: Cell<usize>,
    }

    impl RepresentationStore for CountingStore {
        fn find_one(&self, id: &RepresentationId) -> Option<RepresentationDoc> {
            self.calls.set(self.calls.get() + 1);
            self.inner.find_one(id)
        }

        fn locate(&self, asset: &str, subset: &str, version: Version) -> Option<RepresentationId> {
            self.inner.locate(asset, subset, version)
        }
    }

    #[test]
    fn doc_cache_fetches_each_id_once() {
        let mut inner = MemStore::new();
        inner.insert(doc("r1", "chair", 1));
        let store = CountingStore {
            inner,
            calls: Cell::new(0),
        };

        let mut cache = DocCache::new();
        let id = RepresentationId::new("r1");

        assert!(cache.get_or_fetch(&store, &id).is_some());
        assert!(cache.get_or_fetch(&store, &id).is_some());
        assert_eq!(store.calls.get(), 1);

        let missing = RepresentationId::new("nope");
        assert!(cache.get_or_fetch(&store, &missing).is_none());
        assert!(cache.get_or_fetch(&store, &missing).is_none());
        assert_eq!(store.calls.get(), 3);
    }
}
