use std::{
    borrow::Borrow,
    collections::HashMap,
    fmt::{self, Debug},
    hash::Hash,
};

/// A map from keys to buckets of multiple values.
///
/// Buckets preserve insertion order, which callers rely on when they need a
/// deterministic pick among values recorded for the same key.
#[derive(Clone, Default)]
pub struct MultiMap<K, V> {
    inner: HashMap<K, Vec<V>>,
}

#[allow(dead_code)] // library-ish struct, not every method has a caller yet
impl<K: Hash + Eq, V: Eq> MultiMap<K, V> {
    pub fn new() -> Self {
        MultiMap {
            inner: HashMap::new(),
        }
    }

    /// Returns the values recorded for `key`, oldest first. Missing keys
    /// produce an empty slice rather than an error.
    pub fn get<Q: ?Sized>(&self, key: &Q) -> &[V]
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        self.inner.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Inserts `value` under `key` unless the bucket already contains it.
    pub fn insert(&mut self, key: K, value: V) {
        let bucket = self.inner.entry(key).or_default();

        if !bucket.contains(&value) {
            bucket.push(value);
        }
    }

    /// Removes one value from `key`'s bucket, dropping the bucket once empty.
    /// Removing a value that was never inserted is a no-op returning `None`.
    pub fn remove<Q: ?Sized, U: ?Sized>(&mut self, key: &Q, value: &U) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
        V: Borrow<U>,
        U: Eq,
    {
        let bucket = self.inner.get_mut(key)?;

        let index = bucket.iter().position(|v| v.borrow() == value)?;
        let removed = bucket.remove(index);

        if bucket.is_empty() {
            self.inner.remove(key);
        }

        Some(removed)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K: Debug + Hash + Eq, V: Debug + Eq> Debug for MultiMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        self.inner.fmt(formatter)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insert_is_deduplicating() {
        let mut map = MultiMap::new();
        map.insert("id", "node_a");
        map.insert("id", "node_a");
        map.insert("id", "node_b");

        assert_eq!(map.get("id"), ["node_a", "node_b"]);
    }

    #[test]
    fn buckets_keep_insertion_order() {
        let mut map = MultiMap::new();
        map.insert("id", 3);
        map.insert("id", 1);
        map.insert("id", 2);

        assert_eq!(map.get("id"), [3, 1, 2]);
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut map: MultiMap<&str, &str> = MultiMap::new();
        map.insert("id", "node_a");

        assert_eq!(map.remove("id", &"node_b"), None);
        assert_eq!(map.remove("other", &"node_a"), None);
        assert_eq!(map.get("id"), ["node_a"]);
    }

    #[test]
    fn empty_buckets_are_dropped() {
        let mut map = MultiMap::new();
        map.insert("id", "node_a");
        map.remove("id", &"node_a");

        assert!(map.is_empty());
        assert_eq!(map.get("id"), Vec::<&str>::new().as_slice());
    }
}
