use std::cell::RefCell;
use std::rc::Rc;

use crate::container::{ContainerId, ID_ATTRIBUTE};
use crate::multimap::MultiMap;
use crate::scene::SceneGraph;

/// Session-scoped record of which live nodes carry which container id.
///
/// Every `add` also lands in the parent session's cache, transitively; writes
/// propagate upward, never downward. That way an outer load that is still
/// resolving attachment slots sees the containers a nested load registered,
/// without a second scene scan. Removal stays local to one cache.
///
/// Handles are cheap clones of one shared cache; single-threaded by design,
/// like everything else in this subsystem.
#[derive(Clone, Default)]
pub struct ContainerCache {
    inner: Rc<RefCell<Inner>>,
}

#[derive(Default)]
struct Inner {
    parent: Option<ContainerCache>,
    entries: MultiMap<ContainerId, String>,
}

impl ContainerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh cache whose additions also propagate into `parent`.
    pub fn linked(parent: &ContainerCache) -> Self {
        let cache = ContainerCache::new();
        cache.inner.borrow_mut().parent = Some(parent.clone());
        cache
    }

    /// A cache pre-populated from every container id attribute found under
    /// `namespace`.
    pub fn seeded<S: SceneGraph>(
        scene: &S,
        namespace: &str,
        parent: Option<&ContainerCache>,
    ) -> Self {
        let cache = match parent {
            Some(parent) => ContainerCache::linked(parent),
            None => ContainerCache::new(),
        };

        for node in scene.find_by_attr(ID_ATTRIBUTE, None, Some(namespace)) {
            if let Some(id) = scene.get_attr(&node, ID_ATTRIBUTE) {
                cache.add(ContainerId::new(id), node);
            }
        }

        cache
    }

    pub fn add(&self, id: ContainerId, node: impl Into<String>) {
        let node = node.into();

        let parent = {
            let mut inner = self.inner.borrow_mut();
            inner.entries.insert(id.clone(), node.clone());
            inner.parent.clone()
        };

        if let Some(parent) = parent {
            parent.add(id, node);
        }
    }

    /// Drops one recorded node from this cache only. Removing a node that
    /// was never recorded is a no-op.
    pub fn remove(&self, id: &ContainerId, node: &str) {
        self.inner.borrow_mut().entries.remove(id, node);
    }

    /// The nodes recorded for `id`, oldest first. Empty on a miss; the scene
    /// graph stays the source of truth when the cache has nothing.
    pub fn get(&self, id: &ContainerId) -> Vec<String> {
        self.inner.borrow().entries.get(id).to_vec()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::container::{Container, CONTAINER_TAG, TAG_ATTRIBUTE};
    use crate::scene::{MemScene, NodeKind};
    use crate::store::RepresentationId;

    fn id(text: &str) -> ContainerId {
        ContainerId::new(text)
    }

    #[test]
    fn add_propagates_into_linked_parent() {
        let parent = ContainerCache::new();
        let child = ContainerCache::linked(&parent);
        let grandchild = ContainerCache::linked(&child);

        grandchild.add(id("c1"), "ns:deep_CON");

        assert_eq!(grandchild.get(&id("c1")), ["ns:deep_CON"]);
        assert_eq!(child.get(&id("c1")), ["ns:deep_CON"]);
        assert_eq!(parent.get(&id("c1")), ["ns:deep_CON"]);
    }

    #[test]
    fn remove_stays_local() {
        let parent = ContainerCache::new();
        let child = ContainerCache::linked(&parent);

        child.add(id("c1"), "ns:sub_CON");
        child.remove(&id("c1"), "ns:sub_CON");

        assert_eq!(child.get(&id("c1")), Vec::<String>::new());
        assert_eq!(parent.get(&id("c1")), ["ns:sub_CON"]);
    }

    #[test]
    fn remove_of_unrecorded_node_is_noop() {
        let cache = ContainerCache::new();
        cache.add(id("c1"), "ns:sub_CON");

        cache.remove(&id("c1"), "ns:other_CON");
        cache.remove(&id("c9"), "ns:sub_CON");

        assert_eq!(cache.get(&id("c1")), ["ns:sub_CON"]);
    }

    #[test]
    fn get_miss_is_empty_not_an_error() {
        let cache = ContainerCache::new();
        assert_eq!(cache.get(&id("void")), Vec::<String>::new());
    }

    #[test]
    fn seeded_picks_up_existing_namespace_content() {
        let mut scene = MemScene::new();
        for (node, container_id) in [("ns:a_CON", "ca"), ("ns:deep:b_CON", "cb")] {
            scene.create_node(node, NodeKind::Set).unwrap();
            scene.set_attr(node, TAG_ATTRIBUTE, CONTAINER_TAG).unwrap();
            scene.set_attr(node, ID_ATTRIBUTE, container_id).unwrap();
        }
        scene.create_node("other:c_CON", NodeKind::Set).unwrap();
        scene.set_attr("other:c_CON", ID_ATTRIBUTE, "cc").unwrap();

        let cache = ContainerCache::seeded(&scene, "ns", None);

        assert_eq!(cache.get(&id("ca")), ["ns:a_CON"]);
        assert_eq!(cache.get(&id("cb")), ["ns:deep:b_CON"]);
        assert_eq!(cache.get(&id("cc")), Vec::<String>::new());
    }

    #[test]
    fn session_record_lands_in_cache() {
        use crate::hierarchy::LoadSession;

        let mut outer = LoadSession::new();
        outer.init_cache(None);
        let mut inner = LoadSession::new();
        inner.init_cache(Some(&outer));

        let container = Container {
            object_name: "ns:sub:thing_CON".to_owned(),
            container_id: id("ct"),
            namespace: "ns:sub".to_owned(),
            loader: "CacheLoader".to_owned(),
            representation: RepresentationId::new("r1"),
            subset_group: "ns:sub:thing_GRP".to_owned(),
        };
        inner.record(&container);

        let outer_cache = outer.cache().expect("cache was installed");
        assert_eq!(outer_cache.get(&id("ct")), ["ns:sub:thing_CON"]);
    }
}
