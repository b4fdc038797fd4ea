//! The container hierarchy subsystem.
//!
//! Published asset instances live in the scene as containers: marked set
//! nodes whose membership nests other containers into a tree. Display names
//! and namespaces drift as artists rework a scene, so containers are
//! addressed by id paths instead: the chain of stable container ids from the
//! root of a hierarchy down to one container. This module owns everything
//! that keeps those addresses meaningful against a live scene: the
//! per-session identity cache, tree and ancestor-chain traversal, id path
//! resolution, and the engine that attaches new sub-containers or updates
//! existing ones without losing their place in the hierarchy.
//!
//! Everything here runs on the host's main thread, synchronously. Scoped
//! namespace guards are the resource-safety mechanism; there is no locking
//! and no rollback of host-side mutation failures.

mod attach;
mod cache;
mod resolve;
mod walk;

pub use attach::{
    add_subset, attach_slot, change_subset, updatable_sub_containers, AttachRequest, Namespaced,
    UpdateRequest,
};
pub use cache::ContainerCache;
pub use resolve::{resolve_id_path, Resolution};
pub use walk::{
    climb_ids, container_id_path, container_to_id_path, parse_sub_containers,
    sub_container_nodes, walk_containers, ClimbIds, ID_PATH_SEPARATOR,
};

use crate::container::Container;
use crate::scene::SceneGraph;
use crate::session_id::SessionId;

/// One load or update operation over a hierarchy.
///
/// A session owns the identity cache used to resolve id paths while it runs.
/// Nested loads get their own session whose cache is linked upward, so an
/// outer session sees containers registered by inner ones without re-scanning
/// the scene. A session without a cache is valid; resolution then falls back
/// to attribute scans.
pub struct LoadSession {
    id: SessionId,
    cache: Option<ContainerCache>,
}

impl LoadSession {
    pub fn new() -> Self {
        LoadSession {
            id: SessionId::new(),
            cache: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn cache(&self) -> Option<&ContainerCache> {
        self.cache.as_ref()
    }

    /// Installs a fresh cache, linked upward into `parent`'s when it has one.
    pub fn init_cache(&mut self, parent: Option<&LoadSession>) {
        let parent_cache = parent.and_then(|session| session.cache.as_ref());
        self.cache = Some(match parent_cache {
            Some(parent_cache) => ContainerCache::linked(parent_cache),
            None => ContainerCache::new(),
        });
    }

    /// Like [`LoadSession::init_cache`], but seeded from the container
    /// attributes already present under `namespace`. Used when taking over
    /// management of pre-existing scene content rather than freshly loaded
    /// content.
    pub fn init_cache_seeded<S: SceneGraph>(
        &mut self,
        scene: &S,
        namespace: &str,
        parent: Option<&LoadSession>,
    ) {
        let parent_cache = parent.and_then(|session| session.cache.as_ref());
        self.cache = Some(ContainerCache::seeded(scene, namespace, parent_cache));
    }

    /// Records a freshly loaded container in this session's cache.
    pub fn record(&self, container: &Container) {
        if let Some(cache) = &self.cache {
            cache.add(
                container.container_id.clone(),
                container.object_name.clone(),
            );
        }
    }
}

impl Default for LoadSession {
    fn default() -> Self {
        Self::new()
    }
}
