//! Resolution of container id paths to live nodes.

use log::{debug, warn};

use crate::container::{ContainerId, ID_ATTRIBUTE};
use crate::scene::SceneGraph;

use super::cache::ContainerCache;
use super::walk::{climb_ids, ClimbIds, ID_PATH_SEPARATOR};

/// Outcome of resolving an id path. Resolution never fails with an error:
/// a missing target is a normal result callers must check, and an id
/// collision is reported as a resolved-with-warning value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one live node matched the path.
    Resolved(String),

    /// More than one node survived the full path: the same id was minted
    /// twice under one parent chain. The pick is deterministic (the most
    /// recently enumerated candidate) so the artist is not blocked, but the
    /// scene carries an integrity bug that was logged.
    AmbiguousResolved(String),

    /// No live node matches; the addressed sub-container no longer exists or
    /// the hierarchy was restructured.
    NotFound,
}

impl Resolution {
    pub fn node(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(node) | Resolution::AmbiguousResolved(node) => Some(node),
            Resolution::NotFound => None,
        }
    }
}

/// Finds the container node addressed by `id_path` among the containers
/// living under `parent_namespace`.
///
/// Candidates come from the session cache when one is installed, otherwise
/// from a scene attribute scan. A successfully resolved leaf is consumed
/// from the cache: each recorded node can satisfy only one resolution, so
/// two hierarchy slots can never claim the same live node.
pub fn resolve_id_path<S: SceneGraph>(
    scene: &S,
    cache: Option<&ContainerCache>,
    id_path: &str,
    parent_namespace: &str,
) -> Resolution {
    let mut ids: Vec<&str> = id_path.split(ID_PATH_SEPARATOR).collect();
    let leaf_id = match ids.pop() {
        Some(id) => ContainerId::new(id),
        None => return Resolution::NotFound,
    };

    let prefix = format!("{}:", parent_namespace);
    let leaf_nodes: Vec<String> = match cache {
        Some(cache) => cache
            .get(&leaf_id)
            .into_iter()
            .filter(|node| node.starts_with(&prefix) && scene.exists(node))
            .collect(),
        None => scene.find_by_attr(ID_ATTRIBUTE, Some(leaf_id.as_str()), Some(parent_namespace)),
    };

    if leaf_nodes.is_empty() {
        debug!(
            "No containers with id path {} under namespace {}, possibly removed in the parent asset",
            id_path, parent_namespace
        );
        return Resolution::NotFound;
    }

    let mut climbers: Vec<(String, ClimbIds<'_, S>)> = leaf_nodes
        .into_iter()
        .map(|node| {
            let climber = climb_ids(scene, &node);
            (node, climber)
        })
        .collect();

    while let Some(expected) = ids.pop() {
        climbers.retain_mut(|(_, climber)| {
            matches!(climber.next(), Some(id) if id.as_str() == expected)
        });

        // One survivor is already unambiguous; the rest of the path cannot
        // winnow further.
        if climbers.len() <= 1 {
            break;
        }
    }

    let resolution = match climbers.len() {
        0 => {
            debug!(
                "Container id path {} not found under namespace {}, possibly removed",
                id_path, parent_namespace
            );
            return Resolution::NotFound;
        }
        1 => {
            let (node, _) = climbers.remove(0);
            Resolution::Resolved(node)
        }
        _ => {
            warn!(
                "Container id path {} is not unique under namespace {}, this is a bug",
                id_path, parent_namespace
            );
            let (node, _) = climbers.pop().expect("survivor list is non-empty");
            Resolution::AmbiguousResolved(node)
        }
    };

    if let (Some(cache), Some(node)) = (cache, resolution.node()) {
        cache.remove(&leaf_id, node);
    }

    resolution
}
