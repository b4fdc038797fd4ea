//! Attaching new sub-containers into a hierarchy and updating existing ones.

use std::collections::HashMap;

use log::{error, warn};

use crate::container::{
    to_namespace, trailing_namespace, Container, ContainerId, CONTAINERS_SET,
};
use crate::error::Error;
use crate::loaders::{LoadContext, LoaderRegistry};
use crate::scene::{SceneError, SceneGraph};
use crate::store::{DocCache, RepresentationId, RepresentationStore};

use super::walk::parse_sub_containers;

/// Scoped namespace acquisition: enters `namespace` on construction and
/// restores the previously current namespace when dropped, on every exit
/// path.
pub struct Namespaced<'a, S: SceneGraph> {
    scene: &'a mut S,
    previous: String,
    entered: String,
}

impl<'a, S: SceneGraph> Namespaced<'a, S> {
    pub fn enter(scene: &'a mut S, namespace: &str) -> Result<Self, Error> {
        let previous = scene.set_namespace(namespace)?;
        Ok(Namespaced {
            scene,
            previous,
            entered: namespace.to_owned(),
        })
    }

    /// The namespace this scope entered.
    pub fn namespace(&self) -> &str {
        &self.entered
    }

    pub fn scene(&mut self) -> &mut S {
        self.scene
    }
}

impl<S: SceneGraph> Drop for Namespaced<'_, S> {
    fn drop(&mut self) {
        if self.scene.set_namespace(&self.previous).is_err() {
            warn!("Could not restore namespace {:?}", self.previous);
        }
    }
}

/// Description of one sub-container to bring into a hierarchy.
#[derive(Debug, Clone)]
pub struct AttachRequest {
    /// Local namespace segment appended to the parent namespace, when the
    /// sub-container gets a namespace of its own.
    pub namespace: Option<String>,

    /// Identity the new container records, carried in the parent's published
    /// hierarchy description.
    pub container_id: ContainerId,

    /// Hierarchy path of the attachment slot, relative to the parent's root
    /// group and recorded without namespaces.
    pub slot: String,

    pub loader: String,
    pub representation: RepresentationId,
}

/// Target state for updating an existing sub-container.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub slot: String,
    pub loader: String,
    pub representation: RepresentationId,
}

/// Parents `subset_group` under the slot it belongs to, unless it is already
/// there.
///
/// The slot path gains the entered namespace, then must resolve to exactly
/// one node under `root`; anything else means the published hierarchy and
/// the live scene disagree, which is a hard abort. Returns the group's name
/// after the (possibly skipped) reparent.
pub fn attach_slot<S: SceneGraph>(
    scene: &mut S,
    slot: &str,
    namespace: &str,
    root: &str,
    subset_group: &str,
) -> Result<String, Error> {
    let slot_path = to_namespace(slot, namespace);
    let matches = scene.ls(&format!("{}{}", root, slot_path));

    let slot_node = match matches.as_slice() {
        [single] => single.clone(),
        _ => {
            return Err(Error::SlotResolution {
                slot: slot_path,
                root: root.to_owned(),
                matched: matches.len(),
            })
        }
    };

    if scene.parent_of(subset_group).as_deref() == Some(slot_node.as_str()) {
        return Ok(subset_group.to_owned());
    }

    Ok(scene.reparent(subset_group, &slot_node)?)
}

fn attach_in_namespace<S, F>(
    scene: &mut S,
    namespace: &str,
    slot: &str,
    root: &str,
    container: &mut Container,
    body: F,
) -> Result<(), Error>
where
    S: SceneGraph,
    F: FnOnce(&mut S, &mut Container) -> Result<(), Error>,
{
    let mut scope = Namespaced::enter(scene, namespace)?;
    let entered = scope.namespace().to_owned();

    let group = container.subset_group.clone();
    container.subset_group = attach_slot(scope.scene(), slot, &entered, root, &group)?;

    body(scope.scene(), container)
}

/// Loads a new sub-container and attaches it into the hierarchy under
/// `root`.
///
/// The loader materializes the content at the parent namespace extended with
/// the request's local segment. Inside the namespace scope the new subset
/// group is parented into its slot and `body` runs with the scene and the
/// container; the registry teardown happens whether or not `body` succeeds.
/// A loaded container is a nested child, not a top-level entity, so it is
/// detached from the global containers set; when `on_update` names the
/// container being rebuilt, membership is force-migrated into it instead.
#[allow(clippy::too_many_arguments)]
pub fn add_subset<S, F>(
    scene: &mut S,
    registry: &LoaderRegistry<S>,
    store: &dyn RepresentationStore,
    docs: &mut DocCache,
    request: &AttachRequest,
    namespace: &str,
    root: &str,
    on_update: Option<&Container>,
    body: F,
) -> Result<Container, Error>
where
    S: SceneGraph,
    F: FnOnce(&mut S, &mut Container) -> Result<(), Error>,
{
    let sub_namespace = match &request.namespace {
        Some(local) => format!("{}:{}", namespace, local),
        None => namespace.to_owned(),
    };

    let doc = docs
        .get_or_fetch(store, &request.representation)
        .ok_or_else(|| Error::RepresentationMissing(request.representation.clone()))?
        .clone();
    let loader = registry.resolve(&request.loader, &doc)?;

    let ctx = LoadContext {
        representation: &doc,
        namespace: sub_namespace,
        container_id: request.container_id.clone(),
    };
    let mut sub_container = loader.load(scene, &ctx)?;

    let attached = attach_in_namespace(
        scene,
        namespace,
        &request.slot,
        root,
        &mut sub_container,
        body,
    );

    let teardown: Result<(), SceneError> = (|| {
        scene.remove_from_set(&sub_container.object_name, CONTAINERS_SET)?;
        if let Some(target) = on_update {
            scene.add_to_set(&sub_container.object_name, &target.object_name)?;
        }
        Ok(())
    })();

    attached?;
    teardown?;
    Ok(sub_container)
}

/// Enumerates `container`'s direct sub-containers, verifying every one of
/// them can be updated in place before a cascade begins.
///
/// A sub-container qualifies when its content is backed by a reference node,
/// or when its loader knows how to rebuild imported content incrementally.
/// Anything else aborts the whole operation, before any mutation: updating
/// around a non-reconcilable child would leave the hierarchy half-old,
/// half-new. Results are keyed by the sub-container's trailing namespace
/// segment, the handle the parent's published hierarchy uses for it.
pub fn updatable_sub_containers<S: SceneGraph>(
    scene: &S,
    registry: &LoaderRegistry<S>,
    container: &Container,
) -> Result<HashMap<String, Container>, Error> {
    let mut current = HashMap::new();

    for sub in parse_sub_containers(scene, container)? {
        let referenced = scene
            .list_members(&sub.object_name)
            .iter()
            .any(|member| scene.is_reference(member));

        if !referenced {
            let incremental = registry
                .get(&sub.loader)
                .map(|loader| loader.supports_incremental_update())
                .unwrap_or(false);

            if !incremental {
                error!(
                    "Found non-updatable child subset {}, aborting",
                    sub.object_name
                );
                return Err(Error::NotUpdatable {
                    node: sub.object_name,
                });
            }
        }

        let key = trailing_namespace(&sub.namespace).to_owned();
        current.insert(key, sub);
    }

    Ok(current)
}

/// Updates an existing sub-container toward the state in `new`, then
/// re-anchors it in the hierarchy.
///
/// An update is *required* when the target representation differs from what
/// the container currently reflects, or when its loader is hierarchical and
/// must re-resolve nested content every time. It is *permitted* while the
/// container still reflects the previous publish (`old_representation`);
/// a version the artist pinned by hand is only overridden with `force`.
/// Whether or not the loader ran, the subset group is re-attached to its
/// slot so placement stays correct, and `body` runs inside the namespace
/// scope.
///
/// A scene failure after the loader has already updated is not rolled back.
#[allow(clippy::too_many_arguments)]
pub fn change_subset<S, F>(
    scene: &mut S,
    registry: &LoaderRegistry<S>,
    store: &dyn RepresentationStore,
    docs: &mut DocCache,
    container: &mut Container,
    namespace: &str,
    root: &str,
    new: &UpdateRequest,
    old_representation: &RepresentationId,
    force: bool,
    body: F,
) -> Result<(), Error>
where
    S: SceneGraph,
    F: FnOnce(&mut S, &mut Container) -> Result<(), Error>,
{
    let hierarchical = registry
        .get(&container.loader)
        .map(|loader| loader.is_hierarchical())
        .unwrap_or(false);

    let require_update = new.representation != container.representation || hierarchical;
    let is_updatable = *old_representation == container.representation || force;

    if require_update && is_updatable {
        let doc = docs
            .get_or_fetch(store, &new.representation)
            .ok_or_else(|| Error::RepresentationMissing(new.representation.clone()))?
            .clone();
        let loader = registry.resolve(&new.loader, &doc)?;
        loader.update(scene, container, &doc)?;
    }

    attach_in_namespace(scene, namespace, &new.slot, root, container, body)
}
