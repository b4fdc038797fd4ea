//! The container data model.
//!
//! A container is a marked set node standing for one published asset instance
//! in the scene. Its display name and namespace drift as artists rename
//! things; the `containerId` attribute assigned at publish time does not, and
//! is what the hierarchy subsystem addresses containers by.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::scene::{NodeKind, SceneGraph};
use crate::store::RepresentationId;

/// Value of the marker attribute that makes a node a container.
pub const CONTAINER_TAG: &str = "stagehand.container";

/// Attribute holding the container marker.
pub const TAG_ATTRIBUTE: &str = "id";

/// Attribute holding the stable container id.
pub const ID_ATTRIBUTE: &str = "containerId";

pub const LOADER_ATTRIBUTE: &str = "loader";
pub const REPRESENTATION_ATTRIBUTE: &str = "representation";
pub const NAMESPACE_ATTRIBUTE: &str = "namespace";
pub const SUBSET_GROUP_ATTRIBUTE: &str = "subsetGroup";

/// Name of the top-level set every freshly loaded container is registered in.
pub const CONTAINERS_SET: &str = "ASSET_CONTAINERS";

/// Stable identity of a container, assigned when it is first published or
/// loaded and untouched by renames and namespace moves.
///
/// Ids are only unique among siblings sharing a containment chain, not across
/// the whole scene; resolution therefore works on id *paths*.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(Arc<String>);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(Arc::new(id.into()))
    }

    /// Mints a fresh id for a newly published container.
    pub fn mint() -> Self {
        Self(Arc::new(Uuid::new_v4().to_string()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, writer: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(writer, "{}", self.0)
    }
}

/// Parsed view of one container node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Current name of the container's set node. Mutable under rename.
    pub object_name: String,

    pub container_id: ContainerId,

    /// Namespace prefix the container's content lives under. Mutable.
    pub namespace: String,

    /// Name of the loader that materialized this container.
    pub loader: String,

    /// Representation the container currently reflects.
    pub representation: RepresentationId,

    /// The transform used to parent this container's content into the
    /// surrounding hierarchy.
    pub subset_group: String,
}

/// Whether `node` carries the container marker.
pub fn is_container_node<S: SceneGraph>(scene: &S, node: &str) -> bool {
    scene
        .get_attr(node, TAG_ATTRIBUTE)
        .map(|value| value == CONTAINER_TAG)
        .unwrap_or(false)
}

/// Reads a container node back into a [`Container`].
///
/// A marked node missing one of the container attributes is corrupt and
/// reported as a hard error naming the node.
pub fn parse_container<S: SceneGraph>(scene: &S, node: &str) -> Result<Container, Error> {
    if !is_container_node(scene, node) {
        return Err(Error::NotAContainer(node.to_owned()));
    }

    let attr = |name: &'static str| {
        scene.get_attr(node, name).ok_or_else(|| Error::MissingAttr {
            node: node.to_owned(),
            attr: name,
        })
    };

    Ok(Container {
        object_name: node.to_owned(),
        container_id: ContainerId::new(attr(ID_ATTRIBUTE)?),
        namespace: attr(NAMESPACE_ATTRIBUTE)?,
        loader: attr(LOADER_ATTRIBUTE)?,
        representation: RepresentationId::new(attr(REPRESENTATION_ATTRIBUTE)?),
        subset_group: attr(SUBSET_GROUP_ATTRIBUTE)?,
    })
}

/// Creates the set node for `container`, writes its attributes, and registers
/// it in the top-level containers set. Loaders call this at the end of a
/// successful load.
pub fn write_container<S: SceneGraph>(scene: &mut S, container: &Container) -> Result<(), Error> {
    let node = container.object_name.as_str();

    scene.create_node(node, NodeKind::Set)?;
    scene.set_attr(node, TAG_ATTRIBUTE, CONTAINER_TAG)?;
    scene.set_attr(node, ID_ATTRIBUTE, container.container_id.as_str())?;
    scene.set_attr(node, NAMESPACE_ATTRIBUTE, &container.namespace)?;
    scene.set_attr(node, LOADER_ATTRIBUTE, &container.loader)?;
    scene.set_attr(node, REPRESENTATION_ATTRIBUTE, container.representation.as_str())?;
    scene.set_attr(node, SUBSET_GROUP_ATTRIBUTE, &container.subset_group)?;
    scene.add_to_set(&container.subset_group, node)?;

    if !scene.exists(CONTAINERS_SET) {
        scene.create_node(CONTAINERS_SET, NodeKind::Set)?;
    }
    scene.add_to_set(node, CONTAINERS_SET)?;

    Ok(())
}

/// Prefixes every segment of a `|`-separated hierarchy path with `namespace`.
///
/// Slot paths are recorded at publish time without namespaces; once loaded
/// under a namespace, the live nodes carry it, so the path has to gain it
/// before it can resolve.
pub fn to_namespace(path: &str, namespace: &str) -> String {
    if namespace.is_empty() {
        return path.to_owned();
    }

    path.split('|')
        .map(|segment| {
            if segment.is_empty() {
                String::new()
            } else {
                format!("{}:{}", namespace, segment)
            }
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Trailing segment of a namespace, the part local to the direct parent.
pub fn trailing_namespace(namespace: &str) -> &str {
    namespace.rsplit(':').next().unwrap_or(namespace)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scene::MemScene;

    fn sample_container() -> Container {
        Container {
            object_name: "ns:hero_CON".to_owned(),
            container_id: ContainerId::new("c-hero"),
            namespace: "ns".to_owned(),
            loader: "CacheLoader".to_owned(),
            representation: RepresentationId::new("r1"),
            subset_group: "ns:hero_GRP".to_owned(),
        }
    }

    #[test]
    fn write_then_parse_round_trips() {
        let mut scene = MemScene::new();
        scene
            .create_node("ns:hero_GRP", NodeKind::Transform)
            .unwrap();

        let container = sample_container();
        write_container(&mut scene, &container).unwrap();

        assert!(is_container_node(&scene, "ns:hero_CON"));
        assert_eq!(parse_container(&scene, "ns:hero_CON").unwrap(), container);
        assert_eq!(scene.list_members(CONTAINERS_SET), ["ns:hero_CON"]);
    }

    #[test]
    fn parse_rejects_unmarked_nodes() {
        let mut scene = MemScene::new();
        scene.create_node("plain", NodeKind::Set).unwrap();

        let result = parse_container(&scene, "plain");
        assert!(matches!(result, Err(Error::NotAContainer(node)) if node == "plain"));
    }

    #[test]
    fn parse_reports_missing_attributes() {
        let mut scene = MemScene::new();
        scene.create_node("half", NodeKind::Set).unwrap();
        scene.set_attr("half", TAG_ATTRIBUTE, CONTAINER_TAG).unwrap();
        scene.set_attr("half", ID_ATTRIBUTE, "c1").unwrap();

        let result = parse_container(&scene, "half");
        assert!(matches!(
            result,
            Err(Error::MissingAttr { node, .. }) if node == "half"
        ));
    }

    #[test]
    fn to_namespace_prefixes_each_segment() {
        assert_eq!(to_namespace("|grp_a|grp_b", "ns"), "|ns:grp_a|ns:grp_b");
        assert_eq!(to_namespace("grp_a", "ns"), "ns:grp_a");
        assert_eq!(to_namespace("|grp_a", ""), "|grp_a");
        assert_eq!(to_namespace("", "ns"), "");
    }

    #[test]
    fn trailing_namespace_takes_the_last_segment() {
        assert_eq!(trailing_namespace("shot:room:chair_01"), "chair_01");
        assert_eq!(trailing_namespace("chair_01"), "chair_01");
    }

    #[test]
    fn minted_ids_differ() {
        assert_ne!(ContainerId::mint(), ContainerId::mint());
    }
}
