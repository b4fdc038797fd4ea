//! Traversal over the container tree and its containment chains.

use std::collections::VecDeque;

use crate::container::{self, Container, ContainerId, ID_ATTRIBUTE};
use crate::error::Error;
use crate::scene::SceneGraph;

/// Separator joining container ids into an id path.
pub const ID_PATH_SEPARATOR: &str = "|";

/// Container nodes nested in `container`'s member set, reached directly or
/// through intermediate plain sets.
pub fn sub_container_nodes<S: SceneGraph>(scene: &S, container: &Container) -> Vec<String> {
    let mut found = Vec::new();
    collect_member_containers(scene, &container.object_name, &mut found);
    found
}

fn collect_member_containers<S: SceneGraph>(scene: &S, set_node: &str, found: &mut Vec<String>) {
    for member in scene.list_members(set_node) {
        if container::is_container_node(scene, &member) {
            found.push(member);
        } else {
            // A plain grouping set; containers inside it still belong to
            // this container. Non-set members have no members of their own.
            collect_member_containers(scene, &member, found);
        }
    }
}

/// Direct sub-containers of `container`, parsed.
pub fn parse_sub_containers<S: SceneGraph>(
    scene: &S,
    container: &Container,
) -> Result<Vec<Container>, Error> {
    sub_container_nodes(scene, container)
        .iter()
        .map(|node| container::parse_container(scene, node))
        .collect()
}

/// Every descendant container of `container`, depth-first pre-order. The
/// input container itself is not included. Materialized eagerly; hierarchies
/// are bounded by artist-authored scene complexity.
pub fn walk_containers<S: SceneGraph>(
    scene: &S,
    container: &Container,
) -> Result<Vec<Container>, Error> {
    let mut found = Vec::new();

    for sub in parse_sub_containers(scene, container)? {
        let descendants = walk_containers(scene, &sub)?;
        found.push(sub);
        found.extend(descendants);
    }

    Ok(found)
}

/// Lazy walk up a node's containment chain, yielding the id of each
/// enclosing container from leaf to root.
///
/// One containment level is inspected per `next` call; the resolver advances
/// many of these in lock-step and stops as soon as a path disambiguates, so
/// laziness is load-bearing here. A node with no enclosing container ends the
/// iteration. Not restartable; build a new one for a fresh pass.
pub struct ClimbIds<'a, S> {
    scene: &'a S,
    current: Option<String>,
}

pub fn climb_ids<'a, S: SceneGraph>(scene: &'a S, node: &str) -> ClimbIds<'a, S> {
    ClimbIds {
        scene,
        current: Some(node.to_owned()),
    }
}

impl<S: SceneGraph> Iterator for ClimbIds<'_, S> {
    type Item = ContainerId;

    fn next(&mut self) -> Option<ContainerId> {
        let node = self.current.take()?;

        // The enclosing container may hold this node through intermediate
        // plain sets; search containing sets breadth-first until one carries
        // the container marker.
        let mut queue: VecDeque<String> = self.scene.list_sets(&node).into();
        while let Some(set_node) = queue.pop_front() {
            if container::is_container_node(self.scene, &set_node) {
                let id = self.scene.get_attr(&set_node, ID_ATTRIBUTE)?;
                self.current = Some(set_node);
                return Some(ContainerId::new(id));
            }
            queue.extend(self.scene.list_sets(&set_node));
        }

        None
    }
}

/// Root-to-leaf id path of `node`'s containment chain, including `node`'s
/// own id.
pub fn container_id_path<S: SceneGraph>(scene: &S, node: &str) -> Result<String, Error> {
    let own = scene.get_attr(node, ID_ATTRIBUTE).ok_or(Error::MissingAttr {
        node: node.to_owned(),
        attr: ID_ATTRIBUTE,
    })?;

    let mut ids: Vec<String> = climb_ids(scene, node)
        .map(|id| id.as_str().to_owned())
        .collect();
    ids.reverse();
    ids.push(own);

    Ok(ids.join(ID_PATH_SEPARATOR))
}

/// [`container_id_path`] for a parsed container.
pub fn container_to_id_path<S: SceneGraph>(
    scene: &S,
    container: &Container,
) -> Result<String, Error> {
    container_id_path(scene, &container.object_name)
}
