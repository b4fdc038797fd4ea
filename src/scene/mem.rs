use std::collections::BTreeMap;

use super::{NodeKind, SceneError, SceneGraph};

/// In-memory scene graph.
///
/// Nodes are identified by unique names, namespace prefixes included.
/// Transforms form a DAG by parenting; set nodes carry an ordered member
/// list. Every mutating call is appended to a log so tests can assert that an
/// operation aborted before touching the scene.
#[derive(Debug, Default)]
pub struct MemScene {
    nodes: BTreeMap<String, Node>,
    namespace: String,
    mutations: Vec<String>,
}

#[derive(Debug, Default)]
struct Node {
    kind: NodeKind,
    attrs: BTreeMap<String, String>,
    parent: Option<String>,
    children: Vec<String>,
    members: Vec<String>,
    referenced: bool,
}

impl MemScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags `node` as being backed by a file reference.
    pub fn mark_reference(&mut self, node: &str) -> Result<(), SceneError> {
        let node = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| SceneError::NoSuchNode(node.to_owned()))?;
        node.referenced = true;
        Ok(())
    }

    /// Every mutating adapter call made so far, in order.
    pub fn mutation_log(&self) -> &[String] {
        &self.mutations
    }

    pub fn clear_mutation_log(&mut self) {
        self.mutations.clear();
    }

    fn is_ancestor(&self, maybe_ancestor: &str, node: &str) -> bool {
        let mut current = self.nodes.get(node).and_then(|n| n.parent.clone());

        while let Some(name) = current {
            if name == maybe_ancestor {
                return true;
            }
            current = self.nodes.get(&name).and_then(|n| n.parent.clone());
        }

        false
    }
}

impl SceneGraph for MemScene {
    fn exists(&self, node: &str) -> bool {
        self.nodes.contains_key(node)
    }

    fn get_attr(&self, node: &str, attr: &str) -> Option<String> {
        self.nodes.get(node)?.attrs.get(attr).cloned()
    }

    fn set_attr(&mut self, node: &str, attr: &str, value: &str) -> Result<(), SceneError> {
        let entry = format!("set_attr {}.{}", node, attr);
        let found = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| SceneError::NoSuchNode(node.to_owned()))?;

        found.attrs.insert(attr.to_owned(), value.to_owned());
        self.mutations.push(entry);
        Ok(())
    }

    fn list_members(&self, set_node: &str) -> Vec<String> {
        self.nodes
            .get(set_node)
            .map(|n| n.members.clone())
            .unwrap_or_default()
    }

    fn list_sets(&self, node: &str) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.kind == NodeKind::Set && n.members.iter().any(|m| m == node))
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn parent_of(&self, node: &str) -> Option<String> {
        self.nodes.get(node)?.parent.clone()
    }

    fn ls(&self, path: &str) -> Vec<String> {
        let mut segments = path.split('|').filter(|s| !s.is_empty());

        let first = match segments.next() {
            Some(segment) => segment,
            None => return Vec::new(),
        };

        let mut current: Vec<String> = if self.nodes.contains_key(first) {
            vec![first.to_owned()]
        } else {
            Vec::new()
        };

        for segment in segments {
            let mut next = Vec::new();

            for name in &current {
                if let Some(node) = self.nodes.get(name) {
                    for child in &node.children {
                        if child == segment {
                            next.push(child.clone());
                        }
                    }
                }
            }

            current = next;
        }

        current
    }

    fn find_by_attr(
        &self,
        attr: &str,
        value: Option<&str>,
        namespace: Option<&str>,
    ) -> Vec<String> {
        let prefix = namespace.map(|ns| format!("{}:", ns));

        self.nodes
            .iter()
            .filter(|(name, _)| match &prefix {
                Some(prefix) => name.starts_with(prefix.as_str()),
                None => true,
            })
            .filter(|(_, node)| match (node.attrs.get(attr), value) {
                (Some(found), Some(want)) => found == want,
                (Some(_), None) => true,
                (None, _) => false,
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn is_reference(&self, node: &str) -> bool {
        self.nodes.get(node).map(|n| n.referenced).unwrap_or(false)
    }

    fn create_node(&mut self, name: &str, kind: NodeKind) -> Result<String, SceneError> {
        if self.nodes.contains_key(name) {
            return Err(SceneError::DuplicateNode(name.to_owned()));
        }

        self.mutations.push(format!("create {}", name));
        self.nodes.insert(
            name.to_owned(),
            Node {
                kind,
                ..Default::default()
            },
        );

        Ok(name.to_owned())
    }

    fn delete_node(&mut self, node: &str) -> Result<(), SceneError> {
        if !self.nodes.contains_key(node) {
            return Err(SceneError::NoSuchNode(node.to_owned()));
        }

        self.mutations.push(format!("delete {}", node));

        let mut doomed = vec![node.to_owned()];
        let mut index = 0;
        while index < doomed.len() {
            if let Some(found) = self.nodes.get(&doomed[index]) {
                doomed.extend(found.children.iter().cloned());
            }
            index += 1;
        }

        if let Some(parent) = self.nodes.get(node).and_then(|n| n.parent.clone()) {
            if let Some(parent) = self.nodes.get_mut(&parent) {
                parent.children.retain(|c| c.as_str() != node);
            }
        }

        for name in &doomed {
            self.nodes.remove(name);
        }
        for remaining in self.nodes.values_mut() {
            remaining.members.retain(|m| !doomed.contains(m));
        }

        Ok(())
    }

    fn reparent(&mut self, node: &str, new_parent: &str) -> Result<String, SceneError> {
        if !self.nodes.contains_key(node) {
            return Err(SceneError::NoSuchNode(node.to_owned()));
        }
        if !self.nodes.contains_key(new_parent) {
            return Err(SceneError::NoSuchNode(new_parent.to_owned()));
        }
        if node == new_parent || self.is_ancestor(node, new_parent) {
            return Err(SceneError::CyclicReparent {
                node: node.to_owned(),
                parent: new_parent.to_owned(),
            });
        }

        self.mutations.push(format!("reparent {} -> {}", node, new_parent));

        if let Some(old) = self.nodes.get(node).and_then(|n| n.parent.clone()) {
            if let Some(old) = self.nodes.get_mut(&old) {
                old.children.retain(|c| c.as_str() != node);
            }
        }

        if let Some(parent) = self.nodes.get_mut(new_parent) {
            parent.children.push(node.to_owned());
        }
        if let Some(moved) = self.nodes.get_mut(node) {
            moved.parent = Some(new_parent.to_owned());
        }

        Ok(node.to_owned())
    }

    fn add_to_set(&mut self, node: &str, set_node: &str) -> Result<(), SceneError> {
        if !self.nodes.contains_key(node) {
            return Err(SceneError::NoSuchNode(node.to_owned()));
        }

        let entry = format!("sets add {} -> {}", node, set_node);
        match self.nodes.get_mut(set_node) {
            Some(set) if set.kind == NodeKind::Set => {
                if !set.members.iter().any(|m| m == node) {
                    set.members.push(node.to_owned());
                }
            }
            Some(_) => return Err(SceneError::NotASet(set_node.to_owned())),
            None => return Err(SceneError::NoSuchNode(set_node.to_owned())),
        }

        self.mutations.push(entry);
        Ok(())
    }

    fn remove_from_set(&mut self, node: &str, set_node: &str) -> Result<(), SceneError> {
        let entry = format!("sets rm {} <- {}", node, set_node);
        match self.nodes.get_mut(set_node) {
            Some(set) if set.kind == NodeKind::Set => {
                set.members.retain(|m| m.as_str() != node);
            }
            Some(_) => return Err(SceneError::NotASet(set_node.to_owned())),
            None => return Err(SceneError::NoSuchNode(set_node.to_owned())),
        }

        self.mutations.push(entry);
        Ok(())
    }

    fn current_namespace(&self) -> String {
        self.namespace.clone()
    }

    fn set_namespace(&mut self, namespace: &str) -> Result<String, SceneError> {
        Ok(std::mem::replace(&mut self.namespace, namespace.to_owned()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn scene_with_chain() -> MemScene {
        let mut scene = MemScene::new();
        scene.create_node("ROOT", NodeKind::Transform).unwrap();
        scene.create_node("ns:grp_a", NodeKind::Transform).unwrap();
        scene.create_node("ns:grp_b", NodeKind::Transform).unwrap();
        scene.reparent("ns:grp_a", "ROOT").unwrap();
        scene.reparent("ns:grp_b", "ns:grp_a").unwrap();
        scene
    }

    #[test]
    fn ls_walks_the_hierarchy() {
        let scene = scene_with_chain();

        assert_eq!(scene.ls("ROOT"), ["ROOT"]);
        assert_eq!(scene.ls("ROOT|ns:grp_a|ns:grp_b"), ["ns:grp_b"]);
        assert_eq!(scene.ls("ROOT|ns:grp_b"), Vec::<String>::new());
        assert_eq!(scene.ls("missing|ns:grp_a"), Vec::<String>::new());
    }

    #[test]
    fn delete_removes_descendants_and_memberships() {
        let mut scene = scene_with_chain();
        scene.create_node("the_set", NodeKind::Set).unwrap();
        scene.add_to_set("ns:grp_b", "the_set").unwrap();

        scene.delete_node("ns:grp_a").unwrap();

        assert!(!scene.exists("ns:grp_a"));
        assert!(!scene.exists("ns:grp_b"));
        assert_eq!(scene.list_members("the_set"), Vec::<String>::new());
        assert_eq!(scene.ls("ROOT|ns:grp_a"), Vec::<String>::new());
    }

    #[test]
    fn reparent_rejects_cycles() {
        let mut scene = scene_with_chain();

        let result = scene.reparent("ROOT", "ns:grp_b");
        assert!(matches!(result, Err(SceneError::CyclicReparent { .. })));
    }

    #[test]
    fn set_membership_is_deduplicated_and_removal_is_quiet() {
        let mut scene = MemScene::new();
        scene.create_node("node", NodeKind::Transform).unwrap();
        scene.create_node("the_set", NodeKind::Set).unwrap();

        scene.add_to_set("node", "the_set").unwrap();
        scene.add_to_set("node", "the_set").unwrap();
        assert_eq!(scene.list_members("the_set"), ["node"]);
        assert_eq!(scene.list_sets("node"), ["the_set"]);

        scene.remove_from_set("node", "the_set").unwrap();
        scene.remove_from_set("node", "the_set").unwrap();
        assert_eq!(scene.list_members("the_set"), Vec::<String>::new());
    }

    #[test]
    fn namespace_swap_returns_previous() {
        let mut scene = MemScene::new();

        assert_eq!(scene.set_namespace("shot").unwrap(), "");
        assert_eq!(scene.current_namespace(), "shot");
        assert_eq!(scene.set_namespace("").unwrap(), "shot");
    }

    #[test]
    fn mutation_log_records_writes_only() {
        let mut scene = MemScene::new();
        scene.create_node("node", NodeKind::Transform).unwrap();
        scene.set_attr("node", "id", "value").unwrap();

        let before = scene.mutation_log().len();
        scene.exists("node");
        scene.get_attr("node", "id");
        scene.find_by_attr("id", None, None);
        assert_eq!(scene.mutation_log().len(), before);
    }
}
