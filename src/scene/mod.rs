//! The boundary between the engine and the host application's scene graph.
//!
//! The engine never talks to a DCC directly; everything it needs from the
//! host is expressed through the [`SceneGraph`] trait and implemented by an
//! adapter owned by the host integration. [`MemScene`] is the in-memory
//! implementation used by this crate's tests and doubles as the reference
//! semantics for adapter authors.

mod mem;

pub use mem::MemScene;

use thiserror::Error;

/// Failures reported by a scene graph adapter.
///
/// These surface host API errors. The engine checks its own preconditions
/// before mutating, but an adapter failure in the middle of a mutation phase
/// propagates as-is and is not rolled back.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("node {0} does not exist")]
    NoSuchNode(String),

    #[error("a node named {0} already exists")]
    DuplicateNode(String),

    #[error("node {0} is not a set")]
    NotASet(String),

    #[error("cannot parent {node} under its own descendant {parent}")]
    CyclicReparent { node: String, parent: String },
}

/// What kind of node to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    /// A transform in the DAG hierarchy.
    #[default]
    Transform,
    /// A set node holding an ordered member list.
    Set,
}

/// Scene graph query and mutation operations the engine is written against.
///
/// Nodes are addressed by unique name, namespace prefixes included
/// (`shot:asset_01:hero_GRP`). Hierarchy paths join node names with `|`.
pub trait SceneGraph {
    fn exists(&self, node: &str) -> bool;

    fn get_attr(&self, node: &str, attr: &str) -> Option<String>;

    fn set_attr(&mut self, node: &str, attr: &str, value: &str) -> Result<(), SceneError>;

    /// Members of a set node. Empty for unknown nodes and non-sets.
    fn list_members(&self, set_node: &str) -> Vec<String>;

    /// Set nodes that `node` is a member of.
    fn list_sets(&self, node: &str) -> Vec<String>;

    /// DAG parent of a transform, if it has one.
    fn parent_of(&self, node: &str) -> Option<String>;

    /// Resolves a `|`-separated hierarchy path to the nodes it matches.
    fn ls(&self, path: &str) -> Vec<String>;

    /// Scans for nodes carrying `attr`, optionally filtered to a value and to
    /// names under `namespace` (nested namespaces included). This is the
    /// fallback lookup when no identity cache is installed for a session.
    fn find_by_attr(&self, attr: &str, value: Option<&str>, namespace: Option<&str>)
        -> Vec<String>;

    /// Whether `node` is backed by a file reference.
    fn is_reference(&self, node: &str) -> bool;

    fn create_node(&mut self, name: &str, kind: NodeKind) -> Result<String, SceneError>;

    /// Deletes `node` and its DAG descendants, dropping their set memberships.
    fn delete_node(&mut self, node: &str) -> Result<(), SceneError>;

    /// Moves `node` under `new_parent`, returning the node's name afterwards.
    fn reparent(&mut self, node: &str, new_parent: &str) -> Result<String, SceneError>;

    fn add_to_set(&mut self, node: &str, set_node: &str) -> Result<(), SceneError>;

    /// Removes `node` from a set's member list. Removing a non-member is a
    /// quiet no-op.
    fn remove_from_set(&mut self, node: &str, set_node: &str) -> Result<(), SceneError>;

    fn current_namespace(&self) -> String;

    /// Makes `namespace` current and returns the previously current one, so
    /// scoped callers can restore it on exit.
    fn set_namespace(&mut self, namespace: &str) -> Result<String, SceneError>;
}
