//! Loader capabilities.
//!
//! A loader is the host-side plugin that turns a representation document into
//! live scene content, and later swaps that content for another version. The
//! engine treats loaders as an explicit capability interface: two operations
//! plus two capability flags, instead of comparing class names against
//! hardcoded lists.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::container::{Container, ContainerId};
use crate::error::Error;
use crate::scene::SceneGraph;
use crate::store::{RepresentationDoc, RepresentationId};

/// Everything a loader needs to materialize one container.
pub struct LoadContext<'a> {
    pub representation: &'a RepresentationDoc,

    /// Namespace the new content must be created under.
    pub namespace: String,

    /// Identity the new container must record. Minted by the publish step,
    /// or carried over when re-creating a container during a hierarchy
    /// update.
    pub container_id: ContainerId,
}

pub trait Loader<S: SceneGraph> {
    fn name(&self) -> &str;

    /// Representation format names this loader accepts.
    fn representations(&self) -> &[&str];

    /// Materializes the representation as live nodes under the context
    /// namespace and returns the resulting container.
    fn load(&self, scene: &mut S, ctx: &LoadContext<'_>) -> Result<Container, Error>;

    /// Points an existing container at `doc`, mutating its content in place.
    fn update(
        &self,
        scene: &mut S,
        container: &mut Container,
        doc: &RepresentationDoc,
    ) -> Result<(), Error>;

    /// Whether [`Loader::update`] can rebuild content that was imported
    /// rather than referenced. Content backed by a reference node is always
    /// updatable; imported content only when its loader opts in here.
    fn supports_incremental_update(&self) -> bool {
        false
    }

    /// Hierarchical loaders own nested sub-containers and need their
    /// hierarchy re-resolved on every update, even when the representation
    /// itself is unchanged.
    fn is_hierarchical(&self) -> bool {
        false
    }
}

/// The set of loaders known to a session, with a memo from representation id
/// to the loader resolved for it.
pub struct LoaderRegistry<S> {
    loaders: Vec<Box<dyn Loader<S>>>,
    resolved: RefCell<HashMap<RepresentationId, usize>>,
}

impl<S: SceneGraph> LoaderRegistry<S> {
    pub fn new() -> Self {
        LoaderRegistry {
            loaders: Vec::new(),
            resolved: RefCell::new(HashMap::new()),
        }
    }

    pub fn register(&mut self, loader: Box<dyn Loader<S>>) {
        self.loaders.push(loader);
    }

    /// Looks a loader up by name alone, for capability checks on containers
    /// already in the scene.
    pub fn get(&self, name: &str) -> Option<&dyn Loader<S>> {
        self.loaders
            .iter()
            .find(|loader| loader.name() == name)
            .map(|loader| loader.as_ref())
    }

    /// Resolves the loader to use for `doc`: it must carry the requested
    /// name and accept the document's format. Memoized per representation
    /// id. A miss is a hard abort, the scene cannot be left waiting for a
    /// loader that does not exist.
    pub fn resolve(&self, name: &str, doc: &RepresentationDoc) -> Result<&dyn Loader<S>, Error> {
        if let Some(&index) = self.resolved.borrow().get(&doc.id) {
            return Ok(self.loaders[index].as_ref());
        }

        let index = self
            .loaders
            .iter()
            .position(|loader| {
                loader.name() == name && loader.representations().contains(&doc.name.as_str())
            })
            .ok_or_else(|| Error::LoaderMissing {
                name: name.to_owned(),
                representation: doc.id.clone(),
            })?;

        self.resolved.borrow_mut().insert(doc.id.clone(), index);
        Ok(self.loaders[index].as_ref())
    }
}

impl<S: SceneGraph> Default for LoaderRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scene::MemScene;
    use serde_json::Value;

    struct NullLoader {
        name: &'static str,
        formats: &'static [&'static str],
    }

    impl Loader<MemScene> for NullLoader {
        fn name(&self) -> &str {
            self.name
        }

        fn representations(&self) -> &[&str] {
            self.formats
        }

        fn load(&self, _scene: &mut MemScene, _ctx: &LoadContext<'_>) -> Result<Container, Error> {
            unimplemented!("not exercised")
        }

        fn update(
            &self,
            _scene: &mut MemScene,
            _container: &mut Container,
            _doc: &RepresentationDoc,
        ) -> Result<(), Error> {
            unimplemented!("not exercised")
        }
    }

    fn doc(id: &str, format: &str) -> RepresentationDoc {
        RepresentationDoc {
            id: RepresentationId::new(id),
            name: format.to_owned(),
            asset: "room".to_owned(),
            subset: "chair".to_owned(),
            version: 1,
            data: Value::Null,
        }
    }

    fn registry() -> LoaderRegistry<MemScene> {
        let mut registry = LoaderRegistry::new();
        registry.register(Box::new(NullLoader {
            name: "CacheLoader",
            formats: &["cache"],
        }));
        registry.register(Box::new(NullLoader {
            name: "UsdLoader",
            formats: &["usd"],
        }));
        registry
    }

    #[test]
    fn resolve_matches_name_and_format() {
        let registry = registry();

        let found = registry.resolve("CacheLoader", &doc("r1", "cache")).unwrap();
        assert_eq!(found.name(), "CacheLoader");

        let wrong_format = registry.resolve("CacheLoader", &doc("r2", "usd"));
        assert!(matches!(wrong_format, Err(Error::LoaderMissing { .. })));

        let unknown = registry.resolve("NoSuchLoader", &doc("r3", "cache"));
        assert!(matches!(unknown, Err(Error::LoaderMissing { .. })));
    }

    #[test]
    fn resolve_is_memoized_by_representation() {
        let registry = registry();
        let document = doc("r1", "cache");

        registry.resolve("CacheLoader", &document).unwrap();

        // The memo hit wins even when a different name is asked for, the
        // representation already has its loader.
        let found = registry.resolve("UsdLoader", &document).unwrap();
        assert_eq!(found.name(), "CacheLoader");
    }
}
