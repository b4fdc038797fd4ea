use thiserror::Error;

use crate::scene::SceneError;
use crate::store::RepresentationId;

/// Hard failures that abort a load or update operation.
///
/// Each message names the offending node or slot so the artist can repair the
/// scene and retry. Unresolved lookups are not errors; see
/// [`crate::hierarchy::Resolution`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("node {0} is not a container")]
    NotAContainer(String),

    #[error("container node {node} is missing attribute {attr}")]
    MissingAttr { node: String, attr: &'static str },

    /// A child subset that can be neither reloaded from a reference node nor
    /// rebuilt in place by its loader. Updating around it would leave the
    /// hierarchy half-old, half-new, so the whole cascade stops here.
    #[error("found non-updatable child subset {node}, aborting")]
    NotUpdatable { node: String },

    #[error("no loader named {name} accepts representation {representation}")]
    LoaderMissing {
        name: String,
        representation: RepresentationId,
    },

    #[error("representation {0} is not in the store")]
    RepresentationMissing(RepresentationId),

    #[error("attachment slot {slot} under {root} matched {matched} nodes, expected exactly one")]
    SlotResolution {
        slot: String,
        root: String,
        matched: usize,
    },

    #[error(transparent)]
    Scene(#[from] SceneError),
}
