//! Render error type.

use wiki_storage::StorageError;

/// Failure of a whole render call.
///
/// Per-node failures (links, directives, macros) never surface here; they
/// degrade to fallback output inside the render.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The page could not be fetched.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The output document could not be built or serialized.
    #[error("XML error: {0}")]
    Xml(String),
}
