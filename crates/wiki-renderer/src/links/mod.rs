//! Link and image targets.
//!
//! Link and image nodes carry a [`HandlerRef`] chosen at parse time. Renderers
//! ask the handler to resolve or render the target and fall back to plain
//! text when it returns a [`LinkError`].

mod handler;
mod parts;
mod resolver;
mod simple;

pub use handler::{HandlerRef, IdentityFilter, LinkError, LinkPartsHandler, UrlOutputFilter};
pub use parts::LinkParts;
pub use resolver::{LinkResolutionContext, Resolved, ResolvedKind};
pub use simple::{SimpleAnchors, SimpleImages};
