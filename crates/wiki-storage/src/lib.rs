//! Page accessor abstraction for the wiki renderer.
//!
//! The renderer never persists pages. It reads them through the [`PageStore`]
//! trait, which a hosting application implements over its version-control
//! backend. This enables:
//!
//! - **Unit testing** without a real repository
//! - **Backend flexibility** (version control, database, in-memory)
//!
//! # Architecture
//!
//! The crate provides:
//! - [`PageReference`] and [`PageInfo`] describing pages
//! - [`PageStore`] trait with `get()` and `exists()` methods
//! - [`StorageError`] with a semantic [`StorageErrorKind`]
//! - [`MockPageStore`] for testing (behind `mock` feature flag)

#[cfg(feature = "mock")]
mod mock;
mod storage;

#[cfg(feature = "mock")]
pub use mock::MockPageStore;
pub use storage::{PageInfo, PageReference, PageStore, StorageError, StorageErrorKind};
