//! Mock page store implementation for testing.
//!
//! Provides [`MockPageStore`] for unit testing without a real backend.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use crate::storage::{PageInfo, PageReference, PageStore, StorageError};

/// Mock page store for testing.
///
/// Stores every revision of every page in memory. Use the builder methods
/// to configure the mock with test data.
///
/// # Example
///
/// ```
/// use wiki_storage::{MockPageStore, PageReference, PageStore};
///
/// let store = MockPageStore::new()
///     .with_page("FrontPage", "= Welcome =")
///     .with_wiki("c2");
///
/// let page = store.get(&PageReference::local("FrontPage"), None).unwrap();
/// assert_eq!(page.content, "= Welcome =");
/// ```
#[derive(Debug, Default)]
pub struct MockPageStore {
    pages: RwLock<BTreeMap<PageReference, Vec<PageInfo>>>,
    wikis: RwLock<BTreeSet<String>>,
}

impl MockPageStore {
    /// Create a new empty mock store serving only the local wiki.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page of the local wiki as a new revision.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_page(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(PageInfo::new(PageReference::local(path), content));
        self
    }

    /// Add a fully specified page as a new revision.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_page_info(self, info: PageInfo) -> Self {
        self.insert(info);
        self
    }

    /// Declare a foreign wiki as known to the store.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_wiki(self, wiki: impl Into<String>) -> Self {
        self.wikis.write().unwrap().insert(wiki.into());
        self
    }

    /// Store a page as its next revision.
    ///
    /// Revisions are numbered from 1 unless the info carries its own number.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert(&self, mut info: PageInfo) {
        let mut pages = self.pages.write().unwrap();
        let revisions = pages.entry(info.reference.clone()).or_default();
        if info.revision.is_none() {
            info.revision = Some(revisions.len() as u64 + 1);
        }
        revisions.push(info);
    }

    fn knows_wiki(&self, page: &PageReference) -> bool {
        match &page.wiki {
            None => true,
            Some(wiki) => self.wikis.read().unwrap().contains(wiki),
        }
    }
}

impl PageStore for MockPageStore {
    fn get(&self, page: &PageReference, revision: Option<u64>) -> Result<PageInfo, StorageError> {
        if !self.knows_wiki(page) {
            return Err(StorageError::unknown_wiki(page.clone()).with_backend("Mock"));
        }

        let pages = self.pages.read().unwrap();
        let revisions = pages
            .get(page)
            .ok_or_else(|| StorageError::not_found(page.clone()).with_backend("Mock"))?;

        let found = match revision {
            Some(wanted) => revisions.iter().find(|info| info.revision == Some(wanted)),
            None => revisions.last(),
        };

        found
            .cloned()
            .ok_or_else(|| StorageError::not_found(page.clone()).with_backend("Mock"))
    }
}
