//! Node-side collaborators consulted by capability strategies.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;

use bidgrid_core::{InputSource, LocalSource};

use crate::error::BidResult;

/// Answers whether a provider (engine, storage driver, publisher) is
/// installed on this node.
pub trait ProviderRegistry: Send + Sync {
    fn has(&self, key: &str) -> bool;
}

impl ProviderRegistry for HashSet<String> {
    fn has(&self, key: &str) -> bool {
        self.contains(key)
    }
}

pub type LocalityFuture<'a> = Pin<Box<dyn Future<Output = BidResult<bool>> + Send + 'a>>;

/// Answers whether an input is already present on this node.
pub trait StorageLocality: Send + Sync {
    fn has_storage_locally<'a>(&'a self, input: &'a InputSource) -> LocalityFuture<'a>;
}

/// Locality oracle backed by a fixed set of inputs, keyed by storage type
/// then source.
#[derive(Debug, Clone, Default)]
pub struct StaticLocality {
    by_storage: HashMap<String, HashSet<String>>,
}

impl StaticLocality {
    pub fn new(sources: impl IntoIterator<Item = LocalSource>) -> Self {
        let mut by_storage: HashMap<String, HashSet<String>> = HashMap::new();
        for LocalSource {
            storage_type,
            source,
        } in sources
        {
            by_storage.entry(storage_type).or_default().insert(source);
        }
        Self { by_storage }
    }
}

impl StorageLocality for StaticLocality {
    fn has_storage_locally<'a>(&'a self, input: &'a InputSource) -> LocalityFuture<'a> {
        let local = self
            .by_storage
            .get(&input.storage_type)
            .is_some_and(|sources| sources.contains(&input.source));
        Box::pin(std::future::ready(Ok(local)))
    }
}
