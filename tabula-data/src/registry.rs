use crate::repository::GenericRepository;
use dashmap::DashMap;
use std::sync::Arc;

/// Table-name to repository cache.
///
/// Entries are created on first access and live until [`evict`](Self::evict)
/// is called; there is no size bound or expiry, since table names are chosen
/// by operators rather than end users.
///
/// Clone + Send + Sync; clones share the same map.
pub struct RepositoryRegistry<B> {
    backend: Arc<B>,
    repositories: Arc<DashMap<String, Arc<GenericRepository<B>>>>,
}

impl<B> RepositoryRegistry<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            repositories: Arc::new(DashMap::new()),
        }
    }

    /// Get or create the repository bound to `table`.
    pub fn resolve(&self, table: &str) -> Arc<GenericRepository<B>> {
        self.repositories
            .entry(table.to_string())
            .or_insert_with(|| {
                tracing::debug!(table, "creating repository");
                Arc::new(GenericRepository::new(table, self.backend.clone()))
            })
            .clone()
    }

    /// Forget the repository bound to `table`. Returns whether one was cached.
    pub fn evict(&self, table: &str) -> bool {
        self.repositories.remove(table).is_some()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.repositories.contains_key(table)
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Get the shared backend handle.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }
}

impl<B> Clone for RepositoryRegistry<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            repositories: self.repositories.clone(),
        }
    }
}
