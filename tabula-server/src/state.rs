use std::sync::Arc;

use tabula_data::{GenericRepository, RepositoryRegistry};

/// Table whose repository answers catalog questions (`list_tables`).
pub const CATALOG_TABLE: &str = "information_schema.tables";

/// Shared handler state.
///
/// The catalog repository is held outside the registry so that listing
/// tables never creates a registry entry.
pub struct AppState<B> {
    pub registry: RepositoryRegistry<B>,
    pub catalog: Arc<GenericRepository<B>>,
}

impl<B> AppState<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            catalog: Arc::new(GenericRepository::new(CATALOG_TABLE, backend.clone())),
            registry: RepositoryRegistry::new(backend),
        }
    }
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            catalog: self.catalog.clone(),
        }
    }
}
