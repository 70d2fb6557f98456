use crate::asset::Asset;
use crate::error::RepositoryError;
use crate::traits::AssetRepository;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Keeps asset records in memory. Meant for tests and examples.
#[derive(Clone, Default)]
pub struct MemoryAssetRepository {
    assets: Arc<RwLock<HashMap<String, Asset>>>,
}

impl MemoryAssetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> RepositoryError {
    RepositoryError::Generic("Asset lock poisoned".into())
}

impl AssetRepository for MemoryAssetRepository {
    async fn save(&self, asset: Asset) -> Result<(), RepositoryError> {
        self.assets
            .write()
            .map_err(poisoned)?
            .insert(asset.asset_key.clone(), asset);
        Ok(())
    }

    async fn find(&self, asset_key: &str) -> Result<Option<Asset>, RepositoryError> {
        Ok(self.assets.read().map_err(poisoned)?.get(asset_key).cloned())
    }

    async fn remove(&self, asset_key: &str) -> Result<Option<Asset>, RepositoryError> {
        Ok(self.assets.write().map_err(poisoned)?.remove(asset_key))
    }
}
