use crate::asset::Asset;
use crate::error::*;

/// Local persistence for asset records.
pub trait AssetRepository: Send + Sync + 'static + Clone {
    fn save(&self, asset: Asset) -> impl Future<Output = Result<(), RepositoryError>> + Send;
    fn find(
        &self,
        asset_key: &str,
    ) -> impl Future<Output = Result<Option<Asset>, RepositoryError>> + Send;

    /// Returns the removed record, if there was one.
    fn remove(
        &self,
        asset_key: &str,
    ) -> impl Future<Output = Result<Option<Asset>, RepositoryError>> + Send;
}

/// Resolves the shared secret of a consumer key on the verifying side.
pub trait ConsumerStore: Send + Sync + 'static + Clone {
    fn secret_for(&self, key: &str) -> impl Future<Output = Option<String>> + Send;
}
