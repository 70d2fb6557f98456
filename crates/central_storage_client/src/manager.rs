use crate::{AssetManagerError, CentralStorageClient, RequestOverrides};
use central_storage_core::prelude::*;
use std::path::Path;
use tracing::error;

/// Keeps local asset records in sync with the storage server.
#[derive(Clone)]
pub struct AssetManager<R: AssetRepository> {
    client: CentralStorageClient,
    repository: R,
}

impl<R: AssetRepository> AssetManager<R> {
    pub fn new(client: CentralStorageClient, repository: R) -> Self {
        Self { client, repository }
    }

    pub fn client(&self) -> &CentralStorageClient {
        &self.client
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Uploads the file and records the resulting asset.
    pub async fn store<I, K, V>(&self, path: &Path, attributes: I) -> Result<Asset, AssetManagerError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let asset = self
            .client
            .store(path, attributes, &RequestOverrides::default())
            .await?;
        self.repository.save(asset.clone()).await?;
        Ok(asset)
    }

    pub fn url<I, K, V>(&self, asset: &Asset, parameters: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.client.asset_url(asset, parameters, None)
    }

    /// Removes the local record, then the remote asset.
    ///
    /// The removed record is put back when the server call fails. Returns
    /// whether a local record existed.
    pub async fn delete<I, K, V>(&self, asset: &Asset, parameters: I) -> Result<bool, AssetManagerError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let removed = self.repository.remove(&asset.asset_key).await?;

        if let Err(err) = self
            .client
            .delete_asset(asset, parameters, &RequestOverrides::default())
            .await
        {
            if let Some(record) = removed {
                if let Err(restore_err) = self.repository.save(record).await {
                    error!(
                        "Failed to restore asset {} after remote delete failed: {restore_err}",
                        asset.asset_key
                    );
                }
            }
            return Err(err.into());
        }

        Ok(removed.is_some())
    }
}
