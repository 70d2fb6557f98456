//! # Upload Client Example
//!
//! Uploads a file, prints its urls and deletes it again.
//!
//! ## Usage
//!
//! ```sh
//! CENTRAL_STORAGE_SERVER=http://localhost:8000 \
//! CENTRAL_STORAGE_KEY=abcdef \
//! CENTRAL_STORAGE_SECRET=bcdefhijklmn \
//! cargo run --example upload_client --features "client"
//! ```

use central_storage::prelude::*;
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let client = CentralStorageClient::from_env()?;
    let manager = AssetManager::new(client.clone(), MemoryAssetRepository::new());

    let asset = manager
        .store(Path::new("assets/test.png"), [("category", "demo")])
        .await?;
    println!("Stored {} ({} bytes)", asset.asset_key, asset.size);

    println!("Asset url: {}", manager.url(&asset, [("width", "200")]));
    println!(
        "Proxy url: {}",
        client.public_asset_url("https://www.rust-lang.org/logos/rust-logo-512x512.png", [("width", "64")])
    );

    manager.delete(&asset, [("reason", "demo")]).await?;
    println!("Deleted {}", asset.asset_key);

    Ok(())
}
