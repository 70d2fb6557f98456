pub use central_storage_core::*;

#[cfg(feature = "server")]
pub mod server {
    pub use central_storage_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use central_storage_client::*;
}

pub mod prelude {
    pub use central_storage_core::prelude::*;

    #[cfg(feature = "server")]
    pub use central_storage_server::prelude::*;

    #[cfg(feature = "client")]
    pub use central_storage_client::{
        AssetManager, CentralStorageClient, ClientConfig, RequestOverrides, StorageServerError,
    };
}
