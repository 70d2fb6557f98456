//! # Verifying Server Example
//!
//! Accepts deletes only from clients signing with a known key/secret pair.
//!
//! ## Usage
//!
//! ```sh
//! cargo run --example verifying_server --features "server"
//! ```

use axum::{Json, Router, extract::Path, routing::delete};
use central_storage::prelude::*;
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Don't use these in production! Look consumers up in your own store instead.
    let consumers = StaticConsumers::new([("abcdef", "bcdefhijklmn")]);

    let app = Router::new()
        .route(
            "/api/v1/assets/{key}",
            delete(
                |SignedConsumer(consumer): SignedConsumer, Path(key): Path<String>| async move {
                    println!("{consumer} deleted {key}");
                    Json(serde_json::json!({ "success": true }))
                },
            ),
        )
        .with_state(VerifierState::new(consumers));

    let port = env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let addr = format!("0.0.0.0:{port}");
    println!("Server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
