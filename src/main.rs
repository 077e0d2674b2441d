//! Provider binary entry point.
//!
//! The host spawns this process, reads the handshake line from stdout, and
//! drives the provider over gRPC until it sends a stop or a signal.

use ionoscloud_provider::{logging, provider::IonosProvider, server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting IONOS Cloud provider"
    );

    server::serve(IonosProvider::new()).await
}
