//! IONOS Cloud provider plugin.
//!
//! Exposes IONOS Cloud infrastructure primitives (servers, LANs, network
//! load balancers, security groups, DNS zones and records, logging
//! pipelines, WireGuard VPN gateways and peers, Postgres clusters,
//! certificates) as declaratively managed resources and read-only data
//! sources. The binary is spawned by the host, prints a handshake line on
//! stdout, and then serves the provider protocol over gRPC.
//!
//! # Layout
//!
//! - [`schema`], [`validation`], [`plan`], [`types`]: the declarative layer —
//!   attribute schemas, configuration validation, and schema-driven diffing.
//! - [`server`]: the [`server::ProviderService`] trait and the gRPC serving
//!   loop with the stdout handshake.
//! - [`api`]: the REST clients for the IONOS service APIs.
//! - [`resources`] / [`datasources`]: one module per type, pairing a schema
//!   with CRUD handlers and field-by-field response mapping.
//! - [`resolve`]: the id-or-name lookup shared by every data source.
//! - [`waiter`]: the bounded state-change poll loop used after mutations.
//! - [`import`]: composite import identifier parsing.
//! - [`testing`]: an in-process harness for driving the provider in tests.
//!
//! # Quick Start
//!
//! ```ignore
//! use ionoscloud_provider::{logging, provider::IonosProvider, server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     logging::init();
//!     server::serve(IonosProvider::new()).await
//! }
//! ```
//!
//! # Handshake Protocol
//!
//! When the provider starts via [`server::serve`], it prints a handshake
//! line on stdout:
//!
//! ```text
//! IONOS_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! Format: `IONOS_PROVIDER|<protocol_version>|<address>`. Logs go to stderr
//! so the handshake stays parseable.

#![warn(clippy::all)]

pub mod api;
pub mod datasources;
pub mod error;
pub mod import;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod resolve;
pub mod resources;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod validation;
pub mod waiter;

#[allow(clippy::all)]
pub mod generated;

// Re-export main types at crate root
pub use error::ProviderError;
pub use logging::{init as init_logging, try_init as try_init_logging};
pub use provider::IonosProvider;
pub use schema::ProviderSchema;
pub use server::{serve, serve_on, serve_on_with_options, serve_with_options, ProviderService, ServeOptions};
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities,
    HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tonic;
pub use tracing;
