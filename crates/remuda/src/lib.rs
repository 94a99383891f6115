//! Remuda - model creation client for Ollama-compatible backends.
//!
//! This crate handles the client side of creating a model on a remote
//! model-serving backend: it parses a modelfile, uploads locally referenced
//! weights and adapters to the backend's content-addressed blob store, and
//! submits the create request with the references rewritten to blob digests.
//!
//! # Example
//!
//! ```rust,ignore
//! use remuda::{CreateRequest, ModelClient};
//!
//! #[tokio::main]
//! async fn main() -> remuda::Result<()> {
//!     let client = ModelClient::new(None);
//!
//!     let status = client
//!         .create(CreateRequest {
//!             model: "my-model".into(),
//!             path: Some("./Modelfile".into()),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("create: {}", status.status);
//!
//!     Ok(())
//! }
//! ```

pub mod blob;
pub mod client;
pub mod config;
pub mod error;
pub mod image;
pub mod modelfile;
pub mod paths;
pub mod transport;

// Re-export commonly used types
pub use blob::{compute_sha256, BlobStore};
pub use client::{CreateRequest, CreateStatus, ModelClient};
pub use config::BackendConfig;
pub use error::{RemudaError, Result};
pub use image::{encode_image, ImageInput};
pub use modelfile::ModelfileRewriter;
pub use paths::resolve_path;
pub use transport::{HttpBackend, Presence, ReqwestBackend};
