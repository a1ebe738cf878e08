//! Compute Engine client for GPU Finder
//!
//! This crate implements the ComputeApi trait against the Compute Engine v1
//! REST API.
//!
//! # Requirements
//!
//! - An OAuth access token, either in `GOOGLE_OAUTH_ACCESS_TOKEN` or obtained
//!   through an authenticated `gcloud` CLI
//!
//! # Example
//!
//! ```ignore
//! use gpufinder_cloud::{ComputeApi, collect_pages};
//! use gpufinder_cloud_gcp::{GceClient, resolve_access_token};
//!
//! let token = resolve_access_token(None).await?;
//! let client = GceClient::new(token);
//!
//! let zones = collect_pages(|t| async move {
//!     client.list_zones("my-project", t.as_deref()).await
//! })
//! .await?;
//! ```

pub mod client;
pub mod error;
pub mod gcloud;

pub use client::{COMPUTE_API_BASE, GceClient, parse_error};
pub use error::{GcpError, Result};
pub use gcloud::{ACCESS_TOKEN_ENV, Gcloud, resolve_access_token};
