//! Remote JSON document store client for turnario.
//!
//! This crate provides the persistence plumbing for the scheduling app:
//!
//! - **Client**: get/put of named JSON documents against a content-addressed
//!   remote store, with optimistic concurrency via opaque version tokens
//! - **Retry**: bounded retries with exponential backoff and transient/terminal
//!   error classification
//! - **Backup**: a best-effort local mirror of last-known-good documents,
//!   used only as a read fallback in degraded mode

pub mod backup;
mod client;
mod error;
mod retry;
mod types;

pub use backup::BackupCache;
pub use client::RemoteStore;
pub use error::StoreError;
pub use retry::RetryPolicy;
pub use types::{FetchedDocument, VersionToken};
