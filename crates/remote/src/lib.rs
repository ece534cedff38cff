//! Remote collaborators of the validator.
//!
//! This crate provides:
//! - Fetching the three record streams from JSON URLs
//! - Uploading a run directory to a content store, plus delete and list
//! - Public link helpers for uploaded runs

pub mod client;
pub mod fetch;
pub mod github;
pub mod store;

pub use client::build_client;
pub use fetch::{decode_records, fetch_streams, HttpRecordSource, RecordSource};
pub use github::GitHubStore;
pub use store::{collect_files, new_run_id, ArtifactStore, UploadReceipt};
