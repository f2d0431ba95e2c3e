//! Remote forge access: pull request metadata and release notes.
pub mod cache;
pub mod config;
pub mod github;
pub mod manager;
pub mod request;
pub mod retry;
pub mod traits;
