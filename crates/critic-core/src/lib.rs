//! Core types, configuration, and error handling for critic.
//!
//! This crate provides the shared foundation used by the review pipeline and
//! the CLI:
//! - [`CriticError`]: unified error type using `thiserror`
//! - [`CriticConfig`]: configuration loaded from `.critic.toml`
//! - [`Credentials`]: repository and tokens read from the environment
//! - Shared types: [`ChangedFile`], [`FileStatus`], [`FileReview`], [`PublishedComment`]

mod config;
mod error;
mod types;

pub use config::{
    mask_secret, parse_repository, CriticConfig, Credentials, GitHubConfig, LlmConfig,
    ReviewSettings,
};
pub use error::CriticError;
pub use types::{ChangedFile, FileReview, FileStatus, PublishedComment};

/// A convenience `Result` type for critic operations.
pub type Result<T> = std::result::Result<T, CriticError>;
