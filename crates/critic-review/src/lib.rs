//! Pull request review pipeline.
//!
//! Fetches the changed files of a pull request from GitHub, filters them,
//! reviews them in concurrent batches through an OpenAI-compatible
//! completion API, and posts one summary comment back on the pull request.

pub mod filter;
pub mod generator;
pub mod github;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod retry;
pub mod summary;
