use std::fmt;

use serde::{Deserialize, Serialize};

/// A file changed by a pull request, with its full post-change content.
///
/// # Examples
///
/// ```
/// use critic_core::{ChangedFile, FileStatus};
///
/// let file = ChangedFile {
///     filename: "src/lib.rs".into(),
///     content: "pub fn answer() -> u32 { 42 }\n".into(),
///     status: FileStatus::Modified,
///     additions: 1,
///     deletions: 0,
/// };
/// assert_eq!(file.size_bytes(), 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedFile {
    /// Path of the file relative to the repository root.
    pub filename: String,
    /// Raw text content at the head of the pull request.
    pub content: String,
    /// How the pull request changed the file.
    pub status: FileStatus,
    /// Lines added.
    pub additions: u64,
    /// Lines deleted.
    pub deletions: u64,
}

impl ChangedFile {
    /// Size of the content in bytes (UTF-8 encoded).
    pub fn size_bytes(&self) -> usize {
        self.content.len()
    }
}

/// Change classification reported by the version-control host.
///
/// GitHub also reports `copied`, `changed` and `unchanged`; those carry
/// reviewable content and are read as [`FileStatus::Modified`].
///
/// # Examples
///
/// ```
/// use critic_core::FileStatus;
///
/// let status: FileStatus = serde_json::from_str("\"copied\"").unwrap();
/// assert_eq!(status, FileStatus::Modified);
/// assert_eq!(FileStatus::Removed.to_string(), "removed");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// New file.
    Added,
    /// Existing file edited in place.
    #[serde(alias = "copied", alias = "changed", alias = "unchanged")]
    Modified,
    /// File deleted by the pull request.
    Removed,
    /// File moved, possibly with edits.
    Renamed,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Modified => write!(f, "modified"),
            Self::Removed => write!(f, "removed"),
            Self::Renamed => write!(f, "renamed"),
        }
    }
}

/// Review of a single file produced by the completion model.
///
/// # Examples
///
/// ```
/// use critic_core::FileReview;
///
/// let review = FileReview {
///     filename: "src/main.rs".into(),
///     review_text: "Consider handling the error from `parse`.".into(),
///     model_identifier: "gpt-4".into(),
///     tokens_used: 321,
/// };
/// assert_eq!(review.tokens_used, 321);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReview {
    /// File the review is about.
    pub filename: String,
    /// Free-form review text returned by the model.
    pub review_text: String,
    /// Model that produced the review.
    pub model_identifier: String,
    /// Total tokens billed for the completion.
    pub tokens_used: u64,
}

/// Confirmation of a comment posted on a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedComment {
    /// Identifier assigned by the host.
    pub comment_id: String,
    /// Browser URL of the comment.
    pub url: String,
}
