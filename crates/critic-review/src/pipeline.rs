use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use critic_core::{ChangedFile, CriticError, FileReview, PublishedComment, ReviewSettings};
use futures::future::join_all;
use serde::Serialize;

use crate::filter::{FileFilter, FilterResult};
use crate::summary;

/// Source of the changed files of a pull request.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Fetch every reviewable file of `pr_number`, in listing order.
    async fn fetch_files(&self, pr_number: u64) -> Result<Vec<ChangedFile>, CriticError>;
}

/// Produces a review for a single file.
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Review one file.
    async fn generate_review(&self, file: &ChangedFile) -> Result<FileReview, CriticError>;
}

/// Posts the composed summary on the pull request.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Post `body` as one comment and return its confirmation.
    async fn publish(&self, pr_number: u64, body: &str) -> Result<PublishedComment, CriticError>;
}

#[async_trait]
impl<T: FileSource + ?Sized> FileSource for &T {
    async fn fetch_files(&self, pr_number: u64) -> Result<Vec<ChangedFile>, CriticError> {
        (**self).fetch_files(pr_number).await
    }
}

#[async_trait]
impl<T: Reviewer + ?Sized> Reviewer for &T {
    async fn generate_review(&self, file: &ChangedFile) -> Result<FileReview, CriticError> {
        (**self).generate_review(file).await
    }
}

#[async_trait]
impl<T: Publisher + ?Sized> Publisher for &T {
    async fn publish(&self, pr_number: u64, body: &str) -> Result<PublishedComment, CriticError> {
        (**self).publish(pr_number, body).await
    }
}

/// Outcome of reviewing one pull request.
///
/// Serializes with a `status` tag of `success`, `no_files` or `error`. The
/// error form carries only the message.
///
/// # Examples
///
/// ```
/// use critic_review::pipeline::ProcessResult;
///
/// let result = ProcessResult::NoFiles { message: "No files to review".into() };
/// assert!(!result.is_success());
/// let json = serde_json::to_value(&result).unwrap();
/// assert_eq!(json["status"], "no_files");
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessResult {
    /// The summary was composed and posted.
    Success {
        /// Reviews in original file order.
        reviews: Vec<FileReview>,
        /// The posted Markdown document.
        summary: String,
        /// Confirmation from the host.
        comment: PublishedComment,
        /// Eligible files whose review could not be generated.
        failed_files: Vec<FailedReview>,
        /// When the run finished.
        timestamp: DateTime<Utc>,
    },
    /// Nothing eligible for review; nothing was posted.
    NoFiles {
        /// Human-readable explanation.
        message: String,
    },
    /// The run stopped at some stage.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}

impl ProcessResult {
    /// Whether the review was posted.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The `status` tag value.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::NoFiles { .. } => "no_files",
            Self::Error { .. } => "error",
        }
    }
}

impl fmt::Display for ProcessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success {
                reviews,
                comment,
                failed_files,
                ..
            } => {
                write!(
                    f,
                    "Review posted: {} file(s) reviewed, {} failed",
                    reviews.len(),
                    failed_files.len()
                )?;
                if !comment.url.is_empty() {
                    write!(f, " ({})", comment.url)?;
                }
                Ok(())
            }
            Self::NoFiles { message } => write!(f, "{message}"),
            Self::Error { message } => write!(f, "Review failed: {message}"),
        }
    }
}

/// An eligible file whose review could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedReview {
    /// File that failed.
    pub filename: String,
    /// Final error message.
    pub error: String,
}

/// Split `items` into contiguous batches of at most `batch_size`.
///
/// A `batch_size` of zero is treated as one.
///
/// # Examples
///
/// ```
/// use critic_review::pipeline::batches;
///
/// let files = [1, 2, 3, 4, 5, 6, 7];
/// let split = batches(&files, 5);
/// assert_eq!(split, vec![&[1, 2, 3, 4, 5][..], &[6, 7][..]]);
/// ```
pub fn batches<T>(items: &[T], batch_size: usize) -> Vec<&[T]> {
    items.chunks(batch_size.max(1)).collect()
}

/// Drives one pull request from file listing to posted summary.
///
/// Files are reviewed in sequential batches of `batch_size`; within a batch
/// every review runs concurrently and each file's result is kept on its own,
/// so one failing file never cancels its siblings.
pub struct ReviewManager<'a, S, R, P> {
    source: S,
    reviewer: R,
    publisher: P,
    settings: &'a ReviewSettings,
    filter: FileFilter,
}

struct ReviewOutcome {
    reviews: Vec<FileReview>,
    failed: Vec<FailedReview>,
}

impl<'a, S, R, P> ReviewManager<'a, S, R, P>
where
    S: FileSource,
    R: Reviewer,
    P: Publisher,
{
    /// Create a manager over the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Config`] if `settings` are invalid.
    pub fn new(
        source: S,
        reviewer: R,
        publisher: P,
        settings: &'a ReviewSettings,
    ) -> Result<Self, CriticError> {
        settings.validate()?;
        let filter = FileFilter::from_settings(settings)?;
        Ok(Self {
            source,
            reviewer,
            publisher,
            settings,
            filter,
        })
    }

    /// Review a pull request end to end.
    ///
    /// Never fails: every error is logged and reported as
    /// [`ProcessResult::Error`].
    pub async fn process(&self, pr_number: u64) -> ProcessResult {
        match self.run(pr_number).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("review process for PR #{pr_number} failed: {e}");
                ProcessResult::Error {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn run(&self, pr_number: u64) -> Result<ProcessResult, CriticError> {
        let files = self.source.fetch_files(pr_number).await?;

        let FilterResult { kept, skipped } = self.filter.filter(files);
        for file in &skipped {
            tracing::info!(file = %file.filename, reason = %file.reason, "skipping file");
        }
        if kept.is_empty() {
            tracing::info!("no files to review in PR #{pr_number}");
            return Ok(ProcessResult::NoFiles {
                message: "No files to review".into(),
            });
        }

        let outcome = self.review_files(&kept).await;
        if outcome.reviews.is_empty() {
            let first = outcome
                .failed
                .first()
                .map(|f| f.error.as_str())
                .unwrap_or_default();
            return Err(CriticError::Model(format!(
                "all {} file review(s) failed; first error: {first}",
                outcome.failed.len()
            )));
        }

        let summary = summary::compose(&outcome.reviews);
        let comment = self.publisher.publish(pr_number, &summary).await?;

        Ok(ProcessResult::Success {
            reviews: outcome.reviews,
            summary,
            comment,
            failed_files: outcome.failed,
            timestamp: Utc::now(),
        })
    }

    async fn review_files(&self, files: &[ChangedFile]) -> ReviewOutcome {
        let groups = batches(files, self.settings.batch_size);
        let total = groups.len();
        let mut reviews = Vec::with_capacity(files.len());
        let mut failed = Vec::new();

        for (idx, batch) in groups.into_iter().enumerate() {
            tracing::info!("reviewing batch {}/{total} ({} file(s))", idx + 1, batch.len());
            let results = join_all(
                batch
                    .iter()
                    .map(|file| self.reviewer.generate_review(file)),
            )
            .await;

            for (file, result) in batch.iter().zip(results) {
                match result {
                    Ok(review) => reviews.push(review),
                    Err(e) => {
                        tracing::error!(file = %file.filename, "review generation failed: {e}");
                        failed.push(FailedReview {
                            filename: file.filename.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        ReviewOutcome { reviews, failed }
    }
}
