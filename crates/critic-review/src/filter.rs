//! Pre-review file filtering.
//!
//! Drops removed files, files matching an excluded glob, and files whose
//! content is too large to send to the model.

use std::fmt;

use critic_core::{ChangedFile, CriticError, FileStatus, ReviewSettings};

/// Decides which changed files are eligible for review.
///
/// # Examples
///
/// ```
/// use critic_core::{ChangedFile, FileStatus, ReviewSettings};
/// use critic_review::filter::FileFilter;
///
/// let filter = FileFilter::from_settings(&ReviewSettings::default()).unwrap();
/// let file = ChangedFile {
///     filename: "logs/server.log".into(),
///     content: "started".into(),
///     status: FileStatus::Added,
///     additions: 1,
///     deletions: 0,
/// };
/// assert!(!filter.is_eligible(&file));
/// ```
#[derive(Debug, Clone)]
pub struct FileFilter {
    excluded_patterns: Vec<glob::Pattern>,
    max_file_size_bytes: usize,
}

impl FileFilter {
    /// Compile the filter from review settings.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Config`] if an excluded pattern is not a valid glob.
    pub fn from_settings(settings: &ReviewSettings) -> Result<Self, CriticError> {
        let excluded_patterns = settings
            .excluded_patterns
            .iter()
            .map(|pat| {
                glob::Pattern::new(pat).map_err(|e| {
                    CriticError::Config(format!("invalid excluded pattern '{pat}': {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            excluded_patterns,
            max_file_size_bytes: settings.max_file_size_bytes,
        })
    }

    /// Whether `file` should be sent for review.
    pub fn is_eligible(&self, file: &ChangedFile) -> bool {
        self.check_skip(file).is_none()
    }

    /// Split files into reviewable and skipped, preserving input order.
    ///
    /// # Examples
    ///
    /// ```
    /// use critic_core::{ChangedFile, FileStatus, ReviewSettings};
    /// use critic_review::filter::FileFilter;
    ///
    /// let file = |name: &str| ChangedFile {
    ///     filename: name.into(),
    ///     content: "x".into(),
    ///     status: FileStatus::Modified,
    ///     additions: 1,
    ///     deletions: 1,
    /// };
    /// let filter = FileFilter::from_settings(&ReviewSettings::default()).unwrap();
    /// let result = filter.filter(vec![file("src/app.py"), file("src/app.pyc")]);
    /// assert_eq!(result.kept.len(), 1);
    /// assert_eq!(result.skipped[0].filename, "src/app.pyc");
    /// ```
    pub fn filter(&self, files: Vec<ChangedFile>) -> FilterResult {
        let mut kept = Vec::new();
        let mut skipped = Vec::new();

        for file in files {
            match self.check_skip(&file) {
                Some(reason) => skipped.push(SkippedFile {
                    filename: file.filename,
                    reason,
                }),
                None => kept.push(file),
            }
        }

        FilterResult { kept, skipped }
    }

    fn check_skip(&self, file: &ChangedFile) -> Option<SkipReason> {
        if file.status == FileStatus::Removed {
            return Some(SkipReason::Removed);
        }

        if let Some(pat) = self
            .excluded_patterns
            .iter()
            .find(|pat| pat.matches(&file.filename))
        {
            return Some(SkipReason::ExcludedPattern(pat.to_string()));
        }

        let bytes = file.size_bytes();
        if bytes >= self.max_file_size_bytes {
            return Some(SkipReason::TooLarge {
                bytes,
                limit: self.max_file_size_bytes,
            });
        }

        None
    }
}

/// Pure eligibility check straight from settings.
///
/// Patterns that fail to compile never match; use
/// [`ReviewSettings::validate`] to reject them up front.
///
/// # Examples
///
/// ```
/// use critic_core::{ChangedFile, FileStatus, ReviewSettings};
/// use critic_review::filter::is_eligible;
///
/// let settings = ReviewSettings { max_file_size_bytes: 4, ..ReviewSettings::default() };
/// let file = ChangedFile {
///     filename: "main.rs".into(),
///     content: "fn main() {}".into(),
///     status: FileStatus::Added,
///     additions: 1,
///     deletions: 0,
/// };
/// assert!(!is_eligible(&file, &settings));
/// ```
pub fn is_eligible(file: &ChangedFile, settings: &ReviewSettings) -> bool {
    let excluded = settings.excluded_patterns.iter().any(|pat| {
        glob::Pattern::new(pat)
            .map(|p| p.matches(&file.filename))
            .unwrap_or(false)
    });
    file.status != FileStatus::Removed
        && !excluded
        && file.size_bytes() < settings.max_file_size_bytes
}

/// Result of filtering a set of changed files.
#[derive(Debug)]
pub struct FilterResult {
    /// Files that passed every check.
    pub kept: Vec<ChangedFile>,
    /// Files that were dropped and why.
    pub skipped: Vec<SkippedFile>,
}

/// A file excluded from review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// Path of the skipped file.
    pub filename: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Why a file was excluded from review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The pull request deletes the file.
    Removed,
    /// Matched this excluded glob.
    ExcludedPattern(String),
    /// Content is at or above the size limit.
    TooLarge {
        /// Content size.
        bytes: usize,
        /// Configured limit.
        limit: usize,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Removed => write!(f, "removed"),
            Self::ExcludedPattern(pat) => write!(f, "matches excluded pattern {pat}"),
            Self::TooLarge { bytes, limit } => {
                write!(f, "too large ({bytes} bytes, limit {limit})")
            }
        }
    }
}
