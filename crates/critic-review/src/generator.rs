use std::time::Duration;

use async_trait::async_trait;
use critic_core::{ChangedFile, CriticError, FileReview, LlmConfig};

use crate::llm::{ChatMessage, LlmClient};
use crate::pipeline::Reviewer;
use crate::prompt;
use crate::retry::{retry, RetryPolicy};

/// Produces one [`FileReview`] per file through the completion API.
///
/// The whole prompt-and-parse round trip is retried on transient and model
/// errors; authentication and parse failures are returned at once.
pub struct ReviewGenerator {
    llm: LlmClient,
    categories: Vec<String>,
    policy: RetryPolicy,
}

impl ReviewGenerator {
    /// Create a generator with the default completion retry policy.
    pub fn new(llm: LlmClient, categories: Vec<String>) -> Self {
        Self {
            llm,
            categories,
            policy: RetryPolicy::completion(),
        }
    }

    /// Create a generator whose retry policy follows `config`.
    pub fn from_config(llm: LlmClient, categories: Vec<String>, config: &LlmConfig) -> Self {
        let policy = RetryPolicy {
            max_attempts: config.max_attempts,
            max_elapsed: Some(Duration::from_secs(config.retry_budget_secs)),
            ..RetryPolicy::completion()
        };
        Self::new(llm, categories).with_retry_policy(policy)
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn request_review(&self, file: &ChangedFile) -> Result<FileReview, CriticError> {
        let messages = vec![
            ChatMessage::system(prompt::build_system_prompt()),
            ChatMessage::user(prompt::build_review_prompt(file, &self.categories)),
        ];
        let completion = self.llm.complete(messages).await?;
        Ok(FileReview {
            filename: file.filename.clone(),
            review_text: completion.content,
            model_identifier: self.llm.model().to_string(),
            tokens_used: completion.total_tokens,
        })
    }
}

#[async_trait]
impl Reviewer for ReviewGenerator {
    async fn generate_review(&self, file: &ChangedFile) -> Result<FileReview, CriticError> {
        let label = format!("review {}", file.filename);
        let result = retry(&self.policy, &label, CriticError::is_retryable, || {
            self.request_review(file)
        })
        .await;

        match result {
            Ok(review) => {
                tracing::debug!(
                    file = %file.filename,
                    tokens = review.tokens_used,
                    "review generated"
                );
                Ok(review)
            }
            Err(failure) if failure.error.is_retryable() => Err(CriticError::Model(format!(
                "review of {} failed after {} attempt(s): {}",
                file.filename, failure.attempts, failure.error
            ))),
            Err(failure) => Err(failure.error),
        }
    }
}
