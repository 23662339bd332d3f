use critic_core::ChangedFile;

const SYSTEM_PROMPT: &str = "You are an expert code reviewer";

/// Build the system prompt for the code review model.
///
/// # Examples
///
/// ```
/// use critic_review::prompt::build_system_prompt;
///
/// assert!(build_system_prompt().contains("code reviewer"));
/// ```
pub fn build_system_prompt() -> String {
    SYSTEM_PROMPT.to_string()
}

/// Build the user prompt asking for a review of one file.
///
/// The prompt always lists the same four focus areas; `categories` is
/// appended as an extra emphasis line when non-empty.
///
/// # Examples
///
/// ```
/// use critic_core::{ChangedFile, FileStatus};
/// use critic_review::prompt::build_review_prompt;
///
/// let file = ChangedFile {
///     filename: "src/auth.rs".into(),
///     content: "fn login() {}".into(),
///     status: FileStatus::Added,
///     additions: 1,
///     deletions: 0,
/// };
/// let prompt = build_review_prompt(&file, &["security".to_string()]);
/// assert!(prompt.contains("src/auth.rs"));
/// assert!(prompt.contains("fn login() {}"));
/// assert!(prompt.contains("Security implications"));
/// ```
pub fn build_review_prompt(file: &ChangedFile, categories: &[String]) -> String {
    let mut prompt = format!(
        "As an expert code reviewer, analyze this {} file:\n\n\
         Focus areas:\n\
         1. Code quality and best practices\n\
         2. Potential bugs and issues\n\
         3. Performance considerations\n\
         4. Security implications\n",
        file.filename
    );

    if !categories.is_empty() {
        prompt.push_str(&format!(
            "\nPay particular attention to: {}\n",
            categories.join(", ")
        ));
    }

    prompt.push_str(&format!(
        "\nFile content:\n```\n{}\n```\n\n\
         Provide specific, actionable feedback with examples where applicable.\n",
        file.content
    ));
    prompt
}
