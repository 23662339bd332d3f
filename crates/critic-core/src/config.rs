use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CriticError;

/// Top-level configuration loaded from `.critic.toml`.
///
/// Supports layered resolution: CLI flags > local config > defaults.
/// Secrets never live here; see [`Credentials`].
///
/// # Examples
///
/// ```
/// use critic_core::CriticConfig;
///
/// let config = CriticConfig::default();
/// assert_eq!(config.review.batch_size, 5);
/// assert_eq!(config.llm.model, "gpt-4");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CriticConfig {
    /// Completion provider settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,
    /// File selection and batching settings.
    #[serde(default)]
    pub review: ReviewSettings,
}

impl CriticConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::FileNotFound`] if `path` does not exist,
    /// [`CriticError::Io`] if the file cannot be read,
    /// [`CriticError::Toml`] if the content is not valid TOML, or
    /// [`CriticError::Config`] if the settings violate an invariant.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use critic_core::CriticConfig;
    /// use std::path::Path;
    ///
    /// let config = CriticConfig::from_file(Path::new(".critic.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, CriticError> {
        if !path.exists() {
            return Err(CriticError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Toml`] if parsing fails, or
    /// [`CriticError::Config`] if validation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use critic_core::CriticConfig;
    ///
    /// let toml = r#"
    /// [review]
    /// batch_size = 2
    /// "#;
    /// let config = CriticConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.review.batch_size, 2);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, CriticError> {
        let config: Self = toml::from_str(content)?;
        config.review.validate()?;
        Ok(config)
    }
}

/// Completion provider configuration.
///
/// # Examples
///
/// ```
/// use critic_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.timeout_secs, 30);
/// assert_eq!(config.max_attempts, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Custom base URL for an OpenAI-compatible API.
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total attempts per file, including the first call.
    #[serde(default = "default_llm_attempts")]
    pub max_attempts: u32,
    /// Upper bound in seconds on time spent retrying one file.
    #[serde(default = "default_retry_budget_secs")]
    pub retry_budget_secs: u64,
}

fn default_model() -> String {
    "gpt-4".into()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_llm_attempts() -> u32 {
    3
}

fn default_retry_budget_secs() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
            max_attempts: default_llm_attempts(),
            retry_budget_secs: default_retry_budget_secs(),
        }
    }
}

/// GitHub API configuration.
///
/// # Examples
///
/// ```
/// use critic_core::GitHubConfig;
///
/// let config = GitHubConfig::default();
/// assert_eq!(config.api_url, "https://api.github.com");
/// assert_eq!(config.per_page, 100);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API root, overridable for GitHub Enterprise.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Page size used when listing pull request files, capped at 100.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Total attempts for each listing page and file download.
    #[serde(default = "default_github_attempts")]
    pub max_attempts: u32,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.github.com".into()
}

fn default_per_page() -> u32 {
    100
}

fn default_github_attempts() -> u32 {
    3
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            per_page: default_per_page(),
            max_attempts: default_github_attempts(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Which files get reviewed, and how many at once.
///
/// Constructed once at startup and passed by reference to the filter and
/// the orchestrator.
///
/// # Examples
///
/// ```
/// use critic_core::ReviewSettings;
///
/// let settings = ReviewSettings::default();
/// assert_eq!(settings.max_file_size_bytes, 500 * 1024);
/// assert!(settings.excluded_patterns.contains(&"*.log".to_string()));
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSettings {
    /// Review categories the model is asked to pay attention to.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    /// Files of this size or larger are skipped.
    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: usize,
    /// Glob patterns for files that are never reviewed.
    #[serde(default = "default_excluded_patterns")]
    pub excluded_patterns: Vec<String>,
    /// Number of files reviewed concurrently.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_categories() -> Vec<String> {
    ["security", "performance", "style", "conventions"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_file_size_bytes() -> usize {
    500 * 1024
}

fn default_excluded_patterns() -> Vec<String> {
    ["*.pyc", "*.env", "__pycache__/*", "*.log"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_batch_size() -> usize {
    5
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            max_file_size_bytes: default_max_file_size_bytes(),
            excluded_patterns: default_excluded_patterns(),
            batch_size: default_batch_size(),
        }
    }
}

impl ReviewSettings {
    /// Check the invariants the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Config`] if `batch_size` is zero or an excluded
    /// pattern is not a valid glob.
    ///
    /// # Examples
    ///
    /// ```
    /// use critic_core::ReviewSettings;
    ///
    /// let settings = ReviewSettings { batch_size: 0, ..ReviewSettings::default() };
    /// assert!(settings.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), CriticError> {
        if self.batch_size == 0 {
            return Err(CriticError::Config(
                "review.batch_size must be at least 1".into(),
            ));
        }
        for pattern in &self.excluded_patterns {
            glob::Pattern::new(pattern).map_err(|e| {
                CriticError::Config(format!("invalid excluded pattern '{pattern}': {e}"))
            })?;
        }
        Ok(())
    }
}

/// Secrets and repository identity taken from the environment.
///
/// `Debug` masks both tokens.
#[derive(Clone)]
pub struct Credentials {
    /// Repository in `owner/name` form.
    pub github_repo: String,
    /// GitHub access token.
    pub github_token: String,
    /// Completion provider API key.
    pub openai_api_key: String,
}

impl Credentials {
    /// Read credentials from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Config`] naming every missing variable.
    pub fn from_env() -> Result<Self, CriticError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary variable lookup.
    ///
    /// The token is taken from `GIT_TOKEN`, falling back to `GITHUB_TOKEN`.
    /// Empty values count as missing.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Config`] naming every missing variable.
    ///
    /// # Examples
    ///
    /// ```
    /// use critic_core::Credentials;
    ///
    /// let creds = Credentials::from_lookup(|key| match key {
    ///     "GITHUB_REPOSITORY" => Some("octocat/hello-world".into()),
    ///     "GITHUB_TOKEN" => Some("ghp_example".into()),
    ///     "OPENAI_API_KEY" => Some("sk-example".into()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(creds.github_token, "ghp_example");
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CriticError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let github_repo = get("GITHUB_REPOSITORY");
        let github_token = get("GIT_TOKEN").or_else(|| get("GITHUB_TOKEN"));
        let openai_api_key = get("OPENAI_API_KEY");

        let mut missing = Vec::new();
        if github_token.is_none() {
            missing.push("GIT_TOKEN (or GITHUB_TOKEN)");
        }
        if openai_api_key.is_none() {
            missing.push("OPENAI_API_KEY");
        }
        if github_repo.is_none() {
            missing.push("GITHUB_REPOSITORY");
        }

        match (github_repo, github_token, openai_api_key) {
            (Some(github_repo), Some(github_token), Some(openai_api_key)) => Ok(Self {
                github_repo,
                github_token,
                openai_api_key,
            }),
            _ => Err(CriticError::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            ))),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("github_repo", &self.github_repo)
            .field("github_token", &mask_secret(&self.github_token))
            .field("openai_api_key", &mask_secret(&self.openai_api_key))
            .finish()
    }
}

/// Mask a secret for logging, keeping the first and last four characters.
///
/// # Examples
///
/// ```
/// use critic_core::mask_secret;
///
/// assert_eq!(mask_secret("ghp_1234567890abcd"), "ghp_...abcd");
/// assert_eq!(mask_secret("short"), "****");
/// ```
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".into();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Split an `owner/name` repository identifier.
///
/// # Errors
///
/// Returns [`CriticError::Config`] if the identifier is not exactly two
/// non-empty segments.
///
/// # Examples
///
/// ```
/// use critic_core::parse_repository;
///
/// let (owner, repo) = parse_repository("rust-lang/rust").unwrap();
/// assert_eq!(owner, "rust-lang");
/// assert_eq!(repo, "rust");
/// assert!(parse_repository("rust").is_err());
/// ```
pub fn parse_repository(full_name: &str) -> Result<(String, String), CriticError> {
    let invalid = || {
        CriticError::Config(format!(
            "invalid repository '{full_name}', expected owner/name"
        ))
    };
    let (owner, repo) = full_name.trim().split_once('/').ok_or_else(invalid)?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(invalid());
    }
    Ok((owner.to_string(), repo.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let owned: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| {
            owned
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = CriticConfig::default();
        assert_eq!(config.review.batch_size, 5);
        assert_eq!(config.review.max_file_size_bytes, 512_000);
        assert_eq!(
            config.review.categories,
            vec!["security", "performance", "style", "conventions"]
        );
        assert_eq!(
            config.review.excluded_patterns,
            vec!["*.pyc", "*.env", "__pycache__/*", "*.log"]
        );
        assert_eq!(config.llm.model, "gpt-4");
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.llm.retry_budget_secs, 30);
        assert_eq!(config.github.max_attempts, 3);
        assert!(config.llm.base_url.is_none());
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = CriticConfig::from_toml("").unwrap();
        assert_eq!(config.review, ReviewSettings::default());
        assert_eq!(config.github.api_url, "https://api.github.com");
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[llm]
model = "gpt-4o-mini"
base_url = "http://localhost:11434"
timeout_secs = 60

[github]
api_url = "https://github.example.com/api/v3"
per_page = 50

[review]
categories = ["security"]
max_file_size_bytes = 1024
excluded_patterns = ["*.lock", "vendor/*"]
batch_size = 2
"#;
        let config = CriticConfig::from_toml(toml).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.base_url.as_deref(), Some("http://localhost:11434"));
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.llm.max_attempts, 3);
        assert_eq!(config.github.per_page, 50);
        assert_eq!(config.review.categories, vec!["security"]);
        assert_eq!(config.review.max_file_size_bytes, 1024);
        assert_eq!(config.review.excluded_patterns, vec!["*.lock", "vendor/*"]);
        assert_eq!(config.review.batch_size, 2);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let result = CriticConfig::from_toml("[review]\nbatch_size = 0\n");
        assert!(matches!(result, Err(CriticError::Config(_))));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let settings = ReviewSettings {
            excluded_patterns: vec!["[unclosed".into()],
            ..ReviewSettings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("[unclosed"));
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = CriticConfig::from_toml("{{invalid}}");
        assert!(matches!(result, Err(CriticError::Toml(_))));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".critic.toml");
        std::fs::write(&path, "[llm]\nmodel = \"gpt-4o\"\n").unwrap();
        let config = CriticConfig::from_file(&path).unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
    }

    #[test]
    fn from_file_missing_path_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let result = CriticConfig::from_file(&path);
        assert!(matches!(result, Err(CriticError::FileNotFound(p)) if p == path));
    }

    #[test]
    fn credentials_prefer_git_token() {
        let creds = Credentials::from_lookup(env(&[
            ("GITHUB_REPOSITORY", "o/r"),
            ("GIT_TOKEN", "from-git-token"),
            ("GITHUB_TOKEN", "from-github-token"),
            ("OPENAI_API_KEY", "sk"),
        ]))
        .unwrap();
        assert_eq!(creds.github_token, "from-git-token");
        assert_eq!(creds.github_repo, "o/r");
    }

    #[test]
    fn credentials_report_every_missing_variable() {
        let err = Credentials::from_lookup(env(&[("GITHUB_REPOSITORY", "o/r")])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("GIT_TOKEN"));
        assert!(message.contains("OPENAI_API_KEY"));
        assert!(!message.contains("GITHUB_REPOSITORY"));
    }

    #[test]
    fn blank_variables_count_as_missing() {
        let err = Credentials::from_lookup(env(&[
            ("GITHUB_REPOSITORY", "o/r"),
            ("GIT_TOKEN", "t"),
            ("OPENAI_API_KEY", "   "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn credentials_debug_masks_tokens() {
        let creds = Credentials {
            github_repo: "o/r".into(),
            github_token: "ghp_secretsecretsecret".into(),
            openai_api_key: "sk-abcdefghijklmnop".into(),
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("secretsecret"));
        assert!(debug.contains("ghp_...cret"));
    }

    #[test]
    fn repository_rejects_extra_segments() {
        assert!(parse_repository("a/b/c").is_err());
        assert!(parse_repository("/b").is_err());
        assert!(parse_repository("a/").is_err());
    }
}
