use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use critic_core::{CriticConfig, Credentials};
use critic_review::generator::ReviewGenerator;
use critic_review::github::GitHubClient;
use critic_review::llm::LlmClient;
use critic_review::pipeline::{ProcessResult, ReviewManager};

const DEFAULT_CONFIG: &str = ".critic.toml";

#[derive(Parser)]
#[command(
    name = "critic",
    version,
    about = "Review a GitHub pull request with an LLM and post the summary",
    long_about = "Fetches the changed files of a pull request, reviews each eligible file with a\n\
                  chat-completion model, and posts one summary comment on the pull request.\n\n\
                  Requires GITHUB_REPOSITORY, GIT_TOKEN (or GITHUB_TOKEN) and OPENAI_API_KEY.\n\
                  A .env file in the working directory is loaded if present.\n\n\
                  Examples:\n  \
                    critic 42                          Review PR #42 of $GITHUB_REPOSITORY\n  \
                    critic 42 --repo octo/hello        Review PR #42 of octo/hello\n  \
                    critic 42 --format json            Print the result as JSON"
)]
struct Cli {
    /// Pull request number to review
    pr_number: u64,

    /// Path to configuration file (default: .critic.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Repository in owner/name form (overrides GITHUB_REPOSITORY)
    #[arg(long)]
    repo: Option<String>,

    /// Completion model to use
    #[arg(long)]
    model: Option<String>,

    /// Number of files reviewed concurrently
    #[arg(long)]
    batch_size: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "critic=debug,critic_review=debug,critic_core=debug"
    } else {
        "critic=info,critic_review=info,critic_core=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<CriticConfig> {
    let mut config = match &cli.config {
        Some(path) => CriticConfig::from_file(path)?,
        None => {
            let default_path = std::path::Path::new(DEFAULT_CONFIG);
            if default_path.exists() {
                CriticConfig::from_file(default_path)?
            } else {
                CriticConfig::default()
            }
        }
    };

    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }
    if let Some(batch_size) = cli.batch_size {
        config.review.batch_size = batch_size;
    }
    config.review.validate()?;
    Ok(config)
}

fn credentials(cli: &Cli) -> Result<Credentials> {
    let creds = Credentials::from_lookup(|key| match (key, &cli.repo) {
        ("GITHUB_REPOSITORY", Some(repo)) => Some(repo.clone()),
        _ => std::env::var(key).ok(),
    })?;
    Ok(creds)
}

fn print_result(result: &ProcessResult, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let json = serde_json::to_string_pretty(result).into_diagnostic()?;
            println!("{json}");
        }
        Format::Text => match result {
            ProcessResult::Success {
                reviews,
                failed_files,
                ..
            } => {
                println!("{result}");
                for review in reviews {
                    println!("  reviewed  {} ({} tokens)", review.filename, review.tokens_used);
                }
                for failed in failed_files {
                    println!("  failed    {}: {}", failed.filename, failed.error);
                }
            }
            ProcessResult::NoFiles { .. } => println!("{result}"),
            ProcessResult::Error { .. } => eprintln!("{result}"),
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let creds = credentials(&cli)?;
    tracing::debug!(?creds, model = %config.llm.model, "configuration loaded");

    let github = GitHubClient::new(&creds.github_token, &creds.github_repo, &config.github)?;
    let llm = LlmClient::new(&config.llm, creds.openai_api_key.clone())?;
    let generator =
        ReviewGenerator::from_config(llm, config.review.categories.clone(), &config.llm);
    let manager = ReviewManager::new(&github, generator, &github, &config.review)?;

    tracing::info!(
        "reviewing PR #{} in {} with {}",
        cli.pr_number,
        github.full_name(),
        config.llm.model
    );
    let result = manager.process(cli.pr_number).await;
    print_result(&result, cli.format)?;

    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
