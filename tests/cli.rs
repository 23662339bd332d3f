use std::process::{Command, Output};

const ENV_VARS: &[&str] = &[
    "GITHUB_REPOSITORY",
    "GIT_TOKEN",
    "GITHUB_TOKEN",
    "OPENAI_API_KEY",
    "RUST_LOG",
];

fn critic(dir: &std::path::Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_critic"));
    cmd.args(args).current_dir(dir);
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.output().unwrap()
}

#[test]
fn missing_credentials_exit_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = critic(dir.path(), &["7"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("OPENAI_API_KEY"), "stderr: {stderr}");
    assert!(stderr.contains("GITHUB_REPOSITORY"), "stderr: {stderr}");
}

#[test]
fn repo_flag_satisfies_repository_variable() {
    let dir = tempfile::tempdir().unwrap();
    let output = critic(dir.path(), &["7", "--repo", "octo/hello"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GIT_TOKEN"), "stderr: {stderr}");
    assert!(!stderr.contains("GITHUB_REPOSITORY"), "stderr: {stderr}");
}

#[test]
fn dotenv_file_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".env"), "OPENAI_API_KEY=sk-from-dotenv\n").unwrap();
    let output = critic(dir.path(), &["7"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("OPENAI_API_KEY"), "stderr: {stderr}");
    assert!(stderr.contains("GITHUB_REPOSITORY"), "stderr: {stderr}");
}

#[test]
fn non_numeric_pr_number_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let output = critic(dir.path(), &["not-a-number"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid value"), "stderr: {stderr}");
}

#[test]
fn zero_batch_size_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = critic(dir.path(), &["7", "--batch-size", "0"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("batch_size"), "stderr: {stderr}");
}

#[test]
fn malformed_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".critic.toml"), "[review\nbatch_size = ").unwrap();
    let output = critic(dir.path(), &["7"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("TOML"), "stderr: {stderr}");
}

#[test]
fn explicit_missing_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let output = critic(dir.path(), &["7", "--config", "nowhere.toml"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("file not found"), "stderr: {stderr}");
    assert!(stderr.contains("nowhere.toml"), "stderr: {stderr}");
}
