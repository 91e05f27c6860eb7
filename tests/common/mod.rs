//! Common test utilities for apichain integration tests
//!
//! A [`TestProject`] is a temporary directory holding a compilation input,
//! an optional `apichain.toml` and the side files they reference.

// Not every test file uses every helper
#![allow(dead_code)]

use anyhow::{Context, Result};
use apichain_cli::grammar::CompilationInput;
use apichain_cli::test_utils::{RequestFixture, compilation_input};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Test project with its own working directory
pub struct TestProject {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    project_dir: PathBuf,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().join("project");
        fs::create_dir_all(&project_dir)?;

        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
        })
    }

    pub fn project_path(&self) -> &Path {
        &self.project_dir
    }

    /// Default diagnostics directory of `apichain resolve`
    pub fn out_path(&self) -> PathBuf {
        self.project_dir.join("apichain-out")
    }

    /// Write `apichain.toml` into the project directory
    pub fn write_config(&self, content: &str) -> Result<()> {
        let config_path = self.project_dir.join("apichain.toml");
        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
        Ok(())
    }

    /// Serialize `value` as JSON into `name` under the project directory
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.project_dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(value)?)?;
        Ok(path)
    }

    /// Write raw text into `name` under the project directory
    pub fn write_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.project_dir.join(name);
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Write the compilation input as `requests.json`
    pub fn write_input(&self, input: &CompilationInput) -> Result<PathBuf> {
        self.write_json("requests.json", input)
    }

    pub fn write_requests(&self, requests: Vec<RequestFixture>) -> Result<PathBuf> {
        self.write_input(&compilation_input(requests))
    }

    /// Parse a diagnostics file written by `apichain resolve`
    pub fn read_output(&self, file: &str) -> Result<serde_json::Value> {
        let path = self.out_path().join(file);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Run an apichain command in the project directory
    pub fn run_apichain(&self, args: &[&str]) -> Result<CommandOutput> {
        let apichain_binary = env!("CARGO_BIN_EXE_apichain");
        let output = Command::new(apichain_binary)
            .args(args)
            .current_dir(&self.project_dir)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .output()
            .context("Failed to run apichain command")?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

/// Command output helper
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success,
            "Command failed with code {:?}\nStderr: {}",
            self.code, self.stderr
        );
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert!(!self.success, "Command unexpectedly succeeded\nStdout: {}", self.stdout);
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Expected stdout to contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Expected stderr to contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}

/// File assertion helpers
pub struct FileAssert;

impl FileAssert {
    pub fn exists(path: impl AsRef<Path>) {
        let path = path.as_ref();
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    pub fn not_exists(path: impl AsRef<Path>) {
        let path = path.as_ref();
        assert!(!path.exists(), "Expected file to not exist: {}", path.display());
    }

    pub fn contains(path: impl AsRef<Path>, expected: &str) {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e));
        assert!(
            content.contains(expected),
            "Expected file {} to contain '{}'\nActual content: {}",
            path.display(),
            expected,
            content
        );
    }
}
