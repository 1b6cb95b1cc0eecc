//! LLM Integration Module
//!
//! Runs prompts through the Claude CLI. Used only by the external
//! categorizer; everything else in the crate works without it.
//!
//! ```rust
//! use deckscope_core::LlmConfig;
//!
//! let config = LlmConfig::default();
//! assert!(!config.enabled);
//! assert_eq!(config.batch_size, 20);
//! ```

use std::io::Write as IoWrite;
use std::path::Path;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::error::{DeckscopeError, Result};

pub const DEFAULT_BATCH_SIZE: usize = 20;

// ============================================================================
// Configuration
// ============================================================================

/// `[llm]` section of `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Run external categorization after import (default: false)
    #[serde(default)]
    pub enabled: bool,

    /// Cards per prompt
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

// ============================================================================
// CLI Operations
// ============================================================================

/// `claude --version` succeeds
pub fn check_claude_cli() -> bool {
    Command::new("claude")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Send `prompt` on stdin to `claude --print` and return stdout
pub fn execute_claude(working_dir: &Path, prompt: &str) -> Result<String> {
    let mut cmd = Command::new("claude");
    cmd.arg("--print");
    cmd.current_dir(working_dir);
    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .map_err(|e| DeckscopeError::ClaudeExecutionFailed {
            message: format!("Failed to spawn claude: {}", e),
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(prompt.as_bytes())
            .map_err(|e| DeckscopeError::ClaudeExecutionFailed {
                message: format!("Failed to write prompt: {}", e),
            })?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| DeckscopeError::ClaudeExecutionFailed {
            message: format!("Execution failed: {}", e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DeckscopeError::ClaudeExecutionFailed {
            message: format!("Claude exited with error: {}", stderr),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Error unless the Claude CLI is installed
pub fn require_claude_cli() -> Result<()> {
    if !check_claude_cli() {
        return Err(DeckscopeError::ClaudeNotFound);
    }
    Ok(())
}

/// Pull the JSON payload out of model output (fenced or bare)
pub fn extract_json_from_output(output: &str) -> &str {
    if let Some(start) = output.find("```json") {
        let start = start + 7;
        if let Some(end) = output[start..].find("```") {
            return output[start..start + end].trim();
        }
    }
    if let Some(start) = output.find("```") {
        let start = start + 3;
        if let Some(end) = output[start..].find("```") {
            return output[start..start + end].trim();
        }
    }
    if let Some(start) = output.find('{') {
        if let Some(end) = output.rfind('}') {
            if end > start {
                return &output[start..=end];
            }
        }
    }
    output.trim()
}

// ============================================================================
// Tests
// ============================================================================
