//! Command implementations.

use anyhow::Context;
use camino::Utf8Path;
use slopwatch_core::transcript::{self, ChatMessage};

pub mod analyze;
pub mod info;
#[cfg(feature = "mcp")]
pub mod serve;
pub mod watch;

/// Read a file and validate its size against the configured limit.
pub fn read_input_file(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<String> {
    // Preflight: check file size via metadata before reading into memory.
    let metadata =
        std::fs::metadata(path.as_std_path()).with_context(|| format!("failed to read {path}"))?;
    if let Some(max) = max_bytes {
        let size = metadata.len() as usize;
        if size > max {
            anyhow::bail!("input too large: {path} is {size} bytes (limit: {max} bytes)");
        }
    }

    let content = std::fs::read_to_string(path.as_std_path())
        .with_context(|| format!("failed to read {path}"))?;
    Ok(content)
}

/// Read and parse a transcript file.
pub fn read_transcript(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<Vec<ChatMessage>> {
    let content = read_input_file(path, max_bytes)?;
    transcript::parse(&content).with_context(|| format!("failed to parse transcript {path}"))
}
