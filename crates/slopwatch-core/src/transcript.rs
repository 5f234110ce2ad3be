//! Chat transcript parsing.
//!
//! Three layouts are accepted:
//!
//! - JSONL chat exports, one object per line with a `mes` field and optional
//!   `name`, `is_user` and `is_system`. Lines without `mes` (such as a chat
//!   header) are skipped.
//! - A JSON array of such objects, or of plain strings.
//! - Plain text, where a line consisting of `---` separates messages.

use serde::Deserialize;

use crate::error::{TranscriptError, TranscriptResult};

/// One message of a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Speaker name, when the transcript records one.
    pub name: Option<String>,
    /// Raw message body, markup included.
    pub text: String,
    /// Written by the user.
    pub is_user: bool,
    /// A system or narrator message.
    pub is_system: bool,
}

impl ChatMessage {
    /// A generated message with no speaker metadata.
    pub fn generated(text: impl Into<String>) -> Self {
        Self {
            name: None,
            text: text.into(),
            is_user: false,
            is_system: false,
        }
    }

    /// Whether the message was produced by the model.
    pub const fn is_generated(&self) -> bool {
        !self.is_user && !self.is_system
    }
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    mes: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    is_user: bool,
    #[serde(default)]
    is_system: bool,
}

impl RawMessage {
    fn into_message(self) -> Option<ChatMessage> {
        let text = self.mes?;
        Some(ChatMessage {
            name: self.name,
            text,
            is_user: self.is_user,
            is_system: self.is_system,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ArrayEntry {
    Text(String),
    Message(RawMessage),
}

/// Parse a transcript, detecting its layout from the first non-blank character.
#[tracing::instrument(skip_all, fields(content_len = content.len()))]
pub fn parse(content: &str) -> TranscriptResult<Vec<ChatMessage>> {
    let trimmed = content.trim_start();
    let messages = if trimmed.starts_with('[') {
        parse_array(trimmed)?
    } else if trimmed.starts_with('{') {
        parse_jsonl(content)?
    } else {
        parse_plain(content)
    };
    tracing::debug!(messages = messages.len(), "transcript parsed");
    Ok(messages)
}

fn parse_array(content: &str) -> TranscriptResult<Vec<ChatMessage>> {
    let entries: Vec<ArrayEntry> = serde_json::from_str(content)?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| match entry {
            ArrayEntry::Text(text) => Some(ChatMessage::generated(text)),
            ArrayEntry::Message(raw) => raw.into_message(),
        })
        .collect())
}

fn parse_jsonl(content: &str) -> TranscriptResult<Vec<ChatMessage>> {
    let mut messages = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let raw: RawMessage = serde_json::from_str(line)
            .map_err(|source| TranscriptError::Line { line: i + 1, source })?;
        messages.extend(raw.into_message());
    }
    Ok(messages)
}

fn parse_plain(content: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in content.lines() {
        if line.trim() == "---" {
            flush(&mut messages, &mut current);
        } else {
            current.push(line);
        }
    }
    flush(&mut messages, &mut current);
    messages
}

fn flush(messages: &mut Vec<ChatMessage>, lines: &mut Vec<&str>) {
    let text = lines.join("\n");
    lines.clear();
    if !text.trim().is_empty() {
        messages.push(ChatMessage::generated(text.trim()));
    }
}
