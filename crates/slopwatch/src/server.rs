//! MCP (Model Context Protocol) server implementation.
//!
//! Exposes repetition detection over the MCP protocol so an assistant can ask
//! which phrases a transcript keeps repeating. The server is a presentation
//! layer: every tool builds a fresh [`SlopEngine`] from the loaded
//! configuration and delegates to `slopwatch-core`.

use std::sync::atomic::AtomicBool;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;

use slopwatch_core::config::Config;
use slopwatch_core::{AnalysisSnapshot, Candidate, SlopEngine, history, transcript};

/// Parameters for the `get_info` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct GetInfoParams {
    /// Output format: "text" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "text".to_string()
}

/// Parameters for the `analyze_transcript` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct AnalyzeTranscriptParams {
    /// Transcript content: JSONL chat export, JSON array, or plain text
    /// with `---` lines between messages.
    pub content: String,
    /// Maximum patterns and phrases to return.
    pub top: Option<usize>,
}

/// Parameters for the `find_slop` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct FindSlopParams {
    /// Generated messages, oldest first.
    pub messages: Vec<String>,
    /// Promotion threshold (overrides `detection.threshold`).
    pub threshold: Option<f64>,
}

#[derive(Serialize)]
struct FindSlopReport {
    observed: usize,
    records: usize,
    candidates: Vec<Candidate>,
    #[serde(flatten)]
    snapshot: AnalysisSnapshot,
}

/// MCP server exposing repetition detection to AI assistants.
#[derive(Clone)]
pub struct SlopServer {
    config: Config,
    max_input: Option<usize>,
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
}

impl Default for SlopServer {
    fn default() -> Self {
        Self::new(Config::default(), Some(slopwatch_core::DEFAULT_MAX_INPUT_BYTES))
    }
}

#[tool_router]
impl SlopServer {
    /// Create a new MCP server instance.
    pub fn new(config: Config, max_input: Option<usize>) -> Self {
        Self {
            config,
            max_input,
            tool_router: Self::tool_router(),
        }
    }

    fn check_size(&self, len: usize) -> Result<(), McpError> {
        match self.max_input {
            Some(max) if len > max => Err(McpError::invalid_params(
                format!("input too large: {len} bytes (limit: {max} bytes)"),
                None,
            )),
            _ => Ok(()),
        }
    }

    fn engine(&self, config: &Config) -> Result<SlopEngine, McpError> {
        SlopEngine::from_config(config).map_err(|e| McpError::invalid_params(e.to_string(), None))
    }

    /// Get project information.
    #[tool(description = "Get project name, version, and description")]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    fn get_info(
        &self,
        Parameters(params): Parameters<GetInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_info", format = %params.format, "executing MCP tool");

        let info = serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "threshold": self.config.detection.threshold,
        });

        let text = if params.format == "json" {
            serde_json::to_string_pretty(&info)
                .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?
        } else {
            format!(
                "{} v{}\n{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_DESCRIPTION"),
            )
        };

        tracing::info!(tool = "get_info", "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Analyze a whole transcript in chunks.
    #[tool(
        description = "Analyze a chat transcript and rank the phrases its generated messages keep repeating. Returns merged patterns, remaining phrases, and candidates."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn analyze_transcript(
        &self,
        Parameters(params): Parameters<AnalyzeTranscriptParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(
            tool = "analyze_transcript",
            bytes = params.content.len(),
            "executing MCP tool"
        );
        self.check_size(params.content.len())?;

        let messages = transcript::parse(&params.content)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        let mut engine = self.engine(&self.config)?;
        let cancel = AtomicBool::new(false);
        let mut report =
            history::analyze(&mut engine, &messages, &self.config.history, &cancel, |_| {});
        if let Some(top) = params.top {
            report.snapshot.merged.truncate(top);
            report.snapshot.remaining.truncate(top);
        }

        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?;

        tracing::info!(
            tool = "analyze_transcript",
            analyzed = report.progress.analyzed,
            patterns = report.snapshot.merged.len(),
            "MCP tool completed"
        );
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// Observe messages one at a time, as a live session would.
    #[tool(
        description = "Feed generated messages through a live detection session. Returns promoted candidates and the current leaderboard."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn find_slop(
        &self,
        Parameters(params): Parameters<FindSlopParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(
            tool = "find_slop",
            messages = params.messages.len(),
            threshold = ?params.threshold,
            "executing MCP tool"
        );
        self.check_size(params.messages.iter().map(String::len).sum())?;

        let mut config = self.config.clone();
        if let Some(threshold) = params.threshold {
            config.detection.threshold = threshold;
        }
        let mut engine = self.engine(&config)?;
        for (index, message) in params.messages.iter().enumerate() {
            engine.observe(message, index as u64);
        }

        let report = FindSlopReport {
            observed: engine.observed(),
            records: engine.record_count(),
            candidates: engine.candidates(),
            snapshot: engine.snapshot(),
        };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?;

        tracing::info!(
            tool = "find_slop",
            candidates = report.candidates.len(),
            "MCP tool completed"
        );
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_handler]
impl ServerHandler for SlopServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "{} MCP server. Use analyze_transcript for whole chats and find_slop for a list of generated messages.",
                env!("CARGO_PKG_NAME"),
            )),
        }
    }
}
