//! MCP (Model Context Protocol) server implementation.
//!
//! This module exposes the analyzer over the MCP protocol, making it
//! available to AI assistants via stdio transport.
//!
//! # Architecture
//!
//! The MCP server is a presentation layer. It owns one shared [`Analyzer`],
//! so the cache, failure state, settings and correction history persist for
//! the life of the connection. Each `#[tool]` method validates its input and
//! delegates to the analyzer; no analysis logic lives here.
//!
//! # Adding Tools
//!
//! 1. Define a parameter struct with `Deserialize` + `JsonSchema`
//! 2. Add a `#[tool(description = "...")]` method to the `#[tool_router]` impl
//! 3. Call core library functions, convert errors to `McpError`
//! 4. Return `CallToolResult::success(vec![Content::text(...)])`

use std::sync::Arc;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;

use scrivener_core::history::NewCorrection;
use scrivener_core::language::{detect, map_detected};
use scrivener_core::{Analyzer, SettingsPatch, validate_text};

/// Default number of records returned by `recent_corrections`.
const DEFAULT_RECENT_LIMIT: usize = 10;

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

/// Parameters for tools that take a piece of text.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct TextParams {
    /// The text to process.
    pub text: String,
}

/// Parameters for the `recent_corrections` tool.
#[derive(Debug, Default, serde::Deserialize, schemars::JsonSchema)]
pub struct RecentCorrectionsParams {
    /// Maximum number of records to return (default 10).
    pub limit: Option<usize>,
}

/// MCP server exposing the analyzer to AI assistants.
///
/// Each `#[tool]` method in the `#[tool_router]` impl block is automatically
/// registered and callable via the MCP protocol.
#[derive(Clone)]
pub struct ProjectServer {
    analyzer: Arc<Analyzer>,
    max_input: Option<usize>,
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[tool_router]
impl ProjectServer {
    /// Create a new MCP server around a shared analyzer.
    pub fn new(analyzer: Arc<Analyzer>, max_input: Option<usize>) -> Self {
        Self {
            analyzer,
            max_input,
            tool_router: Self::tool_router(),
        }
    }

    fn validate(&self, text: &str) -> Result<(), McpError> {
        validate_text(text, self.max_input).map_err(|e| McpError::invalid_params(e.to_string(), None))
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

    /// Analyze text with the current settings.
    #[tool(
        description = "Check text for spelling and grammar issues and suggest completions. Uses the remote service when online and the local dictionary when offline or when the remote service keeps failing."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server", text_len = params.text.len()))]
    async fn analyze_text(
        &self,
        Parameters(params): Parameters<TextParams>,
    ) -> Result<CallToolResult, McpError> {
        self.validate(&params.text)?;
        let settings = self.analyzer.settings();
        let result = self.analyzer.analyze(&params.text).await.filtered(&settings);

        tracing::info!(
            tool = "analyze_text",
            corrections = result.corrections.len(),
            "MCP tool completed"
        );
        json_result(&result)
    }

    /// Detect the language of text.
    #[tool(
        description = "Detect the language of text (English, Spanish, French, German) and report which dictionary would be used."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn detect_language(
        &self,
        Parameters(params): Parameters<TextParams>,
    ) -> Result<CallToolResult, McpError> {
        self.validate(&params.text)?;
        let detected = detect(&params.text);
        json_result(&serde_json::json!({
            "detected": detected,
            "dictionary": map_detected(detected),
        }))
    }

    /// Record a correction outcome.
    #[tool(
        description = "Record that the user applied or dismissed a suggestion. Stored only when store_history is on; usage counters update either way."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn log_correction(
        &self,
        Parameters(params): Parameters<NewCorrection>,
    ) -> Result<CallToolResult, McpError> {
        let record = self.analyzer.log_correction(params);
        json_result(&serde_json::json!({ "stored": record.is_some(), "record": record }))
    }

    /// List recent correction records.
    #[tool(description = "List the most recent correction records, newest first.")]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn recent_corrections(
        &self,
        Parameters(params): Parameters<RecentCorrectionsParams>,
    ) -> Result<CallToolResult, McpError> {
        let limit = params.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
        json_result(&self.analyzer.history().recent(limit))
    }

    /// Report usage counters.
    #[tool(
        description = "Usage counters since startup: analyses run, words processed, suggestions made, corrections applied and dismissed."
    )]
    fn usage_statistics(&self) -> Result<CallToolResult, McpError> {
        json_result(&self.analyzer.history().statistics())
    }

    /// Report service health.
    #[tool(
        description = "Health of each service category (api, dictionary, ...): error count, last error, recovery attempts and state."
    )]
    fn error_report(&self) -> Result<CallToolResult, McpError> {
        json_result(&serde_json::json!({
            "services": self.analyzer.error_report(),
            "cache": self.analyzer.cache_stats(),
        }))
    }

    /// Drop cached results.
    #[tool(description = "Clear the analysis result cache.")]
    fn clear_cache(&self) -> Result<CallToolResult, McpError> {
        self.analyzer.clear_cache();
        tracing::info!(tool = "clear_cache", "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text("cache cleared")]))
    }

    /// Reset error counters.
    #[tool(description = "Reset the error counters of every service category.")]
    fn reset_error_counts(&self) -> Result<CallToolResult, McpError> {
        self.analyzer.reset_all_error_counts();
        tracing::info!(tool = "reset_error_counts", "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(
            "error counts reset",
        )]))
    }

    /// Show the current settings.
    #[tool(description = "Show the current analysis settings.")]
    fn get_settings(&self) -> Result<CallToolResult, McpError> {
        json_result(&self.analyzer.settings())
    }

    /// Change settings.
    #[tool(
        description = "Change analysis settings. Accepts any of work_offline, language, spelling_check, grammar_check, autocomplete, store_history; omitted keys are unchanged."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn update_settings(
        &self,
        Parameters(params): Parameters<SettingsPatch>,
    ) -> Result<CallToolResult, McpError> {
        let settings = self.analyzer.update_settings(params);
        tracing::info!(tool = "update_settings", "MCP tool completed");
        json_result(&settings)
    }
}

#[tool_handler]
impl ServerHandler for ProjectServer {
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
                "{} MCP server. Use analyze_text to check writing; settings and history persist for the session.",
                env!("CARGO_PKG_NAME"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::RawContent;
    use scrivener_core::Settings;
    use scrivener_core::history::{Outcome, RecordKind};

    fn offline_server() -> ProjectServer {
        let analyzer = Analyzer::builder()
            .settings(Settings {
                work_offline: true,
                ..Settings::default()
            })
            .build();
        ProjectServer::new(Arc::new(analyzer), Some(1024))
    }

    /// Extract text from the first content item in a `CallToolResult`.
    fn extract_text(result: &CallToolResult) -> Option<&str> {
        result.content.first().and_then(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
    }

    fn extract_json(result: &CallToolResult) -> serde_json::Value {
        let text = extract_text(result).expect("should have text content");
        serde_json::from_str(text).expect("output should be valid JSON")
    }

    #[test]
    fn server_info_has_correct_name() {
        let server = offline_server();
        let info = ServerHandler::get_info(&server);

        assert_eq!(info.server_info.name, env!("CARGO_PKG_NAME"));
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn get_info_tool_returns_json_when_requested() {
        let server = offline_server();
        let result = server
            .get_info(Parameters(GetInfoParams {
                format: "json".to_string(),
            }))
            .expect("get_info should succeed");

        let json = extract_json(&result);
        assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn analyze_text_reports_corrections() {
        let server = offline_server();
        let result = server
            .analyze_text(Parameters(TextParams {
                text: "teh cat sat on the dog".to_string(),
            }))
            .await
            .expect("analyze_text should succeed");

        let json = extract_json(&result);
        assert_eq!(json["corrections"][0]["word"], "teh");
        assert_eq!(json["corrections"][0]["type"], "spelling");
        assert!(json["autocompleteSuggestions"].is_array());
    }

    #[tokio::test]
    async fn analyze_text_rejects_invalid_input() {
        let server = offline_server();
        assert!(
            server
                .analyze_text(Parameters(TextParams {
                    text: "  ".to_string()
                }))
                .await
                .is_err()
        );
        assert!(
            server
                .analyze_text(Parameters(TextParams {
                    text: "word ".repeat(500)
                }))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn settings_filters_apply_to_results() {
        let server = offline_server();
        server
            .update_settings(Parameters(SettingsPatch {
                spelling_check: Some(false),
                ..Default::default()
            }))
            .expect("update_settings should succeed");

        let result = server
            .analyze_text(Parameters(TextParams {
                text: "teh cat sat on the dog".to_string(),
            }))
            .await
            .unwrap();
        let json = extract_json(&result);
        assert_eq!(json["corrections"].as_array().unwrap().len(), 0);

        let settings = extract_json(&server.get_settings().unwrap());
        assert_eq!(settings["spelling_check"], false);
        assert_eq!(settings["work_offline"], true);
    }

    #[test]
    fn detect_language_tool_works() {
        let server = offline_server();
        let result = server
            .detect_language(Parameters(TextParams {
                text: "El niño está en la casa".to_string(),
            }))
            .unwrap();
        let json = extract_json(&result);
        assert_eq!(json["detected"], "es");
        assert_eq!(json["dictionary"], "es");
    }

    #[test]
    fn correction_history_round_trip() {
        let server = offline_server();
        let logged = server
            .log_correction(Parameters(NewCorrection {
                kind: RecordKind::Spelling,
                original: "teh".into(),
                corrected: "the".into(),
                application: "Notes".into(),
                outcome: Outcome::Applied,
            }))
            .unwrap();
        assert_eq!(extract_json(&logged)["stored"], true);

        let recent = extract_json(
            &server
                .recent_corrections(Parameters(RecentCorrectionsParams::default()))
                .unwrap(),
        );
        assert_eq!(recent[0]["original"], "teh");

        let stats = extract_json(&server.usage_statistics().unwrap());
        assert_eq!(stats["corrections_applied"], 1);
    }

    #[test]
    fn admin_tools_succeed() {
        let server = offline_server();
        let report = extract_json(&server.error_report().unwrap());
        assert_eq!(report["services"].as_array().unwrap().len(), 6);
        assert_eq!(report["services"][1]["category"], "api");
        assert!(server.clear_cache().is_ok());
        assert!(server.reset_error_counts().is_ok());
    }
}
