/*!
 * MCP server exposing the analyzer over stdio
 *
 * Tools mirror the CLI: `analyze` runs one analysis, `read_output` reads a
 * previously written session file back with fresh counts, `health` is a
 * fixed liveness check. Payloads are JSON returned as text content.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rmcp::{
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::analyzer::{AnalysisRequest, Analyzer};
use crate::config::{parse_model, ServerConfig};
use crate::error::{self, AnalysisError};
use crate::filter::FilterConfig;
use crate::git::Git2Provider;
use crate::tokenizer::{create_tokenizer, Model};
use crate::writer::read_output;

/// Parameters of the `analyze` tool
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct AnalyzeArgs {
    /// Repository URL or local folder path (required).
    #[serde(default)]
    pub source: Option<String>,
    /// Root folder for session output (default: server setting or ./repotxt_output).
    #[serde(default)]
    pub output_dir: Option<String>,
    /// Treat source as a local path, never clone (default: false).
    #[serde(default)]
    pub is_local: Option<bool>,
    /// Access token for private repositories.
    #[serde(default)]
    pub token: Option<String>,
    /// List only directories in the folder structure (default: false).
    #[serde(default)]
    pub directories_only: Option<bool>,
    /// File suffixes to keep, e.g. [".py", ".rs"].
    #[serde(default)]
    pub include_only: Option<Vec<String>>,
    /// File suffixes to skip.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    /// Include git metadata (default: false).
    #[serde(default)]
    pub include_git: Option<bool>,
    /// Include LICENSE files (default: false).
    #[serde(default)]
    pub include_license: Option<bool>,
    /// Exclude README files (default: false).
    #[serde(default)]
    pub exclude_readme: Option<bool>,
    /// Token budget, 0 for unlimited (default: 0).
    #[serde(default)]
    pub max_token_length: Option<i64>,
    /// Inline the generated text in the response (default: false).
    #[serde(default)]
    pub return_file: Option<bool>,
    /// Tokenizer model, e.g. "gpt4" (default: server setting).
    #[serde(default)]
    pub model: Option<String>,
}

impl AnalyzeArgs {
    /// Resolve tool parameters against server defaults
    pub fn into_request(
        self,
        config: &ServerConfig,
    ) -> error::Result<(AnalysisRequest, Model)> {
        let source = match self.source {
            Some(source) if !source.trim().is_empty() => source,
            _ => crate::bail!(InvalidArgument, "source is required"),
        };

        let model = match self.model.as_deref() {
            Some(name) => parse_model(name)?,
            None => config.model,
        };

        let filter = FilterConfig {
            ignore_git: !self.include_git.unwrap_or(false),
            exclude_license: !self.include_license.unwrap_or(false),
            exclude_readme: self.exclude_readme.unwrap_or(false),
            exclude_extensions: self.exclude.unwrap_or_default(),
            include_extensions: self.include_only.unwrap_or_default(),
        };

        let request = AnalysisRequest {
            source,
            is_local: self.is_local.unwrap_or(false),
            token: self.token,
            output_dir: self
                .output_dir
                .map(PathBuf::from)
                .or_else(|| config.output_dir.clone()),
            directories_only: self.directories_only.unwrap_or(false),
            filter,
            max_tokens: self.max_token_length.unwrap_or(0),
            binary_detection: Default::default(),
        };

        Ok((request, model))
    }
}

/// Parameters of the `read_output` tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadOutputArgs {
    /// Path of a previously generated output file.
    pub output_file: String,
    /// Tokenizer model used for the recount (default: server setting).
    #[serde(default)]
    pub model: Option<String>,
}

/// Run one analysis and build the `analyze` response payload
pub fn run_analysis(args: AnalyzeArgs, config: &ServerConfig) -> error::Result<Value> {
    let return_file = args.return_file.unwrap_or(false);
    let (request, model) = args.into_request(config)?;

    let result = Analyzer::new(Git2Provider::new())
        .with_model(model)
        .run(&request)?;

    let mut payload = json!({
        "success": true,
        "result": &result,
        "file_path": &result.output_file,
        "token_count": result.token_count,
        "character_count": result.char_count,
    });
    if return_file {
        payload["file_content"] = Value::String(read_output(&result.output_file)?);
    }

    Ok(payload)
}

/// Read an output file back with recomputed counts
pub fn read_output_payload(path: &Path, model: Model) -> error::Result<Value> {
    crate::ensure!(path.is_file(), PathNotFound, "{}", path.display());

    let content = read_output(path).map_err(|source| AnalysisError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let token_count = create_tokenizer(model)
        .and_then(|tokenizer| tokenizer.count_tokens(&content))
        .unwrap_or_else(|e| {
            warn!(error = %e, "Token counting failed, reporting zero");
            0
        });

    Ok(json!({
        "content": &content,
        "character_count": content.chars().count(),
        "token_count": token_count,
    }))
}

fn to_mcp_error(error: AnalysisError) -> McpError {
    if error.is_caller_error() {
        McpError::invalid_params(error.to_string(), None)
    } else {
        McpError::internal_error(error.to_string(), None)
    }
}

fn json_content(payload: Value) -> std::result::Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(
        payload.to_string(),
    )]))
}

/// stdio MCP service
#[derive(Clone)]
pub struct RepoTxtServer {
    config: Arc<ServerConfig>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl RepoTxtServer {
    /// Create a server with the given defaults
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Flatten a git repository or local folder into one text file (folder structure plus concatenated file contents)"
    )]
    async fn analyze(
        &self,
        Parameters(args): Parameters<AnalyzeArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!(source = ?args.source, "analyze called");
        let config = Arc::clone(&self.config);
        let payload = tokio::task::spawn_blocking(move || run_analysis(args, &config))
            .await
            .map_err(|e| McpError::internal_error(format!("analysis task failed: {}", e), None))?
            .map_err(to_mcp_error)?;

        json_content(payload)
    }

    #[tool(description = "Read a generated output file with its character and token counts")]
    async fn read_output(
        &self,
        Parameters(args): Parameters<ReadOutputArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let model = match args.model.as_deref() {
            Some(name) => parse_model(name).map_err(to_mcp_error)?,
            None => self.config.model,
        };
        let path = PathBuf::from(args.output_file);
        let payload = tokio::task::spawn_blocking(move || read_output_payload(&path, model))
            .await
            .map_err(|e| McpError::internal_error(format!("read task failed: {}", e), None))?
            .map_err(to_mcp_error)?;

        json_content(payload)
    }

    #[tool(description = "Liveness check")]
    async fn health(&self) -> std::result::Result<CallToolResult, McpError> {
        json_content(json!({ "status": "healthy" }))
    }
}

#[tool_handler]
impl rmcp::ServerHandler for RepoTxtServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Turns a repository or folder into a single text file for LLM context.\n\n\
                 - analyze: clone or read a source, write {output_dir}/{name}_{timestamp}/ output\n\
                 - read_output: fetch a generated file with character and token counts\n\
                 - health: liveness check"
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
