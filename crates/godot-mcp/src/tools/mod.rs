pub mod scripts;

use std::path::PathBuf;

use gdscript_patch::{
    analyze, compose_script, patch_file, write_source, PatchError, PatchOutcome, PatchRequest,
};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{tool_handler, tool_router, ServerHandler};
use tokio::sync::OwnedMutexGuard;

use crate::config::ServerConfig;
use crate::locks::FileLocks;
use crate::paths::resolve_script_path;

use scripts::{CreateGdscriptParams, ModifyGdscriptParams, ReadGdscriptParams};

/// Characters of a created script echoed back to the caller.
const PREVIEW_CHARS: usize = 200;

#[derive(Clone)]
pub struct GodotMcp {
    config: ServerConfig,
    locks: FileLocks,
    tool_router: ToolRouter<Self>,
}

impl GodotMcp {
    /// Access the tool router for testing/introspection.
    #[allow(dead_code)]
    pub fn router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    fn resolve(&self, rel: &str) -> Result<PathBuf, PatchError> {
        resolve_script_path(self.config.project_root(), rel)
    }
}

#[tool_router]
impl GodotMcp {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            locks: FileLocks::default(),
            tool_router: Self::tool_router(),
        }
    }

    /// Read a GDScript file. Returns JSON with the script's extends, class_name, top-level functions, variables, and signals, plus the full content.
    #[rmcp::tool]
    async fn read_gdscript(
        &self,
        Parameters(params): Parameters<ReadGdscriptParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let path = match self.resolve(&params.file_path) {
            Ok(p) => p,
            Err(e) => return Ok(failure("read_gdscript", &e)),
        };
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => return Ok(failure("read_gdscript", &PatchError::io(&path, e))),
        };

        let analysis = analyze(&content);
        tracing::info!(
            path = %params.file_path,
            functions = analysis.functions.len(),
            "read script"
        );

        Ok(json_result(&serde_json::json!({
            "path": params.file_path,
            "analysis": analysis,
            "content": content,
        })))
    }

    /// Create or overwrite a GDScript file. Adds `extends Node` when the content has no extends line and an optional class_name after it. Creates parent directories.
    #[rmcp::tool]
    async fn create_gdscript(
        &self,
        Parameters(params): Parameters<CreateGdscriptParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let path = match self.resolve(&params.file_path) {
            Ok(p) => p,
            Err(e) => return Ok(failure("create_gdscript", &e)),
        };
        let text = match compose_script(&params.content, params.class_name.as_deref()) {
            Ok(text) => text,
            Err(e) => return Ok(failure("create_gdscript", &e)),
        };
        let bytes = text.len();
        let preview: String = text.chars().take(PREVIEW_CHARS).collect();

        let guard = self.locks.lock(&path).await;
        let target = path.clone();
        let write = run_blocking(guard, move || write_source(&target, &text));
        if let Err(e) = write.await? {
            return Ok(failure("create_gdscript", &e));
        }

        tracing::info!(path = %params.file_path, bytes, "created script");
        Ok(json_result(&serde_json::json!({
            "path": params.file_path,
            "bytes": bytes,
            "class_name": params.class_name,
            "preview": preview,
        })))
    }

    /// Add or replace a top-level function in a GDScript file. An existing definition is replaced in place; a new one goes after the block containing `insert_after`, or at the end of the file. Re-running with the same content changes nothing.
    #[rmcp::tool]
    async fn modify_gdscript(
        &self,
        Parameters(params): Parameters<ModifyGdscriptParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let path = match self.resolve(&params.file_path) {
            Ok(p) => p,
            Err(e) => return Ok(failure("modify_gdscript", &e)),
        };
        let request = PatchRequest::new(params.function_name.clone(), params.function_content)
            .with_anchor(params.insert_after);

        let guard = self.locks.lock(&path).await;
        let target = path.clone();
        let report = match run_blocking(guard, move || patch_file(&target, &request)).await? {
            Ok(report) => report,
            Err(e) => return Ok(failure("modify_gdscript", &e)),
        };

        let anchor_missing = matches!(
            report.outcome,
            PatchOutcome::Appended {
                anchor_missing: true,
                ..
            }
        );
        tracing::info!(
            path = %params.file_path,
            function = %params.function_name,
            action = report.outcome.action(),
            line = report.outcome.line(),
            "modified script"
        );

        Ok(json_result(&serde_json::json!({
            "path": params.file_path,
            "function": params.function_name,
            "action": report.outcome.action(),
            "line": report.outcome.line(),
            "anchor_missing": anchor_missing,
            "bytes": report.bytes_written,
        })))
    }
}

/// Runs file work on the blocking pool while holding the file's lock.
///
/// The guard moves into the task, so a cancelled tool call keeps the file
/// locked until its write has finished.
async fn run_blocking<T, F>(
    guard: OwnedMutexGuard<()>,
    work: F,
) -> Result<Result<T, PatchError>, rmcp::ErrorData>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PatchError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let _guard = guard;
        work()
    })
    .await
        .map_err(|e| rmcp::ErrorData::internal_error(format!("file task failed: {e}"), None))
}

fn failure(tool: &str, err: &PatchError) -> CallToolResult {
    tracing::warn!(tool, code = err.code(), error = %err, "tool call failed");
    CallToolResult::error(vec![Content::text(format!("Error: {err}"))])
}

fn json_result(value: &serde_json::Value) -> CallToolResult {
    CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string()),
    )])
}

#[tool_handler]
impl ServerHandler for GodotMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "GDScript tools for one Godot project. Paths are relative to the \
                 project root. Use read_gdscript to inspect a script, create_gdscript \
                 to write a new one, and modify_gdscript to add or replace a single \
                 top-level function without touching the rest of the file."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
