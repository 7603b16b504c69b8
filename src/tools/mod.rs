//! MCP tool implementations.

pub mod context;
pub mod dashboard;
pub mod tickets;

pub use context::ToolContext;

use crate::error::{DeskError, Result};
use crate::format::OutputFormat;
use crate::service::DeskService;
use rmcp::model::{Tool, ToolAnnotations};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Dispatches MCP tool calls onto the desk service.
pub struct ToolHandler {
    pub service: DeskService,
    pub default_format: OutputFormat,
}

impl ToolHandler {
    pub fn new(service: DeskService, default_format: OutputFormat) -> Self {
        Self {
            service,
            default_format,
        }
    }

    pub fn get_tools(&self) -> Vec<Tool> {
        let mut tools = Vec::new();
        tools.extend(tickets::get_tools());
        tools.extend(dashboard::get_tools());
        tools
    }

    /// Call a tool by name and return its rendered output.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
        ctx: &ToolContext,
    ) -> Result<String> {
        let format = self.format_arg(&arguments)?;
        match name {
            "list_tickets" => tickets::list_tickets(&self.service, arguments, format, ctx).await,
            "dashboard_data" => {
                dashboard::dashboard_data(&self.service, arguments, format, ctx).await
            }
            _ => Err(DeskError::UnknownTool(name.to_string())),
        }
    }

    fn format_arg(&self, args: &Value) -> Result<OutputFormat> {
        match get_string(args, "format") {
            Some(raw) => raw.parse().map_err(|e: String| DeskError::invalid("format", e)),
            None => Ok(self.default_format),
        }
    }
}

/// Build a read-only tool definition.
pub fn make_tool(name: &str, description: &str, properties: Value, required: Vec<&str>) -> Tool {
    let input_schema = rmcp::model::JsonObject::from_iter([
        ("type".to_string(), serde_json::json!("object")),
        ("properties".to_string(), properties),
        ("required".to_string(), serde_json::json!(required)),
    ]);

    let mut tool = Tool::new(name.to_string(), description.to_string(), input_schema);
    tool.annotations = Some(ToolAnnotations {
        title: None,
        read_only_hint: Some(true),
        destructive_hint: Some(false),
        idempotent_hint: Some(true),
        open_world_hint: Some(false),
    });
    tool
}

pub fn get_string(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str().map(String::from))
}

/// Deserialize tool arguments into a request type.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| DeskError::invalid("arguments", e.to_string()))
}
