//! Per-call context handed to tool functions.

use crate::logging::ToolLog;

#[derive(Clone, Default)]
pub struct ToolContext {
    pub log: ToolLog,
}

impl ToolContext {
    pub fn new(log: ToolLog) -> Self {
        Self { log }
    }
}
