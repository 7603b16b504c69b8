//! Logging: process-wide tracing setup and per-tool-call log sinks that can
//! also reach the MCP client.

use anyhow::Result;
use rmcp::{
    RoleServer,
    model::{LoggingLevel, LoggingMessageNotificationParam},
    service::Peer,
};
use serde_json::{Value, json};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Where tracing output goes, parsed from `--log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Off,
    Stdout,
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// `0`/`off`, `1`/`stdout`, `2`/`stderr`, anything else is a file path.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "0" | "off" => LogTarget::Off,
            "1" | "stdout" => LogTarget::Stdout,
            "2" | "stderr" => LogTarget::Stderr,
            path => LogTarget::File(PathBuf::from(path)),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(target: &LogTarget, verbose: bool) -> Result<()> {
    let default_level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(default_level).into())
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match target {
        LogTarget::Off => {}
        LogTarget::Stdout => {
            tracing::subscriber::set_global_default(builder.with_writer(std::io::stdout).finish())?;
        }
        LogTarget::Stderr => {
            tracing::subscriber::set_global_default(builder.with_writer(std::io::stderr).finish())?;
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing::subscriber::set_global_default(
                builder.with_writer(Arc::new(file)).with_ansi(false).finish(),
            )?;
        }
    }
    Ok(())
}

/// Client log levels, least severe first.
const SEVERITY: [LoggingLevel; 8] = [
    LoggingLevel::Debug,
    LoggingLevel::Info,
    LoggingLevel::Notice,
    LoggingLevel::Warning,
    LoggingLevel::Error,
    LoggingLevel::Critical,
    LoggingLevel::Alert,
    LoggingLevel::Emergency,
];

fn severity(level: LoggingLevel) -> u8 {
    SEVERITY.iter().position(|l| *l == level).unwrap_or(0) as u8
}

/// Lowest severity forwarded to the MCP client. Moved by `logging/setLevel`.
#[derive(Debug)]
pub struct ClientLevel(AtomicU8);

impl ClientLevel {
    pub fn new(level: LoggingLevel) -> Self {
        Self(AtomicU8::new(severity(level)))
    }

    pub fn current(&self) -> LoggingLevel {
        let idx = usize::from(self.0.load(Ordering::Relaxed));
        SEVERITY[idx.min(SEVERITY.len() - 1)]
    }

    pub fn set(&self, level: LoggingLevel) {
        self.0.store(severity(level), Ordering::Relaxed);
    }

    pub fn admits(&self, level: LoggingLevel) -> bool {
        severity(level) >= self.0.load(Ordering::Relaxed)
    }
}

impl Default for ClientLevel {
    fn default() -> Self {
        Self::new(LoggingLevel::Info)
    }
}

/// Log sink for one tool call. Messages always reach tracing; they are also
/// sent to the client when a peer is attached and its level admits them.
#[derive(Clone)]
pub struct ToolLog {
    tool: String,
    client: Option<(Peer<RoleServer>, Arc<ClientLevel>)>,
}

impl Default for ToolLog {
    fn default() -> Self {
        Self::detached("desk")
    }
}

impl ToolLog {
    pub fn detached(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            client: None,
        }
    }

    pub fn connected(
        tool: impl Into<String>,
        peer: Peer<RoleServer>,
        level: Arc<ClientLevel>,
    ) -> Self {
        Self {
            tool: tool.into(),
            client: Some((peer, level)),
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn emit(&self, level: LoggingLevel, message: &str, data: Option<Value>) {
        match level {
            LoggingLevel::Debug => tracing::debug!(tool = %self.tool, "{}", message),
            LoggingLevel::Info | LoggingLevel::Notice => {
                tracing::info!(tool = %self.tool, "{}", message)
            }
            LoggingLevel::Warning => tracing::warn!(tool = %self.tool, "{}", message),
            _ => tracing::error!(tool = %self.tool, "{}", message),
        }

        let Some((peer, threshold)) = &self.client else {
            return;
        };
        if !threshold.admits(level) {
            return;
        }
        let param = LoggingMessageNotificationParam {
            level,
            logger: Some(self.tool.clone()),
            data: data.unwrap_or_else(|| json!({ "message": message })),
        };
        let peer = peer.clone();
        tokio::spawn(async move {
            if let Err(e) = peer.notify_logging_message(param).await {
                tracing::debug!(error = %e, "client log message dropped");
            }
        });
    }

    pub fn debug(&self, message: &str) {
        self.emit(LoggingLevel::Debug, message, None);
    }

    pub fn info(&self, message: &str, data: Value) {
        self.emit(LoggingLevel::Info, message, Some(data));
    }
}
