use chrono::Utc;
use serde_json::{json, Value};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::net::IpAddr;
use std::sync::Mutex;
use uuid::Uuid;

use crate::config::EventLogConfig;

/// Severity of a security event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
    Error,
    Critical,
}

impl EventLevel {
    fn as_str(self) -> &'static str {
        match self {
            EventLevel::Info => "info",
            EventLevel::Warn => "warn",
            EventLevel::Error => "error",
            EventLevel::Critical => "critical",
        }
    }
}

/// Request details attached to non-auth security signals.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub client_addr: IpAddr,
    pub user_agent: Option<String>,
}

/// Process-wide append-only sink for authentication and security events.
///
/// Every record goes to the console for operator visibility; when a file path
/// is configured (Strict posture default) records are additionally appended as
/// JSON lines. Logging is best-effort: a failed file write falls back to a
/// console line and never aborts the request being processed.
pub struct SecurityEventLog {
    file: Option<Mutex<File>>,
}

impl SecurityEventLog {
    pub fn new(config: &EventLogConfig) -> Self {
        let file = config.file_path.as_deref().and_then(|path| {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(f) => Some(Mutex::new(f)),
                Err(e) => {
                    tracing::error!("failed to open security event log {}: {}", path, e);
                    None
                }
            }
        });

        Self { file }
    }

    /// Console-only log, used by tests and ad hoc construction.
    pub fn console_only() -> Self {
        Self { file: None }
    }

    /// Append one event. Metadata values must be scalars.
    pub fn record(&self, level: EventLevel, message: &str, metadata: Value) {
        match level {
            EventLevel::Info => tracing::info!(event = %message, meta = %metadata, "security event"),
            EventLevel::Warn => tracing::warn!(event = %message, meta = %metadata, "security event"),
            EventLevel::Error | EventLevel::Critical => {
                tracing::error!(event = %message, meta = %metadata, "security event")
            }
        }

        if let Some(file) = &self.file {
            let record = json!({
                "timestamp": Utc::now().to_rfc3339(),
                "level": level.as_str(),
                "message": message,
                "metadata": metadata,
            });
            let mut line = record.to_string();
            line.push('\n');

            let result = file
                .lock()
                .map_err(|_| "event log mutex poisoned".to_string())
                .and_then(|mut f| {
                    f.write_all(line.as_bytes())
                        .map_err(|e| e.to_string())
                });
            if let Err(e) = result {
                // Best-effort sink: never fail the request over a log write.
                tracing::error!("security event log write failed: {}", e);
            }
        }
    }

    /// One record per authentication attempt, with a normalized metadata
    /// shape. Raw credentials must never pass through here.
    pub fn record_auth_attempt(
        &self,
        success: bool,
        subject: Option<Uuid>,
        client_addr: IpAddr,
        user_agent: Option<&str>,
        reason: Option<&str>,
    ) {
        let level = if success { EventLevel::Info } else { EventLevel::Warn };
        let message = if success { "auth attempt succeeded" } else { "auth attempt failed" };

        self.record(
            level,
            message,
            json!({
                "success": success,
                "subject": subject.map(|s| s.to_string()),
                "client_addr": client_addr.to_string(),
                "user_agent": user_agent,
                "reason": reason,
            }),
        );
    }

    /// Non-auth security signal worth an operator's attention.
    pub fn record_suspicious_activity(&self, description: &str, ctx: &RequestContext) {
        self.record(EventLevel::Warn, description, Self::context_metadata(ctx));
    }

    /// Outright violation (CSRF mismatch, privileged-path misuse).
    pub fn record_violation(&self, description: &str, ctx: &RequestContext) {
        self.record(EventLevel::Error, description, Self::context_metadata(ctx));
    }

    fn context_metadata(ctx: &RequestContext) -> Value {
        json!({
            "method": ctx.method,
            "path": ctx.path,
            "client_addr": ctx.client_addr.to_string(),
            "user_agent": ctx.user_agent,
        })
    }
}
