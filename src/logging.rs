use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

/// File logger for the agent.
///
/// Prompts, model replies and file contents never reach the log. Only
/// operational events are recorded: startup, configuration, provider calls,
/// safety rejections and persistence failures. Debug entries are written only
/// when debug mode was switched on through `DEBUG=true` or `--debug`.
pub struct AgentLogger {
    log_file_path: PathBuf,
    debug_mode: bool,
    echo_debug: bool,
    writer: Arc<Mutex<Option<fs::File>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub category: LogCategory,
    pub message: String,
    pub context: Option<LogContext>,
    pub is_debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LogCategory {
    System,
    Configuration,
    Provider,
    Safety,
    Filesystem,
    Transcript,
    Debug,
}

/// Extra key/value detail attached to an entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogContext {
    pub component: Option<String>,
    pub operation: Option<String>,
    pub duration_ms: Option<u64>,
    pub error_code: Option<String>,
    pub provider: Option<String>,
    pub success: Option<bool>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, component: &str) -> Self {
        self.component = Some(component.to_string());
        self
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_error_code(mut self, error_code: &str) -> Self {
        self.error_code = Some(error_code.to_string());
        self
    }

    pub fn with_provider(mut self, provider: &str) -> Self {
        self.provider = Some(provider.to_string());
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }
}

impl AgentLogger {
    pub fn new(debug_mode: bool) -> Result<Self> {
        let log_file_path = Self::get_log_file_path()?;
        Self::with_path(log_file_path, debug_mode)
    }

    /// Logger writing to an explicit file
    pub fn with_path(log_file_path: PathBuf, debug_mode: bool) -> Result<Self> {
        if let Some(parent) = log_file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self {
            log_file_path,
            debug_mode,
            echo_debug: debug_mode,
            writer: Arc::new(Mutex::new(None)),
        })
    }

    pub fn log_error(&self, category: LogCategory, message: String, context: Option<LogContext>) -> Result<()> {
        self.log(LogLevel::Error, category, message, context)
    }

    pub fn log_warning(&self, category: LogCategory, message: String, context: Option<LogContext>) -> Result<()> {
        self.log(LogLevel::Warning, category, message, context)
    }

    pub fn log_info(&self, category: LogCategory, message: String, context: Option<LogContext>) -> Result<()> {
        self.log(LogLevel::Info, category, message, context)
    }

    /// Ignored unless debug mode is on
    pub fn log_debug(&self, category: LogCategory, message: String, context: Option<LogContext>) -> Result<()> {
        if !self.debug_mode {
            return Ok(());
        }

        if self.echo_debug {
            eprintln!("DEBUG: {}", message);
        }

        let entry = LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Debug,
            category,
            message: format!("[DEBUG] {}", self.redact_sensitive_info(&message)),
            context,
            is_debug: true,
        };

        self.write_log_entry(&entry)
    }

    fn log(&self, level: LogLevel, category: LogCategory, message: String, context: Option<LogContext>) -> Result<()> {
        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            category,
            message: self.redact_sensitive_info(&message),
            context,
            is_debug: false,
        };

        self.write_log_entry(&entry)
    }

    pub fn log_startup(&self, version: &str, model: &str) -> Result<()> {
        let context = LogContext::new()
            .with_component("system")
            .with_operation("startup");

        self.log_info(
            LogCategory::System,
            format!(
                "genagent {} started on {} {} (model {})",
                version,
                std::env::consts::OS,
                std::env::consts::ARCH,
                model
            ),
            Some(context),
        )
    }

    pub fn log_provider_call(&self, provider: &str, duration_ms: u64, success: bool) -> Result<()> {
        let context = LogContext::new()
            .with_component("provider")
            .with_operation("generate")
            .with_duration_ms(duration_ms)
            .with_provider(provider)
            .with_success(success);

        let level = if success { LogLevel::Info } else { LogLevel::Warning };
        let message = format!(
            "Provider {} generate: {} ({}ms)",
            provider,
            if success { "success" } else { "failed" },
            duration_ms
        );

        self.log(level, LogCategory::Provider, message, Some(context))
    }

    /// Record a Safety Guard rejection. Only the kind of rejection is logged.
    pub fn log_safety_rejection(&self, subject: &str, reason: &str) -> Result<()> {
        let context = LogContext::new()
            .with_component("safety")
            .with_operation(subject)
            .with_error_code("rejected");

        self.log_warning(
            LogCategory::Safety,
            format!("Rejected {}: {}", subject, reason),
            Some(context),
        )
    }

    fn get_log_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| anyhow!("Could not find config directory"))?;

        let mut log_path = config_dir;
        log_path.push("genagent");
        log_path.push("agent.log");

        Ok(log_path)
    }

    fn write_log_entry(&self, entry: &LogEntry) -> Result<()> {
        let mut writer_guard = self
            .writer
            .lock()
            .map_err(|_| anyhow!("Failed to acquire log writer lock"))?;

        if writer_guard.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_file_path)?;
            *writer_guard = Some(file);
        }

        if let Some(ref mut file) = *writer_guard {
            writeln!(file, "{}", self.format_log_entry(entry))?;
            file.flush()?;
        }

        Ok(())
    }

    fn format_log_entry(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC");
        let level = format!("{:?}", entry.level).to_uppercase();
        let category = format!("{:?}", entry.category).to_uppercase();

        let mut formatted = format!("[{}] {} {} {}", timestamp, level, category, entry.message);

        if let Some(ref context) = entry.context {
            let mut parts = Vec::new();

            if let Some(ref component) = context.component {
                parts.push(format!("component={}", component));
            }
            if let Some(ref operation) = context.operation {
                parts.push(format!("operation={}", operation));
            }
            if let Some(duration) = context.duration_ms {
                parts.push(format!("duration={}ms", duration));
            }
            if let Some(ref error_code) = context.error_code {
                parts.push(format!("error={}", error_code));
            }
            if let Some(ref provider) = context.provider {
                parts.push(format!("provider={}", provider));
            }
            if let Some(success) = context.success {
                parts.push(format!("success={}", success));
            }

            if !parts.is_empty() {
                formatted.push_str(&format!(" [{}]", parts.join(", ")));
            }
        }

        formatted
    }

    fn redact_sensitive_info(&self, message: &str) -> String {
        let mut redacted = message.to_string();

        let rules = [
            (r"/home/[^/\s]+", "/home/[USER]"),
            (r"/Users/[^/\s]+", "/Users/[USER]"),
            (r"api_key=\S+", "api_key=[REDACTED]"),
            (r"([?&])key=[^&\s]+", "${1}key=[REDACTED]"),
            (r"token=\S+", "token=[REDACTED]"),
            (r"password=\S+", "password=[REDACTED]"),
        ];

        for (pattern, replacement) in rules {
            if let Ok(re) = Regex::new(pattern) {
                redacted = re.replace_all(&redacted, replacement).to_string();
            }
        }

        redacted
    }

    pub fn is_debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn get_current_log_path(&self) -> &PathBuf {
        &self.log_file_path
    }
}

static GLOBAL_LOGGER: OnceLock<Arc<Mutex<AgentLogger>>> = OnceLock::new();

/// Initialize the global logger. Later calls keep the first logger.
pub fn init_logger(debug_mode: bool) -> Result<()> {
    let logger = AgentLogger::new(debug_mode)?;
    let _ = GLOBAL_LOGGER.set(Arc::new(Mutex::new(logger)));
    Ok(())
}

pub fn get_logger() -> Result<Arc<Mutex<AgentLogger>>> {
    GLOBAL_LOGGER
        .get()
        .cloned()
        .ok_or_else(|| anyhow!("Logger not initialized. Call init_logger() first."))
}

#[macro_export]
macro_rules! log_error {
    ($category:expr, $message:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_error($category, $message.to_string(), None);
            }
        }
    };
}

#[macro_export]
macro_rules! log_warning {
    ($category:expr, $message:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_warning($category, $message.to_string(), None);
            }
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($category:expr, $message:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_info($category, $message.to_string(), None);
            }
        }
    };
}

#[macro_export]
macro_rules! log_debug {
    ($category:expr, $message:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_debug($category, $message.to_string(), None);
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_logger(debug_mode: bool) -> (AgentLogger, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("test.log");

        let mut logger = AgentLogger::with_path(log_path, debug_mode).unwrap();
        logger.echo_debug = false;

        (logger, temp_dir)
    }

    #[test]
    fn test_log_error() {
        let (logger, _temp_dir) = create_test_logger(false);

        logger
            .log_error(LogCategory::Filesystem, "Disk went away".to_string(), None)
            .unwrap();

        let log_content = fs::read_to_string(logger.get_current_log_path()).unwrap();
        assert!(log_content.contains("ERROR"));
        assert!(log_content.contains("FILESYSTEM"));
        assert!(log_content.contains("Disk went away"));
    }

    #[test]
    fn test_debug_logs_only_in_debug_mode() {
        let (logger, _temp_dir) = create_test_logger(false);
        assert!(!logger.is_debug_mode());
        logger
            .log_debug(LogCategory::Debug, "hidden message".to_string(), None)
            .unwrap();
        assert!(!logger.get_current_log_path().exists());

        let (logger, _temp_dir) = create_test_logger(true);
        assert!(logger.is_debug_mode());
        logger
            .log_debug(LogCategory::Debug, "visible message".to_string(), None)
            .unwrap();
        let log_content = fs::read_to_string(logger.get_current_log_path()).unwrap();
        assert!(log_content.contains("[DEBUG] visible message"));
    }

    #[test]
    fn test_redact_sensitive_info() {
        let (logger, _temp_dir) = create_test_logger(false);

        let redacted = logger.redact_sensitive_info(
            "GET https://example.test/v1beta/models/m:generateContent?key=AIzaSECRET from /home/alice/work",
        );

        assert!(redacted.contains("?key=[REDACTED]"));
        assert!(redacted.contains("/home/[USER]"));
        assert!(!redacted.contains("AIzaSECRET"));
        assert!(!redacted.contains("alice"));
    }

    #[test]
    fn test_log_provider_call_with_context() {
        let (logger, _temp_dir) = create_test_logger(false);

        logger.log_provider_call("gemini", 1500, false).unwrap();

        let log_content = fs::read_to_string(logger.get_current_log_path()).unwrap();
        assert!(log_content.contains("WARNING PROVIDER"));
        assert!(log_content.contains("Provider gemini generate: failed (1500ms)"));
        assert!(log_content.contains("provider=gemini"));
        assert!(log_content.contains("success=false"));
    }

    #[test]
    fn test_log_safety_rejection() {
        let (logger, _temp_dir) = create_test_logger(false);

        logger.log_safety_rejection("command", "blocked fragment '|'").unwrap();

        let log_content = fs::read_to_string(logger.get_current_log_path()).unwrap();
        assert!(log_content.contains("SAFETY"));
        assert!(log_content.contains("Rejected command"));
        assert!(log_content.contains("error=rejected"));
    }
}
