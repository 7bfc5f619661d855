use colored::*;
use std::fmt;
use std::io;

/// Tag carried by every user-facing failure. The display layer picks the icon
/// and title from it, so handlers never format errors themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed directive arguments
    Format,
    NotFound,
    PermissionDenied,
    /// Path rejected by the Safety Guard
    Traversal,
    /// Shell command rejected by the Safety Guard
    BlockedCommand,
    /// The generative backend failed
    Provider,
    /// Any other OS failure
    Io,
    /// Transcript could not be read or written
    Persistence,
}

impl ErrorKind {
    fn icon(&self) -> &'static str {
        match self {
            ErrorKind::Format => "❌",
            ErrorKind::NotFound => "❌",
            ErrorKind::PermissionDenied => "🚫",
            ErrorKind::Traversal | ErrorKind::BlockedCommand => "❌",
            ErrorKind::Provider => "❌",
            ErrorKind::Io => "❌",
            ErrorKind::Persistence => "⚠️",
        }
    }

    fn title(&self) -> Option<&'static str> {
        match self {
            ErrorKind::Traversal | ErrorKind::BlockedCommand => Some("Security error"),
            ErrorKind::PermissionDenied => Some("Permission denied"),
            ErrorKind::Provider => Some("Error communicating with AI"),
            _ => None,
        }
    }
}

/// A failure ready to be shown to the operator
#[derive(Debug, Clone)]
pub struct AgentError {
    pub kind: ErrorKind,
    pub message: String,
    pub suggestions: Vec<String>,
    pub technical_details: Option<String>,
}

impl AgentError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            suggestions: Vec::new(),
            technical_details: None,
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Format, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn traversal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Traversal, message)
    }

    pub fn blocked_command(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BlockedCommand, message)
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Persistence, message)
    }

    /// Wrap an OS error, prefixing it with what was being attempted
    pub fn io(context: impl fmt::Display, error: &io::Error) -> Self {
        let kind = match error.kind() {
            io::ErrorKind::NotFound => ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::Io,
        };
        Self::new(kind, format!("{}: {}", context, error))
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions.extend(suggestions);
        self
    }

    pub fn with_technical_details(mut self, details: impl Into<String>) -> Self {
        self.technical_details = Some(details.into());
        self
    }

    pub fn is_security(&self) -> bool {
        matches!(self.kind, ErrorKind::Traversal | ErrorKind::BlockedCommand)
    }

    /// Plain text rendering shown for directive results and failed turns
    pub fn render(&self) -> String {
        let mut out = match self.kind.title() {
            Some(title) => format!("{} {}: {}", self.kind.icon(), title, self.message),
            None => format!("{} {}", self.kind.icon(), self.message),
        };

        if !self.suggestions.is_empty() {
            out.push_str("\n\n💡 Suggested solutions:");
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                out.push_str(&format!("\n  {}. {}", i + 1, suggestion));
            }
        }

        out
    }
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AgentError {}

/// Turn a backend failure into a provider error with actionable suggestions
pub fn enhance_error(error: &anyhow::Error) -> AgentError {
    let raw = error.to_string();
    let error_msg = raw.to_lowercase();
    let base = AgentError::new(ErrorKind::Provider, raw.clone()).with_technical_details(format!("{:#}", error));

    if error_msg.contains("api key") && (error_msg.contains("missing") || error_msg.contains("not set")) {
        return base.with_suggestions(vec![
            "Export GOOGLE_API_KEY before starting the agent".to_string(),
            "Get an API key from https://aistudio.google.com/app/apikey".to_string(),
        ]);
    }

    if error_msg.contains("api key not valid") || error_msg.contains("permission_denied") || error_msg.contains("unauthenticated") {
        return base.with_suggestions(vec![
            "Check that GOOGLE_API_KEY holds a valid key".to_string(),
            "Make sure the Generative Language API is enabled for the key".to_string(),
        ]);
    }

    if error_msg.contains("rate limit") || error_msg.contains("429") || error_msg.contains("resource_exhausted") {
        return base.with_suggestions(vec![
            "Wait a moment and try again".to_string(),
            "Check your quota in Google AI Studio".to_string(),
        ]);
    }

    if error_msg.contains("timed out") || error_msg.contains("timeout") {
        return base.with_suggestions(vec![
            "Try again, the model may be busy".to_string(),
            "Ask for a shorter answer or lower max_output_tokens".to_string(),
        ]);
    }

    if error_msg.contains("model") && error_msg.contains("not found") {
        return base.with_suggestions(vec![
            "Check GEMINI_MODEL_NAME or the --model flag".to_string(),
            "Try the default model: gemini-1.5-flash".to_string(),
        ]);
    }

    if error_msg.contains("connect") || error_msg.contains("dns") || error_msg.contains("network") {
        return base.with_suggestions(vec![
            "Check your internet connection".to_string(),
            "Check proxy or firewall settings".to_string(),
        ]);
    }

    base
}

pub fn display_warning(message: &str) {
    println!("{} {}", "⚠️".yellow(), message.yellow());
}

pub fn display_info(message: &str) {
    println!("{} {}", "💡".cyan(), message.dimmed());
}
