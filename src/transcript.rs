use crate::error_handling::AgentError;
use crate::logging::LogCategory;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Longest response excerpt kept per entry, in characters
pub const RESPONSE_EXCERPT_CHARS: usize = 500;

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// One prompt/response exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub timestamp: String,
    pub prompt: String,
    #[serde(rename = "response")]
    pub response_excerpt: String,
    #[serde(default)]
    pub files_created: Vec<String>,
}

impl TranscriptEntry {
    pub fn new(prompt: &str, response: &str, files: Vec<String>) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            prompt: prompt.to_string(),
            response_excerpt: excerpt(response),
            files_created: files,
        }
    }
}

/// First 500 characters of `response`, with `...` appended when cut
pub fn excerpt(response: &str) -> String {
    match response.char_indices().nth(RESPONSE_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &response[..cut]),
        None => response.to_string(),
    }
}

/// Append-only conversation log, rewritten in full on every append
pub struct TranscriptStore {
    path: PathBuf,
    entries: Vec<TranscriptEntry>,
}

impl TranscriptStore {
    /// Read the document at `path`. A missing file is an empty transcript; an
    /// unreadable one is logged and also starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("❌ Error loading history: {}", e);
                crate::log_error!(LogCategory::Transcript, format!("Transcript reset after load failure: {}", e));
                Vec::new()
            }
        };

        Self { path, entries }
    }

    fn read_entries(path: &Path) -> anyhow::Result<Vec<TranscriptEntry>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Record an exchange. The entry stays in memory even when the write fails.
    pub fn append(&mut self, prompt: &str, response: &str, files: Vec<String>) -> Result<(), AgentError> {
        self.entries.push(TranscriptEntry::new(prompt, response, files));
        self.save()
    }

    fn save(&self) -> Result<(), AgentError> {
        let content = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| AgentError::persistence(format!("Error saving history: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AgentError::persistence(format!("Error saving history: {}", e)))?;
        }

        fs::write(&self.path, content).map_err(|e| {
            crate::log_error!(LogCategory::Transcript, format!("Transcript write failed: {}", e));
            AgentError::persistence(format!("Error saving history: {}", e))
        })
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The last `limit` entries, oldest first; `0` means all of them
    pub fn recent(&self, limit: usize) -> &[TranscriptEntry] {
        if limit == 0 || limit >= self.entries.len() {
            &self.entries
        } else {
            &self.entries[self.entries.len() - limit..]
        }
    }

    pub fn show(&self, limit: usize) -> String {
        if self.entries.is_empty() {
            return "No conversation history available.".to_string();
        }

        self.recent(limit)
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let files = if entry.files_created.is_empty() {
                    "None".to_string()
                } else {
                    entry.files_created.join(", ")
                };
                format!(
                    "{}. [{}] 👤: {}\n   🤖: {}\n   📄 Files: {}",
                    i + 1,
                    entry.timestamp,
                    entry.prompt,
                    entry.response_excerpt,
                    files
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
