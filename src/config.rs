use crate::logging::LogCategory;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OUTPUT_ROOT: &str = "generated";
pub const DEFAULT_HISTORY_FILE: &str = "conversation_history.json";

/// Sampling parameters sent with every generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_candidate_count")]
    pub candidate_count: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.95
}

fn default_top_k() -> u32 {
    40
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_candidate_count() -> u32 {
    1
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
            candidate_count: default_candidate_count(),
        }
    }
}

/// Settings file contents (`<config_dir>/genagent/config.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_ai_timeout")]
    pub ai_timeout: u64,

    #[serde(default)]
    pub generation: GenerationConfig,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_ai_timeout() -> u64 {
    120000 // 2 minutes
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base_url: default_api_base_url(),
            ai_timeout: default_ai_timeout(),
            generation: GenerationConfig::default(),
        }
    }
}

/// Values taken from command-line flags; `None` keeps the lower layer
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub output_root: Option<PathBuf>,
    pub history_file: Option<PathBuf>,
    pub debug: bool,
}

/// Effective runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base_url: String,
    pub ai_timeout: u64,
    pub debug: bool,
    pub output_root: PathBuf,
    pub history_file: PathBuf,
    pub generation: GenerationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_settings(FileSettings::default())
    }
}

impl Config {
    /// Defaults, then the settings file, then the environment (a `.env` file in
    /// the working directory fills unset variables), then `overrides`
    pub fn load(overrides: &Overrides) -> Self {
        let settings = Self::load_settings();
        let mut config = Self::from_settings(settings);
        Self::load_env_file(Path::new(".env"));
        config.apply_env(|key| std::env::var(key).ok());
        config.apply_overrides(overrides);
        config
    }

    fn from_settings(settings: FileSettings) -> Self {
        Self {
            api_key: None,
            model: settings.model,
            api_base_url: settings.api_base_url,
            ai_timeout: settings.ai_timeout,
            debug: false,
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            generation: settings.generation,
        }
    }

    /// Variables already set in the process are left alone
    fn load_env_file(path: &Path) {
        match dotenvy::from_path(path) {
            Ok(()) => {}
            Err(e) if e.not_found() => {}
            Err(e) => eprintln!("Warning: Could not load {}: {}", path.display(), e),
        }
    }

    fn load_settings() -> FileSettings {
        let Some(path) = Self::get_config_path() else {
            return FileSettings::default();
        };
        if !path.exists() {
            return FileSettings::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse_settings(&content).unwrap_or_else(|e| {
                eprintln!("Warning: Ignoring settings file {}: {}. Using defaults.", path.display(), e);
                FileSettings::default()
            }),
            Err(e) => {
                eprintln!("Warning: Could not read settings file {}: {}", path.display(), e);
                FileSettings::default()
            }
        }
    }

    fn parse_settings(content: &str) -> Result<FileSettings> {
        let settings: FileSettings = serde_json::from_str(content)?;
        Self::validate_settings(&settings)?;
        Ok(settings)
    }

    /// Apply environment variables through `lookup` (injectable for tests)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.api_key = lookup("GOOGLE_API_KEY")
            .or_else(|| lookup("GEMINI_API_KEY"))
            .filter(|key| !key.trim().is_empty());

        if let Some(model) = lookup("GEMINI_MODEL_NAME").filter(|m| !m.trim().is_empty()) {
            self.model = model.trim().to_string();
        }

        if let Some(debug) = lookup("DEBUG") {
            self.debug = debug.trim().eq_ignore_ascii_case("true");
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(model) = &overrides.model {
            self.model = model.clone();
        }
        if let Some(output_root) = &overrides.output_root {
            self.output_root = output_root.clone();
        }
        if let Some(history_file) = &overrides.history_file {
            self.history_file = history_file.clone();
        }
        if overrides.debug {
            self.debug = true;
        }
    }

    fn validate_settings(settings: &FileSettings) -> Result<()> {
        let generation = &settings.generation;

        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(anyhow!("temperature must be between 0.0 and 2.0"));
        }

        if generation.top_p <= 0.0 || generation.top_p > 1.0 {
            return Err(anyhow!("top_p must be in (0.0, 1.0]"));
        }

        if generation.top_k == 0 {
            return Err(anyhow!("top_k must be at least 1"));
        }

        if generation.max_output_tokens == 0 || generation.max_output_tokens > 65536 {
            return Err(anyhow!("max_output_tokens must be between 1 and 65536"));
        }

        if generation.candidate_count == 0 || generation.candidate_count > 8 {
            return Err(anyhow!("candidate_count must be between 1 and 8"));
        }

        if settings.ai_timeout < 1000 || settings.ai_timeout > 600000 {
            return Err(anyhow!("ai_timeout must be between 1000ms and 600000ms"));
        }

        if settings.model.trim().is_empty() {
            return Err(anyhow!("model name cannot be empty"));
        }

        if !settings.api_base_url.starts_with("http://") && !settings.api_base_url.starts_with("https://") {
            return Err(anyhow!("api_base_url must be a valid HTTP/HTTPS URL"));
        }

        Ok(())
    }

    /// Startup problems worth showing; none of them stop the agent
    pub fn environment_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.api_key.is_none() {
            issues.push("GOOGLE_API_KEY not found in environment variables".to_string());
        }
        issues
    }

    /// Log the effective configuration (the key itself is never written)
    pub fn log_summary(&self) {
        crate::log_info!(
            LogCategory::Configuration,
            format!(
                "Configuration loaded: model={}, api_key={}, output_root={}, history_file={}, debug={}",
                self.model,
                if self.api_key.is_some() { "set" } else { "missing" },
                self.output_root.display(),
                self.history_file.display(),
                self.debug
            )
        );
    }

    fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("genagent");
            path.push("config.json");
            path
        })
    }
}
