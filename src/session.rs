use crate::aliases;
use crate::config::GenerationConfig;
use crate::dispatcher::Dispatcher;
use crate::error_handling::{display_warning, enhance_error, AgentError};
use crate::extractor::{extract_blocks, place_blocks};
use crate::logging::LogCategory;
use crate::providers::GenerativeBackend;
use crate::transcript::TranscriptStore;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// What one input line turned into
#[derive(Debug)]
pub enum Turn {
    /// Blank line
    Skipped,
    /// `exit` was typed
    Exit,
    /// A directive ran; carries its display text
    Directive(String),
    /// The model replied; carries the files written from it
    Reply { text: String, files: Vec<String> },
    /// The model call failed
    Failed(AgentError),
}

/// One interactive session: a dispatcher, a backend and the transcript
pub struct Session {
    dispatcher: Dispatcher,
    backend: Box<dyn GenerativeBackend>,
    transcript: TranscriptStore,
    generation: GenerationConfig,
    show_spinner: bool,
}

impl Session {
    pub fn new(
        dispatcher: Dispatcher,
        backend: Box<dyn GenerativeBackend>,
        transcript: TranscriptStore,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            dispatcher,
            backend,
            transcript,
            generation,
            show_spinner: true,
        }
    }

    /// Turn the "Thinking..." spinner off (for piped output and tests)
    pub fn without_spinner(mut self) -> Self {
        self.show_spinner = false;
        self
    }

    pub fn transcript(&self) -> &TranscriptStore {
        &self.transcript
    }

    pub async fn handle_line(&mut self, line: &str) -> Turn {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Turn::Skipped;
        }
        if trimmed.eq_ignore_ascii_case("exit") {
            return Turn::Exit;
        }

        let resolved = aliases::resolve(line);
        if let Some(text) = self.dispatcher.dispatch(&resolved, &self.transcript) {
            println!("\n🤖 > {}", text);
            return Turn::Directive(text);
        }

        self.ask_model(line).await
    }

    async fn ask_model(&mut self, prompt: &str) -> Turn {
        let spinner = self.show_spinner.then(thinking_spinner);
        let result = self.backend.generate(prompt, &self.generation).await;
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        match result {
            Ok(reply) => {
                println!("\n🤖 > {}", reply);
                let files = self.save_code_blocks(&reply);
                self.record(prompt, &reply, files.clone());
                Turn::Reply { text: reply, files }
            }
            Err(e) => {
                let enhanced = enhance_error(&e);
                println!("\n{}", failure_report(&enhanced));
                self.record(prompt, &format!("Error communicating with AI: {}", e), Vec::new());
                Turn::Failed(enhanced)
            }
        }
    }

    fn save_code_blocks(&mut self, reply: &str) -> Vec<String> {
        let blocks = extract_blocks(reply);
        if blocks.is_empty() {
            return Vec::new();
        }

        let options = self.dispatcher.gather_save_choices();
        let mut saved = Vec::new();
        for result in place_blocks(self.dispatcher.workspace(), &blocks, &options) {
            match result {
                Ok(path) => {
                    println!("💾 Saved: {}", path);
                    saved.push(path);
                }
                Err(e) => println!("{}", failure_report(&e)),
            }
        }

        crate::log_info!(LogCategory::Filesystem, format!("Saved {} of {} code blocks", saved.len(), blocks.len()));
        saved
    }

    fn record(&mut self, prompt: &str, response: &str, files: Vec<String>) {
        if let Err(e) = self.transcript.append(prompt, response, files) {
            display_warning(&e.message);
        }
    }
}

/// Operator-facing text for a failed turn or block write. Technical details
/// only reach the debug log.
fn failure_report(err: &AgentError) -> String {
    if let Some(details) = &err.technical_details {
        crate::log_debug!(LogCategory::Provider, format!("{}: {}", err.message, details));
    }
    err.render()
}

fn thinking_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈")
        .template("{spinner:.cyan} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message("Thinking...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
