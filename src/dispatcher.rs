use crate::directive::{Directive, DirectiveName, HELP_TEXT};
use crate::error_handling::{AgentError, ErrorKind};
use crate::executor::ProcessRunner;
use crate::extractor::{self, PlacementOptions};
use crate::logging::LogCategory;
use crate::prompter::Prompter;
use crate::scaffold;
use crate::system_info::SystemInfo;
use crate::transcript::{TranscriptStore, DEFAULT_HISTORY_LIMIT};
use crate::workspace::Workspace;

/// Routes directive lines to their handlers
pub struct Dispatcher {
    workspace: Workspace,
    runner: Box<dyn ProcessRunner>,
    prompter: Box<dyn Prompter>,
}

impl Dispatcher {
    pub fn new(workspace: Workspace, runner: Box<dyn ProcessRunner>, prompter: Box<dyn Prompter>) -> Self {
        Self {
            workspace,
            runner,
            prompter,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Ask where generated code should be saved
    pub fn gather_save_choices(&mut self) -> PlacementOptions {
        extractor::gather_choices(&self.workspace, self.prompter.as_mut())
    }

    /// Display text for a directive line, or `None` when `line` is not a
    /// directive and should go to the model
    pub fn dispatch(&mut self, line: &str, transcript: &TranscriptStore) -> Option<String> {
        let directive = Directive::parse(line)?;
        crate::log_debug!(LogCategory::Debug, format!("Dispatching {}", directive.name));

        Some(match self.execute(&directive, transcript) {
            Ok(text) => text,
            Err(e) => e.render(),
        })
    }

    fn execute(&mut self, directive: &Directive, transcript: &TranscriptStore) -> Result<String, AgentError> {
        let arg = directive.arg();

        match directive.name {
            DirectiveName::Help => Ok(HELP_TEXT.to_string()),
            DirectiveName::History => {
                let limit = if arg.is_empty() {
                    DEFAULT_HISTORY_LIMIT
                } else {
                    arg.parse::<usize>()
                        .map_err(|_| AgentError::format("Invalid format. Use: !history <number>"))?
                };
                Ok(transcript.show(limit))
            }
            DirectiveName::Delete => self.workspace.delete_file(required(arg, "!delete <filename>")?),
            DirectiveName::DeleteAll => self.workspace.delete_all(),
            DirectiveName::List => self.workspace.list_output(),
            DirectiveName::Dir => self.workspace.list_dir(arg),
            DirectiveName::Read => self.workspace.read_file(required(arg, "!read <filename>")?),
            DirectiveName::Create => {
                let (path, content) = directive
                    .args
                    .split_once(':')
                    .filter(|(path, _)| !path.trim().is_empty())
                    .ok_or_else(|| AgentError::format("Invalid format. Use: !create filename:content"))?;
                self.workspace.create_file(path.trim(), content)
            }
            DirectiveName::Init => scaffold::init_project(&self.workspace, self.prompter.as_mut(), arg),
            DirectiveName::Run => self.run_command(required(arg, "!run <command>")?),
            DirectiveName::Info => Ok(SystemInfo::collect(self.workspace.root()).to_json()),
        }
    }

    fn run_command(&self, command: &str) -> Result<String, AgentError> {
        if let Err(reason) = self.workspace.guard().check_command(command) {
            return Err(AgentError::blocked_command("This command is not allowed for security reasons.")
                .with_technical_details(reason.to_string()));
        }

        crate::log_info!(LogCategory::System, "Running shell command");
        match self.runner.run(command, self.workspace.root()) {
            Ok(output) => Ok(output.describe()),
            Err(e) => Err(AgentError::new(ErrorKind::Io, format!("Failed to run command: {}", e))),
        }
    }
}

fn required<'a>(arg: &'a str, usage: &str) -> Result<&'a str, AgentError> {
    if arg.is_empty() {
        Err(AgentError::format(format!("Invalid format. Use: {}", usage)))
    } else {
        Ok(arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ProcessOutput;
    use crate::prompter::ScriptedPrompter;
    use std::fs;
    use std::io;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct RecordingRunner {
        commands: Arc<Mutex<Vec<String>>>,
    }

    impl ProcessRunner for RecordingRunner {
        fn run(&self, command: &str, _working_dir: &Path) -> io::Result<ProcessOutput> {
            self.commands.lock().unwrap().push(command.to_string());
            if command == "false" {
                return Ok(ProcessOutput {
                    stdout: String::new(),
                    stderr: "failed\n".to_string(),
                    exit_code: Some(1),
                });
            }
            if command == "missing-binary" {
                return Err(io::Error::new(io::ErrorKind::NotFound, "not found"));
            }
            Ok(ProcessOutput {
                stdout: format!("ran {}\n", command),
                stderr: String::new(),
                exit_code: Some(0),
            })
        }
    }

    struct Fixture {
        dispatcher: Dispatcher,
        transcript: TranscriptStore,
        commands: Arc<Mutex<Vec<String>>>,
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_answers(Vec::<String>::new())
        }

        fn with_answers(answers: Vec<impl Into<String>>) -> Self {
            let dir = TempDir::new().unwrap();
            let runner = RecordingRunner::default();
            let commands = runner.commands.clone();
            let dispatcher = Dispatcher::new(
                Workspace::new(dir.path(), "generated"),
                Box::new(runner),
                Box::new(ScriptedPrompter::new(answers)),
            );
            let transcript = TranscriptStore::load(dir.path().join("conversation_history.json"));
            Self { dispatcher, transcript, commands, dir }
        }

        fn run(&mut self, line: &str) -> Option<String> {
            self.dispatcher.dispatch(line, &self.transcript)
        }
    }

    #[test]
    fn test_non_directives_fall_through() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run("write me a haiku"), None);
        assert_eq!(fx.run("!bogus"), None);
    }

    #[test]
    fn test_help() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run("!help").unwrap(), HELP_TEXT);
        assert_eq!(fx.run("!H").unwrap(), HELP_TEXT);
    }

    #[test]
    fn test_create_then_read() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run("!create a/b.txt:hello").unwrap(), "✅ Created: a/b.txt");
        assert_eq!(fx.run("!read a/b.txt").unwrap(), "📄 Contents of a/b.txt:\n\nhello");
    }

    #[test]
    fn test_create_splits_on_first_colon() {
        let mut fx = Fixture::new();
        fx.run("!create notes.txt:time: 10:30").unwrap();
        let content = fs::read_to_string(fx.dir.path().join("generated/notes.txt")).unwrap();
        assert_eq!(content, "time: 10:30");
    }

    #[test]
    fn test_format_errors() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run("!create no-colon").unwrap(), "❌ Invalid format. Use: !create filename:content");
        assert_eq!(fx.run("!create").unwrap(), "❌ Invalid format. Use: !create filename:content");
        assert_eq!(fx.run("!history abc").unwrap(), "❌ Invalid format. Use: !history <number>");
        assert_eq!(fx.run("!history -1").unwrap(), "❌ Invalid format. Use: !history <number>");
        assert_eq!(fx.run("!delete").unwrap(), "❌ Invalid format. Use: !delete <filename>");
        assert_eq!(fx.run("!read   ").unwrap(), "❌ Invalid format. Use: !read <filename>");
        assert_eq!(fx.run("!run").unwrap(), "❌ Invalid format. Use: !run <command>");
    }

    #[test]
    fn test_history_limits() {
        let mut fx = Fixture::new();
        for i in 1..=15 {
            fx.transcript.append(&format!("prompt {}", i), "reply", vec![]).unwrap();
        }

        let shown = fx.run("!history").unwrap();
        assert_eq!(shown.matches("👤:").count(), 10);
        assert!(shown.starts_with("1. ["));
        assert!(shown.contains("👤: prompt 6\n"));
        assert!(!shown.contains("👤: prompt 5\n"));
        assert!(shown.contains("👤: prompt 15\n"));

        assert_eq!(fx.run("!history 0").unwrap().matches("👤:").count(), 15);
        assert_eq!(fx.run("!history 3").unwrap().matches("👤:").count(), 3);
    }

    #[test]
    fn test_traversal_rejected() {
        let mut fx = Fixture::new();
        for line in ["!read ../../etc/passwd", "!delete ~/secrets", "!create ../x.txt:boom"] {
            let out = fx.run(line).unwrap();
            assert!(out.starts_with("❌ Security error: Invalid file path"), "{}", out);
        }
        assert!(!fx.dir.path().parent().unwrap().join("x.txt").exists());
    }

    #[test]
    fn test_delete_and_deleteall() {
        let mut fx = Fixture::new();
        for name in ["a.txt", "b.txt", "c.txt"] {
            fx.run(&format!("!create {}:x", name)).unwrap();
        }
        fs::create_dir_all(fx.dir.path().join("generated/sub")).unwrap();

        assert_eq!(fx.run("!delete c.txt").unwrap(), "✅ Deleted: generated/c.txt");
        assert_eq!(fx.run("!delete c.txt").unwrap(), "❌ File not found: generated/c.txt");
        fx.run("!create c.txt:x").unwrap();

        assert_eq!(fx.run("!deleteall").unwrap(), "✅ Deleted 3 files: a.txt, b.txt, c.txt");
        assert!(fx.dir.path().join("generated/sub").is_dir());
    }

    #[test]
    fn test_list_is_idempotent() {
        let mut fx = Fixture::new();
        fx.run("!create one.py:print(1)").unwrap();
        let first = fx.run("!list").unwrap();
        assert_eq!(first, "1. one.py");
        assert_eq!(fx.run("!list").unwrap(), first);
    }

    #[test]
    fn test_dir_defaults_to_working_root() {
        let mut fx = Fixture::new();
        fx.run("!create notes.txt:abc").unwrap();
        assert!(fx.run("!dir").unwrap().contains("📁 generated/"));
        assert_eq!(fx.run("!dir generated").unwrap(), "📄 notes.txt (3 B)");
    }

    #[test]
    fn test_run_passes_guard_then_runner() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run("!run echo hi").unwrap(), "ran echo hi\n");
        assert_eq!(fx.run("!run false").unwrap(), "Error (exit code 1):\nfailed\n");
        assert_eq!(fx.run("!run missing-binary").unwrap(), "❌ Failed to run command: not found");

        let blocked = fx.run("!run curl http://example.com").unwrap();
        assert_eq!(blocked, "❌ Security error: This command is not allowed for security reasons.");
        assert!(fx.run("!run ls | sh").unwrap().contains("Security error"));

        let commands = fx.commands.lock().unwrap();
        assert_eq!(*commands, vec!["echo hi", "false", "missing-binary"]);
    }

    #[test]
    fn test_init_argument_and_interactive_forms() {
        let mut fx = Fixture::with_answers(vec!["1", "site"]);
        assert!(fx.run("!init react").unwrap().contains("React project created"));
        assert!(fx.dir.path().join("generated/project/src/index.js").exists());

        assert!(fx.run("!init").unwrap().contains("Next.js project created"));
        assert!(fx.dir.path().join("site/pages/_app.js").exists());

        assert_eq!(
            fx.run("!init angular").unwrap(),
            "❌ Unknown project type: angular. Supported types: nextjs, react"
        );
    }

    #[test]
    fn test_info_is_json() {
        let mut fx = Fixture::new();
        let info: serde_json::Value = serde_json::from_str(&fx.run("!info").unwrap()).unwrap();
        assert_eq!(info["architecture"], std::env::consts::ARCH);
    }
}
