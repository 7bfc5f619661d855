use std::io;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Text shown for `!run`
    pub fn describe(&self) -> String {
        if self.success() {
            if self.stdout.trim().is_empty() {
                "✅ Command completed with no output.".to_string()
            } else {
                self.stdout.clone()
            }
        } else {
            format!("Error (exit code {}):\n{}", self.exit_code.unwrap_or(-1), self.stderr)
        }
    }
}

/// Launches shell commands and waits for them
pub trait ProcessRunner {
    fn run(&self, command: &str, working_dir: &Path) -> io::Result<ProcessOutput>;
}

/// Runs commands through the platform shell (`sh -c`, or `cmd /C` on Windows)
#[derive(Debug, Default)]
pub struct ShellRunner;

impl ProcessRunner for ShellRunner {
    fn run(&self, command: &str, working_dir: &Path) -> io::Result<ProcessOutput> {
        let output = if cfg!(target_os = "windows") {
            Command::new("cmd").args(["/C", command]).current_dir(working_dir).output()?
        } else {
            Command::new("sh").args(["-c", command]).current_dir(working_dir).output()?
        };

        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}
