//! Path and command checks run before any directive touches the filesystem
//! or the shell.
//!
//! The command check is a denylist, not a sandbox. Shell operators and
//! recursive force deletes are matched anywhere in the raw text. Program names
//! are matched as unquoted shell words, so `git commit -m "fix curl usage"`
//! passes while `curl example.com` does not. Anything that hides the program
//! name from word splitting (`sh -c 'wget ...'`, variables, aliases) gets
//! through; the guard only catches the obvious spellings.

use crate::logging::get_logger;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Fragments rejected wherever they appear in a command
const BLOCKED_FRAGMENTS: &[&str] = &["rm -rf", "rm -fr", ">>", ">", "|"];

/// Programs rejected when they appear as an unquoted word
const BLOCKED_PROGRAMS: &[&str] = &["dd", "format", "mkfs", "wget", "curl"];

/// Why the guard refused a path or command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    ParentReference,
    HomeShorthand,
    OutsideRoot,
    BlockedFragment(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::ParentReference => write!(f, "path escapes the working directory via '..'"),
            Rejection::HomeShorthand => write!(f, "home-directory shorthand '~' is not allowed"),
            Rejection::OutsideRoot => write!(f, "absolute path is outside the working directory"),
            Rejection::BlockedFragment(fragment) => write!(f, "contains blocked fragment '{}'", fragment),
        }
    }
}

/// Outcome of a safety check
pub type SafetyVerdict = Result<(), Rejection>;

pub struct SafetyGuard {
    root: PathBuf,
}

impl SafetyGuard {
    /// `root` is the working directory paths must stay inside
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = root
            .canonicalize()
            .unwrap_or_else(|_| std::env::current_dir().map(|cwd| cwd.join(&root)).unwrap_or(root));
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn check_path(&self, candidate: &str) -> SafetyVerdict {
        let verdict = self.evaluate_path(candidate);
        if let Err(reason) = &verdict {
            record_rejection("path", reason);
        }
        verdict
    }

    fn evaluate_path(&self, candidate: &str) -> SafetyVerdict {
        let normalized = normalize(Path::new(candidate));

        for component in normalized.components() {
            match component {
                Component::ParentDir => return Err(Rejection::ParentReference),
                Component::Normal(part) if part.to_string_lossy().starts_with('~') => {
                    return Err(Rejection::HomeShorthand)
                }
                _ => {}
            }
        }

        if normalized.is_absolute() {
            let resolved = resolve_through_existing(&normalized);
            if !resolved.starts_with(&self.root) {
                return Err(Rejection::OutsideRoot);
            }
        }

        Ok(())
    }

    pub fn check_command(&self, command: &str) -> SafetyVerdict {
        let verdict = evaluate_command(command);
        if let Err(reason) = &verdict {
            record_rejection("command", reason);
        }
        verdict
    }
}

fn record_rejection(subject: &str, reason: &Rejection) {
    if let Ok(logger) = get_logger() {
        if let Ok(logger_guard) = logger.lock() {
            let _ = logger_guard.log_safety_rejection(subject, &reason.to_string());
        }
    }
}

/// Collapse `.` and `..` without touching the filesystem. Leading `..`
/// segments that cannot be collapsed are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    parts.iter().collect()
}

/// Canonicalize the longest existing prefix of `path` and re-append the rest
fn resolve_through_existing(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut missing = Vec::new();

    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut resolved = canonical;
            for part in missing.iter().rev() {
                resolved.push(part);
            }
            return resolved;
        }

        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

fn evaluate_command(command: &str) -> SafetyVerdict {
    for fragment in BLOCKED_FRAGMENTS {
        if command.contains(fragment) {
            return Err(Rejection::BlockedFragment(fragment.to_string()));
        }
    }

    let words = unquoted_words(command);

    for word in &words {
        let program = word.rsplit('/').next().unwrap_or(word);
        for blocked in BLOCKED_PROGRAMS {
            if program == *blocked || program.starts_with(&format!("{}.", blocked)) {
                return Err(Rejection::BlockedFragment(blocked.to_string()));
            }
        }
    }

    if has_recursive_force_rm(&words) {
        return Err(Rejection::BlockedFragment("rm -rf".to_string()));
    }

    Ok(())
}

/// Shell words outside single or double quotes. Command separators and
/// substitution markers split words.
fn unquoted_words(command: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in command.chars() {
        if let Some(q) = quote {
            if ch == q && !escaped {
                quote = None;
            }
            escaped = ch == '\\' && q == '"' && !escaped;
            continue;
        }

        match ch {
            '\'' | '"' if !escaped => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
                quote = Some(ch);
            }
            c if c.is_whitespace() || ";&()`$<".contains(c) => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
        escaped = ch == '\\' && !escaped;
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}

/// `rm` followed by flags that together ask for recursive and forced removal
fn has_recursive_force_rm(words: &[String]) -> bool {
    let mut iter = words.iter().peekable();

    while let Some(word) = iter.next() {
        if word.rsplit('/').next() != Some("rm") {
            continue;
        }

        let mut recursive = false;
        let mut force = false;
        while let Some(flag) = iter.peek() {
            if !flag.starts_with('-') {
                break;
            }
            match flag.as_str() {
                "--recursive" => recursive = true,
                "--force" => force = true,
                short if !short.starts_with("--") => {
                    recursive |= short.contains('r') || short.contains('R');
                    force |= short.contains('f');
                }
                _ => {}
            }
            iter.next();
        }

        if recursive && force {
            return true;
        }
    }

    false
}
