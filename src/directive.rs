use std::fmt;

/// Prefix that marks a line as a directive
pub const SENTINEL: char = '!';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveName {
    Help,
    History,
    Delete,
    DeleteAll,
    List,
    Dir,
    Read,
    Create,
    Init,
    Run,
    Info,
}

impl DirectiveName {
    pub fn from_word(word: &str) -> Option<Self> {
        let name = match word.to_lowercase().as_str() {
            "help" | "h" => DirectiveName::Help,
            "history" => DirectiveName::History,
            "delete" => DirectiveName::Delete,
            "deleteall" => DirectiveName::DeleteAll,
            "list" => DirectiveName::List,
            "dir" => DirectiveName::Dir,
            "read" => DirectiveName::Read,
            "create" => DirectiveName::Create,
            "init" => DirectiveName::Init,
            "run" => DirectiveName::Run,
            "info" => DirectiveName::Info,
            _ => return None,
        };
        Some(name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DirectiveName::Help => "help",
            DirectiveName::History => "history",
            DirectiveName::Delete => "delete",
            DirectiveName::DeleteAll => "deleteall",
            DirectiveName::List => "list",
            DirectiveName::Dir => "dir",
            DirectiveName::Read => "read",
            DirectiveName::Create => "create",
            DirectiveName::Init => "init",
            DirectiveName::Run => "run",
            DirectiveName::Info => "info",
        }
    }
}

impl fmt::Display for DirectiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", SENTINEL, self.as_str())
    }
}

/// A parsed directive line. `args` is everything after the name with leading
/// whitespace removed; trailing text is kept as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: DirectiveName,
    pub args: String,
}

impl Directive {
    /// `None` when the line is not a known directive
    pub fn parse(line: &str) -> Option<Self> {
        let body = line.trim_start().strip_prefix(SENTINEL)?;
        let name_end = body.find(char::is_whitespace).unwrap_or(body.len());
        let (word, rest) = body.split_at(name_end);

        let name = DirectiveName::from_word(word)?;
        Some(Self {
            name,
            args: rest.trim_start().to_string(),
        })
    }

    /// Arguments with surrounding whitespace removed
    pub fn arg(&self) -> &str {
        self.args.trim()
    }
}

pub const HELP_TEXT: &str = "Available commands:
📁 File Management:
  !list (or list) - List all generated files
  !delete <filename> (or delete, rm, remove) - Delete a file
  !deleteall (or deleteall, clean, purge) - Delete all generated files
  !read <filename> (or read, cat, show, view) - Read a file's contents
  !create <filename>:<content> (or create, write, touch) - Create a custom file
  !dir [path] (or dir, ls) - List files in a directory

🏗️ Project Management:
  !init <project_type> [target_dir] [--force] (or init, new, make, setup) - Initialize project structure
  Types: nextjs, react

🔧 System Commands:
  !run <command> (or run, execute) - Run a shell command
  !info (or info, system) - Show system information

📝 History:
  !history [limit] (or history) - Show conversation history (0 shows everything)

❓ Help:
  !help (or help, !h) - Show this help message

💬 AI Interaction:
  Just type your question or request to interact with the AI

Type 'exit' to quit the agent";
