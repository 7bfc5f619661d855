use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Read one line, without its line ending. Bytes that are not valid UTF-8
/// are replaced rather than rejected. `None` at end of input.
pub fn read_line_lossy<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }

    let line = String::from_utf8_lossy(&buf);
    Ok(Some(line.trim_end_matches(|c| c == '\n' || c == '\r').to_string()))
}

/// Source of operator answers for interactive choices
pub trait Prompter {
    /// Show `question` and return the trimmed answer, or `default` when the
    /// answer is empty or input has ended
    fn ask(&mut self, question: &str, default: &str) -> String;

    /// Print a line that belongs to the prompt sequence (menus, headings)
    fn say(&mut self, line: &str);
}

/// Reads answers from stdin
#[derive(Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&mut self, question: &str, default: &str) -> String {
        print!("{}", question);
        let _ = io::stdout().flush();

        match read_line_lossy(&mut io::stdin().lock()) {
            Ok(Some(input)) if !input.trim().is_empty() => input.trim().to_string(),
            _ => default.to_string(),
        }
    }

    fn say(&mut self, line: &str) {
        println!("{}", line);
    }
}

/// Replays canned answers in order; once they run out every question gets its
/// default. Questions are recorded for assertions.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, question: &str, default: &str) -> String {
        self.asked.push(question.to_string());
        match self.answers.pop_front() {
            Some(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
            _ => default.to_string(),
        }
    }

    fn say(&mut self, _line: &str) {}
}
