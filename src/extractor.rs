//! Pulls fenced code blocks out of a model reply and decides where each one
//! is written.
//!
//! Placement in organize mode walks [`PLACEMENT_RULES`] in order and takes the
//! first path a rule produces. Rules are plain functions of the block and its
//! ordinal, so they can be tested without a filesystem.

use crate::error_handling::{display_warning, AgentError};
use crate::logging::LogCategory;
use crate::prompter::Prompter;
use crate::workspace::{display_path, Workspace};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

const FENCE_PATTERN: &str = r"(?s)```([\w+#.-]*)[ \t]*\r?\n(.*?)```";
const PATH_HINT_PATTERN: &str = r"(?:<!--|//|#|/\*)[ \t]*(?:file|path):[ \t]*([^\n\r]*)";
const PACKAGE_TOOL_PATTERN: &str = r"\b(?:npm|npx|yarn|pnpm)\b";

fn fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(FENCE_PATTERN).expect("fence pattern compiles"))
}

fn path_hint() -> &'static Regex {
    static PATH_HINT: OnceLock<Regex> = OnceLock::new();
    PATH_HINT.get_or_init(|| Regex::new(PATH_HINT_PATTERN).expect("path hint pattern compiles"))
}

fn package_tool() -> &'static Regex {
    static PACKAGE_TOOL: OnceLock<Regex> = OnceLock::new();
    PACKAGE_TOOL.get_or_init(|| Regex::new(PACKAGE_TOOL_PATTERN).expect("package tool pattern compiles"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language_hint: String,
    pub content: String,
}

impl CodeBlock {
    pub fn new(language_hint: &str, content: &str) -> Self {
        Self {
            language_hint: language_hint.to_string(),
            content: content.to_string(),
        }
    }

    fn hint(&self) -> String {
        self.language_hint.to_lowercase()
    }
}

/// Every fenced block in `text`, in order of appearance
pub fn extract_blocks(text: &str) -> Vec<CodeBlock> {
    fence()
        .captures_iter(text)
        .map(|caps| CodeBlock {
            language_hint: caps.get(1).map_or("", |m| m.as_str()).to_string(),
            content: caps.get(2).map_or("", |m| m.as_str()).to_string(),
        })
        .collect()
}

/// File extension for a language hint; unknown or empty hints give `txt`
pub fn extension_for(hint: &str) -> &'static str {
    match hint.to_lowercase().as_str() {
        "python" | "py" => "py",
        "javascript" | "js" => "js",
        "jsx" => "jsx",
        "typescript" | "ts" => "ts",
        "tsx" => "tsx",
        "html" => "html",
        "css" => "css",
        "java" => "java",
        "cpp" | "c++" => "cpp",
        "c" => "c",
        "json" => "json",
        "bash" | "shell" | "sh" => "sh",
        "rust" | "rs" => "rs",
        "go" => "go",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "sql" => "sql",
        "markdown" | "md" => "md",
        _ => "txt",
    }
}

pub struct PlacementRule {
    pub name: &'static str,
    pub infer: fn(&CodeBlock, usize) -> Option<String>,
}

pub const PLACEMENT_RULES: &[PlacementRule] = &[
    PlacementRule { name: "path-comment", infer: path_comment },
    PlacementRule { name: "react-component", infer: react_component },
    PlacementRule { name: "package-manifest", infer: package_manifest },
    PlacementRule { name: "html-document", infer: html_document },
    PlacementRule { name: "stylesheet", infer: stylesheet },
    PlacementRule { name: "setup-script", infer: setup_script },
];

/// `// file: x`, `# path: x`, `/* file: x */`, `<!-- file: x -->`
fn path_comment(block: &CodeBlock, _ordinal: usize) -> Option<String> {
    let caps = path_hint().captures(&block.content)?;
    let raw = caps.get(1)?.as_str().trim();
    let value = raw
        .strip_suffix("-->")
        .or_else(|| raw.strip_suffix("*/"))
        .unwrap_or(raw)
        .trim();

    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn react_component(block: &CodeBlock, ordinal: usize) -> Option<String> {
    let is_js = matches!(block.hint().as_str(), "js" | "javascript" | "jsx");
    (is_js && block.content.contains("import React") && block.content.contains("export default"))
        .then(|| format!("components/Component{}.jsx", ordinal))
}

fn package_manifest(block: &CodeBlock, _ordinal: usize) -> Option<String> {
    (block.content.contains("package.json") && block.content.contains("\"dependencies\""))
        .then(|| "package.json".to_string())
}

fn html_document(block: &CodeBlock, _ordinal: usize) -> Option<String> {
    (block.hint() == "html" && block.content.contains("<html")).then(|| "public/index.html".to_string())
}

fn stylesheet(block: &CodeBlock, _ordinal: usize) -> Option<String> {
    (block.hint() == "css" && block.content.contains('{')).then(|| "styles/style.css".to_string())
}

fn setup_script(block: &CodeBlock, _ordinal: usize) -> Option<String> {
    let is_shell = matches!(block.hint().as_str(), "bash" | "sh" | "shell");
    (is_shell && package_tool().is_match(&block.content)).then(|| "scripts/setup.sh".to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementDecision {
    pub extension: &'static str,
    pub relative_path: Option<String>,
}

impl PlacementDecision {
    /// Path under the target root: the inferred one, or `file_<ordinal>.<ext>`
    pub fn file_name(&self, ordinal: usize) -> String {
        self.relative_path
            .clone()
            .unwrap_or_else(|| format!("file_{}.{}", ordinal, self.extension))
    }
}

/// Decide where block number `ordinal` (1-based) goes. `accept` vets an
/// inferred path; a rejected path falls back to positional naming.
pub fn decide<F>(block: &CodeBlock, ordinal: usize, organize: bool, accept: F) -> PlacementDecision
where
    F: Fn(&str) -> bool,
{
    let extension = extension_for(&block.language_hint);
    if !organize {
        return PlacementDecision { extension, relative_path: None };
    }

    let relative_path = PLACEMENT_RULES
        .iter()
        .find_map(|rule| (rule.infer)(block, ordinal).map(|path| (rule.name, path)))
        .and_then(|(rule, path)| {
            crate::log_debug!(LogCategory::Debug, format!("Block {} matched placement rule {}", ordinal, rule));
            (!Path::new(&path).is_absolute() && accept(path.as_str())).then_some(path)
        });

    PlacementDecision { extension, relative_path }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementOptions {
    pub target_root: String,
    pub organize: bool,
}

impl PlacementOptions {
    pub fn flat(target_root: impl Into<String>) -> Self {
        Self {
            target_root: target_root.into(),
            organize: false,
        }
    }
}

/// Ask where to save and whether to organize. A custom root that the safety
/// guard rejects falls back to the output root.
pub fn gather_choices(workspace: &Workspace, prompter: &mut dyn Prompter) -> PlacementOptions {
    let default_root = display_path(workspace.output_root());

    prompter.say("\n📂 Save generated code:");
    prompter.say(&format!("   1. Default directory ({}/)", default_root));
    prompter.say("   2. Custom directory");

    let target_root = if prompter.ask("Select option [1]: ", "1") == "2" {
        let custom = prompter.ask("Enter target directory: ", &default_root);
        match workspace.guard().check_path(&custom) {
            Ok(()) => custom,
            Err(reason) => {
                display_warning(&format!("Cannot save to '{}' ({}). Using {}/ instead.", custom, reason, default_root));
                default_root
            }
        }
    } else {
        default_root
    };

    prompter.say("\n🏗️  Project structure:");
    prompter.say("   y - Organize files in appropriate folders");
    prompter.say("   n - Save all files in the target directory");
    let organize = prompter.ask("Organize files? (y/n) [n]: ", "n").eq_ignore_ascii_case("y");

    PlacementOptions { target_root, organize }
}

/// Write each block with its trimmed content. One result per block, in
/// order; a failed write does not stop the remaining blocks.
pub fn place_blocks(workspace: &Workspace, blocks: &[CodeBlock], options: &PlacementOptions) -> Vec<Result<String, AgentError>> {
    let guard = workspace.guard();
    let root = Path::new(&options.target_root);

    blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            let ordinal = i + 1;
            let decision = decide(block, ordinal, options.organize, |candidate| guard.check_path(candidate).is_ok());
            let path = display_path(&root.join(decision.file_name(ordinal)));

            workspace
                .write_file(&path, block.content.trim())
                .map(|()| path.clone())
                .map_err(|e| AgentError::io(format!("Error writing file {}", path), &e))
        })
        .collect()
}
