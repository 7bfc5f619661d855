//! Project templates for `!init`.
//!
//! A [`ScaffoldPlan`] is built without touching the disk and then applied
//! against a [`Workspace`]. The interactive and argument forms of `!init`
//! only differ in how they arrive at a plan.

use crate::error_handling::AgentError;
use crate::prompter::Prompter;
use crate::workspace::{display_path, Workspace};
use std::fmt;
use std::fs;

pub const SUPPORTED_TYPES: &str = "nextjs, react";

const NEXTJS_PACKAGE_JSON: &str = r#"{
  "name": "nextjs-app",
  "version": "0.1.0",
  "private": true,
  "scripts": {
    "dev": "next dev",
    "build": "next build",
    "start": "next start"
  },
  "dependencies": {
    "next": "latest",
    "react": "latest",
    "react-dom": "latest"
  }
}"#;

const REACT_PACKAGE_JSON: &str = r#"{
  "name": "react-app",
  "version": "0.1.0",
  "private": true,
  "dependencies": {
    "react": "^18.2.0",
    "react-dom": "^18.2.0"
  },
  "scripts": {
    "start": "react-scripts start",
    "build": "react-scripts build"
  }
}"#;

const REACT_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>React App</title>
</head>
<body>
  <div id="root"></div>
</body>
</html>"#;

const REACT_INDEX_JS: &str = r#"import React from "react";
import ReactDOM from "react-dom";
import App from "./App";

ReactDOM.render(
  <React.StrictMode>
    <App />
  </React.StrictMode>,
  document.getElementById("root")
);"#;

const REACT_APP_JS: &str = r#"import React from "react";

function App() {
  return (
    <div className="App">
      <h1>Hello React</h1>
    </div>
  );
}

export default App;"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectTemplate {
    NextJs,
    React,
}

impl ProjectTemplate {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "nextjs" => Some(ProjectTemplate::NextJs),
            "react" => Some(ProjectTemplate::React),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ProjectTemplate::NextJs => "nextjs",
            ProjectTemplate::React => "react",
        }
    }

    pub fn directories(&self) -> &'static [&'static str] {
        match self {
            ProjectTemplate::NextJs => &["pages", "pages/api", "public", "styles", "components"],
            ProjectTemplate::React => &["public", "src", "src/components", "src/styles"],
        }
    }

    pub fn files(&self) -> Vec<(&'static str, &'static str)> {
        match self {
            ProjectTemplate::NextJs => vec![
                (
                    "pages/index.js",
                    "export default function Home() {\n  return <div>Hello Next.js</div>;\n}",
                ),
                (
                    "pages/_app.js",
                    "import '../styles/globals.css';\n\nexport default function MyApp({ Component, pageProps }) {\n  return <Component {...pageProps} />;\n}",
                ),
                (
                    "styles/globals.css",
                    "html, body {\n  padding: 0;\n  margin: 0;\n  font-family: -apple-system, sans-serif;\n}",
                ),
                ("package.json", NEXTJS_PACKAGE_JSON),
            ],
            ProjectTemplate::React => vec![
                ("public/index.html", REACT_INDEX_HTML),
                ("src/index.js", REACT_INDEX_JS),
                ("src/App.js", REACT_APP_JS),
                ("package.json", REACT_PACKAGE_JSON),
            ],
        }
    }

    fn run_command(&self) -> &'static str {
        match self {
            ProjectTemplate::NextJs => "npm run dev",
            ProjectTemplate::React => "npm start",
        }
    }
}

impl fmt::Display for ProjectTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectTemplate::NextJs => write!(f, "Next.js"),
            ProjectTemplate::React => write!(f, "React"),
        }
    }
}

/// Everything `!init` will create, relative to `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldPlan {
    pub template: ProjectTemplate,
    pub target: String,
    pub directories: Vec<String>,
    pub files: Vec<(String, String)>,
}

impl ScaffoldPlan {
    pub fn new(template: ProjectTemplate, target: &str) -> Self {
        Self {
            template,
            target: target.to_string(),
            directories: template.directories().iter().map(|d| d.to_string()).collect(),
            files: template
                .files()
                .into_iter()
                .map(|(path, content)| (path.to_string(), content.to_string()))
                .collect(),
        }
    }

    /// Create the tree. Existing files with the same names are overwritten;
    /// anything else already in the target is left alone.
    pub fn apply(&self, workspace: &Workspace) -> Result<String, AgentError> {
        let root = workspace.resolve(&self.target);
        let mut report = vec![format!("🚀 Initializing {} project in '{}'...", self.template.key(), self.target)];

        fs::create_dir_all(&root).map_err(|e| AgentError::io(format!("Error creating {}", self.target), &e))?;

        for dir in &self.directories {
            fs::create_dir_all(root.join(dir)).map_err(|e| AgentError::io(format!("Error creating {}", dir), &e))?;
            report.push(format!("  📁 Created directory: {}", dir));
        }

        for (path, content) in &self.files {
            let full_path = root.join(path);
            workspace
                .write_file(&full_path, content)
                .map_err(|e| AgentError::io(format!("Error writing {}", display_path(&full_path)), &e))?;
            report.push(format!("  📄 Created file: {}", path));
        }

        report.push(String::new());
        report.push(format!(
            "✅ {} project created successfully in '{}'.\n\nTo run the project:\n  cd {}\n  npm install\n  {}",
            self.template,
            self.target,
            self.target,
            self.template.run_command()
        ));

        Ok(report.join("\n"))
    }
}

/// `!init` in argument form: `<type> [dir] [--force|-f]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitArgs {
    pub project_type: String,
    pub target: Option<String>,
    pub force: bool,
}

impl InitArgs {
    pub fn parse(args: &str) -> Option<Self> {
        let mut force = false;
        let mut positional = Vec::new();

        for token in args.split_whitespace() {
            match token {
                "--force" | "-f" => force = true,
                other => positional.push(other),
            }
        }

        let (project_type, rest) = positional.split_first()?;
        Some(Self {
            project_type: project_type.to_string(),
            target: if rest.is_empty() { None } else { Some(rest.join(" ")) },
            force,
        })
    }
}

fn default_target(workspace: &Workspace) -> String {
    display_path(&workspace.output_root().join("project"))
}

fn check_target(workspace: &Workspace, target: &str) -> Result<(), AgentError> {
    workspace
        .guard()
        .check_path(target)
        .map_err(|reason| AgentError::traversal(format!("Invalid project directory: {}", target)).with_technical_details(reason.to_string()))
}

/// Run `!init`. Empty `args` starts the interactive sequence.
pub fn init_project(workspace: &Workspace, prompter: &mut dyn Prompter, args: &str) -> Result<String, AgentError> {
    if args.trim().is_empty() {
        return init_interactive(workspace, prompter);
    }

    let Some(request) = InitArgs::parse(args) else {
        return Err(AgentError::format("Invalid format. Use: !init <project_type> [target_dir] [--force]"));
    };

    let template = ProjectTemplate::from_name(&request.project_type).ok_or_else(|| {
        AgentError::format(format!(
            "Unknown project type: {}. Supported types: {}",
            request.project_type, SUPPORTED_TYPES
        ))
    })?;

    let target = match request.target {
        Some(target) => {
            check_target(workspace, &target)?;
            target
        }
        None => default_target(workspace),
    };

    if workspace.is_non_empty_dir(&target) && !request.force {
        return Err(AgentError::format(format!(
            "Directory '{}' already exists and is not empty. Re-run with --force to overwrite.",
            target
        )));
    }

    ScaffoldPlan::new(template, &target).apply(workspace)
}

fn init_interactive(workspace: &Workspace, prompter: &mut dyn Prompter) -> Result<String, AgentError> {
    prompter.say("\n🏗️  Initialize new project:");
    prompter.say("   1. Next.js project");
    prompter.say("   2. React project");
    prompter.say("   3. Cancel");

    let template = match prompter.ask("Select project type [3]: ", "3").as_str() {
        "1" => ProjectTemplate::NextJs,
        "2" => ProjectTemplate::React,
        _ => return Ok("Project initialization canceled.".to_string()),
    };

    let fallback = default_target(workspace);
    let target = prompter.ask(&format!("\nProject directory [{}]: ", fallback), &fallback);
    if target != fallback {
        check_target(workspace, &target)?;
    }

    if workspace.is_non_empty_dir(&target) {
        let answer = prompter.ask(
            &format!("\n⚠️ Directory '{}' already exists and is not empty. Overwrite? (y/n) [n]: ", target),
            "n",
        );
        if !answer.eq_ignore_ascii_case("y") {
            return Ok("❌ Project initialization canceled.".to_string());
        }
    }

    ScaffoldPlan::new(template, &target).apply(workspace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::ErrorKind;
    use crate::prompter::ScriptedPrompter;
    use tempfile::TempDir;

    fn workspace() -> (Workspace, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        (Workspace::new(temp_dir.path(), "generated"), temp_dir)
    }

    #[test]
    fn test_parse_init_args() {
        let args = InitArgs::parse("react web --force").unwrap();
        assert_eq!(args.project_type, "react");
        assert_eq!(args.target.as_deref(), Some("web"));
        assert!(args.force);

        let args = InitArgs::parse("-f nextjs").unwrap();
        assert_eq!(args.project_type, "nextjs");
        assert_eq!(args.target, None);
        assert!(args.force);

        assert!(InitArgs::parse("--force").is_none());
    }

    #[test]
    fn test_plan_is_pure() {
        let plan = ScaffoldPlan::new(ProjectTemplate::NextJs, "site");
        assert_eq!(plan.directories, vec!["pages", "pages/api", "public", "styles", "components"]);
        let names: Vec<_> = plan.files.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(names, vec!["pages/index.js", "pages/_app.js", "styles/globals.css", "package.json"]);
    }

    #[test]
    fn test_init_nextjs_default_target() {
        let (ws, dir) = workspace();
        let mut prompter = ScriptedPrompter::default();

        let report = init_project(&ws, &mut prompter, "nextjs").unwrap();
        assert!(report.contains("  📁 Created directory: pages/api"));
        assert!(report.contains("  📄 Created file: package.json"));
        assert!(report.contains("✅ Next.js project created successfully in 'generated/project'."));
        assert!(report.ends_with("npm run dev"));

        let root = dir.path().join("generated/project");
        assert!(root.join("components").is_dir());
        let package = fs::read_to_string(root.join("package.json")).unwrap();
        assert!(package.contains("\"next\": \"latest\""));
        assert!(prompter.asked.is_empty());
    }

    #[test]
    fn test_init_react_custom_target() {
        let (ws, dir) = workspace();
        let report = init_project(&ws, &mut ScriptedPrompter::default(), "React web").unwrap();
        assert!(report.ends_with("npm start"));
        assert!(dir.path().join("web/src/App.js").is_file());
        assert!(dir.path().join("web/src/styles").is_dir());
    }

    #[test]
    fn test_unknown_type() {
        let (ws, _dir) = workspace();
        let err = init_project(&ws, &mut ScriptedPrompter::default(), "vue").unwrap_err();
        assert_eq!(err.render(), "❌ Unknown project type: vue. Supported types: nextjs, react");
    }

    #[test]
    fn test_non_empty_target_needs_force() {
        let (ws, dir) = workspace();
        ws.write_file("web/keep.txt", "mine").unwrap();

        let err = init_project(&ws, &mut ScriptedPrompter::default(), "react web").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Format);
        assert!(!dir.path().join("web/package.json").exists());

        init_project(&ws, &mut ScriptedPrompter::default(), "react web --force").unwrap();
        assert!(dir.path().join("web/package.json").exists());
        assert!(dir.path().join("web/keep.txt").exists());
    }

    #[test]
    fn test_target_outside_root_rejected() {
        let (ws, _dir) = workspace();
        let err = init_project(&ws, &mut ScriptedPrompter::default(), "react ../elsewhere").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Traversal);
    }

    #[test]
    fn test_default_target_under_absolute_output_root() {
        let work = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let ws = Workspace::new(work.path(), out.path());

        init_project(&ws, &mut ScriptedPrompter::default(), "react").unwrap();
        assert!(out.path().join("project/src/App.js").is_file());

        // Accepting the default directory is not a security error; the
        // existing tree then triggers the overwrite question
        let mut prompter = ScriptedPrompter::new(["1", "", "n"]);
        assert_eq!(init_project(&ws, &mut prompter, "").unwrap(), "❌ Project initialization canceled.");
        assert_eq!(prompter.asked.len(), 3);
    }

    #[test]
    fn test_interactive_flow() {
        let (ws, dir) = workspace();

        let mut prompter = ScriptedPrompter::new(["2", "app"]);
        let report = init_project(&ws, &mut prompter, "").unwrap();
        assert!(report.contains("React project created"));
        assert!(dir.path().join("app/public/index.html").is_file());

        // Existing tree, operator declines
        let mut prompter = ScriptedPrompter::new(["1", "app", "n"]);
        assert_eq!(init_project(&ws, &mut prompter, "").unwrap(), "❌ Project initialization canceled.");
        assert!(!dir.path().join("app/pages").exists());

        let mut prompter = ScriptedPrompter::new(["3"]);
        assert_eq!(init_project(&ws, &mut prompter, "").unwrap(), "Project initialization canceled.");
    }
}
