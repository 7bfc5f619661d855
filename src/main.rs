use clap::Parser;
use colored::*;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use genagent::config::{Config, Overrides};
use genagent::dispatcher::Dispatcher;
use genagent::error_handling::display_info;
use genagent::executor::ShellRunner;
use genagent::logging::{get_logger, init_logger, LogCategory};
use genagent::prompter::{read_line_lossy, StdinPrompter};
use genagent::providers::GeminiProvider;
use genagent::session::{Session, Turn};
use genagent::transcript::TranscriptStore;
use genagent::workspace::Workspace;

#[derive(Parser)]
#[command(name = "genagent")]
#[command(version)]
#[command(about = "🤖 Gemini AI Agent: generate and manage code from your terminal", long_about = None)]
struct Cli {
    /// Gemini model to use (overrides GEMINI_MODEL_NAME)
    #[arg(long)]
    model: Option<String>,

    /// Directory for generated files
    #[arg(long, value_name = "DIR")]
    output_root: Option<PathBuf>,

    /// Where the conversation transcript is stored
    #[arg(long, value_name = "FILE")]
    history_file: Option<PathBuf>,

    /// Write debug entries to the log and echo them to stderr
    #[arg(long)]
    debug: bool,
}

fn display_welcome() {
    println!();
    println!("{}", "🤖 Gemini AI Agent 🤖".bold().cyan());
    println!("-----------------------");
    println!("This agent helps you generate and manage code using Google's Gemini AI.");
    println!();
    println!("Key Features:");
    println!("• Create code with AI assistance");
    println!("• Save code with proper file extensions");
    println!("• Manage files (create, read, delete)");
    println!("• Initialize project structures");
    println!("• Execute commands");
    println!("• Track conversation history");
    println!();
    println!("Type '{}' for a list of available commands.", "help".green());
    println!("-----------------------");
    println!();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&Overrides {
        model: cli.model,
        output_root: cli.output_root,
        history_file: cli.history_file,
        debug: cli.debug,
    });

    if let Err(e) = init_logger(config.debug) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    let mut debug_log = None;
    if let Ok(logger) = get_logger() {
        if let Ok(logger_guard) = logger.lock() {
            let _ = logger_guard.log_startup(env!("CARGO_PKG_VERSION"), &config.model);
            if logger_guard.is_debug_mode() {
                debug_log = Some(logger_guard.get_current_log_path().clone());
            }
        }
    }
    config.log_summary();

    display_welcome();
    if let Some(path) = debug_log {
        display_info(&format!("Debug log: {}", path.display()));
        println!();
    }

    let root = std::env::current_dir()?;
    let workspace = Workspace::new(&root, &config.output_root);

    let mut issues = config.environment_issues();
    if let Err(e) = workspace.ensure_output_root() {
        issues.push(e.message);
    }
    if !issues.is_empty() {
        println!("{}", "⚠️ Environment Issues:".yellow());
        for issue in &issues {
            println!("  ⚠️ {}", issue);
            genagent::log_warning!(LogCategory::Configuration, issue);
        }
        println!();
    }

    let transcript = TranscriptStore::load(workspace.resolve(&config.history_file));
    let dispatcher = Dispatcher::new(workspace, Box::new(ShellRunner), Box::new(StdinPrompter));
    let backend = GeminiProvider::from_config(&config);

    let mut session = Session::new(dispatcher, Box::new(backend), transcript, config.generation.clone());
    if !io::stdout().is_terminal() {
        session = session.without_spinner();
    }

    let stdin = io::stdin();
    loop {
        print!("👤 > ");
        io::stdout().flush()?;

        let Some(line) = read_line_lossy(&mut stdin.lock())? else {
            println!();
            println!("Goodbye! 👋");
            break;
        };

        if let Turn::Exit = session.handle_line(&line).await {
            println!("Goodbye! 👋");
            break;
        }
    }

    Ok(())
}
