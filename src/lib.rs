//! Interactive agent that sends prompts to Gemini and writes the code blocks
//! it gets back to disk.

pub mod aliases;
pub mod config;
pub mod directive;
pub mod dispatcher;
pub mod error_handling;
pub mod executor;
pub mod extractor;
pub mod logging;
pub mod prompter;
pub mod providers;
pub mod safety;
pub mod scaffold;
pub mod session;
pub mod system_info;
pub mod transcript;
pub mod workspace;
