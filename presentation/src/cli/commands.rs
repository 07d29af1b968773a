//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for toolhost
#[derive(Parser, Debug)]
#[command(name = "toolhost")]
#[command(author, version, about = "Chat with a language model that can call MCP tools")]
#[command(long_about = r#"
toolhost starts the configured MCP tool servers, then runs a conversation in
which the model may call their tools. The transcript is saved after every
message and resumed on the next start.

Configuration files are loaded from (in priority order):
1. TOOLHOST_* environment variables
2. --servers <path>    JSON file {"<name>": {"command", "args", "env"}}
3. --config <path>     Explicit config file
4. ./toolhost.toml     Project-level config
5. ~/.config/toolhost/config.toml   Global config

Example:
  toolhost --servers config.json
  toolhost -c storybook "Which button variants exist?"
"#)]
pub struct Cli {
    /// Message to send; without it an interactive session starts
    pub message: Option<String>,

    /// Conversation name (overrides host.conversation)
    #[arg(short, long, value_name = "NAME")]
    pub conversation: Option<String>,

    /// Model to use (overrides inference.model)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Maximum tool rounds per turn (overrides host.max_tool_rounds)
    #[arg(long, value_name = "N")]
    pub max_rounds: Option<usize>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// JSON file describing the tool servers
    #[arg(long, value_name = "PATH")]
    pub servers: Option<PathBuf>,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Start the servers, print their tools and exit
    #[arg(long)]
    pub list_tools: bool,
}
