//! REPL (Read-Eval-Print Loop) for interactive chat

use super::command::ReplCommand;
use crate::ConsoleFormatter;
use crate::ProgressReporter;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;
use toolhost_application::{
    InferenceProvider, RunConversationError, RunConversationInput, RunConversationOutput,
    RunConversationUseCase, TranscriptStore,
};

const HISTORY_TAIL: usize = 10;

/// Interactive chat REPL over one conversation
pub struct HostRepl<I: InferenceProvider + 'static, S: TranscriptStore + 'static> {
    use_case: RunConversationUseCase<I, S>,
    conversation: String,
    show_progress: bool,
    history_file: Option<PathBuf>,
}

impl<I: InferenceProvider + 'static, S: TranscriptStore + 'static> HostRepl<I, S> {
    pub fn new(use_case: RunConversationUseCase<I, S>, conversation: impl Into<String>) -> Self {
        Self {
            use_case,
            conversation: conversation.into(),
            show_progress: true,
            history_file: None,
        }
    }

    /// Set whether to show progress
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// File used for readline history
    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        self.history_file = path;
        self
    }

    pub fn use_case(&self) -> &RunConversationUseCase<I, S> {
        &self.use_case
    }

    /// Run one turn with the configured progress display
    pub async fn send(&self, message: &str) -> Result<RunConversationOutput, RunConversationError> {
        let input = RunConversationInput::new(self.conversation.clone(), message);
        if self.show_progress {
            let progress = ProgressReporter::new();
            self.use_case.execute_with_progress(input, &progress).await
        } else {
            self.use_case.execute(input).await
        }
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        if let Some(path) = &self.history_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            let readline = rl.readline(">>> ");

            match readline {
                Ok(line) => {
                    let Some(command) = ReplCommand::parse(&line) else {
                        continue;
                    };
                    let _ = rl.add_history_entry(line.trim());

                    if self.handle(command).await {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(path) = &self.history_file {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        let registry = self.use_case.registry();
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│               toolhost - Chat               │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Model:        {}", self.use_case.model());
        println!("Conversation: {}", self.conversation);
        print!("{}", ConsoleFormatter::format_servers(&registry.backend_names()));
        println!("{} tools available", registry.tools().len());
        println!();
        println!("Type a message, /help for commands, or 'quit' to exit.");
        println!();
    }

    fn print_help() {
        println!();
        println!("Commands:");
        println!("  /help, /h, /?     - Show this help");
        println!("  /tools            - List tools and their servers");
        println!("  /servers          - List running servers");
        println!("  /resources        - List resources offered by the servers");
        println!("  /read <uri>       - Print a resource");
        println!("  /history          - Show the latest messages");
        println!("  quit, /quit, /q   - Exit chat");
        println!();
    }

    /// Handle one parsed line. Returns true if the loop should exit.
    async fn handle(&self, command: ReplCommand) -> bool {
        let registry = self.use_case.registry();
        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
            ReplCommand::Help => Self::print_help(),
            ReplCommand::Tools => print!("{}", ConsoleFormatter::format_tools(&registry.routes())),
            ReplCommand::Servers => {
                print!("{}", ConsoleFormatter::format_servers(&registry.backend_names()))
            }
            ReplCommand::Resources => {
                print!("{}", ConsoleFormatter::format_resources(registry.resources()))
            }
            ReplCommand::Read(uri) => match registry.read_resource(&uri).await {
                Ok(contents) => print!("{}", ConsoleFormatter::format_resource_contents(&contents)),
                Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
            },
            ReplCommand::History => match self.use_case.history(&self.conversation).await {
                Ok(messages) => print!(
                    "{}",
                    ConsoleFormatter::format_history(&self.conversation, &messages, HISTORY_TAIL)
                ),
                Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
            },
            ReplCommand::Unknown(line) => {
                println!("Unknown command: {}", line);
                println!("Type /help for available commands");
            }
            ReplCommand::Message(text) => self.process_message(&text).await,
        }
        false
    }

    async fn process_message(&self, text: &str) {
        println!();
        match self.send(text).await {
            Ok(output) => print!("{}", ConsoleFormatter::format_reply(&output)),
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                if e.is_retryable() {
                    eprintln!("{}", "The transcript was saved; you can send the message again.".dimmed());
                } else if let Some(backend) = e.failed_backend() {
                    eprintln!(
                        "{}",
                        format!(
                            "Backend '{}' is unavailable; its tools will fail until toolhost is restarted.",
                            backend
                        )
                        .yellow()
                    );
                }
            }
        }
        println!();
    }
}
