//! CLI entrypoint for toolhost
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use toolhost_infrastructure::{ConfigLoader, FileConfig};
use toolhost_presentation::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load(cli.config.as_deref(), cli.servers.as_deref())
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Failed to load configuration")?;
    apply_overrides(&mut config, &cli);

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref(), cli.servers.as_deref()) {
            println!("{}", line);
        }
        println!();
        println!("Effective configuration:");
        println!("{}", config.to_toml_masked()?);
        return Ok(());
    }

    config.validate().context("Invalid configuration")?;

    let _log_guard = logging::init(cli.verbose, config.logging.log_dir_path().as_deref());

    host::run(cli, config).await
}

/// Command-line flags take precedence over every config source.
fn apply_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(conversation) = &cli.conversation {
        config.host.conversation = conversation.clone();
    }
    if let Some(model) = &cli.model {
        config.inference.model = Some(model.clone());
    }
    if let Some(rounds) = cli.max_rounds {
        config.host.max_tool_rounds = Some(rounds);
    }
    if cli.quiet {
        config.repl.show_progress = false;
    }
}

#[cfg(feature = "openai")]
mod host {
    use anyhow::{Context, Result, bail};
    use std::sync::Arc;
    use toolhost_application::{ConversationLogger, RunConversationUseCase, SessionRegistry};
    use toolhost_infrastructure::{
        FileConfig, JsonTranscriptStore, JsonlConversationLogger, OpenAiInferenceProvider,
        StdioSessionConnector,
    };
    use toolhost_presentation::{Cli, ConsoleFormatter, HostRepl};
    use tracing::{info, warn};

    pub async fn run(cli: Cli, config: FileConfig) -> Result<()> {
        let settings = config.inference.resolve().context("Invalid inference settings")?;
        let provider = Arc::new(OpenAiInferenceProvider::new(settings.into())?);

        let Some(store) = config
            .host
            .sessions_dir()
            .map(JsonTranscriptStore::new)
        else {
            bail!("No data directory available; set host.sessions_dir");
        };
        let store = Arc::new(store);

        // === Dependency Injection ===
        let connector = StdioSessionConnector::new(config.session.to_session_options());
        let backends = config.to_backends();
        info!(servers = backends.len(), "Starting tool servers");
        let registry = Arc::new(
            SessionRegistry::open_all(&connector, &backends, config.host.to_registry_params())
                .await
                .context("Failed to start tool servers")?,
        );

        let mut use_case = RunConversationUseCase::new(provider, store, registry.clone())
            .with_params(config.host.to_conversation_params());
        if let Some(path) = config.logging.conversation_log_path()
            && let Some(logger) = JsonlConversationLogger::open(&path)
        {
            info!(path = %path.display(), "Conversation log enabled");
            use_case = use_case.with_conversation_logger(Arc::new(logger) as Arc<dyn ConversationLogger>);
        }

        let repl = HostRepl::new(use_case, config.host.conversation.clone())
            .with_progress(config.repl.show_progress)
            .with_history_file(config.repl.history_path());

        let result = if cli.list_tools {
            print!("{}", ConsoleFormatter::format_tools(&registry.routes()));
            Ok(())
        } else if let Some(message) = &cli.message {
            match repl.send(message).await {
                Ok(output) => {
                    print!("{}", ConsoleFormatter::format_reply(&output));
                    Ok(())
                }
                Err(e) => Err(anyhow::Error::new(e)),
            }
        } else {
            repl.run().await.context("Interactive session failed")
        };

        if let Err(e) = registry.close_all().await {
            warn!(error = %e, "Some tool servers did not shut down cleanly");
        }
        result
    }
}

#[cfg(not(feature = "openai"))]
mod host {
    use anyhow::{Result, bail};
    use toolhost_infrastructure::FileConfig;
    use toolhost_presentation::Cli;

    pub async fn run(_cli: Cli, _config: FileConfig) -> Result<()> {
        bail!("toolhost was built without an inference provider; enable the `openai` feature")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "toolhost",
            "-q",
            "-c",
            "storybook",
            "--model",
            "gpt-4.1",
            "--max-rounds",
            "3",
        ]);
        let mut config = FileConfig::default();

        apply_overrides(&mut config, &cli);

        assert_eq!(config.host.conversation, "storybook");
        assert_eq!(config.inference.model.as_deref(), Some("gpt-4.1"));
        assert_eq!(config.host.max_tool_rounds, Some(3));
        assert!(!config.repl.show_progress);
    }
}
