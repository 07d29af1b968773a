//! Configuration file loading for toolhost
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `TOOLHOST_*` environment variables
//! 2. `--servers <path>` JSON file (merged under `servers`)
//! 3. `--config <path>` specified file
//! 4. Project root: `./toolhost.toml` or `./.toolhost.toml`
//! 5. Global: `$XDG_CONFIG_HOME/toolhost/config.toml`
//! 6. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileHostConfig, FileInferenceConfig, FileLoggingConfig,
    FileReplConfig, FileServerConfig, FileSessionConfig, ResolvedInference,
};
pub use loader::ConfigLoader;
