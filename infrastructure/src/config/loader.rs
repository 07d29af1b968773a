//! Configuration file loader with multi-source merging

use super::file_config::{FileConfig, FileServerConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["toolhost.toml", ".toolhost.toml"];
const ENV_PREFIX: &str = "TOOLHOST_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `TOOLHOST_*` environment variables (`__` separates nesting)
    /// 2. Servers JSON file (if provided), merged under `servers`
    /// 3. Explicit config path (if provided)
    /// 4. Project root: `./toolhost.toml` or `./.toolhost.toml`
    /// 5. Global: `$XDG_CONFIG_HOME/toolhost/config.toml`
    /// 6. Default values
    pub fn load(
        config_path: Option<&Path>,
        servers_path: Option<&Path>,
    ) -> Result<FileConfig, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        figment = Self::merge_explicit(figment, config_path, servers_path)?;

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)
    }

    /// Load only the given files on top of the defaults, without discovery
    /// or environment variables.
    pub fn load_from(
        config_path: Option<&Path>,
        servers_path: Option<&Path>,
    ) -> Result<FileConfig, Box<figment::Error>> {
        let figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));
        Self::merge_explicit(figment, config_path, servers_path)?
            .extract()
            .map_err(Box::new)
    }

    fn merge_explicit(
        mut figment: Figment,
        config_path: Option<&Path>,
        servers_path: Option<&Path>,
    ) -> Result<Figment, Box<figment::Error>> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(Box::new(figment::Error::from(format!(
                    "config file not found: {}",
                    path.display()
                ))));
            }
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = servers_path {
            let servers = Self::read_servers_file(path)?;
            figment = figment.merge(Serialized::global("servers", servers));
        }

        Ok(figment)
    }

    /// Read a JSON file mapping server names to `{command, args, env}`.
    pub fn read_servers_file(
        path: &Path,
    ) -> Result<BTreeMap<String, FileServerConfig>, Box<figment::Error>> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Box::new(figment::Error::from(format!(
                "cannot read servers file {}: {}",
                path.display(),
                e
            )))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            Box::new(figment::Error::from(format!(
                "invalid servers file {}: {}",
                path.display(),
                e
            )))
        })
    }

    /// Get the global config file path
    ///
    /// Returns `$XDG_CONFIG_HOME/toolhost/config.toml` if set,
    /// otherwise the platform config directory.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("toolhost").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe the config file locations being used (for `--show-config`)
    pub fn describe_sources(config_path: Option<&Path>, servers_path: Option<&Path>) -> Vec<String> {
        let mark = |found: bool| if found { "[FOUND]" } else { "[     ]" };
        let mut lines = vec!["Configuration sources (in priority order):".to_string()];

        lines.push(format!("  [ENV  ] Environment: {}*", ENV_PREFIX));
        if let Some(path) = servers_path {
            lines.push(format!("  {} Servers: {}", mark(path.exists()), path.display()));
        }
        if let Some(path) = config_path {
            lines.push(format!("  {} Explicit: {}", mark(path.exists()), path.display()));
        }
        match Self::project_config_path() {
            Some(path) => lines.push(format!("  [FOUND] Project: {}", path.display())),
            None => lines.push("  [     ] Project: ./toolhost.toml or ./.toolhost.toml".to_string()),
        }
        if let Some(path) = Self::global_config_path() {
            lines.push(format!("  {} Global:  {}", mark(path.exists()), path.display()));
        }
        lines.push("  [     ] Default: built-in defaults".to_string());
        lines
    }
}
