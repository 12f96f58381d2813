//! Harness configuration.
//!
//! All environment-derived settings live in one explicit [`HarnessConfig`] that is
//! passed into discovery, execution and the version check. Layering order, lowest
//! to highest precedence: built-in defaults, an optional YAML file, the
//! `SEMCONREPO` / `OYDIDCMD` / `SEMCONCMD` environment variables, CLI flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{HarnessError, HarnessResult};

pub const DEFAULT_REPO_URL: &str = "http://localhost:3500";
pub const DEFAULT_DID_CMD: &str = "oydid";
pub const DEFAULT_SEMCON_CMD: &str = "semcon";
pub const DEFAULT_INPUT_EXTENSION: &str = "doc";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const ENV_REPO_URL: &str = "SEMCONREPO";
pub const ENV_DID_CMD: &str = "OYDIDCMD";
pub const ENV_SEMCON_CMD: &str = "SEMCONCMD";

/// How command templates are turned into processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ShellMode {
    /// Plain templates run as an argv; templates with pipes or redirections go through `sh -c`.
    #[default]
    Auto,
    /// Every template goes through `sh -c`.
    Always,
    /// Templates must be plain argv; shell operators are rejected.
    Never,
}

/// Explicit configuration for a harness run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub repo_url: String,
    pub did_cmd: String,
    pub semcon_cmd: String,
    pub fixture_root: PathBuf,
    /// Groups to run (`"01"` selects `01_input`). Empty means every group found.
    pub groups: Vec<String>,
    pub input_extension: String,
    pub timeout: Duration,
    pub shell_mode: ShellMode,
    pub use_colors: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            repo_url: DEFAULT_REPO_URL.to_string(),
            did_cmd: DEFAULT_DID_CMD.to_string(),
            semcon_cmd: DEFAULT_SEMCON_CMD.to_string(),
            fixture_root: PathBuf::from("."),
            groups: Vec::new(),
            input_extension: DEFAULT_INPUT_EXTENSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            shell_mode: ShellMode::Auto,
            use_colors: atty::is(atty::Stream::Stdout),
        }
    }
}

/// On-disk shape of the optional YAML config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    repo_url: Option<String>,
    did_cmd: Option<String>,
    semcon_cmd: Option<String>,
    fixture_root: Option<PathBuf>,
    #[serde(default)]
    groups: Vec<String>,
    input_extension: Option<String>,
    timeout_secs: Option<u64>,
    shell: Option<ShellMode>,
}

impl HarnessConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Loads a YAML config file, then applies the process environment on top.
    ///
    /// A relative `fixture_root` in the file is resolved against the file's directory.
    pub fn from_yaml_file(path: &Path) -> HarnessResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| HarnessError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&text, path.parent())?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_yaml_str(text: &str, base: Option<&Path>) -> HarnessResult<Self> {
        let file: FileConfig = if text.trim().is_empty() {
            FileConfig::default()
        } else {
            serde_yaml::from_str(text).map_err(|e| HarnessError::Config {
                message: e.to_string(),
            })?
        };

        let mut config = Self::default();
        if let Some(url) = file.repo_url {
            config.repo_url = url;
        }
        if let Some(cmd) = file.did_cmd {
            config.did_cmd = cmd;
        }
        if let Some(cmd) = file.semcon_cmd {
            config.semcon_cmd = cmd;
        }
        if let Some(root) = file.fixture_root {
            config.fixture_root = match base {
                Some(base) if root.is_relative() => base.join(root),
                _ => root,
            };
        }
        config.groups = file.groups;
        if let Some(ext) = file.input_extension {
            config.input_extension = ext.trim_start_matches('.').to_string();
        }
        if let Some(secs) = file.timeout_secs {
            if secs == 0 {
                return Err(HarnessError::Config {
                    message: "timeout_secs must be greater than zero".to_string(),
                });
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(mode) = file.shell {
            config.shell_mode = mode;
        }
        Ok(config)
    }

    /// Applies environment overrides through `lookup`. Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(url) = get(ENV_REPO_URL) {
            self.repo_url = url;
        }
        if let Some(cmd) = get(ENV_DID_CMD) {
            self.did_cmd = cmd;
        }
        if let Some(cmd) = get(ENV_SEMCON_CMD) {
            self.semcon_cmd = cmd;
        }
    }

    /// Variables exported to every child process so templates can reference them.
    pub fn child_env(&self) -> Vec<(String, String)> {
        vec![
            (ENV_REPO_URL.to_string(), self.repo_url.clone()),
            (ENV_DID_CMD.to_string(), self.did_cmd.clone()),
            (ENV_SEMCON_CMD.to_string(), self.semcon_cmd.clone()),
        ]
    }

    /// `<repo_url>/version`, tolerating a trailing slash on the base URL.
    pub fn version_url(&self) -> String {
        format!("{}/version", self.repo_url.trim_end_matches('/'))
    }
}
