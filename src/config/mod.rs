//! Configuration management for `amp-ssr.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [convert] and [pipeline]
//! ├── error          # ConfigError
//! └── mod.rs         # AppConfig (this file)
//! ```
//!
//! The file is optional: without it every section takes its defaults.
//! Relative paths in the file resolve against the file's directory; paths
//! given on the command line resolve against the working directory.

mod error;
pub mod section;

pub use error::ConfigError;
pub use section::{ConvertConfig, PipelineSectionConfig};

use crate::{
    cli::{Cli, Commands, ConvertArgs, PipelineArgs},
    log,
    pipeline::PipelineConfig,
    workflow::{ConvertOptions, FailurePolicy},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing amp-ssr.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Absolute path to the config file, empty when none was loaded
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Batch conversion settings
    #[serde(default)]
    pub convert: ConvertConfig,

    /// Pipeline settings
    #[serde(default)]
    pub pipeline: PipelineSectionConfig,
}

impl AppConfig {
    /// Load configuration from CLI arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = if cli.config.is_file() {
            let mut config = Self::from_path(&cli.config)?;
            config.config_path = crate::utils::path::normalize_path(&cli.config);
            let root = config
                .config_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            config.resolve_paths(&root);
            config
        } else {
            Self::default()
        };

        config.apply_command_options(cli);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .with_context(|| format!("in `{}`", path.display()))?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Resolve relative paths from the config file against `root`.
    fn resolve_paths(&mut self, root: &Path) {
        for path in [&mut self.convert.src, &mut self.convert.dist] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
    }

    // ========================================================================
    // CLI overrides
    // ========================================================================

    fn apply_command_options(&mut self, cli: &Cli) {
        if let Some(args) = cli.pipeline_args() {
            self.apply_pipeline_args(args);
        }
        if let Commands::Convert { args } = &cli.command {
            self.apply_convert_args(args);
        }
    }

    fn apply_pipeline_args(&mut self, args: &PipelineArgs) {
        // Set verbose mode globally
        crate::logger::set_verbose(args.verbose);

        if let Some(prefix) = &args.amp_url_prefix {
            self.pipeline.amp_url_prefix = Some(prefix.clone());
        }
    }

    fn apply_convert_args(&mut self, args: &ConvertArgs) {
        Self::update_option(&mut self.convert.src, args.src.as_ref());
        Self::update_option(&mut self.convert.dist, args.dist.as_ref());
        Self::update_option(&mut self.convert.glob, args.glob.as_ref());
        self.convert.isolate |= args.isolate;
        if args.jobs.is_some() {
            self.convert.jobs = args.jobs;
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    pub fn validate(&self) -> Result<()> {
        if self.convert.glob.trim().is_empty() {
            return Err(ConfigError::Validation("[convert.glob] must not be empty".into()).into());
        }
        if self.convert.jobs == Some(0) {
            return Err(ConfigError::Validation("[convert.jobs] must be at least 1".into()).into());
        }

        let unknown = self.pipeline.unknown_transformers();
        if !unknown.is_empty() {
            return Err(ConfigError::Validation(format!(
                "[pipeline.transformers] unknown transformer(s): {}",
                unknown.join(", ")
            ))
            .into());
        }

        let host = url::Url::parse(&self.pipeline.runtime_host).map_err(|e| {
            ConfigError::Validation(format!(
                "[pipeline.runtime_host] `{}` is not a valid URL: {e}",
                self.pipeline.runtime_host
            ))
        })?;
        if !matches!(host.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "[pipeline.runtime_host] `{}` must be an http(s) URL",
                self.pipeline.runtime_host
            ))
            .into());
        }

        Ok(())
    }

    // ========================================================================
    // derived settings
    // ========================================================================

    pub fn pipeline_config(&self) -> PipelineConfig {
        self.pipeline.to_pipeline_config()
    }

    pub fn convert_options(&self, progress: bool) -> ConvertOptions {
        ConvertOptions {
            failure_policy: if self.convert.isolate {
                FailurePolicy::Isolate
            } else {
                FailurePolicy::FailFast
            },
            max_in_flight: self.convert.jobs,
            progress,
        }
    }
}

/// Parse a config snippet, asserting that every field is known.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> AppConfig {
    let (parsed, ignored) = AppConfig::parse_with_ignored(content).unwrap();
    assert!(ignored.is_empty(), "unknown fields in test config: {ignored:?}");
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(AppConfig::from_str("[convert\nsrc = 1").is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[convert]\nsrc = \"site\"\n[unknown_section]\nkey = 1";
        let (config, ignored) = AppConfig::parse_with_ignored(content).unwrap();
        assert_eq!(config.convert.src, PathBuf::from("site"));
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.convert.jobs = Some(0);
        assert!(config.validate().is_err());
        config.convert.jobs = None;

        config.pipeline.transformers.push("Nope".to_string());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("Nope"));
        config.pipeline.transformers.pop();

        config.pipeline.runtime_host = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("amp-ssr.toml");
        fs::write(
            &config_path,
            "[convert]\nsrc = \"site\"\ndist = \"public\"\njobs = 8\n[pipeline]\namp_url_prefix = \"/a\"",
        )
        .unwrap();
        let config_arg = config_path.to_string_lossy().to_string();

        let cli = Cli::try_parse_from([
            "amp-ssr", "--config", &config_arg, "convert", "--dist", "out", "--isolate",
        ])
        .unwrap();
        let config = AppConfig::load(&cli).unwrap();

        assert!(config.convert.src.ends_with("site"));
        assert!(config.convert.src.is_absolute());
        assert_eq!(config.convert.dist, PathBuf::from("out"));
        assert_eq!(config.convert.jobs, Some(8));
        assert_eq!(config.pipeline.amp_url_prefix.as_deref(), Some("/a"));

        let options = config.convert_options(false);
        assert_eq!(options.failure_policy, FailurePolicy::Isolate);
        assert_eq!(options.max_in_flight, Some(8));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("none.toml").to_string_lossy().to_string();
        let cli = Cli::try_parse_from(["amp-ssr", "--config", &missing, "list"]).unwrap();
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.convert, ConvertConfig::default());
        assert!(config.config_path.as_os_str().is_empty());
    }
}
