//! `[convert]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [convert]
//! src = "site"             # Source tree
//! dist = "dist"            # Destination tree
//! glob = "/**/*.html"      # Files to convert, relative to `src`
//! isolate = false          # Keep going when a file fails
//! jobs = 16                # Files in flight at once (unbounded if unset)
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Batch conversion settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub src: PathBuf,
    pub dist: PathBuf,
    pub glob: String,
    pub isolate: bool,
    pub jobs: Option<usize>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            src: PathBuf::from("src"),
            dist: PathBuf::from("dist"),
            glob: "/**/*.html".to_string(),
            isolate: false,
            jobs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::config::test_parse_config;

    #[test]
    fn test_convert_config() {
        let config = test_parse_config(
            "[convert]\nsrc = \"site\"\ndist = \"public\"\nglob = \"*.html\"\nisolate = true\njobs = 4",
        );
        assert_eq!(config.convert.src, PathBuf::from("site"));
        assert_eq!(config.convert.dist, PathBuf::from("public"));
        assert_eq!(config.convert.glob, "*.html");
        assert!(config.convert.isolate);
        assert_eq!(config.convert.jobs, Some(4));
    }

    #[test]
    fn test_convert_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.convert.src, PathBuf::from("src"));
        assert_eq!(config.convert.dist, PathBuf::from("dist"));
        assert_eq!(config.convert.glob, "/**/*.html");
        assert!(!config.convert.isolate);
        assert_eq!(config.convert.jobs, None);
    }
}
