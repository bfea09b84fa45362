//! Resolver configuration loaded from TOML.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::SearchDepth;
use crate::io::cached_resolver::{DEFAULT_DIRECTORIES_TTL, DEFAULT_EXTENSIONS_TTL};
use crate::io::locator::{DEFAULT_MAX_DEPTH, ScanOptions};

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV: &str = "WHATEXEC_CONFIG";

/// Top-level configuration (TOML). Missing fields take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WhatexecConfig {
    pub cache: CacheConfig,
    pub search: SearchConfig,
    pub priority: PriorityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve `PATH` and `PATHEXT` from a TTL cache.
    pub enabled: bool,
    pub path_ttl_secs: u64,
    pub extensions_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path_ttl_secs: DEFAULT_DIRECTORIES_TTL.as_secs(),
            extensions_ttl_secs: DEFAULT_EXTENSIONS_TTL.as_secs(),
        }
    }
}

impl CacheConfig {
    pub fn path_ttl(&self) -> Duration {
        Duration::from_secs(self.path_ttl_secs)
    }

    pub fn extensions_ttl(&self) -> Duration {
        Duration::from_secs(self.extensions_ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    pub recursive: bool,
    /// Directory levels a scan may descend below its root.
    pub max_depth: usize,
    pub stay_on_volume: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: DEFAULT_MAX_DEPTH,
            stay_on_volume: true,
        }
    }
}

impl SearchConfig {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            depth: SearchDepth::from_recursive(self.recursive),
            max_depth: self.max_depth,
            stay_on_volume: self.stay_on_volume,
        }
    }
}

/// Location priority overrides. An empty list keeps the built-in table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PriorityConfig {
    pub locations: Vec<PriorityRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriorityRule {
    pub prefix: PathBuf,
    pub score: u32,
}

impl WhatexecConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cache.enabled {
            if self.cache.path_ttl_secs == 0 {
                return Err(anyhow!("cache.path_ttl_secs must be > 0"));
            }
            if self.cache.extensions_ttl_secs == 0 {
                return Err(anyhow!("cache.extensions_ttl_secs must be > 0"));
            }
        }
        if self.search.max_depth == 0 {
            return Err(anyhow!("search.max_depth must be > 0"));
        }
        for (index, rule) in self.priority.locations.iter().enumerate() {
            if rule.prefix.as_os_str().is_empty() {
                return Err(anyhow!("priority.locations[{index}].prefix must be non-empty"));
            }
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `WhatexecConfig::default()`.
pub fn load_config(path: &Path) -> Result<WhatexecConfig> {
    if !path.exists() {
        let cfg = WhatexecConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: WhatexecConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, WhatexecConfig::default());
        assert_eq!(cfg.search.scan_options(), ScanOptions::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[search]
recursive = false

[[priority.locations]]
prefix = "/opt/tools"
score = 0
"#,
        )
        .expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.cache, CacheConfig::default());
        assert_eq!(cfg.search.scan_options().depth, SearchDepth::TopLevelOnly);
        assert_eq!(
            cfg.priority.locations,
            vec![PriorityRule {
                prefix: PathBuf::from("/opt/tools"),
                score: 0,
            }]
        );
    }

    #[test]
    fn zero_ttl_is_rejected_only_when_caching() {
        let mut cfg = WhatexecConfig::default();
        cfg.cache.path_ttl_secs = 0;
        assert!(cfg.validate().is_err());
        cfg.cache.enabled = false;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_depth_and_empty_prefix_are_rejected() {
        let mut cfg = WhatexecConfig::default();
        cfg.search.max_depth = 0;
        let err = cfg.validate().expect_err("depth");
        assert!(err.to_string().contains("max_depth"));

        let mut cfg = WhatexecConfig::default();
        cfg.priority.locations.push(PriorityRule {
            prefix: PathBuf::new(),
            score: 1,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn malformed_toml_reports_the_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[search\n").expect("write");
        let err = load_config(&path).expect_err("parse");
        assert!(format!("{err:#}").contains("config.toml"));
    }
}
