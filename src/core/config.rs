use crate::core::resolver::{DEFAULT_MAX_SEARCH, DEFAULT_WINDOW_STEP_DAYS};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::{fs, path::Path, path::PathBuf};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://fintual.cl/api/real_assets";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Fund allocation by label, in the order the labels appear in the file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Portfolio {
    allocations: Vec<(String, f64)>,
}

impl Portfolio {
    pub fn new(allocations: Vec<(String, f64)>) -> Self {
        Self { allocations }
    }

    pub fn allocations(&self) -> impl Iterator<Item = (&String, f64)> {
        self.allocations.iter().map(|(label, weight)| (label, *weight))
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }
}

impl<'de> Deserialize<'de> for Portfolio {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PortfolioVisitor;

        impl<'de> Visitor<'de> for PortfolioVisitor {
            type Value = Portfolio;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of fund label to weight")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Portfolio, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut allocations = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((label, weight)) = map.next_entry::<String, f64>()? {
                    allocations.push((label, weight));
                }
                Ok(Portfolio { allocations })
            }
        }

        deserializer.deserialize_map(PortfolioVisitor)
    }
}

/// Reads the JSON list of portfolios to compare.
pub fn load_portfolios<P: AsRef<Path>>(path: P) -> Result<Vec<Portfolio>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read portfolios file: {}", path.display()))?;
    let portfolios: Vec<Portfolio> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse portfolios file: {}", path.display()))?;
    debug!(count = portfolios.len(), "Loaded portfolios");
    Ok(portfolios)
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: default_base_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SearchConfig {
    /// Widening rounds tried after the exact day.
    #[serde(default = "default_max_search")]
    pub max_search: u32,
    /// Days added on each side of the target date per round.
    #[serde(default = "default_window_step_days")]
    pub window_step_days: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_search: DEFAULT_MAX_SEARCH,
            window_step_days: DEFAULT_WINDOW_STEP_DAYS,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Fund label to provider identifier.
    #[serde(default = "default_funds")]
    pub funds: HashMap<String, String>,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            funds: default_funds(),
            provider: ProviderConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the user config when one exists at the default location, else
    /// the built-in defaults.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("cl", "fundgain", "fundgain")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_search() -> u32 {
    DEFAULT_MAX_SEARCH
}

fn default_window_step_days() -> u32 {
    DEFAULT_WINDOW_STEP_DAYS
}

fn default_funds() -> HashMap<String, String> {
    [
        ("risky_norris", "186"),
        ("moderate_pitt", "187"),
        ("conservative_clooney", "188"),
        ("very_conservative_streep", "15077"),
    ]
    .into_iter()
    .map(|(label, id)| (label.to_string(), id.to_string()))
    .collect()
}
