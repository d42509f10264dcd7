use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, TallyError};

/// Project-local config location, relative to the working directory.
pub const PROJECT_CONFIG_PATH: &str = ".tally/config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub rollup: RollupConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub labels: LabelConfig,
    #[serde(default)]
    pub lock: LockConfig,
}

/// Knobs for the daily rollup engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupConfig {
    /// Synthetic area that aggregates every issue.
    #[serde(default = "default_all_areas_label")]
    pub all_areas_label: String,
    /// Milestone title that marks an issue as backlogged.
    #[serde(default = "default_backlog_milestone")]
    pub backlog_milestone: String,
    /// Width of the opened/closed trailing window, in days.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            all_areas_label: default_all_areas_label(),
            backlog_milestone: default_backlog_milestone(),
            window_days: default_window_days(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_trend_months")]
    pub trend_months: u32,
    #[serde(default)]
    pub monthly_trend: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            trend_months: default_trend_months(),
            monthly_trend: false,
        }
    }
}

/// How raw tracker labels map onto areas, priority and type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelConfig {
    #[serde(default = "default_area_prefix")]
    pub area_prefix: String,
    #[serde(default = "default_priority_prefix")]
    pub priority_prefix: String,
    #[serde(default = "default_bug_label")]
    pub bug_label: String,
    #[serde(default = "default_feature_label")]
    pub feature_label: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            area_prefix: default_area_prefix(),
            priority_prefix: default_priority_prefix(),
            bug_label: default_bug_label(),
            feature_label: default_feature_label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockConfig {
    #[serde(default = "default_lock_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl LockConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl ProjectConfig {
    /// Reject values the rollup engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`TallyError::InvalidConfig`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.rollup.window_days == 0 {
            return Err(TallyError::InvalidConfig(
                "rollup.window_days must be at least 1".to_string(),
            ));
        }
        if self.rollup.all_areas_label.trim().is_empty() {
            return Err(TallyError::InvalidConfig(
                "rollup.all_areas_label must not be empty".to_string(),
            ));
        }
        if self.rollup.backlog_milestone.trim().is_empty() {
            return Err(TallyError::InvalidConfig(
                "rollup.backlog_milestone must not be empty".to_string(),
            ));
        }
        if self.report.top_n == 0 {
            return Err(TallyError::InvalidConfig(
                "report.top_n must be at least 1".to_string(),
            ));
        }
        if self.report.trend_months == 0 {
            return Err(TallyError::InvalidConfig(
                "report.trend_months must be at least 1".to_string(),
            ));
        }
        if self.labels.area_prefix.is_empty() || self.labels.priority_prefix.is_empty() {
            return Err(TallyError::InvalidConfig(
                "labels.area_prefix and labels.priority_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse and validate a config file.
///
/// # Errors
///
/// Fails when the file cannot be read, is not valid TOML, or fails
/// [`ProjectConfig::validate`].
pub fn load_config_file(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str::<ProjectConfig>(&content).map_err(|err| {
        TallyError::ConfigParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    })?;
    config.validate()?;
    Ok(config)
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tally/config.toml"))
}

/// Resolve the effective config.
///
/// Precedence (highest wins):
/// 1. `explicit` (the `--config` flag); must exist
/// 2. `<project_root>/.tally/config.toml`
/// 3. `<config_dir>/tally/config.toml`
/// 4. built-in defaults
///
/// # Errors
///
/// Fails when the explicit path is missing or any discovered file is invalid.
pub fn resolve_config(project_root: &Path, explicit: Option<&Path>) -> Result<ProjectConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(TallyError::InputNotFound(path.to_path_buf()));
        }
        tracing::debug!(path = %path.display(), "loading explicit config");
        return load_config_file(path);
    }

    let project = project_root.join(PROJECT_CONFIG_PATH);
    if project.exists() {
        tracing::debug!(path = %project.display(), "loading project config");
        return load_config_file(&project);
    }

    if let Some(user) = user_config_path().filter(|p| p.exists()) {
        tracing::debug!(path = %user.display(), "loading user config");
        return load_config_file(&user);
    }

    Ok(ProjectConfig::default())
}

fn default_all_areas_label() -> String {
    "Area - All".to_string()
}

fn default_backlog_milestone() -> String {
    "Backlog".to_string()
}

const fn default_window_days() -> u32 {
    30
}

const fn default_top_n() -> usize {
    100
}

const fn default_trend_months() -> u32 {
    6
}

fn default_area_prefix() -> String {
    "Area - ".to_string()
}

fn default_priority_prefix() -> String {
    "Pri:".to_string()
}

fn default_bug_label() -> String {
    "Bug".to_string()
}

fn default_feature_label() -> String {
    "Enhancement".to_string()
}

const fn default_lock_timeout_ms() -> u64 {
    5_000
}
