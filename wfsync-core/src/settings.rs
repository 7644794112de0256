//! Run settings
//!
//! Defaults reproduce the BMAD project layout; a `workflow-sync.toml` (or
//! `.yaml`/`.json`) in the project root can override any field.

use crate::coverage::CoverageTable;
use crate::models::ScenarioName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings file looked up in the project root
pub const DEFAULT_SETTINGS_FILE: &str = "workflow-sync.toml";

/// Tunable settings for a sync run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Workflow roots, later roots override earlier ones per category
    pub workflow_roots: Vec<PathBuf>,
    /// Directory holding one sub-directory per scenario
    pub stories_dir: PathBuf,
    /// Scenarios analyzed, in order
    pub scenarios: Vec<String>,
    /// Report output directory
    pub output_dir: PathBuf,
    /// Result cache namespace
    pub cache_dir: PathBuf,
    /// Cache entries older than this are ignored and pruned; 0 keeps forever
    pub cache_max_age_days: u64,
    /// Attempts per scenario analysis
    pub max_attempts: u32,
    /// Backoff base; attempt `n` waits `base * 2^n`
    pub base_delay_ms: u64,
    /// Completion request timeout
    pub request_timeout_secs: u64,
    /// USD per million input tokens
    pub input_cost_per_million: f64,
    /// USD per million output tokens
    pub output_cost_per_million: f64,
    /// Scenario -> workflow categories it owns
    pub coverage: BTreeMap<String, Vec<String>>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            workflow_roots: vec![
                PathBuf::from("_bmad/bmm/workflows"),
                PathBuf::from("_bmad/tea/workflows"),
            ],
            stories_dir: PathBuf::from("stories"),
            scenarios: vec![
                "workflow-complet".to_string(),
                "quick-flow".to_string(),
                "document-project".to_string(),
            ],
            output_dir: PathBuf::from("_bmad-output/planning-artifacts"),
            cache_dir: PathBuf::from("_bmad-output/.cache/workflow-sync"),
            cache_max_age_days: 30,
            max_attempts: 3,
            base_delay_ms: 1000,
            request_timeout_secs: 600,
            input_cost_per_million: 15.0,
            output_cost_per_million: 75.0,
            coverage: BTreeMap::new(),
        }
    }
}

impl SyncSettings {
    /// Load settings from `path`, or defaults when the file does not exist
    pub fn load(path: &Path) -> crate::Result<Self> {
        let settings: Self = wfsync_utils::config::load_config_or_default(path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that cannot drive a run
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_attempts == 0 {
            return Err(crate::Error::Config("max_attempts must be at least 1".to_string()));
        }
        if self.scenarios.is_empty() {
            return Err(crate::Error::Config("no scenarios configured".to_string()));
        }
        if self.input_cost_per_million < 0.0 || self.output_cost_per_million < 0.0 {
            return Err(crate::Error::Config("token rates must not be negative".to_string()));
        }
        Ok(())
    }

    pub fn scenario_names(&self) -> Vec<ScenarioName> {
        self.scenarios.iter().map(|s| ScenarioName::from(s.as_str())).collect()
    }

    /// Resolve a configured scenario by name, or fail listing the valid ones
    pub fn select(&self, name: &str) -> crate::Result<ScenarioName> {
        if self.scenarios.iter().any(|s| s == name) {
            return Ok(ScenarioName::from(name));
        }
        Err(crate::Error::Config(format!(
            "Unknown scenario: {name}. Valid scenarios: {}",
            self.scenarios.join(", ")
        )))
    }

    /// Story directory of a scenario
    pub fn scenario_dir(&self, root: &Path, scenario: &ScenarioName) -> PathBuf {
        root.join(&self.stories_dir).join(scenario.as_str())
    }

    /// Coverage table from settings, falling back to the BMAD layout
    pub fn coverage_table(&self) -> CoverageTable {
        if self.coverage.is_empty() {
            CoverageTable::bmad_default()
        } else {
            CoverageTable::from_map(&self.coverage)
        }
    }

    pub fn cache_max_age(&self) -> Option<Duration> {
        (self.cache_max_age_days > 0)
            .then(|| Duration::from_secs(self.cache_max_age_days * 24 * 60 * 60))
    }

    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
