//! Sync run orchestration
//!
//! Scenarios run one at a time. A scenario whose analysis never validates
//! aborts the run, so a report never shows partial sync state.

use crate::analyzer::ScenarioAnalyzer;
use crate::client::{CompletionService, CostModel};
use crate::gaps::ScenarioGapDetector;
use crate::retry::RetryPolicy;
use crate::LlmResult;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wfsync_core::scan::{scan_stories, scan_workflow_roots};
use wfsync_core::{
    AnalysisResult, CacheKey, NewScenarioProposal, ResultCache, ScenarioName, SyncSettings,
};

/// Everything a report needs from one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncOutcome {
    /// Per-scenario results in processing order
    pub results: Vec<(ScenarioName, AnalysisResult)>,
    pub proposals: Vec<NewScenarioProposal>,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub total_cost: f64,
}

pub struct SyncRunner {
    settings: SyncSettings,
    project_root: PathBuf,
    cache: ResultCache,
    /// `None` in dry-run mode
    service: Option<Arc<dyn CompletionService>>,
    selected: Option<ScenarioName>,
}

impl SyncRunner {
    /// Runner that calls `service` on cache misses
    pub fn new(settings: SyncSettings, project_root: impl Into<PathBuf>, service: Arc<dyn CompletionService>) -> Self {
        Self::build(settings, project_root.into(), Some(service))
    }

    /// Runner that only reads the cache and never calls a service
    pub fn dry_run(settings: SyncSettings, project_root: impl Into<PathBuf>) -> Self {
        Self::build(settings, project_root.into(), None)
    }

    fn build(
        settings: SyncSettings,
        project_root: PathBuf,
        service: Option<Arc<dyn CompletionService>>,
    ) -> Self {
        let mut cache = ResultCache::new(project_root.join(&settings.cache_dir));
        if let Some(max_age) = settings.cache_max_age() {
            cache = cache.with_max_age(max_age);
        }
        Self {
            settings,
            project_root,
            cache,
            service,
            selected: None,
        }
    }

    /// Analyze only `name`; fails when it is not a configured scenario
    pub fn select_scenario(&mut self, name: &str) -> LlmResult<()> {
        self.selected = Some(self.settings.select(name)?);
        Ok(())
    }

    pub const fn is_dry_run(&self) -> bool {
        self.service.is_none()
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub const fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Scenarios processed by [`run`](Self::run), in order
    pub fn scenarios(&self) -> Vec<ScenarioName> {
        match &self.selected {
            Some(selected) => vec![selected.clone()],
            None => self.settings.scenario_names(),
        }
    }

    pub async fn run(&self) -> LlmResult<SyncOutcome> {
        if let Err(e) = self.cache.prune() {
            tracing::warn!("Cache prune failed: {e}");
        }
        if let Ok(stats) = self.cache.statistics() {
            tracing::debug!(
                "Cache at {}: {} entries, {} bytes",
                self.cache.cache_dir().display(),
                stats.total_entries,
                stats.total_size
            );
        }

        let corpus = scan_workflow_roots(&self.settings.workflow_roots, &self.project_root);
        tracing::info!(
            "Total workflow categories: {} ({} workflows)",
            corpus.category_count(),
            corpus.workflow_count()
        );

        let all_scenarios = self.settings.scenario_names();
        let cost_model = CostModel::from_settings(&self.settings);
        let analyzer = self.service.as_ref().map(|service| {
            ScenarioAnalyzer::new(
                Arc::clone(service),
                cost_model,
                RetryPolicy::from_settings(&self.settings),
            )
        });

        let analyzed = self.scenarios();
        let mut outcome = SyncOutcome::default();
        for scenario in &analyzed {
            tracing::info!("Processing scenario: {scenario}");
            let stories = scan_stories(
                &self.settings.scenario_dir(&self.project_root, scenario),
                &self.project_root,
            );
            let key = CacheKey::for_analysis(&corpus, scenario, &stories)?;

            let result = if let Some(cached) = self.cache.get(&key) {
                outcome.cache_hits += 1;
                cached
            } else {
                outcome.cache_misses += 1;
                match &analyzer {
                    None => {
                        tracing::info!("Dry-run: no cached analysis for {scenario}, using empty result");
                        AnalysisResult::empty()
                    }
                    Some(analyzer) => {
                        let retried = analyzer
                            .analyze(&corpus, &stories, scenario, &all_scenarios)
                            .await
                            .map_err(|e| {
                                tracing::error!("Scenario {scenario} failed: {e}");
                                e
                            })?;
                        outcome.total_cost += retried.total_cost;
                        self.cache.put(&key, &retried.value)?;
                        retried.value
                    }
                }
            };

            tracing::info!("Scenario {scenario}: {} action(s)", result.total_actions());
            outcome.results.push((scenario.clone(), result));
        }

        if let Some(service) = &self.service {
            let detector =
                ScenarioGapDetector::new(Arc::clone(service), self.settings.coverage_table(), cost_model);
            let detection = detector.detect(&corpus, &analyzed).await;
            outcome.total_cost += detection.cost;
            outcome.proposals = detection.proposals;
        } else {
            tracing::info!("Dry-run: skipping new scenario detection");
        }

        tracing::info!(
            "Analysis complete: {} cache hit(s), {} miss(es), estimated cost ${:.4}",
            outcome.cache_hits,
            outcome.cache_misses,
            outcome.total_cost
        );
        Ok(outcome)
    }
}
