//! Which workflow categories each scenario owns
//!
//! Category ownership is static domain knowledge rather than something
//! inferred from the files, so it lives in an explicit table that the gap
//! detector receives as input.

use crate::models::ScenarioName;
use std::collections::{BTreeMap, BTreeSet};

/// Scenario -> owned workflow categories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageTable {
    entries: BTreeMap<ScenarioName, BTreeSet<String>>,
}

impl CoverageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or extend) the categories owned by a scenario
    #[must_use]
    pub fn with_scenario<I, S>(mut self, scenario: impl Into<ScenarioName>, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .entry(scenario.into())
            .or_default()
            .extend(categories.into_iter().map(Into::into));
        self
    }

    /// Ownership used by the BMAD method layout.
    ///
    /// Test architecture and QA automation are folded into the full cycle;
    /// project context and diagrams enrich project documentation.
    pub fn bmad_default() -> Self {
        Self::new()
            .with_scenario(
                "workflow-complet",
                [
                    "1-analysis",
                    "2-plan-workflows",
                    "3-solutioning",
                    "4-implementation",
                    "testarch",
                    "qa",
                ],
            )
            .with_scenario("quick-flow", ["bmad-quick-flow"])
            .with_scenario(
                "document-project",
                [
                    "document-project",
                    "generate-project-context",
                    "excalidraw-diagrams",
                ],
            )
    }

    /// Build from a plain map, e.g. a settings file section
    pub fn from_map(map: &BTreeMap<String, Vec<String>>) -> Self {
        map.iter().fold(Self::new(), |table, (scenario, categories)| {
            table.with_scenario(scenario.as_str(), categories.iter().cloned())
        })
    }

    pub fn categories_for(&self, scenario: &ScenarioName) -> Option<&BTreeSet<String>> {
        self.entries.get(scenario)
    }

    /// Union of the categories owned by the given scenarios
    pub fn covered(&self, scenarios: &[ScenarioName]) -> BTreeSet<String> {
        scenarios
            .iter()
            .filter_map(|s| self.entries.get(s))
            .flatten()
            .cloned()
            .collect()
    }

    /// Categories not owned by any of the given scenarios, in input order
    pub fn uncovered<'a, I>(&self, categories: I, scenarios: &[ScenarioName]) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let covered = self.covered(scenarios);
        categories
            .into_iter()
            .filter(|c| !covered.contains(*c))
            .map(str::to_string)
            .collect()
    }

    pub fn scenarios(&self) -> impl Iterator<Item = &ScenarioName> {
        self.entries.keys()
    }
}
