//! Best-effort detection of scenarios missing from the coverage table

use crate::client::{CompletionService, CostModel};
use crate::response::strip_fences;
use crate::{prompts, LlmResult};
use serde::Deserialize;
use std::sync::Arc;
use wfsync_core::{CoverageTable, NewScenarioProposal, ScenarioName, WorkflowCorpus};
use wfsync_utils::truncate_chars;

#[derive(Debug, Deserialize)]
struct GapResponse {
    new_scenarios: Vec<NewScenarioProposal>,
}

/// Proposals plus what the request cost
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GapDetection {
    pub proposals: Vec<NewScenarioProposal>,
    pub cost: f64,
}

pub struct ScenarioGapDetector {
    service: Arc<dyn CompletionService>,
    coverage: CoverageTable,
    cost_model: CostModel,
}

impl ScenarioGapDetector {
    pub fn new(service: Arc<dyn CompletionService>, coverage: CoverageTable, cost_model: CostModel) -> Self {
        Self {
            service,
            coverage,
            cost_model,
        }
    }

    /// Propose scenarios for uncovered categories; never fails the run
    pub async fn detect(&self, corpus: &WorkflowCorpus, scenarios: &[ScenarioName]) -> GapDetection {
        tracing::info!("Detecting new scenarios");
        let uncovered = self.coverage.uncovered(corpus.categories(), scenarios);
        if uncovered.is_empty() {
            tracing::info!("No uncovered workflow categories found");
            return GapDetection::default();
        }
        tracing::info!("Uncovered categories: {uncovered:?}");

        match self.request(corpus, &uncovered, scenarios).await {
            Ok(detection) => {
                tracing::info!("Proposed {} new scenario(s)", detection.proposals.len());
                detection
            }
            Err(e) => {
                tracing::error!("Failed to detect new scenarios: {e}");
                GapDetection::default()
            }
        }
    }

    async fn request(
        &self,
        corpus: &WorkflowCorpus,
        uncovered: &[String],
        scenarios: &[ScenarioName],
    ) -> LlmResult<GapDetection> {
        let prompt = prompts::gap_prompt(corpus, uncovered, &self.coverage, scenarios)?;
        let completion = self.service.complete(&prompt).await?;
        let cost = self.cost_model.estimate(&completion.usage);
        tracing::debug!(
            "New scenarios response (first 500 chars):\n{}",
            truncate_chars(&completion.text, 500)
        );

        let response: GapResponse = serde_json::from_str(&strip_fences(&completion.text))?;
        Ok(GapDetection {
            proposals: response.new_scenarios,
            cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Completion, Usage};
    use crate::LlmError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wfsync_core::{WorkflowKind, WorkflowRecord};

    struct Fixed {
        reply: Option<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionService for Fixed {
        async fn complete(&self, _prompt: &str) -> LlmResult<Completion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .clone()
                .map(|text| Completion {
                    text,
                    usage: Usage::default(),
                })
                .ok_or(LlmError::Api {
                    status: 503,
                    body: "unavailable".into(),
                })
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    fn fixed(reply: Option<&str>) -> Arc<Fixed> {
        Arc::new(Fixed {
            reply: reply.map(str::to_string),
            calls: AtomicUsize::new(0),
        })
    }

    fn corpus(categories: &[&str]) -> WorkflowCorpus {
        let mut corpus = WorkflowCorpus::new();
        for category in categories {
            corpus.insert(WorkflowRecord {
                category: (*category).to_string(),
                name: "wf".to_string(),
                kind: WorkflowKind::Document,
                declared_name: "wf".to_string(),
                description: String::new(),
                metadata: json!({}),
                excerpt: Some(String::new()),
                checksum: "0000000000000000".to_string(),
                path: format!("{category}/wf/workflow.md"),
            });
        }
        corpus
    }

    fn all_scenarios() -> Vec<ScenarioName> {
        ["workflow-complet", "quick-flow", "document-project"]
            .into_iter()
            .map(ScenarioName::from)
            .collect()
    }

    #[tokio::test]
    async fn test_fully_covered_skips_service() {
        let service = fixed(Some("{}"));
        let detector = ScenarioGapDetector::new(service.clone(), CoverageTable::bmad_default(), CostModel::default());

        let detection = detector
            .detect(&corpus(&["1-analysis", "testarch", "bmad-quick-flow"]), &all_scenarios())
            .await;
        assert!(detection.proposals.is_empty());
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_proposals_parsed() {
        let service = fixed(Some(
            "```json\n{\"new_scenarios\": [{\"scenario_name\": \"creative\", \"description\": \"CIS\", \"suggested_stories\": [{\"filename\": \"1-1-0-brainstorm.md\", \"summary\": \"s\"}]}]}\n```",
        ));
        let detector = ScenarioGapDetector::new(service.clone(), CoverageTable::bmad_default(), CostModel::default());

        let detection = detector.detect(&corpus(&["1-analysis", "cis"]), &all_scenarios()).await;
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(detection.proposals.len(), 1);
        assert_eq!(detection.proposals[0].scenario_name, "creative");
        assert_eq!(detection.proposals[0].suggested_stories[0].filename, "1-1-0-brainstorm.md");
    }

    #[tokio::test]
    async fn test_failures_degrade_to_empty() {
        let categories = corpus(&["cis"]);
        for reply in [None, Some("not json"), Some(r#"{"other": []}"#)] {
            let detector = ScenarioGapDetector::new(fixed(reply), CoverageTable::bmad_default(), CostModel::default());
            assert!(detector.detect(&categories, &all_scenarios()).await.proposals.is_empty());
        }
    }
}
