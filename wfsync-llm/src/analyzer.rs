//! One scenario's analysis: prompt, request, parse, validate, retried

use crate::client::{CompletionService, CostModel};
use crate::response::parse_payload;
use crate::retry::{AttemptOutcome, Retried, RetryPolicy};
use crate::validation::validate_payload;
use crate::{prompts, LlmResult};
use std::sync::Arc;
use wfsync_core::{AnalysisResult, ScenarioName, StoryRecord, WorkflowCorpus};

pub struct ScenarioAnalyzer {
    service: Arc<dyn CompletionService>,
    cost_model: CostModel,
    retry: RetryPolicy,
}

impl ScenarioAnalyzer {
    pub fn new(service: Arc<dyn CompletionService>, cost_model: CostModel, retry: RetryPolicy) -> Self {
        Self {
            service,
            cost_model,
            retry,
        }
    }

    /// Analyze one scenario, retrying failed attempts with backoff
    pub async fn analyze(
        &self,
        corpus: &WorkflowCorpus,
        stories: &[StoryRecord],
        scenario: &ScenarioName,
        all_scenarios: &[ScenarioName],
    ) -> LlmResult<Retried<AnalysisResult>> {
        tracing::info!("Analyzing scenario: {scenario} (model {})", self.service.model());
        let prompt = prompts::analysis_prompt(corpus, stories, scenario, all_scenarios)?;
        tracing::debug!("Prompt length: {} chars", prompt.chars().count());
        tracing::debug!("Full prompt:\n{prompt}");

        let retried = self.retry.run(|_| self.attempt(&prompt, stories)).await?;
        tracing::info!(
            "Scenario {scenario} analyzed in {} attempt(s), cost ${:.4}",
            retried.attempts,
            retried.total_cost
        );
        Ok(retried)
    }

    /// A single request, parse and validation pass
    pub async fn attempt(&self, prompt: &str, stories: &[StoryRecord]) -> AttemptOutcome<AnalysisResult> {
        let completion = match self.service.complete(prompt).await {
            Ok(completion) => completion,
            Err(e) => return AttemptOutcome::new(Err(e), 0.0),
        };

        let usage = completion.usage;
        let cost = self.cost_model.estimate(&usage);
        tracing::info!(
            "LLM usage: {} input + {} output = {} tokens",
            usage.input_tokens,
            usage.output_tokens,
            usage.total()
        );
        tracing::info!("Estimated cost: ${cost:.4}");

        let result = parse_payload(&completion.text).and_then(|payload| {
            validate_payload(&payload, stories)?;
            tracing::debug!(
                "Full LLM response:\n{}",
                serde_json::to_string_pretty(&payload).unwrap_or_default()
            );
            Ok(serde_json::from_value::<AnalysisResult>(payload)?)
        });
        AttemptOutcome::new(result, cost)
    }
}
