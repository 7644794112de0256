//! End-to-end sync runs against a temporary BMAD project and a scripted
//! completion service.

use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use wfsync_core::{ScenarioName, SyncSettings};
use wfsync_llm::{Completion, CompletionService, LlmError, LlmResult, SyncRunner, Usage};

const ANALYSIS_REPLY: &str = r#"```json
{
  "stories_to_delete": [],
  "stories_to_modify": [
    {
      "file_path": "stories/quick-flow/1-1-0-quick-spec.md",
      "current_summary": "Quick spec",
      "changes_needed": ["Mention adversarial review"],
      "diff": "+ adversarial review",
      "affects_other_scenarios": []
    }
  ],
  "stories_to_add": [
    {"filename": "1-1-1-quick-dev.md", "wave": "1", "epic": "1", "story": "1", "summary": "Run quick-dev", "target_scenarios": ["quick-flow"]},
  ]
}
```"#;

const EMPTY_REPLY: &str =
    r#"{"stories_to_delete": [], "stories_to_modify": [], "stories_to_add": []}"#;

const GAP_REPLY: &str = r#"{"new_scenarios": [{"scenario_name": "creative-sessions", "description": "CIS workflows", "suggested_stories": [{"filename": "1-1-0-brainstorm.md", "summary": "Brainstorm"}]}]}"#;

/// Answers analysis and gap prompts with fixed replies and counts calls
struct Scripted {
    analysis_reply: String,
    analysis_calls: AtomicUsize,
    gap_calls: AtomicUsize,
}

impl Scripted {
    fn new(analysis_reply: &str) -> Arc<Self> {
        Arc::new(Self {
            analysis_reply: analysis_reply.to_string(),
            analysis_calls: AtomicUsize::new(0),
            gap_calls: AtomicUsize::new(0),
        })
    }

    fn analysis_calls(&self) -> usize {
        self.analysis_calls.load(Ordering::SeqCst)
    }

    fn gap_calls(&self) -> usize {
        self.gap_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionService for Scripted {
    async fn complete(&self, prompt: &str) -> LlmResult<Completion> {
        let text = if prompt.contains("uncovered BMAD workflow categories") {
            self.gap_calls.fetch_add(1, Ordering::SeqCst);
            GAP_REPLY.to_string()
        } else {
            self.analysis_calls.fetch_add(1, Ordering::SeqCst);
            self.analysis_reply.clone()
        };
        Ok(Completion {
            text,
            usage: Usage {
                input_tokens: 2_000,
                output_tokens: 400,
            },
        })
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        &root.join("_bmad/bmm/workflows/bmad-quick-flow/quick-dev/workflow.md"),
        "---\nname: quick-dev\ndescription: Implement a quick spec\n---\n# Quick dev\n",
    );
    write(
        &root.join("_bmad/bmm/workflows/cis/brainstorm/workflow.yaml"),
        "name: brainstorm\ndescription: Creative session\n",
    );
    write(
        &root.join("stories/quick-flow/1-1-0-quick-spec.md"),
        "---\nstatus: done\n---\nWrite the quick spec.\n",
    );
    dir
}

fn settings() -> SyncSettings {
    SyncSettings {
        scenarios: vec!["quick-flow".to_string()],
        base_delay_ms: 1,
        ..SyncSettings::default()
    }
}

#[tokio::test]
async fn test_miss_then_hit() {
    let project = project();
    let service = Scripted::new(ANALYSIS_REPLY);

    let first = SyncRunner::new(settings(), project.path(), service.clone())
        .run()
        .await
        .unwrap();
    assert_eq!(first.cache_misses, 1);
    assert_eq!(first.cache_hits, 0);
    assert_eq!(service.analysis_calls(), 1);
    let (scenario, result) = &first.results[0];
    assert_eq!(scenario, &ScenarioName::from("quick-flow"));
    assert_eq!(result.modifications.len(), 1);
    assert_eq!(result.additions[0].filename, "1-1-1-quick-dev.md");
    assert_eq!(first.proposals[0].scenario_name, "creative-sessions");
    assert!(first.total_cost > 0.0);

    let second = SyncRunner::new(settings(), project.path(), service.clone())
        .run()
        .await
        .unwrap();
    assert_eq!(second.cache_hits, 1);
    assert_eq!(service.analysis_calls(), 1);
    assert_eq!(second.results, first.results);
    assert_eq!(service.gap_calls(), 2);
}

#[tokio::test]
async fn test_story_change_invalidates_cache() {
    let project = project();
    let service = Scripted::new(ANALYSIS_REPLY);

    SyncRunner::new(settings(), project.path(), service.clone())
        .run()
        .await
        .unwrap();
    write(
        &project.path().join("stories/quick-flow/1-1-0-quick-spec.md"),
        "---\nstatus: in-progress\n---\nWrite the quick spec.\n",
    );
    let outcome = SyncRunner::new(settings(), project.path(), service.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.cache_misses, 1);
    assert_eq!(service.analysis_calls(), 2);
}

#[tokio::test]
async fn test_dry_run_never_calls_service() {
    let project = project();

    let cold = SyncRunner::dry_run(settings(), project.path()).run().await.unwrap();
    assert!(cold.results[0].1.is_empty());
    assert!(cold.proposals.is_empty());
    assert_eq!(cold.cache_misses, 1);
    assert!(!project.path().join(&settings().cache_dir).exists());

    let service = Scripted::new(ANALYSIS_REPLY);
    SyncRunner::new(settings(), project.path(), service).run().await.unwrap();

    let warm = SyncRunner::dry_run(settings(), project.path()).run().await.unwrap();
    assert_eq!(warm.cache_hits, 1);
    assert_eq!(warm.results[0].1.additions.len(), 1);
}

#[tokio::test]
async fn test_exhausted_retries_abort_run() {
    let project = project();
    let service = Scripted::new(
        r#"{"stories_to_delete": [{"file_path": "stories/quick-flow/9-9-9-missing.md", "reason": "x"}], "stories_to_modify": [], "stories_to_add": []}"#,
    );

    let err = SyncRunner::new(settings(), project.path(), service.clone())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::Validation(_)));
    assert_eq!(service.analysis_calls(), 3);
    assert_eq!(service.gap_calls(), 0);
    assert!(!project.path().join(&settings().cache_dir).exists());
}

#[tokio::test]
async fn test_scenario_selection() {
    let project = project();
    let mut runner = SyncRunner::dry_run(SyncSettings::default(), project.path());

    assert!(matches!(
        runner.select_scenario("unknown"),
        Err(LlmError::Config(message)) if message.contains("quick-flow")
    ));

    runner.select_scenario("quick-flow").unwrap();
    assert!(runner.is_dry_run());
    assert_eq!(runner.project_root(), project.path());
    let outcome = runner.run().await.unwrap();
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].0.as_str(), "quick-flow");
}

#[tokio::test]
async fn test_gap_detection_uses_analyzed_scenarios() {
    let project = tempfile::tempdir().unwrap();
    let root = project.path();
    write(
        &root.join("_bmad/bmm/workflows/1-analysis/product-brief/workflow.md"),
        "---\nname: product-brief\n---\n# Brief\n",
    );
    write(
        &root.join("_bmad/bmm/workflows/bmad-quick-flow/quick-dev/workflow.md"),
        "---\nname: quick-dev\n---\n# Quick dev\n",
    );

    let all = Scripted::new(EMPTY_REPLY);
    SyncRunner::new(SyncSettings::default(), root, all.clone())
        .run()
        .await
        .unwrap();
    assert_eq!(all.gap_calls(), 0);

    let single = Scripted::new(EMPTY_REPLY);
    let mut runner = SyncRunner::new(SyncSettings::default(), root, single.clone());
    runner.select_scenario("quick-flow").unwrap();
    assert!(!runner.is_dry_run());
    let outcome = runner.run().await.unwrap();

    assert_eq!(single.gap_calls(), 1);
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.proposals[0].scenario_name, "creative-sessions");
}
