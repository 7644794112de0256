//! Prompt construction
//!
//! Both prompts embed the scanned data as pretty JSON; the excerpts were
//! already bounded by the scanners.

use crate::LlmResult;
use serde::Serialize;
use wfsync_core::{CoverageTable, ScenarioName, StoryRecord, WorkflowCorpus};

/// Story fields sent to the model
#[derive(Debug, Serialize)]
struct StoryView<'a> {
    filename: &'a str,
    wave: &'a str,
    epic: &'a str,
    story: &'a str,
    frontmatter: &'a serde_json::Value,
    content_preview: &'a str,
}

impl<'a> From<&'a StoryRecord> for StoryView<'a> {
    fn from(story: &'a StoryRecord) -> Self {
        Self {
            filename: &story.filename,
            wave: &story.wave,
            epic: &story.epic,
            story: &story.story,
            frontmatter: &story.frontmatter,
            content_preview: &story.content_preview,
        }
    }
}

fn join_names(names: &[ScenarioName]) -> String {
    names.iter().map(ScenarioName::as_str).collect::<Vec<_>>().join(", ")
}

const ANALYSIS_CONTEXT: &str = r"CONTEXT - META-BMAD FRAMEWORK:
These stories are META-STORIES to generate BMAD itself in Vibe Kanban.
The goal: execute BMAD workflows to generate COMPLETE STORY FILES that will be re-imported into Vibe Kanban.

A COMPLETE STORY FILE contains the ENTIRE lifecycle in ONE file:
- ATDD (acceptance tests before dev)
- Dev (implementation)
- Code review
- Test review
- Trace/traceability
All these steps are EMBEDDED in the story file, not separate stories.

STORY TYPES TO VERIFY:
1. PREPARATION STORIES (Waves 0-3):
   - Wave 0-1: Project setup, analysis, research, product brief
   - Wave 2: Planning (PRD, UX design, architecture)
   - Wave 3: Solutioning (epics/stories generation, implementation readiness)
   These create the INPUTS needed to generate complete stories.

2. STORY GENERATION (Wave 4):
   - Workflows that CREATE complete story files (with embedded ATDD, dev, review, trace)
   - Sprint planning, create-story workflows generate stories
   - dev-story workflow EXECUTES stories in Vibe Kanban - NOT a meta-story itself
   - After import-vibe-kanban, stories are executed ONE BY ONE in Vibe Kanban using dev-story
   - TEA workflows (atdd, test-review, trace) should be INTEGRATED into story generation, NOT separate stories
   - Code-review workflow is INTEGRATED into dev-story execution, NOT a separate story
   - Sprint-status, retrospective, correct-course are ORCHESTRATION workflows, NOT separate stories per feature

3. DOCUMENTATION (Wave 2-3, NOT after dev):
   - Diagrams (excalidraw) belong in architecture phase (Wave 2-3)
   - NOT in Wave 6 - they're needed BEFORE development

4. INFRASTRUCTURE & TOOLING (Valid meta-stories):
   - renumber-waves: Manual reorganization task for wave structure
   - import-vibe-kanban: External tooling integration scripts
   - Templates (X-X-X-*): Template files for story generation
   These are NORMAL and should NOT be deleted - they're part of the meta-framework

TASK:
Compare workflows with existing stories. Identify synchronization needs.

CRITICAL RULES:
- DO NOT propose separate stories for workflows that are EMBEDDED or EXECUTED in Vibe Kanban:
  * dev-story - executes stories IN Vibe Kanban after import, NOT a meta-story
  * code-review - runs automatically after dev-story
  * test-review - embedded in story completion
  * trace - embedded in story lifecycle
  * atdd - embedded in create-story
  * sprint-status - orchestration tool, not a feature story
  * retrospective - orchestration, runs after epic completion
  * correct-course - orchestration, triggered by changes
- DO NOT propose diagram stories in Wave 6 (they belong in Wave 2-3)
- DO NOT delete infrastructure stories: renumber-waves, import-vibe-kanban, template files (X-X-X-*)
  (These are valid meta-framework components)
- TEA workflows should enhance existing story generation, not create new stories
- One story can cover multiple workflow steps
- Only reference files that exist in provided data
- Follow naming: {wave}-{epic}-{story}-{slug}.md";

const ANALYSIS_SHAPE: &str = r#"Return JSON with this exact structure:
{
  "stories_to_delete": [
    {
      "file_path": "stories/.../file.md",
      "reason": "specific reason",
      "affects_other_scenarios": ["scenario-name-1", "scenario-name-2"] or [] if only this scenario
    }
  ],
  "stories_to_modify": [
    {
      "file_path": "stories/.../file.md",
      "current_summary": "what it currently covers",
      "changes_needed": ["specific change 1", "specific change 2"],
      "diff": "diff content WITHOUT code fences - just the raw diff lines",
      "affects_other_scenarios": ["scenario-name-1"] or [] if only this scenario
    }
  ],
  "stories_to_add": [
    {
      "filename": "1-2-3-new-feature.md",
      "wave": "1",
      "epic": "2",
      "story": "3",
      "summary": "brief summary of what this story should cover",
      "target_scenarios": ["workflow-complet"] or ["workflow-complet", "quick-flow"] if applies to multiple
    }
  ]
}

CRITICAL:
- Return valid JSON only
- Do NOT include actual newlines in string values - keep all text on single lines
- Do NOT wrap diff content in markdown code fences (```diff...```) - the report generator will add them
- Diff should be raw text without any wrapping"#;

/// Prompt asking for one scenario's synchronization actions
pub fn analysis_prompt(
    corpus: &WorkflowCorpus,
    stories: &[StoryRecord],
    scenario: &ScenarioName,
    all_scenarios: &[ScenarioName],
) -> LlmResult<String> {
    let workflows = serde_json::to_string_pretty(corpus)?;
    let story_views: Vec<StoryView<'_>> = stories.iter().map(StoryView::from).collect();
    let stories_json = serde_json::to_string_pretty(&story_views)?;

    Ok(format!(
        r#"You are analyzing BMAD workflow synchronization for the "{scenario}" scenario.

WORKFLOWS DATA:
{workflows}

EXISTING STORIES:
{stories_json}

{ANALYSIS_CONTEXT}

CROSS-SCENARIO AWARENESS:
- For delete/modify: Check if story exists in OTHER scenarios ({others})
  - If YES: list them in "affects_other_scenarios"
  - If NO: use empty array []
- For add: Specify ALL scenarios where this story should be added in "target_scenarios"
  - Example: qa-automate story → ["workflow-complet"] only
  - Example: project-context story → ["workflow-complet", "document-project"]

{ANALYSIS_SHAPE}"#,
        others = join_names(all_scenarios),
    ))
}

/// Prompt asking for new scenarios covering `uncovered` categories
pub fn gap_prompt(
    corpus: &WorkflowCorpus,
    uncovered: &[String],
    coverage: &CoverageTable,
    scenarios: &[ScenarioName],
) -> LlmResult<String> {
    let workflows = serde_json::to_string_pretty(&corpus.subset(uncovered.iter().map(String::as_str)))?;

    let existing: Vec<String> = scenarios
        .iter()
        .enumerate()
        .map(|(index, scenario)| {
            let categories = coverage
                .categories_for(scenario)
                .map(|c| c.iter().map(String::as_str).collect::<Vec<_>>().join(", "))
                .unwrap_or_default();
            format!("{}. {scenario}\n   - Already includes: {categories}", index + 1)
        })
        .collect();

    Ok(format!(
        r#"You have uncovered BMAD workflow categories: {uncovered:?}

Workflows in these categories:
{workflows}

CONTEXT - META-BMAD:
These are META-STORIES to generate BMAD. Stories create COMPLETE story files with embedded lifecycle.

EXISTING SCENARIOS & THEIR COVERAGE:
{existing}

IMPORTANT:
- DO NOT propose scenarios that would enrich existing ones
- ONLY propose truly DIFFERENT scenarios (new use cases, different workflows)
- If a workflow fits an existing scenario, it should be added to that scenario's stories, NOT a new scenario

Propose ONLY truly new scenarios (not enrichments of existing ones).

Return JSON:
{{
  "new_scenarios": [
    {{
      "scenario_name": "descriptive-name",
      "description": "what this scenario covers",
      "suggested_stories": [
        {{"filename": "1-1-0-story-name.md", "summary": "what it covers"}}
      ]
    }}
  ]
}}"#,
        existing = existing.join("\n"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wfsync_core::{WorkflowKind, WorkflowRecord};

    fn corpus() -> WorkflowCorpus {
        let mut corpus = WorkflowCorpus::new();
        for (category, name) in [("4-implementation", "dev-story"), ("cis", "brainstorm")] {
            corpus.insert(WorkflowRecord {
                category: category.to_string(),
                name: name.to_string(),
                kind: WorkflowKind::Config,
                declared_name: name.to_string(),
                description: String::new(),
                metadata: json!({"name": name}),
                excerpt: None,
                checksum: "0123456789abcdef".to_string(),
                path: format!("{category}/{name}/workflow.yaml"),
            });
        }
        corpus
    }

    fn story() -> StoryRecord {
        StoryRecord {
            file_path: "stories/quick-flow/1-1-0-quick-spec.md".to_string(),
            filename: "1-1-0-quick-spec.md".to_string(),
            wave: "1".to_string(),
            epic: "1".to_string(),
            story: "0".to_string(),
            slug: "quick-spec".to_string(),
            frontmatter: json!({"status": "ready"}),
            content_preview: "Spec the feature".to_string(),
        }
    }

    #[test]
    fn test_analysis_prompt_embeds_data_and_rules() {
        let scenarios = vec![ScenarioName::from("workflow-complet"), ScenarioName::from("quick-flow")];
        let prompt = analysis_prompt(&corpus(), &[story()], &scenarios[1], &scenarios).unwrap();

        assert!(prompt.contains(r#"for the "quick-flow" scenario"#));
        assert!(prompt.contains("\"dev-story\""));
        assert!(prompt.contains("\"filename\": \"1-1-0-quick-spec.md\""));
        assert!(!prompt.contains("stories/quick-flow/1-1-0-quick-spec.md\","));
        assert!(prompt.contains("code-review - runs automatically after dev-story"));
        assert!(prompt.contains("OTHER scenarios (workflow-complet, quick-flow)"));
        assert!(prompt.contains("Follow naming: {wave}-{epic}-{story}-{slug}.md"));
        assert!(prompt.contains("\"stories_to_add\": ["));
    }

    #[test]
    fn test_gap_prompt_lists_uncovered_only() {
        let scenarios = vec![ScenarioName::from("workflow-complet")];
        let prompt = gap_prompt(
            &corpus(),
            &["cis".to_string()],
            &CoverageTable::bmad_default(),
            &scenarios,
        )
        .unwrap();

        assert!(prompt.contains(r#"uncovered BMAD workflow categories: ["cis"]"#));
        assert!(prompt.contains("\"brainstorm\""));
        assert!(!prompt.contains("\"dev-story\""));
        assert!(prompt.contains("1. workflow-complet\n   - Already includes: 1-analysis"));
        assert!(prompt.contains("\"new_scenarios\": ["));
    }
}
