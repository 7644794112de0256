//! Analysis results and new-scenario proposals
//!
//! The field names are the JSON contract shared by the completion prompt, the
//! validator and the on-disk cache.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// JSON key of the deletion section
pub const DELETIONS_KEY: &str = "stories_to_delete";
/// JSON key of the modification section
pub const MODIFICATIONS_KEY: &str = "stories_to_modify";
/// JSON key of the addition section
pub const ADDITIONS_KEY: &str = "stories_to_add";
/// Sections every analysis payload must carry
pub const REQUIRED_SECTIONS: [&str; 3] = [DELETIONS_KEY, MODIFICATIONS_KEY, ADDITIONS_KEY];

/// Outcome of one scenario's analysis
///
/// The three sections are required on deserialization so that an incomplete
/// cache entry or payload is rejected rather than silently defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "stories_to_delete")]
    pub deletions: Vec<Deletion>,
    #[serde(rename = "stories_to_modify")]
    pub modifications: Vec<Modification>,
    #[serde(rename = "stories_to_add")]
    pub additions: Vec<Addition>,
}

impl AnalysisResult {
    /// Result proposing no changes
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn total_actions(&self) -> usize {
        self.deletions.len() + self.modifications.len() + self.additions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_actions() == 0
    }
}

/// A story that should be removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deletion {
    pub file_path: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reason: String,
    /// Other scenarios holding the same story
    #[serde(default, deserialize_with = "lenient_set")]
    pub affects_other_scenarios: BTreeSet<String>,
}

/// A story that should be rewritten
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    pub file_path: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub current_summary: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub changes_needed: Vec<String>,
    /// Raw diff lines, without code fences
    #[serde(default, deserialize_with = "lenient_string")]
    pub diff: String,
    #[serde(default, deserialize_with = "lenient_set")]
    pub affects_other_scenarios: BTreeSet<String>,
}

/// A story that should be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addition {
    pub filename: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub wave: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub epic: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub story: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: String,
    /// Every scenario the story belongs to
    #[serde(default, deserialize_with = "lenient_set")]
    pub target_scenarios: BTreeSet<String>,
}

/// A scenario proposed for uncovered workflow categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewScenarioProposal {
    pub scenario_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default)]
    pub suggested_stories: Vec<SuggestedStory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedStory {
    pub filename: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: String,
}

// Only the story references and proposed filenames are checked before
// conversion, so every other field takes whatever JSON the model produced.

fn text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Strings, numbers such as a wave written as `1`, and `null` as empty
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text(Value::deserialize(deserializer)?))
}

/// A list of texts; `null` is empty and a lone value is a one-item list
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(text)
            .collect(),
        other => vec![text(other)],
    })
}

fn lenient_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_list(deserializer)?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_requires_all_sections() {
        let partial = json!({"stories_to_delete": [], "stories_to_modify": []});
        assert!(serde_json::from_value::<AnalysisResult>(partial).is_err());

        let complete = json!({
            "stories_to_delete": [],
            "stories_to_modify": [],
            "stories_to_add": []
        });
        let result: AnalysisResult = serde_json::from_value(complete).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_lenient_entry_fields() {
        let payload = json!({
            "stories_to_delete": [{"file_path": "stories/quick-flow/1-1-0-a.md", "reason": "dup", "affects_other_scenarios": null}],
            "stories_to_modify": [],
            "stories_to_add": [{
                "filename": "1-2-3-feature.md",
                "wave": 1, "epic": "2", "story": 3,
                "summary": "new",
                "target_scenarios": ["workflow-complet", "quick-flow", "quick-flow"]
            }]
        });
        let result: AnalysisResult = serde_json::from_value(payload).unwrap();
        assert!(result.deletions[0].affects_other_scenarios.is_empty());
        let addition = &result.additions[0];
        assert_eq!(addition.wave, "1");
        assert_eq!(addition.story, "3");
        assert_eq!(addition.target_scenarios.len(), 2);
        assert_eq!(result.total_actions(), 2);
    }

    #[test]
    fn test_loose_field_types() {
        let payload = json!({
            "stories_to_delete": [{"file_path": "stories/quick-flow/1-1-0-a.md", "reason": null}],
            "stories_to_modify": [{
                "file_path": "stories/quick-flow/1-1-1-b.md",
                "current_summary": null,
                "changes_needed": "Mention adversarial review",
                "diff": null,
                "affects_other_scenarios": "workflow-complet"
            }],
            "stories_to_add": [{
                "filename": "1-2-3-feature.md",
                "summary": null,
                "target_scenarios": ["quick-flow", 2, null]
            }]
        });
        let result: AnalysisResult = serde_json::from_value(payload).unwrap();

        assert_eq!(result.deletions[0].reason, "");
        let modification = &result.modifications[0];
        assert_eq!(modification.current_summary, "");
        assert_eq!(modification.diff, "");
        assert_eq!(modification.changes_needed, vec!["Mention adversarial review"]);
        assert!(modification.affects_other_scenarios.contains("workflow-complet"));
        let targets: Vec<&str> = result.additions[0].target_scenarios.iter().map(String::as_str).collect();
        assert_eq!(targets, vec!["2", "quick-flow"]);
    }

    #[test]
    fn test_serializes_contract_keys() {
        let value = serde_json::to_value(AnalysisResult::empty()).unwrap();
        for key in REQUIRED_SECTIONS {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }
}
