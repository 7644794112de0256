//! Workflow definitions grouped by category

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source format of a workflow definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowKind {
    /// `workflow.md`: front matter header plus markdown body
    #[serde(rename = "md")]
    Document,
    /// `workflow.yaml`: structured config
    #[serde(rename = "yaml")]
    Config,
}

/// One scanned workflow definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    /// Category (first directory below the workflow root)
    pub category: String,
    /// Workflow name (directory holding the workflow file)
    pub name: String,
    /// Source format
    #[serde(rename = "type")]
    pub kind: WorkflowKind,
    /// `name` field declared in the file, empty when absent
    pub declared_name: String,
    /// `description` field declared in the file, empty when absent
    pub description: String,
    /// Front matter (documents) or whole parsed config (configs)
    pub metadata: serde_json::Value,
    /// Bounded body excerpt, documents only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    /// Content fingerprint of the file bytes
    pub checksum: String,
    /// Path relative to the workflow root
    pub path: String,
}

/// All workflows of a run: category -> name -> record, in sorted order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowCorpus(BTreeMap<String, BTreeMap<String, WorkflowRecord>>);

impl WorkflowCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under its category, replacing a same-named one
    pub fn insert(&mut self, record: WorkflowRecord) {
        self.0
            .entry(record.category.clone())
            .or_default()
            .insert(record.name.clone(), record);
    }

    /// Merge another corpus; its categories replace ours wholesale
    pub fn merge(&mut self, other: Self) {
        for (category, workflows) in other.0 {
            self.0.insert(category, workflows);
        }
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn category(&self, name: &str) -> Option<&BTreeMap<String, WorkflowRecord>> {
        self.0.get(name)
    }

    pub fn records(&self) -> impl Iterator<Item = &WorkflowRecord> {
        self.0.values().flat_map(BTreeMap::values)
    }

    /// Checksums of every workflow, in category/name order
    pub fn checksums(&self) -> Vec<&str> {
        self.records().map(|r| r.checksum.as_str()).collect()
    }

    /// Sub-corpus restricted to the given categories
    pub fn subset<'a>(&self, categories: impl IntoIterator<Item = &'a str>) -> Self {
        let mut subset = BTreeMap::new();
        for category in categories {
            if let Some(workflows) = self.0.get(category) {
                subset.insert(category.to_string(), workflows.clone());
            }
        }
        Self(subset)
    }

    pub fn category_count(&self) -> usize {
        self.0.len()
    }

    pub fn workflow_count(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
