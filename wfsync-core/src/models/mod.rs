//! Data models for workflow-sync
//!
//! Workflows and stories are rebuilt from disk on every run; analysis results
//! are the only records that outlive a run (through the result cache).

pub mod analysis;
pub mod scenario;
pub mod story;
pub mod workflow;

pub use analysis::{
    Addition, AnalysisResult, Deletion, Modification, NewScenarioProposal, SuggestedStory,
};
pub use scenario::ScenarioName;
pub use story::StoryRecord;
pub use workflow::{WorkflowCorpus, WorkflowKind, WorkflowRecord};
