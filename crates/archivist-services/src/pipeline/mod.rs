mod decision;
mod orchestrator;

pub use decision::{DecisionProvider, PresetDecisions};
pub use orchestrator::{FolderOutcome, Pipeline, RunOutcome, RunSummary};
