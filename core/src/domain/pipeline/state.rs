use std::fmt;

use serde::Serialize;

use crate::domain::common::entities::app_errors::ErrorKind;

/// A non-terminal step of a pipeline execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Decoding,
    Classifying,
    Prompting,
    Generating,
    Parsing,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Decoding => "decoding",
            Stage::Classifying => "classifying",
            Stage::Prompting => "prompting",
            Stage::Generating => "generating",
            Stage::Parsing => "parsing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable state of one execution:
/// `Received → Decoding → Classifying → Prompting → Generating → Parsing →
/// Completed`, or `Failed` from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    Decoding,
    Classifying,
    Prompting,
    Generating,
    Parsing,
    Completed,
    Failed(ErrorKind),
}

impl PipelineState {
    /// The stage in progress, `None` once terminal.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Received => Some(Stage::Received),
            PipelineState::Decoding => Some(Stage::Decoding),
            PipelineState::Classifying => Some(Stage::Classifying),
            PipelineState::Prompting => Some(Stage::Prompting),
            PipelineState::Generating => Some(Stage::Generating),
            PipelineState::Parsing => Some(Stage::Parsing),
            PipelineState::Completed | PipelineState::Failed(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stage().is_none()
    }
}

impl From<Stage> for PipelineState {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Received => PipelineState::Received,
            Stage::Decoding => PipelineState::Decoding,
            Stage::Classifying => PipelineState::Classifying,
            Stage::Prompting => PipelineState::Prompting,
            Stage::Generating => PipelineState::Generating,
            Stage::Parsing => PipelineState::Parsing,
        }
    }
}
