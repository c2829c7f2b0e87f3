use thiserror::Error;

/// Errors raised while locating source files.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocateError {
    #[error("Cycle detected in task graph at '{0}'")]
    CyclicGraph(String),

    #[error("Task '{0}' is not part of the graph")]
    UnknownNode(String),
}

/// Errors raised while assembling a [`Pipeline`](crate::Pipeline).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Task '{0}' not found")]
    UnknownTask(String),

    #[error("Task '{0}' is declared more than once")]
    DuplicateTask(String),

    #[error("Cycle detected in task graph at '{0}'")]
    CyclicGraph(String),

    #[error("Couldn't parse pipeline definition.\n{0}")]
    Definition(#[from] serde_json::Error),
}
