#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod context;
mod def;
mod error;
mod files;
mod graph;
mod locator;
mod pipeline;
mod task;
pub mod template;
mod utils;
mod walker;

pub use crate::context::{Context, FRAME};
pub use crate::def::{PipelineDef, TaskEntry};
pub use crate::error::*;
pub use crate::files::SourceFiles;
pub use crate::graph::{PreTask, TaskGraph};
pub use crate::locator::{LocateOptions, SourceFileLocator};
pub use crate::pipeline::{Pipeline, TaskDef, TaskId};
pub use crate::task::{Task, TaskKind};
pub use crate::template::{
    FilePathClassifier, PathClassifier, PathTemplateResolver, UnboundVariables,
};
#[cfg(feature = "logging")]
pub use crate::utils::init_logging;
pub use crate::walker::{GraphWalker, Scope};
