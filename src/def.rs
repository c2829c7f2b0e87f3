//! Pipelines described as JSON.
//!
//! ```json
//! {
//!   "context": { "frame": "12" },
//!   "tasks": [
//!     { "name": "writer", "file_name": "/out/${place}.####.txt" },
//!     {
//!       "name": "wedge",
//!       "kind": { "wedge": { "variable": "place", "values": ["london", "paris"] } },
//!       "pre_tasks": ["writer", null]
//!     }
//!   ]
//! }
//! ```
//!
//! Tasks may reference producers declared later in the list. A `null` entry
//! in `pre_tasks` is an unconnected slot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::PipelineError;
use crate::pipeline::{Pipeline, TaskId};
use crate::task::{Task, TaskKind};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PipelineDef {
    /// Root bindings, layered over the pipeline defaults.
    #[serde(default)]
    pub context: Context,
    #[serde(default)]
    pub tasks: Vec<TaskEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskEntry {
    pub name: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub kind: TaskKind,
    #[serde(default)]
    pub pre_tasks: Vec<Option<String>>,
}

impl PipelineDef {
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let mut pipeline = Pipeline::new();
        pipeline.set_context(Context::merge(&self.context, pipeline.context()));

        let mut ids: HashMap<String, TaskId> = HashMap::with_capacity(self.tasks.len());
        let mut order = Vec::with_capacity(self.tasks.len());

        for entry in &self.tasks {
            if ids.contains_key(&entry.name) {
                return Err(PipelineError::DuplicateTask(entry.name.clone()));
            }

            let mut task = Task::new(entry.name.clone());
            task.file_name = entry.file_name.clone();
            task.kind = entry.kind.clone();

            let id = pipeline.add_task(task)?;
            ids.insert(entry.name.clone(), id);
            order.push(id);
        }

        for (consumer, entry) in order.into_iter().zip(&self.tasks) {
            for (slot, name) in entry.pre_tasks.iter().enumerate() {
                let producer = match name {
                    Some(name) => Some(
                        *ids.get(name)
                            .ok_or_else(|| PipelineError::UnknownTask(name.clone()))?,
                    ),
                    None => None,
                };
                pipeline.connect(consumer, slot, producer)?;
            }
        }

        pipeline.validate()?;
        tracing::debug!(tasks = self.tasks.len(), "pipeline built from definition");

        Ok(pipeline)
    }
}

impl Pipeline {
    /// Parses and builds a pipeline from its JSON definition.
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        PipelineDef::from_json(json)?.build()
    }
}
