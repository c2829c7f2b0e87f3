use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::graph::PreTask;

/// How a task turns its input slots into pre-tasks.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Every slot is one pre-task, run under the task's own context.
    #[default]
    Task,
    /// Parameter sweep: all slots run once per value, with `variable` bound to
    /// that value.
    Wedge {
        variable: String,
        values: Vec<String>,
    },
    /// All slots run with additional bindings.
    Variables(Context),
    /// Only one slot runs, chosen by the integer bound to `variable` or, when
    /// that is missing, by `index`. The choice wraps around the slot count.
    Switch {
        #[serde(default)]
        variable: Option<String>,
        #[serde(default)]
        index: usize,
    },
}

/// A node of a [`Pipeline`](crate::Pipeline).
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub(crate) name: String,
    pub(crate) file_name: Option<String>,
    pub(crate) kind: TaskKind,
    pub(crate) inputs: Vec<Option<NodeIndex>>,
}

impl Task {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            kind: TaskKind::default(),
            inputs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    /// Producers connected to each input slot, in slot order.
    pub fn inputs(&self) -> &[Option<NodeIndex>] {
        &self.inputs
    }

    pub(crate) fn pre_tasks(&self, context: &Context) -> Vec<PreTask<NodeIndex>> {
        match &self.kind {
            TaskKind::Task => self.each_input(&Context::new()),
            TaskKind::Variables(variables) => self.each_input(variables),
            TaskKind::Wedge { variable, values } => values
                .iter()
                .flat_map(|value| {
                    let overrides = Context::new().with(variable.as_str(), value.as_str());
                    self.each_input(&overrides)
                })
                .collect(),
            TaskKind::Switch { variable, index } => {
                if self.inputs.is_empty() {
                    return vec![];
                }

                let selected = variable
                    .as_deref()
                    .and_then(|name| self.switch_index(name, context))
                    .unwrap_or(*index as i64);
                let slot = selected.rem_euclid(self.inputs.len() as i64) as usize;

                vec![PreTask::new(self.inputs[slot], Context::new())]
            }
        }
    }

    fn each_input(&self, overrides: &Context) -> Vec<PreTask<NodeIndex>> {
        self.inputs
            .iter()
            .map(|input| PreTask::new(*input, overrides.clone()))
            .collect()
    }

    fn switch_index(&self, variable: &str, context: &Context) -> Option<i64> {
        let value = context.get(variable)?;
        match value.trim().parse() {
            Ok(index) => Some(index),
            Err(_) => {
                tracing::warn!(task = %self.name, variable, value, "switch index is not an integer");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_inputs(kind: TaskKind, inputs: &[Option<usize>]) -> Task {
        let mut task = Task::new("t");
        task.kind = kind;
        task.inputs = inputs.iter().map(|i| i.map(NodeIndex::new)).collect();
        task
    }

    #[test]
    fn test_plain_task() {
        let task = with_inputs(TaskKind::Task, &[Some(1), None]);
        let pre = task.pre_tasks(&Context::new());

        assert_eq!(pre.len(), 2);
        assert_eq!(pre[0].producer, Some(NodeIndex::new(1)));
        assert_eq!(pre[1].producer, None);
        assert!(pre.iter().all(|p| p.context.is_empty()));
    }

    #[test]
    fn test_wedge_is_value_major() {
        let kind = TaskKind::Wedge {
            variable: "place".into(),
            values: vec!["london".into(), "paris".into()],
        };
        let task = with_inputs(kind, &[Some(1), Some(2)]);
        let pre = task.pre_tasks(&Context::new());

        let seen: Vec<_> = pre
            .iter()
            .map(|p| (p.producer.map(|n| n.index()), p.context.get("place")))
            .collect();

        assert_eq!(
            seen,
            [
                (Some(1), Some("london")),
                (Some(2), Some("london")),
                (Some(1), Some("paris")),
                (Some(2), Some("paris")),
            ]
        );
    }

    #[test]
    fn test_variables() {
        let vars = Context::new().with("a", "1");
        let task = with_inputs(TaskKind::Variables(vars.clone()), &[Some(3)]);

        assert_eq!(task.pre_tasks(&Context::new())[0].context, vars);
    }

    #[test]
    fn test_switch() {
        let kind = TaskKind::Switch {
            variable: Some("pick".into()),
            index: 1,
        };
        let task = with_inputs(kind, &[Some(10), Some(11), Some(12)]);

        let producers = |ctx: &Context| -> Vec<_> {
            task.pre_tasks(ctx)
                .into_iter()
                .map(|p| p.producer.map(|n| n.index()))
                .collect()
        };

        assert_eq!(producers(&Context::new()), [Some(11)]);
        assert_eq!(producers(&Context::new().with("pick", "2")), [Some(12)]);
        assert_eq!(producers(&Context::new().with("pick", "4")), [Some(11)]);
        assert_eq!(producers(&Context::new().with("pick", "-1")), [Some(12)]);
        assert_eq!(producers(&Context::new().with("pick", "nope")), [Some(11)]);

        let empty = with_inputs(TaskKind::Switch { variable: None, index: 0 }, &[]);
        assert!(empty.pre_tasks(&Context::new()).is_empty());
    }

    #[test]
    fn test_kind_json() {
        let kind: TaskKind =
            serde_json::from_str(r#"{"wedge":{"variable":"v","values":["a","b"]}}"#).unwrap();
        assert_eq!(
            kind,
            TaskKind::Wedge {
                variable: "v".into(),
                values: vec!["a".into(), "b".into()],
            }
        );

        let kind: TaskKind = serde_json::from_str(r#""task""#).unwrap();
        assert_eq!(kind, TaskKind::Task);

        let kind: TaskKind = serde_json::from_str(r#"{"switch":{"variable":"i"}}"#).unwrap();
        assert_eq!(
            kind,
            TaskKind::Switch {
                variable: Some("i".into()),
                index: 0,
            }
        );
    }
}
