use petgraph::Direction;
use petgraph::Graph;
use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use petgraph::visit::{Dfs, EdgeRef};

use crate::context::{Context, FRAME};
use crate::error::{LocateError, PipelineError};
use crate::files::SourceFiles;
use crate::graph::{PreTask, TaskGraph};
use crate::locator::SourceFileLocator;
use crate::task::{Task, TaskKind};

/// Identifies a task inside a [`Pipeline`].
pub type TaskId = NodeIndex;

/// A graph of tasks wired together through their pre-task slots.
///
/// Edges run from producer to consumer and are weighted with the consumer's
/// slot number. The pipeline also carries the root context tasks are
/// dispatched under.
///
/// # Example
///
/// ```rust
/// use tributary::Pipeline;
///
/// let mut pipeline = Pipeline::new();
/// let writer = pipeline.task("writer").file_name("/out/${place}.txt").add()?;
/// let wedge = pipeline
///     .task("wedge")
///     .wedge("place", ["london", "paris"])
///     .pre_task(writer)
///     .add()?;
///
/// let files = pipeline.locate_source_files(wedge)?;
/// assert_eq!(files.get(&writer).map(<[_]>::len), Some(2));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub(crate) graph: Graph<Task, usize>,
    context: Context,
}

impl Pipeline {
    /// Creates an empty pipeline whose root context sits on frame 1.
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            context: Context::new().with(FRAME, "1"),
        }
    }

    /// Starts the definition of a new task.
    pub fn task(&mut self, name: impl Into<String>) -> TaskDef<'_> {
        TaskDef {
            pipeline: self,
            task: Task::new(name),
        }
    }

    pub(crate) fn add_task(&mut self, task: Task) -> Result<TaskId, PipelineError> {
        if let Some(producer) = task.inputs.iter().flatten().find(|&&p| !self.contains(p)) {
            return Err(PipelineError::UnknownTask(format!("#{}", producer.index())));
        }

        let inputs = task.inputs.clone();
        let index = self.graph.add_node(task);

        for (slot, input) in inputs.into_iter().enumerate() {
            if let Some(producer) = input {
                self.graph.add_edge(producer, index, slot);
            }
        }

        Ok(index)
    }

    /// The root context, bound outside of any task.
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub(crate) fn set_context(&mut self, context: Context) {
        self.context = context;
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.graph.node_weight(id)
    }

    /// Looks up the first task called `name`.
    pub fn find(&self, name: &str) -> Option<TaskId> {
        self.graph
            .node_indices()
            .find(|&index| self.graph[index].name == name)
    }

    pub fn tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.graph.node_indices()
    }

    /// Connects `producer` to input `slot` of `consumer`, replacing whatever
    /// was connected there. Passing `None` disconnects the slot.
    pub fn connect(
        &mut self,
        consumer: TaskId,
        slot: usize,
        producer: Option<TaskId>,
    ) -> Result<(), PipelineError> {
        if let Some(producer) = producer {
            if self.graph.node_weight(producer).is_none() {
                return Err(PipelineError::UnknownTask(format!("#{}", producer.index())));
            }
        }

        let task = self
            .graph
            .node_weight_mut(consumer)
            .ok_or_else(|| PipelineError::UnknownTask(format!("#{}", consumer.index())))?;

        if task.inputs.len() <= slot {
            task.inputs.resize(slot + 1, None);
        }
        task.inputs[slot] = producer;

        let previous = self
            .graph
            .edges_directed(consumer, Direction::Incoming)
            .find(|edge| *edge.weight() == slot)
            .map(|edge| edge.id());

        if let Some(edge) = previous {
            self.graph.remove_edge(edge);
        }

        if let Some(producer) = producer {
            self.graph.add_edge(producer, consumer, slot);
        }

        Ok(())
    }

    /// Checks that the pipeline is acyclic.
    pub fn validate(&self) -> Result<(), PipelineError> {
        toposort(&self.graph, None)
            .map(|_| ())
            .map_err(|cycle| PipelineError::CyclicGraph(self.graph[cycle.node_id()].name.clone()))
    }

    /// Locates the files written upstream of `start`, under the pipeline's
    /// root context.
    pub fn locate_source_files(&self, start: TaskId) -> Result<SourceFiles<TaskId>, LocateError> {
        SourceFileLocator::new(self, self.context.clone()).locate(start)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskGraph for Pipeline {
    type Node = TaskId;

    fn contains(&self, node: TaskId) -> bool {
        self.graph.node_weight(node).is_some()
    }

    fn name(&self, node: TaskId) -> &str {
        &self.graph[node].name
    }

    fn file_name(&self, node: TaskId) -> Option<&str> {
        self.graph[node].file_name()
    }

    fn pre_tasks(&self, node: TaskId, context: &Context) -> Vec<PreTask<TaskId>> {
        self.graph[node].pre_tasks(context)
    }

    fn is_sink(&self, node: TaskId) -> bool {
        self.graph
            .neighbors_directed(node, Direction::Outgoing)
            .next()
            .is_none()
    }

    fn descendants_matching(
        &self,
        node: TaskId,
        predicate: &dyn Fn(TaskId) -> bool,
    ) -> Vec<TaskId> {
        let mut found = Vec::new();
        let mut dfs = Dfs::new(&self.graph, node);

        while let Some(next) = dfs.next(&self.graph) {
            if next != node && predicate(next) {
                found.push(next);
            }
        }

        found.sort();
        found
    }
}

impl std::fmt::Display for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "graph RL")?;

        for index in self.graph.node_indices() {
            let task = &self.graph[index];
            let name = task.name.replace('"', "\\\"");

            match &task.file_name {
                Some(file_name) => {
                    let file_name = file_name.replace('"', "\\\"");
                    writeln!(f, "    {}[\"{}<br/>{}\"]", index.index(), name, file_name)?
                }
                None => writeln!(f, "    {}[\"{}\"]", index.index(), name)?,
            }
        }

        for edge in self.graph.edge_references() {
            writeln!(
                f,
                "    {} -- \"{}\" --> {}",
                edge.target().index(),
                edge.weight(),
                edge.source().index()
            )?;
        }

        Ok(())
    }
}

/// Builder returned by [`Pipeline::task`].
pub struct TaskDef<'a> {
    pipeline: &'a mut Pipeline,
    task: Task,
}

impl<'a> TaskDef<'a> {
    /// Template of the file this task writes.
    pub fn file_name(mut self, template: impl Into<String>) -> Self {
        self.task.file_name = Some(template.into());
        self
    }

    /// Runs the pre-tasks once per value, with `variable` bound to it.
    pub fn wedge<I, S>(mut self, variable: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.task.kind = TaskKind::Wedge {
            variable: variable.into(),
            values: values.into_iter().map(Into::into).collect(),
        };
        self
    }

    /// Runs the pre-tasks with additional bindings.
    pub fn variables(mut self, variables: Context) -> Self {
        self.task.kind = TaskKind::Variables(variables);
        self
    }

    /// Runs only one pre-task, see [`TaskKind::Switch`].
    pub fn switch(mut self, variable: Option<&str>, index: usize) -> Self {
        self.task.kind = TaskKind::Switch {
            variable: variable.map(str::to_string),
            index,
        };
        self
    }

    /// Appends an input slot connected to `producer`.
    pub fn pre_task(mut self, producer: TaskId) -> Self {
        self.task.inputs.push(Some(producer));
        self
    }

    /// Appends an input slot with nothing connected to it.
    pub fn unconnected(mut self) -> Self {
        self.task.inputs.push(None);
        self
    }

    /// Adds the task to the pipeline. Fails if a pre-task is not part of it.
    pub fn add(self) -> Result<TaskId, PipelineError> {
        self.pipeline.add_task(self.task)
    }
}
