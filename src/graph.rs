//! The view of a task graph the locator needs.
//!
//! Any host framework can be plugged in by implementing [`TaskGraph`]. The
//! crate ships one implementation, [`Pipeline`](crate::Pipeline).

use std::fmt::Debug;
use std::hash::Hash;

use crate::context::Context;

/// A single producer edge of a task, as seen under one context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreTask<N> {
    /// The producing task, `None` when the slot is not connected.
    pub producer: Option<N>,
    /// Bindings that apply only when traversing this edge.
    pub context: Context,
}

impl<N> PreTask<N> {
    pub fn new(producer: Option<N>, context: Context) -> Self {
        Self { producer, context }
    }
}

/// Read-only access to a directed acyclic graph of tasks.
///
/// Edges point from a consumer to the producers it declares as pre-tasks. The
/// locator never mutates the graph.
pub trait TaskGraph: Sync {
    type Node: Copy + Eq + Ord + Hash + Debug + Send + Sync;

    /// Whether `node` belongs to this graph.
    fn contains(&self, node: Self::Node) -> bool;

    /// Human readable name, used for logging and errors.
    fn name(&self, node: Self::Node) -> &str;

    /// The file-name template of `node`, if it writes a file.
    fn file_name(&self, node: Self::Node) -> Option<&str>;

    /// Ordered pre-tasks of `node` when it runs under `context`.
    ///
    /// A task may expand a single input into several pre-tasks, each with its
    /// own context, or pick among its inputs depending on `context`.
    fn pre_tasks(&self, node: Self::Node, context: &Context) -> Vec<PreTask<Self::Node>>;

    /// Whether no task declares `node` as a producer.
    fn is_sink(&self, node: Self::Node) -> bool;

    /// Every node strictly downstream of `node` for which `predicate` holds,
    /// in ascending node order.
    fn descendants_matching(
        &self,
        node: Self::Node,
        predicate: &dyn Fn(Self::Node) -> bool,
    ) -> Vec<Self::Node>;
}
