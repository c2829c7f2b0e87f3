use crate::context::Context;
use crate::error::LocateError;
use crate::files::SourceFiles;
use crate::graph::TaskGraph;
use crate::template::PathTemplateResolver;

/// Whether the walk has reached the start task yet.
///
/// Only the start task and its transitive producers collect files. Tasks that
/// sit between a sink and the start task are walked through for their
/// contexts, but contribute nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    BeforeStart,
    FromStartUpward,
}

impl Scope {
    fn enter(self, is_start: bool) -> Self {
        match (self, is_start) {
            (Scope::BeforeStart, false) => Scope::BeforeStart,
            _ => Scope::FromStartUpward,
        }
    }

    pub fn collects(self) -> bool {
        self == Scope::FromStartUpward
    }
}

/// Walks from a sink towards its producers, accumulating context per path.
pub struct GraphWalker<'a, G: TaskGraph> {
    graph: &'a G,
    resolver: &'a PathTemplateResolver,
    start: G::Node,
}

impl<'a, G: TaskGraph> GraphWalker<'a, G> {
    pub fn new(graph: &'a G, resolver: &'a PathTemplateResolver, start: G::Node) -> Self {
        Self {
            graph,
            resolver,
            start,
        }
    }

    /// Collects the files of the start task and its producers, as reached from
    /// `sink` under `context`.
    pub fn walk_upstream(
        &self,
        sink: G::Node,
        context: &Context,
    ) -> Result<SourceFiles<G::Node>, LocateError> {
        let mut path = Vec::new();
        self.visit(sink, context, Scope::BeforeStart, &mut path)
    }

    fn visit(
        &self,
        node: G::Node,
        context: &Context,
        scope: Scope,
        path: &mut Vec<G::Node>,
    ) -> Result<SourceFiles<G::Node>, LocateError> {
        if path.contains(&node) {
            return Err(LocateError::CyclicGraph(self.graph.name(node).to_string()));
        }

        let scope = scope.enter(node == self.start);
        let mut files = SourceFiles::new();

        path.push(node);
        for pre_task in self.graph.pre_tasks(node, context) {
            let Some(producer) = pre_task.producer else {
                continue;
            };

            let context = Context::merge(context, &pre_task.context);
            files.append(self.visit(producer, &context, scope, path)?);
        }
        path.pop();

        if scope.collects() {
            if let Some(template) = self.graph.file_name(node) {
                match self.resolver.resolve_file(template, context) {
                    Some(file) => {
                        tracing::debug!(task = self.graph.name(node), %file, "collected");
                        files.push(node, file);
                    }
                    None => {
                        tracing::trace!(task = self.graph.name(node), template, "not a file");
                    }
                }
            }
        }

        Ok(files)
    }
}
