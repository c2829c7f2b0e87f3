use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::LocateError;
use crate::files::SourceFiles;
use crate::graph::TaskGraph;
use crate::template::{PathClassifier, PathTemplateResolver, UnboundVariables};
use crate::walker::GraphWalker;

/// Settings for a [`SourceFileLocator`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LocateOptions {
    /// How templates treat variables the context doesn't bind.
    pub unbound: UnboundVariables,
    /// Walk each sink on the rayon pool. The result is the same as in a
    /// sequential run.
    pub parallel: bool,
}

/// Finds the files that a task and everything upstream of it write, under
/// every context the downstream graph runs them with.
///
/// The graph is first followed downstream from the start task to find the
/// sinks. Each sink is then walked back towards its producers, accumulating
/// the context along every path, and the start task plus its producers render
/// their file names against it.
pub struct SourceFileLocator<'a, G: TaskGraph> {
    graph: &'a G,
    context: Context,
    resolver: PathTemplateResolver,
    parallel: bool,
}

impl<'a, G: TaskGraph> SourceFileLocator<'a, G> {
    /// `context` holds the bindings in effect outside of any task.
    pub fn new(graph: &'a G, context: Context) -> Self {
        Self {
            graph,
            context,
            resolver: PathTemplateResolver::new(),
            parallel: false,
        }
    }

    pub fn options(mut self, options: LocateOptions) -> Self {
        self.resolver = self.resolver.unbound(options.unbound);
        self.parallel = options.parallel;
        self
    }

    /// Replaces the default syntactic file check.
    pub fn classifier(mut self, classifier: impl PathClassifier + 'static) -> Self {
        self.resolver = self.resolver.classifier(classifier);
        self
    }

    /// The sinks reachable downstream of `start`, or `start` itself if nothing
    /// consumes it.
    pub fn sinks(&self, start: G::Node) -> Vec<G::Node> {
        let sinks = self
            .graph
            .descendants_matching(start, &|node| self.graph.is_sink(node));

        if sinks.is_empty() { vec![start] } else { sinks }
    }

    pub fn locate(&self, start: G::Node) -> Result<SourceFiles<G::Node>, LocateError> {
        if !self.graph.contains(start) {
            return Err(LocateError::UnknownNode(format!("{start:?}")));
        }

        let span = tracing::info_span!("locate", start = self.graph.name(start));
        let _enter = span.enter();

        let sinks = self.sinks(start);
        tracing::debug!(?sinks, "walking upstream from sinks");

        let walker = GraphWalker::new(self.graph, &self.resolver, start);
        let partials: Vec<_> = if self.parallel {
            sinks
                .par_iter()
                .map(|&sink| walker.walk_upstream(sink, &self.context))
                .collect::<Result<_, _>>()?
        } else {
            sinks
                .iter()
                .map(|&sink| walker.walk_upstream(sink, &self.context))
                .collect::<Result<_, _>>()?
        };

        let mut files = SourceFiles::new();
        for partial in partials {
            files.append(partial);
        }

        tracing::debug!(tasks = files.len(), "located source files");
        Ok(files)
    }
}
