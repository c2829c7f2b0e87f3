//! File-name templates.
//!
//! Templates use the substitution rules of the dispatch tooling the task graphs
//! come from:
//!
//! * `${name}` and `$name` expand to the value bound in the [`Context`],
//! * a run of `#` expands to the current frame, zero padded to the run's width,
//! * `\` escapes the character that follows it.
//!
//! Whether a rendered path is something that gets collected is decided by a
//! [`PathClassifier`]. The default [`FilePathClassifier`] is purely syntactic
//! and never touches the disk.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::context::Context;

/// What to do with a reference to a variable the context doesn't bind.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnboundVariables {
    /// Replace the reference with an empty string.
    #[default]
    Empty,
    /// Keep the reference verbatim. The rendered path then still contains a
    /// placeholder, which [`FilePathClassifier`] rejects.
    Preserve,
}

/// Expands every variable reference and frame sequence in `template`.
///
/// Fractional frames are rounded down, so frame `2.75` renders as `0002`
/// under `####` and `-0.5` as `-001`.
pub fn substitute(template: &str, context: &Context, unbound: UnboundVariables) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => out.push(escaped),
                None => out.push('\\'),
            },
            '$' => {
                let Some((name, end)) = variable_at(template, i) else {
                    out.push('$');
                    continue;
                };

                match context.get(name) {
                    Some(value) => out.push_str(value),
                    None if unbound == UnboundVariables::Preserve => out.push_str(&template[i..end]),
                    None => {}
                }

                while chars.next_if(|&(j, _)| j < end).is_some() {}
            }
            '#' => {
                let mut width = 1;
                while chars.next_if(|&(_, c)| c == '#').is_some() {
                    width += 1;
                }

                match context.frame() {
                    Some(frame) => {
                        let frame = frame.floor() as i64;
                        out.push_str(&format!("{frame:0width$}"));
                    }
                    None => out.extend(std::iter::repeat_n('#', width)),
                }
            }
            c => out.push(c),
        }
    }

    out
}

/// Parses the variable reference starting with the `$` at byte `start`.
/// Returns the variable name and the byte offset just past the reference.
fn variable_at(template: &str, start: usize) -> Option<(&str, usize)> {
    let rest = &template[start + 1..];

    if let Some(braced) = rest.strip_prefix('{') {
        let close = braced.find('}')?;
        return Some((&braced[..close], start + 3 + close));
    }

    let len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == ':'))
        .unwrap_or(rest.len());

    match len {
        0 => None,
        _ => Some((&rest[..len], start + 1 + len)),
    }
}

/// Decides whether a rendered string names a single, concrete file.
pub trait PathClassifier: Send + Sync {
    fn is_concrete_file(&self, path: &Utf8Path) -> bool;
}

impl<F> PathClassifier for F
where
    F: Fn(&Utf8Path) -> bool + Send + Sync,
{
    fn is_concrete_file(&self, path: &Utf8Path) -> bool {
        self(path)
    }
}

/// Syntactic classifier: a path is a concrete file when it has a final file
/// name component and carries no wildcard, frame sequence or unresolved
/// placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilePathClassifier;

impl PathClassifier for FilePathClassifier {
    fn is_concrete_file(&self, path: &Utf8Path) -> bool {
        let raw = path.as_str();

        if raw.is_empty() || raw.ends_with('/') || raw.ends_with(std::path::MAIN_SEPARATOR) {
            return false;
        }

        if path.file_name().is_none() || raw == "." || raw.ends_with("/.") {
            return false;
        }

        // `Pattern::escape` only changes strings holding glob metacharacters
        if glob::Pattern::escape(raw) != raw {
            return false;
        }

        !raw.contains('#') && !raw.contains("${")
    }
}

/// Renders file-name templates and filters out anything that isn't a single
/// concrete file.
pub struct PathTemplateResolver {
    unbound: UnboundVariables,
    classifier: Box<dyn PathClassifier>,
}

impl PathTemplateResolver {
    pub fn new() -> Self {
        Self {
            unbound: UnboundVariables::default(),
            classifier: Box::new(FilePathClassifier),
        }
    }

    pub fn unbound(mut self, unbound: UnboundVariables) -> Self {
        self.unbound = unbound;
        self
    }

    /// Replaces the default [`FilePathClassifier`].
    pub fn classifier(mut self, classifier: impl PathClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn resolve(&self, template: &str, context: &Context) -> Utf8PathBuf {
        Utf8PathBuf::from(substitute(template, context, self.unbound))
    }

    pub fn is_concrete_file(&self, path: &Utf8Path) -> bool {
        self.classifier.is_concrete_file(path)
    }

    /// Renders `template` and keeps the result only if it is a concrete file.
    pub fn resolve_file(&self, template: &str, context: &Context) -> Option<Utf8PathBuf> {
        let path = self.resolve(template, context);
        self.is_concrete_file(&path).then_some(path)
    }
}

impl Default for PathTemplateResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PathTemplateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathTemplateResolver")
            .field("unbound", &self.unbound)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context::new()
            .with("place", "london")
            .with("script:name", "demo")
            .with("frame", "7")
    }

    #[test]
    fn test_braced_and_bare_variables() {
        let out = substitute("/out/${place}/$place.txt", &ctx(), UnboundVariables::Empty);
        assert_eq!(out, "/out/london/london.txt");

        let out = substitute("/out/$script:name.txt", &ctx(), UnboundVariables::Empty);
        assert_eq!(out, "/out/demo.txt");
    }

    #[test]
    fn test_frame_padding() {
        assert_eq!(
            substitute("/out/test.####.txt", &ctx(), UnboundVariables::Empty),
            "/out/test.0007.txt"
        );
        assert_eq!(
            substitute("/out/test.#.txt", &ctx(), UnboundVariables::Empty),
            "/out/test.7.txt"
        );

        let fractional = Context::new().with("frame", "2.75");
        assert_eq!(
            substitute("f.###.exr", &fractional, UnboundVariables::Empty),
            "f.002.exr"
        );

        let negative = Context::new().with("frame", "-0.5");
        assert_eq!(
            substitute("f.####.exr", &negative, UnboundVariables::Empty),
            "f.-001.exr"
        );
    }

    #[test]
    fn test_frame_sequence_without_frame_is_kept() {
        assert_eq!(
            substitute("/out/test.####.txt", &Context::new(), UnboundVariables::Empty),
            "/out/test.####.txt"
        );
    }

    #[test]
    fn test_unbound_empty() {
        assert_eq!(
            substitute("/out/${missing}.txt", &Context::new(), UnboundVariables::Empty),
            "/out/.txt"
        );
        assert_eq!(
            substitute("/out/$missing/x.txt", &Context::new(), UnboundVariables::Empty),
            "/out//x.txt"
        );
    }

    #[test]
    fn test_unbound_preserve() {
        assert_eq!(
            substitute("/out/${missing}.txt", &Context::new(), UnboundVariables::Preserve),
            "/out/${missing}.txt"
        );
        assert_eq!(
            substitute("/out/$missing.txt", &Context::new(), UnboundVariables::Preserve),
            "/out/$missing.txt"
        );
    }

    #[test]
    fn test_escapes_and_literals() {
        assert_eq!(
            substitute(r"/out/\$place-\#.txt", &ctx(), UnboundVariables::Empty),
            "/out/$place-#.txt"
        );
        assert_eq!(substitute("cost$", &ctx(), UnboundVariables::Empty), "cost$");
        assert_eq!(substitute("a${place", &ctx(), UnboundVariables::Empty), "a${place");
        assert_eq!(substitute(r"trailing\", &ctx(), UnboundVariables::Empty), r"trailing\");
    }

    #[test]
    fn test_classifier() {
        let classifier = FilePathClassifier;
        let check = |s: &str| classifier.is_concrete_file(Utf8Path::new(s));

        assert!(check("/out/london.txt"));
        assert!(check("relative/file"));
        assert!(!check(""));
        assert!(!check("/out/dir/"));
        assert!(!check("/out/.."));
        assert!(!check("/out/."));
        assert!(!check("/"));
        assert!(!check("/out/*.txt"));
        assert!(!check("/out/file?.txt"));
        assert!(!check("/out/[ab].txt"));
        assert!(!check("/out/test.####.txt"));
        assert!(!check("/out/${missing}.txt"));
    }

    #[test]
    fn test_resolver() {
        let resolver = PathTemplateResolver::new();
        assert_eq!(
            resolver.resolve_file("/out/${place}.txt", &ctx()),
            Some(Utf8PathBuf::from("/out/london.txt"))
        );
        assert_eq!(resolver.resolve_file("/out/${place}/", &ctx()), None);

        let preserving = PathTemplateResolver::new().unbound(UnboundVariables::Preserve);
        assert_eq!(preserving.resolve_file("/out/${missing}.txt", &ctx()), None);

        let permissive = PathTemplateResolver::new().classifier(|_: &Utf8Path| true);
        assert_eq!(
            permissive.resolve_file("/out/*.txt", &ctx()),
            Some(Utf8PathBuf::from("/out/*.txt"))
        );
    }

    #[test]
    fn test_unbound_config() {
        let parsed: UnboundVariables = serde_json::from_str(r#""preserve""#).unwrap();
        assert_eq!(parsed, UnboundVariables::Preserve);
    }
}
