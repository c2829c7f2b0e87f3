use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the variable holding the current frame number.
pub const FRAME: &str = "frame";

/// A set of named variable bindings used to render file-name templates.
///
/// Contexts are treated as immutable once they are handed to the walker, every
/// derived context is a fresh copy produced by [`Context::merge`].
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Context {
    vars: BTreeMap<String, String>,
}

impl Context {
    /// Creates a new, empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value`, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Builder flavour of [`Context::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// The numeric value of the `frame` variable, if it is bound and parses.
    pub fn frame(&self) -> Option<f64> {
        self.get(FRAME)?.trim().parse().ok()
    }

    /// Merges `overlay` into a copy of `base`.
    ///
    /// Bindings already present in `base` are never overwritten, `overlay` can
    /// only fill in names that `base` lacks. Walking from a sink towards its
    /// producers this makes the most downstream binding of a variable win.
    pub fn merge(base: &Context, overlay: &Context) -> Context {
        let mut merged = base.clone();
        for (name, value) in &overlay.vars {
            merged
                .vars
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
        merged
    }
}

impl<K, V> FromIterator<(K, V)> for Context
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K, V> Extend<(K, V)> for Context
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}
