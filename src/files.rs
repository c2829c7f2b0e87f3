use std::collections::BTreeMap;
use std::collections::btree_map;

use camino::{Utf8Path, Utf8PathBuf};

/// Files located for each task.
///
/// Each task maps to its rendered paths in the order the traversal produced
/// them. A task reached along several paths lists one entry per path, even
/// when the rendered paths coincide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFiles<N: Ord> {
    files: BTreeMap<N, Vec<Utf8PathBuf>>,
}

impl<N: Ord> SourceFiles<N> {
    pub fn new() -> Self {
        Self {
            files: BTreeMap::new(),
        }
    }

    /// Appends `path` to the entry of `node`.
    pub fn push(&mut self, node: N, path: Utf8PathBuf) {
        self.files.entry(node).or_default().push(path);
    }

    /// Concatenates every entry of `other` after the matching entry in `self`.
    pub fn append(&mut self, other: SourceFiles<N>) {
        for (node, paths) in other.files {
            self.files.entry(node).or_default().extend(paths);
        }
    }

    pub fn get(&self, node: &N) -> Option<&[Utf8PathBuf]> {
        self.files.get(node).map(Vec::as_slice)
    }

    pub fn contains(&self, node: &N) -> bool {
        self.files.contains_key(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.files.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&N, &[Utf8PathBuf])> {
        self.files.iter().map(|(n, p)| (n, p.as_slice()))
    }

    /// Every located path, task by task.
    pub fn paths(&self) -> impl Iterator<Item = &Utf8Path> {
        self.files.values().flatten().map(Utf8PathBuf::as_path)
    }

    /// Number of tasks with at least one file.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<N: Ord> Default for SourceFiles<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Ord> IntoIterator for SourceFiles<N> {
    type Item = (N, Vec<Utf8PathBuf>);
    type IntoIter = btree_map::IntoIter<N, Vec<Utf8PathBuf>>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_concatenates() {
        let mut a = SourceFiles::new();
        a.push(1, "/a/1.txt".into());
        a.push(2, "/b/1.txt".into());

        let mut b = SourceFiles::new();
        b.push(1, "/a/2.txt".into());
        b.push(1, "/a/1.txt".into());

        a.append(b);

        assert_eq!(
            a.get(&1).unwrap(),
            &[
                Utf8PathBuf::from("/a/1.txt"),
                Utf8PathBuf::from("/a/2.txt"),
                Utf8PathBuf::from("/a/1.txt"),
            ]
        );
        assert_eq!(a.get(&2).unwrap().len(), 1);
        assert_eq!(a.len(), 2);
        assert_eq!(a.paths().count(), 4);
    }

    #[test]
    fn test_empty() {
        let files: SourceFiles<u32> = SourceFiles::default();
        assert!(files.is_empty());
        assert!(files.get(&0).is_none());
    }
}
