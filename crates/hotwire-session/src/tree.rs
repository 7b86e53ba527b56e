//! Path-addressed cache of a lazily-loaded server-side tree.
//!
//! Both the file tree and the news tree are instances of [`ListingTree`].
//! Nodes live in an arena and are addressed by integer ids; path lookup
//! walks the tree by matching each segment against sibling names in
//! order. Children are only ever replaced wholesale, mirroring how the
//! server answers listing requests.
//!
//! Sibling name collisions make lookup ambiguous: the first match wins.
//! This is a known limitation of name-addressed trees, carried over
//! deliberately rather than enforcing uniqueness at insertion.

use hotwire_shared::types::{FileEntry, NewsEntry};

/// Payload stored in a listing tree, looked up by display name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for FileEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for NewsEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Arena index of a tree node. Invalidated by any `replace_children`
/// or `clear` call; never hold one across a mutation.
pub type NodeId = usize;

#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    /// `None` means never fetched; `Some(vec![])` means fetched and
    /// empty. The distinction drives lazy expansion.
    children: Option<Vec<NodeId>>,
}

#[derive(Debug, Clone)]
pub struct ListingTree<T> {
    nodes: Vec<Node<T>>,
    roots: Vec<NodeId>,
    loaded: bool,
}

impl<T: Named> ListingTree<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            loaded: false,
        }
    }

    /// Whether the root listing has been fetched at least once.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Drop everything, including the loaded flag. Part of session reset.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.loaded = false;
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn value(&self, id: NodeId) -> &T {
        &self.nodes[id].value
    }

    /// Fetched children of a node, or `None` if it was never expanded.
    pub fn children_of(&self, id: NodeId) -> Option<&[NodeId]> {
        self.nodes[id].children.as_deref()
    }

    /// Resolve a path by walking segment names level by level.
    ///
    /// The empty path is absent by definition (the root collection is
    /// not a node). Resolution stops as soon as a segment has no
    /// matching sibling or the walk reaches a node whose children were
    /// never fetched.
    pub fn find(&self, path: &[String]) -> Option<NodeId> {
        if path.is_empty() {
            return None;
        }

        let mut level: &[NodeId] = &self.roots;
        let mut found = None;
        for segment in path {
            let id = *level
                .iter()
                .find(|&&id| self.nodes[id].value.name() == segment)?;
            found = Some(id);
            level = match &self.nodes[id].children {
                Some(children) => children,
                None => &[],
            };
        }
        found
    }

    /// Replace the children of the node at `path` wholesale.
    ///
    /// An empty path replaces the whole root collection (and marks the
    /// tree loaded); a non-empty path that does not resolve discards
    /// `values`; the caller resolved the parent before fetching.
    pub fn replace_children(&mut self, path: &[String], values: Vec<T>) {
        if path.is_empty() {
            // The entire old tree becomes unreachable; reclaim it.
            self.nodes.clear();
            self.roots = self.alloc_all(values);
            self.loaded = true;
            return;
        }

        if let Some(id) = self.find(path) {
            let ids = self.alloc_all(values);
            self.nodes[id].children = Some(ids);
        }
        // Orphaned subtree slots are reclaimed on the next root
        // replacement or clear.
    }

    fn alloc_all(&mut self, values: Vec<T>) -> Vec<NodeId> {
        values
            .into_iter()
            .map(|value| {
                let id = self.nodes.len();
                self.nodes.push(Node {
                    value,
                    children: None,
                });
                id
            })
            .collect()
    }
}

impl<T: Named> Default for ListingTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Entry(String);

    impl Named for Entry {
        fn name(&self) -> &str {
            &self.0
        }
    }

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    fn entries(names: &[&str]) -> Vec<Entry> {
        names.iter().map(|n| Entry(n.to_string())).collect()
    }

    #[test]
    fn empty_path_is_absent() {
        let mut tree = ListingTree::new();
        tree.replace_children(&[], entries(&["A"]));
        assert_eq!(tree.find(&[]), None);
    }

    #[test]
    fn root_replacement_marks_loaded() {
        let mut tree: ListingTree<Entry> = ListingTree::new();
        assert!(!tree.is_loaded());
        tree.replace_children(&[], entries(&["A", "B"]));
        assert!(tree.is_loaded());
        assert_eq!(tree.roots().len(), 2);
    }

    #[test]
    fn replace_then_find_returns_exactly_the_new_children() {
        let mut tree = ListingTree::new();
        tree.replace_children(&[], entries(&["A", "B"]));
        tree.replace_children(&path(&["A"]), entries(&["C"]));

        let a = tree.find(&path(&["A"])).unwrap();
        let children = tree.children_of(a).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(tree.value(children[0]), &Entry("C".into()));

        // The grandchild is resolvable through the refreshed parent.
        assert!(tree.find(&path(&["A", "C"])).is_some());
    }

    #[test]
    fn unfetched_children_are_distinct_from_empty() {
        let mut tree = ListingTree::new();
        tree.replace_children(&[], entries(&["A", "B"]));

        let a = tree.find(&path(&["A"])).unwrap();
        assert_eq!(tree.children_of(a), None);

        tree.replace_children(&path(&["A"]), Vec::new());
        let a = tree.find(&path(&["A"])).unwrap();
        assert_eq!(tree.children_of(a), Some(&[][..]));
    }

    #[test]
    fn lookup_stops_at_unfetched_nodes() {
        let mut tree = ListingTree::new();
        tree.replace_children(&[], entries(&["A"]));
        assert_eq!(tree.find(&path(&["A", "C"])), None);
    }

    #[test]
    fn unresolvable_replace_discards_data() {
        let mut tree = ListingTree::new();
        tree.replace_children(&[], entries(&["A"]));
        tree.replace_children(&path(&["Nope"]), entries(&["X"]));
        assert_eq!(tree.find(&path(&["Nope"])), None);
        assert_eq!(tree.find(&path(&["Nope", "X"])), None);
    }

    #[test]
    fn children_are_replaced_wholesale() {
        let mut tree = ListingTree::new();
        tree.replace_children(&[], entries(&["A"]));
        tree.replace_children(&path(&["A"]), entries(&["old1", "old2"]));
        tree.replace_children(&path(&["A"]), entries(&["new"]));

        let a = tree.find(&path(&["A"])).unwrap();
        let children = tree.children_of(a).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(tree.value(children[0]), &Entry("new".into()));
    }

    #[test]
    fn duplicate_sibling_names_resolve_to_the_first_match() {
        let mut tree = ListingTree::new();
        tree.replace_children(&[], entries(&["dup", "dup"]));
        let first = tree.find(&path(&["dup"])).unwrap();
        assert_eq!(first, tree.roots()[0]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut tree = ListingTree::new();
        tree.replace_children(&[], entries(&["A"]));
        tree.clear();
        assert!(!tree.is_loaded());
        assert!(tree.roots().is_empty());
        assert_eq!(tree.find(&path(&["A"])), None);
    }
}
