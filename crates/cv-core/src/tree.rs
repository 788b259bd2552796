//! Arena-indexed n-ary tree
//!
//! Nodes are stored in a vector and addressed by `TreeNodeId`. Id 0 is the
//! null node; real ids start at 1 and grow with every `append_child`. Nodes
//! are never removed individually, the whole tree is rebuilt with `clear`.

/// Identifier of a tree node, 0 meaning "no node"
pub type TreeNodeId = u32;

/// The null node id
pub const NULL_NODE: TreeNodeId = 0;

#[derive(Debug, Clone)]
struct TreeNode<T> {
    parent: TreeNodeId,
    sibling_previous: TreeNodeId,
    sibling_next: TreeNodeId,
    child_first: TreeNodeId,
    child_last: TreeNodeId,
    data: T,
}

/// A forest of nodes carrying payloads of type `T`
#[derive(Debug, Clone)]
pub struct Tree<T> {
    nodes: Vec<TreeNode<T>>,
    roots: Vec<TreeNodeId>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tree<T> {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Append `data` as the last child of `parent`, or as a new root if
    /// `parent` is the null node. Returns the new node id.
    ///
    /// An unknown non-null `parent` also yields a root.
    pub fn append_child(&mut self, parent: TreeNodeId, data: T) -> TreeNodeId {
        let id = self.nodes.len() as TreeNodeId + 1;
        let parent = if self.node(parent).is_some() {
            parent
        } else {
            NULL_NODE
        };

        let mut node = TreeNode {
            parent,
            sibling_previous: NULL_NODE,
            sibling_next: NULL_NODE,
            child_first: NULL_NODE,
            child_last: NULL_NODE,
            data,
        };

        if parent == NULL_NODE {
            if let Some(&last_root) = self.roots.last() {
                node.sibling_previous = last_root;
                if let Some(last) = self.node_mut(last_root) {
                    last.sibling_next = id;
                }
            }
            self.roots.push(id);
        } else if let Some(parent_node) = self.node_mut(parent) {
            let previous_last = parent_node.child_last;
            if parent_node.child_first == NULL_NODE {
                parent_node.child_first = id;
            }
            parent_node.child_last = id;
            node.sibling_previous = previous_last;
            if let Some(previous) = self.node_mut(previous_last) {
                previous.sibling_next = id;
            }
        }

        self.nodes.push(node);
        id
    }

    pub fn node_parent(&self, id: TreeNodeId) -> TreeNodeId {
        self.node(id).map_or(NULL_NODE, |n| n.parent)
    }

    pub fn node_child_first(&self, id: TreeNodeId) -> TreeNodeId {
        self.node(id).map_or(NULL_NODE, |n| n.child_first)
    }

    pub fn node_child_last(&self, id: TreeNodeId) -> TreeNodeId {
        self.node(id).map_or(NULL_NODE, |n| n.child_last)
    }

    pub fn node_sibling_previous(&self, id: TreeNodeId) -> TreeNodeId {
        self.node(id).map_or(NULL_NODE, |n| n.sibling_previous)
    }

    pub fn node_sibling_next(&self, id: TreeNodeId) -> TreeNodeId {
        self.node(id).map_or(NULL_NODE, |n| n.sibling_next)
    }

    /// Payload of a node, `None` for the null node or an unknown id
    pub fn node_data(&self, id: TreeNodeId) -> Option<&T> {
        self.node(id).map(|n| &n.data)
    }

    pub fn node_data_mut(&mut self, id: TreeNodeId) -> Option<&mut T> {
        self.node_mut(id).map(|n| &mut n.data)
    }

    pub fn contains(&self, id: TreeNodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn node_is_root(&self, id: TreeNodeId) -> bool {
        self.contains(id) && self.node_parent(id) == NULL_NODE
    }

    pub fn node_is_leaf(&self, id: TreeNodeId) -> bool {
        self.contains(id) && self.node_child_first(id) == NULL_NODE
    }

    /// Number of ancestors of a node (0 for roots)
    pub fn node_depth(&self, id: TreeNodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node_parent(id);
        while current != NULL_NODE {
            depth += 1;
            current = self.node_parent(current);
        }
        depth
    }

    /// Children of a node in append order
    pub fn node_children(&self, id: TreeNodeId) -> Siblings<'_, T> {
        Siblings {
            tree: self,
            next: self.node_child_first(id),
        }
    }

    /// Root nodes in append order
    pub fn roots(&self) -> &[TreeNodeId] {
        &self.roots
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove all nodes and roots; ids restart at 1
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }

    fn node(&self, id: TreeNodeId) -> Option<&TreeNode<T>> {
        let index = (id as usize).checked_sub(1)?;
        self.nodes.get(index)
    }

    fn node_mut(&mut self, id: TreeNodeId) -> Option<&mut TreeNode<T>> {
        let index = (id as usize).checked_sub(1)?;
        self.nodes.get_mut(index)
    }
}

/// Iterator over a chain of siblings
pub struct Siblings<'a, T> {
    tree: &'a Tree<T>,
    next: TreeNodeId,
}

impl<T> Iterator for Siblings<'_, T> {
    type Item = TreeNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == NULL_NODE {
            return None;
        }
        let current = self.next;
        self.next = self.tree.node_sibling_next(current);
        Some(current)
    }
}

/// Event emitted by `traverse_tree`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeTraversal {
    /// Entering a node, before its children
    Enter(TreeNodeId),
    /// Leaving a node, after its children
    Leave(TreeNodeId),
}

/// Visit every node of the sub-tree rooted at `id` in pre-order
pub fn deep_foreach_subtree<T>(tree: &Tree<T>, id: TreeNodeId, mut visitor: impl FnMut(TreeNodeId)) {
    traverse_subtree(tree, id, |event| {
        if let TreeTraversal::Enter(node) = event {
            visitor(node);
        }
    });
}

/// Visit every node in pre-order, roots in append order
pub fn deep_foreach_tree_node<T>(tree: &Tree<T>, mut visitor: impl FnMut(TreeNodeId)) {
    for &root in tree.roots() {
        deep_foreach_subtree(tree, root, &mut visitor);
    }
}

/// Depth-first walk emitting `Enter`/`Leave` events for every node
pub fn traverse_tree<T>(tree: &Tree<T>, mut visitor: impl FnMut(TreeTraversal)) {
    for &root in tree.roots() {
        traverse_subtree(tree, root, &mut visitor);
    }
}

fn traverse_subtree<T>(tree: &Tree<T>, id: TreeNodeId, mut visitor: impl FnMut(TreeTraversal)) {
    if !tree.contains(id) {
        return;
    }

    // Iterative walk so deep assemblies cannot exhaust the stack
    let mut current = id;
    loop {
        visitor(TreeTraversal::Enter(current));
        let first_child = tree.node_child_first(current);
        if first_child != NULL_NODE {
            current = first_child;
            continue;
        }

        loop {
            visitor(TreeTraversal::Leave(current));
            if current == id {
                return;
            }
            let next = tree.node_sibling_next(current);
            if next != NULL_NODE {
                current = next;
                break;
            }
            current = tree.node_parent(current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root_a
    /// ├── a1
    /// │   ├── a11
    /// │   └── a12
    /// └── a2
    /// root_b
    /// └── b1
    fn sample() -> (Tree<&'static str>, Vec<TreeNodeId>) {
        let mut tree = Tree::new();
        let root_a = tree.append_child(NULL_NODE, "root_a");
        let a1 = tree.append_child(root_a, "a1");
        let root_b = tree.append_child(NULL_NODE, "root_b");
        let a11 = tree.append_child(a1, "a11");
        let a2 = tree.append_child(root_a, "a2");
        let b1 = tree.append_child(root_b, "b1");
        let a12 = tree.append_child(a1, "a12");
        (tree, vec![root_a, a1, root_b, a11, a2, b1, a12])
    }

    #[test]
    fn test_ids_are_monotonic_from_one() {
        let (_, ids) = sample();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_parent_and_children() {
        let (tree, ids) = sample();
        let &[root_a, a1, root_b, a11, a2, b1, a12] = &ids[..] else {
            panic!("unexpected ids");
        };

        assert_eq!(tree.node_parent(a1), root_a);
        assert_eq!(tree.node_parent(a12), a1);
        assert_eq!(tree.node_parent(b1), root_b);
        assert_eq!(tree.node_parent(root_a), NULL_NODE);

        assert_eq!(tree.node_children(root_a).collect::<Vec<_>>(), vec![a1, a2]);
        assert_eq!(tree.node_children(a1).collect::<Vec<_>>(), vec![a11, a12]);
        assert_eq!(tree.node_child_first(a1), a11);
        assert_eq!(tree.node_child_last(a1), a12);
        assert_eq!(tree.node_sibling_next(a11), a12);
        assert_eq!(tree.node_sibling_previous(a12), a11);
        assert_eq!(tree.node_sibling_previous(a11), NULL_NODE);
        assert_eq!(tree.roots(), &[root_a, root_b]);
        assert_eq!(tree.node_sibling_next(root_a), root_b);
        assert_eq!(tree.node_data(a2), Some(&"a2"));
    }

    #[test]
    fn test_every_node_listed_once_under_its_parent() {
        let (tree, ids) = sample();
        for &id in &ids {
            let parent = tree.node_parent(id);
            let siblings: Vec<TreeNodeId> = if parent == NULL_NODE {
                tree.roots().to_vec()
            } else {
                tree.node_children(parent).collect()
            };
            assert_eq!(siblings.iter().filter(|&&s| s == id).count(), 1);
        }
    }

    #[test]
    fn test_null_and_unknown_ids() {
        let (tree, _) = sample();
        for id in [NULL_NODE, 99] {
            assert_eq!(tree.node_parent(id), NULL_NODE);
            assert_eq!(tree.node_child_first(id), NULL_NODE);
            assert_eq!(tree.node_child_last(id), NULL_NODE);
            assert_eq!(tree.node_sibling_next(id), NULL_NODE);
            assert_eq!(tree.node_sibling_previous(id), NULL_NODE);
            assert_eq!(tree.node_data(id), None);
            assert!(!tree.node_is_root(id));
            assert!(!tree.node_is_leaf(id));
        }
    }

    #[test]
    fn test_deep_foreach_is_preorder() {
        let (tree, _) = sample();
        let mut visited = Vec::new();
        deep_foreach_tree_node(&tree, |id| visited.push(*tree.node_data(id).unwrap()));
        assert_eq!(
            visited,
            vec!["root_a", "a1", "a11", "a12", "a2", "root_b", "b1"]
        );
    }

    #[test]
    fn test_deep_foreach_visits_ancestors_first() {
        let (tree, ids) = sample();
        let mut order = Vec::new();
        deep_foreach_tree_node(&tree, |id| order.push(id));
        assert_eq!(order.len(), ids.len());
        for &id in &ids {
            assert_eq!(order.iter().filter(|&&n| n == id).count(), 1);
            let position = order.iter().position(|&n| n == id).unwrap();
            let parent = tree.node_parent(id);
            if parent != NULL_NODE {
                let parent_position = order.iter().position(|&n| n == parent).unwrap();
                assert!(parent_position < position);
            }
        }
    }

    #[test]
    fn test_deep_foreach_subtree() {
        let (tree, ids) = sample();
        let mut visited = Vec::new();
        deep_foreach_subtree(&tree, ids[1], |id| visited.push(*tree.node_data(id).unwrap()));
        assert_eq!(visited, vec!["a1", "a11", "a12"]);

        let mut none = Vec::new();
        deep_foreach_subtree(&tree, NULL_NODE, |id| none.push(id));
        assert!(none.is_empty());
    }

    #[test]
    fn test_traverse_enter_leave() {
        let mut tree = Tree::new();
        let root = tree.append_child(NULL_NODE, ());
        let child = tree.append_child(root, ());
        let mut events = Vec::new();
        traverse_tree(&tree, |e| events.push(e));
        assert_eq!(
            events,
            vec![
                TreeTraversal::Enter(root),
                TreeTraversal::Enter(child),
                TreeTraversal::Leave(child),
                TreeTraversal::Leave(root),
            ]
        );
    }

    #[test]
    fn test_depth_root_leaf() {
        let (tree, ids) = sample();
        assert_eq!(tree.node_depth(ids[0]), 0);
        assert_eq!(tree.node_depth(ids[3]), 2);
        assert!(tree.node_is_root(ids[2]));
        assert!(tree.node_is_leaf(ids[3]));
        assert!(!tree.node_is_leaf(ids[0]));
    }

    #[test]
    fn test_clear_restarts_ids() {
        let (mut tree, _) = sample();
        tree.clear();
        assert!(tree.is_empty());
        assert!(tree.roots().is_empty());
        assert_eq!(tree.append_child(NULL_NODE, "again"), 1);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut tree = Tree::new();
        let mut parent = NULL_NODE;
        for i in 0..100_000u32 {
            parent = tree.append_child(parent, i);
        }
        let mut count = 0;
        deep_foreach_tree_node(&tree, |_| count += 1);
        assert_eq!(count, 100_000);
    }
}
