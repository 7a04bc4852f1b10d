use smallvec::SmallVec;
use std::{collections::VecDeque, ops::Index, slice::Iter};

/// A Directed Acyclic Graph (DAG).
///
/// This is the kind of graph you need to represent the search structure of a trapezoidal map. A
/// tree won't cut it because some nodes need to have multiple parents. This happens notably when a
/// new segment crosses multiple trapezoids, in which case these trapezoids are replaced with
/// y-nodes that may share a common child trapezoid node.
///
/// It is implemented using an arena: it is backed by a simple [`Vec`], and nodes are referred to
/// by their [`usize`] index. Nodes are never removed, but a node can be overwritten in place,
/// which is how a leaf is turned into an inner node. The root is always the node with index 0.
#[derive(Debug, Default)]
pub(crate) struct Dag<T> {
    arena: Vec<Node<T>>,
}

impl<T> Dag<T> {
    /// Constructs a new empty DAG.
    pub(crate) fn new() -> Self {
        Dag { arena: Vec::new() }
    }

    /// Add a new node to the DAG. Returns the index of the node.
    pub(crate) fn add(&mut self, data: T) -> usize {
        let idx = self.arena.len();
        self.arena.push(Node::new(data));
        idx
    }

    /// Get a shared reference to the node with index `idx`, if it exists.
    pub(crate) fn get(&self, idx: usize) -> Option<&Node<T>> {
        self.arena.get(idx)
    }

    fn get_mut(&mut self, idx: usize) -> Option<&mut Node<T>> {
        self.arena.get_mut(idx)
    }

    /// An iterator over the DAG's nodes.
    pub(crate) fn iter(&self) -> Iter<'_, Node<T>> {
        self.arena.iter()
    }

    /// Gets the given index' corresponding entry in the DAG for in-place manipulation.
    pub(crate) fn entry(&mut self, idx: usize) -> Entry<'_, T> {
        Entry { idx, dag: self }
    }

    /// Length of the longest path from the root to every node.
    ///
    /// Nodes that cannot be reached from the root get `None`.
    pub(crate) fn depths(&self) -> Vec<Option<usize>> {
        let n = self.arena.len();
        let mut depths = vec![None; n];
        if n == 0 {
            return depths;
        }

        // Kahn's algorithm restricted to the nodes reachable from the root
        let mut reachable = vec![false; n];
        let mut stack = vec![0];
        while let Some(idx) = stack.pop() {
            if !std::mem::replace(&mut reachable[idx], true) {
                stack.extend(self.arena[idx].children.iter().copied());
            }
        }
        let mut in_degree = vec![0usize; n];
        for (idx, node) in self.arena.iter().enumerate() {
            if reachable[idx] {
                for &child in &node.children {
                    in_degree[child] += 1;
                }
            }
        }

        depths[0] = Some(0);
        let mut queue = VecDeque::from([0]);
        while let Some(idx) = queue.pop_front() {
            let depth = depths[idx].unwrap_or_default();
            for &child in &self.arena[idx].children {
                depths[child] = Some(depths[child].map_or(depth + 1, |d: usize| d.max(depth + 1)));
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    queue.push_back(child);
                }
            }
        }
        depths
    }
}

impl<T> Index<usize> for Dag<T> {
    type Output = Node<T>;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.arena[idx]
    }
}

/// A node of the DAG.
#[derive(Debug, Default)]
pub(crate) struct Node<T> {
    pub(crate) data: T,
    pub(crate) parents: Vec<usize>,
    pub(crate) children: SmallVec<[usize; 2]>,
}

impl<T> Node<T> {
    fn new(data: T) -> Self {
        Node {
            data,
            parents: Vec::new(),
            children: SmallVec::new(),
        }
    }
}

/// A view into a single entry in a DAG, which may or may not exist yet.
pub(crate) struct Entry<'a, T> {
    idx: usize,
    dag: &'a mut Dag<T>,
}

impl<T> Entry<'_, T> {
    /// Creates and appends a new [`Node`] with given data to the entry, if it exists.
    pub(crate) fn append_new(&mut self, data: T) -> Option<usize> {
        self.dag.get(self.idx)?;
        let new_idx = self.dag.add(data);
        self.append(new_idx)
    }

    /// Appends an existing [`Node`] to the entry, if both exist.
    ///
    /// The entry is recorded as a parent of the appended node.
    pub(crate) fn append(&mut self, idx: usize) -> Option<usize> {
        if self.dag.get(idx).is_none() || self.dag.get(self.idx).is_none() {
            return None;
        }
        self.dag.arena[self.idx].children.push(idx);
        self.dag.arena[idx].parents.push(self.idx);
        Some(idx)
    }

    pub(crate) fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut T),
    {
        if let Some(node) = self.dag.get_mut(self.idx) {
            f(&mut node.data);
        }
        self
    }
}
