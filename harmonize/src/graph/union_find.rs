// ============================================================================
// Union-Find over dense node indices
// ============================================================================

/// Disjoint-set forest with path compression and union by size.
#[derive(Debug)]
pub(crate) struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    /// Find root with iterative path compression (two-pass).
    pub(crate) fn find(&mut self, node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut current = node;
        while current != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }

        root
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        let (small, large) = if self.size[root_a] < self.size[root_b] {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        self.parent[small] = large;
        self.size[large] += self.size[small];
    }

    /// Groups node indices by root.
    ///
    /// Groups are ordered by their smallest member and each group is ascending.
    pub(crate) fn groups(&mut self) -> Vec<Vec<usize>> {
        let len = self.parent.len();
        let mut group_of_root = vec![usize::MAX; len];
        let mut groups: Vec<Vec<usize>> = Vec::new();

        for node in 0..len {
            let root = self.find(node);
            if group_of_root[root] == usize::MAX {
                group_of_root[root] = groups.len();
                groups.push(Vec::new());
            }
            groups[group_of_root[root]].push(node);
        }

        groups
    }
}
