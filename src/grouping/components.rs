use super::graph::SimilarityGraph;

/// One connected component of the similarity graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// First index visited; clusters are discovered in ascending root order.
    pub root: usize,
    /// Article indices in visit order, starting with `root`.
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Connected components by iterative depth-first search.
///
/// Roots are taken in index order; a node is marked visited when first pushed and joins the
/// member list when popped, so each index lands in exactly one cluster.
pub fn extract_clusters(graph: &SimilarityGraph) -> Vec<Cluster> {
    let n = graph.node_count();
    let mut visited = vec![false; n];
    let mut clusters = Vec::new();
    let mut stack = Vec::new();

    for root in 0..n {
        if visited[root] {
            continue;
        }

        visited[root] = true;
        stack.push(root);
        let mut members = Vec::new();

        while let Some(node) = stack.pop() {
            members.push(node);
            for &next in graph.neighbours(node) {
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }

        clusters.push(Cluster { root, members });
    }

    clusters
}
