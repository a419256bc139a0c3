use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::debug;

use super::Threshold;
use crate::{
    model::Article,
    util::title::{normalize_title, overlap_similarity, title_tokens},
};

/// Title tokens of one input article, computed once per run.
#[derive(Debug, Clone)]
pub struct NormalizedArticle {
    pub original_index: usize,
    pub tokens: BTreeSet<String>,
}

impl NormalizedArticle {
    pub fn from_articles(articles: &[Article]) -> Vec<Self> {
        articles
            .iter()
            .enumerate()
            .map(|(original_index, article)| Self {
                original_index,
                tokens: title_tokens(&normalize_title(Some(&article.title))),
            })
            .collect()
    }
}

/// Undirected graph over article indices; an edge joins two titles whose overlap reaches the
/// threshold. Neighbour lists are kept in ascending index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarityGraph {
    adjacency: Vec<Vec<usize>>,
}

impl SimilarityGraph {
    pub fn build(articles: &[Article], threshold: Threshold) -> Self {
        let normalized = NormalizedArticle::from_articles(articles);
        Self::from_normalized(&normalized, threshold)
    }

    /// Scores every pair `i < j`. Rows are scored in parallel, each producing its own edge
    /// list, and merged in row order so the result matches a sequential pass.
    pub fn from_normalized(normalized: &[NormalizedArticle], threshold: Threshold) -> Self {
        let n = normalized.len();
        let limit = threshold.value();

        let rows: Vec<Vec<usize>> = (0..n)
            .into_par_iter()
            .map(|i| {
                let left = &normalized[i].tokens;
                ((i + 1)..n)
                    .filter(|&j| overlap_similarity(left, &normalized[j].tokens) >= limit)
                    .collect()
            })
            .collect();

        let mut adjacency = vec![Vec::new(); n];
        for (i, row) in rows.into_iter().enumerate() {
            for j in row {
                adjacency[i].push(j);
                adjacency[j].push(i);
            }
        }

        let graph = Self { adjacency };
        debug!(
            articles = n,
            pairs_scored = n * n.saturating_sub(1) / 2,
            edges = graph.edge_count(),
            threshold = limit,
            "similarity graph built"
        );
        graph
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    pub fn neighbours(&self, index: usize) -> &[usize] {
        self.adjacency.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.neighbours(a).binary_search(&b).is_ok()
    }
}
