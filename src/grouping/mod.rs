pub mod components;
pub mod graph;
pub mod summary;

use tracing::info;

use crate::{
    config::GroupingConfig,
    error::{GroupResult, GroupingError},
    model::{Article, Group},
};

pub use components::{extract_clusters, Cluster};
pub use graph::{NormalizedArticle, SimilarityGraph};
pub use summary::summarize;

pub const DEFAULT_THRESHOLD: f64 = 0.65;

/// Minimum overlap for two titles to count as the same story. Always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Threshold(f64);

impl Threshold {
    pub fn new(value: f64) -> GroupResult<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(GroupingError::InvalidThreshold(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

impl TryFrom<f64> for Threshold {
    type Error = GroupingError;

    fn try_from(value: f64) -> GroupResult<Self> {
        Self::new(value)
    }
}

/// Merge near-duplicate articles into story groups, largest story first.
///
/// The threshold is checked before any work is done; on error nothing is returned.
/// The representative title is the longest one, ties going to the article the cluster
/// traversal reached first.
pub fn group_articles(articles: &[Article], config: &GroupingConfig) -> GroupResult<Vec<Group>> {
    let threshold = Threshold::new(config.threshold)?;

    let graph = SimilarityGraph::build(articles, threshold);
    let clusters = extract_clusters(&graph);
    let groups = summarize(&clusters, articles)?;

    info!(
        articles = articles.len(),
        edges = graph.edge_count(),
        groups = groups.len(),
        threshold = threshold.value(),
        "articles grouped into stories"
    );

    Ok(groups)
}
