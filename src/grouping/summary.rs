use chrono::{DateTime, Utc};

use super::components::Cluster;
use crate::{
    error::{GroupResult, GroupingError},
    model::{Article, Group},
    util::dates::{cmp_pub_dates, DateOrder},
};

/// Turn clusters into story groups, largest first.
///
/// Every cluster member must index into `articles`; a cluster that does not is rejected
/// rather than dropped, so the output always covers every clustered article.
pub fn summarize(clusters: &[Cluster], articles: &[Article]) -> GroupResult<Vec<Group>> {
    let mut groups = clusters
        .iter()
        .map(|cluster| summarize_cluster(cluster, articles))
        .collect::<GroupResult<Vec<Group>>>()?;

    // stable: equal sizes keep cluster discovery order
    groups.sort_by(|a, b| b.len().cmp(&a.len()));
    Ok(groups)
}

fn summarize_cluster(cluster: &Cluster, articles: &[Article]) -> GroupResult<Group> {
    let visited = cluster
        .members
        .iter()
        .map(|&index| {
            articles.get(index).ok_or_else(|| {
                GroupingError::MalformedInput(format!(
                    "cluster rooted at #{} refers to article #{index}, but only {} were given",
                    cluster.root,
                    articles.len()
                ))
            })
        })
        .collect::<GroupResult<Vec<&Article>>>()?;

    // visit order decides ties
    let representative = representative(visited.iter().copied()).ok_or_else(|| {
        GroupingError::MalformedInput(format!("cluster rooted at #{} is empty", cluster.root))
    })?;

    let mut indices = cluster.members.clone();
    indices.sort_unstable();
    let mut members: Vec<(&Article, Option<DateTime<Utc>>)> = indices
        .iter()
        .filter_map(|&index| articles.get(index))
        .map(|article| (article, article.published_at()))
        .collect();

    members.sort_by(|(_, a), (_, b)| {
        cmp_pub_dates(a.as_ref(), b.as_ref(), DateOrder::NewestFirst)
    });

    let image_supplier = representative
        .image_url()
        .map(|_| representative)
        .or_else(|| {
            members
                .iter()
                .map(|(article, _)| *article)
                .find(|article| article.image_url().is_some())
        });

    Group::new(
        representative.title.clone(),
        representative.description.clone(),
        image_supplier.and_then(|article| article.image_url().map(str::to_string)),
        image_supplier.map(|article| article.source.clone()),
        members.into_iter().map(|(article, _)| article.clone()).collect(),
    )
    .ok_or_else(|| {
        GroupingError::MalformedInput(format!("cluster rooted at #{} is empty", cluster.root))
    })
}

/// Longest title in characters; the first one wins a tie.
fn representative<'a>(members: impl Iterator<Item = &'a Article>) -> Option<&'a Article> {
    let mut best: Option<(&'a Article, usize)> = None;
    for article in members {
        let length = article.title.chars().count();
        if best.map_or(true, |(_, best_length)| length > best_length) {
            best = Some((article, length));
        }
    }
    best.map(|(article, _)| article)
}
