use std::{fs, path::Path};

use anyhow::Context;
use tracing::info;

use crate::{
    config::FetcherConfig,
    fetcher,
    model::{articles_from_json, Article},
};

use super::write_json_atomically;

pub fn load(path: &Path) -> anyhow::Result<Vec<Article>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read articles file {:?}", path))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("articles file {:?} is not valid JSON", path))?;
    let articles = articles_from_json(value)
        .with_context(|| format!("articles file {:?} has an unexpected shape", path))?;
    Ok(articles)
}

pub fn save(path: &Path, articles: &[Article]) -> anyhow::Result<()> {
    write_json_atomically(path, articles)?;
    info!(path = ?path, count = articles.len(), "articles saved");
    Ok(())
}

pub async fn fetch_and_save(config: &FetcherConfig, path: &Path) -> anyhow::Result<Vec<Article>> {
    let articles = fetcher::fetch_all(config).await?;
    save(path, &articles)?;
    Ok(articles)
}
