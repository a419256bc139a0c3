use std::path::Path;

use tracing::info;

use crate::{
    config::GroupingConfig,
    grouping::group_articles,
    model::{Article, Group},
};

use super::{articles, write_json_atomically};

/// Group the given articles and replace the groups file. Nothing is written on error.
pub fn group_and_save(
    articles: &[Article],
    config: &GroupingConfig,
    path: &Path,
) -> anyhow::Result<Vec<Group>> {
    let groups = group_articles(articles, config)?;
    write_json_atomically(path, &groups)?;

    info!(
        path = ?path,
        articles = articles.len(),
        groups = groups.len(),
        threshold = config.threshold,
        "groups saved"
    );

    Ok(groups)
}

/// Read the articles file, group it and write the groups file.
pub fn group_file(
    articles_path: &Path,
    groups_path: &Path,
    config: &GroupingConfig,
) -> anyhow::Result<Vec<Group>> {
    let articles = articles::load(articles_path)?;
    group_and_save(&articles, config, groups_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_articles(path: &Path) {
        fs::write(
            path,
            r#"[
  {"title": "Le chat mange", "pubDate": "2025-07-14T08:00:00Z", "source": "La Presse", "image": null},
  {"title": "Chat mange la souris", "pubDate": "2025-07-14T09:00:00Z", "source": "Radio-Canada", "image": "https://img/chat.jpg"},
  {"title": "Incendie à Montréal", "pubDate": "2025-07-14T10:00:00Z", "source": "TVA Nouvelles"}
]"#,
        )
        .unwrap();
    }

    #[test]
    fn writes_grouped_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("news.json");
        let output = dir.path().join("news_grouped.json");
        write_articles(&input);

        let groups = group_file(&input, &output, &GroupingConfig::default()).unwrap();
        assert_eq!(groups.len(), 2);

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        let first = &written[0];
        assert_eq!(first["title"], "Chat mange la souris");
        assert_eq!(first["image"], "https://img/chat.jpg");
        assert_eq!(first["imageSource"], "Radio-Canada");
        assert_eq!(first["articles"].as_array().unwrap().len(), 2);
        assert_eq!(first["articles"][0]["source"], "Radio-Canada");
        assert_eq!(written[1]["title"], "Incendie à Montréal");
    }

    #[test]
    fn failed_run_keeps_previous_groups() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("news.json");
        let output = dir.path().join("news_grouped.json");
        write_articles(&input);
        fs::write(&output, "[\"précédent\"]").unwrap();

        let err = group_file(&input, &output, &GroupingConfig { threshold: 1.2 }).unwrap_err();
        assert!(format!("{err:#}").contains("invalid threshold"), "{err:#}");
        assert_eq!(fs::read_to_string(&output).unwrap(), "[\"précédent\"]");
    }

    #[test]
    fn identical_runs_write_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("news.json");
        let first = dir.path().join("a.json");
        let second = dir.path().join("b.json");
        write_articles(&input);

        group_file(&input, &first, &GroupingConfig::default()).unwrap();
        group_file(&input, &second, &GroupingConfig::default()).unwrap();
        assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    }
}
