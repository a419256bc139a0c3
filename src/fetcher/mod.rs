use std::{borrow::Cow, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use feed_rs::{
    model::{Entry, Feed},
    parser,
};
use reqwest::{Client, StatusCode};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::FetcherConfig,
    model::Article,
    util::{
        dates::{cmp_pub_dates, DateOrder},
        html::text_snippet,
    },
};

const KNOWN_ENTITIES: &[&str] = &["amp;", "lt;", "gt;", "quot;", "apos;"];

/// Download every configured feed and return their articles, newest first.
///
/// A feed that fails is logged and skipped. The call only fails when no feed could be read.
pub async fn fetch_all(config: &FetcherConfig) -> anyhow::Result<Vec<Article>> {
    if config.feeds.is_empty() {
        return Err(anyhow!(
            "no feeds configured; set fetcher.feeds in config file"
        ));
    }

    let timeout = if config.request_timeout_secs == 0 {
        10
    } else {
        config.request_timeout_secs
    };
    let client = Arc::new(
        Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(timeout))
            .build()?,
    );

    let concurrency = config.concurrency.max(1) as usize;
    let mut results: Vec<Option<Vec<Article>>> = vec![None; config.feeds.len()];
    let mut set = JoinSet::new();

    for (position, url) in config.feeds.iter().cloned().enumerate() {
        let client = Arc::clone(&client);
        set.spawn(async move {
            debug!(url = %url, "fetching feed");
            let outcome = fetch_feed(&client, &url).await;
            (position, url, outcome)
        });

        if set.len() >= concurrency {
            if let Some(joined) = set.join_next().await {
                record_outcome(joined, &mut results);
            }
        }
    }

    while let Some(joined) = set.join_next().await {
        record_outcome(joined, &mut results);
    }

    let succeeded = results.iter().filter(|r| r.is_some()).count();
    if succeeded == 0 {
        return Err(anyhow!("all {} feeds failed", config.feeds.len()));
    }

    // feed order first, so ties on date stay deterministic
    let mut articles: Vec<Article> = results.into_iter().flatten().flatten().collect();
    sort_newest_first(&mut articles);

    info!(
        feeds = config.feeds.len(),
        succeeded,
        articles = articles.len(),
        "feeds fetched"
    );

    Ok(articles)
}

fn record_outcome(
    joined: Result<(usize, String, anyhow::Result<Vec<Article>>), tokio::task::JoinError>,
    results: &mut [Option<Vec<Article>>],
) {
    match joined {
        Ok((position, url, Ok(articles))) => {
            debug!(url = %url, count = articles.len(), "feed parsed");
            results[position] = Some(articles);
        }
        Ok((_, url, Err(err))) => {
            warn!(error = ?err, url = %url, "failed to fetch/parse feed");
        }
        Err(err) => {
            warn!(error = ?err, "feed task panicked");
        }
    }
}

async fn fetch_feed(client: &Client, url: &str) -> anyhow::Result<Vec<Article>> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(anyhow!("HTTP {} for {}", status.as_u16(), url));
    }

    let body = response
        .text()
        .await
        .with_context(|| format!("failed to read body of {url}"))?;

    parse_feed(&body, url)
}

/// Parse one feed document fetched from `url`.
pub fn parse_feed(xml: &str, url: &str) -> anyhow::Result<Vec<Article>> {
    let sanitized = sanitize_xml(xml);
    let feed = parser::parse(sanitized.as_bytes())
        .with_context(|| format!("failed to parse feed {url}"))?;

    let source = canonical_source(feed_title(&feed), url);
    Ok(feed
        .entries
        .iter()
        .map(|entry| convert_entry(entry, &source))
        .collect())
}

fn feed_title(feed: &Feed) -> Option<&str> {
    feed.title
        .as_ref()
        .map(|text| text.content.trim())
        .filter(|title| !title.is_empty())
}

/// Escape ampersands that do not start a known XML entity or character reference.
pub fn sanitize_xml(xml: &str) -> Cow<'_, str> {
    if !xml.contains('&') {
        return Cow::Borrowed(xml);
    }

    let mut out = String::with_capacity(xml.len() + 16);
    let mut rest = xml;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if starts_with_entity(after) {
            out.push('&');
        } else {
            out.push_str("&amp;");
        }
        rest = after;
    }
    out.push_str(rest);

    Cow::Owned(out)
}

fn starts_with_entity(after: &str) -> bool {
    if KNOWN_ENTITIES.iter().any(|entity| after.starts_with(entity)) {
        return true;
    }

    let Some(reference) = after.strip_prefix('#') else {
        return false;
    };
    let (digits, radix) = match reference.strip_prefix('x') {
        Some(hex) => (hex, 16),
        None => (reference, 10),
    };
    let len = digits
        .chars()
        .take_while(|ch| ch.is_digit(radix))
        .count();
    len > 0 && digits[len..].starts_with(';')
}

/// Outlet name shown on cards, from the feed title or, failing that, the feed host.
pub fn canonical_source(feed_title: Option<&str>, feed_url: &str) -> String {
    let raw = match feed_title {
        Some(title) => title.to_string(),
        None => Url::parse(feed_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| feed_url.to_string()),
    };

    let lower = raw.to_lowercase();
    if lower.contains("radio-canada") {
        return "Radio-Canada".to_string();
    }
    if lower.contains("lapresse.ca") || lower.contains("la presse") {
        return "La Presse".to_string();
    }

    let head = raw.split(['-', '|']).next().unwrap_or_default().trim();
    if head.is_empty() {
        raw.trim().to_string()
    } else {
        head.to_string()
    }
}

fn convert_entry(entry: &Entry, source: &str) -> Article {
    let title = entry
        .title
        .as_ref()
        .map(|text| text.content.trim().to_string())
        .unwrap_or_default();

    let link = entry.links.first().map(|link| link.href.clone());

    let pub_date = entry
        .published
        .or(entry.updated)
        .map(|dt| dt.to_rfc3339());

    let description = entry
        .summary
        .as_ref()
        .map(|summary| text_snippet(&summary.content))
        .filter(|snippet| !snippet.is_empty())
        .or_else(|| {
            entry
                .content
                .as_ref()
                .and_then(|content| content.body.as_deref())
                .map(text_snippet)
                .filter(|snippet| !snippet.is_empty())
        })
        .unwrap_or_default();

    let author = entry
        .authors
        .iter()
        .map(|person| person.name.trim())
        .find(|name| !name.is_empty())
        .map(str::to_string);

    Article {
        title,
        link,
        pub_date,
        description: Some(description),
        image: entry_image(entry),
        author,
        source: source.to_string(),
    }
}

// Enclosures count whatever their declared type.
fn entry_image(entry: &Entry) -> Option<String> {
    let content_url = entry
        .media
        .iter()
        .flat_map(|media| media.content.iter())
        .find_map(|content| content.url.as_ref().map(|url| url.to_string()));

    content_url.or_else(|| {
        entry
            .media
            .iter()
            .flat_map(|media| media.thumbnails.iter())
            .map(|thumbnail| thumbnail.image.uri.clone())
            .find(|uri| !uri.is_empty())
    })
}

fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| {
        cmp_pub_dates(
            a.published_at().as_ref(),
            b.published_at().as_ref(),
            DateOrder::NewestFirst,
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>TVA Nouvelles - Actualités</title>
    <link>https://www.tvanouvelles.ca</link>
    <description>Nouvelles</description>
    <item>
      <title>Grève & négociations au port</title>
      <link>https://www.tvanouvelles.ca/greve</link>
      <pubDate>Mon, 14 Jul 2025 10:00:00 -0400</pubDate>
      <description>&lt;p&gt;Les débardeurs &amp; le patronat&lt;/p&gt;</description>
      <enclosure url="https://img.tva.ca/greve.jpg" type="image/jpeg" length="0"/>
    </item>
    <item>
      <title>Canicule à Montréal</title>
      <link>https://www.tvanouvelles.ca/canicule</link>
      <pubDate>Mon, 14 Jul 2025 12:30:00 -0400</pubDate>
      <description>Chaleur extrême</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn sanitizes_stray_ampersands_only() {
        assert_eq!(sanitize_xml("a & b"), "a &amp; b");
        assert_eq!(sanitize_xml("a &amp; b &lt; &#233; &#xE9; &quot;"), "a &amp; b &lt; &#233; &#xE9; &quot;");
        assert_eq!(sanitize_xml("R&D &#; &#x; &copy;"), "R&amp;D &amp;#; &amp;#x; &amp;copy;");
        assert_eq!(sanitize_xml("fin &"), "fin &amp;");
        assert!(matches!(sanitize_xml("rien"), Cow::Borrowed(_)));
    }

    #[test]
    fn canonicalizes_sources() {
        assert_eq!(canonical_source(Some("Radio-Canada.ca | Info"), "https://x"), "Radio-Canada");
        assert_eq!(canonical_source(Some("ICI RADIO-CANADA"), "https://x"), "Radio-Canada");
        assert_eq!(canonical_source(Some("La Presse - Manchettes"), "https://x"), "La Presse");
        assert_eq!(canonical_source(None, "https://www.lapresse.ca/manchettes/rss"), "La Presse");
        assert_eq!(canonical_source(Some("TVA Nouvelles - Actualités"), "https://x"), "TVA Nouvelles");
        assert_eq!(canonical_source(Some("Le Journal de Montréal | Actualités"), "https://x"), "Le Journal de Montréal");
        assert_eq!(canonical_source(None, "https://www.journaldemontreal.com/rss.xml"), "www.journaldemontreal.com");
    }

    #[test]
    fn parses_feed_entries() {
        let articles = parse_feed(RSS, "https://www.tvanouvelles.ca/rss.xml").unwrap();
        assert_eq!(articles.len(), 2);

        let greve = &articles[0];
        assert_eq!(greve.title, "Grève & négociations au port");
        assert_eq!(greve.source, "TVA Nouvelles");
        assert_eq!(greve.link.as_deref(), Some("https://www.tvanouvelles.ca/greve"));
        assert_eq!(greve.description.as_deref(), Some("Les débardeurs & le patronat"));
        assert_eq!(greve.image.as_deref(), Some("https://img.tva.ca/greve.jpg"));
        assert!(greve.published_at().is_some());

        assert_eq!(articles[1].image, None);
        assert_eq!(articles[1].author, None);
    }

    #[test]
    fn enclosure_is_used_whatever_its_type() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>La Presse</title>
    <item>
      <title>Festival de jazz</title>
      <link>https://www.lapresse.ca/jazz</link>
      <enclosure url="https://img.lapresse.ca/jazz" type="application/octet-stream" length="0"/>
    </item>
  </channel>
</rss>"#;
        let articles = parse_feed(xml, "https://www.lapresse.ca/manchettes/rss").unwrap();
        assert_eq!(articles[0].image.as_deref(), Some("https://img.lapresse.ca/jazz"));
        assert_eq!(articles[0].source, "La Presse");
    }

    #[test]
    fn garbage_feed_is_error() {
        assert!(parse_feed("<html><body>404</body></html>", "https://x").is_err());
    }

    #[test]
    fn sorts_newest_first_keeping_undated_last() {
        let mut articles: Vec<Article> = [None, Some("2025-07-14T08:00:00Z"), Some("2025-07-14T12:00:00Z")]
            .into_iter()
            .enumerate()
            .map(|(i, date)| Article {
                title: format!("a{i}"),
                pub_date: date.map(str::to_string),
                ..Default::default()
            })
            .collect();
        sort_newest_first(&mut articles);
        let order: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(order, vec!["a2", "a1", "a0"]);
    }

    #[tokio::test]
    async fn empty_feed_list_is_error() {
        let config = FetcherConfig {
            feeds: Vec::new(),
            ..Default::default()
        };
        assert!(fetch_all(&config).await.is_err());
    }
}
