use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    error::{GroupResult, GroupingError},
    util::dates::{cmp_pub_dates, parse_pub_date, DateOrder},
};

/// One article as produced by the ingestion job. Field names follow the articles file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub link: Option<String>,
    #[serde(
        rename = "pubDate",
        default,
        deserialize_with = "lenient_optional_string"
    )]
    pub pub_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
}

impl Article {
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.pub_date.as_deref().and_then(parse_pub_date)
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image.as_deref().filter(|url| !url.trim().is_empty())
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_string(deserializer)?.unwrap_or_default())
}

// Feeds occasionally put numbers or nested objects where text is expected; anything that is
// not a JSON string is read as absent.
fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(Some(text)),
        _ => Ok(None),
    }
}

/// Convert a parsed articles document into articles.
///
/// The document must be an array of objects; missing fields are tolerated.
pub fn articles_from_json(value: Value) -> GroupResult<Vec<Article>> {
    let Value::Array(items) = value else {
        return Err(GroupingError::MalformedInput(format!(
            "expected an array of articles, found {}",
            json_kind(&value)
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(GroupingError::MalformedInput(format!(
                    "article #{index} is {}, expected an object",
                    json_kind(&item)
                )));
            }
            serde_json::from_value(item).map_err(|err| {
                GroupingError::MalformedInput(format!("article #{index}: {err}"))
            })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A story: near-duplicate articles merged under one representative title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub title: String,
    pub summary: Option<String>,
    pub image: Option<String>,
    #[serde(rename = "imageSource", skip_serializing_if = "Option::is_none")]
    pub image_source: Option<String>,
    articles: Vec<Article>,
}

impl Group {
    /// Returns `None` when `articles` is empty: a group always has at least one member.
    pub fn new(
        title: String,
        summary: Option<String>,
        image: Option<String>,
        image_source: Option<String>,
        articles: Vec<Article>,
    ) -> Option<Self> {
        if articles.is_empty() {
            return None;
        }
        Some(Self {
            title,
            summary,
            image,
            image_source,
            articles,
        })
    }

    /// Members, newest first.
    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Oldest member with a readable date; undated members are only picked when no member
    /// has a date.
    pub fn earliest(&self) -> &Article {
        let mut earliest = &self.articles[0];
        let mut earliest_at = earliest.published_at();
        for article in &self.articles[1..] {
            let published_at = article.published_at();
            if cmp_pub_dates(
                published_at.as_ref(),
                earliest_at.as_ref(),
                DateOrder::OldestFirst,
            )
            .is_lt()
            {
                earliest = article;
                earliest_at = published_at;
            }
        }
        earliest
    }

    /// Outlet credited on the story card: the one that broke it first.
    pub fn main_source(&self) -> &str {
        &self.earliest().source
    }

    pub fn image_credit(&self) -> Option<String> {
        self.image.as_ref()?;
        self.image_source
            .as_deref()
            .filter(|source| !source.is_empty())
            .map(|source| format!("Image: {source}"))
    }
}
