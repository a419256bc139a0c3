//! Groups near-duplicate news articles from several outlets into stories.
//!
//! The core pipeline lives in [`grouping`]: titles are normalized, compared pairwise with
//! the overlap coefficient, linked into a similarity graph, split into connected components
//! and summarized into [`model::Group`]s. [`fetcher`] and [`service`] wrap it into the batch
//! job that reads feeds and writes the JSON files.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod grouping;
pub mod model;
pub mod service;
pub mod util;

pub use config::GroupingConfig;
pub use error::{GroupResult, GroupingError};
pub use grouping::{group_articles, Threshold};
pub use model::{Article, Group};
