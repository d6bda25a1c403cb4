//! Blocking HTTP client for the backing time-series store.
//!
//! Every operation uses a short-lived scoped connection: the HTTP client is
//! built immediately before the call and dropped right after, success or
//! not. No pooling, no retry, no partial-success reporting; a write either
//! lands the whole batch or returns the store's rejection.
//!
//! High-level loads sit on top of three primitives: `ping`, `write_points`
//! and `run_query`.

use crate::config::StoreConfig;
use crate::error::{MediafluxError, Result};
use crate::flux::{self, FieldFilter, Lookback, Limit};
use crate::mapper::{
    self, ARTICLE_MEASUREMENT, POST_MEASUREMENT, build_article_points, build_post_points,
    build_stance_update_points,
};
use crate::model::{ArticleInput, ArticleRow, PostInput, PostRow, StanceInput};
use crate::point::{Point, encode_batch};
use crate::resultset::{self, Row};
use crate::table::{self, Table};
use std::collections::HashSet;
use tracing::{debug, info};

/// Columns kept by article reads.
const ARTICLE_COLUMNS: &[&str] = &["_time", "usid", "title", "link", "category"];

/// Columns kept by post reads.
const POST_COLUMNS: &[&str] = &[
    "_time",
    "usid",
    "source",
    "reddit_id",
    "title",
    "selftext",
    "stance_label",
    "stance_conf",
];

/// Client for one backing store, configured once at program entry.
#[derive(Debug, Clone, Copy)]
pub struct InfluxClient<'a> {
    store: &'a StoreConfig,
}

impl<'a> InfluxClient<'a> {
    /// Create a client over the given store configuration.
    #[must_use]
    pub const fn new(store: &'a StoreConfig) -> Self {
        Self { store }
    }

    // =========================================================================
    // Primitives
    // =========================================================================

    /// Reachability probe: can the store be reached at all?
    #[must_use]
    pub fn ping(&self) -> bool {
        let Ok(http) = reqwest::blocking::Client::builder().build() else {
            return false;
        };
        http.get(self.endpoint("/ping"))
            .send()
            .is_ok_and(|resp| resp.status().is_success())
    }

    /// Write a batch of points as a single call.
    ///
    /// An empty batch returns 0 without any round-trip. On success, returns
    /// the number of points written; the store applies the batch as a
    /// whole, so the count is all-or-nothing.
    pub fn write_points(&self, points: &[Point]) -> Result<usize> {
        if points.is_empty() {
            debug!("Empty point batch, skipping write");
            return Ok(0);
        }

        let body = encode_batch(points);
        let http = reqwest::blocking::Client::builder().build()?;
        let resp = http
            .post(self.endpoint("/api/v2/write"))
            .query(&[
                ("org", self.store.org.as_str()),
                ("bucket", self.store.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header("Authorization", format!("Token {}", self.store.token))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body)
            .send()?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().unwrap_or_default();
            return Err(MediafluxError::WriteRejected { status, body });
        }

        info!("Wrote {} points to bucket '{}'", points.len(), self.store.bucket);
        Ok(points.len())
    }

    /// Run a Flux query, returning the raw annotated-CSV response body.
    pub fn run_query(&self, query: &str) -> Result<String> {
        let http = reqwest::blocking::Client::builder().build()?;
        let resp = http
            .post(self.endpoint("/api/v2/query"))
            .query(&[("org", self.store.org.as_str())])
            .header("Authorization", format!("Token {}", self.store.token))
            .header("Accept", "application/csv")
            .json(&serde_json::json!({ "query": query, "type": "flux" }))
            .send()?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().unwrap_or_default();
            return Err(MediafluxError::QueryRejected { status, body });
        }
        Ok(resp.text()?)
    }

    /// Windowed, pivoted, column-projected read over one measurement.
    pub fn query_window(
        &self,
        measurement: &str,
        columns: &[&str],
        field_filter: Option<&FieldFilter>,
        lookback: &Lookback,
        limit: Option<Limit>,
    ) -> Result<Vec<Row>> {
        let query = flux::window_query(
            &self.store.bucket,
            measurement,
            columns,
            field_filter,
            lookback,
            limit,
        )?;
        let body = self.run_query(&query)?;
        let rows: Vec<Row> = resultset::rows(&body).collect();
        debug!("Windowed read of '{measurement}' returned {} rows", rows.len());
        Ok(rows)
    }

    // =========================================================================
    // Article operations
    // =========================================================================

    /// Validate and write a batch of crawler article rows.
    pub fn write_articles(&self, inputs: &[ArticleInput]) -> Result<usize> {
        self.write_points(&build_article_points(inputs))
    }

    /// Load articles within the lookback window, deduplicated by usid
    /// (first seen wins).
    pub fn load_articles(&self, lookback: &Lookback) -> Result<Vec<ArticleRow>> {
        let rows = self.query_window(ARTICLE_MEASUREMENT, ARTICLE_COLUMNS, None, lookback, None)?;
        let articles: Vec<ArticleRow> = rows.iter().map(ArticleRow::from_row).collect();
        Ok(mapper::dedup_by_identity(articles, |a| {
            crate::clean_id(Some(&a.usid))
        }))
    }

    /// Load the stable article table for analytics consumers.
    pub fn load_article_table(&self, lookback: &Lookback, limit: Limit) -> Result<Table> {
        let rows = self.query_window(
            ARTICLE_MEASUREMENT,
            ARTICLE_COLUMNS,
            None,
            lookback,
            Some(limit),
        )?;
        let articles: Vec<ArticleRow> = rows.iter().map(ArticleRow::from_row).collect();
        let deduped = mapper::dedup_by_identity(articles, |a| crate::clean_id(Some(&a.usid)));
        Ok(table::article_table(&deduped))
    }

    // =========================================================================
    // Post operations
    // =========================================================================

    /// Validate and write a batch of matcher post rows.
    pub fn write_posts(&self, inputs: &[PostInput]) -> Result<usize> {
        self.write_points(&build_post_points(inputs))
    }

    /// Write stance-field updates onto existing post points.
    pub fn write_stance_updates(&self, inputs: &[StanceInput]) -> Result<usize> {
        self.write_points(&build_stance_update_points(inputs))
    }

    /// Fetch the post ids already stored for a usid, so a rerun can skip
    /// posts that were written before. An unusable usid yields an empty
    /// set without a round-trip.
    pub fn load_existing_post_ids(
        &self,
        usid: &str,
        lookback: &Lookback,
    ) -> Result<HashSet<String>> {
        let Some(usid) = crate::clean_id(Some(usid)) else {
            return Ok(HashSet::new());
        };

        let query = flux::distinct_field_query(
            &self.store.bucket,
            POST_MEASUREMENT,
            &usid,
            "reddit_id",
            lookback,
        )?;
        let body = self.run_query(&query)?;
        let ids: HashSet<String> = resultset::rows(&body)
            .filter_map(|row| row.get("_value").cloned())
            .filter(|v| !v.is_empty())
            .collect();
        debug!("Found {} existing post ids for usid {usid}", ids.len());
        Ok(ids)
    }

    /// Load posts that do not carry a stance label yet.
    pub fn load_unlabeled_posts(&self, lookback: &Lookback, limit: Limit) -> Result<Vec<PostRow>> {
        let filter = FieldFilter::MissingOrEmpty("stance_label".to_string());
        let rows = self.query_window(
            POST_MEASUREMENT,
            POST_COLUMNS,
            Some(&filter),
            lookback,
            Some(limit),
        )?;
        Ok(Self::typed_post_rows(&rows))
    }

    /// Load the stable post table for analytics consumers.
    pub fn load_post_table(&self, lookback: &Lookback, limit: Limit) -> Result<Table> {
        let rows =
            self.query_window(POST_MEASUREMENT, POST_COLUMNS, None, lookback, Some(limit))?;
        Ok(table::post_table(&Self::typed_post_rows(&rows)))
    }

    /// Load the stable post table restricted to stance-labeled posts.
    pub fn load_labeled_post_table(&self, lookback: &Lookback, limit: Limit) -> Result<Table> {
        let filter = FieldFilter::Present("stance_label".to_string());
        let rows = self.query_window(
            POST_MEASUREMENT,
            POST_COLUMNS,
            Some(&filter),
            lookback,
            Some(limit),
        )?;
        Ok(table::post_table(&Self::typed_post_rows(&rows)))
    }

    // Rows without a reddit_id would make degenerate joins downstream.
    fn typed_post_rows(rows: &[Row]) -> Vec<PostRow> {
        rows.iter()
            .map(PostRow::from_row)
            .filter(|post| !post.reddit_id.is_empty())
            .collect()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.store.url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;

    fn unreachable_store() -> StoreConfig {
        StoreConfig {
            // Connection refused immediately; these tests must not reach it.
            url: "http://127.0.0.1:1".to_string(),
            ..StoreConfig::default()
        }
    }

    #[test]
    fn empty_batch_writes_nothing_even_when_unreachable() {
        let store = unreachable_store();
        let client = InfluxClient::new(&store);
        assert_eq!(client.write_points(&[]).unwrap(), 0);
        assert_eq!(client.write_articles(&[]).unwrap(), 0);
        assert_eq!(client.write_posts(&[]).unwrap(), 0);
        assert_eq!(client.write_stance_updates(&[]).unwrap(), 0);
    }

    #[test]
    fn blank_usid_lookup_skips_the_round_trip() {
        let store = unreachable_store();
        let client = InfluxClient::new(&store);
        let ids = client
            .load_existing_post_ids("   ", &Lookback::new("365d").unwrap())
            .unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let store = StoreConfig {
            url: "http://localhost:8086/".to_string(),
            ..StoreConfig::default()
        };
        let client = InfluxClient::new(&store);
        assert_eq!(client.endpoint("/ping"), "http://localhost:8086/ping");
    }
}
