//! Record-to-point mapping.
//!
//! Builders convert validated records into store points, silently skipping
//! inputs that fail validation so one bad row never aborts a batch. The
//! skip count is logged, not returned; callers observe it as the gap
//! between input length and write count.
//!
//! Schema: identity lives in tags on both measurements (`usid` on articles,
//! `usid` + `source` on posts) so reads can filter on it. `reddit_id` stays
//! a field, matched by the distinct-value lookup in [`crate::flux`].

use crate::model::{
    ArticleInput, ArticleRecord, PostInput, PostRecord, StanceInput, StanceUpdate,
};
use crate::point::Point;
use std::collections::HashSet;
use std::hash::Hash;
use tracing::debug;

/// Measurement holding one point per crawled news article.
pub const ARTICLE_MEASUREMENT: &str = "news_article";

/// Measurement holding one point per matched social post.
pub const POST_MEASUREMENT: &str = "reddit_post";

/// Build article points from raw crawler rows.
///
/// Rows without a usable identity are skipped. Tags: `category`, `usid`.
/// Fields: `title`, `link`. Time: publication date (fallback: now).
#[must_use]
pub fn build_article_points(inputs: &[ArticleInput]) -> Vec<Point> {
    let points: Vec<Point> = inputs
        .iter()
        .filter_map(ArticleRecord::from_input)
        .map(|record| article_point(&record))
        .collect();

    log_skipped("article", inputs.len(), points.len());
    points
}

/// Build one point from a validated article record.
#[must_use]
pub fn article_point(record: &ArticleRecord) -> Point {
    Point::new(ARTICLE_MEASUREMENT, record.published_at)
        .tag("category", &record.category)
        .tag("usid", &record.usid)
        .field_str("title", &record.title)
        .field_str("link", &record.link)
}

/// Build post points from raw matcher rows.
///
/// Rows without the (`usid`, `reddit_id`) identity pair are skipped, as are
/// rows whose `created_utc` is present but unparseable; rerunning the same
/// batch therefore yields points with identical tag sets and timestamps.
#[must_use]
pub fn build_post_points(inputs: &[PostInput]) -> Vec<Point> {
    let points: Vec<Point> = inputs
        .iter()
        .filter_map(PostRecord::from_input)
        .map(|record| post_point(&record))
        .collect();

    log_skipped("post", inputs.len(), points.len());
    points
}

/// Build one point from a validated post record.
#[must_use]
pub fn post_point(record: &PostRecord) -> Point {
    let mut point = Point::new(POST_MEASUREMENT, record.created_at)
        .tag("usid", &record.usid)
        .tag("source", &record.source)
        .field_str("reddit_id", &record.reddit_id)
        .field_str("title", &record.title)
        .field_str("permalink", &record.permalink)
        .field_str("url", &record.url)
        .field_int("checked_word_count", record.checked_word_count)
        .field_int("group_matches_in_window", record.group_matches_in_window)
        .field_str("selftext", &record.selftext);

    if let Some(label) = &record.stance_label {
        point = point
            .field_str("stance_label", label)
            .field_float("stance_conf", record.stance_conf);
    }
    point
}

/// Build stance-update points from labeler output rows.
///
/// Each point carries ONLY the stance fields and must reuse the exact tag
/// set and timestamp of the original post point; the store then merges the
/// new fields into it. Rows without a resolvable identity or timestamp are
/// skipped (an update with a recomputed timestamp would be a duplicate,
/// not an update).
#[must_use]
pub fn build_stance_update_points(inputs: &[StanceInput]) -> Vec<Point> {
    let points: Vec<Point> = inputs
        .iter()
        .filter_map(StanceUpdate::from_input)
        .map(|update| stance_update_point(&update))
        .collect();

    log_skipped("stance update", inputs.len(), points.len());
    points
}

/// Build one minimal stance-only point from a validated update.
#[must_use]
pub fn stance_update_point(update: &StanceUpdate) -> Point {
    Point::new(POST_MEASUREMENT, update.at)
        .tag("usid", &update.usid)
        .tag("source", &update.source)
        .field_str("stance_label", &update.stance_label)
        .field_float("stance_conf", update.stance_conf)
}

/// Collapse rows sharing an identity key, first-seen-wins.
///
/// Rows whose key function returns `None` are dropped along the way; a row
/// without an identity cannot be deduplicated against anything.
pub fn dedup_by_identity<T, K, F>(rows: Vec<T>, key_fn: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> Option<K>,
{
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| match key_fn(row) {
            Some(key) => seen.insert(key),
            None => false,
        })
        .collect()
}

fn log_skipped(kind: &str, input_len: usize, kept: usize) {
    let skipped = input_len - kept;
    if skipped > 0 {
        debug!("Skipped {skipped} of {input_len} {kind} records (missing identity or timestamp)");
    }
}
