//! Stable-schema tabular output.
//!
//! Downstream analytics consumers (notebooks, evaluation scripts) want a
//! fixed column set with known types, regardless of which optional fields
//! happened to be present in any given time window. [`Table`] is a small
//! column-typed structure: absent values become `""`/`0` defaults, numeric
//! columns coerce garbage to their default instead of failing a whole read.

use crate::model::{ArticleRow, PostRow};
use crate::resultset::Row;
use chrono::{DateTime, SecondsFormat, Utc};

/// Declared type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Str,
    Int,
    Float,
}

/// A typed column of values, all rows present.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Str(Vec<String>),
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl Column {
    fn len(&self) -> usize {
        match self {
            Self::Str(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
        }
    }

    fn render_cell(&self, idx: usize) -> String {
        match self {
            Self::Str(v) => v[idx].clone(),
            Self::Int(v) => v[idx].to_string(),
            Self::Float(v) => v[idx].to_string(),
        }
    }

    fn json_cell(&self, idx: usize) -> serde_json::Value {
        match self {
            Self::Str(v) => serde_json::Value::String(v[idx].clone()),
            Self::Int(v) => serde_json::Value::from(v[idx]),
            Self::Float(v) => serde_json::Value::from(v[idx]),
        }
    }
}

/// A column-typed table with a stable schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<(String, Column)>,
}

impl Table {
    /// Build a table from untyped result rows against a declared schema.
    ///
    /// Every schema column exists in the output even when no input row
    /// carried it; string cells default to `""`, numeric cells to `0`/`0.0`
    /// (unparseable numerics included).
    #[must_use]
    pub fn from_rows(rows: &[Row], schema: &[(&str, ColumnType)]) -> Self {
        let columns = schema
            .iter()
            .map(|(name, ty)| {
                let column = match ty {
                    ColumnType::Str => Column::Str(
                        rows.iter()
                            .map(|r| r.get(*name).cloned().unwrap_or_default())
                            .collect(),
                    ),
                    ColumnType::Int => Column::Int(
                        rows.iter()
                            .map(|r| {
                                r.get(*name)
                                    .and_then(|v| v.trim().parse().ok())
                                    .unwrap_or(0)
                            })
                            .collect(),
                    ),
                    ColumnType::Float => Column::Float(
                        rows.iter()
                            .map(|r| {
                                r.get(*name)
                                    .and_then(|v| v.trim().parse().ok())
                                    .unwrap_or(0.0)
                            })
                            .collect(),
                    ),
                };
                ((*name).to_string(), column)
            })
            .collect();
        Self { columns }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |(_, c)| c.len())
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column names, in schema order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Look up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    /// Render as CSV with a header row.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        out.push_str(
            &self
                .columns
                .iter()
                .map(|(name, _)| csv_cell(name))
                .collect::<Vec<_>>()
                .join(","),
        );
        out.push('\n');
        for idx in 0..self.len() {
            let line = self
                .columns
                .iter()
                .map(|(_, col)| csv_cell(&col.render_cell(idx)))
                .collect::<Vec<_>>()
                .join(",");
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// Render as a JSON array of row objects.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let rows: Vec<serde_json::Value> = (0..self.len())
            .map(|idx| {
                self.columns
                    .iter()
                    .map(|(name, col)| (name.clone(), col.json_cell(idx)))
                    .collect::<serde_json::Map<_, _>>()
                    .into()
            })
            .collect();
        serde_json::Value::Array(rows)
    }
}

/// Assemble the stable article table: `usid`, `article_time`, `title`,
/// `category`, `link`.
#[must_use]
pub fn article_table(rows: &[ArticleRow]) -> Table {
    Table {
        columns: vec![
            (
                "usid".into(),
                Column::Str(rows.iter().map(|r| r.usid.clone()).collect()),
            ),
            (
                "article_time".into(),
                Column::Str(rows.iter().map(|r| render_time(r.time)).collect()),
            ),
            (
                "title".into(),
                Column::Str(rows.iter().map(|r| r.title.clone()).collect()),
            ),
            (
                "category".into(),
                Column::Str(rows.iter().map(|r| r.category.clone()).collect()),
            ),
            (
                "link".into(),
                Column::Str(rows.iter().map(|r| r.link.clone()).collect()),
            ),
        ],
    }
}

/// Assemble the stable post table: `usid`, `post_time`, `reddit_id`,
/// `title`, `selftext`, `source`, `stance_label`, `stance_conf`.
#[must_use]
pub fn post_table(rows: &[PostRow]) -> Table {
    Table {
        columns: vec![
            (
                "usid".into(),
                Column::Str(rows.iter().map(|r| r.usid.clone()).collect()),
            ),
            (
                "post_time".into(),
                Column::Str(rows.iter().map(|r| render_time(r.time)).collect()),
            ),
            (
                "reddit_id".into(),
                Column::Str(rows.iter().map(|r| r.reddit_id.clone()).collect()),
            ),
            (
                "title".into(),
                Column::Str(rows.iter().map(|r| r.title.clone()).collect()),
            ),
            (
                "selftext".into(),
                Column::Str(rows.iter().map(|r| r.selftext.clone()).collect()),
            ),
            (
                "source".into(),
                Column::Str(rows.iter().map(|r| r.source.clone()).collect()),
            ),
            (
                "stance_label".into(),
                Column::Str(rows.iter().map(|r| r.stance_label.clone()).collect()),
            ),
            (
                "stance_conf".into(),
                Column::Float(rows.iter().map(|r| r.stance_conf).collect()),
            ),
        ],
    }
}

fn render_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

fn csv_cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    const POST_SCHEMA: &[(&str, ColumnType)] = &[
        ("usid", ColumnType::Str),
        ("stance_label", ColumnType::Str),
        ("stance_conf", ColumnType::Float),
        ("checked_word_count", ColumnType::Int),
    ];

    #[test]
    fn from_rows_fills_absent_columns_with_defaults() {
        let rows = vec![
            row(&[("usid", "1"), ("stance_conf", "0.9")]),
            row(&[("usid", "2"), ("checked_word_count", "42")]),
        ];
        let table = Table::from_rows(&rows, POST_SCHEMA);

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.column("stance_label"),
            Some(&Column::Str(vec![String::new(), String::new()]))
        );
        assert_eq!(
            table.column("stance_conf"),
            Some(&Column::Float(vec![0.9, 0.0]))
        );
        assert_eq!(
            table.column("checked_word_count"),
            Some(&Column::Int(vec![0, 42]))
        );
    }

    #[test]
    fn from_rows_coerces_garbage_numerics_to_default() {
        let rows = vec![row(&[("usid", "1"), ("stance_conf", "high")])];
        let table = Table::from_rows(&rows, POST_SCHEMA);
        assert_eq!(table.column("stance_conf"), Some(&Column::Float(vec![0.0])));
    }

    #[test]
    fn schema_is_stable_for_empty_input() {
        let table = Table::from_rows(&[], POST_SCHEMA);
        assert!(table.is_empty());
        assert_eq!(
            table.column_names(),
            vec!["usid", "stance_label", "stance_conf", "checked_word_count"]
        );
    }

    #[test]
    fn csv_output_quotes_awkward_cells() {
        let rows = vec![row(&[("usid", "a,b"), ("stance_label", "say \"hi\"")])];
        let table = Table::from_rows(&rows, POST_SCHEMA);
        let csv = table.to_csv();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "usid,stance_label,stance_conf,checked_word_count"
        );
        assert_eq!(lines.next().unwrap(), "\"a,b\",\"say \"\"hi\"\"\",0,0");
    }

    #[test]
    fn json_output_preserves_column_types() {
        let rows = vec![row(&[("usid", "1"), ("stance_conf", "0.5")])];
        let json = Table::from_rows(&rows, POST_SCHEMA).to_json();
        assert_eq!(json[0]["usid"], "1");
        assert_eq!(json[0]["stance_conf"], 0.5);
        assert_eq!(json[0]["checked_word_count"], 0);
    }

    #[test]
    fn post_table_has_the_stable_schema() {
        let table = post_table(&[]);
        assert_eq!(
            table.column_names(),
            vec![
                "usid",
                "post_time",
                "reddit_id",
                "title",
                "selftext",
                "source",
                "stance_label",
                "stance_conf"
            ]
        );
    }

    #[test]
    fn article_table_renders_times_as_rfc3339() {
        let rows = vec![ArticleRow {
            time: Some(Utc.with_ymd_and_hms(2026, 1, 6, 13, 40, 58).single().unwrap()),
            usid: "123".into(),
            title: "T".into(),
            link: "L".into(),
            category: "news".into(),
        }];
        let table = article_table(&rows);
        assert_eq!(
            table.column("article_time"),
            Some(&Column::Str(vec!["2026-01-06T13:40:58Z".into()]))
        );
    }
}
