//! Query result decoding.
//!
//! The store answers Flux queries with annotated CSV: `#datatype`, `#group`
//! and `#default` annotation records, a header record with a leading empty
//! annotation column, then data records; distinct result tables are
//! separated by blank lines and restate their annotations and header.
//!
//! [`Rows`] walks that format lazily, yielding one string-keyed [`Row`] per
//! data record. Quoted fields may contain commas, quotes and newlines
//! (post bodies do), so records are scanned character-wise rather than
//! split on lines.

use std::collections::BTreeMap;

/// One pivoted result row: column name to raw string value.
pub type Row = BTreeMap<String, String>;

/// Lazy iterator over the data rows of an annotated-CSV response body.
#[derive(Debug)]
pub struct Rows<'a> {
    rest: &'a str,
    header: Option<Vec<String>>,
}

/// Decode an annotated-CSV response body into a row iterator.
#[must_use]
pub fn rows(body: &str) -> Rows<'_> {
    Rows {
        rest: body,
        header: None,
    }
}

impl Iterator for Rows<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        loop {
            if self.rest.is_empty() {
                return None;
            }
            let record = self.read_record();

            // Blank separator between tables: the next table restates its
            // own header, so forget the current one.
            if record.iter().all(String::is_empty) {
                self.header = None;
                continue;
            }
            // Annotation records describe types/defaults; values arrive as
            // strings either way, so they are skipped.
            if record.first().is_some_and(|f| f.starts_with('#')) {
                continue;
            }
            match &self.header {
                None => self.header = Some(record),
                Some(header) => {
                    let row: Row = header
                        .iter()
                        .zip(record)
                        .filter(|(name, _)| !name.is_empty())
                        .map(|(name, value)| (name.clone(), value))
                        .collect();
                    return Some(row);
                }
            }
        }
    }
}

impl Rows<'_> {
    /// Consume one CSV record, honoring quoted fields that span commas,
    /// escaped quotes ("") and newlines.
    fn read_record(&mut self) -> Vec<String> {
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = self.rest.char_indices();
        let mut consumed = self.rest.len();

        while let Some((idx, ch)) = chars.next() {
            if in_quotes {
                match ch {
                    '"' => {
                        // A doubled quote is a literal quote inside the field.
                        if self.rest[idx + 1..].starts_with('"') {
                            field.push('"');
                            chars.next();
                        } else {
                            in_quotes = false;
                        }
                    }
                    _ => field.push(ch),
                }
                continue;
            }
            match ch {
                '"' => in_quotes = true,
                ',' => {
                    fields.push(std::mem::take(&mut field));
                }
                '\r' => {}
                '\n' => {
                    consumed = idx + 1;
                    fields.push(field);
                    self.rest = &self.rest[consumed..];
                    return fields;
                }
                _ => field.push(ch),
            }
        }

        fields.push(field);
        self.rest = &self.rest[consumed..];
        fields
    }
}
