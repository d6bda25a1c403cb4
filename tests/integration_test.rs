//! Integration tests for mediaflux.
//!
//! These tests verify end-to-end behavior against a mock HTTP store:
//! - Line-protocol write bodies, auth headers, and batch counts
//! - Empty batches performing no round-trip at all
//! - Annotated-CSV query decoding into rows and tables
//! - Stance updates echoing the original point's timestamp

use mediaflux::config::StoreConfig;
use mediaflux::flux::{Limit, Lookback};
use mediaflux::model::{ArticleInput, PostInput, StanceInput};
use mediaflux::{InfluxClient, MediafluxError};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The store client is blocking, so the mock server runs on its own
/// runtime while the test thread drives the client synchronously.
// Field order matters: the server must shut down before its runtime drops.
struct MockStore {
    server: MockServer,
    store: StoreConfig,
    rt: tokio::runtime::Runtime,
}

impl MockStore {
    fn start() -> Self {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        let store = StoreConfig {
            url: server.uri(),
            token: "test-token".to_string(),
            org: "bigdata".to_string(),
            bucket: "bigdata_bucket".to_string(),
        };
        Self { server, store, rt }
    }

    fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    fn requests(&self) -> Vec<wiremock::Request> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    fn client(&self) -> InfluxClient<'_> {
        InfluxClient::new(&self.store)
    }
}

fn article(usid: &str, title: &str) -> ArticleInput {
    serde_json::from_value(json!({
        "usid": usid,
        "date": "2026-01-06T13:40:58Z",
        "title": title,
        "link": "https://example.org/a",
        "oewaCategory": "news"
    }))
    .unwrap()
}

fn post(reddit_id: &str, created_utc: i64) -> PostInput {
    serde_json::from_value(json!({
        "usid": "123",
        "source": "r/austria",
        "reddit_id": reddit_id,
        "reddit_title": "matched post",
        "created_utc": created_utc
    }))
    .unwrap()
}

#[test]
fn write_articles_posts_line_protocol_with_auth() {
    let mock = MockStore::start();
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/v2/write"))
            .and(query_param("org", "bigdata"))
            .and(query_param("bucket", "bigdata_bucket"))
            .and(query_param("precision", "ns"))
            .and(header("Authorization", "Token test-token"))
            .and(body_string_contains("news_article,category=news,usid=123"))
            .and(body_string_contains("title=\"T1\""))
            .respond_with(ResponseTemplate::new(204)),
    );

    // The record with a blank usid is filtered, not an error.
    let inputs = vec![article(" 123 ", "T1"), article("", "dropped")];
    let written = mock.client().write_articles(&inputs).unwrap();
    assert_eq!(written, 1);

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert_eq!(body.lines().count(), 1);
}

#[test]
fn empty_batch_performs_no_round_trip() {
    let mock = MockStore::start();
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/v2/write"))
            .respond_with(ResponseTemplate::new(204)),
    );

    // Valid JSON input whose every record fails validation.
    let inputs = vec![article("", "a"), article("   ", "b")];
    assert_eq!(mock.client().write_articles(&inputs).unwrap(), 0);
    assert!(mock.requests().is_empty());
}

#[test]
fn rerunning_a_post_batch_sends_identical_lines() {
    let mock = MockStore::start();
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/v2/write"))
            .respond_with(ResponseTemplate::new(204)),
    );

    let inputs = vec![post("abc", 1_754_000_123)];
    let client = mock.client();
    client.write_posts(&inputs).unwrap();
    client.write_posts(&inputs).unwrap();

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].body, requests[1].body);
}

#[test]
fn stance_update_echoes_the_written_timestamp() {
    let mock = MockStore::start();
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/v2/write"))
            .respond_with(ResponseTemplate::new(204)),
    );

    let client = mock.client();
    client.write_posts(&[post("abc", 1_754_000_123)]).unwrap();

    let first_body = String::from_utf8(mock.requests()[0].body.clone()).unwrap();
    let written_ns: i64 = first_body
        .rsplit(' ')
        .next()
        .unwrap()
        .trim()
        .parse()
        .unwrap();

    // Echo the timestamp back the way a windowed read returns it.
    let echoed = chrono::DateTime::from_timestamp_nanos(written_ns).to_rfc3339();
    let update: StanceInput = serde_json::from_value(json!({
        "usid": "123",
        "source": "r/austria",
        "_time": echoed,
        "stance_label": "pro",
        "stance_conf": 0.92
    }))
    .unwrap();
    assert_eq!(client.write_stance_updates(&[update]).unwrap(), 1);

    let second_body = String::from_utf8(mock.requests()[1].body.clone()).unwrap();
    let update_ns: i64 = second_body
        .rsplit(' ')
        .next()
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert_eq!(update_ns, written_ns);
    assert!(second_body.starts_with("reddit_post,source=r/austria,usid=123 "));
    assert!(second_body.contains("stance_label=\"pro\""));
    assert!(!second_body.contains("reddit_id"));
}

#[test]
fn rejected_write_surfaces_status_and_body() {
    let mock = MockStore::start();
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/v2/write"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized access")),
    );

    let err = mock
        .client()
        .write_articles(&[article("123", "T")])
        .unwrap_err();
    match err {
        MediafluxError::WriteRejected { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("unauthorized"));
        }
        other => panic!("expected WriteRejected, got {other}"),
    }
}

#[test]
fn load_articles_decodes_and_dedupes() {
    let csv = "\
#datatype,string,long,dateTime:RFC3339,string,string,string,string\n\
#group,false,false,false,true,false,false,true\n\
#default,_result,,,,,,\n\
,result,table,_time,usid,title,link,category\n\
,,0,2026-01-06T14:00:00Z,123,Newest,https://example.org/1,news\n\
,,0,2026-01-06T13:00:00Z,123,Older duplicate,https://example.org/1,news\n\
,,0,2026-01-06T12:00:00Z,456,Other,https://example.org/2,sport\n";

    let mock = MockStore::start();
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/v2/query"))
            .and(query_param("org", "bigdata"))
            .and(header("Authorization", "Token test-token"))
            .and(body_string_contains("news_article"))
            .and(body_string_contains("range(start: -1h)"))
            .respond_with(ResponseTemplate::new(200).set_body_string(csv)),
    );

    let articles = mock
        .client()
        .load_articles(&Lookback::new("1h").unwrap())
        .unwrap();

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].usid, "123");
    assert_eq!(articles[0].title, "Newest");
    assert_eq!(articles[1].usid, "456");
    assert_eq!(articles[1].category, "sport");
}

#[test]
fn load_unlabeled_posts_defaults_absent_columns() {
    // stance columns never written for these posts, so the pivot omits them.
    let csv = "\
,result,table,_time,usid,source,reddit_id,title,selftext\n\
,,0,2026-02-01T08:00:00Z,123,r/austria,abc,matched post,\"body, with comma\"\n\
,,0,2026-02-01T07:00:00Z,123,r/austria,,orphan row,\n";

    let mock = MockStore::start();
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/v2/query"))
            .and(body_string_contains("reddit_post"))
            .and(body_string_contains("not exists r.stance_label"))
            .and(body_string_contains("limit(n: 500)"))
            .respond_with(ResponseTemplate::new(200).set_body_string(csv)),
    );

    let posts = mock
        .client()
        .load_unlabeled_posts(&Lookback::new("30d").unwrap(), Limit::new(500).unwrap())
        .unwrap();

    // The row without a reddit_id is dropped.
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].reddit_id, "abc");
    assert_eq!(posts[0].selftext, "body, with comma");
    assert_eq!(posts[0].stance_label, "");
    assert!((posts[0].stance_conf - 0.0).abs() < f64::EPSILON);
}

#[test]
fn load_existing_post_ids_collects_distinct_values() {
    let csv = "\
#datatype,string,long,string\n\
#group,false,false,false\n\
#default,_result,,\n\
,result,table,_value\n\
,,0,abc\n\
,,0,def\n";

    let mock = MockStore::start();
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/v2/query"))
            // The query travels JSON-encoded, so inner quotes arrive escaped.
            .and(body_string_contains(r#"r.usid == \"123\""#))
            .and(body_string_contains(r#"distinct(column: \"_value\")"#))
            .respond_with(ResponseTemplate::new(200).set_body_string(csv)),
    );

    let ids = mock
        .client()
        .load_existing_post_ids(" 123 ", &Lookback::new("365d").unwrap())
        .unwrap();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains("abc"));
    assert!(ids.contains("def"));
}

#[test]
fn load_post_table_has_stable_schema_for_empty_window() {
    let mock = MockStore::start();
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/v2/query"))
            .respond_with(ResponseTemplate::new(200).set_body_string("")),
    );

    let table = mock
        .client()
        .load_post_table(&Lookback::new("30d").unwrap(), Limit::new(100).unwrap())
        .unwrap();
    assert!(table.is_empty());
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
fn ping_reports_reachability() {
    let mock = MockStore::start();
    mock.mount(
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(204)),
    );
    assert!(mock.client().ping());

    let failing = MockStore::start();
    failing.mount(
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(500)),
    );
    assert!(!failing.client().ping());
}
