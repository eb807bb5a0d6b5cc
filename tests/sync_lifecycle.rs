//! Integration tests for the sync lifecycle: first fetch, unchanged rerun, remote update.
//!
//! Each test runs against its own wiremock server and its own destination
//! directory. These tests exercise fetch, parse, render and persist end to
//! end through `sync::run`, checking both the written feed and the file
//! modification time that carries freshness between runs.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use sl_feeds::feed::freshness_marker;
use sl_feeds::fetch::{FetchError, Fetcher, SourceLocation};
use sl_feeds::sync::{self, SyncError, SyncOutcome};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHANGELOG_V1: &str = "\
Mon Sep 12 19:32:41 UTC 2016
a/kernel-generic-4.4.20-x86_64-1.txz:  Upgraded.
+--------------------------+
Fri Sep  9 22:34:31 UTC 2016
Mirrors are syncing a new ISO, please be patient.
";

const CHANGELOG_V2: &str = "\
Wed Sep 14 08:00:00 UTC 2016
n/openssl-1.0.2i-x86_64-1.txz:  Upgraded.
  (* Security fix *)
+--------------------------+
Mon Sep 12 19:32:41 UTC 2016
a/kernel-generic-4.4.20-x86_64-1.txz:  Upgraded.
+--------------------------+
Fri Sep  9 22:34:31 UTC 2016
Mirrors are syncing a new ISO, please be patient.
";

const V1_MODIFIED: &str = "Mon, 12 Sep 2016 19:40:00 GMT";
const V2_MODIFIED: &str = "Wed, 14 Sep 2016 08:05:00 GMT";

fn v1_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, 9, 12, 19, 40, 0).unwrap()
}

fn v2_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, 9, 14, 8, 5, 0).unwrap()
}

fn test_dest(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("sl_feeds_sync_{name}_{nanos}"));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn fetcher() -> Fetcher {
    Fetcher::new(reqwest::Client::new())
}

/// Mounts HEAD and GET for one release, each expected `head`/`get` times.
async fn mount_release(
    server: &MockServer,
    release: &str,
    body: &str,
    last_modified: &str,
    head: u64,
    get: u64,
) {
    let file = format!("/{release}/ChangeLog.txt");
    Mock::given(method("HEAD"))
        .and(path(file.as_str()))
        .respond_with(ResponseTemplate::new(200).insert_header("Last-Modified", last_modified))
        .expect(head)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(file.as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Last-Modified", last_modified)
                .set_body_string(body),
        )
        .expect(get)
        .mount(server)
        .await;
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_second_run_without_remote_change_writes_nothing() {
    let server = MockServer::start().await;
    // First run: GET only. Second run: HEAD only.
    mount_release(&server, "slackware64-current", CHANGELOG_V1, V1_MODIFIED, 1, 1).await;

    let dest = test_dest("unchanged");
    let sources = vec![SourceLocation::new(&server.uri(), "slackware64-current", "").unwrap()];
    let feed_path = dest.join("slackware64-current.rss");

    let first = sync::run(&fetcher(), &dest, &sources, false).await;
    assert_eq!(first.updated(), 1);
    assert_eq!(freshness_marker(&feed_path).unwrap(), Some(v1_time()));
    let content_after_first = std::fs::read(&feed_path).unwrap();

    let second = sync::run(&fetcher(), &dest, &sources, true).await;
    assert_eq!(second.unchanged(), 1);
    match &second.releases[0].result {
        Ok(SyncOutcome::Unchanged { remote }) => assert_eq!(*remote, v1_time()),
        other => panic!("Expected Unchanged, got {:?}", other),
    }
    assert_eq!(std::fs::read(&feed_path).unwrap(), content_after_first);
    assert_eq!(freshness_marker(&feed_path).unwrap(), Some(v1_time()));

    std::fs::remove_dir_all(&dest).ok();
}

#[tokio::test]
async fn test_remote_update_replaces_feed_and_marker() {
    let first_server = MockServer::start().await;
    mount_release(&first_server, "slackware-current", CHANGELOG_V1, V1_MODIFIED, 0, 1).await;

    let dest = test_dest("update");
    let feed_path = dest.join("slackware-current.rss");

    let source = SourceLocation::new(&first_server.uri(), "slackware-current", "").unwrap();
    let outcome = sync::sync_release(&fetcher(), &dest, &source).await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Updated {
            entries: 2,
            modified: v1_time()
        }
    );

    let second_server = MockServer::start().await;
    mount_release(&second_server, "slackware-current", CHANGELOG_V2, V2_MODIFIED, 1, 1).await;

    let source = SourceLocation::new(&second_server.uri(), "slackware-current", "").unwrap();
    let outcome = sync::sync_release(&fetcher(), &dest, &source).await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Updated {
            entries: 3,
            modified: v2_time()
        }
    );
    assert_eq!(freshness_marker(&feed_path).unwrap(), Some(v2_time()));

    let channel = rss::Channel::read_from(std::fs::read(&feed_path).unwrap().as_slice()).unwrap();
    assert_eq!(channel.title(), "ChangeLog.txt for slackware-current");
    assert_eq!(channel.items().len(), 3);
    assert_eq!(
        channel.items()[0].title(),
        Some("1 update. Including a (* Security fix *)!")
    );

    std::fs::remove_dir_all(&dest).ok();
}

#[tokio::test]
async fn test_prefix_names_local_file_only() {
    let server = MockServer::start().await;
    mount_release(&server, "slackware64-14.2", CHANGELOG_V1, V1_MODIFIED, 0, 1).await;

    let dest = test_dest("prefix");
    let sources = vec![SourceLocation::new(&server.uri(), "slackware64-14.2", "alphageek-").unwrap()];

    let report = sync::run(&fetcher(), &dest, &sources, true).await;
    assert_eq!(report.updated(), 1);
    assert_eq!(report.releases[0].name, "alphageek-slackware64-14.2");

    let feed_path = dest.join("alphageek-slackware64-14.2.rss");
    let channel = rss::Channel::read_from(std::fs::read(&feed_path).unwrap().as_slice()).unwrap();
    assert_eq!(channel.title(), "ChangeLog.txt for alphageek-slackware64-14.2");
    assert_eq!(channel.link(), format!("{}/slackware64-14.2", server.uri()));

    std::fs::remove_dir_all(&dest).ok();
}

// ============================================================================
// Failure isolation
// ============================================================================

#[tokio::test]
async fn test_failing_release_does_not_stop_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slackware-13.37/ChangeLog.txt"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_release(&server, "slackware-current", CHANGELOG_V1, V1_MODIFIED, 0, 1).await;

    let dest = test_dest("isolation");
    let sources = vec![
        SourceLocation::new(&server.uri(), "slackware-13.37", "").unwrap(),
        SourceLocation::new(&server.uri(), "slackware-current", "").unwrap(),
    ];

    let report = sync::run(&fetcher(), &dest, &sources, false).await;
    assert_eq!(report.failed(), 1);
    assert_eq!(report.updated(), 1);
    assert!(matches!(
        report.releases[0].result,
        Err(SyncError::Fetch(FetchError::HttpStatus { status: 404, .. }))
    ));
    assert!(!dest.join("slackware-13.37.rss").exists());
    assert!(dest.join("slackware-current.rss").exists());

    std::fs::remove_dir_all(&dest).ok();
}

#[tokio::test]
async fn test_unparsable_remote_time_keeps_existing_feed() {
    let server = MockServer::start().await;
    mount_release(&server, "slackware-current", CHANGELOG_V1, V1_MODIFIED, 0, 1).await;

    let dest = test_dest("bad_time");
    let feed_path = dest.join("slackware-current.rss");
    let source = SourceLocation::new(&server.uri(), "slackware-current", "").unwrap();
    sync::sync_release(&fetcher(), &dest, &source).await.unwrap();
    let before = std::fs::read(&feed_path).unwrap();

    let broken = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("Last-Modified", "soon"))
        .mount(&broken)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&broken)
        .await;

    let source = SourceLocation::new(&broken.uri(), "slackware-current", "").unwrap();
    let err = sync::sync_release(&fetcher(), &dest, &source).await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Fetch(FetchError::InvalidLastModified { .. })
    ));
    assert_eq!(std::fs::read(&feed_path).unwrap(), before);
    assert_eq!(freshness_marker(&feed_path).unwrap(), Some(v1_time()));

    std::fs::remove_dir_all(&dest).ok();
}

#[tokio::test]
async fn test_missing_destination_directory_is_persist_error() {
    let server = MockServer::start().await;
    mount_release(&server, "slackware-current", CHANGELOG_V1, V1_MODIFIED, 0, 1).await;

    let root = test_dest("no_dest");
    let dest = root.join("missing");
    let source = SourceLocation::new(&server.uri(), "slackware-current", "").unwrap();

    let err = sync::sync_release(&fetcher(), &dest, &source).await.unwrap_err();
    assert!(matches!(err, SyncError::Persist(_)));
    assert!(!dest.exists());

    std::fs::remove_dir_all(&root).ok();
}
