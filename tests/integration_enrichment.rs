#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Enrichment synchronizer tests against a mock video CMS API

use std::time::{Duration, Instant};

use docpipe::config::EnrichmentConfig;
use docpipe::database::{Database, NewVideoLink, VideoLinkQueries};
use docpipe::enrichment::{EnrichmentSynchronizer, RunOutcome, RunStats};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_TOKEN: &str = "test-access-token";

async fn create_test_database() -> (TempDir, Database) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let database = Database::new(temp_dir.path().join("test.db"))
        .await
        .expect("Failed to create database");
    (temp_dir, database)
}

fn test_credentials() -> EnrichmentConfig {
    EnrichmentConfig {
        account_id: "acct1".to_string(),
        client_id: "client-abc".to_string(),
        client_secret: "secret-xyz".to_string(),
        api_timeout_secs: 5,
        rate_limit_delay_secs: 0.0,
        ..EnrichmentConfig::default()
    }
}

fn synchronizer(database: Database, config: EnrichmentConfig, server: &MockServer) -> EnrichmentSynchronizer {
    EnrichmentSynchronizer::new(database, config).with_endpoints(
        &format!("{}/v4/access_token", server.uri()),
        &server.uri(),
    )
}

async fn create_pending_link(database: &Database, video_id: &str) -> i64 {
    let link = database
        .create_video_link(NewVideoLink {
            document_id: None,
            url: format!("https://players.example.com/index.html?videoId={video_id}"),
            video_id: video_id.to_string(),
        })
        .await
        .expect("Failed to create video link");
    link.id
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v4/access_token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"access_token":"{TEST_TOKEN}","token_type":"Bearer","expires_in":300}}"#
        )))
        .mount(server)
        .await;
}

fn video_response(video_id: &str, name: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(
        r#"{{"id":"{video_id}","name":"{name}","duration":93000,"state":"ACTIVE","tags":["install"],"images":{{}}}}"#
    ))
}

#[tokio::test(flavor = "multi_thread")]
async fn successful_fetch_flips_all_four_fields() {
    let (_temp_dir, database) = create_test_database().await;
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let link_id = create_pending_link(&database, "6123").await;

    Mock::given(method("GET"))
        .and(path("/accounts/acct1/videos/6123"))
        .and(header("authorization", format!("Bearer {TEST_TOKEN}")))
        .respond_with(video_response("6123", "Installation video"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = synchronizer(database.clone(), test_credentials(), &server)
        .run()
        .await
        .expect("Run should succeed");

    assert_eq!(
        outcome,
        RunOutcome::Completed(RunStats {
            processed: 1,
            enriched: 1,
            failed: 0,
        })
    );

    let link = VideoLinkQueries::get_by_id(database.pool(), link_id)
        .await
        .expect("Failed to get link")
        .expect("Link should exist");
    assert!(!link.needs_enrichment);
    assert_eq!(link.enrichment_error, None);
    assert!(link.enriched_at.is_some());
    let metadata = link.metadata_map().expect("metadata should parse");
    assert_eq!(
        metadata.get("name").and_then(|v| v.as_str()),
        Some("Installation video")
    );
    assert_eq!(
        metadata.get("duration_ms").and_then(|v| v.as_i64()),
        Some(93000)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_credentials_leave_every_record_untouched() {
    let (_temp_dir, database) = create_test_database().await;
    let server = MockServer::start().await;
    // No mocks mounted: any request would fail the run

    let first = create_pending_link(&database, "a1").await;
    let second = create_pending_link(&database, "a2").await;

    let outcome = synchronizer(database.clone(), EnrichmentConfig::default(), &server)
        .run()
        .await
        .expect("Run should succeed as a skip");

    assert_eq!(outcome, RunOutcome::SkippedMissingCredentials);

    for id in [first, second] {
        let link = VideoLinkQueries::get_by_id(database.pool(), id)
            .await
            .expect("Failed to get link")
            .expect("Link should exist");
        assert!(link.needs_enrichment);
        assert_eq!(link.enrichment_error, None);
        assert_eq!(link.enriched_at, None);
        assert_eq!(link.metadata, None);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn disabled_configuration_skips_the_run() {
    let (_temp_dir, database) = create_test_database().await;
    let server = MockServer::start().await;

    create_pending_link(&database, "a1").await;

    let config = EnrichmentConfig {
        enabled: false,
        ..test_credentials()
    };
    let outcome = synchronizer(database, config, &server)
        .run()
        .await
        .expect("Run should succeed as a skip");

    assert_eq!(outcome, RunOutcome::SkippedDisabled);
}

#[tokio::test(flavor = "multi_thread")]
async fn token_failure_aborts_before_touching_records() {
    let (_temp_dir, database) = create_test_database().await;
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v4/access_token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(r#"{"error":"invalid_client"}"#),
        )
        .mount(&server)
        .await;

    let link_id = create_pending_link(&database, "6123").await;

    let result = synchronizer(database.clone(), test_credentials(), &server)
        .run()
        .await;
    assert!(result.is_err(), "auth failure must abort the run");

    let link = VideoLinkQueries::get_by_id(database.pool(), link_id)
        .await
        .expect("Failed to get link")
        .expect("Link should exist");
    assert!(link.needs_enrichment);
    assert_eq!(link.enrichment_error, None);
    assert_eq!(link.enriched_at, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn per_record_failure_never_aborts_the_batch() {
    let (_temp_dir, database) = create_test_database().await;
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let failing = create_pending_link(&database, "missing").await;
    let succeeding = create_pending_link(&database, "6123").await;

    Mock::given(method("GET"))
        .and(path("/accounts/acct1/videos/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"error":"not found"}"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts/acct1/videos/6123"))
        .respond_with(video_response("6123", "Setup"))
        .mount(&server)
        .await;

    let outcome = synchronizer(database.clone(), test_credentials(), &server)
        .run()
        .await
        .expect("Run should succeed");

    assert_eq!(
        outcome,
        RunOutcome::Completed(RunStats {
            processed: 2,
            enriched: 1,
            failed: 1,
        })
    );

    let failed = VideoLinkQueries::get_by_id(database.pool(), failing)
        .await
        .expect("Failed to get link")
        .expect("Link should exist");
    assert!(failed.needs_enrichment, "failed record stays pending for retry");
    let error = failed.enrichment_error.expect("error should be recorded");
    assert!(error.contains("404"), "error should carry the status: {error}");

    let enriched = VideoLinkQueries::get_by_id(database.pool(), succeeding)
        .await
        .expect("Failed to get link")
        .expect("Link should exist");
    assert!(!enriched.needs_enrichment);
}

#[tokio::test(flavor = "multi_thread")]
async fn rate_limit_waits_then_succeeds() {
    let (_temp_dir, database) = create_test_database().await;
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let link_id = create_pending_link(&database, "6123").await;

    // First attempt is rate limited with an explicit Retry-After; the mock
    // expires after one match so the retry reaches the success response
    Mock::given(method("GET"))
        .and(path("/accounts/acct1/videos/6123"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "1")
                .set_body_string(r#"{"error":"rate limit"}"#),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts/acct1/videos/6123"))
        .respond_with(video_response("6123", "Setup"))
        .mount(&server)
        .await;

    let started = Instant::now();
    let outcome = synchronizer(database.clone(), test_credentials(), &server)
        .run()
        .await
        .expect("Run should succeed");
    let elapsed = started.elapsed();

    assert!(
        elapsed >= Duration::from_secs(1),
        "should wait at least the Retry-After duration, waited {elapsed:?}"
    );
    assert_eq!(
        outcome,
        RunOutcome::Completed(RunStats {
            processed: 1,
            enriched: 1,
            failed: 0,
        })
    );

    let link = VideoLinkQueries::get_by_id(database.pool(), link_id)
        .await
        .expect("Failed to get link")
        .expect("Link should exist");
    assert!(!link.needs_enrichment);
    assert_eq!(link.enrichment_error, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn exhausted_rate_limit_retries_become_a_failure() {
    let (_temp_dir, database) = create_test_database().await;
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let link_id = create_pending_link(&database, "6123").await;

    // Always rate limited; Retry-After 0 keeps the test fast while still
    // exercising every retry (initial try + 4 retries)
    Mock::given(method("GET"))
        .and(path("/accounts/acct1/videos/6123"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "0")
                .set_body_string(r#"{"error":"rate limit"}"#),
        )
        .expect(5)
        .mount(&server)
        .await;

    let outcome = synchronizer(database.clone(), test_credentials(), &server)
        .run()
        .await
        .expect("Run should succeed");

    assert_eq!(
        outcome,
        RunOutcome::Completed(RunStats {
            processed: 1,
            enriched: 0,
            failed: 1,
        })
    );

    let link = VideoLinkQueries::get_by_id(database.pool(), link_id)
        .await
        .expect("Failed to get link")
        .expect("Link should exist");
    assert!(link.needs_enrichment);
    let error = link.enrichment_error.expect("error should be recorded");
    assert!(error.contains("429"), "error should carry the status: {error}");
}

#[tokio::test(flavor = "multi_thread")]
async fn batches_cover_every_pending_record() {
    let (_temp_dir, database) = create_test_database().await;
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    for n in 0..5 {
        create_pending_link(&database, &format!("vid{n}")).await;
    }

    for n in 0..5 {
        Mock::given(method("GET"))
            .and(path(format!("/accounts/acct1/videos/vid{n}")))
            .respond_with(video_response(&format!("vid{n}"), "Clip"))
            .expect(1)
            .mount(&server)
            .await;
    }

    let config = EnrichmentConfig {
        batch_size: 2,
        ..test_credentials()
    };
    let outcome = synchronizer(database.clone(), config, &server)
        .run()
        .await
        .expect("Run should succeed");

    assert_eq!(
        outcome,
        RunOutcome::Completed(RunStats {
            processed: 5,
            enriched: 5,
            failed: 0,
        })
    );

    let counts = database.video_link_counts().await.expect("counts");
    assert_eq!(counts.pending, 0);
    assert_eq!(counts.enriched, 5);
}
