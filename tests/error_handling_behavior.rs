//! Behavior-driven tests for error handling
//!
//! These tests verify HOW invalid input and store failures reach the caller,
//! and which lookups degrade to "nothing there".

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use saham_core::{
    ConfigError, HttpClient, HttpError, HttpRequest, HttpResponse, StoreConfig, SupabaseStore,
    STORE_KEY_VAR, STORE_URL_VAR,
};
use saham_tests::*;

/// Transport that answers every request with the same canned result.
struct CannedHttpClient {
    response: Result<HttpResponse, HttpError>,
}

impl HttpClient for CannedHttpClient {
    fn execute<'a>(
        &'a self,
        _request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let response = self.response.clone();
        Box::pin(async move { response })
    }
}

/// Transport that answers requests with a fixed script, in order.
struct ScriptedHttpClient {
    responses: Mutex<VecDeque<HttpResponse>>,
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        _request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let next = self.responses.lock().expect("script lock").pop_front();
        Box::pin(async move { next.ok_or_else(|| HttpError::new("script exhausted")) })
    }
}

fn repository_over(client: Arc<dyn HttpClient>) -> StockRepository {
    let config = StoreConfig::new("https://demo.supabase.co", "service-key").expect("config");
    let store = SupabaseStore::with_http_client(client, config);
    StockRepository::new(Arc::new(store))
}

fn hosted_repository(response: Result<HttpResponse, HttpError>) -> StockRepository {
    repository_over(Arc::new(CannedHttpClient { response }))
}

// =============================================================================
// Error Handling: Invalid requests
// =============================================================================

#[tokio::test]
async fn when_limit_is_zero_request_is_rejected() {
    // Given: A store
    let fx = fixture();

    // When: User asks for zero rows
    let result = fx
        .repository
        .fetch_history(&HistoryFilter {
            limit: Some(0),
            ..HistoryFilter::default()
        })
        .await;

    // Then: A validation error is returned
    assert_eq!(
        result,
        Err(StoreError::Validation(ValidationError::ZeroLimit))
    );
}

#[tokio::test]
async fn when_ticker_list_contains_invalid_symbol_request_is_rejected() {
    // Given: A store
    let fx = fixture();

    // When: One of the tickers is malformed
    let result = fx
        .repository
        .fetch_history(&HistoryFilter {
            emiten: Some(String::from("BBCA 9XYZ")),
            ..HistoryFilter::default()
        })
        .await;

    // Then: The whole request fails validation
    assert!(matches!(
        result,
        Err(StoreError::Validation(ValidationError::EmitenInvalidStart { ch: '9' }))
    ));
}

#[test]
fn when_sort_column_is_unknown_request_does_not_decode() {
    // When: A request names a column that does not exist
    let result =
        serde_json::from_str::<HistoryFilter>(r#"{"sortBy":"harga; DROP TABLE session"}"#);

    // Then: Decoding fails before any query is built
    let error = result.expect_err("should fail");
    assert!(error.to_string().contains("unknown column"));
}

#[test]
fn when_sort_order_is_unknown_request_does_not_decode() {
    let result = serde_json::from_str::<HistoryFilter>(r#"{"sortOrder":"sideways"}"#);
    assert!(result.is_err());
}

// =============================================================================
// Error Handling: Store failures
// =============================================================================

#[tokio::test]
async fn when_hosted_store_is_unreachable_history_reports_query_error() {
    // Given: A transport that cannot connect
    let repository = hosted_repository(Err(HttpError::new("connection refused")));

    // When: History is fetched
    let result = repository.fetch_history(&HistoryFilter::default()).await;

    // Then: The failure is surfaced, not swallowed
    let error = result.expect_err("should fail");
    assert!(matches!(error, StoreError::Query(ref message) if message.contains("connection refused")));
}

#[tokio::test]
async fn when_hosted_store_returns_malformed_rows_decode_error_is_reported() {
    // Given: A store answering with rows missing required fields
    let repository = hosted_repository(Ok(HttpResponse::ok_json(r#"[{"emiten":"BBCA"}]"#)));

    // When: History is fetched
    let result = repository.fetch_history(&HistoryFilter::default()).await;

    // Then: A decode error is returned
    assert!(matches!(result, Err(StoreError::Decode(_))));
}

#[tokio::test]
async fn when_hosted_store_fails_upsert_reports_write_error() {
    // Given: A store rejecting writes
    let repository = hosted_repository(Ok(HttpResponse::new(
        409,
        r#"{"message":"permission denied for table stock_queries"}"#,
    )));

    // When: A record is saved
    let result = repository.upsert_record(&record("BBCA", "2024-01-02")).await;

    // Then: The write error carries the store's diagnostic
    let error = result.expect_err("should fail");
    assert!(matches!(error, StoreError::Write(ref message) if message.contains("permission denied")));
}

#[tokio::test]
async fn when_store_fails_lenient_lookups_read_as_absent() {
    // Given: A store that always fails
    let repository = hosted_repository(Ok(HttpResponse::new(503, "")));

    // When: Lenient lookups run
    let latest = repository.get_latest(&emiten("BBCA")).await;
    let session = repository.get_session_value("token").await;
    let patched = repository
        .patch_prior_day_price(&emiten("BBCA"), date("2024-01-03"), 9100.0)
        .await;

    // Then: Each degrades to None, while the tagged lookup keeps the failure
    assert_eq!(latest, None);
    assert_eq!(session, None);
    assert_eq!(patched, Ok(None));
    assert!(repository.find_latest(&emiten("BBCA")).await.is_err());
    assert!(repository
        .try_patch_prior_day_price(&emiten("BBCA"), date("2024-01-03"), 9100.0)
        .await
        .is_err());
}

#[tokio::test]
async fn when_prior_record_is_found_but_patch_fails_write_error_is_returned() {
    // Given: A store that finds yesterday's row but rejects the update
    let prior = r#"[{"emiten":"TLKM","from_date":"2024-01-03","status":"success"}]"#;
    let repository = repository_over(Arc::new(ScriptedHttpClient {
        responses: Mutex::new(VecDeque::from([
            HttpResponse::ok_json(prior),
            HttpResponse::new(500, r#"{"message":"could not update stock_queries"}"#),
        ])),
    }));

    // When: Today's closing price is written through the lenient patch
    let result = repository
        .patch_prior_day_price(&emiten("TLKM"), date("2024-01-04"), 3920.0)
        .await;

    // Then: The write failure reaches the caller instead of reading as "nothing to patch"
    assert!(matches!(result, Err(StoreError::Write(ref message)) if message.contains("could not update")));
}

// =============================================================================
// Error Handling: Configuration
// =============================================================================

#[test]
fn when_store_url_is_missing_configuration_fails() {
    let result = StoreConfig::from_lookup(|name| {
        (name == STORE_KEY_VAR).then(|| String::from("service-key"))
    });
    assert_eq!(result, Err(ConfigError::Missing(STORE_URL_VAR)));
}

#[test]
fn when_store_key_is_missing_configuration_fails() {
    let result = StoreConfig::from_lookup(|name| {
        (name == STORE_URL_VAR).then(|| String::from("https://demo.supabase.co"))
    });
    assert_eq!(result, Err(ConfigError::Missing(STORE_KEY_VAR)));
}
