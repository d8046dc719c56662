//! Behavior tests for the client facade.
//!
//! These tests run the full client against a recording stub transport and
//! verify WHAT goes over the wire and HOW responses are classified.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sensorlake_client::{
    Client, ClientConfig, ClientError, DataPoint, Device, HttpClient, HttpError, HttpFuture,
    HttpMethod, HttpRequest, HttpResponse, ResultCode, RetryConfig, Selection, Selector,
    Timestamp, ValidationError, WritePoint, WriteSummary,
};
use serde_json::{json, Value};

const BASE_URL: &str = "https://lake.example.test";

/// Replays scripted responses in order and records every request.
struct RecordingHttpClient {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingHttpClient {
    fn scripted(responses: Vec<Result<HttpResponse, HttpError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("request log is not poisoned").clone()
    }

    fn body(&self, index: usize) -> Value {
        let requests = self.requests();
        let body = requests[index].body.as_deref().expect("request has a body");
        serde_json::from_str(body).expect("body is JSON")
    }
}

impl HttpClient for RecordingHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        self.requests
            .lock()
            .expect("request log is not poisoned")
            .push(request);
        let response = self
            .responses
            .lock()
            .expect("script is not poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(HttpError::new("no scripted response left")));
        Box::pin(async move { response })
    }
}

fn client(http: Arc<RecordingHttpClient>) -> Client {
    Client::with_http_client(ClientConfig::new(BASE_URL).with_api_key("test-key"), http)
}

fn ts(input: &str) -> Timestamp {
    Timestamp::parse(input).expect("valid timestamp")
}

fn three_points() -> Vec<WritePoint> {
    ["thermo-1", "thermo-2", "thermo-1"]
        .into_iter()
        .enumerate()
        .map(|(minute, device)| {
            let point = DataPoint::new(ts(&format!("2024-01-01T00:0{minute}:00Z")), 20.0)
                .expect("finite value");
            WritePoint::new(device, "temperature", point).expect("valid point")
        })
        .collect()
}

// =============================================================================
// Batch Writes: Multi-Status
// =============================================================================

#[tokio::test]
async fn when_one_of_three_points_is_rejected_write_is_partial_success() {
    // Given: A service that rejects the second point
    let http = RecordingHttpClient::scripted(vec![Ok(HttpResponse::new(
        207,
        json!({"multi_status": [{"index": 1, "status": 422, "message": "value out of range"}]})
            .to_string(),
    ))]);
    let client = client(http.clone());

    // When: Three points are written
    let envelope = client.write_data(three_points()).await.expect("request is built");

    // Then: Every submitted point is accounted for, one of them failed
    assert_eq!(envelope.code(), ResultCode::PartialSuccess);
    let statuses = envelope.multi_status().expect("batch carries item statuses");
    assert_eq!(statuses.len(), 3);
    assert_eq!(statuses.failure_count(), 1);
    let failed: Vec<usize> = envelope.failures().map(|status| status.index).collect();
    assert_eq!(failed, [1]);
    assert_eq!(
        envelope.value(),
        Some(&WriteSummary {
            submitted: 3,
            rejected: 1
        })
    );

    // And: The batch was posted once with a search over the written devices
    let requests = http.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Post);
    assert_eq!(requests[0].url, format!("{BASE_URL}/v2/write/"));
    let body = http.body(0);
    assert_eq!(
        body["search"]["selection"]["device"],
        json!({"type": "or", "children": [
            {"type": "key", "key": "thermo-1"},
            {"type": "key", "key": "thermo-2"}
        ]})
    );
    assert_eq!(body["write"]["points"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn when_every_point_is_rejected_write_is_a_failure() {
    let http = RecordingHttpClient::scripted(vec![Ok(HttpResponse::new(
        207,
        json!({"multi_status": [
            {"index": 0, "status": 400, "message": "unknown sensor"},
            {"index": 1, "status": 400, "message": "unknown sensor"},
            {"index": 2, "status": 400, "message": "unknown sensor"}
        ]})
        .to_string(),
    ))]);

    let envelope = client(http).write_data(three_points()).await.expect("request is built");

    assert_eq!(envelope.code(), ResultCode::Failure);
    assert!(envelope.value().is_none());
    assert_eq!(envelope.message(), "all 3 items failed");
    assert_eq!(envelope.failures().count(), 3);
}

#[tokio::test]
async fn when_service_accepts_batch_without_item_report_all_points_succeed() {
    let http = RecordingHttpClient::scripted(vec![Ok(HttpResponse::new(204, ""))]);

    let envelope = client(http).write_data(three_points()).await.expect("request is built");

    assert!(envelope.is_success());
    assert_eq!(envelope.multi_status().map(|statuses| statuses.len()), Some(3));
    assert_eq!(envelope.value().map(|summary| summary.accepted()), Some(3));
}

#[tokio::test]
async fn when_item_report_names_unknown_index_response_is_rejected() {
    let http = RecordingHttpClient::scripted(vec![Ok(HttpResponse::new(
        207,
        json!({"multi_status": [{"index": 7, "status": 400}]}).to_string(),
    ))]);

    let err = client(http)
        .write_data(three_points())
        .await
        .expect_err("index 7 is outside a batch of 3");

    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn when_batch_is_empty_nothing_is_sent() {
    let http = RecordingHttpClient::scripted(Vec::new());

    let err = client(http.clone())
        .write_data(Vec::new())
        .await
        .expect_err("empty batch is rejected");

    assert!(matches!(err, ClientError::Validation(ValidationError::EmptyBatch)));
    assert!(http.requests().is_empty());
}

// =============================================================================
// Transport Failures and Retries
// =============================================================================

#[tokio::test]
async fn when_transport_fails_result_is_failure_envelope() {
    // Given: A transport that cannot connect
    let http = RecordingHttpClient::scripted(vec![Err(HttpError::new("connection refused"))]);

    // When: A device is fetched
    let envelope = client(http)
        .get_device("thermo-1")
        .await
        .expect("transport errors are envelopes");

    // Then: The failure is reported in the envelope, not as an error
    assert!(envelope.is_failure());
    assert_eq!(envelope.status(), 0);
    assert_eq!(envelope.message(), "connection refused");
}

#[tokio::test]
async fn when_write_hits_unavailable_service_it_is_not_retried() {
    // Given: A client configured to retry, and a service returning 503
    let http = RecordingHttpClient::scripted(vec![
        Ok(HttpResponse::new(503, r#"{"message": "maintenance"}"#)),
        Ok(HttpResponse::new(204, "")),
    ]);
    let config = ClientConfig::new(BASE_URL)
        .with_retry(RetryConfig::fixed(Duration::from_millis(1), 3));
    let client = Client::with_http_client(config, http.clone());

    // When: A batch is written
    let envelope = client.write_data(three_points()).await.expect("request is built");

    // Then: The POST is sent exactly once and the failure surfaces
    assert!(envelope.is_failure());
    assert_eq!(envelope.status(), 503);
    assert_eq!(envelope.message(), "maintenance");
    assert_eq!(http.requests().len(), 1);
}

#[tokio::test]
async fn when_retries_are_off_by_default_get_is_sent_once() {
    let http = RecordingHttpClient::scripted(vec![Ok(HttpResponse::new(503, ""))]);

    let envelope = client(http.clone())
        .get_device("thermo-1")
        .await
        .expect("failure is an envelope");

    assert!(envelope.is_failure());
    assert_eq!(envelope.message(), "request failed with status 503");
    assert_eq!(http.requests().len(), 1);
}

// =============================================================================
// Devices
// =============================================================================

#[tokio::test]
async fn when_device_key_needs_escaping_path_is_percent_encoded() {
    let http = RecordingHttpClient::scripted(vec![Ok(HttpResponse::ok_json(
        json!({"key": "room 1/a"}).to_string(),
    ))]);

    let envelope = client(http.clone())
        .get_device("room 1/a")
        .await
        .expect("device decodes");

    assert_eq!(envelope.value().map(|device| device.key.as_str()), Some("room 1/a"));
    let request = &http.requests()[0];
    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(request.url, format!("{BASE_URL}/v2/devices/room%201%2Fa/"));
    assert_eq!(
        request.headers.get("authorization").map(String::as_str),
        Some("Bearer test-key")
    );
}

#[tokio::test]
async fn when_device_body_is_malformed_decode_error_is_returned() {
    let http = RecordingHttpClient::scripted(vec![Ok(HttpResponse::ok_json(r#"{"name": 5"#))]);

    let err = client(http)
        .get_device("thermo-1")
        .await
        .expect_err("truncated JSON must not decode");

    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn when_key_is_blank_no_request_is_sent() {
    let http = RecordingHttpClient::scripted(Vec::new());

    let err = client(http.clone())
        .delete_device("  ")
        .await
        .expect_err("blank key is rejected");

    assert!(matches!(err, ClientError::Validation(ValidationError::EmptyKey { .. })));
    assert!(http.requests().is_empty());
}

#[tokio::test]
async fn when_device_is_updated_it_is_put_to_its_own_path() {
    let device = Device::new("thermo-1")
        .expect("valid key")
        .with_name("Lobby thermostat")
        .with_attribute("building", "hq");
    let http = RecordingHttpClient::scripted(vec![Ok(HttpResponse::ok_json(
        serde_json::to_string(&device).expect("device encodes"),
    ))]);

    let envelope = client(http.clone())
        .update_device(&device)
        .await
        .expect("device decodes");

    assert_eq!(envelope.value(), Some(&device));
    let request = &http.requests()[0];
    assert_eq!(request.method, HttpMethod::Put);
    assert_eq!(request.url, format!("{BASE_URL}/v2/devices/thermo-1/"));
    assert_eq!(http.body(0)["attributes"], json!({"building": "hq"}));
}

#[tokio::test]
async fn when_devices_are_listed_pages_are_fetched_with_the_continuation_token() {
    // Given: Two pages of devices linked by a continuation token
    let http = RecordingHttpClient::scripted(vec![
        Ok(HttpResponse::ok_json(
            json!({"data": [{"key": "thermo-1"}, {"key": "thermo-2"}], "next_page": "p2"})
                .to_string(),
        )),
        Ok(HttpResponse::ok_json(
            json!({"data": [{"key": "thermo-3"}]}).to_string(),
        )),
    ]);
    let client = client(http.clone());

    // When: Devices in a building are listed and fully drained
    let envelope = client
        .list_devices(Selection::devices(Selector::attribute("building", "hq")))
        .await
        .expect("first page decodes");
    assert!(envelope.is_success());
    assert_eq!(http.requests().len(), 1, "only the first page is fetched up front");
    let cursor = envelope.into_value().expect("cursor");
    let keys: Vec<String> = cursor
        .collect_all()
        .await
        .expect("second page decodes")
        .into_iter()
        .map(|device| device.key)
        .collect();

    // Then: Devices arrive in page order
    assert_eq!(keys, ["thermo-1", "thermo-2", "thermo-3"]);

    // And: The follow-up request re-issues the route with only the token
    let requests = http.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url, format!("{BASE_URL}/v2/devices/query/"));
    assert_eq!(requests[1].url, requests[0].url);
    assert_eq!(requests[1].method, HttpMethod::Get);
    assert_eq!(http.body(0)["find"], json!({}));
    assert_eq!(http.body(1), json!({"next_page": "p2"}));
}

#[tokio::test]
async fn when_listing_fails_cursor_is_empty_and_failure_is_kept() {
    let http = RecordingHttpClient::scripted(vec![Ok(HttpResponse::new(
        401,
        r#"{"message": "invalid api key"}"#,
    ))]);

    let envelope = client(http)
        .list_devices(Selection::empty())
        .await
        .expect("failure is an envelope");

    assert!(envelope.is_failure());
    assert_eq!(envelope.message(), "invalid api key");
    let cursor = envelope.into_value().expect("adapted envelope always has a cursor");
    assert!(cursor.is_exhausted());
}

#[tokio::test]
async fn when_all_devices_are_deleted_selector_matches_everything() {
    let http = RecordingHttpClient::scripted(vec![Ok(HttpResponse::ok_json(r#"{"deleted": 4}"#))]);

    let envelope = client(http.clone())
        .delete_all_devices()
        .await
        .expect("summary decodes");

    assert_eq!(envelope.value().map(|summary| summary.deleted), Some(4));
    assert_eq!(http.requests()[0].method, HttpMethod::Delete);
    assert_eq!(
        http.body(0),
        json!({
            "search": {"type": "device", "selection": {"device": {"type": "all"}}},
            "delete": {}
        })
    );
}

// =============================================================================
// Data Reads and Deletes
// =============================================================================

#[tokio::test]
async fn when_read_window_is_reversed_nothing_is_sent() {
    let http = RecordingHttpClient::scripted(Vec::new());

    let err = client(http.clone())
        .read_data(
            Selection::devices(Selector::key("thermo-1")),
            ts("2024-01-02T00:00:00Z"),
            ts("2024-01-01T00:00:00Z"),
            None,
        )
        .await
        .expect_err("reversed window");

    assert!(matches!(err, ClientError::InvalidRange(_)));
    assert!(http.requests().is_empty());
}

#[tokio::test]
async fn when_data_is_read_rows_are_decoded_per_device_and_sensor() {
    let http = RecordingHttpClient::scripted(vec![Ok(HttpResponse::ok_json(
        json!({"data": [
            {"ts": "2024-01-01T00:00:00Z", "values": {"thermo-1": {"temperature": 20.5}}},
            {"ts": "2024-01-01T01:00:00Z", "values": {"thermo-1": {"temperature": 21.0}}}
        ]})
        .to_string(),
    ))]);

    let envelope = client(http.clone())
        .read_data(
            Selection::devices(Selector::key("thermo-1")),
            ts("2024-01-01T00:00:00Z"),
            ts("2024-01-01T02:00:00Z"),
            None,
        )
        .await
        .expect("rows decode");

    let rows = envelope
        .into_value()
        .expect("cursor")
        .collect_all()
        .await
        .expect("single page");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].get("thermo-1", "temperature"), Some(21.0));
    assert_eq!(http.requests()[0].url, format!("{BASE_URL}/v2/read/"));
    assert_eq!(http.body(0)["read"]["stop"], json!("2024-01-01T02:00:00Z"));
}

#[tokio::test]
async fn when_data_points_are_deleted_window_is_sent_to_sensor_path() {
    let http = RecordingHttpClient::scripted(vec![Ok(HttpResponse::ok_json(r#"{"deleted": 12}"#))]);

    let envelope = client(http.clone())
        .delete_data_points(
            "thermo-1",
            "temperature",
            ts("2024-01-01T00:00:00Z"),
            ts("2024-01-02T00:00:00Z"),
        )
        .await
        .expect("summary decodes");

    assert_eq!(envelope.value().map(|summary| summary.deleted), Some(12));
    let request = &http.requests()[0];
    assert_eq!(
        request.url,
        format!("{BASE_URL}/v2/devices/thermo-1/sensors/temperature/datapoints/")
    );
    assert_eq!(
        http.body(0),
        json!({"start": "2024-01-01T00:00:00Z", "stop": "2024-01-02T00:00:00Z"})
    );
}

// =============================================================================
// Configuration
// =============================================================================

#[tokio::test]
async fn when_config_comes_from_environment_requests_follow_it() {
    // Given: Settings supplied through the environment lookup
    let config = ClientConfig::from_lookup(|name| match name {
        "SENSORLAKE_BASE_URL" => Some(String::from("https://eu.lake.example.test/")),
        "SENSORLAKE_API_VERSION" => Some(String::from("v3")),
        "SENSORLAKE_TIMEOUT_MS" => Some(String::from("1500")),
        _ => None,
    })
    .expect("valid settings");
    let http = RecordingHttpClient::scripted(vec![Ok(HttpResponse::new(204, ""))]);
    let client = Client::with_http_client(config, http.clone());

    // When: A device is deleted
    let envelope = client.delete_device("thermo-1").await.expect("empty body is fine");

    // Then: URL, version and timeout come from the settings, with no auth
    assert!(envelope.is_success());
    let request = &http.requests()[0];
    assert_eq!(request.url, "https://eu.lake.example.test/v3/devices/thermo-1/");
    assert_eq!(request.timeout_ms, 1500);
    assert!(!request.headers.contains_key("authorization"));
}
