#![allow(clippy::unwrap_used)]
// Integration tests for `DeviceClient` using wiremock.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rainly_api::{CommunicationCause, DeviceClient, Error, LoginOutcome};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(password: &str) -> (MockServer, DeviceClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/api/4/", server.uri())).unwrap();
    let client = DeviceClient::with_client(
        reqwest::Client::new(),
        base_url,
        SecretString::from(password.to_owned()),
    );
    (server, client)
}

async fn mount_login(server: &MockServer, token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/4/auth/login"))
        .and(body_json(json!({"pwd": "hunter2", "remember": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "checksum": "c0ffee",
            "expires_in": 157_680_000,
            "statusCode": 0
        })))
        .expect(times)
        .mount(server)
        .await;
}

fn zones_body() -> serde_json::Value {
    json!({
        "zones": [
            {"uid": 1, "name": "Front", "state": 0, "active": true, "type": 2},
            {"uid": 2, "name": "Back", "state": 1, "active": true, "remaining": 240}
        ]
    })
}

// ── Version ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_version_needs_no_session() {
    let (server, client) = setup("").await;

    Mock::given(method("GET"))
        .and(path("/api/4/apiVer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiVer": "4.6.1",
            "hwVer": 3,
            "swVer": "4.0.1144"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let version = client.get_version().await.unwrap();
    assert_eq!(version.api_ver, "4.6.1");
    assert_eq!(version.hardware_code(), Some(3));
    assert!(!client.is_authenticated().await);
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_stores_token() {
    let (server, client) = setup("hunter2").await;
    mount_login(&server, "tok-1", 1).await;

    assert_eq!(client.login().await.unwrap(), LoginOutcome::Authenticated);
    assert!(client.is_authenticated().await);
    // Token held: no second POST.
    assert_eq!(client.login().await.unwrap(), LoginOutcome::Authenticated);
}

#[tokio::test]
async fn test_login_rejected_is_not_an_error() {
    let (server, client) = setup("hunter2").await;

    Mock::given(method("POST"))
        .and(path("/api/4/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"statusCode": 2})))
        .mount(&server)
        .await;

    assert_eq!(client.login().await.unwrap(), LoginOutcome::NotAuthenticated);
    assert!(!client.is_authenticated().await);
}

#[tokio::test]
async fn test_login_without_token_field() {
    let (server, client) = setup("hunter2").await;

    Mock::given(method("POST"))
        .and(path("/api/4/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"statusCode": 0})))
        .mount(&server)
        .await;

    assert_eq!(client.login().await.unwrap(), LoginOutcome::NotAuthenticated);
}

// ── Authenticated GETs ──────────────────────────────────────────────

#[tokio::test]
async fn test_zones_carry_token_and_login_once() {
    let (server, client) = setup("hunter2").await;
    mount_login(&server, "tok-42", 1).await;

    Mock::given(method("GET"))
        .and(path("/api/4/zone"))
        .and(query_param("access_token", "tok-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zones_body()))
        .expect(2)
        .mount(&server)
        .await;

    let first = client.get_zones().await.unwrap();
    assert_eq!(first.zones.len(), 2);
    assert_eq!(first.zone(2).unwrap().remaining, 240);

    let second = client.get_zones().await.unwrap();
    assert!(second.fetched_at >= first.fetched_at);
}

#[tokio::test]
async fn test_empty_zone_list_is_stamped_now() {
    let (server, client) = setup("hunter2").await;
    mount_login(&server, "tok-42", 1).await;

    Mock::given(method("GET"))
        .and(path("/api/4/zone"))
        .and(query_param("access_token", "tok-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"zones": []})))
        .expect(1)
        .mount(&server)
        .await;

    let before = chrono::Utc::now();
    let snapshot = client.get_zones().await.unwrap();
    assert!(snapshot.is_empty());
    assert!(snapshot.fetched_at >= before);
}

#[tokio::test]
async fn test_concurrent_requests_share_one_login() {
    let (server, client) = setup("hunter2").await;

    Mock::given(method("POST"))
        .and(path("/api/4/auth/login"))
        .and(body_json(json!({"pwd": "hunter2", "remember": 1})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok-42"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/4/zone"))
        .and(query_param("access_token", "tok-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zones_body()))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/4/diag"))
        .and(query_param("access_token", "tok-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uptime": "0:10:00"})))
        .expect(2)
        .mount(&server)
        .await;

    let (zones_a, zones_b, diag_a, diag_b) = tokio::join!(
        client.get_zones(),
        client.get_zones(),
        client.get_diagnostics(),
        client.get_diagnostics(),
    );

    assert_eq!(zones_a.unwrap().zones.len(), 2);
    assert_eq!(zones_b.unwrap().zones.len(), 2);
    assert_eq!(diag_a.unwrap().uptime().as_deref(), Some("0:10:00"));
    assert_eq!(diag_b.unwrap().uptime().as_deref(), Some("0:10:00"));
    assert!(client.is_authenticated().await);
}

#[tokio::test]
async fn test_provision_and_diag_carry_token() {
    let (server, client) = setup("hunter2").await;
    mount_login(&server, "tok-7", 1).await;

    Mock::given(method("GET"))
        .and(path("/api/4/provision"))
        .and(query_param("access_token", "tok-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "system": {"netName": "Garden", "rainSensorRainStart": 1_620_000_000}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/4/diag"))
        .and(query_param("access_token", "tok-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uptime": "5:12:01"})))
        .expect(1)
        .mount(&server)
        .await;

    let info = client.get_device_info().await.unwrap();
    assert_eq!(info.rain_sensor_rain_start().as_deref(), Some("1620000000"));

    let diag = client.get_diagnostics().await.unwrap();
    assert_eq!(diag.uptime().as_deref(), Some("5:12:01"));
}

#[tokio::test]
async fn test_empty_password_sends_no_authenticated_request() {
    let (server, client) = setup("").await;

    Mock::given(method("POST"))
        .and(path("/api/4/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/4/zone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zones_body()))
        .expect(0)
        .mount(&server)
        .await;

    assert!(client.get_zones().await.unwrap().is_empty());
    assert!(client.get_device_info().await.unwrap().is_empty());
    assert!(client.get_diagnostics().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_login_yields_empty_results() {
    let (server, client) = setup("wrong").await;

    Mock::given(method("POST"))
        .and(path("/api/4/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/4/zone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zones_body()))
        .expect(0)
        .mount(&server)
        .await;

    assert!(client.get_zones().await.unwrap().is_empty());
}

// ── Failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_non_200_is_communication_error() {
    let (server, client) = setup("").await;

    Mock::given(method("GET"))
        .and(path("/api/4/apiVer"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.get_version().await.unwrap_err();
    assert!(err.is_communication());
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup("").await;

    Mock::given(method("GET"))
        .and(path("/api/4/apiVer"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .mount(&server)
        .await;

    let err = client.get_version().await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert_eq!(body, "<html>busy</html>"),
        other => panic!("expected Deserialization, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_device_times_out() {
    let (server, client) = setup("").await;
    let client = client.with_timeout(Duration::from_millis(100));

    Mock::given(method("GET"))
        .and(path("/api/4/apiVer"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"apiVer": "4"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client.get_version().await.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {err:?}");
}

#[tokio::test]
async fn test_close_interrupts_in_flight_request() {
    let (server, client) = setup("").await;
    let client = Arc::new(client);

    Mock::given(method("GET"))
        .and(path("/api/4/apiVer"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"apiVer": "4"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let pending = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.get_version().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    client.close();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        Error::Communication {
            cause: CommunicationCause::Interrupted,
            ..
        }
    ));
}

#[tokio::test]
async fn test_unreachable_device_is_transport_error() {
    // Nothing listens on the discard port.
    let base_url = Url::parse("http://127.0.0.1:9/api/4/").unwrap();
    let client = DeviceClient::with_client(reqwest::Client::new(), base_url, SecretString::from(""));

    let err = client.get_version().await.unwrap_err();
    assert!(err.is_communication());
    assert!(!err.is_interrupted());
}
