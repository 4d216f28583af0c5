// Integration tests for the Firebase client against a mock REST server

use carewatch_core::traits::{AlertLog, ReadingSource};
use carewatch_core::{AlertKind, MonitorError, NewAlert};
use carewatch_storage::{FirebaseConfig, FirebaseStore};
use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> FirebaseStore {
    FirebaseStore::new(FirebaseConfig::new(&server.uri()).unwrap())
}

fn sse(events: &[(&str, &str)]) -> ResponseTemplate {
    let body: String = events
        .iter()
        .map(|(event, data)| format!("event: {}\ndata: {}\n\n", event, data))
        .collect();
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/event-stream")
}

#[tokio::test]
async fn test_append_uses_generated_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/alerts.json"))
        .and(body_partial_json(json!({"type": "Fall"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "-NqX1"})))
        .expect(1)
        .mount(&server)
        .await;

    let record = store_for(&server)
        .append(NewAlert::now(AlertKind::Fall, "A fall has been detected"))
        .await
        .unwrap();

    assert_eq!(record.id, "-NqX1");
    assert_eq!(record.kind, AlertKind::Fall);
}

#[tokio::test]
async fn test_append_passes_auth_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/alerts.json"))
        .and(query_param("auth", "token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "-NqX2"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = FirebaseConfig::new(&server.uri())
        .unwrap()
        .with_auth_token("token-1");
    let record = FirebaseStore::new(config)
        .append(NewAlert::now(AlertKind::Mood, "Person appears to be sad"))
        .await
        .unwrap();
    assert_eq!(record.id, "-NqX2");
}

#[tokio::test]
async fn test_append_failure_is_store_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/alerts.json"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Permission denied"))
        .mount(&server)
        .await;

    let err = store_for(&server)
        .append(NewAlert::now(AlertKind::Temperature, "hot"))
        .await
        .unwrap_err();
    match err {
        MonitorError::Store(msg) => assert!(msg.contains("401")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_and_clear() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alerts.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "-Na": {"type": "Temperature", "message": "Current temp: 45°C - High Temperature!", "timestamp": "2025-03-01T10:00:00.000Z"},
            "-Nb": {"type": "Mood", "message": "Person appears to be sad", "timestamp": "2025-03-01T10:05:00.000Z"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/alerts.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let alerts = store.list().await.unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[1].kind, AlertKind::Mood);

    store.clear().await.unwrap();
}

#[tokio::test]
async fn test_list_of_empty_log() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alerts.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .mount(&server)
        .await;

    assert!(store_for(&server).list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reading_subscription_folds_deltas() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/house.json"))
        .and(header("accept", "text/event-stream"))
        .respond_with(sse(&[
            (
                "put",
                r#"{"path":"/","data":{"temp":21,"humidity":40,"fall_detection":false}}"#,
            ),
            ("keep-alive", "null"),
            ("patch", r#"{"path":"/","data":{"temp":45}}"#),
            ("put", r#"{"path":"/fall_detection","data":true}"#),
        ]))
        .mount(&server)
        .await;

    let stream = store_for(&server).subscribe_readings().await.unwrap();
    let readings: Vec<_> = stream.map(|r| r.unwrap().unwrap()).collect().await;

    assert_eq!(readings.len(), 3);
    assert_eq!(readings[0].temperature, 21.0);
    assert_eq!(readings[1].temperature, 45.0);
    assert_eq!(readings[1].humidity, 40.0);
    assert!(readings[2].fall_detected);
}

#[tokio::test]
async fn test_alert_subscription_ends_with_error_on_cancel() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alerts.json"))
        .respond_with(sse(&[
            (
                "put",
                r#"{"path":"/","data":{"-Na":{"type":"Fall","message":"m","timestamp":"2025-03-01T10:00:00Z"}}}"#,
            ),
            ("cancel", "Permission denied"),
            ("put", r#"{"path":"/","data":null}"#),
        ]))
        .mount(&server)
        .await;

    let mut stream = store_for(&server).subscribe_alerts().await.unwrap();
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.len(), 1);

    assert!(stream.next().await.unwrap().is_err());
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_subscribe_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/house.json"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    assert!(store_for(&server).subscribe_readings().await.is_err());
}
