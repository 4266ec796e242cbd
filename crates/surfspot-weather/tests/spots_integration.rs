//! Integration tests for SpotClient using wiremock.

use surfspot_weather::{SpotClient, SpotId, SpotSourceError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_spot(id: &str, name: &str, lat: f64, lon: f64) -> serde_json::Value {
    serde_json::json!({
        "_id": id,
        "name": name,
        "lat": lat,
        "lon": lon,
        "reviews": []
    })
}

#[tokio::test]
async fn test_list_spots_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/spots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            test_spot("64f1", "Hilton Beach", 32.09, 34.77),
            test_spot("64f2", "Maravi", 32.02, 34.74),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = SpotClient::new(&format!("{}/api/", mock_server.uri())).unwrap();
    let spots = client.list_spots().await.unwrap();

    assert_eq!(spots.len(), 2);
    assert_eq!(spots[0].id, SpotId::new("64f1"));
    assert_eq!(spots[0].name, "Hilton Beach");
    assert_eq!(spots[1].position(), (32.02, 34.74));
}

#[tokio::test]
async fn test_list_spots_wrapped_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/spots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "spots": [test_spot("1", "Dado Beach", 32.8, 34.95)]
        })))
        .mount(&mock_server)
        .await;

    let client = SpotClient::new(&mock_server.uri()).unwrap();
    let spots = client.list_spots().await.unwrap();
    assert_eq!(spots.len(), 1);
}

#[tokio::test]
async fn test_list_spots_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/spots"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let client = SpotClient::new(&mock_server.uri()).unwrap();
    let err = client.list_spots().await.unwrap_err();

    match err {
        SpotSourceError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_spots_bad_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/spots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .mount(&mock_server)
        .await;

    let client = SpotClient::new(&mock_server.uri()).unwrap();
    let err = client.list_spots().await.unwrap_err();
    assert!(matches!(err, SpotSourceError::Parse(_)));
}
