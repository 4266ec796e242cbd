//! Integration tests for EnrichmentPipeline against a mock weather API.

use std::sync::Arc;
use std::time::Duration;

use surfspot_weather::{
    build_markers, EnrichmentPipeline, Popup, Spot, SpotId, SpotSource, TriggerSummary,
    WaveEstimator, WeatherBySpot, WeatherProvider,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn current_weather(speed: f64, deg: f64, temp_k: f64) -> serde_json::Value {
    serde_json::json!({
        "weather": [{ "description": "clear sky" }],
        "main": { "temp": temp_k },
        "wind": { "speed": speed, "deg": deg }
    })
}

fn spots() -> Vec<Spot> {
    vec![
        Spot::new("hilton", "Hilton Beach", 32.09, 34.77),
        Spot::new("maravi", "Maravi", 32.02, 34.74),
        Spot::new("dado", "Dado Beach", 32.8, 34.95),
    ]
}

fn pipeline(server: &MockServer) -> EnrichmentPipeline {
    let provider = WeatherProvider::new(&server.uri(), "test-key", Duration::from_secs(5)).unwrap();
    EnrichmentPipeline::new(
        Arc::new(provider),
        WeatherBySpot::new(),
        WaveEstimator::default(),
    )
}

async fn mount_weather(server: &MockServer, lat: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", lat))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_one_request_per_spot_per_trigger() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather(10.0, 180.0, 300.0)))
        .expect(3)
        .mount(&server)
        .await;

    let mut p = pipeline(&server);
    let summary = p.enrich_all(&spots());
    assert_eq!(summary.issued, 3);
    p.settle().await;

    assert_eq!(p.state().len(), 3);
    let hilton = p.state().get(&SpotId::new("hilton")).unwrap();
    assert!((hilton.wave_height_m - 0.570).abs() < 1e-3);
}

#[tokio::test]
async fn test_retrigger_refetches_and_converges() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather(6.0, 90.0, 291.0)))
        .expect(6)
        .mount(&server)
        .await;

    let mut p = pipeline(&server);
    p.enrich_all(&spots());
    p.settle().await;
    let first: Vec<_> = spots()
        .iter()
        .map(|s| p.state().get(&s.id).unwrap())
        .collect();

    let summary = p.enrich_all(&spots());
    assert_eq!(summary.issued, 3);
    assert_eq!(summary.deduplicated, 0);
    p.settle().await;

    for (spot, before) in spots().iter().zip(first) {
        let after = p.state().get(&spot.id).unwrap();
        assert_eq!(after.observation, before.observation);
        assert_eq!(after.wave_height_m, before.wave_height_m);
    }
}

#[tokio::test]
async fn test_failed_spot_stays_loading() {
    let server = MockServer::start().await;

    mount_weather(&server, "32.09", current_weather(4.0, 0.0, 288.0)).await;
    mount_weather(&server, "32.02", current_weather(5.0, 10.0, 289.0)).await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "32.8"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let mut p = pipeline(&server);
    p.enrich_all(&spots());
    p.settle().await;

    assert!(p.state().contains(&SpotId::new("hilton")));
    assert!(p.state().contains(&SpotId::new("maravi")));
    assert!(!p.state().contains(&SpotId::new("dado")));

    let markers = build_markers(&spots(), p.state());
    assert!(matches!(markers[0].popup, Popup::Ready(_)));
    assert!(matches!(markers[2].popup, Popup::Loading { .. }));
}

#[tokio::test]
async fn test_in_flight_fetches_are_not_duplicated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_weather(8.0, 45.0, 295.0))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(3)
        .mount(&server)
        .await;

    let mut p = pipeline(&server);
    p.enrich_all(&spots());
    let again = p.enrich_all(&spots());
    assert_eq!(
        again,
        TriggerSummary {
            issued: 0,
            deduplicated: 3,
            superseded: 0,
            cancelled: 0,
        }
    );

    p.settle().await;
    assert_eq!(p.state().len(), 3);
}

#[tokio::test]
async fn test_removed_spot_is_cancelled() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_weather(8.0, 45.0, 295.0))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let mut p = pipeline(&server);
    p.enrich_all(&spots()[..1]);
    assert_eq!(p.in_flight(), 1);

    let summary = p.enrich_all(&[]);
    assert_eq!(summary.cancelled, 1);

    tokio::time::timeout(Duration::from_millis(500), p.settle())
        .await
        .expect("cancelled fetch should finish promptly");
    assert!(p.state().is_empty());
}

#[tokio::test]
async fn test_moved_spot_supersedes_stale_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "32.09"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_weather(20.0, 0.0, 290.0))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    mount_weather(&server, "32.1", current_weather(5.0, 0.0, 290.0)).await;

    let mut p = pipeline(&server);
    p.enrich_all(&[Spot::new("hilton", "Hilton Beach", 32.09, 34.77)]);
    let summary = p.enrich_all(&[Spot::new("hilton", "Hilton Beach", 32.1, 34.77)]);
    assert_eq!(summary.superseded, 1);
    assert_eq!(summary.issued, 1);

    p.settle().await;
    let weather = p.state().get(&SpotId::new("hilton")).unwrap();
    assert_eq!(weather.observation.wind_speed(), 5.0);
}

#[tokio::test]
async fn test_shutdown_cancels_outstanding_fetches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_weather(8.0, 45.0, 295.0))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let mut p = pipeline(&server);
    p.enrich_all(&spots());
    p.shutdown();

    tokio::time::timeout(Duration::from_millis(500), p.settle())
        .await
        .expect("shutdown should cancel fetches");
    assert!(p.state().is_empty());
}

#[tokio::test]
async fn test_follow_reenriches_on_source_change() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather(10.0, 180.0, 300.0)))
        .mount(&server)
        .await;

    let source = SpotSource::new(spots()[..1].to_vec());
    let mut p = pipeline(&server);
    let state = p.state().clone();
    let mut updates = state.subscribe();

    let rx = source.subscribe();
    let follower = tokio::spawn(async move {
        p.follow(rx).await;
        p
    });

    tokio::time::timeout(Duration::from_secs(5), updates.changed())
        .await
        .unwrap()
        .unwrap();
    assert!(state.contains(&SpotId::new("hilton")));

    source.replace(spots());
    tokio::time::timeout(Duration::from_secs(5), async {
        while state.len() < 3 {
            updates.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    drop(source);
    let p = tokio::time::timeout(Duration::from_secs(5), follower)
        .await
        .unwrap()
        .unwrap();
    p.settle().await;
    assert_eq!(state.len(), 3);
}
