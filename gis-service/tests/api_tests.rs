//! Integration tests for the HTTP API.

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use gis::{MemoryStore, PolygonFeature, RoadFeature, SyntheticIdAllocator};
use gis_service::{router, AppState, CorsOrigins};
use serde_json::{json, Value};

/// Create a test server over `store`, returning the store for inspection.
fn create_test_server(store: MemoryStore) -> (TestServer, Arc<MemoryStore>) {
    let store = Arc::new(store);
    let state = Arc::new(AppState::new(
        store.clone(),
        Arc::new(SyntheticIdAllocator::new()),
    ));
    (TestServer::new(router(state)).unwrap(), store)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _) = create_test_server(MemoryStore::new());

    let response = server.get("/health").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_add_points_skips_missing_coordinates() {
    let (server, store) = create_test_server(MemoryStore::new());

    let response = server
        .post("/api/v1/osm/points/add")
        .json(&json!([
            {"name": "A", "lat": 10, "lng": 20},
            {"name": "B", "lat": null, "lng": 5}
        ]))
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["inserted"], 1);
    assert_eq!(json["rejected"].as_array().unwrap().len(), 1);
    assert_eq!(json["rejected"][0]["index"], 1);
    assert_eq!(json["rejected"][0]["reason"], "MissingCoordinate");
    assert_eq!(store.point_count(), 1);
}

#[tokio::test]
async fn test_add_points_reports_persistence_failure() {
    let (server, store) = create_test_server(MemoryStore::new().with_point(
        -2,
        Some("existing"),
        gis::MercatorPoint { x: 0.0, y: 0.0 },
    ));

    let response = server
        .post("/api/v1/osm/points/add")
        .json(&json!([
            {"name": "A", "lat": 1, "lng": 1},
            {"name": "B", "lat": 2, "lng": 2}
        ]))
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["inserted"], 1);
    assert_eq!(json["rejected"][0]["reason"], "PersistenceFailure");
    assert!(json["rejected"][0]["message"]
        .as_str()
        .unwrap()
        .contains("-2"));
    assert!(store.contains_point(-1));
}

#[tokio::test]
async fn test_add_points_succeeds_when_store_down() {
    let (server, store) = create_test_server(MemoryStore::new());
    store.set_unavailable(true);

    let response = server
        .post("/api/v1/osm/points/add")
        .json(&json!([{"name": "A", "lat": 1, "lng": 1}]))
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["inserted"], 0);
    assert_eq!(json["rejected"][0]["reason"], "PersistenceFailure");
}

#[tokio::test]
async fn test_add_points_rejects_non_array_body() {
    let (server, _) = create_test_server(MemoryStore::new());

    let response = server
        .post("/api/v1/osm/points/add")
        .json(&json!({"name": "A", "lat": 1, "lng": 1}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_added_points_are_listed() {
    let (server, _) = create_test_server(MemoryStore::new());

    server
        .post("/api/v1/osm/points/add")
        .json(&json!([
            {"name": "Cafe", "lat": 55.7558, "lng": 37.6173},
            {"lat": 55.0, "lng": 37.0}
        ]))
        .await
        .assert_status_ok();

    let response = server.get("/api/v1/osm/points").await;
    response.assert_status_ok();
    let json: Value = response.json();

    // unnamed points are not listed
    let points = json.as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["name"], "Cafe");
    assert_eq!(points[0]["osm_id"], -1);

    let geometry: Value = serde_json::from_str(points[0]["geojson"].as_str().unwrap()).unwrap();
    assert_eq!(geometry["type"], "Point");
    let lon = geometry["coordinates"][0].as_f64().unwrap();
    let lat = geometry["coordinates"][1].as_f64().unwrap();
    assert!((lon - 37.6173).abs() < 1e-9);
    assert!((lat - 55.7558).abs() < 1e-9);
}

#[tokio::test]
async fn test_delete_point() {
    let (server, store) = create_test_server(MemoryStore::new());

    server
        .post("/api/v1/osm/points/add")
        .json(&json!([{"name": "A", "lat": 1, "lng": 1}]))
        .await
        .assert_status_ok();

    server
        .delete("/api/v1/osm/points/-1")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert_eq!(store.point_count(), 0);

    server
        .delete("/api/v1/osm/points/-1")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_roads_and_polygons() {
    let (server, _) = create_test_server(
        MemoryStore::new()
            .with_roads(vec![RoadFeature {
                osm_id: 10,
                name: Some("Tverskaya".to_string()),
                highway: Some("primary".to_string()),
                geojson: Some(r#"{"type":"LineString","coordinates":[[37.6,55.7],[37.61,55.76]]}"#.to_string()),
            }])
            .with_polygons(vec![PolygonFeature {
                osm_id: 20,
                name: Some("Gorky Park".to_string()),
                leisure_type: Some("park".to_string()),
                landuse_type: None,
                geojson: None,
            }]),
    );

    let roads: Value = server.get("/api/v1/osm/roads").await.json();
    assert_eq!(roads[0]["highway"], "primary");

    let polygons: Value = server.get("/api/v1/osm/polygons").await.json();
    assert_eq!(polygons[0]["leisure_type"], "park");
    assert_eq!(polygons[0]["landuse_type"], Value::Null);
}

#[tokio::test]
async fn test_listing_when_store_down() {
    let (server, store) = create_test_server(MemoryStore::new());
    store.set_unavailable(true);

    let response = server.get("/api/v1/osm/points").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_distances_three_points() {
    let (server, _) = create_test_server(MemoryStore::new());

    let response = server
        .post("/api/v1/osm/distances")
        .json(&json!({"points": [[0, 0], [0, 1], [1, 1]]}))
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    let lines = json["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["from"], json!([0.0, 0.0]));
    assert_eq!(lines[0]["to"], json!([0.0, 1.0]));
    assert_eq!(lines[1]["from"], json!([0.0, 1.0]));
    assert_eq!(lines[1]["to"], json!([1.0, 1.0]));

    let sum: f64 = lines.iter().map(|l| l["distance"].as_f64().unwrap()).sum();
    let total = json["totalDistance"].as_f64().unwrap();
    assert!((total - sum).abs() < 1e-6);
    assert!(total > 220_000.0 && total < 224_000.0);
}

#[tokio::test]
async fn test_distances_single_point() {
    let (server, _) = create_test_server(MemoryStore::new());

    let response = server
        .post("/api/v1/osm/distances")
        .json(&json!({"points": [[12.5, 41.9]]}))
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["lines"], json!([]));
    assert_eq!(json["totalDistance"], 0.0);
}

#[tokio::test]
async fn test_distances_malformed_input() {
    let (server, _) = create_test_server(MemoryStore::new());

    for body in [
        json!({}),
        json!({"points": [[0, 0], [1]]}),
        json!({"points": [[0, 0], ["a", 1]]}),
        json!({"points": [[0, 0], [0, 95]]}),
    ] {
        let response = server.post("/api/v1/osm/distances").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_distances_store_failure_is_request_failure() {
    let (server, _) = create_test_server(MemoryStore::new().fail_distances_after(1));

    let response = server
        .post("/api/v1/osm/distances")
        .json(&json!({"points": [[0, 0], [0, 1], [1, 1]]}))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("segment 1"));
    assert!(json.get("lines").is_none());
}

#[tokio::test]
async fn test_openapi_document() {
    let (server, _) = create_test_server(MemoryStore::new());

    let response = server.get("/api-docs/openapi.json").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert!(json["paths"]["/api/v1/osm/distances"].is_object());
    assert!(json["paths"]["/api/v1/osm/points/add"].is_object());
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(store, Arc::new(SyntheticIdAllocator::new())));
    let app = router(state).layer(CorsOrigins::parse("http://localhost:5500").layer());
    let server = TestServer::new(app).unwrap();

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("http://localhost:5500"),
        )
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.header("access-control-allow-origin"),
        "http://localhost:5500"
    );
}

#[tokio::test]
async fn test_store_sequence_numbers_below_existing_ids() {
    let store = Arc::new(MemoryStore::new().with_point(
        -1_700_000_000_000,
        Some("legacy"),
        gis::MercatorPoint { x: 0.0, y: 0.0 },
    ));
    let state = Arc::new(AppState::new(store.clone(), store));
    let server = TestServer::new(router(state)).unwrap();

    server
        .post("/api/v1/osm/points/add")
        .json(&json!([{"name": "new", "lat": 1, "lng": 1}]))
        .await
        .assert_status_ok();

    let points: Value = server.get("/api/v1/osm/points").await.json();
    let ids: Vec<i64> = points
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["osm_id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![-1_700_000_000_001, -1_700_000_000_000]);
}

#[tokio::test]
async fn test_two_gateways_on_one_store_never_collide() {
    let store = Arc::new(MemoryStore::new());
    let gateway = || {
        let state = Arc::new(AppState::new(store.clone(), store.clone()));
        TestServer::new(router(state)).unwrap()
    };
    let (first, second) = (gateway(), gateway());

    for (i, server) in [&first, &second, &first, &second].into_iter().enumerate() {
        let json: Value = server
            .post("/api/v1/osm/points/add")
            .json(&json!([{"name": format!("p{i}"), "lat": 1, "lng": 1}]))
            .await
            .json();
        assert_eq!(json["inserted"], 1);
    }
    assert_eq!(store.point_count(), 4);
}

#[tokio::test]
async fn test_add_points_isolates_malformed_elements() {
    let (server, store) = create_test_server(MemoryStore::new());

    let response = server
        .post("/api/v1/osm/points/add")
        .json(&json!([
            {"name": "A", "lat": 10, "lng": 20},
            {"name": 5, "lat": 1, "lng": 1},
            7,
            {"name": "Svalbard N", "lat": 86.5, "lng": 20}
        ]))
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["inserted"], 3);
    assert_eq!(json["rejected"].as_array().unwrap().len(), 1);
    assert_eq!(json["rejected"][0]["index"], 2);
    assert_eq!(json["rejected"][0]["reason"], "MissingCoordinate");
    assert_eq!(store.point_count(), 3);
}
