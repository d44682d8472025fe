mod common;

use common::{FakeApi, PARK_STREET_STOPS, RED_DIRECTIONS, Reply, query_value, transport};
use mbta_tracker::config::{Direction, StationTarget};
use mbta_tracker::directions::{DirectionMap, DirectionResolver};
use mbta_tracker::stations::StationResolver;

#[tokio::test]
async fn test_direction_map_standard_outbound_inbound() {
    let api = FakeApi::new();
    api.on(
        "/routes/Orange",
        Reply::json(r#"{"data":{"attributes":{"direction_names":["Outbound","Inbound"]}}}"#),
    );

    let map = DirectionResolver::new(transport(&api)).resolve("Orange").await;

    assert_eq!(map, DirectionMap { inbound: 1, outbound: 0 });
}

#[tokio::test]
async fn test_direction_map_broken_response_defaults() {
    let api = FakeApi::new();
    api.on("/routes/Blue", Reply::status(500, "{}"));

    let map = DirectionResolver::new(transport(&api)).resolve("Blue").await;

    assert_eq!(map.code(Direction::Outbound), 0);
    assert_eq!(map.code(Direction::Inbound), 1);
}

#[tokio::test]
async fn test_direction_map_is_fetched_once() {
    let api = FakeApi::new();
    api.on("/routes/Red", Reply::json(RED_DIRECTIONS));
    let resolver = DirectionResolver::new(transport(&api));

    assert_eq!(resolver.cached("Red").await, None);
    let (a, b) = tokio::join!(resolver.resolve("Red"), resolver.resolve("Red"));
    let c = resolver.resolve("Red").await;

    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_eq!(resolver.cached("Red").await, Some(a));
    assert_eq!(api.count("/routes/Red"), 1);
}

#[tokio::test]
async fn test_station_resolves_to_parent() {
    let api = FakeApi::new();
    api.on("/stops", Reply::json(PARK_STREET_STOPS));

    let parents = StationResolver::new(transport(&api))
        .resolve("Park Street", &["Red"])
        .await;

    assert_eq!(parents.into_iter().collect::<Vec<_>>(), vec!["place-pktrm"]);
    let request = &api.requests()[0];
    assert_eq!(query_value(&request.url, "filter[route]").as_deref(), Some("Red"));
    assert_eq!(query_value(&request.url, "page[limit]").as_deref(), Some("200"));
    assert_eq!(
        query_value(&request.url, "fields[stop]").as_deref(),
        Some("name,parent_station")
    );
}

#[tokio::test]
async fn test_nonexistent_station_is_empty() {
    let api = FakeApi::new();
    api.on(
        "/stops",
        Reply::json(r#"{"data":[{"id":"1","attributes":{"name":"Other","parent_station":null}}]}"#),
    );

    let parents = StationResolver::new(transport(&api))
        .resolve("Nonexistent", &["Orange"])
        .await;

    assert!(parents.is_empty());
}

#[tokio::test]
async fn test_parents_union_across_routes() {
    let api = FakeApi::new();
    api.queue(
        "/stops",
        Reply::json(r#"{"data":[{"id":"70196","attributes":{"name":"Park Street","parent_station":"place-pktrm"}}]}"#),
    );
    api.queue(
        "/stops",
        Reply::json(r#"{"data":[{"id":"70200","attributes":{"name":"park street","parent_station":"place-green-pktrm"}},
                                {"id":"70197","attributes":{"name":"Park Street","parent_station":"place-pktrm"}}]}"#),
    );

    let parents = StationResolver::new(transport(&api))
        .resolve("Park Street", &["Green-B", "Green-C"])
        .await;

    assert_eq!(
        parents.into_iter().collect::<Vec<_>>(),
        vec!["place-green-pktrm", "place-pktrm"]
    );
    assert_eq!(api.count("/stops"), 2);
}

#[tokio::test]
async fn test_resolve_all_keeps_unresolved_stations() {
    let api = FakeApi::new();
    api.on("/stops", Reply::json(PARK_STREET_STOPS));
    let targets = vec![
        StationTarget::new("Park Street", &["Red"], &[Direction::Inbound]),
        StationTarget::new("Nowhere", &["Red"], &[Direction::Inbound]),
    ];

    let resolved = StationResolver::new(transport(&api))
        .resolve_all(&targets)
        .await
        .unwrap();

    assert_eq!(resolved.len(), 2);
    assert!(resolved[0].is_resolved());
    assert!(!resolved[1].is_resolved());
}

#[tokio::test]
async fn test_resolve_all_fails_when_nothing_resolves() {
    let api = FakeApi::new();
    api.on("/stops", Reply::status(500, ""));
    let targets = vec![StationTarget::new("Park Street", &["Red"], &[])];

    let result = StationResolver::new(transport(&api)).resolve_all(&targets).await;

    assert!(result.is_err());
}
