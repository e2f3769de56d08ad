mod common;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use common::{dead_url, envelope, record_json, serve};
use icdn::error::{Field, RoutingFault};
use icdn::static_host::StaticHost;
use icdn::{Error, Icdn, Profile};

#[tokio::test]
async fn status_profile_404_names_the_requested_endpoint() {
    let app = Router::new().route("/query/{uuid}", get(|| async { StatusCode::NOT_FOUND }));
    let cdn = Icdn::new(serve(app).await, Profile::StatusDriven);

    match cdn.query("abc").await {
        Err(Error::NotFound(endpoint)) => assert_eq!(endpoint, "/query/abc"),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[tokio::test]
async fn status_profile_400_carries_the_response_text() {
    let app = Router::new().route(
        "/query/{uuid}",
        get(|| async { (StatusCode::BAD_REQUEST, "uuid looks wrong") }),
    );
    let cdn = Icdn::new(serve(app).await, Profile::StatusDriven);

    match cdn.query("abc").await {
        Err(Error::BadRequest(text)) => assert_eq!(text, "uuid looks wrong"),
        other => panic!("expected bad request, got {other:?}"),
    }
}

#[tokio::test]
async fn status_profile_decodes_successful_records() {
    let app = Router::new().route(
        "/query/{uuid}",
        get(|Path(uuid): Path<String>| async move { Json(record_json(&uuid)) }),
    );
    let cdn = Icdn::new(serve(app).await, Profile::StatusDriven);

    let record = cdn.query("abc").await.unwrap();
    assert_eq!(record.uuid, "abc");
    assert_eq!(record.time.timestamp_millis(), 1_745_000_000_000);
    assert_eq!(record.data["origin"], "test");
}

#[tokio::test]
async fn envelope_profile_maps_codes_to_typed_errors() {
    let app = Router::new().route(
        "/data/{uuid}",
        get(|| async { (StatusCode::BAD_REQUEST, Json(envelope("INVALID_UUID", "bad uuid"))) }),
    );
    let cdn = Icdn::new(serve(app).await, Profile::Envelope);

    match cdn.query("abc").await {
        Err(Error::Validation { field, message }) => {
            assert_eq!(field, Field::Uuid);
            assert_eq!(message, "bad uuid");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn envelope_profile_keeps_unmapped_codes() {
    let app = Router::new().route(
        "/store",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(envelope("QUOTA_MELTED", "try later"))) }),
    );
    let cdn = Icdn::new(serve(app).await, Profile::Envelope);

    match cdn.details().await {
        Err(Error::Unknown { code, message }) => {
            assert_eq!(code, "QUOTA_MELTED");
            assert_eq!(message, "try later");
        }
        other => panic!("expected unknown error, got {other:?}"),
    }
}

#[tokio::test]
async fn static_host_routing_codes_surface_as_routing_faults() {
    let app = Router::new().route(
        "/d/{*path}",
        get(|| async { (StatusCode::NOT_FOUND, Json(envelope("UNKNOWN_DIRECTORY", "no such dir"))) }),
    );
    let host = StaticHost::new(serve(app).await, Profile::Envelope);

    match host.directory("music/missing").await {
        Err(Error::Routing { fault, message }) => {
            assert_eq!(fault, RoutingFault::UnknownDirectory);
            assert_eq!(message, "no such dir");
        }
        other => panic!("expected routing fault, got {other:?}"),
    }
}

#[tokio::test]
async fn transport_failures_stay_outside_the_taxonomy() {
    let cdn = Icdn::new(dead_url().await, Profile::Envelope);
    assert!(matches!(cdn.query("abc").await, Err(Error::Transport(_))));
}

#[tokio::test]
async fn malformed_success_payload_is_a_decode_error() {
    let app = Router::new().route("/data/{uuid}", get(|| async { "not json" }));
    let cdn = Icdn::new(serve(app).await, Profile::Envelope);
    assert!(matches!(cdn.query("abc").await, Err(Error::Decode(_))));
}

#[tokio::test]
async fn concurrent_first_requests_share_one_connection() {
    let app = Router::new().route(
        "/data/{uuid}",
        get(|Path(uuid): Path<String>| async move { Json(record_json(&uuid)) }),
    );
    let cdn = Icdn::new(serve(app).await, Profile::Envelope);
    assert_eq!(cdn.api().session().connections_opened(), 0);

    let (first, second) = tokio::join!(cdn.query("one"), cdn.query("two"));
    assert_eq!(first.unwrap().uuid, "one");
    assert_eq!(second.unwrap().uuid, "two");
    assert_eq!(cdn.api().session().connections_opened(), 1);
}

#[tokio::test]
async fn requests_after_close_fail_without_reconnecting() {
    let app = Router::new().route(
        "/data/{uuid}",
        get(|Path(uuid): Path<String>| async move { Json(record_json(&uuid)) }),
    );
    let cdn = Icdn::new(serve(app).await, Profile::Envelope);
    cdn.query("one").await.unwrap();

    cdn.close();
    cdn.close();
    assert!(matches!(cdn.query("two").await, Err(Error::SessionClosed)));
    assert_eq!(cdn.api().session().connections_opened(), 1);
}
