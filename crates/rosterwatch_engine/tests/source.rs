use std::time::Duration;

use pretty_assertions::assert_eq;
use rosterwatch_engine::{
    ApiClient, ApiSettings, FailureKind, LeaderSource, NameSource, TradeSource,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(ApiSettings {
        base_url: format!("{}/api", server.uri()),
        ..ApiSettings::default()
    })
    .expect("client")
}

#[tokio::test]
async fn lookup_sends_query_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/names"))
        .and(query_param("query", "jo"))
        .and(query_param("limit", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"names":["Joel Embiid","Nikola Jokic"]}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let names = client_for(&server).lookup("jo", 25).await.expect("lookup ok");

    assert_eq!(names, vec!["Joel Embiid", "Nikola Jokic"]);
}

#[tokio::test]
async fn leaders_are_parsed_per_category() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/leaders"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{
                "points": [{"name": "Luka Doncic", "value": 33.9, "games": 70, "team": "DAL"}],
                "assists": [{"name": "Tyrese Haliburton", "value": 10.9}]
            }"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let boards = client_for(&server).leaders().await.expect("leaders ok");

    assert_eq!(boards.len(), 2);
    let points = &boards["points"];
    assert_eq!(points[0].name, "Luka Doncic");
    assert_eq!(points[0].games, Some(70));
    assert_eq!(boards["assists"][0].games, None);
}

#[tokio::test]
async fn http_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/names"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server).lookup("jo", 5).await.unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(503));
}

#[tokio::test]
async fn malformed_body_is_a_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/names"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"["not","wrapped"]"#, "application/json"))
        .mount(&server)
        .await;

    let err = client_for(&server).lookup("jo", 5).await.unwrap_err();

    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/leaders"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_raw("{}", "application/json"),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(ApiSettings {
        base_url: format!("{}/api/", server.uri()),
        request_timeout: Duration::from_millis(50),
        ..ApiSettings::default()
    })
    .expect("client");

    let err = client.leaders().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn oversized_response_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/names"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"names":["A very long name"]}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(ApiSettings {
        base_url: format!("{}/api", server.uri()),
        max_bytes: 10,
        ..ApiSettings::default()
    })
    .expect("client");

    let err = client.lookup("a", 5).await.unwrap_err();
    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 10, .. }));
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = ApiClient::new(ApiSettings {
        base_url: "::not a url::".to_string(),
        ..ApiSettings::default()
    })
    .unwrap_err();

    assert_eq!(err.kind, FailureKind::InvalidUrl);
}

#[tokio::test]
async fn trades_are_returned_as_raw_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/trades"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"trades":[{"from":"DAL","to":"LAL","players":["Luka Doncic"]},{"from":"BOS"}]}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let trades = client_for(&server).trades(2).await.expect("trades ok");

    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0]["players"][0], "Luka Doncic");
    assert_eq!(trades[1]["from"], "BOS");
}

#[tokio::test]
async fn trades_without_wrapper_object_fail_to_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/trades"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
        .mount(&server)
        .await;

    let err = client_for(&server).trades(5).await.unwrap_err();

    assert_eq!(err.kind, FailureKind::Decode);
}
