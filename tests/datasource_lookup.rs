//! Data source resolution against a mocked IONOS API.
//!
//! Exercises the id-or-name selector end to end: lookups by id, exact and
//! partial name matching, and the documented failure modes for ambiguous or
//! empty results.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ionoscloud_provider::testing::ProviderTester;
use ionoscloud_provider::{IonosProvider, ProviderError};

async fn configured(mock: &MockServer) -> ProviderTester<IonosProvider> {
    let tester = ProviderTester::new(IonosProvider::new());
    tester
        .configure(json!({"token": "test-token", "endpoint": mock.uri()}))
        .await
        .expect("configure should succeed");
    tester
}

async fn mount_server_listing(mock: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/cloudapi/v6/datacenters/dc-1/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": "srv-1",
                    "metadata": {"state": "AVAILABLE"},
                    "properties": {"name": "web-1", "cores": 2, "ram": 2048}
                },
                {
                    "id": "srv-2",
                    "metadata": {"state": "AVAILABLE"},
                    "properties": {"name": "web-2", "cores": 4, "ram": 4096}
                },
                {
                    "id": "srv-3",
                    "metadata": {"state": "AVAILABLE"},
                    "properties": {"name": "db-1", "cores": 8, "ram": 8192}
                }
            ]
        })))
        .mount(mock)
        .await;
}

#[tokio::test]
async fn lookup_by_exact_name_returns_single_match() {
    let mock = MockServer::start().await;
    mount_server_listing(&mock).await;

    let tester = configured(&mock).await;
    let state = tester
        .read_data_source(
            "ionoscloud_server",
            json!({"datacenter_id": "dc-1", "name": "web-1"}),
        )
        .await
        .unwrap();

    assert_eq!(state["id"], "srv-1");
    assert_eq!(state["cores"], 2);
}

#[tokio::test]
async fn lookup_by_name_is_case_insensitive() {
    let mock = MockServer::start().await;
    mount_server_listing(&mock).await;

    let tester = configured(&mock).await;
    let state = tester
        .read_data_source(
            "ionoscloud_server",
            json!({"datacenter_id": "dc-1", "name": "WEB-1"}),
        )
        .await
        .unwrap();

    assert_eq!(state["id"], "srv-1");
}

#[tokio::test]
async fn partial_match_with_multiple_hits_is_ambiguous() {
    let mock = MockServer::start().await;
    mount_server_listing(&mock).await;

    let tester = configured(&mock).await;
    let err = tester
        .read_data_source(
            "ionoscloud_server",
            json!({"datacenter_id": "dc-1", "name": "web", "partial_match": true}),
        )
        .await
        .unwrap_err();

    assert!(err
        .to_string()
        .contains("more than one server found with the specified criteria"));
}

#[tokio::test]
async fn partial_match_with_single_hit_succeeds() {
    let mock = MockServer::start().await;
    mount_server_listing(&mock).await;

    let tester = configured(&mock).await;
    let state = tester
        .read_data_source(
            "ionoscloud_server",
            json!({"datacenter_id": "dc-1", "name": "db", "partial_match": true}),
        )
        .await
        .unwrap();

    assert_eq!(state["id"], "srv-3");
}

#[tokio::test]
async fn lookup_with_no_match_reports_criteria() {
    let mock = MockServer::start().await;
    mount_server_listing(&mock).await;

    let tester = configured(&mock).await;
    let err = tester
        .read_data_source(
            "ionoscloud_server",
            json!({"datacenter_id": "dc-1", "name": "mail-1"}),
        )
        .await
        .unwrap_err();

    match err {
        ProviderError::NotFound(msg) => {
            assert!(msg.contains("no server found with the specified criteria"));
            assert!(msg.contains("mail-1"));
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn lookup_with_both_id_and_name_fails() {
    let mock = MockServer::start().await;

    let tester = configured(&mock).await;
    let err = tester
        .read_data_source(
            "ionoscloud_server",
            json!({"datacenter_id": "dc-1", "id": "srv-1", "name": "web-1"}),
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("cannot be both specified"));
}

#[tokio::test]
async fn lookup_with_neither_id_nor_name_fails() {
    let mock = MockServer::start().await;

    let tester = configured(&mock).await;
    let err = tester
        .read_data_source("ionoscloud_server", json!({"datacenter_id": "dc-1"}))
        .await
        .unwrap_err();

    assert!(err
        .to_string()
        .contains("please provide either the server 'id' or 'name'"));
}

#[tokio::test]
async fn lookup_by_id_goes_straight_to_the_api() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cloudapi/v6/datacenters/dc-1/servers/srv-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "srv-2",
            "metadata": {"state": "AVAILABLE"},
            "properties": {"name": "web-2", "cores": 4, "ram": 4096}
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let tester = configured(&mock).await;
    let state = tester
        .read_data_source(
            "ionoscloud_server",
            json!({"datacenter_id": "dc-1", "id": "srv-2"}),
        )
        .await
        .unwrap();

    assert_eq!(state["name"], "web-2");
}

#[tokio::test]
async fn lookup_by_unknown_id_fails_with_criteria() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cloudapi/v6/datacenters/dc-1/servers/srv-404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock)
        .await;

    let tester = configured(&mock).await;
    let err = tester
        .read_data_source(
            "ionoscloud_server",
            json!({"datacenter_id": "dc-1", "id": "srv-404"}),
        )
        .await
        .unwrap_err();

    assert!(err
        .to_string()
        .contains("no server found with the specified criteria: id = 'srv-404'"));
}

#[tokio::test]
async fn dns_zone_lookup_by_name_includes_nameservers() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dns/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "zone-1",
                "metadata": {
                    "state": "AVAILABLE",
                    "nameservers": ["ns1.example.com", "ns2.example.com"]
                },
                "properties": {"zoneName": "example.com", "enabled": true}
            }]
        })))
        .mount(&mock)
        .await;

    let tester = configured(&mock).await;
    let state = tester
        .read_data_source("ionoscloud_dns_zone", json!({"name": "example.com"}))
        .await
        .unwrap();

    assert_eq!(state["id"], "zone-1");
    assert_eq!(
        state["nameservers"],
        json!(["ns1.example.com", "ns2.example.com"])
    );
}
