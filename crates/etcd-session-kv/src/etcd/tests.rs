use super::*;
use mockito::{Matcher, Server};

fn client_for(server: &Server) -> EtcdClient {
    EtcdClient::new(EtcdClientConfig::new(server.url())).unwrap()
}

#[test]
fn test_rejects_invalid_endpoint() {
    let result = EtcdClient::new(EtcdClientConfig::new("not a url"));
    assert!(matches!(result, Err(KvError::InvalidEndpoint(_))));
}

#[test]
fn test_key_url_encodes_segments() {
    let client = EtcdClient::new(EtcdClientConfig::new("http://localhost:2379")).unwrap();

    let url = client.key_url("sessions/abc").unwrap();
    assert_eq!(url.as_str(), "http://localhost:2379/v2/keys/sessions/abc");

    let url = client.key_url("sessions/a b").unwrap();
    assert_eq!(url.as_str(), "http://localhost:2379/v2/keys/sessions/a%20b");
}

#[test]
fn test_get_returns_node_value() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/v2/keys/sessions/abc")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"action":"get","node":{"key":"/sessions/abc","value":"eyJ4IjoxfQ==","modifiedIndex":7,"createdIndex":7}}"#,
        )
        .create();

    let node = client_for(&server).get("sessions/abc").unwrap();
    assert_eq!(node.key, "/sessions/abc");
    assert_eq!(node.value.as_deref(), Some("eyJ4IjoxfQ=="));
    assert_eq!(node.modified_index, 7);
    mock.assert();
}

#[test]
fn test_get_missing_key_maps_to_not_found() {
    let mut server = Server::new();
    server
        .mock("GET", "/v2/keys/sessions/missing")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"errorCode":100,"message":"Key not found","cause":"/sessions/missing","index":12}"#)
        .create();

    let err = client_for(&server).get("sessions/missing").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_server_error_maps_to_unsuccessful() {
    let mut server = Server::new();
    server
        .mock("GET", "/v2/keys/sessions/abc")
        .with_status(500)
        .with_body(r#"{"errorCode":300,"message":"Raft Internal Error","index":3}"#)
        .create();

    match client_for(&server).get("sessions/abc") {
        Err(KvError::Unsuccessful { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("Raft Internal Error"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_set_sends_form_value() {
    let mut server = Server::new();
    let mock = server
        .mock("PUT", "/v2/keys/sessions/abc")
        .match_body(Matcher::UrlEncoded("value".into(), "c2Vzc2lvbg==".into()))
        .with_status(201)
        .with_body(r#"{"action":"set","node":{"key":"/sessions/abc","value":"c2Vzc2lvbg==","modifiedIndex":8}}"#)
        .create();

    client_for(&server).set("sessions/abc", "c2Vzc2lvbg==").unwrap();
    mock.assert();
}

#[test]
fn test_delete_dir_recursive_sets_query() {
    let mut server = Server::new();
    let mock = server
        .mock("DELETE", Matcher::Regex(r"^/v2/keys/sessions(\?.*)?$".to_string()))
        .match_query(Matcher::UrlEncoded("recursive".into(), "true".into()))
        .with_status(200)
        .with_body(r#"{"action":"delete","node":{"key":"/sessions","dir":true,"modifiedIndex":9}}"#)
        .create();

    client_for(&server).delete_dir_recursive("sessions").unwrap();
    mock.assert();
}

#[test]
fn test_list_returns_children() {
    let mut server = Server::new();
    server
        .mock("GET", "/v2/keys/sessions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"action":"get","node":{"key":"/sessions","dir":true,"nodes":[
                {"key":"/sessions/a","value":"x","modifiedIndex":2},
                {"key":"/sessions/b","value":"y","modifiedIndex":3}
            ],"modifiedIndex":2}}"#,
        )
        .create();

    let nodes = client_for(&server).list("sessions").unwrap();
    let names: Vec<&str> = nodes.iter().map(KvNode::name).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_unreachable_server_maps_to_unavailable() {
    // Port 9 (discard) is not expected to run an HTTP server locally
    let client = EtcdClient::new(
        EtcdClientConfig::new("http://127.0.0.1:9")
            .with_request_timeout(Duration::from_millis(500)),
    )
    .unwrap();

    let err = client.delete("sessions/abc").unwrap_err();
    assert!(matches!(err, KvError::Unavailable(_)));
}
