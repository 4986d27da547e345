use search_publish_core::connection::{connect, DEFAULT_PORT};
use search_publish_core::contract::{MockClusterConnector, MockSearchCluster, SearchCluster};
use search_publish_core::credentials::{resolve, Credentials};
use search_publish_core::error::{CredentialError, CredentialField};
use search_publish_core::TransportError;

fn persisted() -> Credentials {
    Credentials::new("h1", Some(9200), "k1", "s1")
}

#[test]
fn test_resolve_merges_field_by_field() {
    let persisted = persisted();
    let over = Credentials::new("", None, "k2", "");

    let merged = resolve(&persisted, Some(&over));

    assert_eq!(merged, Credentials::new("h1", Some(9200), "k2", "s1"));
}

#[test]
fn test_resolve_leaves_inputs_untouched() {
    let persisted = persisted();
    let over = Credentials::new("h2", Some(443), "k2", "s2");

    let merged = resolve(&persisted, Some(&over));

    assert_eq!(merged, over);
    assert_eq!(persisted, Credentials::new("h1", Some(9200), "k1", "s1"));
    assert_eq!(over, Credentials::new("h2", Some(443), "k2", "s2"));
}

#[test]
fn test_resolve_never_takes_empty_override_fields() {
    let persisted = persisted();
    let cases = [
        Credentials::default(),
        Credentials::new("", Some(1), "", ""),
        Credentials::new("h2", None, "", ""),
        Credentials::new("", None, "", "s2"),
    ];

    for over in cases {
        let merged = resolve(&persisted, Some(&over));
        let pick = |o: &str, p: &str| if o.is_empty() { p.to_string() } else { o.to_string() };
        assert_eq!(merged.host, pick(&over.host, &persisted.host));
        assert_eq!(merged.access_key, pick(&over.access_key, &persisted.access_key));
        assert_eq!(merged.access_secret, pick(&over.access_secret, &persisted.access_secret));
        assert_eq!(merged.port, over.port.or(persisted.port));
    }
}

#[test]
fn test_resolve_without_override_is_an_equal_copy() {
    let persisted = persisted();
    assert_eq!(resolve(&persisted, None), persisted);
}

#[test]
fn test_connect_rejects_each_missing_field_without_calling_the_connector() {
    let connector = MockClusterConnector::new();
    let cases = [
        (Credentials::new("", None, "k", "s"), CredentialField::Host),
        (Credentials::new("h", None, "", "s"), CredentialField::AccessKey),
        (Credentials::new("h", None, "k", ""), CredentialField::AccessSecret),
    ];

    for (creds, field) in cases {
        match connect(&connector, &creds) {
            Err(CredentialError::Missing(missing)) => assert_eq!(missing, field),
            other => panic!("Expected missing {field}, got {other:?}"),
        }
    }
}

#[test]
fn test_connect_leaves_a_missing_port_to_the_transport() {
    let mut connector = MockClusterConnector::new();
    connector
        .expect_connect()
        .withf(|creds| creds.host == "search.example.com:9243" && creds.port.is_none())
        .times(1)
        .return_once(|_| Ok(Box::new(MockSearchCluster::new()) as Box<dyn SearchCluster>));

    let conn = connect(&connector, &Credentials::new("search.example.com:9243", None, "k", "s"))
        .expect("Connection should open");
    assert_eq!(conn.port(), None);
    assert_eq!(conn.address(), "search.example.com:9243");
}

#[test]
fn test_connect_keeps_a_supplied_port() {
    let mut connector = MockClusterConnector::new();
    connector
        .expect_connect()
        .withf(|creds| creds.port == Some(DEFAULT_PORT))
        .times(1)
        .return_once(|_| Ok(Box::new(MockSearchCluster::new()) as Box<dyn SearchCluster>));

    let conn = connect(&connector, &Credentials::new("h", Some(DEFAULT_PORT), "k", "s"))
        .expect("Connection should open");
    assert_eq!(conn.host(), "h");
    assert_eq!(conn.address(), "h:9200");
}

#[test]
fn test_connect_reports_transport_construction_failure_as_credential_error() {
    let mut connector = MockClusterConnector::new();
    connector
        .expect_connect()
        .return_once(|_| Err(TransportError::new("connect", "invalid host")));

    let err = connect(&connector, &persisted()).expect_err("Transport construction fails");
    assert!(matches!(err, CredentialError::Transport(_)));
}

#[tokio::test]
async fn test_disconnect_closes_the_transport_once() {
    let mut cluster = MockSearchCluster::new();
    cluster.expect_close().times(1).returning(|| Ok(()));
    let mut connector = MockClusterConnector::new();
    connector
        .expect_connect()
        .return_once(move |_| Ok(Box::new(cluster) as Box<dyn SearchCluster>));

    let conn = connect(&connector, &persisted()).expect("Connection should open");
    conn.disconnect().await.expect("Disconnect should succeed");
}
