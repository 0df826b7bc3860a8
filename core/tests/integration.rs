//! End-to-end test against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every client
//! operation over real HTTP through a ureq-backed `Transport`. Validates that
//! request building and response parsing agree with the server.

use guacamole_core::{
    ApiError, GuacamoleClient, HttpMethod, HttpRequest, HttpResponse, Transport, TransportError,
};
use mock_server::{ADMIN_PASSWORD, ADMIN_USERNAME, DATA_SOURCE};

/// Executes requests with ureq.
///
/// ureq's automatic status-code-as-error behaviour is disabled so 4xx/5xx
/// responses come back as data and the client interprets them.
struct UreqTransport;

impl Transport for UreqTransport {
    fn execute(&self, req: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let tls = ureq::tls::TlsConfig::builder()
            .disable_verification(!req.validate_certs)
            .build();
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .tls_config(tls)
            .build()
            .new_agent();

        let result = match (req.method, &req.body) {
            (HttpMethod::Get, _) => {
                let mut builder = agent.get(&req.url);
                for (key, value) in &req.headers {
                    builder = builder.header(key.as_str(), value.as_str());
                }
                builder.call()
            }
            (HttpMethod::Post, body) => {
                let mut builder = agent.post(&req.url);
                for (key, value) in &req.headers {
                    builder = builder.header(key.as_str(), value.as_str());
                }
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result.map_err(TransportError::new)?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(TransportError::new)?;

        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}

/// Start the mock server on a random port and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}/")
}

fn names(connections: &[guacamole_core::Connection]) -> Vec<String> {
    connections
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn inventory_walkthrough() {
    let client = GuacamoleClient::new(&start_server());
    let transport = UreqTransport;

    // Step 1: authenticate.
    let session = client
        .get_token(&transport, ADMIN_USERNAME, ADMIN_PASSWORD)
        .unwrap();
    assert_eq!(session.data_source, DATA_SOURCE);
    assert_eq!(session.auth_token.len(), 32);
    let ds = session.data_source.as_str();
    let token = session.auth_token.as_str();

    // Step 2: root connections, one level of groups flattened.
    let root = client.list_connections(&transport, ds, None, token).unwrap();
    assert_eq!(names(&root), ["bastion", "desktop", "lab-vnc"]);

    // Step 3: group name to identifier.
    let lab = client.connection_group_id(&transport, ds, "Lab", token).unwrap();
    assert_eq!(lab, "42");

    // Step 4: connections of the Lab group include its direct subgroup.
    let lab_conns = client
        .list_connections(&transport, ds, Some(lab.as_str()), token)
        .unwrap();
    assert_eq!(names(&lab_conns), ["lab-vnc", "deep-ssh"]);

    // Step 5: the same lookup by name in one call.
    let by_name = client
        .list_connections_in_group_named(&transport, ds, "Lab", token)
        .unwrap();
    assert_eq!(by_name, lab_conns);

    // Step 6: an empty group yields no connections.
    let empty = client
        .list_connections_in_group_named(&transport, ds, "Empty", token)
        .unwrap();
    assert!(empty.is_empty());

    // Step 7: users, in server order.
    let users = client.list_users(&transport, ds, token).unwrap();
    let usernames: Vec<_> = users.keys().cloned().collect();
    assert_eq!(usernames, ["guacadmin", "alice", "bob"]);

    // Step 8: connection details.
    let details = client.connection_details(&transport, ds, "2", token).unwrap();
    assert_eq!(details["hostname"], "desktop.internal");
    assert_eq!(details["port"], "3389");
}

#[test]
fn failures_name_the_url() {
    let base = start_server();
    let client = GuacamoleClient::new(&base);
    let transport = UreqTransport;

    // Wrong password: the server answers 403.
    let err = client.get_token(&transport, ADMIN_USERNAME, "wrong").unwrap_err();
    assert!(matches!(err, ApiError::Request { .. }));
    assert!(err.to_string().contains("HTTP 403"));
    assert_eq!(err.url(), format!("{base}api/tokens"));

    let session = client
        .get_token(&transport, ADMIN_USERNAME, ADMIN_PASSWORD)
        .unwrap();
    let ds = session.data_source.as_str();
    let token = session.auth_token.as_str();

    // Unknown group name.
    let err = client
        .connection_group_id(&transport, ds, "Missing", token)
        .unwrap_err();
    assert!(matches!(err, ApiError::GroupNotFound { .. }));
    assert!(err.to_string().contains("Missing"));

    // Stale token.
    let err = client.list_users(&transport, ds, "STALE").unwrap_err();
    assert!(matches!(err, ApiError::Request { .. }));
    assert!(err.to_string().contains("token=STALE"));

    // Unknown connection.
    let err = client
        .connection_details(&transport, ds, "77", token)
        .unwrap_err();
    assert!(err.to_string().contains("HTTP 404"));
}

#[test]
fn unreachable_server_is_a_request_error() {
    // Bind then drop to get a port nobody listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let client = GuacamoleClient::new(&format!("http://{addr}"));

    let err = client.get_token(&UreqTransport, "u", "p").unwrap_err();
    assert!(matches!(err, ApiError::Request { .. }));
    assert!(err
        .to_string()
        .starts_with(&format!("Could not obtain access token from http://{addr}/api/tokens: ")));
}
