//! Stateless HTTP request builder and response parser for the Guacamole API.
//!
//! # Design
//! `GuacamoleClient` holds only the base URL and the TLS-verification flag.
//! Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes the matching
//! `HttpResponse`. Parse methods take the request URL so every error can name
//! it. For callers that own a `Transport`, the one-shot methods (`get_token`,
//! `list_connections`, ...) run build, execute and parse in one call.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::endpoint::{self, Endpoint, ROOT_GROUP};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::types::{AuthToken, Connection, ConnectionDetails, ConnectionTree, Users};

/// Synchronous, stateless client for the Guacamole REST API.
#[derive(Debug, Clone)]
pub struct GuacamoleClient {
    base_url: String,
    validate_certs: bool,
}

impl GuacamoleClient {
    /// Client for `base_url` with certificate validation enabled.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            validate_certs: true,
        }
    }

    pub fn with_validate_certs(mut self, validate_certs: bool) -> Self {
        self.validate_certs = validate_certs;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn validate_certs(&self) -> bool {
        self.validate_certs
    }

    fn get(&self, url: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: Vec::new(),
            body: None,
            validate_certs: self.validate_certs,
        }
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_get_token(&self, username: &str, password: &str) -> Result<HttpRequest, ApiError> {
        let url = endpoint::token_url(&self.base_url);
        let body = serde_urlencoded::to_string(&[("username", username), ("password", password)])
            .map_err(|e| ApiError::request(Endpoint::Token, &url, e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url,
            headers: vec![(
                "content-type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            )],
            body: Some(body),
            validate_certs: self.validate_certs,
        })
    }

    /// `group` defaults to the root group when `None`.
    pub fn build_list_connections(
        &self,
        datasource: &str,
        group: Option<&str>,
        token: &str,
    ) -> HttpRequest {
        let group = group.unwrap_or(ROOT_GROUP);
        self.get(endpoint::connection_tree_url(&self.base_url, datasource, group, token))
    }

    pub fn build_list_connection_groups(&self, datasource: &str, token: &str) -> HttpRequest {
        self.get(endpoint::connection_groups_url(&self.base_url, datasource, token))
    }

    pub fn build_list_users(&self, datasource: &str, token: &str) -> HttpRequest {
        self.get(endpoint::users_url(&self.base_url, datasource, token))
    }

    pub fn build_connection_details(
        &self,
        datasource: &str,
        connection_id: &str,
        token: &str,
    ) -> HttpRequest {
        self.get(endpoint::connection_details_url(
            &self.base_url,
            datasource,
            connection_id,
            token,
        ))
    }

    // -----------------------------------------------------------------------
    // Response parsers
    // -----------------------------------------------------------------------

    pub fn parse_get_token(&self, url: &str, response: HttpResponse) -> Result<AuthToken, ApiError> {
        let body: Value = decode(Endpoint::Token, url, response)?;
        let field = |name: &str| {
            body.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    ApiError::request(Endpoint::Token, url, format!("response has no `{name}`"))
                })
        };
        Ok(AuthToken {
            auth_token: field("authToken")?,
            data_source: field("dataSource")?,
        })
    }

    pub fn parse_list_connections(
        &self,
        url: &str,
        response: HttpResponse,
    ) -> Result<Vec<Connection>, ApiError> {
        let tree: ConnectionTree = decode(Endpoint::ConnectionTree, url, response)?;
        Ok(tree.flatten_one_level())
    }

    /// Find the identifier of the group called `name`.
    ///
    /// With duplicate names the last group in server order wins.
    pub fn parse_connection_group_id(
        &self,
        url: &str,
        response: HttpResponse,
        name: &str,
    ) -> Result<String, ApiError> {
        let groups: Map<String, Value> = decode(Endpoint::ConnectionGroups, url, response)?;

        let mut found = None;
        for info in groups.values() {
            if info.get("name").and_then(Value::as_str) == Some(name) {
                found = Some(info.get("identifier"));
            }
        }

        match found {
            None => Err(ApiError::GroupNotFound {
                name: name.to_string(),
                url: url.to_string(),
            }),
            Some(identifier) => identifier.and_then(identifier_string).ok_or_else(|| {
                ApiError::request(
                    Endpoint::ConnectionGroups,
                    url,
                    format!("connection group {name} has no usable identifier"),
                )
            }),
        }
    }

    pub fn parse_list_users(&self, url: &str, response: HttpResponse) -> Result<Users, ApiError> {
        decode(Endpoint::Users, url, response)
    }

    pub fn parse_connection_details(
        &self,
        url: &str,
        response: HttpResponse,
    ) -> Result<ConnectionDetails, ApiError> {
        decode(Endpoint::ConnectionDetails, url, response)
    }

    // -----------------------------------------------------------------------
    // One-shot operations over a transport
    // -----------------------------------------------------------------------

    pub fn get_token(
        &self,
        transport: &impl Transport,
        username: &str,
        password: &str,
    ) -> Result<AuthToken, ApiError> {
        debug!(username, "requesting access token");
        let request = self.build_get_token(username, password)?;
        self.round_trip(transport, Endpoint::Token, &request, |response| {
            self.parse_get_token(&request.url, response)
        })
    }

    pub fn list_connections(
        &self,
        transport: &impl Transport,
        datasource: &str,
        group: Option<&str>,
        token: &str,
    ) -> Result<Vec<Connection>, ApiError> {
        debug!(datasource, group = group.unwrap_or(ROOT_GROUP), "listing connections");
        let request = self.build_list_connections(datasource, group, token);
        self.round_trip(transport, Endpoint::ConnectionTree, &request, |response| {
            self.parse_list_connections(&request.url, response)
        })
    }

    pub fn connection_group_id(
        &self,
        transport: &impl Transport,
        datasource: &str,
        name: &str,
        token: &str,
    ) -> Result<String, ApiError> {
        debug!(datasource, name, "resolving connection group");
        let request = self.build_list_connection_groups(datasource, token);
        self.round_trip(transport, Endpoint::ConnectionGroups, &request, |response| {
            self.parse_connection_group_id(&request.url, response, name)
        })
    }

    /// Like `connection_group_id`, but the root group resolves to itself
    /// without a request.
    pub fn resolve_group(
        &self,
        transport: &impl Transport,
        datasource: &str,
        name: &str,
        token: &str,
    ) -> Result<String, ApiError> {
        if name == ROOT_GROUP {
            return Ok(ROOT_GROUP.to_string());
        }
        self.connection_group_id(transport, datasource, name, token)
    }

    pub fn list_connections_in_group_named(
        &self,
        transport: &impl Transport,
        datasource: &str,
        name: &str,
        token: &str,
    ) -> Result<Vec<Connection>, ApiError> {
        let group = self.resolve_group(transport, datasource, name, token)?;
        self.list_connections(transport, datasource, Some(group.as_str()), token)
    }

    pub fn list_users(
        &self,
        transport: &impl Transport,
        datasource: &str,
        token: &str,
    ) -> Result<Users, ApiError> {
        debug!(datasource, "listing users");
        let request = self.build_list_users(datasource, token);
        self.round_trip(transport, Endpoint::Users, &request, |response| {
            self.parse_list_users(&request.url, response)
        })
    }

    pub fn connection_details(
        &self,
        transport: &impl Transport,
        datasource: &str,
        connection_id: &str,
        token: &str,
    ) -> Result<ConnectionDetails, ApiError> {
        debug!(datasource, connection_id, "fetching connection details");
        let request = self.build_connection_details(datasource, connection_id, token);
        self.round_trip(transport, Endpoint::ConnectionDetails, &request, |response| {
            self.parse_connection_details(&request.url, response)
        })
    }

    fn round_trip<T>(
        &self,
        transport: &impl Transport,
        endpoint: Endpoint,
        request: &HttpRequest,
        parse: impl FnOnce(HttpResponse) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let result = transport
            .execute(request)
            .map_err(|e| ApiError::request(endpoint, &request.url, e.to_string()))
            .and_then(parse);
        if let Err(err) = &result {
            // The URL carries the session token, so only the cause is logged.
            warn!(%endpoint, cause = %err.cause(), "request failed");
        }
        result
    }
}

/// Check the status, then decode the body as JSON.
fn decode<T: DeserializeOwned>(
    endpoint: Endpoint,
    url: &str,
    response: HttpResponse,
) -> Result<T, ApiError> {
    if !response.is_success() {
        return Err(ApiError::status(endpoint, url, response.status, &response.body));
    }
    serde_json::from_str(&response.body).map_err(|source| ApiError::InvalidJson {
        endpoint,
        url: url.to_string(),
        source,
    })
}

fn identifier_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
