//! The five REST endpoints this crate talks to.

use std::fmt;

/// Identifier of the implicit top-level connection group.
pub const ROOT_GROUP: &str = "ROOT";

/// One Guacamole REST endpoint.
///
/// `Display` renders the action phrase used in error messages, e.g.
/// "obtain list of connections".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Token,
    ConnectionTree,
    ConnectionGroups,
    Users,
    ConnectionDetails,
}

impl Endpoint {
    fn action(self) -> &'static str {
        match self {
            Endpoint::Token => "obtain access token",
            Endpoint::ConnectionTree => "obtain list of connections",
            Endpoint::ConnectionGroups => "obtain list of connection groups",
            Endpoint::Users => "obtain list of users",
            Endpoint::ConnectionDetails => "obtain connection details",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

pub(crate) fn token_url(base: &str) -> String {
    format!("{base}/api/tokens")
}

pub(crate) fn connection_tree_url(base: &str, datasource: &str, group: &str, token: &str) -> String {
    format!("{base}/api/session/data/{datasource}/connectionGroups/{group}/tree?token={token}")
}

pub(crate) fn connection_groups_url(base: &str, datasource: &str, token: &str) -> String {
    format!("{base}/api/session/data/{datasource}/connectionGroups/?token={token}")
}

pub(crate) fn users_url(base: &str, datasource: &str, token: &str) -> String {
    format!("{base}/api/session/data/{datasource}/users?token={token}")
}

pub(crate) fn connection_details_url(
    base: &str,
    datasource: &str,
    connection_id: &str,
    token: &str,
) -> String {
    format!("{base}/api/session/data/{datasource}/connections/{connection_id}/parameters?token={token}")
}
