//! Domain types for the Guacamole REST API.
//!
//! # Design
//! The server owns the schema of connections, users and connection details,
//! so those stay opaque JSON objects and are handed back untouched. Only the
//! pieces the client reads are typed: the session credentials and the
//! group tree used for flattening.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One connection entry, as returned by the server.
pub type Connection = Map<String, Value>;

/// Mapping of username to user info, in server order.
pub type Users = Map<String, Value>;

/// Detailed parameters of a single connection.
pub type ConnectionDetails = Map<String, Value>;

/// Session credentials returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    pub auth_token: String,
    pub data_source: String,
}

/// A connection group with its direct children.
///
/// Both child lists default to empty when the server omits them, which it
/// does for groups without members.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTree {
    #[serde(default)]
    pub child_connections: Vec<Connection>,
    #[serde(default)]
    pub child_connection_groups: Vec<ChildGroup>,
}

/// A direct subgroup of a `ConnectionTree`. Only its own connections are
/// decoded; anything nested below is skipped unread.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildGroup {
    #[serde(default)]
    pub child_connections: Vec<Connection>,
}

impl ConnectionTree {
    /// Connections of this group followed by those of each direct child
    /// group. Deeper descendants are not visited.
    pub fn flatten_one_level(self) -> Vec<Connection> {
        let mut all = self.child_connections;
        for group in self.child_connection_groups {
            all.extend(group.child_connections);
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn auth_token_uses_camel_case_keys() {
        let token = AuthToken {
            auth_token: "T".to_string(),
            data_source: "postgresql".to_string(),
        };
        let value = serde_json::to_value(&token).unwrap();
        assert_eq!(value, json!({"authToken": "T", "dataSource": "postgresql"}));
    }

    #[test]
    fn flatten_skips_grandchildren() {
        let tree: ConnectionTree = serde_json::from_value(json!({
            "childConnections": [{"name": "a"}],
            "childConnectionGroups": [{
                "childConnections": [{"name": "b"}],
                "childConnectionGroups": [{"childConnections": [{"name": "deep"}]}]
            }]
        }))
        .unwrap();
        let names: Vec<_> = tree
            .flatten_one_level()
            .into_iter()
            .map(|c| c["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn malformed_grandchildren_are_ignored() {
        let tree: ConnectionTree = serde_json::from_str(
            r#"{"childConnections":[{"name":"a"}],"childConnectionGroups":[{"childConnections":[{"name":"b"}],"childConnectionGroups":[{"childConnections":null},{"childConnections":["not-an-object"]},7]}]}"#,
        )
        .unwrap();
        let names: Vec<_> = tree
            .flatten_one_level()
            .into_iter()
            .map(|c| c["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn tree_without_children_is_empty() {
        let tree: ConnectionTree =
            serde_json::from_value(json!({"name": "ROOT", "identifier": "ROOT"})).unwrap();
        assert!(tree.flatten_one_level().is_empty());
    }

    #[test]
    fn connection_fields_pass_through_in_order() {
        let tree: ConnectionTree = serde_json::from_str(
            r#"{"childConnections":[{"protocol":"rdp","name":"x","identifier":"7"}]}"#,
        )
        .unwrap();
        let conn = &tree.flatten_one_level()[0];
        let keys: Vec<_> = conn.keys().map(String::as_str).collect();
        assert_eq!(keys, ["protocol", "name", "identifier"]);
    }
}
