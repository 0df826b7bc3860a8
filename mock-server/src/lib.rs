use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const ADMIN_USERNAME: &str = "guacadmin";
pub const ADMIN_PASSWORD: &str = "guacadmin";
pub const DATA_SOURCE: &str = "postgresql";

#[derive(Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// Seeded server contents. Object key order is what clients observe.
pub struct Fixture {
    pub tree: Value,
    pub users: Value,
    pub parameters: Map<String, Value>,
}

impl Default for Fixture {
    fn default() -> Self {
        let tree = json!({
            "name": "ROOT",
            "identifier": "ROOT",
            "type": "ORGANIZATIONAL",
            "childConnections": [
                {"name": "bastion", "identifier": "1", "parentIdentifier": "ROOT", "protocol": "ssh"},
                {"name": "desktop", "identifier": "2", "parentIdentifier": "ROOT", "protocol": "rdp"}
            ],
            "childConnectionGroups": [
                {
                    "name": "Lab",
                    "identifier": "42",
                    "parentIdentifier": "ROOT",
                    "type": "ORGANIZATIONAL",
                    "childConnections": [
                        {"name": "lab-vnc", "identifier": "3", "parentIdentifier": "42", "protocol": "vnc"}
                    ],
                    "childConnectionGroups": [
                        {
                            "name": "Deep",
                            "identifier": "43",
                            "parentIdentifier": "42",
                            "type": "ORGANIZATIONAL",
                            "childConnections": [
                                {"name": "deep-ssh", "identifier": "4", "parentIdentifier": "43", "protocol": "ssh"}
                            ]
                        }
                    ]
                },
                {
                    "name": "Empty",
                    "identifier": "44",
                    "parentIdentifier": "ROOT",
                    "type": "ORGANIZATIONAL"
                }
            ]
        });

        let users = json!({
            "guacadmin": {"username": "guacadmin", "attributes": {"disabled": null}},
            "alice": {"username": "alice", "attributes": {"disabled": null}},
            "bob": {"username": "bob", "attributes": {"disabled": "true"}}
        });

        let mut parameters = Map::new();
        parameters.insert("1".into(), json!({"hostname": "bastion.internal", "port": "22"}));
        parameters.insert(
            "2".into(),
            json!({"hostname": "desktop.internal", "port": "3389", "security": "nla"}),
        );
        parameters.insert("3".into(), json!({"hostname": "lab.internal", "port": "5901"}));
        parameters.insert("4".into(), json!({"hostname": "deep.internal", "port": "22"}));

        Self {
            tree,
            users,
            parameters,
        }
    }
}

impl Fixture {
    /// The group with `identifier` and everything below it.
    fn subtree(&self, identifier: &str) -> Option<&Value> {
        find_group(&self.tree, identifier)
    }

    /// Every group keyed by identifier, without children, in tree order.
    fn groups(&self) -> Map<String, Value> {
        let mut groups = Map::new();
        collect_groups(&self.tree, &mut groups);
        groups
    }
}

fn find_group<'a>(group: &'a Value, identifier: &str) -> Option<&'a Value> {
    if group["identifier"] == identifier {
        return Some(group);
    }
    group["childConnectionGroups"]
        .as_array()?
        .iter()
        .find_map(|child| find_group(child, identifier))
}

fn collect_groups(group: &Value, out: &mut Map<String, Value>) {
    let mut summary = group.clone();
    if let Some(fields) = summary.as_object_mut() {
        fields.remove("childConnections");
        fields.remove("childConnectionGroups");
    }
    if let Some(id) = group["identifier"].as_str() {
        out.insert(id.to_string(), summary);
    }
    for child in group["childConnectionGroups"].as_array().into_iter().flatten() {
        collect_groups(child, out);
    }
}

pub struct Server {
    pub fixture: Fixture,
    sessions: RwLock<HashSet<String>>,
}

pub type Db = Arc<Server>;

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

pub fn app() -> Router {
    app_with(Fixture::default())
}

pub fn app_with(fixture: Fixture) -> Router {
    let db: Db = Arc::new(Server {
        fixture,
        sessions: RwLock::new(HashSet::new()),
    });
    Router::new()
        .route("/api/tokens", post(create_token))
        .route(
            "/api/session/data/{data_source}/connectionGroups/",
            get(list_connection_groups),
        )
        .route(
            "/api/session/data/{data_source}/connectionGroups/{group}/tree",
            get(connection_tree),
        )
        .route("/api/session/data/{data_source}/users", get(list_users))
        .route(
            "/api/session/data/{data_source}/connections/{id}/parameters",
            get(connection_parameters),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error(status: StatusCode, kind: &str, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({"message": message, "type": kind})))
}

/// Reject unknown tokens and data sources the way the real server does.
async fn authorize(
    db: &Server,
    data_source: &str,
    query: &TokenQuery,
) -> Result<(), (StatusCode, Json<Value>)> {
    let known = match &query.token {
        Some(token) => db.sessions.read().await.contains(token),
        None => false,
    };
    if !known {
        return Err(error(StatusCode::FORBIDDEN, "PERMISSION_DENIED", "Permission Denied."));
    }
    if data_source != DATA_SOURCE {
        return Err(error(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            &format!("No such data source: \"{data_source}\""),
        ));
    }
    Ok(())
}

async fn create_token(State(db): State<Db>, Form(input): Form<TokenRequest>) -> ApiResult {
    if input.username != ADMIN_USERNAME || input.password != ADMIN_PASSWORD {
        debug!(username = %input.username, "rejected credentials");
        return Err(error(StatusCode::FORBIDDEN, "INVALID_CREDENTIALS", "Invalid login."));
    }
    let token = Uuid::new_v4().simple().to_string().to_uppercase();
    db.sessions.write().await.insert(token.clone());
    info!(username = %input.username, "issued token");
    Ok(Json(json!({
        "authToken": token,
        "username": input.username,
        "dataSource": DATA_SOURCE,
        "availableDataSources": [DATA_SOURCE]
    })))
}

async fn connection_tree(
    State(db): State<Db>,
    Path((data_source, group)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> ApiResult {
    authorize(&db, &data_source, &query).await?;
    db.fixture
        .subtree(&group)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            error(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("No such connection group: \"{group}\""),
            )
        })
}

async fn list_connection_groups(
    State(db): State<Db>,
    Path(data_source): Path<String>,
    Query(query): Query<TokenQuery>,
) -> ApiResult {
    authorize(&db, &data_source, &query).await?;
    Ok(Json(Value::Object(db.fixture.groups())))
}

async fn list_users(
    State(db): State<Db>,
    Path(data_source): Path<String>,
    Query(query): Query<TokenQuery>,
) -> ApiResult {
    authorize(&db, &data_source, &query).await?;
    Ok(Json(db.fixture.users.clone()))
}

async fn connection_parameters(
    State(db): State<Db>,
    Path((data_source, id)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> ApiResult {
    authorize(&db, &data_source, &query).await?;
    db.fixture
        .parameters
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            error(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("No such connection: \"{id}\""),
            )
        })
}
