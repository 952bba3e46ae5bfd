use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{Path, Query, RawQuery, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use backoffice_core::is_valid_tax_id;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    Active,
    Inactive,
}

impl ClientStatus {
    fn as_str(self) -> &'static str {
        match self {
            ClientStatus::Active => "active",
            ClientStatus::Inactive => "inactive",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub company_name: String,
    pub cnpj: Option<String>,
    pub status: ClientStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClient {
    #[serde(default)]
    pub company_name: String,
    pub cnpj: Option<String>,
    pub status: Option<ClientStatus>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClient {
    pub company_name: Option<String>,
    pub cnpj: Option<String>,
    pub status: Option<ClientStatus>,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Client>>>;

pub const INVALID_CNPJ_MESSAGE: &str = "CNPJ inválido";

pub const REPORT_CSV: &str = "client,total\nAcme,1500.00\nGlobex,320.50\n";

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route("/reports/summary.csv", get(summary_report))
        .route("/files/{name}", get(download_file))
        .route("/health", get(health))
        .route("/unstable", get(unstable))
        .route("/slow", get(slow))
        .route("/echo", any(echo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "Cliente não encontrado"})),
    )
        .into_response()
}

async fn list_clients(
    State(db): State<Db>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<Vec<Client>> {
    let search = params
        .iter()
        .find(|(k, _)| k == "search")
        .map(|(_, v)| v.to_lowercase());
    let statuses: Vec<&str> = params
        .iter()
        .filter(|(k, _)| k == "status")
        .map(|(_, v)| v.as_str())
        .collect();

    let clients = db.read().await;
    let mut matching: Vec<Client> = clients
        .values()
        .filter(|c| {
            search
                .as_deref()
                .map_or(true, |s| c.company_name.to_lowercase().contains(s))
        })
        .filter(|c| statuses.is_empty() || statuses.contains(&c.status.as_str()))
        .cloned()
        .collect();
    matching.sort_by(|a, b| a.company_name.cmp(&b.company_name));
    Json(matching)
}

fn unprocessable(message: &str, field: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"message": message, "field": field})),
    )
        .into_response()
}

/// 422 response for a CNPJ that fails the check-digit validation.
fn invalid_cnpj(cnpj: Option<&str>) -> Option<Response> {
    cnpj.filter(|cnpj| !is_valid_tax_id(cnpj))
        .map(|_| unprocessable(INVALID_CNPJ_MESSAGE, "cnpj"))
}

async fn create_client(State(db): State<Db>, Json(input): Json<CreateClient>) -> Response {
    if input.company_name.trim().is_empty() {
        return unprocessable("Campo obrigatório", "companyName");
    }
    if let Some(rejection) = invalid_cnpj(input.cnpj.as_deref()) {
        return rejection;
    }
    let client = Client {
        id: Uuid::new_v4(),
        company_name: input.company_name,
        cnpj: input.cnpj,
        status: input.status.unwrap_or(ClientStatus::Active),
    };
    db.write().await.insert(client.id, client.clone());
    tracing::info!(id = %client.id, "client created");
    (StatusCode::CREATED, Json(client)).into_response()
}

async fn get_client(State(db): State<Db>, Path(id): Path<Uuid>) -> Response {
    match db.read().await.get(&id) {
        Some(client) => Json(client.clone()).into_response(),
        None => not_found(),
    }
}

async fn update_client(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateClient>,
) -> Response {
    if let Some(rejection) = invalid_cnpj(input.cnpj.as_deref()) {
        return rejection;
    }
    let mut clients = db.write().await;
    let Some(client) = clients.get_mut(&id) else {
        return not_found();
    };
    if let Some(company_name) = input.company_name {
        client.company_name = company_name;
    }
    if let Some(cnpj) = input.cnpj {
        client.cnpj = Some(cnpj);
    }
    if let Some(status) = input.status {
        client.status = status;
    }
    Json(client.clone()).into_response()
}

async fn delete_client(State(db): State<Db>, Path(id): Path<Uuid>) -> Response {
    match db.write().await.remove(&id) {
        Some(_) => {
            tracing::info!(%id, "client deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found(),
    }
}

async fn summary_report() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], REPORT_CSV)
}

/// Deterministic binary payload: the name's bytes followed by 0x00..=0xff.
pub fn file_bytes(name: &str) -> Vec<u8> {
    let mut bytes = name.as_bytes().to_vec();
    bytes.extend(0u8..=255);
    bytes
}

async fn download_file(Path(name): Path<String>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        file_bytes(&name),
    )
}

async fn health() -> &'static str {
    "ok"
}

async fn unstable() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

#[derive(Deserialize)]
struct SlowParams {
    ms: Option<u64>,
}

async fn slow(Query(params): Query<SlowParams>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(params.ms.unwrap_or(2_000))).await;
    Json(json!({"slow": true}))
}

/// Echo the request back as JSON so clients can inspect what they sent.
async fn echo(method: Method, RawQuery(query): RawQuery, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let headers: serde_json::Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            )
        })
        .collect();
    Json(json!({
        "method": method.as_str(),
        "query": query.unwrap_or_default(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
        "bodyLength": body.len(),
    }))
}
