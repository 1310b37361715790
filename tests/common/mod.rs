#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use admin_console::config::GatewayConfig;
use admin_console::gateway::HttpGateway;
use admin_console::resource::catalog;
use anyhow::{Context, Result};
use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Map, Value};

/// What the mock saw for one write request
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub endpoint: String,
    pub multipart: bool,
    pub fields: Map<String, Value>,
    /// (multipart field, file name, byte length)
    pub file: Option<(String, String, usize)>,
}

#[derive(Default)]
pub struct MockState {
    pub tables: HashMap<String, Vec<Map<String, Value>>>,
    pub requests: Vec<Recorded>,
    next_id: i64,
}

pub type Shared = Arc<Mutex<MockState>>;

/// In-process stand-in for the PHP API, served on a free local port
pub struct MockApi {
    pub port: u16,
    pub base_url: String,
    pub state: Shared,
}

impl MockApi {
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let state: Shared = Arc::new(Mutex::new(MockState {
            next_id: 100,
            ..Default::default()
        }));

        let app = Router::new()
            .route("/api/:endpoint", get(read).post(write).delete(remove))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            port,
            base_url: format!("http://127.0.0.1:{}/api", port),
            state,
        })
    }

    pub fn gateway(&self) -> HttpGateway {
        HttpGateway::new(&GatewayConfig {
            base_url: self.base_url.clone(),
            timeout_secs: 5,
            enable_request_logging: true,
        })
        .expect("valid mock base url")
    }

    pub fn seed(&self, endpoint: &str, rows: Value) {
        let rows = rows
            .as_array()
            .expect("seed rows must be an array")
            .iter()
            .filter_map(|r| r.as_object().cloned())
            .collect();
        self.state.lock().unwrap().tables.insert(endpoint.to_string(), rows);
    }

    pub fn rows(&self, endpoint: &str) -> Vec<Map<String, Value>> {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(endpoint)
            .cloned()
            .unwrap_or_default()
    }

    pub fn last_request(&self) -> Recorded {
        self.state
            .lock()
            .unwrap()
            .requests
            .last()
            .cloned()
            .expect("no write request recorded")
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}

/// Mirrors the response shapes of the live endpoints: a bare list, a
/// `data` envelope or a collection named after the entity.
async fn read(
    State(state): State<Shared>,
    Path(endpoint): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let Some(descriptor) = catalog::find(&endpoint) else {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "Unknown endpoint"}))).into_response();
    };

    let state = state.lock().unwrap();
    let mut rows: Vec<Value> = state
        .tables
        .get(&endpoint)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(Value::Object)
        .collect();

    if let Some((param, wanted)) = descriptor
        .scope_param
        .and_then(|param| query.get(param).map(|v| (param, v)))
    {
        rows.retain(|row| text(row.get(param)) == *wanted);
    }

    match endpoint.as_str() {
        "employee.php" => Json(Value::Array(rows)).into_response(),
        "about_items.php" | "about_content.php" => Json(json!({ "data": rows })).into_response(),
        _ => Json(json!({ descriptor.plural: rows })).into_response(),
    }
}

async fn write(State(state): State<Shared>, Path(endpoint): Path<String>, request: Request) -> Response {
    let multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let mut fields = Map::new();
    let mut file = None;

    if multipart {
        let mut form = match Multipart::from_request(request, &()).await {
            Ok(form) => form,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        };
        while let Ok(Some(field)) = form.next_field().await {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await.unwrap_or_default();
                    file = Some((name, file_name, bytes.len()));
                }
                None => {
                    let value = field.text().await.unwrap_or_default();
                    fields.insert(name, Value::String(value));
                }
            }
        }
    } else {
        match Json::<Value>::from_request(request, &()).await {
            Ok(Json(Value::Object(body))) => fields = body,
            Ok(_) => return (StatusCode::BAD_REQUEST, Json(json!({"error": "Expected object"}))).into_response(),
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        }
    }

    let mut state = state.lock().unwrap();
    let is_update = fields.get("_method").and_then(Value::as_str) == Some("PUT");
    state.requests.push(Recorded {
        method: if is_update { "PUT".into() } else { "POST".into() },
        endpoint: endpoint.clone(),
        multipart,
        fields: fields.clone(),
        file: file.clone(),
    });

    if fields.values().any(|v| v.as_str() == Some("reject")) {
        return Json(json!({"success": false, "error": "Duplicate entry"})).into_response();
    }

    fields.remove("_method");
    if let Some((_, file_name, _)) = &file {
        let stored = catalog::find(&endpoint)
            .and_then(|d| d.attachment)
            .map(|a| a.stored_field)
            .unwrap_or("file_path");
        fields.insert(stored.to_string(), json!(format!("uploads/{}", file_name)));
    }
    if let Some(existing) = fields.remove("existing_file") {
        fields.entry("file_path").or_insert(existing);
    }

    if is_update {
        let id = text(fields.get("id"));
        let table = state.tables.entry(endpoint).or_default();
        let Some(row) = table.iter_mut().find(|row| text(row.get("id")) == id) else {
            return (StatusCode::NOT_FOUND, Json(json!({"error": "Record not found"}))).into_response();
        };
        for (key, value) in fields {
            if key != "id" {
                row.insert(key, value);
            }
        }
        Json(json!({"success": true, "message": "Updated successfully"})).into_response()
    } else {
        state.next_id += 1;
        let id = state.next_id;
        fields.insert("id".into(), json!(id));
        state.tables.entry(endpoint).or_default().push(fields);
        Json(json!({"success": true, "id": id})).into_response()
    }
}

async fn remove(
    State(state): State<Shared>,
    Path(endpoint): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let Some(id) = query.get("id") else {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Missing id"}))).into_response();
    };
    let mut state = state.lock().unwrap();
    let table = state.tables.entry(endpoint).or_default();
    let before = table.len();
    table.retain(|row| text(row.get("id")) != *id);
    if table.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "Record not found"}))).into_response();
    }
    Json(json!({"success": true})).into_response()
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
