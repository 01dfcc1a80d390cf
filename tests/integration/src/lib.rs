//! In-process stub of the hosted backend
//!
//! Serves just enough of the auth API (`/auth/v1`) and the REST data
//! API (`/rest/v1`) on a random local port for end-to-end tests to run
//! against real HTTP. Rows live in per-table `Vec<Value>`s; issued
//! access tokens are fake JWTs whose payload carries a real expiry so
//! clients can read it back.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Clone)]
pub struct Account {
    pub password: String,
    pub user: Value,
}

#[derive(Default)]
pub struct StubState {
    pub accounts: HashMap<String, Account>,
    /// access token -> email
    pub access_tokens: HashMap<String, String>,
    /// refresh token -> email
    pub refresh_tokens: HashMap<String, String>,
    /// confirmation token -> email, issued on signup
    pub confirmation_tokens: HashMap<String, String>,
    pub tables: HashMap<String, Vec<Value>>,
    /// Tables whose inserts fail with a server error
    pub fail_inserts: HashSet<String>,
    /// Ids removed through the admin endpoint
    pub deleted_identities: Vec<String>,
}

pub type SharedState = Arc<Mutex<StubState>>;

/// Handle to a running stub; the server task stops when this drops.
pub struct StubBackend {
    pub addr: SocketAddr,
    pub state: SharedState,
    task: tokio::task::JoinHandle<()>,
}

impl StubBackend {
    pub async fn spawn() -> Self {
        let state: SharedState = Arc::new(Mutex::new(StubState::default()));

        let app = Router::new()
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/signup", post(signup))
            .route("/auth/v1/verify", post(verify))
            .route("/auth/v1/logout", post(logout))
            .route("/auth/v1/user", get(user))
            .route("/auth/v1/recover", post(ok_empty))
            .route("/auth/v1/resend", post(ok_empty))
            .route("/auth/v1/admin/users/{id}", delete(admin_delete_user))
            .route(
                "/rest/v1/{table}",
                get(rest_select)
                    .post(rest_insert)
                    .patch(rest_update)
                    .delete(rest_delete),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub local addr");

        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server");
        });

        Self { addr, state, task }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().expect("stub state lock poisoned")
    }

    /// Seed an identity account with an empty metadata block.
    pub fn add_account(&self, email: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user: json!({ "id": id, "email": email }),
            },
        );
        id
    }

    /// Make every insert into `table` fail with a server error.
    pub fn fail_inserts_into(&self, table: &str) {
        self.lock().fail_inserts.insert(table.to_string());
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    /// The confirmation token issued to `email` at signup, as the
    /// emailed verification link would carry it.
    pub fn confirmation_token(&self, email: &str) -> String {
        self.lock()
            .confirmation_tokens
            .iter()
            .find(|(_, owner)| owner.as_str() == email)
            .map(|(token, _)| token.clone())
            .expect("no pending confirmation for email")
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn lock(state: &SharedState) -> MutexGuard<'_, StubState> {
    state.lock().expect("stub state lock poisoned")
}

/// Unsigned token whose payload carries a readable expiry claim.
fn fake_jwt(email: &str, expires_at: i64) -> String {
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&json!({ "sub": email, "exp": expires_at })).expect("encode claims"),
    );
    format!("stub.{payload}.sig")
}

fn issue_session(state: &mut StubState, email: &str) -> Value {
    let account = state.accounts.get(email).expect("account exists").clone();
    let expires_at = Utc::now().timestamp() + 3600;
    let access_token = fake_jwt(email, expires_at);
    let refresh_token = format!("refresh-{}", Uuid::new_v4());
    state
        .access_tokens
        .insert(access_token.clone(), email.to_string());
    state
        .refresh_tokens
        .insert(refresh_token.clone(), email.to_string());

    json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
        "expires_in": 3600,
        "expires_at": expires_at,
        "user": account.user,
    })
}

// --- auth endpoints ---

async fn token(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    match params.get("grant_type").map(String::as_str) {
        Some("password") => {
            let email = body["email"].as_str().unwrap_or_default().to_string();
            let password = body["password"].as_str().unwrap_or_default();
            match state.accounts.get(&email) {
                Some(account) if account.password == password => {
                    let session = issue_session(&mut state, &email);
                    Json(session).into_response()
                }
                _ => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error_description": "Invalid login credentials" })),
                )
                    .into_response(),
            }
        }
        Some("refresh_token") => {
            let refresh = body["refresh_token"].as_str().unwrap_or_default();
            match state.refresh_tokens.get(refresh).cloned() {
                Some(email) => {
                    let session = issue_session(&mut state, &email);
                    Json(session).into_response()
                }
                None => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error_description": "session_expired" })),
                )
                    .into_response(),
            }
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error_description": "unsupported grant type" })),
        )
            .into_response(),
    }
}

async fn signup(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();

    if state.accounts.contains_key(&email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "msg": "User already registered" })),
        )
            .into_response();
    }

    let user = json!({
        "id": Uuid::new_v4(),
        "email": email,
        "user_metadata": body.get("data").cloned().unwrap_or(json!({})),
    });
    state.accounts.insert(
        email.clone(),
        Account {
            password,
            user: user.clone(),
        },
    );
    state
        .confirmation_tokens
        .insert(format!("confirm-{}", Uuid::new_v4()), email);

    // Confirmation pending: no token block
    Json(json!({ "user": user })).into_response()
}

async fn verify(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    let token_hash = body["token_hash"].as_str().unwrap_or_default().to_string();

    match state.confirmation_tokens.remove(&token_hash) {
        Some(email) => {
            if let Some(account) = state.accounts.get_mut(&email) {
                account.user["email_confirmed_at"] = json!(Utc::now());
            }
            let session = issue_session(&mut state, &email);
            Json(session).into_response()
        }
        None => (
            StatusCode::FORBIDDEN,
            Json(json!({ "msg": "Token has expired or is invalid" })),
        )
            .into_response(),
    }
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn ok_empty() -> Json<Value> {
    Json(json!({}))
}

async fn user(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let account = bearer
        .and_then(|token| state.access_tokens.get(token))
        .and_then(|email| state.accounts.get(email));

    match account {
        Some(account) => Json(account.user.clone()).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "msg": "invalid token" })),
        )
            .into_response(),
    }
}

async fn admin_delete_user(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Json<Value> {
    let mut state = lock(&state);
    state.deleted_identities.push(id.clone());
    state
        .accounts
        .retain(|_, account| account.user["id"].as_str() != Some(id.as_str()));
    Json(json!({}))
}

// --- REST data endpoints ---

enum Filter {
    Eq(String, String),
    IsNull(String),
}

fn parse_filters(params: &HashMap<String, String>) -> Vec<Filter> {
    let mut filters = Vec::new();
    for (key, value) in params {
        if matches!(key.as_str(), "select" | "order" | "limit" | "offset" | "or") {
            continue;
        }
        if let Some(value) = value.strip_prefix("eq.") {
            filters.push(Filter::Eq(key.clone(), value.to_string()));
        } else if value == "is.null" {
            filters.push(Filter::IsNull(key.clone()));
        }
    }
    filters
}

fn field_as_string(row: &Value, key: &str) -> Option<String> {
    match row.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
}

fn matches(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| match filter {
        Filter::Eq(key, value) => field_as_string(row, key).as_deref() == Some(value.as_str()),
        Filter::IsNull(key) => field_as_string(row, key).is_none(),
    })
}

fn wants_single_object(headers: &HeaderMap) -> bool {
    headers
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("vnd.pgrst.object"))
        .unwrap_or(false)
}

fn no_rows() -> Response {
    (
        StatusCode::NOT_ACCEPTABLE,
        Json(json!({ "code": "PGRST116", "message": "zero rows returned" })),
    )
        .into_response()
}

async fn rest_select(
    State(state): State<SharedState>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let state = lock(&state);
    let filters = parse_filters(&params);
    let mut rows: Vec<Value> = state
        .tables
        .get(&table)
        .map(|rows| rows.iter().filter(|r| matches(r, &filters)).cloned().collect())
        .unwrap_or_default();

    if let Some(offset) = params.get("offset").and_then(|v| v.parse::<usize>().ok()) {
        rows = rows.into_iter().skip(offset).collect();
    }
    if let Some(limit) = params.get("limit").and_then(|v| v.parse::<usize>().ok()) {
        rows.truncate(limit);
    }

    if wants_single_object(&headers) {
        return match rows.into_iter().next() {
            Some(row) => Json(row).into_response(),
            None => no_rows(),
        };
    }
    Json(Value::Array(rows)).into_response()
}

fn duplicate_key(table: &str, row: &Value, existing: &[Value]) -> bool {
    let key: &[&str] = match table {
        "users" => &["id"],
        "enrollments" => &["lesson_id", "student_id"],
        _ => return false,
    };
    existing.iter().any(|other| {
        key.iter()
            .all(|k| field_as_string(other, k) == field_as_string(row, k))
    })
}

async fn rest_insert(
    State(state): State<SharedState>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(mut row): Json<Value>,
) -> Response {
    let mut state = lock(&state);

    if state.fail_inserts.contains(&table) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "insert rejected" })),
        )
            .into_response();
    }

    let existing = state.tables.entry(table.clone()).or_default();
    if duplicate_key(&table, &row, existing) {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "code": "23505", "message": "duplicate key value" })),
        )
            .into_response();
    }

    if row.get("id").is_none() {
        row["id"] = json!(Uuid::new_v4());
    }
    existing.push(row.clone());

    if wants_single_object(&headers) {
        return (StatusCode::CREATED, Json(row)).into_response();
    }
    (StatusCode::CREATED, Json(json!([]))).into_response()
}

async fn rest_update(
    State(state): State<SharedState>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    let filters = parse_filters(&params);
    let mut updated = Vec::new();

    if let Some(rows) = state.tables.get_mut(&table) {
        for row in rows.iter_mut().filter(|r| matches(r, &filters)) {
            if let (Some(row_map), Some(patch_map)) = (row.as_object_mut(), patch.as_object()) {
                for (key, value) in patch_map {
                    row_map.insert(key.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }
    }

    if wants_single_object(&headers) {
        return match updated.into_iter().next() {
            Some(row) => Json(row).into_response(),
            None => no_rows(),
        };
    }
    // Matching zero rows is still a successful update
    Json(Value::Array(updated)).into_response()
}

async fn rest_delete(
    State(state): State<SharedState>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> StatusCode {
    let mut state = lock(&state);
    let filters = parse_filters(&params);
    if let Some(rows) = state.tables.get_mut(&table) {
        rows.retain(|row| !matches(row, &filters));
    }
    StatusCode::NO_CONTENT
}
