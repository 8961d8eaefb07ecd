//! In-process stand-in for the joyeria REST backend.
//!
//! Starts an axum server on a random local port that serves the endpoints
//! the admin client calls, keeps its data in memory, and records what it
//! was asked to do so tests can assert on the wire traffic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use joyeria_client::{ApiError, TokenSource};
use joyeria_types::{Order, OrderStatus, StatusChange, User};
use serde::Deserialize;
use serde_json::json;

type Shared = Arc<Mutex<BackendState>>;

#[derive(Default)]
struct BackendState {
    orders: Vec<Order>,
    users: Vec<User>,
    /// email -> (password, user id)
    credentials: HashMap<String, (String, String)>,
    /// bearer token -> user id
    tokens: HashMap<String, String>,
    status_changes: Vec<(String, StatusChange)>,
    requests: Vec<String>,
    /// ("METHOD /path", query string) for requests that carried one
    queries: Vec<(String, String)>,
    /// (authorized requests to let through first, status)
    fail_next: Option<(usize, u16)>,
    next_id: u64,
}

/// Handle to a running fake backend.
pub struct FakeBackend {
    pub base_url: String,
    state: Shared,
}

impl FakeBackend {
    /// Bind to `127.0.0.1:0` and serve in a background task.
    pub async fn start() -> FakeBackend {
        let state: Shared = Arc::new(Mutex::new(BackendState {
            next_id: 1000,
            ..Default::default()
        }));

        let app = Router::new()
            .route("/usuarios/login", post(login))
            .route("/pedidos", get(list_orders))
            .route("/pedidos/vendedor/{id}", get(vendor_orders))
            .route("/pedidos/{id}/estado", put(set_status))
            .route("/pedidos/{id}/cancelar", put(cancel))
            .route("/pedidos/{id}/reactivar", put(reactivate))
            .route("/pedidos/{id}", delete(delete_order))
            .route("/usuarios", get(list_users).post(create_user))
            .route(
                "/usuarios/{id}",
                get(get_user).put(update_user).delete(delete_user),
            )
            .route("/usuarios/vendedor/{id}/clientes", get(vendor_clients))
            .layer(axum::middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        FakeBackend {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    /// Register a user that can log in with `user.email` / `password`.
    pub fn seed_user(&self, user: User, password: &str) {
        let mut s = self.lock();
        s.credentials
            .insert(user.email.clone(), (password.to_string(), user.id.clone()));
        s.users.push(user);
    }

    pub fn seed_order(&self, order: Order) {
        self.lock().orders.push(order);
    }

    /// Issue a token for `user_id` without going through login.
    pub fn token_for(&self, user_id: &str) -> String {
        let token = format!("tok-{}", user_id);
        self.lock().tokens.insert(token.clone(), user_id.to_string());
        token
    }

    /// Make the next authenticated request fail with `status`.
    pub fn fail_next(&self, status: u16) {
        self.fail_after(0, status);
    }

    /// Let `skip` authenticated requests through, then fail one with `status`.
    pub fn fail_after(&self, skip: usize, status: u16) {
        self.lock().fail_next = Some((skip, status));
    }

    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.clone()
    }

    pub fn users(&self) -> Vec<User> {
        self.lock().users.clone()
    }

    /// Every `PUT /pedidos/{id}/estado` body received, in order.
    pub fn status_changes(&self) -> Vec<(String, StatusChange)> {
        self.lock().status_changes.clone()
    }

    /// `"METHOD /path"` for every request received, in order.
    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    /// Query strings sent with requests equal to `line`, in order.
    pub fn queries(&self, line: &str) -> Vec<String> {
        self.lock()
            .queries
            .iter()
            .filter(|(l, _)| l == line)
            .map(|(_, q)| q.clone())
            .collect()
    }

    /// Number of received requests equal to `line` (e.g. `"GET /pedidos"`).
    pub fn count(&self, line: &str) -> usize {
        self.lock().requests.iter().filter(|r| r.as_str() == line).count()
    }
}

// ── Token sources ───────────────────────────────────────────────────

/// Anonymous requests.
pub struct NoAuth;

#[async_trait::async_trait]
impl TokenSource for NoAuth {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(None)
    }
}

/// A fixed bearer token, e.g. from [`FakeBackend::token_for`].
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(Some(self.0.clone()))
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

pub fn user(id: &str, nombre: &str, rol: &str, vendedor_id: Option<&str>) -> User {
    User {
        id: id.to_string(),
        nombre: nombre.to_string(),
        email: format!("{}@joyeria.test", id),
        rol: rol.to_string(),
        imagen_url: None,
        vendedor_id: vendedor_id.map(str::to_string),
        telefono: None,
    }
}

pub fn order(id: &str, estado: OrderStatus, vendedor_id: &str) -> Order {
    let mut o = Order::new(id, estado);
    o.vendedor_id = Some(vendedor_id.to_string());
    o.modelo = Some(format!("Modelo {}", id));
    o
}

// ── Handlers ────────────────────────────────────────────────────────

async fn record(State(state): State<Shared>, req: Request, next: Next) -> Response {
    let line = format!("{} {}", req.method(), req.uri().path());
    {
        let mut s = state.lock().unwrap();
        if let Some(query) = req.uri().query() {
            s.queries.push((line.clone(), query.to_string()));
        }
        s.requests.push(line);
    }
    next.run(req).await
}

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// Check the bearer token and consume any injected failure.
fn authorize(s: &mut BackendState, headers: &HeaderMap) -> Result<String, Response> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Token requerido"))?;
    let user_id = s
        .tokens
        .get(token)
        .cloned()
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Token inválido"))?;
    match s.fail_next.take() {
        Some((0, code)) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return Err(fail(status, "falla simulada"));
        }
        Some((skip, code)) => s.fail_next = Some((skip - 1, code)),
        None => {}
    }
    Ok(user_id)
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(state): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    let mut s = state.lock().unwrap();
    let user_id = match s.credentials.get(&body.email) {
        Some((password, id)) if *password == body.password => id.clone(),
        _ => return fail(StatusCode::UNAUTHORIZED, "Credenciales inválidas"),
    };
    let Some(user) = s.users.iter().find(|u| u.id == user_id).cloned() else {
        return fail(StatusCode::UNAUTHORIZED, "Credenciales inválidas");
    };
    let token = format!("tok-{}", user_id);
    s.tokens.insert(token.clone(), user_id);
    Json(json!({ "token": token, "usuario": user })).into_response()
}

async fn list_orders(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut s = state.lock().unwrap();
    if let Err(resp) = authorize(&mut s, &headers) {
        return resp;
    }
    let client = query.get("cliente_id");
    let pedidos: Vec<&Order> = s
        .orders
        .iter()
        .filter(|o| client.is_none() || o.cliente_id.as_ref() == client)
        .collect();
    Json(json!({ "pedidos": pedidos })).into_response()
}

async fn vendor_orders(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut s = state.lock().unwrap();
    if let Err(resp) = authorize(&mut s, &headers) {
        return resp;
    }
    let pedidos: Vec<&Order> = s
        .orders
        .iter()
        .filter(|o| o.vendedor_id.as_deref() == Some(id.as_str()))
        .collect();
    Json(pedidos).into_response()
}

fn update_order(
    state: &Shared,
    headers: &HeaderMap,
    id: &str,
    f: impl FnOnce(&mut Order),
) -> Response {
    let mut s = state.lock().unwrap();
    if let Err(resp) = authorize(&mut s, headers) {
        return resp;
    }
    match s.orders.iter_mut().find(|o| o.id == id) {
        Some(order) => {
            f(order);
            Json(json!({ "pedido": order })).into_response()
        }
        None => fail(StatusCode::NOT_FOUND, "Pedido no encontrado"),
    }
}

async fn set_status(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Response {
    let nuevo = change.nuevo_estado;
    let resp = update_order(&state, &headers, &id, |o| o.estado = nuevo);
    if resp.status().is_success() {
        state.lock().unwrap().status_changes.push((id, change));
    }
    resp
}

async fn cancel(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    update_order(&state, &headers, &id, |o| o.cancelado = true)
}

async fn reactivate(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    update_order(&state, &headers, &id, |o| o.cancelado = false)
}

async fn delete_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut s = state.lock().unwrap();
    if let Err(resp) = authorize(&mut s, &headers) {
        return resp;
    }
    let before = s.orders.len();
    s.orders.retain(|o| o.id != id);
    if s.orders.len() == before {
        return fail(StatusCode::NOT_FOUND, "Pedido no encontrado");
    }
    Json(json!({ "message": "Pedido eliminado" })).into_response()
}

async fn list_users(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut s = state.lock().unwrap();
    if let Err(resp) = authorize(&mut s, &headers) {
        return resp;
    }
    let rol = query.get("rol");
    let usuarios: Vec<&User> = s
        .users
        .iter()
        .filter(|u| rol.map_or(true, |r| u.rol == *r))
        .collect();
    Json(json!({ "usuarios": usuarios })).into_response()
}

async fn get_user(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let mut s = state.lock().unwrap();
    if let Err(resp) = authorize(&mut s, &headers) {
        return resp;
    }
    match s.users.iter().find(|u| u.id == id) {
        Some(user) => Json(json!({ "usuario": user })).into_response(),
        None => fail(StatusCode::NOT_FOUND, "Usuario no encontrado"),
    }
}

async fn vendor_clients(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut s = state.lock().unwrap();
    if let Err(resp) = authorize(&mut s, &headers) {
        return resp;
    }
    let clientes: Vec<&User> = s
        .users
        .iter()
        .filter(|u| u.rol == "cliente" && u.vendedor_id.as_deref() == Some(id.as_str()))
        .collect();
    Json(clientes).into_response()
}

/// Text fields plus the attached file name, if any.
async fn read_form(mut multipart: Multipart) -> Result<HashMap<String, String>, Response> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| fail(StatusCode::BAD_REQUEST, &e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name().map(str::to_string) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| fail(StatusCode::BAD_REQUEST, &e.to_string()))?;
            if !bytes.is_empty() {
                fields.insert("imagen_url".to_string(), format!("/uploads/{}", file_name));
            }
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| fail(StatusCode::BAD_REQUEST, &e.to_string()))?;
            fields.insert(name, text);
        }
    }
    Ok(fields)
}

fn apply_form(user: &mut User, fields: &HashMap<String, String>) {
    for (key, value) in fields {
        match key.as_str() {
            "nombre" => user.nombre = value.clone(),
            "email" => user.email = value.clone(),
            "rol" => user.rol = value.clone(),
            "vendedorId" => user.vendedor_id = Some(value.clone()),
            "telefono" => user.telefono = Some(value.clone()),
            "imagen_url" => user.imagen_url = Some(value.clone()),
            _ => {}
        }
    }
}

async fn create_user(State(state): State<Shared>, headers: HeaderMap, multipart: Multipart) -> Response {
    {
        let mut s = state.lock().unwrap();
        if let Err(resp) = authorize(&mut s, &headers) {
            return resp;
        }
    }
    let fields = match read_form(multipart).await {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    if !fields.contains_key("nombre") || !fields.contains_key("email") {
        return fail(StatusCode::BAD_REQUEST, "nombre y email son obligatorios");
    }

    let mut s = state.lock().unwrap();
    s.next_id += 1;
    let mut new_user = user(&s.next_id.to_string(), "", "", None);
    apply_form(&mut new_user, &fields);
    if let Some(password) = fields.get("password") {
        s.credentials
            .insert(new_user.email.clone(), (password.clone(), new_user.id.clone()));
    }
    s.users.push(new_user.clone());
    (StatusCode::CREATED, Json(json!({ "usuario": new_user }))).into_response()
}

async fn update_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    {
        let mut s = state.lock().unwrap();
        if let Err(resp) = authorize(&mut s, &headers) {
            return resp;
        }
    }
    let fields = match read_form(multipart).await {
        Ok(f) => f,
        Err(resp) => return resp,
    };

    let mut s = state.lock().unwrap();
    match s.users.iter_mut().find(|u| u.id == id) {
        Some(existing) => {
            apply_form(existing, &fields);
            Json(json!({ "usuario": existing })).into_response()
        }
        None => fail(StatusCode::NOT_FOUND, "Usuario no encontrado"),
    }
}

async fn delete_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut s = state.lock().unwrap();
    if let Err(resp) = authorize(&mut s, &headers) {
        return resp;
    }
    let before = s.users.len();
    s.users.retain(|u| u.id != id);
    if s.users.len() == before {
        return fail(StatusCode::NOT_FOUND, "Usuario no encontrado");
    }
    Json(json!({ "message": "Usuario eliminado" })).into_response()
}
