//! HTTP client for the joyeria REST backend.
//!
//! A thin, typed wrapper: one method per endpoint, no retries, no caching.
//! Authentication is delegated to a pluggable [`TokenSource`] consulted
//! before every request; the session store is the one the CLI plugs in.

use std::path::Path;
use std::sync::Arc;

use joyeria_types::{LoginRequest, LoginResponse, Order, Role, StatusChange, User, UserForm};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

// ── Error ───────────────────────────────────────────────────────────

/// Client-side API error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("auth: {0}")]
    Auth(String),

    #[error("decode: {0}")]
    Decode(String),

    #[error("attachment {path}: {message}")]
    Attachment { path: String, message: String },
}

impl ApiError {
    /// True for 401/403 responses: the backend no longer accepts the token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Server { status: 401 | 403, .. })
    }
}

// ── TokenSource ─────────────────────────────────────────────────────

/// Pluggable token provider. Called before every API request.
///
/// Returns `Ok(None)` to skip the Authorization header (anonymous).
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn token(&self) -> Result<Option<String>, ApiError>;
}

// ── ApiClient ───────────────────────────────────────────────────────

/// Typed client for every backend endpoint the admin front end uses.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token_source: Arc<dyn TokenSource>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token_source: Arc<dyn TokenSource>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token_source,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token, send, and map non-2xx to `ApiError::Server`.
    /// Failures are logged here so every endpoint reports them the same way.
    async fn send(&self, op: &str, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let result = self.try_send(builder).await;
        match &result {
            Ok(_) => debug!("{} ok", op),
            Err(e) => error!("{} failed: {}", op, e),
        }
        result
    }

    async fn try_send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let builder = match self.token_source.token().await? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(resp)
    }

    async fn json<R: DeserializeOwned>(op: &str, resp: reqwest::Response) -> Result<R, ApiError> {
        resp.json::<R>().await.map_err(|e| {
            error!("{} returned an undecodable body: {}", op, e);
            ApiError::Decode(format!("{}: {}", op, e))
        })
    }

    async fn list<T: DeserializeOwned>(
        &self,
        op: &str,
        builder: reqwest::RequestBuilder,
        wrappers: &[&str],
    ) -> Result<Vec<T>, ApiError> {
        let resp = self.send(op, builder).await?;
        let body: serde_json::Value = Self::json(op, resp).await?;
        extract_list(body, wrappers).map_err(|e| {
            error!("{} returned an undecodable list: {}", op, e);
            e
        })
    }

    // ── Session ─────────────────────────────────────────────────────

    /// `POST /usuarios/login`. Sent without a bearer token.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let op = "login";
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp = self
            .http
            .post(self.url("/usuarios/login"))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("{} failed: {}", op, e);
                ApiError::Network(e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let err = ApiError::Auth(format!("login failed ({}): {}", status.as_u16(), error_message(&text)));
            error!("{} failed: {}", op, err);
            return Err(err);
        }
        Self::json(op, resp).await
    }

    // ── Orders ──────────────────────────────────────────────────────

    /// `GET /pedidos`, optionally narrowed to one client.
    pub async fn list_orders(&self, client_id: Option<&str>) -> Result<Vec<Order>, ApiError> {
        let mut req = self.http.get(self.url("/pedidos"));
        if let Some(id) = client_id {
            req = req.query(&[("cliente_id", id)]);
        }
        self.list("list_orders", req, &["pedidos"]).await
    }

    /// `GET /pedidos/vendedor/{vendorId}`.
    pub async fn list_vendor_orders(&self, vendor_id: &str) -> Result<Vec<Order>, ApiError> {
        let req = self.http.get(self.url(&format!("/pedidos/vendedor/{}", vendor_id)));
        self.list("list_vendor_orders", req, &["pedidos"]).await
    }

    /// `PUT /pedidos/{id}/estado`.
    pub async fn set_order_status(&self, id: &str, change: &StatusChange) -> Result<(), ApiError> {
        let req = self.http.put(self.url(&format!("/pedidos/{}/estado", id))).json(change);
        self.send("set_order_status", req).await.map(drop)
    }

    /// `PUT /pedidos/{id}/cancelar`.
    pub async fn cancel_order(&self, id: &str) -> Result<(), ApiError> {
        let req = self.http.put(self.url(&format!("/pedidos/{}/cancelar", id)));
        self.send("cancel_order", req).await.map(drop)
    }

    /// `PUT /pedidos/{id}/reactivar`.
    pub async fn reactivate_order(&self, id: &str) -> Result<(), ApiError> {
        let req = self.http.put(self.url(&format!("/pedidos/{}/reactivar", id)));
        self.send("reactivate_order", req).await.map(drop)
    }

    /// `DELETE /pedidos/{id}`.
    pub async fn delete_order(&self, id: &str) -> Result<(), ApiError> {
        let req = self.http.delete(self.url(&format!("/pedidos/{}", id)));
        self.send("delete_order", req).await.map(drop)
    }

    // ── Users ───────────────────────────────────────────────────────

    /// `GET /usuarios`, optionally `?rol=` one role.
    pub async fn list_users(&self, rol: Option<Role>) -> Result<Vec<User>, ApiError> {
        let mut req = self.http.get(self.url("/usuarios"));
        if let Some(rol) = rol {
            req = req.query(&[("rol", rol.as_str())]);
        }
        self.list("list_users", req, &["usuarios"]).await
    }

    /// `GET /usuarios/{id}`.
    pub async fn get_user(&self, id: &str) -> Result<User, ApiError> {
        let op = "get_user";
        let req = self.http.get(self.url(&format!("/usuarios/{}", id)));
        let resp = self.send(op, req).await?;
        let body: serde_json::Value = Self::json(op, resp).await?;
        extract_one(body, "usuario")
    }

    /// `GET /usuarios/vendedor/{vendorId}/clientes`.
    pub async fn list_vendor_clients(&self, vendor_id: &str) -> Result<Vec<User>, ApiError> {
        let req = self
            .http
            .get(self.url(&format!("/usuarios/vendedor/{}/clientes", vendor_id)));
        self.list("list_vendor_clients", req, &["clientes", "usuarios"]).await
    }

    /// `POST /usuarios` as multipart, with the optional image attached.
    pub async fn create_user(&self, form: &UserForm) -> Result<(), ApiError> {
        let multipart = build_form(form).await?;
        let req = self.http.post(self.url("/usuarios")).multipart(multipart);
        self.send("create_user", req).await.map(drop)
    }

    /// `PUT /usuarios/{id}` as multipart.
    pub async fn update_user(&self, id: &str, form: &UserForm) -> Result<(), ApiError> {
        let multipart = build_form(form).await?;
        let req = self
            .http
            .put(self.url(&format!("/usuarios/{}", id)))
            .multipart(multipart);
        self.send("update_user", req).await.map(drop)
    }

    /// `DELETE /usuarios/{id}`.
    pub async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        let req = self.http.delete(self.url(&format!("/usuarios/{}", id)));
        self.send("delete_user", req).await.map(drop)
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "mensaje", "error"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    body.trim().to_string()
}

/// Accept a bare array or an object wrapping one under a known key.
fn extract_list<T: DeserializeOwned>(body: serde_json::Value, wrappers: &[&str]) -> Result<Vec<T>, ApiError> {
    let items = match body {
        serde_json::Value::Array(items) => serde_json::Value::Array(items),
        serde_json::Value::Object(mut map) => wrappers
            .iter()
            .copied()
            .chain(["items", "data"])
            .find_map(|key| map.remove(key).filter(|v| v.is_array()))
            .ok_or_else(|| ApiError::Decode("expected a list in response body".to_string()))?,
        other => {
            return Err(ApiError::Decode(format!("expected a list, got {}", other)));
        }
    };
    serde_json::from_value(items).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Accept a bare object or one wrapped under `wrapper`.
fn extract_one<T: DeserializeOwned>(mut body: serde_json::Value, wrapper: &str) -> Result<T, ApiError> {
    if body.get(wrapper).is_some_and(serde_json::Value::is_object) {
        let inner = body[wrapper].take();
        body = inner;
    }
    serde_json::from_value(body).map_err(|e| ApiError::Decode(e.to_string()))
}

async fn build_form(form: &UserForm) -> Result<reqwest::multipart::Form, ApiError> {
    let mut multipart = reqwest::multipart::Form::new();
    for (name, value) in form.text_fields() {
        multipart = multipart.text(name, value);
    }
    if let Some(path) = &form.imagen {
        multipart = multipart.part("imagen", image_part(path).await?);
    }
    Ok(multipart)
}

async fn image_part(path: &Path) -> Result<reqwest::multipart::Part, ApiError> {
    let attachment_err = |message: String| ApiError::Attachment {
        path: path.display().to_string(),
        message,
    };
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| attachment_err(e.to_string()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("imagen")
        .to_string();
    reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(image_mime(path))
        .map_err(|e| attachment_err(e.to_string()))
}

fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joyeria_types::OrderStatus;

    #[test]
    fn list_accepts_bare_and_wrapped_bodies() {
        let bare = serde_json::json!([{"id": "1", "estado": "solicitado"}]);
        let orders: Vec<Order> = extract_list(bare, &["pedidos"]).unwrap();
        assert_eq!(orders.len(), 1);

        let wrapped = serde_json::json!({"ok": true, "pedidos": [{"id": "2", "estado": "capturado"}]});
        let orders: Vec<Order> = extract_list(wrapped, &["pedidos"]).unwrap();
        assert_eq!(orders[0].estado, OrderStatus::Capturado);

        let missing = serde_json::json!({"total": 0});
        assert!(extract_list::<Order>(missing, &["pedidos"]).is_err());
    }

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(error_message(r#"{"message":"Pedido no encontrado"}"#), "Pedido no encontrado");
        assert_eq!(error_message(r#"{"error":"token inválido"}"#), "token inválido");
        assert_eq!(error_message(" plain text \n"), "plain text");
    }

    #[test]
    fn unauthorized_covers_401_and_403() {
        let e = ApiError::Server { status: 401, message: String::new() };
        assert!(e.is_unauthorized());
        let e = ApiError::Server { status: 500, message: String::new() };
        assert!(!e.is_unauthorized());
    }

    #[test]
    fn image_mime_by_extension() {
        assert_eq!(image_mime(Path::new("foto.JPG")), "image/jpeg");
        assert_eq!(image_mime(Path::new("foto.png")), "image/png");
        assert_eq!(image_mime(Path::new("foto")), "application/octet-stream");
    }
}
