//! Client-side session and route gating.
//!
//! - [`SessionStore`] keeps the token, user id, role and profile in local
//!   storage and doubles as the API client's [`TokenSource`](joyeria_client::TokenSource).
//! - [`RouteGuard`] decides render-vs-redirect for every protected view
//!   from the cached session alone.
//!
//! # Usage
//!
//! ```ignore
//! let store = SessionStore::new(Arc::new(RedbStore::open(&path)?));
//! let api = ApiClient::new(server, Arc::new(store.clone()));
//! login(&api, &store, "ana@joyeria.mx", "secreto").await?;
//! let session = RouteGuard::new(store).enter(View::AdminDashboard)?;
//! ```

pub mod guard;
pub mod session;

use joyeria_client::{ApiClient, ApiError};
use joyeria_kv::KVError;
use thiserror::Error;
use tracing::info;

pub use guard::{decide, Decision, RouteGuard, View};
pub use session::{Session, SessionStore};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("local storage: {0}")]
    Storage(#[from] KVError),

    #[error("encode session: {0}")]
    Encode(String),
}

/// Log in and persist the session. Returns what was stored.
pub async fn login(
    api: &ApiClient,
    store: &SessionStore,
    email: &str,
    password: &str,
) -> Result<Session, AuthError> {
    let resp = api.login(email, password).await?;
    let session = Session::from_login(&resp);
    store.save(&session)?;
    info!(
        "Logged in as {} ({})",
        session.profile.nombre,
        session.role.map(|r| r.as_str()).unwrap_or("sin rol")
    );
    Ok(session)
}

/// Forget the stored session. The backend is not told.
pub fn logout(store: &SessionStore) -> Result<(), AuthError> {
    store.clear()?;
    info!("Session cleared");
    Ok(())
}
