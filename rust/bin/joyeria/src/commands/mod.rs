//! Subcommand implementations.
//!
//! Every command that shows or changes data enters a [`View`] through the
//! route guard first and refuses to touch the backend on a redirect.

pub mod config;
pub mod orders;
pub mod session;
pub mod users;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use joyeria_auth::{AuthError, RouteGuard, Session, SessionStore, View};
use joyeria_client::{ApiClient, ApiError};
use joyeria_kv::RedbStore;
use joyeria_orders::OrderError;
use joyeria_types::Confirm;
use joyeria_users::UsersError;
use tracing::debug;

use crate::config::ClientConfig;

/// Everything a command needs: session, API client and output mode.
pub struct App {
    pub store: SessionStore,
    pub api: ApiClient,
    pub guard: RouteGuard,
    pub json: bool,
}

impl App {
    pub fn open(config_path: &Path, server: Option<&str>, json: bool) -> Result<Self> {
        let config = ClientConfig::load(config_path)?;
        let session_file = config.session_file();
        let kv = RedbStore::open(&session_file)
            .map_err(|e| anyhow::anyhow!("failed to open session store: {}", e))?;
        let store = SessionStore::new(Arc::new(kv));
        let base_url = config.server_url(server);
        debug!("Using server {} and session {}", base_url, session_file.display());
        let api = ApiClient::new(base_url, Arc::new(store.clone()));
        Ok(Self {
            guard: RouteGuard::new(store.clone()),
            store,
            api,
            json,
        })
    }

    /// Pass the guard for `view` or fail with where the user was sent.
    pub fn enter(&self, view: View) -> Result<Session> {
        self.guard.enter(view).map_err(|target| match target {
            View::Login => anyhow::anyhow!("Not logged in. Run `joyeria login`."),
            other => anyhow::anyhow!(
                "{} is not available for this account (redirected to {}).",
                view,
                other
            ),
        })
    }

    /// The order dashboard for the stored role.
    pub fn dashboard(&self) -> View {
        self.guard.landing()
    }

    pub fn print_json<T: serde::Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Asks on the terminal. Anything but yes declines.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{} [s/N]: ", prompt);
        let _ = std::io::stderr().flush();
        let mut s = String::new();
        if std::io::stdin().read_line(&mut s).is_err() {
            return false;
        }
        matches!(s.trim().to_lowercase().as_str(), "s" | "si" | "sí" | "y" | "yes")
    }
}

/// Add a re-login hint when the backend rejected the stored token.
pub fn explain(err: anyhow::Error) -> anyhow::Error {
    let rejected = err
        .chain()
        .filter_map(api_error)
        .any(ApiError::is_unauthorized);
    if rejected {
        err.context("The server rejected the stored session. Run `joyeria login` again.")
    } else {
        err
    }
}

/// The API error inside `e`, looking through the transparent wrappers.
fn api_error<'a>(e: &'a (dyn std::error::Error + 'static)) -> Option<&'a ApiError> {
    if let Some(api) = e.downcast_ref::<ApiError>() {
        return Some(api);
    }
    match e.downcast_ref::<OrderError>() {
        Some(OrderError::Api(api) | OrderError::Stale(api)) => return Some(api),
        Some(_) => return None,
        None => {}
    }
    match e.downcast_ref::<UsersError>() {
        Some(UsersError::Api(api)) => return Some(api),
        Some(_) => return None,
        None => {}
    }
    match e.downcast_ref::<AuthError>() {
        Some(AuthError::Api(api)) => Some(api),
        _ => None,
    }
}

/// Left-aligned columns sized to the widest cell.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    print_row(headers, &widths);
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        print_row(&cells, &widths);
    }
}

fn print_row(cells: &[&str], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c, width = w))
        .collect();
    println!("{}", padded.join("  ").trim_end());
}

/// Cell text for an optional field.
pub fn cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}
