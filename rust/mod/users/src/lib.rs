//! Vendor and client management.
//!
//! Admins see every account. Vendors see and manage only the clients they
//! own. Like the order board, the directory refetches its list after every
//! change instead of patching it.

use joyeria_auth::Session;
use joyeria_client::{ApiClient, ApiError};
use joyeria_types::{Confirm, Outcome, Role, User, UserForm};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum UsersError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("client {0} belongs to another vendor")]
    NotOwned(String),

    #[error("user not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),
}

/// Which accounts the directory covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every user. Admin only.
    All,
    /// Clients owned by this vendor id.
    ClientsOf(String),
}

pub struct UserDirectory {
    api: ApiClient,
    scope: Scope,
    role_filter: Option<Role>,
    users: Vec<User>,
}

impl UserDirectory {
    pub fn new(api: ApiClient, session: &Session) -> Result<Self, UsersError> {
        let scope = match session.role {
            Some(Role::Admin) => Scope::All,
            Some(Role::Vendedor) => Scope::ClientsOf(session.user_id.clone()),
            _ => {
                return Err(UsersError::Forbidden(
                    "only admins and vendors manage users".to_string(),
                ))
            }
        };
        Ok(Self {
            api,
            scope,
            role_filter: None,
            users: Vec::new(),
        })
    }

    /// Have the backend list only accounts with this role. Ignored for
    /// vendors, whose list is already their clients.
    pub fn with_role_filter(mut self, role: Option<Role>) -> Self {
        self.role_filter = role;
        self
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn find(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Loaded users with the given role, e.g. the vendor list.
    pub fn with_role(&self, role: Role) -> Vec<&User> {
        self.users.iter().filter(|u| u.role() == Some(role)).collect()
    }

    /// Refetch the list. On failure the previous list stays.
    pub async fn reload(&mut self) -> Result<(), UsersError> {
        self.users = match &self.scope {
            Scope::All => self.api.list_users(self.role_filter).await?,
            Scope::ClientsOf(vendor) => self.api.list_vendor_clients(vendor).await?,
        };
        Ok(())
    }

    /// Clients owned by `vendor_id`, fetched from the backend. Admin only.
    pub async fn clients_of(&self, vendor_id: &str) -> Result<Vec<User>, UsersError> {
        if self.scope != Scope::All {
            return Err(UsersError::Forbidden(
                "only admins list another vendor's clients".to_string(),
            ));
        }
        Ok(self.api.list_vendor_clients(vendor_id).await?)
    }

    /// Fetch one account. Vendors may only read their own clients.
    pub async fn get(&mut self, id: &str) -> Result<User, UsersError> {
        self.ensure_in_scope(id).await?;
        Ok(self.api.get_user(id).await?)
    }

    /// Create an account. A vendor always creates a client of its own.
    pub async fn create(&mut self, mut form: UserForm) -> Result<(), UsersError> {
        self.scope_form(&mut form);
        self.api.create_user(&form).await?;
        info!(
            "Created user {}",
            form.email.as_deref().or(form.nombre.as_deref()).unwrap_or("")
        );
        self.reload().await
    }

    pub async fn update(&mut self, id: &str, mut form: UserForm) -> Result<(), UsersError> {
        self.ensure_in_scope(id).await?;
        self.scope_form(&mut form);
        self.api.update_user(id, &form).await?;
        info!("Updated user {}", id);
        self.reload().await
    }

    /// Delete after confirmation. Declining sends nothing.
    pub async fn delete(&mut self, id: &str, confirm: &dyn Confirm) -> Result<Outcome, UsersError> {
        self.ensure_in_scope(id).await?;
        let nombre = self.find(id).map(|u| u.nombre.as_str()).unwrap_or(id);
        if !confirm.confirm(&format!("¿Eliminar a {}?", nombre)) {
            info!("Deleting user {} declined", id);
            return Ok(Outcome::Declined);
        }
        self.api.delete_user(id).await?;
        info!("Deleted user {}", id);
        self.reload().await?;
        Ok(Outcome::Applied)
    }

    /// Reload, then require `id` in the list. Outside it is `NotOwned` for a
    /// vendor and `NotFound` for an admin.
    async fn ensure_in_scope(&mut self, id: &str) -> Result<(), UsersError> {
        self.reload().await?;
        if self.find(id).is_some() {
            return Ok(());
        }
        match self.scope {
            Scope::All => Err(UsersError::NotFound(id.to_string())),
            Scope::ClientsOf(_) => Err(UsersError::NotOwned(id.to_string())),
        }
    }

    fn scope_form(&self, form: &mut UserForm) {
        if let Scope::ClientsOf(vendor) = &self.scope {
            form.rol = Some(Role::Cliente);
            form.vendedor_id = Some(vendor.clone());
        }
    }
}
