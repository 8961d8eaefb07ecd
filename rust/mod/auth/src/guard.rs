use joyeria_types::Role;
use tracing::debug;

use crate::session::{Session, SessionStore};

/// Screens of the admin front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Login,
    /// Order tabs for the whole business.
    AdminDashboard,
    /// Vendor and client management.
    AdminUsers,
    /// Order tabs for the vendor's own orders.
    VendorDashboard,
    /// The vendor's own clients.
    VendorClients,
    Profile,
}

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const VENDOR_ONLY: &[Role] = &[Role::Vendedor];
const STAFF: &[Role] = &[Role::Admin, Role::Vendedor];

impl View {
    /// Roles allowed to see this view; `None` for public views.
    pub fn allowed_roles(&self) -> Option<&'static [Role]> {
        match self {
            View::Login => None,
            View::AdminDashboard | View::AdminUsers => Some(ADMIN_ONLY),
            View::VendorDashboard | View::VendorClients => Some(VENDOR_ONLY),
            View::Profile => Some(STAFF),
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            View::Login => "/login",
            View::AdminDashboard => "/admin",
            View::AdminUsers => "/admin/usuarios",
            View::VendorDashboard => "/vendedor",
            View::VendorClients => "/vendedor/clientes",
            View::Profile => "/perfil",
        }
    }

    /// Landing view for a role. Admins get theirs; everyone else, including
    /// an unknown role, gets the vendor dashboard.
    pub fn default_for(role: Option<Role>) -> View {
        match role {
            Some(Role::Admin) => View::AdminDashboard,
            _ => View::VendorDashboard,
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Render(View),
    Redirect(View),
}

/// Decide whether `view` may be shown for `session`.
///
/// Public views always render. Otherwise: no session goes to login, a
/// missing or disallowed role goes to the role's default view, and only
/// an allowed role renders.
pub fn decide(session: Option<&Session>, view: View) -> Decision {
    let Some(allowed) = view.allowed_roles() else {
        return Decision::Render(view);
    };
    let Some(session) = session else {
        return Decision::Redirect(View::Login);
    };
    match session.role {
        Some(role) if allowed.contains(&role) => Decision::Render(view),
        role => Decision::Redirect(View::default_for(role)),
    }
}

/// Checks the locally cached session before every protected view.
/// Never touches the network.
#[derive(Clone)]
pub struct RouteGuard {
    store: SessionStore,
}

impl RouteGuard {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    pub fn check(&self, view: View) -> Decision {
        let decision = if self.store.is_authenticated() {
            decide(self.store.load().as_ref(), view)
        } else {
            decide(None, view)
        };
        debug!("route guard: {} -> {:?}", view, decision);
        decision
    }

    /// Enter a protected view: the session on render, the redirect target
    /// otherwise.
    pub fn enter(&self, view: View) -> Result<Session, View> {
        match self.check(view) {
            Decision::Render(_) => self.store.load().ok_or(View::Login),
            Decision::Redirect(target) => Err(target),
        }
    }

    /// Where a user lands right after login.
    pub fn landing(&self) -> View {
        View::default_for(self.store.role())
    }
}
