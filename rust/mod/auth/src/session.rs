use std::sync::Arc;

use joyeria_client::{ApiError, TokenSource};
use joyeria_kv::KVStore;
use joyeria_types::{LoginResponse, Role, UserProfile};
use tracing::{error, warn};

use crate::AuthError;

pub const TOKEN_KEY: &str = "token";
pub const ROLE_KEY: &str = "userRole";
pub const USER_ID_KEY: &str = "userId";
pub const USER_INFO_KEY: &str = "userInfo";

const ALL_KEYS: [&str; 4] = [TOKEN_KEY, ROLE_KEY, USER_ID_KEY, USER_INFO_KEY];

/// The logged-in principal as cached on this machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Opaque bearer credential. Trusted until the backend rejects it.
    pub token: String,
    pub user_id: String,
    /// `None` when the stored role string is missing or unknown.
    pub role: Option<Role>,
    pub profile: UserProfile,
}

impl Session {
    pub fn from_login(resp: &LoginResponse) -> Self {
        Self {
            token: resp.token.clone(),
            user_id: resp.usuario.id.clone(),
            role: resp.usuario.role(),
            profile: resp.usuario.profile(),
        }
    }
}

/// Persists the session under four storage keys.
///
/// All four are written together on `save` and removed together on
/// `clear`. A partially written or tampered set reads back as no session.
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KVStore>,
}

impl SessionStore {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self { kv }
    }

    pub fn save(&self, session: &Session) -> Result<(), AuthError> {
        let info = serde_json::to_string(&session.profile)
            .map_err(|e| AuthError::Encode(e.to_string()))?;
        let role = session.role.map(|r| r.as_str()).unwrap_or_default();
        self.kv.batch_set(&[
            (TOKEN_KEY, session.token.as_str()),
            (ROLE_KEY, role),
            (USER_ID_KEY, session.user_id.as_str()),
            (USER_INFO_KEY, info.as_str()),
        ])?;
        Ok(())
    }

    /// Read the stored session. Missing, partial or malformed data yields
    /// `None`; this never fails.
    pub fn load(&self) -> Option<Session> {
        let token = self.read(TOKEN_KEY)?;
        let user_id = self.read(USER_ID_KEY)?;
        let raw_info = self.read(USER_INFO_KEY)?;
        let profile = match serde_json::from_str::<UserProfile>(&raw_info) {
            Ok(p) => p,
            Err(e) => {
                warn!("Stored {} is malformed, treating session as absent: {}", USER_INFO_KEY, e);
                return None;
            }
        };
        let role = self.role();
        Some(Session {
            token,
            user_id,
            role,
            profile,
        })
    }

    pub fn clear(&self) -> Result<(), AuthError> {
        self.kv.batch_delete(&ALL_KEYS)?;
        Ok(())
    }

    /// True iff a token is stored. Says nothing about the other keys.
    pub fn is_authenticated(&self) -> bool {
        self.read(TOKEN_KEY).is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.read(ROLE_KEY)?.parse().ok()
    }

    /// Non-empty value for `key`; storage failures count as absent.
    fn read(&self, key: &str) -> Option<String> {
        match self.kv.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                error!("Failed to read {} from local storage: {}", key, e);
                None
            }
        }
    }
}

/// Requests carry whatever token is stored at the time they are sent.
#[async_trait::async_trait]
impl TokenSource for SessionStore {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.read(TOKEN_KEY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joyeria_kv::MemoryStore;

    fn sample(role: Option<Role>) -> Session {
        Session {
            token: "jwt-abc".to_string(),
            user_id: "u1".to_string(),
            role,
            profile: UserProfile {
                nombre: "Marta".to_string(),
                imagen_url: Some("/uploads/marta.png".to_string()),
                rol: role.map(|r| r.to_string()).unwrap_or_default(),
            },
        }
    }

    fn store() -> (SessionStore, Arc<MemoryStore>) {
        let kv = Arc::new(MemoryStore::new());
        (SessionStore::new(kv.clone()), kv)
    }

    #[test]
    fn save_then_load_roundtrips() {
        let (store, _) = store();
        let session = sample(Some(Role::Admin));
        store.save(&session).unwrap();
        assert_eq!(store.load(), Some(session));
        assert_eq!(store.role(), Some(Role::Admin));
    }

    #[test]
    fn uses_the_four_storage_keys() {
        let (store, kv) = store();
        store.save(&sample(Some(Role::Vendedor))).unwrap();
        assert_eq!(kv.get("token").unwrap().as_deref(), Some("jwt-abc"));
        assert_eq!(kv.get("userRole").unwrap().as_deref(), Some("vendedor"));
        assert_eq!(kv.get("userId").unwrap().as_deref(), Some("u1"));
        let info: serde_json::Value =
            serde_json::from_str(&kv.get("userInfo").unwrap().unwrap()).unwrap();
        assert_eq!(info["nombre"], "Marta");
        assert_eq!(info["imagen_url"], "/uploads/marta.png");
    }

    #[test]
    fn clear_removes_everything() {
        let (store, kv) = store();
        store.save(&sample(Some(Role::Admin))).unwrap();
        store.clear().unwrap();
        for key in ALL_KEYS {
            assert_eq!(kv.get(key).unwrap(), None, "{} should be gone", key);
        }
        assert!(!store.is_authenticated());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn authenticated_iff_token_present() {
        let (store, kv) = store();
        assert!(!store.is_authenticated());

        // Token alone is enough for is_authenticated, not for load.
        kv.set("token", "t").unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.load(), None);

        kv.delete("token").unwrap();
        kv.set("userId", "u1").unwrap();
        kv.set("userRole", "admin").unwrap();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn malformed_profile_loads_as_none() {
        let (store, kv) = store();
        store.save(&sample(Some(Role::Admin))).unwrap();
        kv.set("userInfo", "{not json").unwrap();
        assert_eq!(store.load(), None);
        assert!(store.is_authenticated());
    }

    #[test]
    fn unknown_role_loads_with_role_absent() {
        let (store, kv) = store();
        store.save(&sample(Some(Role::Vendedor))).unwrap();
        kv.set("userRole", "superuser").unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.role, None);
        assert_eq!(store.role(), None);
    }

    #[test]
    fn missing_role_is_stored_empty_and_reads_absent() {
        let (store, _) = store();
        store.save(&sample(None)).unwrap();
        assert_eq!(store.load().unwrap().role, None);
    }

    #[tokio::test]
    async fn token_source_reads_current_token() {
        let (store, _) = store();
        assert_eq!(store.token().await.unwrap(), None);
        store.save(&sample(Some(Role::Admin))).unwrap();
        assert_eq!(store.token().await.unwrap().as_deref(), Some("jwt-abc"));
    }
}
